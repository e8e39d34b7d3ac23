//! Due/complete classification of tasks and per-list totals.
//!
//! Everything here is a pure function of the task data and the caller's
//! notion of "today", so cached and live lists classify identically.

use chrono::NaiveDate;
use tracing::warn;

use super::api_types::{RemoteTask, STATUS_COMPLETED};
use super::types::{DueStatus, TaskSnapshot, Totals};

/// Project a raw task into a snapshot with its derived status.
///
/// The position is left at 0; it is assigned when the owning
/// [`ListSnapshot`](super::types::ListSnapshot) is built.
pub fn classify(raw: &RemoteTask, today: NaiveDate) -> TaskSnapshot {
  let completed_date = raw
    .completed
    .as_deref()
    .and_then(|s| parse_remote_date(s, &raw.id));
  let due_date = raw
    .due
    .as_deref()
    .and_then(|s| parse_remote_date(s, &raw.id));

  let task = TaskSnapshot {
    id: raw.id.clone(),
    title: raw.title.clone(),
    notes: raw.notes.clone(),
    due_date,
    completed_date,
    complete: raw.completed.is_some() || raw.status.as_deref() == Some(STATUS_COMPLETED),
    deleted: raw.deleted.unwrap_or(false),
    hidden: raw.hidden.unwrap_or(false),
    position: 0,
    due_status: DueStatus::None,
    due_in_days: None,
    when: None,
  };

  reclassify(task, today)
}

/// Recompute the derived fields of an existing snapshot.
pub fn reclassify(mut task: TaskSnapshot, today: NaiveDate) -> TaskSnapshot {
  task.due_status = DueStatus::None;
  task.due_in_days = None;
  task.when = None;

  if task.complete {
    task.when = Some(match task.completed_date {
      Some(date) => match (today - date).num_days().abs() {
        0 => "completed today".to_string(),
        n => format!("completed {} ago", days(n)),
      },
      None => "completed".to_string(),
    });
    return task;
  }

  let Some(due) = task.due_date else {
    return task;
  };

  // Positive when the due date is in the past
  let delta = (today - due).num_days();
  let in_days = delta.abs();
  task.due_in_days = Some(in_days);

  let (status, when) = if delta > 0 {
    (DueStatus::Overdue, format!("overdue {} ago", days(in_days)))
  } else if delta == 0 {
    (DueStatus::Today, "due today".to_string())
  } else if in_days <= 7 {
    (DueStatus::ThisWeek, format!("due in {}", days(in_days)))
  } else {
    (DueStatus::Sometime, format!("due in {}", days(in_days)))
  };
  task.due_status = status;
  task.when = Some(when);

  task
}

/// Count tasks into completion and timing buckets in a single pass.
pub fn calibrate(tasks: &[TaskSnapshot]) -> Totals {
  let mut totals = Totals::default();

  for task in tasks {
    totals.total += 1;

    if task.complete {
      totals.complete += 1;
    } else {
      totals.incomplete += 1;
    }

    let status = if task.complete {
      DueStatus::None
    } else {
      task.due_status
    };
    match status {
      DueStatus::None => totals.due_never += 1,
      DueStatus::Overdue => totals.overdue += 1,
      DueStatus::Today => totals.due_today += 1,
      DueStatus::ThisWeek => totals.due_this_week += 1,
      DueStatus::Sometime => totals.due_sometime += 1,
    }
  }

  totals.due = totals.overdue + totals.due_today + totals.due_this_week + totals.due_sometime;
  totals
}

/// Calendar date of an RFC 3339 timestamp. Time and offset are ignored.
fn parse_remote_date(value: &str, task_id: &str) -> Option<NaiveDate> {
  let parsed = value
    .get(..10)
    .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
  if parsed.is_none() {
    warn!(task_id, value, "ignoring unparseable date from task service");
  }
  parsed
}

fn days(n: i64) -> String {
  if n == 1 {
    "1 day".to_string()
  } else {
    format!("{} days", n)
  }
}
