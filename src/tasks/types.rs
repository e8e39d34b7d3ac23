use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use super::status;

/// What to fetch for a list.
///
/// Two fetches of the same list with different options are different
/// cached artifacts, so every field takes part in the cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
  pub include_complete: bool,
  pub include_deleted: bool,
  pub include_hidden: bool,
  pub due_min: Option<NaiveDate>,
  pub due_max: Option<NaiveDate>,
  pub result_limit: Option<u32>,
}

impl Default for FilterOptions {
  fn default() -> Self {
    Self {
      include_complete: true,
      include_deleted: false,
      include_hidden: false,
      due_min: None,
      due_max: None,
      result_limit: None,
    }
  }
}

impl FilterOptions {
  /// Stable textual form used for hashing.
  ///
  /// Field order and formatting are fixed; changing them changes every
  /// cache key.
  pub fn canonical(&self) -> String {
    fn date(d: Option<NaiveDate>) -> String {
      d.map(|d| d.to_string()).unwrap_or_default()
    }

    format!(
      "complete={};deleted={};hidden={};due_min={};due_max={};limit={}",
      self.include_complete,
      self.include_deleted,
      self.include_hidden,
      date(self.due_min),
      date(self.due_max),
      self.result_limit.map(|l| l.to_string()).unwrap_or_default(),
    )
  }
}

/// How urgent an incomplete task is relative to today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
  #[default]
  None,
  Overdue,
  Today,
  ThisWeek,
  Sometime,
}

/// A task with its derived status fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
  pub id: String,
  pub title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub due_date: Option<NaiveDate>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub completed_date: Option<NaiveDate>,
  pub complete: bool,
  pub deleted: bool,
  pub hidden: bool,
  /// 1-based position within the owning list
  pub position: usize,
  pub due_status: DueStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub due_in_days: Option<i64>,
  /// Human phrase such as "due in 3 days" or "completed today"
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub when: Option<String>,
}

/// Format a date the way the service expects due dates.
pub fn rfc3339_date(date: NaiveDate) -> String {
  format!("{}T00:00:00.000Z", date.format("%Y-%m-%d"))
}

/// Aggregate counts for one or more lists.
///
/// Every task counts once in `complete`/`incomplete` and once in exactly
/// one of the timing buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
  pub total: usize,
  pub complete: usize,
  pub incomplete: usize,
  pub overdue: usize,
  /// overdue + due_today + due_this_week + due_sometime
  pub due: usize,
  pub due_today: usize,
  pub due_this_week: usize,
  pub due_sometime: usize,
  pub due_never: usize,
}

impl AddAssign for Totals {
  fn add_assign(&mut self, other: Self) {
    self.total += other.total;
    self.complete += other.complete;
    self.incomplete += other.incomplete;
    self.overdue += other.overdue;
    self.due += other.due;
    self.due_today += other.due_today;
    self.due_this_week += other.due_this_week;
    self.due_sometime += other.due_sometime;
    self.due_never += other.due_never;
  }
}

impl<'a> std::iter::Sum<&'a Totals> for Totals {
  fn sum<I: Iterator<Item = &'a Totals>>(iter: I) -> Self {
    iter.fold(Totals::default(), |mut acc, t| {
      acc += *t;
      acc
    })
  }
}

/// A task list with its tasks in service order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSnapshot {
  pub id: String,
  pub title: String,
  pub tasks: Vec<TaskSnapshot>,
  pub totals: Totals,
}

impl ListSnapshot {
  /// Assemble a snapshot, numbering tasks from 1 and computing totals.
  pub fn new(id: String, title: String, mut tasks: Vec<TaskSnapshot>) -> Self {
    for (i, task) in tasks.iter_mut().enumerate() {
      task.position = i + 1;
    }
    let totals = status::calibrate(&tasks);
    Self {
      id,
      title,
      tasks,
      totals,
    }
  }

  /// Re-derive every task's status against `today`.
  ///
  /// Cached snapshots may have been classified on an earlier day.
  pub fn rebase(self, today: NaiveDate) -> Self {
    let tasks = self
      .tasks
      .into_iter()
      .map(|task| status::reclassify(task, today))
      .collect();
    Self::new(self.id, self.title, tasks)
  }

  /// Task at a 1-based position.
  pub fn task(&self, position: usize) -> Option<&TaskSnapshot> {
    position
      .checked_sub(1)
      .and_then(|index| self.tasks.get(index))
  }
}
