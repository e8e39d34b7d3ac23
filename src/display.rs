//! Plain-text rendering of lists and tasks.

use crossterm::style::{StyledContent, Stylize};
use crossterm::tty::IsTty;
use std::fmt::Write;

use crate::tasks::types::{DueStatus, FilterOptions, ListSnapshot, TaskSnapshot, Totals};

/// What the task view shows besides titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
  pub notes: bool,
  pub when: bool,
  pub totals: bool,
  pub empty_lists: bool,
}

impl Default for DisplayOptions {
  fn default() -> Self {
    Self {
      notes: false,
      when: true,
      totals: false,
      empty_lists: true,
    }
  }
}

/// Terminal colours, off when stdout isn't a terminal.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
  enabled: bool,
}

impl Palette {
  pub fn for_stdout() -> Self {
    if std::io::stdout().is_tty() {
      Self { enabled: true }
    } else {
      Self::plain()
    }
  }

  pub fn plain() -> Self {
    Self { enabled: false }
  }

  fn paint(&self, styled: StyledContent<String>) -> String {
    if self.enabled {
      styled.to_string()
    } else {
      styled.content().clone()
    }
  }

  fn status(&self, status: DueStatus, complete: bool, text: String) -> String {
    if complete {
      return text;
    }
    match status {
      DueStatus::None => text,
      DueStatus::Overdue => self.paint(text.red().bold()),
      DueStatus::Today => self.paint(text.white().bold().on_yellow()),
      DueStatus::ThisWeek => self.paint(text.yellow().bold()),
      DueStatus::Sometime => self.paint(text.blue().bold()),
    }
  }
}

pub fn render_totals(out: &mut String, totals: &Totals) {
  let _ = writeln!(
    out,
    "Total: {}; Complete: {}; Incomplete {};",
    totals.total, totals.complete, totals.incomplete
  );
  let _ = writeln!(
    out,
    "Overdue: {}; Due Today: {}; Due this week: {}; Due sometime: {}; Never due: {};",
    totals.overdue, totals.due_today, totals.due_this_week, totals.due_sometime, totals.due_never
  );
}

/// Task view: every list with its numbered tasks.
pub fn render_tasks(
  lists: &[ListSnapshot],
  filter: &FilterOptions,
  display: &DisplayOptions,
  palette: Palette,
) -> String {
  let mut out = String::new();

  // Positions are right-aligned to the longest list
  let width = lists
    .iter()
    .map(|l| l.tasks.len())
    .max()
    .unwrap_or(0)
    .to_string()
    .len();
  let notes_gutter = " ".repeat(9 + width);

  // Reserve a status column only when some task will carry a marker
  let flagged = (filter.include_complete || filter.include_deleted || filter.include_hidden)
    && lists
      .iter()
      .flat_map(|l| &l.tasks)
      .any(|t| t.complete || t.deleted || t.hidden);
  let blank_status = if flagged { "  " } else { "" };

  let mut shown_lists = 0;
  let mut shown_tasks = 0;
  for list in lists {
    if list.tasks.is_empty() && !display.empty_lists {
      continue;
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", list.title);
    let _ = writeln!(out, "{}", "-".repeat(list.title.chars().count()));
    if list.tasks.is_empty() {
      let _ = writeln!(out, "empty list");
    }

    for task in &list.tasks {
      shown_tasks += 1;
      let status = if filter.include_deleted && task.deleted {
        " ✗"
      } else if filter.include_complete && task.complete {
        " ✓"
      } else {
        blank_status
      };
      let when = if display.when {
        when_phrase(task, palette)
      } else {
        String::new()
      };
      let line = format!(
        "{:>width$}.{} {}  {}",
        task.position,
        status,
        task.title,
        when,
        width = width + 1
      );
      let _ = writeln!(out, "{}", line.trim_end());

      if display.notes {
        if let Some(notes) = &task.notes {
          let _ = writeln!(
            out,
            "{}{}",
            notes_gutter,
            notes.replace('\n', &format!("\n{}", notes_gutter))
          );
        }
      }
    }

    let _ = writeln!(out);
    if display.totals {
      render_totals(&mut out, &list.totals);
      let _ = writeln!(out);
    }
    shown_lists += 1;
  }

  if display.totals && shown_lists > 1 {
    let _ = writeln!(out, "OVERALL TOTALS");
    render_totals(&mut out, &lists.iter().map(|l| &l.totals).sum());
    let _ = writeln!(out);
  }

  if shown_tasks == 0 {
    let _ = writeln!(out, "no tasks found");
  }
  out
}

fn when_phrase(task: &TaskSnapshot, palette: Palette) -> String {
  let Some(phrase) = &task.when else {
    return String::new();
  };
  let date = if task.due_status != DueStatus::None {
    task.due_date
  } else if task.complete {
    task.completed_date
  } else {
    return String::new();
  };
  let text = match date {
    Some(date) => format!("{}, {}", phrase, date.format("%Y-%m-%d")),
    None => phrase.clone(),
  };
  format!("➪ {}", palette.status(task.due_status, task.complete, text))
}

/// List view: one title per line, optionally with totals.
pub fn render_lists(lists: &[ListSnapshot], display: &DisplayOptions) -> String {
  let mut out = String::new();
  for list in lists {
    let _ = writeln!(out, "{}", list.title);
    if display.totals {
      render_totals(&mut out, &list.totals);
    }
  }
  if display.totals {
    let _ = writeln!(out);
    render_totals(&mut out, &lists.iter().map(|l| &l.totals).sum());
  }
  out
}

/// One-line summary: `[overdue][due today][due this week]`.
pub fn render_dashboard(lists: &[ListSnapshot], palette: Palette) -> String {
  let totals: Totals = lists.iter().map(|l| &l.totals).sum();
  let cell = |n: usize| format!("[{}]", n);
  format!(
    "{}{}{}\n",
    palette.paint(cell(totals.overdue).white().bold().on_red()),
    palette.paint(cell(totals.due_today).white().bold().on_yellow()),
    palette.paint(cell(totals.due_this_week).white().bold().on_blue()),
  )
}
