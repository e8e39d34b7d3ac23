use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

use crate::app::{TaskDraft, TaskEdit};
use crate::dates::interpret_date;
use crate::display::DisplayOptions;
use crate::tasks::types::FilterOptions;

#[derive(Parser, Debug)]
#[command(name = "gtasks")]
#[command(about = "Google Tasks from the command line, with a local cache")]
#[command(version)]
pub struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/gtasks/config.yaml)
  #[arg(long, global = true)]
  pub config: Option<PathBuf>,

  /// Task list to use, by title (repeatable)
  #[arg(short = 'l', long = "list", global = true)]
  pub lists: Vec<String>,

  /// Use all task lists
  #[arg(short = 'L', long = "all", global = true, conflicts_with = "lists")]
  pub all: bool,

  /// Suppress feedback messages
  #[arg(short, long, global = true)]
  pub quiet: bool,

  /// Ask for confirmation before any change
  #[arg(short, long, global = true)]
  pub interactive: bool,

  /// Log debug output to stderr as well as the log file
  #[arg(long, global = true)]
  pub debug: bool,

  /// Skip the local cache and fetch live data
  #[arg(long = "no-cache", global = true)]
  pub no_cache: bool,

  #[command(flatten)]
  pub filter: FilterArgs,

  #[command(flatten)]
  pub display: DisplayArgs,

  #[command(subcommand)]
  pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// Show tasks (the default)
  Show,
  /// Show the task lists
  Lists,
  /// Print a one-line summary: [overdue][due today][due this week]
  Dashboard,
  /// Add a task
  Add(TaskArgs),
  /// Edit task <position>
  Edit {
    position: usize,
    #[command(flatten)]
    task: TaskArgs,
  },
  /// Toggle task <position>'s complete status
  Complete { position: usize },
  /// Toggle task <position>'s deleted status
  Delete { position: usize },
  /// Clear completed tasks from a list
  Clear,
  /// Add a task list
  AddList { title: String },
  /// Rename a task list
  EditList { title: String, new_title: String },
  /// Delete a task list
  DeleteList { title: String },
  /// Update the cache and exit
  Refresh,
}

#[derive(ClapArgs, Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskArgs {
  /// Task title
  #[arg(short = 't', long)]
  pub title: Option<String>,

  /// Task notes
  #[arg(short = 'n', long)]
  pub notes: Option<String>,

  /// Due date: YYYY-MM-DD, today, tom, fri, nextmon, +3 ...
  #[arg(short = 'w', long = "when", allow_hyphen_values = true)]
  pub when: Option<String>,
}

impl TaskArgs {
  pub fn to_draft(&self, today: NaiveDate) -> Result<TaskDraft> {
    Ok(TaskDraft {
      title: self.title.clone(),
      notes: self.notes.clone(),
      due: self
        .when
        .as_deref()
        .map(|when| interpret_date(when, today))
        .transpose()?,
    })
  }
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct FilterArgs {
  /// Don't show completed tasks
  #[arg(long, global = true)]
  pub hide_complete: bool,

  /// Show deleted tasks
  #[arg(long, global = true)]
  pub show_deleted: bool,

  /// Show cleared (hidden) tasks
  #[arg(long, global = true)]
  pub show_hidden: bool,

  /// Show tasks due before <date>
  #[arg(long, global = true, allow_hyphen_values = true)]
  pub due_before: Option<String>,

  /// Show tasks due after <date>; needs --due-before
  #[arg(long, global = true, allow_hyphen_values = true)]
  pub due_after: Option<String>,

  /// Show at most <n> tasks per list
  #[arg(long, global = true)]
  pub limit: Option<u32>,
}

impl FilterArgs {
  pub fn to_options(&self, today: NaiveDate) -> Result<FilterOptions> {
    if self.due_after.is_some() && self.due_before.is_none() {
      return Err(eyre!("Error, --due-after must be used in combination with --due-before"));
    }
    let date = |arg: &Option<String>| {
      arg
        .as_deref()
        .map(|d| interpret_date(d, today))
        .transpose()
    };

    Ok(FilterOptions {
      // Hidden tasks are cleared completed ones
      include_complete: !self.hide_complete || self.show_hidden,
      include_deleted: self.show_deleted,
      include_hidden: self.show_hidden,
      due_min: date(&self.due_after)?,
      due_max: date(&self.due_before)?,
      result_limit: self.limit,
    })
  }
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct DisplayArgs {
  /// Show task notes
  #[arg(long, global = true)]
  pub show_notes: bool,

  /// Show list totals
  #[arg(long, global = true)]
  pub totals: bool,

  /// Don't show empty lists in the task view
  #[arg(long, global = true)]
  pub hide_empty: bool,

  /// Don't show when tasks are due
  #[arg(long, global = true)]
  pub hide_when: bool,

  /// Don't show the list again after a change
  #[arg(long, global = true)]
  pub no_show_after: bool,
}

impl DisplayArgs {
  pub fn to_options(&self, filter: &FilterOptions) -> DisplayOptions {
    let dated = filter.due_min.is_some() || filter.due_max.is_some();
    DisplayOptions {
      notes: self.show_notes,
      when: !self.hide_when || dated,
      totals: self.totals,
      empty_lists: !self.hide_empty,
    }
  }
}

impl Command {
  /// The edit a task command makes, if it is one.
  pub fn task_edit(&self, today: NaiveDate) -> Result<Option<(usize, TaskEdit)>> {
    Ok(match self {
      Command::Edit { position, task } => {
        Some((*position, TaskEdit::Update(task.to_draft(today)?)))
      }
      Command::Complete { position } => Some((*position, TaskEdit::ToggleComplete)),
      Command::Delete { position } => Some((*position, TaskEdit::ToggleDeleted)),
      _ => None,
    })
  }

  /// Whether the command changes tasks in one list.
  pub fn changes_tasks(&self) -> bool {
    matches!(
      self,
      Command::Add(_)
        | Command::Edit { .. }
        | Command::Complete { .. }
        | Command::Delete { .. }
        | Command::Clear
    )
  }
}
