use chrono::NaiveDate;
use color_eyre::{eyre::eyre, Result};
use std::fmt::Display;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{CacheLayer, CacheStorage, RefreshOutcome};
use crate::display::{self, DisplayOptions, Palette};
use crate::settings::Settings;
use crate::tasks::api_types::{RemoteTask, TaskPatch};
use crate::tasks::client::TaskService;
use crate::tasks::types::{rfc3339_date, FilterOptions, ListSnapshot};

/// Fields to set on a new or edited task. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
  pub title: Option<String>,
  pub notes: Option<String>,
  pub due: Option<NaiveDate>,
}

impl TaskDraft {
  fn is_empty(&self) -> bool {
    self.title.is_none() && self.notes.is_none() && self.due.is_none()
  }
}

/// Change applied to an existing task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEdit {
  Update(TaskDraft),
  ToggleComplete,
  ToggleDeleted,
}

/// How a command behaves, gathered from flags and config.
#[derive(Debug, Clone)]
pub struct Session {
  pub filter: FilterOptions,
  pub display: DisplayOptions,
  pub palette: Palette,
  pub quiet: bool,
  /// Ask before every change
  pub interactive: bool,
  pub use_cache: bool,
}

/// Writes command output and feedback lines. Feedback is dropped in quiet
/// mode; output never is.
pub struct Feedback {
  out: Box<dyn Write>,
  quiet: bool,
}

impl Feedback {
  pub fn new(out: Box<dyn Write>, quiet: bool) -> Self {
    Self { out, quiet }
  }

  pub fn say(&mut self, message: impl Display) -> Result<()> {
    if self.quiet {
      return Ok(());
    }
    writeln!(self.out, "{}", message).map_err(|e| eyre!("Failed to write output: {}", e))
  }

  pub fn print(&mut self, text: &str) -> Result<()> {
    self
      .out
      .write_all(text.as_bytes())
      .and_then(|_| self.out.flush())
      .map_err(|e| eyre!("Failed to write output: {}", e))
  }
}

/// Main application state
pub struct App<S> {
  service: Arc<S>,
  cache: CacheLayer<S>,
  session: Session,
  feedback: Feedback,
  input: Box<dyn BufRead>,
  /// Set when a command could not do what was asked
  failed: bool,
}

impl<S: TaskService> App<S> {
  pub fn new(
    service: Arc<S>,
    cache: CacheLayer<S>,
    session: Session,
    out: Box<dyn Write>,
    input: Box<dyn BufRead>,
  ) -> Self {
    let feedback = Feedback::new(out, session.quiet);
    Self {
      service,
      cache,
      session,
      feedback,
      input,
      failed: false,
    }
  }

  pub fn failed(&self) -> bool {
    self.failed
  }

  fn fail(&mut self, message: impl Display) -> Result<()> {
    self.failed = true;
    self.feedback.say(message)
  }

  /// Resolve lists and report the ones that could not be found.
  async fn lists(&mut self, titles: &[String], use_cache: bool) -> Result<Vec<ListSnapshot>> {
    let resolved = self
      .cache
      .resolve(&self.session.filter, titles, use_cache)
      .await;

    if resolved.remote_failed {
      self.fail("Error, problem talking with the task service")?;
    }
    for title in &resolved.missing {
      if !resolved.remote_failed {
        self.failed = true;
      }
      self
        .feedback
        .say(format!("Error, list \"{}\" not found", title))?;
    }
    Ok(resolved.found)
  }

  /// The single list a change applies to.
  async fn target(&mut self, title: &str) -> Result<Option<ListSnapshot>> {
    let use_cache = self.session.use_cache;
    let mut lists = self.lists(&[title.to_string()], use_cache).await?;
    Ok(if lists.is_empty() {
      None
    } else {
      Some(lists.swap_remove(0))
    })
  }

  /// Ask before a change. Always yes outside interactive mode.
  fn confirm(&mut self, question: &str) -> Result<bool> {
    if !self.session.interactive {
      return Ok(true);
    }
    self.feedback.print(&format!("{}? [y/n] ", question))?;
    let mut answer = String::new();
    self
      .input
      .read_line(&mut answer)
      .map_err(|e| eyre!("Failed to read answer: {}", e))?;
    Ok(answer.trim() == "y")
  }

  pub async fn show_tasks(&mut self, titles: &[String]) -> Result<()> {
    let use_cache = self.session.use_cache;
    let lists = self.lists(titles, use_cache).await?;
    let text = display::render_tasks(
      &lists,
      &self.session.filter,
      &self.session.display,
      self.session.palette,
    );
    self.feedback.print(&text)
  }

  pub async fn show_lists(&mut self, titles: &[String]) -> Result<()> {
    let use_cache = self.session.use_cache;
    let lists = self.lists(titles, use_cache).await?;
    let text = display::render_lists(&lists, &self.session.display);
    self.feedback.print(&text)
  }

  pub async fn show_dashboard(&mut self, titles: &[String]) -> Result<()> {
    let use_cache = self.session.use_cache;
    let lists = self.lists(titles, use_cache).await?;
    let text = display::render_dashboard(&lists, self.session.palette);
    self.feedback.print(&text)
  }

  pub async fn add_list(&mut self, title: &str) -> Result<bool> {
    if title.trim().is_empty() {
      self.fail("Error, missing list title")?;
      return Ok(false);
    }
    if !self.confirm(&format!("Add list: \"{}\"", title))? {
      return Ok(false);
    }

    match self.service.create_task_list(title).await {
      Ok(created) => {
        self.cache.invalidate(&[created.title.clone()]);
        let list = ListSnapshot::new(created.id, created.title, Vec::new());
        self.cache.store(&self.session.filter, &list);
        info!(title = %list.title, "list added");
        self.feedback.say(format!("List \"{}\" added", list.title))?;
      }
      Err(e) => {
        warn!("failed to add list: {:#}", e);
        self.fail("Error, problem adding new list")?;
      }
    }
    Ok(true)
  }

  pub async fn edit_list(&mut self, title: &str, new_title: &str) -> Result<bool> {
    if new_title.trim().is_empty() {
      self.fail("Error, missing new list title")?;
      return Ok(false);
    }
    if !self.confirm(&format!("Edit list: \"{}\"", title))? {
      return Ok(false);
    }
    let Some(list) = self.target(title).await? else {
      return Ok(false);
    };

    let result = self.service.update_task_list(&list.id, new_title).await;
    self
      .cache
      .invalidate(&[list.title.clone(), new_title.to_string()]);
    match result {
      Ok(updated) => {
        info!(from = %list.title, to = %updated.title, "list renamed");
        self.feedback.say(format!("List \"{}\" updated", updated.title))?;
      }
      Err(e) => {
        warn!("failed to rename list: {:#}", e);
        self.fail("Error, problem updating list")?;
      }
    }
    Ok(true)
  }

  pub async fn delete_list(&mut self, title: &str) -> Result<bool> {
    if !self.confirm(&format!("Delete list: \"{}\"", title))? {
      return Ok(false);
    }
    let Some(list) = self.target(title).await? else {
      return Ok(false);
    };

    let result = self.service.delete_task_list(&list.id).await;
    self.cache.invalidate(&[list.title.clone()]);
    match result {
      Ok(()) => {
        info!(title = %list.title, "list deleted");
        self.feedback.say(format!("List \"{}\" deleted", list.title))?;
      }
      Err(e) => {
        warn!("failed to delete list: {:#}", e);
        self.fail("Error, problem deleting list")?;
      }
    }
    Ok(true)
  }

  pub async fn add_task(&mut self, list_title: &str, draft: TaskDraft) -> Result<bool> {
    let Some(title) = draft.title.clone().filter(|t| !t.trim().is_empty()) else {
      self.fail("Error, missing title. Task not added")?;
      return Ok(false);
    };
    if !self.confirm(&format!("Add task: \"{}\"", title))? {
      return Ok(false);
    }
    let Some(list) = self.target(list_title).await? else {
      return Ok(false);
    };

    let task = RemoteTask {
      title: title.clone(),
      notes: draft.notes,
      due: draft.due.map(rfc3339_date),
      ..Default::default()
    };
    let result = self.service.create_task(&list.id, &task).await;
    self.cache.invalidate(&[list.title.clone()]);
    match result {
      Ok(created) => {
        debug!(id = %created.id, "task created");
        self.feedback.say(format!("Task \"{}\" added", title))?;
      }
      Err(e) => {
        warn!("failed to add task: {:#}", e);
        self.fail("There was an error adding the task")?;
      }
    }
    Ok(true)
  }

  /// Change the task at a 1-based `position` in the list as last shown.
  pub async fn edit_task(&mut self, list_title: &str, position: usize, edit: TaskEdit) -> Result<bool> {
    if matches!(&edit, TaskEdit::Update(draft) if draft.is_empty()) {
      self.fail("Error, nothing to update")?;
      return Ok(false);
    }
    let Some(list) = self.target(list_title).await? else {
      return Ok(false);
    };
    let Some(task) = list.task(position).cloned() else {
      self.fail("Error, task not found")?;
      return Ok(false);
    };
    if !self.confirm(&format!("Update task: \"{}\"", task.title))? {
      return Ok(false);
    }

    let (patch, action) = match edit {
      TaskEdit::ToggleComplete if task.complete => (TaskPatch::reopen(), "marked incomplete"),
      TaskEdit::ToggleComplete => (TaskPatch::complete(), "marked complete"),
      TaskEdit::ToggleDeleted => {
        let patch = TaskPatch {
          deleted: Some(!task.deleted),
          ..Default::default()
        };
        (patch, if task.deleted { "undeleted" } else { "deleted" })
      }
      TaskEdit::Update(draft) => {
        let patch = TaskPatch {
          title: draft.title,
          notes: draft.notes,
          due: draft.due.map(rfc3339_date),
          ..Default::default()
        };
        (patch, "updated")
      }
    };

    let result = self.service.update_task(&list.id, &task.id, &patch).await;
    self.cache.invalidate(&[list.title.clone()]);
    match result {
      Ok(updated) => {
        self
          .feedback
          .say(format!("Task \"{}\" {}", updated.title, action))?;
      }
      Err(e) => {
        warn!("failed to update task: {:#}", e);
        self.fail("Error, there was a problem updating the task")?;
      }
    }
    Ok(true)
  }

  pub async fn clear_completed(&mut self, list_title: &str) -> Result<bool> {
    let Some(list) = self.target(list_title).await? else {
      return Ok(false);
    };
    if !self.confirm(&format!("Clear completed tasks from list: \"{}\"", list.title))? {
      return Ok(false);
    }

    let result = self.service.clear_completed_tasks(&list.id).await;
    self.cache.invalidate(&[list.title.clone()]);
    match result {
      Ok(()) => self.feedback.say(format!(
        "Completed tasks cleared from list \"{}\"",
        list.title
      ))?,
      Err(e) => {
        warn!("failed to clear completed tasks: {:#}", e);
        self.fail("Error, problem talking with the task service")?;
      }
    }
    Ok(true)
  }

  /// After a change: show the list again (fetched live, since its cache
  /// entries are gone) or just warm the cache for next time.
  pub async fn after_change(&mut self, list_title: &str, show: bool) -> Result<()> {
    let titles = [list_title.to_string()];
    if show {
      self.show_tasks(&titles).await
    } else {
      self
        .cache
        .refresh_in_background(&self.session.filter, titles.to_vec());
      Ok(())
    }
  }

  /// Update the cache in the foreground.
  pub async fn refresh(&mut self, titles: &[String]) -> Result<()> {
    if !self.cache.is_caching() {
      return self.fail("Error, caching is disabled");
    }
    match self.cache.refresh_now(&self.session.filter, titles).await {
      Ok(RefreshOutcome::Refreshed { lists, missing }) => {
        for title in &missing {
          self.fail(format!("Error, list \"{}\" not found", title))?;
        }
        self.feedback.say(format!("Cache updated, {} list(s)", lists))
      }
      Ok(RefreshOutcome::Skipped) => self.feedback.say("Cache update already running"),
      Err(e) => {
        warn!("cache refresh failed: {:#}", e);
        self.fail("Error, problem talking with the task service")
      }
    }
  }

  /// Let background refreshes finish before the process exits.
  pub async fn finish(&self) {
    self.cache.wait_for_refreshes().await;
  }
}

/// The list used when none is named: configured, remembered, or asked
/// from the service once and remembered.
pub async fn default_list_title<S: TaskService>(
  service: &S,
  configured: Option<&str>,
  settings: &mut Settings,
) -> Result<String> {
  if let Some(title) = configured {
    return Ok(title.to_string());
  }
  if let Some(title) = &settings.default_list {
    return Ok(title.clone());
  }
  let list = service
    .default_task_list()
    .await
    .map_err(|e| eyre!("Failed to find the default list: {}", e))?;
  settings.default_list = Some(list.title.clone());
  Ok(list.title)
}

/// Delete old cache entries, at most once per day. Returns whether a sweep
/// ran.
pub fn sweep_cache(
  store: &dyn CacheStorage,
  settings: &mut Settings,
  today: NaiveDate,
  max_age: chrono::Duration,
) -> bool {
  if !settings.sweep_due(today) {
    return false;
  }
  match store.sweep(max_age) {
    Ok(removed) => debug!(removed, "swept cache"),
    Err(e) => warn!("cache sweep failed: {:#}", e),
  }
  settings.last_sweep = Some(today);
  true
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::lock::RefreshLock;
  use crate::cache::key::CacheKey;
  use crate::cache::{Fetcher, FileStorage, Refresher};
  use crate::tasks::api_types::{STATUS_COMPLETED, STATUS_NEEDS_ACTION};
  use crate::tasks::fake::{task, FakeService};
  use std::io::Cursor;
  use std::sync::Mutex;

  #[derive(Clone, Default)]
  struct Captured(Arc<Mutex<Vec<u8>>>);

  impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
      self.0.lock().unwrap().extend_from_slice(buf);
      Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
      Ok(())
    }
  }

  impl Captured {
    fn text(&self) -> String {
      String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
  }

  struct Harness {
    _dir: tempfile::TempDir,
    service: Arc<FakeService>,
    store: Arc<FileStorage>,
    out: Captured,
    app: App<FakeService>,
  }

  fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
  }

  fn session() -> Session {
    Session {
      filter: FilterOptions::default(),
      display: DisplayOptions::default(),
      palette: Palette::plain(),
      quiet: false,
      interactive: false,
      use_cache: true,
    }
  }

  fn harness_with(service: FakeService, session: Session, input: &str) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStorage::open(dir.path()).unwrap());
    let service = Arc::new(service);
    let fetcher = Fetcher::new(Arc::clone(&service), store.clone(), today());
    let lock = RefreshLock::in_dir(dir.path());
    let refresher = Refresher::new(fetcher.clone(), lock);
    let cache = CacheLayer::new(fetcher, Some(refresher));
    let out = Captured::default();
    let app = App::new(
      Arc::clone(&service),
      cache,
      session,
      Box::new(out.clone()),
      Box::new(Cursor::new(input.to_string().into_bytes())),
    );
    Harness {
      _dir: dir,
      service,
      store,
      out,
      app,
    }
  }

  fn harness(service: FakeService) -> Harness {
    harness_with(service, session(), "")
  }

  fn groceries() -> FakeService {
    FakeService::new().with_list("Groceries", vec![task("milk"), task("eggs")])
  }

  #[tokio::test]
  async fn test_show_tasks_prints_list() {
    let mut h = harness(groceries());

    h.app.show_tasks(&["Groceries".to_string()]).await.unwrap();

    let out = h.out.text();
    assert!(out.contains("Groceries\n---------\n 1. milk\n 2. eggs\n"));
    assert!(!h.app.failed());
  }

  #[tokio::test]
  async fn test_missing_list_is_reported() {
    let mut h = harness(groceries());

    h.app.show_tasks(&["Chores".to_string()]).await.unwrap();

    assert!(h.out.text().contains("Error, list \"Chores\" not found"));
    assert!(h.app.failed());
  }

  #[tokio::test]
  async fn test_quiet_mode_drops_feedback_only() {
    let mut h = harness_with(
      groceries(),
      Session {
        quiet: true,
        ..session()
      },
      "",
    );

    h.app
      .show_tasks(&["Groceries".to_string(), "Chores".to_string()])
      .await
      .unwrap();

    let out = h.out.text();
    assert!(!out.contains("not found"));
    assert!(out.contains("1. milk"));
  }

  #[tokio::test]
  async fn test_add_task_requires_title_before_any_call() {
    let mut h = harness(groceries());

    let changed = h
      .app
      .add_task("Groceries", TaskDraft::default())
      .await
      .unwrap();

    assert!(!changed);
    assert_eq!(h.service.total_calls(), 0);
    assert!(h.out.text().contains("Error, missing title. Task not added"));
  }

  #[tokio::test]
  async fn test_add_task_invalidates_cache() {
    let mut h = harness(groceries());
    let titles = ["Groceries".to_string()];
    h.app.show_tasks(&titles).await.unwrap();
    assert_eq!(h.store.keys().unwrap().len(), 1);

    let draft = TaskDraft {
      title: Some("bread".into()),
      due: Some(today()),
      ..Default::default()
    };
    assert!(h.app.add_task("Groceries", draft).await.unwrap());

    assert!(h.out.text().contains("Task \"bread\" added"));
    assert!(h.store.keys().unwrap().is_empty());
    let remote = h.service.tasks_of("Groceries");
    assert_eq!(remote[0].title, "bread");
    assert_eq!(remote[0].due.as_deref(), Some("2024-06-12T00:00:00.000Z"));
  }

  #[tokio::test]
  async fn test_show_after_change_fetches_live() {
    let mut h = harness(groceries());
    let draft = TaskDraft {
      title: Some("bread".into()),
      ..Default::default()
    };
    h.app.add_task("Groceries", draft).await.unwrap();
    let before = h.service.calls("list_tasks");

    h.app.after_change("Groceries", true).await.unwrap();

    assert!(h.service.calls("list_tasks") > before);
    assert!(h.out.text().contains(" 1. bread\n"));
  }

  #[tokio::test]
  async fn test_warm_after_change_refreshes_in_background() {
    let mut h = harness(groceries());

    h.app.after_change("Groceries", false).await.unwrap();
    h.app.finish().await;

    let key = CacheKey::derive("Groceries", &FilterOptions::default());
    assert!(h.store.get(&key).is_some());
  }

  #[tokio::test]
  async fn test_toggle_complete_and_back() {
    let mut h = harness(groceries());

    h.app
      .edit_task("Groceries", 2, TaskEdit::ToggleComplete)
      .await
      .unwrap();
    assert!(h.out.text().contains("Task \"eggs\" marked complete"));
    let eggs = &h.service.tasks_of("Groceries")[1];
    assert_eq!(eggs.status.as_deref(), Some(STATUS_COMPLETED));
    assert!(eggs.completed.is_some());

    h.app
      .edit_task("Groceries", 2, TaskEdit::ToggleComplete)
      .await
      .unwrap();
    assert!(h.out.text().contains("Task \"eggs\" marked incomplete"));
    let eggs = &h.service.tasks_of("Groceries")[1];
    assert_eq!(eggs.status.as_deref(), Some(STATUS_NEEDS_ACTION));
    assert!(eggs.completed.is_none());

    // A fresh fetch agrees the task is open again
    let lists = h
      .app
      .cache
      .resolve(&FilterOptions::default(), &["Groceries".to_string()], false)
      .await
      .found;
    let eggs = lists[0].task(2).unwrap();
    assert!(!eggs.complete);
    assert_eq!(lists[0].totals.complete, 0);
  }

  #[tokio::test]
  async fn test_toggle_deleted() {
    let mut h = harness(groceries());

    h.app
      .edit_task("Groceries", 1, TaskEdit::ToggleDeleted)
      .await
      .unwrap();

    assert!(h.out.text().contains("Task \"milk\" deleted"));
    assert_eq!(h.service.tasks_of("Groceries")[0].deleted, Some(true));
  }

  #[tokio::test]
  async fn test_edit_unknown_position() {
    let mut h = harness(groceries());

    let changed = h
      .app
      .edit_task("Groceries", 9, TaskEdit::ToggleComplete)
      .await
      .unwrap();

    assert!(!changed);
    assert!(h.out.text().contains("Error, task not found"));
    assert_eq!(h.service.calls("update_task"), 0);
  }

  #[tokio::test]
  async fn test_update_keeps_unset_fields() {
    let mut h = harness(groceries());
    let draft = TaskDraft {
      notes: Some("semi-skimmed".into()),
      ..Default::default()
    };

    h.app
      .edit_task("Groceries", 1, TaskEdit::Update(draft))
      .await
      .unwrap();

    let milk = &h.service.tasks_of("Groceries")[0];
    assert_eq!(milk.title, "milk");
    assert_eq!(milk.notes.as_deref(), Some("semi-skimmed"));
    assert!(h.out.text().contains("Task \"milk\" updated"));
  }

  #[tokio::test]
  async fn test_declined_confirmation_changes_nothing() {
    let mut h = harness_with(
      groceries(),
      Session {
        interactive: true,
        ..session()
      },
      "n\n",
    );

    let changed = h
      .app
      .edit_task("Groceries", 1, TaskEdit::ToggleDeleted)
      .await
      .unwrap();

    assert!(!changed);
    assert_eq!(h.service.calls("update_task"), 0);
    assert!(h.out.text().contains("Update task: \"milk\"? [y/n] "));
  }

  #[tokio::test]
  async fn test_list_lifecycle() {
    let mut h = harness(groceries());

    h.app.add_list("Chores").await.unwrap();
    assert!(h.out.text().contains("List \"Chores\" added"));
    // The new list is cached empty
    let key = CacheKey::derive("Chores", &FilterOptions::default());
    assert!(h.store.get(&key).unwrap().payload.tasks.is_empty());

    h.app.edit_list("Chores", "Housework").await.unwrap();
    assert!(h.out.text().contains("List \"Housework\" updated"));
    assert!(h.store.get(&key).is_none());

    h.app.delete_list("Housework").await.unwrap();
    assert!(h.out.text().contains("List \"Housework\" deleted"));
    assert_eq!(h.service.titles(), vec!["Groceries".to_string()]);
  }

  #[tokio::test]
  async fn test_edit_list_requires_new_title() {
    let mut h = harness(groceries());

    assert!(!h.app.edit_list("Groceries", " ").await.unwrap());
    assert_eq!(h.service.total_calls(), 0);
  }

  #[tokio::test]
  async fn test_clear_completed() {
    let mut h = harness(groceries());

    h.app.clear_completed("Groceries").await.unwrap();

    assert_eq!(h.service.calls("clear_completed_tasks"), 1);
    assert!(h
      .out
      .text()
      .contains("Completed tasks cleared from list \"Groceries\""));
  }

  #[tokio::test]
  async fn test_service_down_is_reported_once() {
    let mut h = harness(groceries());
    h.service.set_failing(true);

    h.app.show_tasks(&[]).await.unwrap();

    let out = h.out.text();
    assert_eq!(out.matches("problem talking with the task service").count(), 1);
    assert!(out.contains("no tasks found"));
    assert!(h.app.failed());
  }

  #[tokio::test]
  async fn test_refresh_reports_lists() {
    let mut h = harness(groceries());

    h.app.refresh(&[]).await.unwrap();

    assert!(h.out.text().contains("Cache updated, 1 list(s)"));
    assert_eq!(h.store.keys().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_default_list_is_fetched_once() {
    let service = groceries();
    let mut settings = Settings::default();

    let title = default_list_title(&service, None, &mut settings).await.unwrap();
    assert_eq!(title, "Groceries");
    assert_eq!(settings.default_list.as_deref(), Some("Groceries"));

    default_list_title(&service, None, &mut settings).await.unwrap();
    assert_eq!(service.calls("default_task_list"), 1);

    let configured = default_list_title(&service, Some("Work"), &mut settings)
      .await
      .unwrap();
    assert_eq!(configured, "Work");
  }

  #[test]
  fn test_sweep_runs_once_a_day() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStorage::open(dir.path()).unwrap();
    let mut settings = Settings::default();

    assert!(sweep_cache(&store, &mut settings, today(), chrono::Duration::days(2)));
    assert!(!sweep_cache(&store, &mut settings, today(), chrono::Duration::days(2)));
    assert_eq!(settings.last_sweep, Some(today()));
  }
}
