//! In-memory task service for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use color_eyre::{eyre::eyre, Result};

use super::api_types::{RemoteList, RemoteTask, TaskPage, TaskPatch, STATUS_COMPLETED};
use super::client::TaskService;
use super::types::FilterOptions;

#[derive(Default)]
struct State {
  lists: Vec<(RemoteList, Vec<RemoteTask>)>,
  calls: HashMap<&'static str, usize>,
  failing: bool,
  next_id: u64,
}

/// Fake service that serves pages of two tasks and counts calls.
#[derive(Default)]
pub struct FakeService {
  state: Mutex<State>,
}

const PAGE_SIZE: usize = 2;

impl FakeService {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_list(self, title: &str, tasks: Vec<RemoteTask>) -> Self {
    {
      let mut state = self.state.lock().unwrap();
      let id = format!("list-{}", state.lists.len() + 1);
      state.lists.push((
        RemoteList {
          id,
          title: title.to_string(),
        },
        tasks,
      ));
    }
    self
  }

  pub fn calls(&self, name: &str) -> usize {
    self
      .state
      .lock()
      .unwrap()
      .calls
      .get(name)
      .copied()
      .unwrap_or(0)
  }

  pub fn total_calls(&self) -> usize {
    self.state.lock().unwrap().calls.values().sum()
  }

  pub fn set_failing(&self, failing: bool) {
    self.state.lock().unwrap().failing = failing;
  }

  pub fn tasks_of(&self, title: &str) -> Vec<RemoteTask> {
    let state = self.state.lock().unwrap();
    state
      .lists
      .iter()
      .find(|(l, _)| l.title == title)
      .map(|(_, t)| t.clone())
      .unwrap_or_default()
  }

  pub fn titles(&self) -> Vec<String> {
    let state = self.state.lock().unwrap();
    state.lists.iter().map(|(l, _)| l.title.clone()).collect()
  }

  /// Record a call and fail if the service is marked as down.
  fn enter(&self, name: &'static str) -> Result<std::sync::MutexGuard<'_, State>> {
    let mut state = self.state.lock().unwrap();
    *state.calls.entry(name).or_default() += 1;
    if state.failing {
      return Err(eyre!("service unavailable"));
    }
    Ok(state)
  }
}

pub fn task(title: &str) -> RemoteTask {
  RemoteTask {
    id: format!("task-{}", title),
    title: title.to_string(),
    ..Default::default()
  }
}

impl TaskService for FakeService {
  async fn default_task_list(&self) -> Result<RemoteList> {
    let state = self.enter("default_task_list")?;
    state
      .lists
      .first()
      .map(|(l, _)| l.clone())
      .ok_or_else(|| eyre!("no lists"))
  }

  async fn list_task_lists(&self) -> Result<Vec<RemoteList>> {
    let state = self.enter("list_task_lists")?;
    Ok(state.lists.iter().map(|(l, _)| l.clone()).collect())
  }

  async fn list_tasks(
    &self,
    list_id: &str,
    filter: &FilterOptions,
    page_token: Option<&str>,
  ) -> Result<TaskPage> {
    let state = self.enter("list_tasks")?;
    let (_, tasks) = state
      .lists
      .iter()
      .find(|(l, _)| l.id == list_id)
      .ok_or_else(|| eyre!("no list {}", list_id))?;

    let visible: Vec<RemoteTask> = tasks
      .iter()
      .filter(|t| {
        let complete = t.status.as_deref() == Some(STATUS_COMPLETED) || t.completed.is_some();
        (filter.include_complete || !complete)
          && (filter.include_deleted || !t.deleted.unwrap_or(false))
          && (filter.include_hidden || !t.hidden.unwrap_or(false))
      })
      .cloned()
      .collect();

    let start: usize = page_token.map_or(Ok(0), |t| t.parse())?;
    let end = (start + PAGE_SIZE).min(visible.len());
    Ok(TaskPage {
      items: visible[start.min(end)..end].to_vec(),
      next_page_token: (end < visible.len()).then(|| end.to_string()),
    })
  }

  async fn create_task_list(&self, title: &str) -> Result<RemoteList> {
    let mut state = self.enter("create_task_list")?;
    let list = RemoteList {
      id: format!("list-{}", state.lists.len() + 1),
      title: title.to_string(),
    };
    state.lists.push((list.clone(), Vec::new()));
    Ok(list)
  }

  async fn delete_task_list(&self, list_id: &str) -> Result<()> {
    let mut state = self.enter("delete_task_list")?;
    state.lists.retain(|(l, _)| l.id != list_id);
    Ok(())
  }

  async fn update_task_list(&self, list_id: &str, title: &str) -> Result<RemoteList> {
    let mut state = self.enter("update_task_list")?;
    let (list, _) = state
      .lists
      .iter_mut()
      .find(|(l, _)| l.id == list_id)
      .ok_or_else(|| eyre!("no list {}", list_id))?;
    list.title = title.to_string();
    Ok(list.clone())
  }

  async fn create_task(&self, list_id: &str, task: &RemoteTask) -> Result<RemoteTask> {
    let mut state = self.enter("create_task")?;
    state.next_id += 1;
    let created = RemoteTask {
      id: format!("new-{}", state.next_id),
      ..task.clone()
    };
    let (_, tasks) = state
      .lists
      .iter_mut()
      .find(|(l, _)| l.id == list_id)
      .ok_or_else(|| eyre!("no list {}", list_id))?;
    tasks.insert(0, created.clone());
    Ok(created)
  }

  async fn update_task(
    &self,
    list_id: &str,
    task_id: &str,
    patch: &TaskPatch,
  ) -> Result<RemoteTask> {
    let mut state = self.enter("update_task")?;
    let (_, tasks) = state
      .lists
      .iter_mut()
      .find(|(l, _)| l.id == list_id)
      .ok_or_else(|| eyre!("no list {}", list_id))?;
    let task = tasks
      .iter_mut()
      .find(|t| t.id == task_id)
      .ok_or_else(|| eyre!("no task {}", task_id))?;

    if let Some(title) = &patch.title {
      task.title = title.clone();
    }
    if patch.notes.is_some() {
      task.notes = patch.notes.clone();
    }
    if patch.due.is_some() {
      task.due = patch.due.clone();
    }
    // Like the real service, reopening keeps the completion timestamp
    // unless the patch nulls it
    if let Some(status) = &patch.status {
      task.status = Some(status.clone());
      if status == STATUS_COMPLETED && task.completed.is_none() {
        task.completed = Some("2024-06-12T00:00:00.000Z".into());
      }
    }
    if let Some(completed) = &patch.completed {
      task.completed = completed.clone();
    }
    if patch.deleted.is_some() {
      task.deleted = patch.deleted;
    }
    Ok(task.clone())
  }

  async fn clear_completed_tasks(&self, list_id: &str) -> Result<()> {
    let mut state = self.enter("clear_completed_tasks")?;
    if let Some((_, tasks)) = state.lists.iter_mut().find(|(l, _)| l.id == list_id) {
      for task in tasks.iter_mut() {
        if task.completed.is_some() {
          task.hidden = Some(true);
        }
      }
    }
    Ok(())
  }
}
