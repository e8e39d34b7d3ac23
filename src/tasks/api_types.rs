//! Wire types for the Google Tasks v1 REST API.

use serde::{Deserialize, Serialize};

/// A task list resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteList {
  pub id: String,
  pub title: String,
}

/// A task resource as the service returns it.
///
/// The same shape is sent back for inserts and patches; fields left at
/// their defaults are omitted from the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTask {
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub id: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  /// "needsAction" or "completed"
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<String>,
  /// RFC 3339 timestamp; only the date part is meaningful
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub due: Option<String>,
  /// RFC 3339 completion timestamp
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub completed: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub deleted: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub hidden: Option<bool>,
}

/// Body of a `tasks.patch` request.
///
/// Omitted fields keep their value on the server. `completed` is doubly
/// optional: `Some(None)` sends an explicit null, which is the only way to
/// drop the completion timestamp when a task is reopened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub due: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub completed: Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub deleted: Option<bool>,
}

impl TaskPatch {
  pub fn complete() -> Self {
    Self {
      status: Some(STATUS_COMPLETED.to_string()),
      ..Default::default()
    }
  }

  pub fn reopen() -> Self {
    Self {
      status: Some(STATUS_NEEDS_ACTION.to_string()),
      completed: Some(None),
      ..Default::default()
    }
  }
}

pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_NEEDS_ACTION: &str = "needsAction";

/// One page of tasks from `tasks.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
  #[serde(default)]
  pub items: Vec<RemoteTask>,
  pub next_page_token: Option<String>,
}

/// One page of lists from `tasklists.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiListsPage {
  #[serde(default)]
  pub items: Vec<RemoteList>,
  pub next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiListBody<'a> {
  pub title: &'a str,
}
