use std::future::Future;

use color_eyre::{eyre::eyre, Result};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::Config;

use super::api_types::{ApiListBody, ApiListsPage, RemoteList, RemoteTask, TaskPage, TaskPatch};
use super::types::{rfc3339_date, FilterOptions};

/// Page size requested from the service; it caps this at 100.
const MAX_PAGE_SIZE: u32 = 100;

/// The remote task-list service as the cache sees it.
///
/// Everything the client needs goes through this narrow interface so the
/// cache and reconciliation logic can run against an in-memory fake.
pub trait TaskService: Send + Sync + 'static {
  /// The list the service considers the user's default.
  fn default_task_list(&self) -> impl Future<Output = Result<RemoteList>> + Send;

  fn list_task_lists(&self) -> impl Future<Output = Result<Vec<RemoteList>>> + Send;

  /// One page of tasks. `page_token` comes from the previous page.
  fn list_tasks(
    &self,
    list_id: &str,
    filter: &FilterOptions,
    page_token: Option<&str>,
  ) -> impl Future<Output = Result<TaskPage>> + Send;

  fn create_task_list(&self, title: &str) -> impl Future<Output = Result<RemoteList>> + Send;

  fn delete_task_list(&self, list_id: &str) -> impl Future<Output = Result<()>> + Send;

  fn update_task_list(
    &self,
    list_id: &str,
    title: &str,
  ) -> impl Future<Output = Result<RemoteList>> + Send;

  fn create_task(
    &self,
    list_id: &str,
    task: &RemoteTask,
  ) -> impl Future<Output = Result<RemoteTask>> + Send;

  /// Change only the fields set in `patch`.
  fn update_task(
    &self,
    list_id: &str,
    task_id: &str,
    patch: &TaskPatch,
  ) -> impl Future<Output = Result<RemoteTask>> + Send;

  fn clear_completed_tasks(&self, list_id: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Google Tasks API client
#[derive(Clone)]
pub struct GoogleTasksClient {
  http: reqwest::Client,
  base: Url,
  token: String,
}

impl GoogleTasksClient {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::get_access_token()?;

    let base = Url::parse(&config.api_url)
      .map_err(|e| eyre!("Invalid api_url {}: {}", config.api_url, e))?;
    if base.cannot_be_a_base() {
      return Err(eyre!("Invalid api_url {}: not a base URL", config.api_url));
    }

    let http = reqwest::Client::builder()
      .user_agent(concat!("gtasks/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base, token })
  }

  /// Build an endpoint URL from path segments, escaping each one.
  fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    // cannot_be_a_base was rejected in new()
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    self.http.request(method, url).bearer_auth(&self.token)
  }

  async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
    let response = self
      .send_empty(request, what)
      .await?;
    response
      .json::<T>()
      .await
      .map_err(|e| eyre!("Failed to parse response for {}: {}", what, e))
  }

  async fn send_empty(&self, request: RequestBuilder, what: &str) -> Result<reqwest::Response> {
    let response = request
      .send()
      .await
      .map_err(|e| eyre!("Failed to {}: {}", what, e))?;
    debug!(status = %response.status(), url = %response.url(), "task service response");
    response
      .error_for_status()
      .map_err(|e| eyre!("Failed to {}: {}", what, e))
  }
}

impl TaskService for GoogleTasksClient {
  async fn default_task_list(&self) -> Result<RemoteList> {
    let url = self.endpoint(&["users", "@me", "lists", "@default"]);
    self
      .send(self.request(Method::GET, url), "get default task list")
      .await
  }

  async fn list_task_lists(&self) -> Result<Vec<RemoteList>> {
    let mut all_lists = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
      let mut url = self.endpoint(&["users", "@me", "lists"]);
      {
        let mut query = url.query_pairs_mut();
        query.append_pair("maxResults", &MAX_PAGE_SIZE.to_string());
        if let Some(token) = &page_token {
          query.append_pair("pageToken", token);
        }
      }

      let page: ApiListsPage = self
        .send(self.request(Method::GET, url), "list task lists")
        .await?;
      all_lists.extend(page.items);

      match page.next_page_token {
        Some(token) => page_token = Some(token),
        None => break,
      }
    }

    Ok(all_lists)
  }

  async fn list_tasks(
    &self,
    list_id: &str,
    filter: &FilterOptions,
    page_token: Option<&str>,
  ) -> Result<TaskPage> {
    let mut url = self.endpoint(&["lists", list_id, "tasks"]);
    {
      let mut query = url.query_pairs_mut();
      query
        .append_pair("showCompleted", &filter.include_complete.to_string())
        .append_pair("showDeleted", &filter.include_deleted.to_string())
        .append_pair("showHidden", &filter.include_hidden.to_string());
      if let Some(min) = filter.due_min {
        query.append_pair("dueMin", &rfc3339_date(min));
      }
      if let Some(max) = filter.due_max {
        query.append_pair("dueMax", &rfc3339_date(max));
      }
      let page_size = filter
        .result_limit
        .map_or(MAX_PAGE_SIZE, |limit| limit.clamp(1, MAX_PAGE_SIZE));
      query.append_pair("maxResults", &page_size.to_string());
      if let Some(token) = page_token {
        query.append_pair("pageToken", token);
      }
    }

    self
      .send(self.request(Method::GET, url), "list tasks")
      .await
  }

  async fn create_task_list(&self, title: &str) -> Result<RemoteList> {
    let url = self.endpoint(&["users", "@me", "lists"]);
    let request = self
      .request(Method::POST, url)
      .json(&ApiListBody { title });
    self.send(request, "create task list").await
  }

  async fn delete_task_list(&self, list_id: &str) -> Result<()> {
    let url = self.endpoint(&["users", "@me", "lists", list_id]);
    self
      .send_empty(self.request(Method::DELETE, url), "delete task list")
      .await?;
    Ok(())
  }

  async fn update_task_list(&self, list_id: &str, title: &str) -> Result<RemoteList> {
    let url = self.endpoint(&["users", "@me", "lists", list_id]);
    let request = self
      .request(Method::PATCH, url)
      .json(&ApiListBody { title });
    self.send(request, "update task list").await
  }

  async fn create_task(&self, list_id: &str, task: &RemoteTask) -> Result<RemoteTask> {
    let url = self.endpoint(&["lists", list_id, "tasks"]);
    let request = self.request(Method::POST, url).json(task);
    self.send(request, "create task").await
  }

  async fn update_task(
    &self,
    list_id: &str,
    task_id: &str,
    patch: &TaskPatch,
  ) -> Result<RemoteTask> {
    let url = self.endpoint(&["lists", list_id, "tasks", task_id]);
    let request = self.request(Method::PATCH, url).json(patch);
    self.send(request, "update task").await
  }

  async fn clear_completed_tasks(&self, list_id: &str) -> Result<()> {
    let url = self.endpoint(&["lists", list_id, "clear"]);
    self
      .send_empty(self.request(Method::POST, url), "clear completed tasks")
      .await?;
    Ok(())
  }
}
