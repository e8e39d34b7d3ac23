//! Fetch lists from the task service, classify them and write them to the
//! cache.

use chrono::NaiveDate;
use color_eyre::Result;
use futures::{stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

use super::key::CacheKey;
use super::storage::CacheStorage;
use crate::tasks::api_types::RemoteList;
use crate::tasks::client::TaskService;
use crate::tasks::status::classify;
use crate::tasks::types::{FilterOptions, ListSnapshot};

/// How many lists are fetched at once.
const CONCURRENT_LISTS: usize = 4;

/// Lists fetched live, and requested titles the service doesn't have.
#[derive(Debug, Default)]
pub struct Fetched {
  pub found: Vec<ListSnapshot>,
  pub missing: Vec<String>,
}

pub struct Fetcher<S> {
  service: Arc<S>,
  store: Arc<dyn CacheStorage>,
  today: NaiveDate,
}

impl<S> Clone for Fetcher<S> {
  fn clone(&self) -> Self {
    Self {
      service: Arc::clone(&self.service),
      store: Arc::clone(&self.store),
      today: self.today,
    }
  }
}

impl<S: TaskService> Fetcher<S> {
  pub fn new(service: Arc<S>, store: Arc<dyn CacheStorage>, today: NaiveDate) -> Self {
    Self {
      service,
      store,
      today,
    }
  }

  pub fn store(&self) -> &dyn CacheStorage {
    self.store.as_ref()
  }

  pub fn today(&self) -> NaiveDate {
    self.today
  }

  /// Fetch `titles` (every list when empty) and cache each one.
  ///
  /// Fails only if the lists themselves can't be enumerated. A list whose
  /// tasks fail to load is reported as missing.
  pub async fn fetch(&self, options: &FilterOptions, titles: &[String]) -> Result<Fetched> {
    let all_lists = self.service.list_task_lists().await?;

    let mut missing = Vec::new();
    let wanted: Vec<RemoteList> = if titles.is_empty() {
      all_lists
    } else {
      titles
        .iter()
        .filter_map(|title| {
          let list = all_lists.iter().find(|l| &l.title == title).cloned();
          if list.is_none() {
            missing.push(title.clone());
          }
          list
        })
        .collect()
    };

    let loaded: Vec<(RemoteList, Result<ListSnapshot>)> = stream::iter(wanted)
      .map(|list| async move {
        let snapshot = self.load(&list, options).await;
        (list, snapshot)
      })
      .buffered(CONCURRENT_LISTS)
      .collect()
      .await;

    let mut found = Vec::new();
    for (list, snapshot) in loaded {
      match snapshot {
        Ok(snapshot) => {
          self.cache(options, &snapshot);
          found.push(snapshot);
        }
        Err(e) => {
          warn!(title = %list.title, "failed to load tasks: {:#}", e);
          missing.push(list.title);
        }
      }
    }

    debug!(found = found.len(), missing = missing.len(), "live fetch finished");
    Ok(Fetched { found, missing })
  }

  /// Read every page of a list's tasks, stopping at the result limit.
  pub async fn load(&self, list: &RemoteList, options: &FilterOptions) -> Result<ListSnapshot> {
    let limit = options.result_limit.map(|l| l as usize);
    let mut tasks = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
      let page = self
        .service
        .list_tasks(&list.id, options, page_token.as_deref())
        .await?;
      tasks.extend(page.items.iter().map(|raw| classify(raw, self.today)));

      if let Some(limit) = limit {
        if tasks.len() >= limit {
          tasks.truncate(limit);
          break;
        }
      }
      match page.next_page_token {
        Some(token) => page_token = Some(token),
        None => break,
      }
    }

    Ok(ListSnapshot::new(
      list.id.clone(),
      list.title.clone(),
      tasks,
    ))
  }

  /// Write a snapshot under its key. Failures only cost a future miss.
  pub fn cache(&self, options: &FilterOptions, list: &ListSnapshot) {
    let key = CacheKey::derive(&list.title, options);
    if let Err(e) = self.store.put(&key, list) {
      warn!(title = %list.title, "failed to cache list: {:#}", e);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::storage::FileStorage;
  use crate::tasks::fake::{task, FakeService};

  fn fetcher(service: FakeService) -> (tempfile::TempDir, Arc<FakeService>, Fetcher<FakeService>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStorage::open(dir.path()).unwrap());
    let service = Arc::new(service);
    let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
    let fetcher = Fetcher::new(Arc::clone(&service), store, today);
    (dir, service, fetcher)
  }

  #[tokio::test]
  async fn test_fetch_follows_pages_and_caches() {
    let tasks = (1..=5).map(|i| task(&format!("t{}", i))).collect();
    let (_dir, service, fetcher) = fetcher(FakeService::new().with_list("Work", tasks));
    let options = FilterOptions::default();

    let fetched = fetcher.fetch(&options, &["Work".to_string()]).await.unwrap();

    assert_eq!(fetched.found.len(), 1);
    assert_eq!(fetched.found[0].tasks.len(), 5);
    assert_eq!(fetched.found[0].tasks[4].position, 5);
    assert_eq!(service.calls("list_tasks"), 3);
    let key = CacheKey::derive("Work", &options);
    assert!(fetcher.store().get(&key).is_some());
  }

  #[tokio::test]
  async fn test_result_limit_stops_paging() {
    let tasks = (1..=5).map(|i| task(&format!("t{}", i))).collect();
    let (_dir, service, fetcher) = fetcher(FakeService::new().with_list("Work", tasks));
    let options = FilterOptions {
      result_limit: Some(3),
      ..Default::default()
    };

    let fetched = fetcher.fetch(&options, &["Work".to_string()]).await.unwrap();

    assert_eq!(fetched.found[0].tasks.len(), 3);
    assert_eq!(service.calls("list_tasks"), 2);
  }

  #[tokio::test]
  async fn test_unknown_titles_are_missing() {
    let (_dir, _service, fetcher) = fetcher(FakeService::new().with_list("Work", vec![]));

    let fetched = fetcher
      .fetch(
        &FilterOptions::default(),
        &["Nope".to_string(), "Work".to_string()],
      )
      .await
      .unwrap();

    assert_eq!(fetched.missing, vec!["Nope".to_string()]);
    assert_eq!(fetched.found[0].title, "Work");
  }

  #[tokio::test]
  async fn test_empty_titles_fetch_everything() {
    let (_dir, _service, fetcher) = fetcher(
      FakeService::new()
        .with_list("Work", vec![task("a")])
        .with_list("Home", vec![]),
    );

    let fetched = fetcher.fetch(&FilterOptions::default(), &[]).await.unwrap();

    let titles: Vec<_> = fetched.found.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["Work", "Home"]);
    assert!(fetched.missing.is_empty());
  }

  #[tokio::test]
  async fn test_service_down_is_an_error() {
    let (_dir, service, fetcher) = fetcher(FakeService::new().with_list("Work", vec![]));
    service.set_failing(true);

    assert!(fetcher.fetch(&FilterOptions::default(), &[]).await.is_err());
  }
}
