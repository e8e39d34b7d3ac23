//! Cache layer that reconciles cached lists with live fetches.

use chrono::Duration;
use color_eyre::Result;
use tracing::{debug, warn};

use super::fetch::Fetcher;
use super::key::CacheKey;
use super::refresh::{RefreshOutcome, Refresher};
use super::storage::CacheEntry;
use crate::tasks::client::TaskService;
use crate::tasks::types::{FilterOptions, ListSnapshot};

/// Result of [`CacheLayer::resolve`].
#[derive(Debug, Default)]
pub struct Resolution {
  /// Requested order for explicit titles, alphabetical otherwise
  pub found: Vec<ListSnapshot>,
  /// Requested titles that could not be resolved
  pub missing: Vec<String>,
  /// The task service could not be reached
  pub remote_failed: bool,
}

struct CacheLookup {
  found: Vec<ListSnapshot>,
  missing: Vec<String>,
  expired: Vec<String>,
}

/// Cache layer that manages caching logic and network fetching.
///
/// Fresh hits are served directly. Stale hits are served once, dropped from
/// the store and refreshed in the background. Misses are fetched live and
/// cached.
pub struct CacheLayer<S> {
  fetcher: Fetcher<S>,
  /// `None` when caching is disabled
  refresher: Option<Refresher<S>>,
  /// How long before cached data is considered stale
  stale_time: Duration,
}

impl<S: TaskService> CacheLayer<S> {
  pub fn new(fetcher: Fetcher<S>, refresher: Option<Refresher<S>>) -> Self {
    Self {
      fetcher,
      refresher,
      stale_time: Duration::minutes(5),
    }
  }

  /// Set the stale time for cached data.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  /// Resolve lists by title, or every list when `titles` is empty.
  ///
  /// With `use_cache` false the cache is not read, but what is fetched is
  /// still written to it.
  pub async fn resolve(
    &self,
    options: &FilterOptions,
    titles: &[String],
    use_cache: bool,
  ) -> Resolution {
    let titles = dedup(titles);
    let mut found = Vec::new();
    let mut missing = Vec::new();
    let mut refreshing = false;

    if use_cache {
      let cached = self.lookup(options, &titles);
      found = cached.found;
      missing = cached.missing;

      if !cached.expired.is_empty() {
        self.refresh_in_background(options, cached.expired);
        refreshing = true;
      }
    }

    let live_titles = if !missing.is_empty() {
      // Some requested lists weren't cached
      Some(std::mem::take(&mut missing))
    } else if found.is_empty() {
      // Nothing cached at all
      Some(titles.clone())
    } else {
      if titles.is_empty() && !refreshing {
        // Keep the cache warm while browsing everything
        self.refresh_in_background(options, Vec::new());
      }
      None
    };

    let mut remote_failed = false;
    if let Some(wanted) = live_titles {
      match self.fetcher.fetch(options, &wanted).await {
        Ok(fetched) => {
          for list in &fetched.found {
            debug!(title = %list.title, "found in task service");
          }
          found.extend(fetched.found);
          missing = fetched.missing;
        }
        Err(e) => {
          warn!("task service unavailable: {:#}", e);
          remote_failed = true;
          missing = wanted;
        }
      }
    }

    if titles.is_empty() {
      found.sort_by_key(|list| list.title.to_lowercase());
    } else {
      found.sort_by_key(|list| titles.iter().position(|t| *t == list.title));
      missing.sort_by_key(|title| titles.iter().position(|t| t == title));
    }

    Resolution {
      found,
      missing,
      remote_failed,
    }
  }

  /// Split the request into cached lists and titles that need a fetch,
  /// removing expired entries on the way.
  fn lookup(&self, options: &FilterOptions, titles: &[String]) -> CacheLookup {
    let store = self.fetcher.store();
    let mut entries: Vec<CacheEntry> = Vec::new();
    let mut missing = Vec::new();

    if titles.is_empty() {
      let keys = store.keys().unwrap_or_else(|e| {
        warn!("failed to enumerate cache: {:#}", e);
        Vec::new()
      });
      entries.extend(
        keys
          .iter()
          .filter(|key| key.matches_options(options))
          .filter_map(|key| store.get(key)),
      );
    } else {
      for title in titles {
        match store.get(&CacheKey::derive(title, options)) {
          Some(entry) => entries.push(entry),
          None => {
            debug!(%title, "missing from cache");
            missing.push(title.clone());
          }
        }
      }
    }

    let mut expired = Vec::new();
    let mut found = Vec::with_capacity(entries.len());
    for entry in entries {
      if store.is_stale(&entry, self.stale_time) {
        // Served once more below, but no longer a hit for the next read
        if let Err(e) = store.remove(&entry.key) {
          warn!("failed to expire cache entry: {:#}", e);
        }
        expired.push(entry.payload.title.clone());
      }
      debug!(title = %entry.payload.title, "found in cache");
      found.push(entry.payload.rebase(self.fetcher.today()));
    }

    CacheLookup {
      found,
      missing,
      expired,
    }
  }

  /// Whether lists are cached at all.
  pub fn is_caching(&self) -> bool {
    self.refresher.is_some()
  }

  /// Start a background refresh, if caching is enabled.
  pub fn refresh_in_background(&self, options: &FilterOptions, titles: Vec<String>) {
    if let Some(refresher) = &self.refresher {
      refresher.spawn(options.clone(), titles);
    }
  }

  /// Refresh the cache in the foreground.
  pub async fn refresh_now(
    &self,
    options: &FilterOptions,
    titles: &[String],
  ) -> Result<RefreshOutcome> {
    match &self.refresher {
      Some(refresher) => refresher.refresh_now(options, &dedup(titles)).await,
      None => Ok(RefreshOutcome::Skipped),
    }
  }

  /// Drop every cached entry of `titles`, whatever options they were
  /// fetched with.
  pub fn invalidate(&self, titles: &[String]) {
    if titles.is_empty() {
      return;
    }
    if let Err(e) = self.fetcher.store().delete(titles) {
      warn!(?titles, "failed to invalidate cache: {:#}", e);
    }
  }

  /// Cache a list built outside a fetch, e.g. one just created.
  pub fn store(&self, options: &FilterOptions, list: &ListSnapshot) {
    self.fetcher.cache(options, list);
  }

  /// Let in-flight background refreshes finish.
  pub async fn wait_for_refreshes(&self) {
    if let Some(refresher) = &self.refresher {
      refresher.wait().await;
    }
  }
}

/// Drop repeated titles, keeping first occurrences in order.
fn dedup(titles: &[String]) -> Vec<String> {
  let mut seen = std::collections::HashSet::new();
  titles
    .iter()
    .filter(|t| seen.insert(t.as_str()))
    .cloned()
    .collect()
}
