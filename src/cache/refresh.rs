//! Fire-and-forget cache refreshes.

use color_eyre::Result;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::fetch::Fetcher;
use super::lock::{Acquire, RefreshLock};
use crate::tasks::client::TaskService;
use crate::tasks::types::FilterOptions;

/// What a refresh did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
  /// Lists were re-fetched and written to the cache
  Refreshed { lists: usize, missing: Vec<String> },
  /// Another refresh holds the lock
  Skipped,
}

/// Re-fetches lists in the background and rewrites their cache entries.
///
/// Callers get no handle back. The refresher keeps the handles itself so the
/// process can let in-flight refreshes finish before it exits.
pub struct Refresher<S> {
  fetcher: Fetcher<S>,
  lock: Arc<RefreshLock>,
  pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl<S: TaskService> Refresher<S> {
  pub fn new(fetcher: Fetcher<S>, lock: RefreshLock) -> Self {
    Self {
      fetcher,
      lock: Arc::new(lock),
      pending: Arc::new(Mutex::new(Vec::new())),
    }
  }

  /// Start refreshing `titles` (every list when empty). Never blocks and
  /// never reports failure.
  pub fn spawn(&self, options: FilterOptions, titles: Vec<String>) {
    let fetcher = self.fetcher.clone();
    let lock = Arc::clone(&self.lock);

    debug!(?titles, "spawning background refresh");
    let handle = tokio::spawn(async move {
      match refresh(&fetcher, &lock, &options, &titles).await {
        Ok(outcome) => debug!(?outcome, ?titles, "background refresh finished"),
        Err(e) => debug!(?titles, "background refresh failed: {:#}", e),
      }
    });

    match self.pending.lock() {
      Ok(mut pending) => {
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
      }
      Err(e) => warn!("refresh bookkeeping poisoned: {}", e),
    }
  }

  /// Run a refresh in the foreground.
  pub async fn refresh_now(
    &self,
    options: &FilterOptions,
    titles: &[String],
  ) -> Result<RefreshOutcome> {
    refresh(&self.fetcher, &self.lock, options, titles).await
  }

  /// Wait for every spawned refresh to end.
  pub async fn wait(&self) {
    let handles = match self.pending.lock() {
      Ok(mut pending) => std::mem::take(&mut *pending),
      Err(_) => return,
    };

    for handle in handles {
      if let Err(e) = handle.await {
        if e.is_panic() {
          warn!("background refresh panicked: {}", e);
        }
      }
    }
  }
}

async fn refresh<S: TaskService>(
  fetcher: &Fetcher<S>,
  lock: &RefreshLock,
  options: &FilterOptions,
  titles: &[String],
) -> Result<RefreshOutcome> {
  // Released on every exit path when the guard drops
  let _guard = match lock.try_acquire()? {
    Acquire::Held(guard) => guard,
    Acquire::Busy => {
      debug!(lock = %lock.path().display(), "refresh already running, skipping");
      return Ok(RefreshOutcome::Skipped);
    }
  };

  let fetched = fetcher.fetch(options, titles).await?;
  Ok(RefreshOutcome::Refreshed {
    lists: fetched.found.len(),
    missing: fetched.missing,
  })
}
