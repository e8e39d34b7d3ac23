//! Cache storage trait and file-per-entry implementation.

use chrono::{DateTime, Duration, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use super::key::CacheKey;
use crate::tasks::types::ListSnapshot;

/// Bump when the on-disk layout of [`ListSnapshot`] changes. Files with any
/// other version are discarded as corrupt.
const CACHE_FORMAT_VERSION: u32 = 1;

/// A cached list snapshot.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  pub key: CacheKey,
  pub payload: ListSnapshot,
  /// When the entry was last written
  pub last_written: DateTime<Utc>,
}

impl CacheEntry {
  pub fn age(&self, now: DateTime<Utc>) -> Duration {
    now - self.last_written
  }

  pub fn is_stale_at(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
    self.age(now) > ttl
  }
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Read an entry. Missing and unreadable entries are both `None`.
  fn get(&self, key: &CacheKey) -> Option<CacheEntry>;

  /// Write an entry, replacing any existing one.
  fn put(&self, key: &CacheKey, list: &ListSnapshot) -> Result<()>;

  /// Remove a single entry.
  fn remove(&self, key: &CacheKey) -> Result<()>;

  /// Remove every entry for any of `titles`, or every entry when `titles`
  /// is empty. Returns the number removed.
  fn delete(&self, titles: &[String]) -> Result<usize>;

  /// Keys of every stored entry.
  fn keys(&self) -> Result<Vec<CacheKey>>;

  /// Remove every entry older than `max_age`, read or not.
  fn sweep(&self, max_age: Duration) -> Result<usize>;

  fn is_stale(&self, entry: &CacheEntry, ttl: Duration) -> bool {
    entry.is_stale_at(ttl, Utc::now())
  }
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &CacheKey) -> Option<CacheEntry> {
    None // Always miss
  }

  fn put(&self, _key: &CacheKey, _list: &ListSnapshot) -> Result<()> {
    Ok(()) // Discard
  }

  fn remove(&self, _key: &CacheKey) -> Result<()> {
    Ok(())
  }

  fn delete(&self, _titles: &[String]) -> Result<usize> {
    Ok(0)
  }

  fn keys(&self) -> Result<Vec<CacheKey>> {
    Ok(Vec::new())
  }

  fn sweep(&self, _max_age: Duration) -> Result<usize> {
    Ok(0)
  }
}

#[derive(Serialize)]
struct CacheFileRef<'a> {
  version: u32,
  list: &'a ListSnapshot,
}

#[derive(Deserialize)]
struct CacheFile {
  version: u32,
  list: ListSnapshot,
}

/// Distinguishes temp files of concurrent writers in one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

const TEMP_SUFFIX: &str = ".tmp";

/// One JSON file per entry, named by its key. The file's mtime is the
/// entry's `last_written`.
pub struct FileStorage {
  dir: PathBuf,
}

impl FileStorage {
  /// Open (creating if needed) a cache directory.
  pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
    let dir = dir.into();
    fs::create_dir_all(&dir)
      .map_err(|e| eyre!("Failed to create cache directory {}: {}", dir.display(), e))?;
    Ok(Self { dir })
  }

  /// Get the default cache directory.
  pub fn default_dir() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".cache")))
      .ok_or_else(|| eyre!("Could not determine cache directory"))?;

    Ok(cache_dir.join("gtasks"))
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  fn path_for(&self, key: &CacheKey) -> PathBuf {
    self.dir.join(key.to_string())
  }

  fn decode(bytes: &[u8]) -> Result<ListSnapshot> {
    let file: CacheFile =
      serde_json::from_slice(bytes).map_err(|e| eyre!("unreadable entry: {}", e))?;
    if file.version != CACHE_FORMAT_VERSION {
      return Err(eyre!("unsupported version {}", file.version));
    }
    Ok(file.list)
  }

  /// Name of the temp file a writer renames into place.
  fn temp_name(key: &CacheKey) -> String {
    format!(
      ".{}.{}.{}{}",
      key,
      std::process::id(),
      TEMP_COUNTER.fetch_add(1, Ordering::Relaxed),
      TEMP_SUFFIX
    )
  }

  fn is_temp_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TEMP_SUFFIX)
  }

  /// Remove temp files older than `max_age`, left by writers that died
  /// before their rename.
  fn sweep_temp_files(&self, max_age: Duration, now: DateTime<Utc>) -> Result<usize> {
    let entries = fs::read_dir(&self.dir)
      .map_err(|e| eyre!("Failed to read cache directory {}: {}", self.dir.display(), e))?;

    let mut removed = 0;
    for entry in entries.filter_map(|entry| entry.ok()) {
      if !entry.file_name().to_str().is_some_and(Self::is_temp_name) {
        continue;
      }
      let path = entry.path();
      let Ok(modified) = Self::modified(&path) else {
        continue;
      };
      if now - modified > max_age {
        Self::remove_path(&path)?;
        removed += 1;
      }
    }
    Ok(removed)
  }

  fn modified(path: &Path) -> std::io::Result<DateTime<Utc>> {
    Ok(fs::metadata(path)?.modified()?.into())
  }

  fn remove_path(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(eyre!("Failed to remove {}: {}", path.display(), e)),
    }
  }
}

impl CacheStorage for FileStorage {
  fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
    let path = self.path_for(key);

    let bytes = match fs::read(&path) {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == ErrorKind::NotFound => return None,
      Err(e) => {
        warn!(%key, "failed to read cache entry: {}", e);
        return None;
      }
    };

    let decoded = Self::decode(&bytes).and_then(|list| {
      let last_written = Self::modified(&path).map_err(|e| eyre!("no mtime: {}", e))?;
      Ok((list, last_written))
    });

    match decoded {
      Ok((payload, last_written)) => Some(CacheEntry {
        key: key.clone(),
        payload,
        last_written,
      }),
      Err(e) => {
        debug!(%key, "discarding corrupt cache entry: {}", e);
        if let Err(e) = Self::remove_path(&path) {
          warn!("{}", e);
        }
        None
      }
    }
  }

  fn put(&self, key: &CacheKey, list: &ListSnapshot) -> Result<()> {
    let data = serde_json::to_vec(&CacheFileRef {
      version: CACHE_FORMAT_VERSION,
      list,
    })
    .map_err(|e| eyre!("Failed to serialize list {}: {}", list.title, e))?;

    // Write beside the target and rename so readers never see a partial file
    let tmp = self.dir.join(Self::temp_name(key));
    fs::write(&tmp, &data)
      .map_err(|e| eyre!("Failed to write cache file {}: {}", tmp.display(), e))?;

    let path = self.path_for(key);
    if let Err(e) = fs::rename(&tmp, &path) {
      let _ = fs::remove_file(&tmp);
      return Err(eyre!("Failed to replace cache file {}: {}", path.display(), e));
    }

    debug!(%key, title = %list.title, tasks = list.tasks.len(), "cached list");
    Ok(())
  }

  fn remove(&self, key: &CacheKey) -> Result<()> {
    Self::remove_path(&self.path_for(key))
  }

  fn delete(&self, titles: &[String]) -> Result<usize> {
    let mut removed = 0;
    for key in self.keys()? {
      if titles.is_empty() || titles.iter().any(|t| key.matches_title(t)) {
        self.remove(&key)?;
        removed += 1;
      }
    }

    debug!(removed, ?titles, "invalidated cache entries");
    Ok(removed)
  }

  fn keys(&self) -> Result<Vec<CacheKey>> {
    let entries = fs::read_dir(&self.dir)
      .map_err(|e| eyre!("Failed to read cache directory {}: {}", self.dir.display(), e))?;

    let keys = entries
      .filter_map(|entry| entry.ok())
      .filter_map(|entry| entry.file_name().to_str().and_then(CacheKey::parse))
      .collect();

    Ok(keys)
  }

  fn sweep(&self, max_age: Duration) -> Result<usize> {
    let now = Utc::now();

    let mut removed = 0;
    for key in self.keys()? {
      let path = self.path_for(&key);
      let Ok(modified) = Self::modified(&path) else {
        continue;
      };
      if now - modified > max_age {
        Self::remove_path(&path)?;
        removed += 1;
      }
    }

    let temp_files = self.sweep_temp_files(max_age, now)?;
    debug!(removed, temp_files, "swept old cache entries");
    Ok(removed)
  }
}
