//! Single-writer lock for cache refreshes.
//!
//! The lock is an exclusive OS file lock on a file in the cache directory.
//! The OS drops it when the holder exits, crashed or not, so a dead
//! refresher never blocks the next one. It only keeps refreshers apart;
//! readers never take it.

use color_eyre::{eyre::eyre, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Name of the lock file inside the cache directory.
pub const LOCK_FILE: &str = "lock";

/// Outcome of [`RefreshLock::try_acquire`].
#[derive(Debug)]
pub enum Acquire {
  Held(LockGuard),
  Busy,
}

/// Holds the OS lock until dropped.
///
/// The file itself stays in place. Deleting it would let a later contender
/// lock a fresh inode while someone still holds the old one.
#[derive(Debug)]
pub struct LockGuard {
  file: File,
}

impl Drop for LockGuard {
  fn drop(&mut self) {
    if let Err(e) = FileExt::unlock(&self.file) {
      warn!("failed to release refresh lock: {}", e);
    }
  }
}

#[derive(Debug, Clone)]
pub struct RefreshLock {
  path: PathBuf,
}

impl RefreshLock {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// The lock for a cache directory.
  pub fn in_dir(dir: &Path) -> Self {
    Self::new(dir.join(LOCK_FILE))
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Take the lock if nobody holds it. Never waits.
  pub fn try_acquire(&self) -> Result<Acquire> {
    let mut file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&self.path)
      .map_err(|e| {
        eyre!(
          "Failed to open refresh lock {}: {}",
          self.path.display(),
          e
        )
      })?;

    match FileExt::try_lock_exclusive(&file) {
      Ok(()) => {}
      Err(e) if e.kind() == fs2::lock_contended_error().kind() => return Ok(Acquire::Busy),
      Err(e) => {
        return Err(eyre!(
          "Failed to lock {}: {}",
          self.path.display(),
          e
        ))
      }
    }

    // Holder pid, for humans inspecting a stuck refresh
    let _ = write_pid(&mut file);
    Ok(Acquire::Held(LockGuard { file }))
  }
}

fn write_pid(file: &mut File) -> std::io::Result<()> {
  file.set_len(0)?;
  file.seek(SeekFrom::Start(0))?;
  writeln!(file, "{}", std::process::id())
}
