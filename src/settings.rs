//! State remembered between runs, kept next to the log files.

use chrono::NaiveDate;
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

const SETTINGS_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
  #[serde(default = "current_version")]
  pub version: u32,
  /// Title of the service's default list, fetched once
  pub default_list: Option<String>,
  /// Day the cache was last swept
  pub last_sweep: Option<NaiveDate>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      version: SETTINGS_VERSION,
      default_list: None,
      last_sweep: None,
    }
  }
}

fn current_version() -> u32 {
  SETTINGS_VERSION
}

impl Settings {
  /// Get the default settings file path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir =
      dirs::data_dir().ok_or_else(|| eyre!("Could not determine data directory"))?;
    Ok(data_dir.join("gtasks").join("settings.json"))
  }

  /// Load settings. A missing, unreadable or foreign-version file yields
  /// defaults.
  pub fn load(path: &Path) -> Self {
    let contents = match std::fs::read_to_string(path) {
      Ok(contents) => contents,
      Err(_) => return Self::default(),
    };
    match serde_json::from_str::<Settings>(&contents) {
      Ok(settings) if settings.version == SETTINGS_VERSION => settings,
      Ok(settings) => {
        warn!(version = settings.version, "ignoring settings of unknown version");
        Self::default()
      }
      Err(e) => {
        warn!(path = %path.display(), "ignoring unreadable settings: {}", e);
        Self::default()
      }
    }
  }

  pub fn save(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create settings directory: {}", e))?;
    }
    let json = serde_json::to_string_pretty(self)
      .map_err(|e| eyre!("Failed to serialize settings: {}", e))?;
    std::fs::write(path, json)
      .map_err(|e| eyre!("Failed to write settings {}: {}", path.display(), e))
  }

  /// Whether the cache has not been swept yet today.
  pub fn sweep_due(&self, today: NaiveDate) -> bool {
    self.last_sweep.map_or(true, |last| last < today)
  }
}
