use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://tasks.googleapis.com/tasks/v1";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// List shown when no `-l` is given (overrides the remembered default)
  pub default_list: Option<String>,
  #[serde(default = "default_api_url")]
  pub api_url: String,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub enabled: bool,
  /// Defaults to $XDG_CACHE_HOME/gtasks
  pub dir: Option<PathBuf>,
  /// Age after which a cached list is refreshed
  pub ttl_secs: u64,
  /// Age after which the daily sweep deletes an entry
  pub sweep_max_age_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      dir: None,
      ttl_secs: 300,
      sweep_max_age_secs: 2 * 24 * 60 * 60,
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      default_list: None,
      api_url: default_api_url(),
      cache: CacheConfig::default(),
    }
  }
}

fn default_api_url() -> String {
  DEFAULT_API_URL.to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./gtasks.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/gtasks/config.yaml
  ///
  /// Without a file every setting has its default.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("gtasks.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("gtasks").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file is valid and means defaults
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  pub fn ttl(&self) -> chrono::Duration {
    secs(self.cache.ttl_secs)
  }

  pub fn sweep_max_age(&self) -> chrono::Duration {
    secs(self.cache.sweep_max_age_secs)
  }

  /// Get the OAuth access token from environment variables.
  ///
  /// Checks GTASKS_ACCESS_TOKEN first, then GOOGLE_TASKS_TOKEN as fallback.
  pub fn get_access_token() -> Result<String> {
    std::env::var("GTASKS_ACCESS_TOKEN")
      .or_else(|_| std::env::var("GOOGLE_TASKS_TOKEN"))
      .map_err(|_| {
        eyre!(
          "Access token not found. Set GTASKS_ACCESS_TOKEN or GOOGLE_TASKS_TOKEN environment variable."
        )
      })
  }
}

fn secs(secs: u64) -> chrono::Duration {
  chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX / 1000))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.api_url, DEFAULT_API_URL);
    assert!(config.cache.enabled);
    assert_eq!(config.ttl(), chrono::Duration::seconds(300));
    assert_eq!(config.sweep_max_age(), chrono::Duration::days(2));
  }

  #[test]
  fn test_partial_cache_section_keeps_other_defaults() {
    let config = Config::parse(
      "default_list: Groceries\ncache:\n  ttl_secs: 60\n  dir: /tmp/gtasks\n",
    )
    .unwrap();
    assert_eq!(config.default_list.as_deref(), Some("Groceries"));
    assert_eq!(config.cache.ttl_secs, 60);
    assert_eq!(config.cache.dir, Some(PathBuf::from("/tmp/gtasks")));
    assert_eq!(config.cache.sweep_max_age_secs, 172_800);
    assert!(config.cache.enabled);
  }

  #[test]
  fn test_cache_can_be_disabled() {
    let config = Config::parse("cache:\n  enabled: false\n").unwrap();
    assert!(!config.cache.enabled);
  }

  #[test]
  fn test_malformed_config_is_rejected() {
    assert!(Config::parse("cache: [1, 2]").is_err());
  }

  #[test]
  fn test_explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(Some(&dir.path().join("nope.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }

  #[test]
  fn test_explicit_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gtasks.yaml");
    std::fs::write(&path, "api_url: http://localhost:8080/tasks/v1\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.api_url, "http://localhost:8080/tasks/v1");
  }
}
