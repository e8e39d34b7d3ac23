//! Cache keys derived from a list title and the filter options.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::tasks::types::FilterOptions;

/// Separator between the two halves; never produced by hex encoding.
const SEPARATOR: char = '-';

/// Key of one cached list snapshot, also its filename.
///
/// The title half and the options half can be matched on their own, so all
/// entries of a title (any options) or all entries for one set of options
/// (any title) can be found without reading the files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
  title_hash: String,
  options_hash: String,
}

impl CacheKey {
  pub fn derive(title: &str, options: &FilterOptions) -> Self {
    Self {
      title_hash: title_hash(title),
      options_hash: options_hash(options),
    }
  }

  /// Parse a filename back into a key. Anything else in the cache
  /// directory (lock file, temp files) yields `None`.
  pub fn parse(name: &str) -> Option<Self> {
    let (title_hash, options_hash) = name.split_once(SEPARATOR)?;
    if !is_digest(title_hash) || !is_digest(options_hash) {
      return None;
    }
    Some(Self {
      title_hash: title_hash.to_string(),
      options_hash: options_hash.to_string(),
    })
  }

  pub fn matches_title(&self, title: &str) -> bool {
    self.title_hash == title_hash(title)
  }

  pub fn matches_options(&self, options: &FilterOptions) -> bool {
    self.options_hash == options_hash(options)
  }

}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}{}", self.title_hash, SEPARATOR, self.options_hash)
  }
}

pub fn title_hash(title: &str) -> String {
  sha256_hex(title.as_bytes())
}

pub fn options_hash(options: &FilterOptions) -> String {
  sha256_hex(options.canonical().as_bytes())
}

fn sha256_hex(input: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(input);
  hex::encode(hasher.finalize())
}

fn is_digest(s: &str) -> bool {
  s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
