//! Local cache of task lists.
//!
//! Every list is stored once per filter it was fetched with:
//! - Keys are derived from the list title and the canonical filter
//! - Fresh entries are served without touching the network
//! - Stale entries are served once and refreshed in the background
//! - Refreshes are serialized by a lock file in the cache directory

pub mod fetch;
pub mod key;
pub mod layer;
pub mod lock;
pub mod refresh;
pub mod storage;

pub use fetch::Fetcher;
pub use layer::CacheLayer;
pub use lock::RefreshLock;
pub use refresh::{RefreshOutcome, Refresher};
pub use storage::{CacheStorage, FileStorage, NoopStorage};
