//! Two-tier route cache.
//!
//! Results are looked up in a bounded in-process [`MemoryStore`] first and a
//! persistent [`FileStore`] second. A hit in a slower tier is copied into the
//! faster ones, and every successful resolution is written to all tiers.
//! Store failures are logged and otherwise ignored; routing never fails
//! because of the cache.

mod clock;
mod config;
mod error;
mod file;
mod key;
mod memory;
mod store;
mod tiered;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, DEFAULT_PERSISTENT_PATH};
pub use error::CacheError;
pub use file::FileStore;
pub use key::{ANY_PROVIDER, CacheKey, DEFAULT_PRECISION, MAX_PRECISION};
pub use memory::MemoryStore;
pub use store::{CacheEntry, CacheStore};
pub use tiered::TieredCache;
