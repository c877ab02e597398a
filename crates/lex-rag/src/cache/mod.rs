//! Content-addressable draft cache with confidence-tiered TTLs.

pub mod key;
pub mod store;

pub use key::{cache_key, normalize_text, ttl_for_confidence, DEFAULT_CACHE_PREFIX};
pub use store::{CacheStore, CachedDraft, DraftCache, MemoryCache, RedisCache};
