pub mod invalidation;
pub mod key;
pub mod store;

pub use invalidation::{GridKeyIndex, InvalidationCoordinator};
pub use key::CacheKeyPolicy;
pub use store::{CacheError, CacheResult, CacheStore, InMemoryCacheStore, RedisCacheStore};
