//! Response caching for the cloud client
//!
//! - `keys`: canonical, structurally comparable query keys
//! - `store`: the shared in-memory cache (stale-while-revalidate entries)
//! - `invalidation`: domain events and the families they invalidate
//! - `traits`: the layer interface invalidation is dispatched through

pub mod invalidation;
pub mod keys;
pub mod store;
pub mod traits;

pub use invalidation::{dispatch, DomainEvent, InvalidationReport};
pub use keys::{CacheKey, KeyFamily, KeyPart};
pub use store::{CacheEntry, QueryCache};
pub use traits::CacheLayer;
