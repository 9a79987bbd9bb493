mod macros;
pub mod store;

pub use store::Cache;
pub use store::{CacheKey, CacheKind};
