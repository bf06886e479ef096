pub mod cache;

pub use cache::create_redis_client;
pub use cache::geo_cell;
pub use cache::Cache;
pub use cache::CacheKey;
