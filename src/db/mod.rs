pub mod activities;
pub mod postgres;
pub mod redis;

pub use activities::ActivityStore;
pub use postgres::create_pool;
pub use redis::create_redis_client;
pub use redis::geo_cell;
pub use redis::Cache;
pub use redis::CacheKey;
