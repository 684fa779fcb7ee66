pub mod collections;
pub mod redis;

pub use self::redis::{CacheError, RedisCache};
