pub mod memory;
pub mod mongo;
pub mod redis;
pub mod store;

pub use memory::MemoryStore;
pub use mongo::{MongoStore, connect_to_mongo};
pub use redis::{RedisClient, RedisService, connect_to_redis};
pub use store::{Store, StoreError};
