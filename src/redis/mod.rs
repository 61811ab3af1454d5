pub mod client;
pub mod counters;

pub use client::{create_client, health_check};
pub use counters::RedisStore;
