pub mod categories;
pub mod expenses;
pub mod pool;
pub mod schema;
pub mod users;

pub use pool::{create_pool, health_check, run_migrations};
