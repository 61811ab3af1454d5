pub mod auth;
pub mod categories;
pub mod echo;
pub mod expenses;
pub mod extract;
pub mod health;
pub mod routes;
pub mod users;

pub use routes::{create_router, AppState, RateLimiters};
