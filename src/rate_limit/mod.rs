pub mod config;
pub mod key;
pub mod limiter;
pub mod middleware;
pub mod store;

pub use config::{KeyFunc, RateLimitConfig};
pub use key::{default_key, KeyScope, RequestContext};
pub use limiter::RateLimiter;
pub use middleware::{enforce_rate_limit, rate_limit_middleware, RateLimitMiddleware};
pub use store::{Admission, MemoryStore, RateLimitStore, RateWindowEntry};
