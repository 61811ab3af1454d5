pub mod events;
pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use events::{log_auth_event, AuthEvent};
pub use extractor::{CurrentUser, SuperUser};
pub use jwt::{BearerToken, Claims, JwtManager};
pub use middleware::{resolve_identity, Principal};
pub use password::{hash_password, verify_password, PasswordPolicy};
