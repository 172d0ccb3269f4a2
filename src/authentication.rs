pub mod middleware;
mod password;

pub use middleware::{reject_anonymous_users, reject_non_admin_users, UserId};
pub use password::{compute_password_hash, validate_credentials, AuthError};
