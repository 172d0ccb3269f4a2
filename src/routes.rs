pub mod admin;
mod health_check;
pub mod login;
mod payment_form;
mod register;
pub mod tenant;
mod uploads;
pub mod views;
pub mod visitor;

pub use health_check::*;
pub use login::{login, login_form};
pub use register::{log_out, register, register_form};

use crate::domain::User;
use crate::services::Services;
use crate::session_state::TypedSession;
use crate::utils::e500;

/// The logged in user, `None` for visitors or when the account is gone.
pub async fn current_user(
    session: &TypedSession,
    services: &Services,
) -> Result<Option<User>, actix_web::Error> {
    match session.get_user_id().map_err(e500)? {
        Some(user_id) => services.auth.get_user_by_id(user_id).await.map_err(e500),
        None => Ok(None),
    }
}
