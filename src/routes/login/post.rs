use actix_web::error::InternalError;
use actix_web::{web, HttpResponse};
use actix_web_flash_messages::FlashMessage;
use secrecy::Secret;

use crate::authentication::AuthError;
use crate::domain::{User, UserRole};
use crate::routes::login::{login_url_with_next, verify_next};
use crate::services::Services;
use crate::session_state::TypedSession;
use crate::startup::HmacSecret;
use crate::utils::see_other;

#[derive(serde::Deserialize)]
pub struct FormData {
    email: String,
    password: Secret<String>,
    next: Option<String>,
    tag: Option<String>,
}

/// Where a freshly logged in user lands when no `next` was requested.
pub fn home_of(user: &User) -> &'static str {
    match user.role {
        UserRole::Admin => "/admin/dashboard",
        _ => "/tenant/dashboard",
    }
}

#[tracing::instrument(
    skip(form, services, session, secret),
    fields(email = tracing::field::Empty, user_id = tracing::field::Empty)
)]
pub async fn login(
    form: web::Form<FormData>,
    services: web::Data<Services>,
    session: TypedSession,
    secret: web::Data<HmacSecret>,
) -> Result<HttpResponse, InternalError<AuthError>> {
    let FormData {
        email,
        password,
        next,
        tag,
    } = form.into_inner();
    tracing::Span::current().record("email", &tracing::field::display(&email));

    let next = match (next, tag) {
        (Some(next), Some(tag)) => verify_next(&next, &tag, &secret).ok(),
        _ => None,
    };

    match services.auth.login(&email, password).await {
        Ok(user) => {
            tracing::Span::current().record("user_id", &tracing::field::display(&user.id));
            session.renew();
            session
                .insert_user(user.id, user.role)
                .map_err(|e| login_redirect(AuthError::Unexpected(e.into()), None, &secret))?;
            let location = next.as_deref().unwrap_or_else(|| home_of(&user));
            Ok(see_other(location))
        }
        Err(e) => Err(login_redirect(e, next.as_deref(), &secret)),
    }
}

// Redirect to the login form with an error message, keeping the requested `next`.
fn login_redirect(
    e: AuthError,
    next: Option<&str>,
    secret: &HmacSecret,
) -> InternalError<AuthError> {
    let message = match &e {
        AuthError::Unexpected(_) => "Something went wrong, please try again.".to_string(),
        AuthError::InvalidCredentials(_) => "Invalid email or password.".to_string(),
        other => other.to_string(),
    };
    FlashMessage::error(message).send();
    let location = next
        .and_then(|next| login_url_with_next(next, secret).ok())
        .unwrap_or_else(|| "/login".to_string());
    InternalError::from_response(e, see_other(&location))
}
