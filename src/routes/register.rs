use actix_web::{web, HttpResponse};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use secrecy::{ExposeSecret, Secret};

use crate::authentication::AuthError;
use crate::domain::UserRole;
use crate::routes::views::page;
use crate::services::{Services, MIN_PASSWORD_LENGTH};
use crate::session_state::TypedSession;
use crate::utils::{e500, see_other};

pub async fn register_form(
    session: TypedSession,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let role = session.get_user_role().map_err(e500)?;
    Ok(page(
        "Create an account",
        role,
        &flash_messages,
        &format!(
            r#"<form action="/register" method="post">
        <label>Full name
            <input type="text" name="full_name" placeholder="Your name">
        </label>
        <label>Email
            <input type="email" name="email" placeholder="you@mail.com" required>
        </label>
        <label>Password
            <input type="password" name="password" minlength="{min}" required>
        </label>
        <label>Confirm password
            <input type="password" name="password_confirm" minlength="{min}" required>
        </label>
        <button type="submit">Register</button>
    </form>"#,
            min = MIN_PASSWORD_LENGTH
        ),
    ))
}

#[derive(serde::Deserialize)]
pub struct FormData {
    email: String,
    password: Secret<String>,
    password_confirm: Secret<String>,
    full_name: Option<String>,
}

#[tracing::instrument(name = "Register tenant", skip(form, services, session), fields(email = %form.email))]
pub async fn register(
    form: web::Form<FormData>,
    services: web::Data<Services>,
    session: TypedSession,
) -> Result<HttpResponse, actix_web::Error> {
    let FormData {
        email,
        password,
        password_confirm,
        full_name,
    } = form.into_inner();

    if password.expose_secret() != password_confirm.expose_secret() {
        FlashMessage::error("The passwords do not match.").send();
        return Ok(see_other("/register"));
    }

    let user = match services
        .auth
        .register(&email, password, full_name.as_deref(), UserRole::Tenant)
        .await
    {
        Ok(user) => user,
        Err(AuthError::Unexpected(e)) => return Err(e500(e)),
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return Ok(see_other("/register"));
        }
    };

    session.renew();
    session.insert_user(user.id, user.role).map_err(e500)?;
    FlashMessage::info(format!("Welcome, {}!", user.display_name())).send();
    Ok(see_other("/tenant/dashboard"))
}

pub async fn log_out(session: TypedSession) -> Result<HttpResponse, actix_web::Error> {
    session.log_out();
    FlashMessage::info("You have been logged out.").send();
    Ok(see_other("/"))
}
