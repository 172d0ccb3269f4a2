use actix_web::{web, HttpResponse};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use secrecy::{ExposeSecret, Secret};

use crate::authentication::AuthError;
use crate::domain::UserRole;
use crate::routes::views::page;
use crate::services::{Services, MIN_PASSWORD_LENGTH};
use crate::utils::{e500, see_other};

pub async fn new_admin_form(flash_messages: IncomingFlashMessages) -> HttpResponse {
    page(
        "New administrator",
        UserRole::Admin,
        &flash_messages,
        &format!(
            r#"<form action="/admin/users/new" method="post">
        <label>Full name <input type="text" name="full_name" required></label>
        <label>Email <input type="email" name="email" required></label>
        <label>Password <input type="password" name="password" minlength="{min}" required></label>
        <label>Confirm password <input type="password" name="password_confirm" minlength="{min}" required></label>
        <button type="submit">Create administrator</button>
    </form>"#,
            min = MIN_PASSWORD_LENGTH
        ),
    )
}

#[derive(serde::Deserialize)]
pub struct FormData {
    email: String,
    full_name: String,
    password: Secret<String>,
    password_confirm: Secret<String>,
}

#[tracing::instrument(name = "Create administrator", skip(form, services), fields(email = %form.email))]
pub async fn create_admin(
    form: web::Form<FormData>,
    services: web::Data<Services>,
) -> Result<HttpResponse, actix_web::Error> {
    let FormData {
        email,
        full_name,
        password,
        password_confirm,
    } = form.into_inner();
    let back = "/admin/users/new";

    if email.trim().is_empty() || full_name.trim().is_empty() {
        FlashMessage::error("All fields are required.").send();
        return Ok(see_other(back));
    }
    if password.expose_secret() != password_confirm.expose_secret() {
        FlashMessage::error("The passwords do not match.").send();
        return Ok(see_other(back));
    }

    match services
        .auth
        .register(&email, password, Some(&full_name), UserRole::Admin)
        .await
    {
        Ok(user) => {
            FlashMessage::success(format!("Administrator {} created.", user.email)).send();
            Ok(see_other("/admin/dashboard"))
        }
        Err(AuthError::Unexpected(e)) => Err(e500(e)),
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            Ok(see_other(back))
        }
    }
}
