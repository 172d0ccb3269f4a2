use actix_web::{web, HttpResponse};
use actix_web_flash_messages::IncomingFlashMessages;

use crate::routes::login::verify_next;
use crate::routes::views::{escape, page};
use crate::session_state::TypedSession;
use crate::startup::HmacSecret;
use crate::utils::e500;

#[derive(serde::Deserialize)]
pub struct QueryParams {
    next: Option<String>,
    tag: Option<String>,
}

impl QueryParams {
    /// The verified `next` with its tag, ready to be echoed in the form.
    fn verified(self, secret: &HmacSecret) -> Option<(String, String)> {
        let (next, tag) = match (self.next, self.tag) {
            (Some(next), Some(tag)) => (next, tag),
            _ => return None,
        };
        match verify_next(&next, &tag, secret) {
            Ok(next) => Some((next, tag)),
            Err(e) => {
                tracing::warn!(
                    error.message = %e,
                    error.cause_chain = ?e,
                    "Failed to verify query parameters using the HMAC tag"
                );
                None
            }
        }
    }
}

pub async fn login_form(
    query: web::Query<QueryParams>,
    secret: web::Data<HmacSecret>,
    session: TypedSession,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let hidden = match query.into_inner().verified(&secret) {
        Some((next, tag)) => format!(
            r#"<input type="hidden" name="next" value="{}">
            <input type="hidden" name="tag" value="{}">"#,
            escape(&next),
            escape(&tag)
        ),
        None => String::new(),
    };
    let role = session.get_user_role().map_err(e500)?;

    Ok(page(
        "Login",
        role,
        &flash_messages,
        &format!(
            r#"<form action="/login" method="post">
        <label>Email
            <input type="email" placeholder="Enter your email" name="email" required>
        </label>
        <label>Password
            <input type="password" placeholder="Enter your password" name="password" required>
        </label>
        {hidden}
        <button type="submit">Login</button>
    </form>
    <p>No account yet? <a href="/register">Register</a></p>"#
        ),
    ))
}
