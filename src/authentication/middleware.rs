use std::ops::Deref;

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::error::InternalError;
use actix_web::{FromRequest, HttpMessage};
use actix_web_flash_messages::FlashMessage;
use actix_web_lab::middleware::Next;
use uuid::Uuid;

use crate::domain::UserRole;
use crate::session_state::TypedSession;
use crate::utils::{e500, see_other};

#[derive(Copy, Clone, Debug)]
pub struct UserId(Uuid);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Deref for UserId {
    type Target = Uuid;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

async fn session_of(req: &mut ServiceRequest) -> Result<TypedSession, actix_web::Error> {
    let (http_request, payload) = req.parts_mut();
    TypedSession::from_request(http_request, payload).await
}

/// Anonymous requests are sent to the login form, the others carry a `UserId`.
pub async fn reject_anonymous_users(
    mut req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let session = session_of(&mut req).await?;

    match session.get_user_id().map_err(e500)? {
        Some(user_id) => {
            req.extensions_mut().insert(UserId(user_id));
            next.call(req).await
        }
        None => {
            let response = see_other("/login");
            let e = anyhow::anyhow!("The user has not logged in");
            Err(InternalError::from_response(e, response).into())
        }
    }
}

/// Must run after `reject_anonymous_users`. The redirect is a regular
/// response so the flash cookie is still attached to it.
pub async fn reject_non_admin_users(
    mut req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, actix_web::Error> {
    let session = session_of(&mut req).await?;

    if session.get_user_role().map_err(e500)? == UserRole::Admin {
        next.call(req).await.map(ServiceResponse::map_into_left_body)
    } else {
        tracing::warn!("A non administrator tried to reach {}", req.path());
        FlashMessage::error("You do not have permission to access this page.").send();
        Ok(req.into_response(see_other("/")).map_into_right_body())
    }
}
