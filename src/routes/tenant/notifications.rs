use actix_web::{web, HttpResponse};
use actix_web_flash_messages::FlashMessage;
use uuid::Uuid;

use crate::authentication::UserId;
use crate::services::Services;
use crate::utils::{e500, see_other};

pub async fn mark_notification_read(
    notification_id: web::Path<Uuid>,
    user_id: web::ReqData<UserId>,
    services: web::Data<Services>,
) -> Result<HttpResponse, actix_web::Error> {
    let updated = services
        .notifications
        .mark_as_read(notification_id.into_inner(), **user_id)
        .await
        .map_err(e500)?;
    if !updated {
        FlashMessage::error("Notification not found").send();
    }
    Ok(see_other("/tenant/dashboard"))
}

pub async fn mark_all_notifications_read(
    user_id: web::ReqData<UserId>,
    services: web::Data<Services>,
) -> Result<HttpResponse, actix_web::Error> {
    if services
        .notifications
        .mark_all_as_read(**user_id)
        .await
        .map_err(e500)?
    {
        FlashMessage::info("All notifications marked as read.").send();
    }
    Ok(see_other("/tenant/dashboard"))
}
