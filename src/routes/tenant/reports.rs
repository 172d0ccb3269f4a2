use actix_web::{web, HttpResponse};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use uuid::Uuid;

use crate::authentication::UserId;
use crate::domain::UserRole;
use crate::routes::tenant::logged_in_user;
use crate::routes::views::page;
use crate::services::{ReportError, Services};
use crate::utils::{e500, see_other};

// The assigned unit, else the unit of the latest approved payment.
async fn reportable_department(services: &Services, user_id: Uuid) -> Result<Option<Uuid>, actix_web::Error> {
    let user = logged_in_user(services, user_id).await?;
    let department_id = match user.department_id {
        Some(department_id) => Some(department_id),
        None => services
            .payments
            .approved_department_for(user.id)
            .await
            .map_err(e500)?,
    };
    if department_id.is_none() {
        FlashMessage::error(
            "You need an assigned department or an approved payment to file reports",
        )
        .send();
    }
    Ok(department_id)
}

pub async fn new_report_form(
    user_id: web::ReqData<UserId>,
    services: web::Data<Services>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    if reportable_department(&services, **user_id).await?.is_none() {
        return Ok(see_other("/tenant/dashboard"));
    }
    Ok(page(
        "File a report",
        UserRole::Tenant,
        &flash_messages,
        r#"<form action="/tenant/reports/new" method="post">
        <label>Title
            <input type="text" name="title" maxlength="200" required>
        </label>
        <label>Description
            <textarea name="description" required></textarea>
        </label>
        <button type="submit">Send report</button>
    </form>"#,
    ))
}

#[derive(serde::Deserialize)]
pub struct FormData {
    title: String,
    description: String,
}

#[tracing::instrument(name = "New report", skip_all, fields(user_id = %*user_id))]
pub async fn new_report(
    user_id: web::ReqData<UserId>,
    form: web::Form<FormData>,
    services: web::Data<Services>,
) -> Result<HttpResponse, actix_web::Error> {
    let department_id = match reportable_department(&services, **user_id).await? {
        Some(department_id) => department_id,
        None => return Ok(see_other("/tenant/dashboard")),
    };
    match services
        .reports
        .create_report(**user_id, department_id, &form.title, &form.description)
        .await
    {
        Ok(_) => {
            FlashMessage::success("Report filed.").send();
            Ok(see_other("/tenant/dashboard"))
        }
        Err(ReportError::Unexpected(e)) => Err(e500(e)),
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            Ok(see_other("/tenant/reports/new"))
        }
    }
}
