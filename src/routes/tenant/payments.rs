use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use uuid::Uuid;

use crate::authentication::UserId;
use crate::configuration::UploadSettings;
use crate::domain::{Department, Payment, UserRole};
use crate::routes::payment_form;
use crate::routes::tenant::logged_in_user;
use crate::routes::uploads::MultipartForm;
use crate::routes::views::{escape, money, page};
use crate::services::{PaymentError, Services};
use crate::utils::{e500, see_other};

const DASHBOARD: &str = "/tenant/dashboard";

// New payments from the dashboard are always for the assigned unit.
async fn assigned_department(
    services: &Services,
    user_id: Uuid,
) -> Result<Option<Department>, actix_web::Error> {
    let user = logged_in_user(services, user_id).await?;
    let department = match user.department_id {
        Some(department_id) => services
            .departments
            .get_department_by_id(department_id)
            .await
            .map_err(e500)?,
        None => None,
    };
    if department.is_none() {
        FlashMessage::error("You do not have a department assigned").send();
    }
    Ok(department)
}

pub async fn new_payment_form(
    user_id: web::ReqData<UserId>,
    services: web::Data<Services>,
    uploads: web::Data<UploadSettings>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let department = match assigned_department(&services, **user_id).await? {
        Some(department) => department,
        None => return Ok(see_other(DASHBOARD)),
    };
    let content = payment_form::render(&department, "/tenant/payments/new", uploads.max_receipt_bytes);
    Ok(page(
        "Register a payment",
        UserRole::Tenant,
        &flash_messages,
        &content,
    ))
}

#[tracing::instrument(name = "New tenant payment", skip_all, fields(user_id = %*user_id))]
pub async fn new_payment(
    user_id: web::ReqData<UserId>,
    payload: Multipart,
    services: web::Data<Services>,
    uploads: web::Data<UploadSettings>,
) -> Result<HttpResponse, actix_web::Error> {
    let department = match assigned_department(&services, **user_id).await? {
        Some(department) => department,
        None => return Ok(see_other(DASHBOARD)),
    };
    match payment_form::submit(&services, **user_id, &department, payload, uploads.max_receipt_bytes).await? {
        Ok(_) => {
            FlashMessage::success("Payment registered, it is pending review.").send();
            Ok(see_other(DASHBOARD))
        }
        Err(message) => {
            FlashMessage::error(message).send();
            Ok(see_other("/tenant/payments/new"))
        }
    }
}

// A tenant only ever sees their own payments.
async fn owned_payment(
    services: &Services,
    payment_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Payment>, actix_web::Error> {
    let payment = services
        .payments
        .get_payment_by_id(payment_id)
        .await
        .map_err(e500)?
        .filter(|p| p.tenant_id == user_id);
    if payment.is_none() {
        FlashMessage::error("Payment not found").send();
    }
    Ok(payment)
}

pub async fn upload_receipt_form(
    payment_id: web::Path<Uuid>,
    user_id: web::ReqData<UserId>,
    services: web::Data<Services>,
    uploads: web::Data<UploadSettings>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let payment = match owned_payment(&services, payment_id.into_inner(), **user_id).await? {
        Some(payment) => payment,
        None => return Ok(see_other(DASHBOARD)),
    };
    let current = payment
        .receipt_url
        .as_deref()
        .map(|url| format!(r#"<p>Current receipt: <a href="{}">View</a></p>"#, escape(url)))
        .unwrap_or_default();
    let content = format!(
        r#"<p>Payment for {month}: {amount} ({status})</p>
    {current}
    <form action="/tenant/payments/{id}/receipt" method="post" enctype="multipart/form-data">
        <label>Receipt (max {limit} MB)
            <input type="file" name="receipt" required>
        </label>
        <button type="submit">Upload</button>
    </form>"#,
        month = payment.month,
        amount = money(payment.amount),
        status = payment.status,
        current = current,
        id = payment.id,
        limit = uploads.max_receipt_bytes / (1024 * 1024),
    );
    Ok(page(
        "Upload receipt",
        UserRole::Tenant,
        &flash_messages,
        &content,
    ))
}

#[tracing::instrument(name = "Upload tenant receipt", skip_all, fields(user_id = %*user_id))]
pub async fn upload_receipt(
    payment_id: web::Path<Uuid>,
    user_id: web::ReqData<UserId>,
    payload: Multipart,
    services: web::Data<Services>,
    uploads: web::Data<UploadSettings>,
) -> Result<HttpResponse, actix_web::Error> {
    let payment = match owned_payment(&services, payment_id.into_inner(), **user_id).await? {
        Some(payment) => payment,
        None => return Ok(see_other(DASHBOARD)),
    };
    let form_url = format!("/tenant/payments/{}/receipt", payment.id);

    let mut form = match MultipartForm::read(payload, uploads.max_receipt_bytes).await {
        Ok(form) => form,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return Ok(see_other(&form_url));
        }
    };
    let receipt = match form.take_file("receipt") {
        Some(receipt) => receipt,
        None => {
            FlashMessage::error("No file was selected").send();
            return Ok(see_other(&form_url));
        }
    };

    match services
        .payments
        .upload_receipt(payment.id, receipt.content, &receipt.file_name)
        .await
    {
        Ok(_) => {
            FlashMessage::success("Receipt uploaded.").send();
            Ok(see_other(DASHBOARD))
        }
        Err(PaymentError::Unexpected(e)) => Err(e500(e)),
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            Ok(see_other(&form_url))
        }
    }
}
