use actix_web::{web, HttpResponse};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use uuid::Uuid;

use crate::authentication::UserId;
use crate::domain::{PaymentStatus, UserRole};
use crate::routes::admin::dashboard::payment_rows;
use crate::routes::views::{escape, money, options, page};
use crate::services::{PaymentError, Services};
use crate::utils::{e500, see_other};

#[derive(serde::Deserialize)]
pub struct ListQuery {
    status: Option<String>,
}

impl ListQuery {
    /// Unknown or missing statuses show the pending queue.
    fn status(&self) -> PaymentStatus {
        self.status
            .as_deref()
            .and_then(|s| PaymentStatus::parse(s).ok())
            .unwrap_or(PaymentStatus::Pending)
    }
}

pub async fn payments_list(
    query: web::Query<ListQuery>,
    services: web::Data<Services>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let status = query.status();
    let payments = services
        .payments
        .get_payments_by_status(status)
        .await
        .map_err(e500)?;
    let content = format!(
        r#"<form action="/admin/payments" method="get">
        <select name="status">{}</select>
        <button type="submit">Show</button>
    </form>
    {}"#,
        options(
            [
                ("pending", "Pending"),
                ("approved", "Approved"),
                ("rejected", "Rejected"),
            ],
            status.as_str()
        ),
        payment_rows(&payments),
    );
    Ok(page("Payments", UserRole::Admin, &flash_messages, &content))
}

pub async fn payment_detail(
    payment_id: web::Path<Uuid>,
    services: web::Data<Services>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let payment = match services
        .payments
        .get_payment_by_id(payment_id.into_inner())
        .await
        .map_err(e500)?
    {
        Some(payment) => payment,
        None => {
            FlashMessage::error("Payment not found").send();
            return Ok(see_other("/admin/payments"));
        }
    };
    let tenant = services
        .auth
        .get_user_by_id(payment.tenant_id)
        .await
        .map_err(e500)?;
    let department = services
        .departments
        .get_department_by_id(payment.department_id)
        .await
        .map_err(e500)?;

    let receipt = payment
        .receipt_url
        .as_deref()
        .map(|url| format!(r#"<a href="{}">View receipt</a>"#, escape(url)))
        .unwrap_or_else(|| "No receipt uploaded".into());
    let review = if payment.status.is_reviewable() {
        format!(
            r#"<form action="/admin/payments/{id}/approve" method="post">
        <button type="submit">Approve</button>
    </form>
    <form action="/admin/payments/{id}/reject" method="post">
        <label>Reason <textarea name="notes"></textarea></label>
        <button type="submit">Reject</button>
    </form>"#,
            id = payment.id
        )
    } else {
        String::new()
    };

    let content = format!(
        r#"<ul>
        <li>Tenant: {tenant}</li>
        <li>Department: {department}</li>
        <li>Month: {month}</li>
        <li>Amount: {amount}</li>
        <li>Status: {status}</li>
        <li>Notes: {notes}</li>
        <li>{receipt}</li>
    </ul>
    {review}
    <p><a href="/admin/payments">Back to payments</a></p>"#,
        tenant = escape(tenant.as_ref().map_or("unknown", |t| t.display_name())),
        department = escape(department.as_ref().map_or("unknown", |d| d.title.as_str())),
        month = payment.month,
        amount = money(payment.amount),
        status = payment.status,
        notes = escape(payment.notes.as_deref().unwrap_or("")),
        receipt = receipt,
        review = review,
    );
    Ok(page("Payment", UserRole::Admin, &flash_messages, &content))
}

#[tracing::instrument(name = "Approve payment", skip_all, fields(admin_id = %*user_id, payment_id = %*payment_id))]
pub async fn approve_payment(
    payment_id: web::Path<Uuid>,
    user_id: web::ReqData<UserId>,
    services: web::Data<Services>,
) -> Result<HttpResponse, actix_web::Error> {
    let payment_id = payment_id.into_inner();
    match services.payments.approve_payment(payment_id, **user_id).await {
        Ok(_) => FlashMessage::success("Payment approved.").send(),
        Err(PaymentError::Unexpected(e)) => return Err(e500(e)),
        Err(e) => FlashMessage::error(e.to_string()).send(),
    }
    Ok(see_other(&format!("/admin/payments/{}", payment_id)))
}

#[derive(serde::Deserialize)]
pub struct RejectForm {
    notes: Option<String>,
}

#[tracing::instrument(name = "Reject payment", skip_all, fields(admin_id = %*user_id, payment_id = %*payment_id))]
pub async fn reject_payment(
    payment_id: web::Path<Uuid>,
    form: web::Form<RejectForm>,
    user_id: web::ReqData<UserId>,
    services: web::Data<Services>,
) -> Result<HttpResponse, actix_web::Error> {
    let payment_id = payment_id.into_inner();
    match services
        .payments
        .reject_payment(payment_id, **user_id, form.notes.as_deref())
        .await
    {
        Ok(_) => FlashMessage::info("Payment rejected.").send(),
        Err(PaymentError::Unexpected(e)) => return Err(e500(e)),
        Err(e) => FlashMessage::error(e.to_string()).send(),
    }
    Ok(see_other("/admin/payments"))
}
