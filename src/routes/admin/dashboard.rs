use actix_web::{web, HttpResponse};
use actix_web_flash_messages::IncomingFlashMessages;
use std::fmt::Write;

use crate::authentication::UserId;
use crate::domain::{Payment, Report, UserRole};
use crate::routes::views::{escape, money, page};
use crate::services::Services;
use crate::utils::e500;

pub fn payment_rows(payments: &[Payment]) -> String {
    if payments.is_empty() {
        return "<p>No payments.</p>".into();
    }
    let mut html = String::from(
        "<table><tr><th>Month</th><th>Amount</th><th>Status</th><th>Receipt</th><th></th></tr>",
    );
    for payment in payments {
        let _ = write!(
            html,
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href="/admin/payments/{}">Review</a></td></tr>"#,
            payment.month,
            money(payment.amount),
            payment.status,
            if payment.receipt_url.is_some() { "yes" } else { "no" },
            payment.id,
        );
    }
    html.push_str("</table>");
    html
}

pub fn report_rows(reports: &[Report]) -> String {
    if reports.is_empty() {
        return "<p>No reports.</p>".into();
    }
    let mut html = String::from("<ul>");
    for report in reports {
        let _ = write!(
            html,
            "<li><b>{}</b> ({}) {}</li>",
            escape(&report.title),
            report.status.label(),
            escape(&report.description),
        );
    }
    html.push_str("</ul>");
    html
}

#[tracing::instrument(name = "Admin dashboard", skip_all, fields(user_id = %*user_id))]
pub async fn admin_dashboard(
    user_id: web::ReqData<UserId>,
    services: web::Data<Services>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let admin = services
        .auth
        .get_user_by_id(**user_id)
        .await
        .map_err(e500)?;
    let pending = services.payments.get_pending_payments().await.map_err(e500)?;
    let open = services.reports.get_open_reports().await.map_err(e500)?;

    let content = format!(
        r#"<p>Welcome {name}!</p>
    <p><a href="/admin/departments/new">New department</a> | <a href="/admin/users/new">New administrator</a></p>
    <h2>Pending payments ({pending_count})</h2>
    {pending}
    <h2>Open reports ({open_count})</h2>
    {open}
    <p><a href="/admin/reports">All reports</a></p>"#,
        name = escape(admin.as_ref().map_or("", |a| a.display_name())),
        pending_count = pending.len(),
        pending = payment_rows(&pending),
        open_count = open.len(),
        open = report_rows(&open),
    );
    Ok(page("Admin dashboard", UserRole::Admin, &flash_messages, &content))
}
