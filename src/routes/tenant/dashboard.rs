use actix_web::{web, HttpResponse};
use actix_web_flash_messages::IncomingFlashMessages;
use std::fmt::Write;

use crate::authentication::UserId;
use crate::domain::{Notification, Payment, PaymentStatus, Report};
use crate::routes::tenant::logged_in_user;
use crate::routes::views::{escape, money, page};
use crate::services::Services;
use crate::utils::e500;

fn payments_table(payments: &[Payment]) -> String {
    if payments.is_empty() {
        return "<p>No payments registered yet.</p>".into();
    }
    let mut html = String::from(
        "<table><tr><th>Month</th><th>Amount</th><th>Status</th><th>Receipt</th><th>Notes</th></tr>",
    );
    for payment in payments {
        let receipt = match payment.receipt_url.as_deref() {
            Some(url) => format!(r#"<a href="{}">View</a>"#, escape(url)),
            None if payment.status == PaymentStatus::Pending => format!(
                r#"<a href="/tenant/payments/{}/receipt">Upload</a>"#,
                payment.id
            ),
            None => "-".into(),
        };
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            payment.month,
            money(payment.amount),
            payment.status,
            receipt,
            escape(payment.notes.as_deref().unwrap_or("")),
        );
    }
    html.push_str("</table>");
    html
}

fn reports_list(reports: &[Report]) -> String {
    if reports.is_empty() {
        return "<p>No reports filed.</p>".into();
    }
    let mut html = String::from("<ul>");
    for report in reports {
        let _ = write!(
            html,
            "<li>{} - {}</li>",
            escape(&report.title),
            report.status.label()
        );
    }
    html.push_str("</ul>");
    html
}

fn notifications_list(notifications: &[Notification]) -> String {
    if notifications.is_empty() {
        return "<p>No unread notifications.</p>".into();
    }
    let mut html = String::from(
        r#"<form action="/tenant/notifications/read-all" method="post"><button type="submit">Mark all as read</button></form><ul>"#,
    );
    for notification in notifications {
        let link = notification
            .link
            .as_deref()
            .map(|l| format!(r#" <a href="{}">Open</a>"#, escape(l)))
            .unwrap_or_default();
        let _ = write!(
            html,
            r#"<li><b>{}</b> {}{}
            <form action="/tenant/notifications/{}/read" method="post" style="display:inline"><button type="submit">Read</button></form></li>"#,
            escape(&notification.title),
            escape(&notification.message),
            link,
            notification.id,
        );
    }
    html.push_str("</ul>");
    html
}

#[tracing::instrument(name = "Tenant dashboard", skip_all, fields(user_id = %*user_id))]
pub async fn tenant_dashboard(
    user_id: web::ReqData<UserId>,
    services: web::Data<Services>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let user = logged_in_user(&services, **user_id).await?;
    let department = match user.department_id {
        Some(department_id) => services
            .departments
            .get_department_by_id(department_id)
            .await
            .map_err(e500)?,
        None => None,
    };
    let payments = services
        .payments
        .get_payments_by_tenant(user.id)
        .await
        .map_err(e500)?;
    let reports = services
        .reports
        .get_reports_by_tenant(user.id)
        .await
        .map_err(e500)?;
    let notifications = services
        .notifications
        .get_unread(user.id, None)
        .await
        .map_err(e500)?;

    let unit = match &department {
        Some(department) => format!(
            r#"<p>Your department: <a href="/department/{}">{}</a>, {} ({} per month)</p>
    <p><a href="/tenant/payments/new">Register a payment</a></p>"#,
            department.id,
            escape(&department.title),
            escape(&department.address),
            money(department.price)
        ),
        None => r#"<p>You have no department assigned yet. <a href="/">Browse the catalog</a></p>"#.into(),
    };

    let content = format!(
        r#"<p>Welcome {name}!</p>
    {unit}
    <h2>Notifications</h2>
    {notifications}
    <h2>Payments</h2>
    {payments}
    <h2>Reports</h2>
    <p><a href="/tenant/reports/new">File a report</a></p>
    {reports}"#,
        name = escape(user.display_name()),
        unit = unit,
        notifications = notifications_list(&notifications),
        payments = payments_table(&payments),
        reports = reports_list(&reports),
    );
    Ok(page("My dashboard", user.role, &flash_messages, &content))
}
