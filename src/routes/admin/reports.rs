use actix_web::{web, HttpResponse};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use std::fmt::Write;
use uuid::Uuid;

use crate::authentication::UserId;
use crate::domain::{ReportStatus, UserRole};
use crate::routes::views::{escape, options, page};
use crate::services::{ReportError, Services};
use crate::utils::{e500, see_other};

const STATUSES: [(&str, &str); 4] = [
    ("open", "Open"),
    ("in_progress", "In progress"),
    ("resolved", "Resolved"),
    ("closed", "Closed"),
];

pub async fn reports_list(
    services: web::Data<Services>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let reports = services.reports.get_all_reports().await.map_err(e500)?;

    let mut content = String::new();
    if reports.is_empty() {
        content.push_str("<p>No reports.</p>");
    }
    for report in &reports {
        let created = report
            .created_at
            .map(|c| c.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let resolve = if report.status.can_transition_to(ReportStatus::Resolved)
            && report.status != ReportStatus::Resolved
        {
            format!(
                r#"<form action="/admin/reports/{}/resolve" method="post" style="display:inline"><button type="submit">Resolve</button></form>"#,
                report.id
            )
        } else {
            String::new()
        };
        let _ = write!(
            content,
            r#"<article>
        <h3>{title}</h3>
        <p>{description}</p>
        <p><small>{created}</small> - {status}</p>
        <form action="/admin/reports/{id}/status" method="post" style="display:inline">
            <select name="status">{options}</select>
            <button type="submit">Update</button>
        </form>
        {resolve}
    </article>"#,
            title = escape(&report.title),
            description = escape(&report.description),
            created = created,
            status = report.status.label(),
            id = report.id,
            options = options(STATUSES, report.status.as_str()),
            resolve = resolve,
        );
    }
    Ok(page("Reports", UserRole::Admin, &flash_messages, &content))
}

#[derive(serde::Deserialize)]
pub struct StatusForm {
    status: String,
}

fn report_outcome(outcome: Result<crate::domain::Report, ReportError>) -> Result<HttpResponse, actix_web::Error> {
    match outcome {
        Ok(report) => {
            FlashMessage::success(format!("The report is now {}.", report.status.label().to_lowercase()))
                .send()
        }
        Err(ReportError::Unexpected(e)) => return Err(e500(e)),
        Err(e) => FlashMessage::error(e.to_string()).send(),
    }
    Ok(see_other("/admin/reports"))
}

#[tracing::instrument(name = "Update report status", skip_all, fields(admin_id = %*user_id, report_id = %*report_id))]
pub async fn update_report_status(
    report_id: web::Path<Uuid>,
    form: web::Form<StatusForm>,
    user_id: web::ReqData<UserId>,
    services: web::Data<Services>,
) -> Result<HttpResponse, actix_web::Error> {
    let status = match ReportStatus::parse(&form.status) {
        Ok(status) => status,
        Err(e) => {
            FlashMessage::error(e).send();
            return Ok(see_other("/admin/reports"));
        }
    };
    report_outcome(
        services
            .reports
            .update_report_status(report_id.into_inner(), status, **user_id)
            .await,
    )
}

#[tracing::instrument(name = "Resolve report", skip_all, fields(admin_id = %*user_id, report_id = %*report_id))]
pub async fn resolve_report(
    report_id: web::Path<Uuid>,
    user_id: web::ReqData<UserId>,
    services: web::Data<Services>,
) -> Result<HttpResponse, actix_web::Error> {
    report_outcome(
        services
            .reports
            .resolve_report(report_id.into_inner(), **user_id)
            .await,
    )
}
