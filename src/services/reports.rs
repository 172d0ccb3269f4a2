use uuid::Uuid;

use crate::domain::{NewReport, Report, ReportStatus};
use crate::repositories::ReportRepository;
use crate::services::notifications::NotificationService;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum ReportError {
    #[error("Report not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("A report cannot go from {} to {}", .from.label(), .to.label())]
    InvalidTransition { from: ReportStatus, to: ReportStatus },
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Clone)]
pub struct ReportService {
    reports: ReportRepository,
    notifications: NotificationService,
}

impl ReportService {
    pub fn new(reports: ReportRepository, notifications: NotificationService) -> Self {
        Self {
            reports,
            notifications,
        }
    }

    pub async fn get_reports_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Report>, anyhow::Error> {
        self.reports.get_by_tenant(tenant_id).await
    }

    pub async fn get_report_by_id(&self, report_id: Uuid) -> Result<Option<Report>, anyhow::Error> {
        self.reports.get_by_id(report_id).await
    }

    pub async fn get_all_reports(&self) -> Result<Vec<Report>, anyhow::Error> {
        self.reports.get_all().await
    }

    pub async fn get_open_reports(&self) -> Result<Vec<Report>, anyhow::Error> {
        self.reports.get_by_status(ReportStatus::Open).await
    }

    #[tracing::instrument(name = "Create report", skip(self, title, description))]
    pub async fn create_report(
        &self,
        tenant_id: Uuid,
        department_id: Uuid,
        title: &str,
        description: &str,
    ) -> Result<Report, ReportError> {
        let report = NewReport::parse(title, description).map_err(ReportError::Validation)?;
        Ok(self.reports.create(tenant_id, department_id, &report).await?)
    }

    #[tracing::instrument(name = "Update report status", skip(self))]
    pub async fn update_report_status(
        &self,
        report_id: Uuid,
        status: ReportStatus,
        admin_id: Uuid,
    ) -> Result<Report, ReportError> {
        let current = self
            .reports
            .get_by_id(report_id)
            .await?
            .ok_or(ReportError::NotFound)?;
        if current.status == status {
            return Ok(current);
        }
        if !current.status.can_transition_to(status) {
            return Err(ReportError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }
        let report = self
            .reports
            .update_status(report_id, status, Some(admin_id))
            .await?
            .ok_or(ReportError::NotFound)?;

        let message = format!(
            "Your report \"{}\" is now {}.",
            report.title,
            report.status.label().to_lowercase()
        );
        self.notifications
            .notify(
                report.tenant_id,
                "Report updated",
                &message,
                Some("/tenant/dashboard"),
                Some("report"),
            )
            .await;
        Ok(report)
    }

    pub async fn mark_as_in_progress(&self, report_id: Uuid, admin_id: Uuid) -> Result<Report, ReportError> {
        self.update_report_status(report_id, ReportStatus::InProgress, admin_id)
            .await
    }

    pub async fn resolve_report(&self, report_id: Uuid, admin_id: Uuid) -> Result<Report, ReportError> {
        self.update_report_status(report_id, ReportStatus::Resolved, admin_id)
            .await
    }

    pub async fn close_report(&self, report_id: Uuid, admin_id: Uuid) -> Result<Report, ReportError> {
        self.update_report_status(report_id, ReportStatus::Closed, admin_id)
            .await
    }
}
