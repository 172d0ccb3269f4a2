use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::{BackendClient, Order, Query};
use crate::domain::{NewReport, Report, ReportStatus};

const TABLE: &str = "reports";

#[derive(Clone)]
pub struct ReportRepository {
    client: BackendClient,
}

#[derive(serde::Serialize)]
struct NewReportRow<'a> {
    tenant_id: Uuid,
    department_id: Uuid,
    title: &'a str,
    description: &'a str,
    status: ReportStatus,
}

#[derive(serde::Serialize)]
struct StatusRow {
    status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_by: Option<Uuid>,
    updated_at: DateTime<Utc>,
}

impl ReportRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    async fn list(&self, query: Query) -> Result<Vec<Report>, anyhow::Error> {
        self.client
            .select(TABLE, &query.order("created_at", Order::Desc))
            .await
            .context("Failed to list reports")
    }

    #[tracing::instrument(name = "Get report by id", skip(self))]
    pub async fn get_by_id(&self, report_id: Uuid) -> Result<Option<Report>, anyhow::Error> {
        self.client
            .select_one(TABLE, &Query::new().eq("id", report_id))
            .await
            .context("Failed to fetch a report by id")
    }

    #[tracing::instrument(name = "Get reports of a tenant", skip(self))]
    pub async fn get_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Report>, anyhow::Error> {
        self.list(Query::new().eq("tenant_id", tenant_id)).await
    }

    #[tracing::instrument(name = "Get reports by status", skip(self))]
    pub async fn get_by_status(&self, status: ReportStatus) -> Result<Vec<Report>, anyhow::Error> {
        self.list(Query::new().eq("status", status)).await
    }

    #[tracing::instrument(name = "Get all reports", skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Report>, anyhow::Error> {
        self.list(Query::new()).await
    }

    #[tracing::instrument(name = "Create report", skip(self, report))]
    pub async fn create(
        &self,
        tenant_id: Uuid,
        department_id: Uuid,
        report: &NewReport,
    ) -> Result<Report, anyhow::Error> {
        let row = NewReportRow {
            tenant_id,
            department_id,
            title: &report.title,
            description: &report.description,
            status: ReportStatus::Open,
        };
        self.client
            .insert(TABLE, &row)
            .await
            .context("Failed to insert a new report")
    }

    #[tracing::instrument(name = "Update report status", skip(self))]
    pub async fn update_status(
        &self,
        report_id: Uuid,
        status: ReportStatus,
        resolved_by: Option<Uuid>,
    ) -> Result<Option<Report>, anyhow::Error> {
        let row = StatusRow {
            status,
            resolved_by,
            updated_at: Utc::now(),
        };
        let rows: Vec<Report> = self
            .client
            .update(TABLE, &Query::new().eq("id", report_id), &row)
            .await
            .context("Failed to update the status of a report")?;
        Ok(rows.into_iter().next())
    }
}
