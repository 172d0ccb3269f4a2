use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::{BackendClient, Order, Query};
use crate::domain::{Department, DepartmentDraft, DepartmentFilters, DepartmentStatus};

const TABLE: &str = "departments";

#[derive(Clone)]
pub struct DepartmentRepository {
    client: BackendClient,
}

#[derive(serde::Serialize)]
struct DepartmentUpdateRow<'a> {
    #[serde(flatten)]
    draft: &'a DepartmentDraft,
    updated_at: DateTime<Utc>,
}

fn catalog_query(status: Option<DepartmentStatus>, filters: Option<&DepartmentFilters>) -> Query {
    let mut query = Query::new();
    if let Some(status) = status {
        query = query.eq("status", status);
    }
    if let Some(filters) = filters {
        let flags = [
            ("has_terrace", filters.has_terrace),
            ("has_balcony", filters.has_balcony),
            ("sea_view", filters.sea_view),
            ("parking", filters.parking),
            ("furnished", filters.furnished),
        ];
        for (column, _) in flags.iter().filter(|(_, on)| *on) {
            query = query.eq(column, true);
        }
        if let Some(min) = filters.min_price {
            query = query.gte("price", min);
        }
        if let Some(max) = filters.max_price {
            query = query.lte("price", max);
        }
        if let Some(min) = filters.min_rooms {
            query = query.gte("rooms", min);
        }
        if let Some(max) = filters.max_rooms {
            query = query.lte("rooms", max);
        }
    }
    query.order("created_at", Order::Desc)
}

impl DepartmentRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(name = "Get department by id", skip(self))]
    pub async fn get_by_id(&self, department_id: Uuid) -> Result<Option<Department>, anyhow::Error> {
        self.client
            .select_one(TABLE, &Query::new().eq("id", department_id))
            .await
            .context("Failed to fetch a department by id")
    }

    /// Newest first.
    #[tracing::instrument(name = "List departments", skip(self))]
    pub async fn get_all(
        &self,
        status: Option<DepartmentStatus>,
        filters: Option<&DepartmentFilters>,
    ) -> Result<Vec<Department>, anyhow::Error> {
        self.client
            .select(TABLE, &catalog_query(status, filters))
            .await
            .context("Failed to list departments")
    }

    #[tracing::instrument(name = "Create department", skip(self, draft), fields(title = %draft.title))]
    pub async fn create(&self, draft: &DepartmentDraft) -> Result<Department, anyhow::Error> {
        self.client
            .insert(TABLE, draft)
            .await
            .context("Failed to insert a new department")
    }

    #[tracing::instrument(name = "Update department", skip(self, draft))]
    pub async fn update(
        &self,
        department_id: Uuid,
        draft: &DepartmentDraft,
    ) -> Result<Option<Department>, anyhow::Error> {
        let row = DepartmentUpdateRow {
            draft,
            updated_at: Utc::now(),
        };
        let rows: Vec<Department> = self
            .client
            .update(TABLE, &Query::new().eq("id", department_id), &row)
            .await
            .context("Failed to update a department")?;
        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(name = "Update department status", skip(self))]
    pub async fn update_status(
        &self,
        department_id: Uuid,
        status: DepartmentStatus,
    ) -> Result<Option<Department>, anyhow::Error> {
        let rows: Vec<Department> = self
            .client
            .update(
                TABLE,
                &Query::new().eq("id", department_id),
                &serde_json::json!({ "status": status, "updated_at": Utc::now() }),
            )
            .await
            .context("Failed to update the status of a department")?;
        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(name = "Set department image", skip(self))]
    pub async fn set_image(
        &self,
        department_id: Uuid,
        image_url: &str,
    ) -> Result<Option<Department>, anyhow::Error> {
        let rows: Vec<Department> = self
            .client
            .update(
                TABLE,
                &Query::new().eq("id", department_id),
                &serde_json::json!({ "image_url": image_url, "updated_at": Utc::now() }),
            )
            .await
            .context("Failed to set the image of a department")?;
        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(name = "Delete department", skip(self))]
    pub async fn delete(&self, department_id: Uuid) -> Result<(), anyhow::Error> {
        self.client
            .delete(TABLE, &Query::new().eq("id", department_id))
            .await
            .context("Failed to delete a department")
    }
}
