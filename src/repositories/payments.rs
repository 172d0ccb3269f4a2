use anyhow::Context;
use chrono::Utc;
use uuid::Uuid;

use crate::backend::{BackendClient, Order, Query};
use crate::domain::{Payment, PaymentStatus, RentMonth};

const TABLE: &str = "payments";

#[derive(Clone)]
pub struct PaymentRepository {
    client: BackendClient,
}

#[derive(serde::Serialize)]
struct NewPaymentRow<'a> {
    tenant_id: Uuid,
    department_id: Uuid,
    amount: f64,
    status: PaymentStatus,
    month: RentMonth,
    receipt_url: Option<&'a str>,
    notes: Option<&'a str>,
}

#[derive(serde::Serialize)]
struct ReviewRow<'a> {
    status: PaymentStatus,
    reviewed_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
    updated_at: chrono::DateTime<Utc>,
}

impl PaymentRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(name = "Get payment by id", skip(self))]
    pub async fn get_by_id(&self, payment_id: Uuid) -> Result<Option<Payment>, anyhow::Error> {
        self.client
            .select_one(TABLE, &Query::new().eq("id", payment_id))
            .await
            .context("Failed to fetch a payment by id")
    }

    /// Latest month first.
    #[tracing::instrument(name = "Get payments of a tenant", skip(self))]
    pub async fn get_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Payment>, anyhow::Error> {
        let query = Query::new()
            .eq("tenant_id", tenant_id)
            .order("month", Order::Desc);
        self.client
            .select(TABLE, &query)
            .await
            .context("Failed to fetch the payments of a tenant")
    }

    #[tracing::instrument(name = "Get payments by status", skip(self))]
    pub async fn get_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>, anyhow::Error> {
        let query = Query::new()
            .eq("status", status)
            .order("created_at", Order::Desc);
        self.client
            .select(TABLE, &query)
            .await
            .context("Failed to fetch payments by status")
    }

    #[tracing::instrument(name = "Get payments of a tenant by status", skip(self))]
    pub async fn get_by_tenant_and_status(
        &self,
        tenant_id: Uuid,
        status: PaymentStatus,
    ) -> Result<Vec<Payment>, anyhow::Error> {
        let query = Query::new()
            .eq("tenant_id", tenant_id)
            .eq("status", status)
            .order("created_at", Order::Desc);
        self.client
            .select(TABLE, &query)
            .await
            .context("Failed to fetch the payments of a tenant by status")
    }

    #[tracing::instrument(name = "Create payment", skip(self, notes))]
    pub async fn create(
        &self,
        tenant_id: Uuid,
        department_id: Uuid,
        amount: f64,
        month: RentMonth,
        notes: Option<&str>,
    ) -> Result<Payment, anyhow::Error> {
        let row = NewPaymentRow {
            tenant_id,
            department_id,
            amount,
            status: PaymentStatus::Pending,
            month,
            receipt_url: None,
            notes,
        };
        self.client
            .insert(TABLE, &row)
            .await
            .context("Failed to insert a new payment")
    }

    #[tracing::instrument(name = "Attach receipt", skip(self))]
    pub async fn set_receipt(
        &self,
        payment_id: Uuid,
        receipt_url: &str,
    ) -> Result<Option<Payment>, anyhow::Error> {
        let rows: Vec<Payment> = self
            .client
            .update(
                TABLE,
                &Query::new().eq("id", payment_id),
                &serde_json::json!({ "receipt_url": receipt_url, "updated_at": Utc::now() }),
            )
            .await
            .context("Failed to attach a receipt to a payment")?;
        Ok(rows.into_iter().next())
    }

    /// `notes` is only written when provided.
    #[tracing::instrument(name = "Update payment status", skip(self, notes))]
    pub async fn update_status(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
        reviewed_by: Option<Uuid>,
        notes: Option<&str>,
    ) -> Result<Option<Payment>, anyhow::Error> {
        let row = ReviewRow {
            status,
            reviewed_by,
            notes,
            updated_at: Utc::now(),
        };
        let rows: Vec<Payment> = self
            .client
            .update(TABLE, &Query::new().eq("id", payment_id), &row)
            .await
            .context("Failed to update the status of a payment")?;
        Ok(rows.into_iter().next())
    }
}
