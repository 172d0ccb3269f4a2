use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{
    prorate, Department, Payment, PaymentStatus, RentMonth, RentQuote, User,
};
use crate::repositories::{PaymentRepository, StorageError, StorageRepository, UserRepository};
use crate::services::departments::{DepartmentError, DepartmentService};
use crate::services::email::EmailService;
use crate::services::notifications::NotificationService;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum PaymentError {
    #[error("Payment not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("Only pending payments can be reviewed, this one is {0}")]
    NotReviewable(PaymentStatus),
    #[error("A payment without a receipt cannot be approved")]
    MissingReceipt,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Amount due for `month`, prorated when the tenant moves in after the 1st.
pub fn quote(
    department: &Department,
    month: RentMonth,
    move_in: Option<NaiveDate>,
) -> Result<RentQuote, PaymentError> {
    let amount = match move_in {
        Some(move_in) => prorate(department.price, month, move_in).map_err(PaymentError::Validation)?,
        None => department.price,
    };
    Ok(RentQuote {
        month,
        monthly_price: department.price,
        amount,
        prorated: (amount - department.price).abs() > f64::EPSILON,
    })
}

pub fn validate_amount(amount: f64) -> Result<f64, PaymentError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(PaymentError::Validation(
            "The amount must be greater than 0".into(),
        ))
    }
}

#[derive(Clone)]
pub struct PaymentService {
    payments: PaymentRepository,
    users: UserRepository,
    storage: StorageRepository,
    departments: DepartmentService,
    notifications: NotificationService,
    email: EmailService,
}

impl PaymentService {
    pub fn new(
        payments: PaymentRepository,
        users: UserRepository,
        storage: StorageRepository,
        departments: DepartmentService,
        notifications: NotificationService,
        email: EmailService,
    ) -> Self {
        Self {
            payments,
            users,
            storage,
            departments,
            notifications,
            email,
        }
    }

    pub async fn get_payments_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Payment>, anyhow::Error> {
        self.payments.get_by_tenant(tenant_id).await
    }

    pub async fn get_payment_by_id(&self, payment_id: Uuid) -> Result<Option<Payment>, anyhow::Error> {
        self.payments.get_by_id(payment_id).await
    }

    pub async fn get_pending_payments(&self) -> Result<Vec<Payment>, anyhow::Error> {
        self.payments.get_by_status(PaymentStatus::Pending).await
    }

    pub async fn get_payments_by_status(
        &self,
        status: PaymentStatus,
    ) -> Result<Vec<Payment>, anyhow::Error> {
        self.payments.get_by_status(status).await
    }

    pub fn quote(
        &self,
        department: &Department,
        month: RentMonth,
        move_in: Option<NaiveDate>,
    ) -> Result<RentQuote, PaymentError> {
        quote(department, month, move_in)
    }

    #[tracing::instrument(name = "Create payment", skip(self, notes))]
    pub async fn create_payment(
        &self,
        tenant_id: Uuid,
        department_id: Uuid,
        amount: f64,
        month: &str,
        notes: Option<&str>,
        today: NaiveDate,
    ) -> Result<Payment, PaymentError> {
        let amount = validate_amount(amount)?;
        let month = RentMonth::parse(month).map_err(PaymentError::Validation)?;
        month.ensure_bookable(today).map_err(PaymentError::Validation)?;
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());
        Ok(self
            .payments
            .create(tenant_id, department_id, amount, month, notes)
            .await?)
    }

    /// The payment is kept when the receipt upload fails, the tenant can attach it later.
    #[allow(clippy::too_many_arguments)]
    #[tracing::instrument(name = "Create payment with receipt", skip(self, notes, content))]
    pub async fn create_payment_with_receipt(
        &self,
        tenant_id: Uuid,
        department_id: Uuid,
        amount: f64,
        month: &str,
        notes: Option<&str>,
        today: NaiveDate,
        content: Vec<u8>,
        file_name: &str,
    ) -> Result<Payment, PaymentError> {
        let payment = self
            .create_payment(tenant_id, department_id, amount, month, notes, today)
            .await?;
        self.upload_receipt(payment.id, content, file_name).await
    }

    #[tracing::instrument(name = "Upload receipt", skip(self, content))]
    pub async fn upload_receipt(
        &self,
        payment_id: Uuid,
        content: Vec<u8>,
        file_name: &str,
    ) -> Result<Payment, PaymentError> {
        if self.payments.get_by_id(payment_id).await?.is_none() {
            return Err(PaymentError::NotFound);
        }
        let receipt_url = self.storage.upload_file(content, file_name, None).await?;
        self.payments
            .set_receipt(payment_id, &receipt_url)
            .await?
            .ok_or(PaymentError::NotFound)
    }

    async fn reviewable(&self, payment_id: Uuid) -> Result<Payment, PaymentError> {
        let payment = self
            .payments
            .get_by_id(payment_id)
            .await?
            .ok_or(PaymentError::NotFound)?;
        if !payment.status.is_reviewable() {
            return Err(PaymentError::NotReviewable(payment.status));
        }
        Ok(payment)
    }

    /// Approving the first payment of a tenant without a unit assigns the unit and occupies it.
    #[tracing::instrument(name = "Approve payment", skip(self))]
    pub async fn approve_payment(
        &self,
        payment_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Payment, PaymentError> {
        let payment = self.reviewable(payment_id).await?;
        if payment.receipt_url.as_deref().map_or(true, |r| r.trim().is_empty()) {
            return Err(PaymentError::MissingReceipt);
        }
        // The payment stays pending until the unit is assigned, so a failed
        // assignment can be retried.
        let tenant = self.users.get_by_id(payment.tenant_id).await?;
        if let Some(tenant) = &tenant {
            if tenant.department_id.is_none() {
                self.assign_unit(tenant, payment.department_id).await?;
            }
        }
        let approved = self
            .payments
            .update_status(payment_id, PaymentStatus::Approved, Some(admin_id), None)
            .await?
            .ok_or(PaymentError::NotFound)?;

        let message = format!(
            "Your payment of {:.2} for {} has been approved.",
            approved.amount, approved.month
        );
        self.notifications
            .notify(
                approved.tenant_id,
                "Payment approved",
                &message,
                Some("/tenant/dashboard"),
                Some("payment"),
            )
            .await;
        self.email_tenant(tenant.as_ref(), "Your payment has been approved", &message)
            .await;
        Ok(approved)
    }

    async fn assign_unit(&self, tenant: &User, department_id: Uuid) -> Result<(), PaymentError> {
        self.users
            .set_department(tenant.id, Some(department_id))
            .await?;
        match self.departments.mark_as_occupied(department_id).await {
            Ok(_) => Ok(()),
            Err(DepartmentError::Unexpected(e)) => Err(e.into()),
            Err(e) => {
                tracing::warn!(
                    error.message = %e,
                    %department_id,
                    "The department of an approved payment was not marked as occupied",
                );
                Ok(())
            }
        }
    }

    #[tracing::instrument(name = "Reject payment", skip(self, notes))]
    pub async fn reject_payment(
        &self,
        payment_id: Uuid,
        admin_id: Uuid,
        notes: Option<&str>,
    ) -> Result<Payment, PaymentError> {
        self.reviewable(payment_id).await?;
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());
        let rejected = self
            .payments
            .update_status(payment_id, PaymentStatus::Rejected, Some(admin_id), notes)
            .await?
            .ok_or(PaymentError::NotFound)?;

        let mut message = format!("Your payment for {} has been rejected.", rejected.month);
        if let Some(notes) = notes {
            message.push_str(&format!(" Reason: {}", notes));
        }
        self.notifications
            .notify(
                rejected.tenant_id,
                "Payment rejected",
                &message,
                Some("/tenant/dashboard"),
                Some("payment"),
            )
            .await;
        let tenant = self.users.get_by_id(rejected.tenant_id).await?;
        self.email_tenant(tenant.as_ref(), "Your payment has been rejected", &message)
            .await;
        Ok(rejected)
    }

    async fn email_tenant(&self, tenant: Option<&User>, subject: &str, body: &str) {
        if let Some(tenant) = tenant {
            if !self.email.send_email(&[tenant.email.as_str()], subject, body).await {
                tracing::info!(tenant_id = %tenant.id, "No email was delivered to the tenant");
            }
        }
    }

    /// The unit of the most recent approved payment of a tenant.
    pub async fn approved_department_for(&self, tenant_id: Uuid) -> Result<Option<Uuid>, anyhow::Error> {
        let approved = self
            .payments
            .get_by_tenant_and_status(tenant_id, PaymentStatus::Approved)
            .await?;
        Ok(approved.first().map(|p| p.department_id))
    }

    pub async fn has_approved_payment(
        &self,
        tenant_id: Uuid,
        department_id: Uuid,
    ) -> Result<bool, anyhow::Error> {
        let approved = self
            .payments
            .get_by_tenant_and_status(tenant_id, PaymentStatus::Approved)
            .await?;
        Ok(approved.iter().any(|p| p.department_id == department_id))
    }
}
