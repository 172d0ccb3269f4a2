mod auth;
mod departments;
mod email;
mod notifications;
mod payments;
mod ratings;
mod reports;

pub use auth::{validate_password, AuthService, MIN_PASSWORD_LENGTH};
pub use departments::{DepartmentError, DepartmentService, StatusChange};
pub use email::EmailService;
pub use notifications::{NotificationService, DEFAULT_UNREAD_LIMIT};
pub use payments::{quote, PaymentError, PaymentService};
pub use ratings::{RatingError, RatingService};
pub use reports::{ReportError, ReportService};

use anyhow::Context;

use crate::backend::BackendClient;
use crate::configuration::Settings;
use crate::email_client::EmailClient;
use crate::repositories::{
    DepartmentRepository, NotificationRepository, PaymentRepository, RatingRepository,
    ReportRepository, StorageRepository, UserRepository,
};

/// Every service of the portal, built once at startup and shared by the handlers.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub departments: DepartmentService,
    pub payments: PaymentService,
    pub reports: ReportService,
    pub ratings: RatingService,
    pub notifications: NotificationService,
    pub email: EmailService,
}

impl Services {
    pub fn build(configuration: &Settings) -> Result<Self, anyhow::Error> {
        let backend = &configuration.backend;
        let tables = BackendClient::new(
            backend.base_url.clone(),
            backend.api_key.clone(),
            backend.timeout(),
        )
        .context("Failed to build the backend client")?;
        let storage = BackendClient::new(
            backend.base_url.clone(),
            backend.storage_key(),
            backend.timeout(),
        )
        .context("Failed to build the storage client")?;

        Ok(Self::from_clients(
            tables,
            storage,
            backend.storage_bucket.clone(),
            email_service(configuration)?,
        ))
    }

    pub fn from_clients(
        tables: BackendClient,
        storage: BackendClient,
        bucket: String,
        email: EmailService,
    ) -> Self {
        let users = UserRepository::new(tables.clone());
        let payments = PaymentRepository::new(tables.clone());
        let storage = StorageRepository::new(storage, bucket);

        let notifications = NotificationService::new(NotificationRepository::new(tables.clone()));
        let departments = DepartmentService::new(
            DepartmentRepository::new(tables.clone()),
            users.clone(),
            storage.clone(),
        );
        Self {
            auth: AuthService::new(users.clone()),
            payments: PaymentService::new(
                payments.clone(),
                users,
                storage,
                departments.clone(),
                notifications.clone(),
                email.clone(),
            ),
            reports: ReportService::new(ReportRepository::new(tables.clone()), notifications.clone()),
            ratings: RatingService::new(RatingRepository::new(tables), payments),
            departments,
            notifications,
            email,
        }
    }
}

fn email_service(configuration: &Settings) -> Result<EmailService, anyhow::Error> {
    let settings = &configuration.email_client;
    if !settings.is_enabled() {
        tracing::info!("Email delivery is disabled");
        return Ok(EmailService::disabled());
    }
    let sender = match settings.sender() {
        Ok(sender) => sender,
        Err(e) => {
            tracing::warn!(error.message = %e, "Invalid sender email, delivery is disabled");
            return Ok(EmailService::disabled());
        }
    };
    let client = EmailClient::new(
        settings.base_url.clone(),
        sender,
        settings.authorization_token.clone(),
        settings.timeout(),
    )
    .context("Failed to build the email client")?;
    Ok(EmailService::new(
        Some(client),
        configuration.application.base_url.clone(),
    ))
}
