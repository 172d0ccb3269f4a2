mod dashboard;
mod notifications;
mod payments;
mod reports;

pub use dashboard::tenant_dashboard;
pub use notifications::{mark_all_notifications_read, mark_notification_read};
pub use payments::{new_payment, new_payment_form, upload_receipt, upload_receipt_form};
pub use reports::{new_report, new_report_form};

use crate::domain::User;
use crate::services::Services;
use crate::utils::e500;

// The middleware only checks the session, the account itself may be gone.
async fn logged_in_user(services: &Services, user_id: uuid::Uuid) -> Result<User, actix_web::Error> {
    services
        .auth
        .get_user_by_id(user_id)
        .await
        .map_err(e500)?
        .ok_or_else(|| e500(anyhow::anyhow!("The logged in user {} does not exist", user_id)))
}
