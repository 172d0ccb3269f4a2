use uuid::Uuid;

use crate::domain::Notification;
use crate::repositories::NotificationRepository;

pub const DEFAULT_UNREAD_LIMIT: usize = 10;

#[derive(Clone)]
pub struct NotificationService {
    notifications: NotificationRepository,
}

impl NotificationService {
    pub fn new(notifications: NotificationRepository) -> Self {
        Self { notifications }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        link: Option<&str>,
        kind: Option<&str>,
    ) -> Result<Notification, anyhow::Error> {
        self.notifications
            .create(user_id, title, message, link, kind)
            .await
    }

    /// A notification that could not be stored must not undo the action it reports.
    pub async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        link: Option<&str>,
        kind: Option<&str>,
    ) {
        if let Err(e) = self.create(user_id, title, message, link, kind).await {
            tracing::warn!(
                error.cause_chain = ?e,
                %user_id,
                "Failed to store a notification",
            );
        }
    }

    pub async fn get_unread(
        &self,
        user_id: Uuid,
        limit: Option<usize>,
    ) -> Result<Vec<Notification>, anyhow::Error> {
        self.notifications
            .get_unread_by_user(user_id, limit.unwrap_or(DEFAULT_UNREAD_LIMIT))
            .await
    }

    pub async fn mark_as_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, anyhow::Error> {
        self.notifications.mark_as_read(notification_id, user_id).await
    }

    pub async fn mark_all_as_read(&self, user_id: Uuid) -> Result<bool, anyhow::Error> {
        self.notifications.mark_all_as_read(user_id).await
    }
}
