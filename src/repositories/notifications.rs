use anyhow::Context;
use chrono::Utc;
use uuid::Uuid;

use crate::backend::{BackendClient, Order, Query};
use crate::domain::Notification;

const TABLE: &str = "notifications";

#[derive(Clone)]
pub struct NotificationRepository {
    client: BackendClient,
}

#[derive(serde::Serialize)]
struct NewNotificationRow<'a> {
    user_id: Uuid,
    title: &'a str,
    message: &'a str,
    link: Option<&'a str>,
    #[serde(rename = "type")]
    kind: Option<&'a str>,
    is_read: bool,
}

impl NotificationRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(name = "Create notification", skip(self, message))]
    pub async fn create(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        link: Option<&str>,
        kind: Option<&str>,
    ) -> Result<Notification, anyhow::Error> {
        let row = NewNotificationRow {
            user_id,
            title,
            message,
            link,
            kind,
            is_read: false,
        };
        self.client
            .insert(TABLE, &row)
            .await
            .context("Failed to insert a new notification")
    }

    #[tracing::instrument(name = "Get unread notifications", skip(self))]
    pub async fn get_unread_by_user(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Notification>, anyhow::Error> {
        let query = Query::new()
            .eq("user_id", user_id)
            .eq("is_read", false)
            .order("created_at", Order::Desc)
            .limit(limit);
        self.client
            .select(TABLE, &query)
            .await
            .context("Failed to fetch unread notifications")
    }

    /// `false` when no notification of that user matched.
    #[tracing::instrument(name = "Mark notification as read", skip(self))]
    pub async fn mark_as_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, anyhow::Error> {
        let query = Query::new()
            .eq("id", notification_id)
            .eq("user_id", user_id);
        self.set_read(&query).await
    }

    #[tracing::instrument(name = "Mark all notifications as read", skip(self))]
    pub async fn mark_all_as_read(&self, user_id: Uuid) -> Result<bool, anyhow::Error> {
        let query = Query::new()
            .eq("user_id", user_id)
            .eq("is_read", false);
        self.set_read(&query).await
    }

    async fn set_read(&self, query: &Query) -> Result<bool, anyhow::Error> {
        let rows: Vec<Notification> = self
            .client
            .update(
                TABLE,
                query,
                &serde_json::json!({ "is_read": true, "updated_at": Utc::now() }),
            )
            .await
            .context("Failed to mark notifications as read")?;
        Ok(!rows.is_empty())
    }
}
