// db/notificationdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::{DBClient, StoreError};
use crate::models::engagementmodel::{Notification, NotificationKind};

#[async_trait]
pub trait NotificationExt {
    async fn insert_notification(
        &self,
        recipient_id: Uuid,
        kind: NotificationKind,
        related_ref: Uuid,
        body: String,
        data: Option<serde_json::Value>,
    ) -> Result<Notification, StoreError>;

    async fn get_notification(
        &self,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, StoreError>;

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, StoreError>;

    async fn unread_count(&self, recipient_id: Uuid) -> Result<i64, StoreError>;

    /// The only mutation a notification admits after creation.
    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, StoreError>;
}

const NOTIFICATION_COLUMNS: &str = r#"
    id, recipient_id, kind, related_ref, body, data, read, created_at
"#;

#[async_trait]
impl NotificationExt for DBClient {
    async fn insert_notification(
        &self,
        recipient_id: Uuid,
        kind: NotificationKind,
        related_ref: Uuid,
        body: String,
        data: Option<serde_json::Value>,
    ) -> Result<Notification, StoreError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (recipient_id, kind, related_ref, body, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(recipient_id)
        .bind(kind)
        .bind(related_ref)
        .bind(body)
        .bind(data)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn get_notification(
        &self,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, StoreError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE id = $1
            "#
        ))
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, StoreError> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(recipient_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn unread_count(&self, recipient_id: Uuid) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM notifications
            WHERE recipient_id = $1 AND read = FALSE
            "#,
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, StoreError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET read = TRUE
            WHERE id = $1
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }
}
