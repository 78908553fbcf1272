//! Notification outbox service, always scoped to the calling user

use crate::{
    error::AppResult,
    models::{notification::NotificationQuery, Notification},
    repository::Repository,
};

#[derive(Clone)]
pub struct NotificationsService {
    repository: Repository,
}

impl NotificationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(
        &self,
        user_id: i64,
        query: &NotificationQuery,
    ) -> AppResult<Vec<Notification>> {
        self.repository.notifications.list(user_id, query).await
    }

    pub async fn unread(&self, user_id: i64) -> AppResult<(Vec<Notification>, i64)> {
        let notifications = self.repository.notifications.list_unread(user_id).await?;
        let count = notifications.len() as i64;
        Ok((notifications, count))
    }

    pub async fn mark_read(&self, user_id: i64, id: i64) -> AppResult<Notification> {
        self.repository.notifications.mark_read(id, user_id).await
    }

    pub async fn mark_all_read(&self, user_id: i64) -> AppResult<u64> {
        self.repository.notifications.mark_all_read(user_id).await
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> AppResult<()> {
        self.repository.notifications.delete(id, user_id).await
    }

    pub async fn delete_read(&self, user_id: i64) -> AppResult<u64> {
        self.repository.notifications.delete_read(user_id).await
    }
}
