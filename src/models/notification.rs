//! Notification outbox model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::NotificationKind;

/// Notification model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    /// Structured ids of the entities this notification refers to
    pub payload: Option<serde_json::Value>,
}

/// Notification query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct NotificationQuery {
    pub kind: Option<NotificationKind>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
