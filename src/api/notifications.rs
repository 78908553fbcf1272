//! Notification outbox endpoints, always scoped to the caller

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{notification::NotificationQuery, Notification},
    AppState,
};

use super::{AuthenticatedUser, MessageResponse};

/// Unread notifications with their count
#[derive(Serialize, ToSchema)]
pub struct UnreadResponse {
    pub notifications: Vec<Notification>,
    pub unread: i64,
}

/// Bulk operation report
#[derive(Serialize, ToSchema)]
pub struct BulkResponse {
    pub affected: u64,
}

/// List the caller's notifications
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(NotificationQuery),
    responses(
        (status = 200, description = "Notifications", body = Vec<Notification>)
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = state
        .services
        .notifications
        .list(claims.user_id, &query)
        .await?;
    Ok(Json(notifications))
}

/// List unread notifications
#[utoipa::path(
    get,
    path = "/notifications/unread",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Unread notifications", body = UnreadResponse)
    )
)]
pub async fn unread_notifications(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UnreadResponse>> {
    let (notifications, unread) = state.services.notifications.unread(claims.user_id).await?;
    Ok(Json(UnreadResponse {
        notifications,
        unread,
    }))
}

/// Mark a notification read
#[utoipa::path(
    put,
    path = "/notifications/{id}/read",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 404, description = "Notification not found")
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Notification>> {
    let notification = state
        .services
        .notifications
        .mark_read(claims.user_id, id)
        .await?;
    Ok(Json(notification))
}

/// Mark all notifications read
#[utoipa::path(
    put,
    path = "/notifications/read-all",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All notifications marked read", body = BulkResponse)
    )
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<BulkResponse>> {
    let affected = state
        .services
        .notifications
        .mark_all_read(claims.user_id)
        .await?;
    Ok(Json(BulkResponse { affected }))
}

/// Delete a notification
#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification deleted", body = MessageResponse),
        (status = 404, description = "Notification not found")
    )
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .notifications
        .delete(claims.user_id, id)
        .await?;
    Ok(Json(MessageResponse::new("Notification deleted")))
}

/// Delete all read notifications
#[utoipa::path(
    delete,
    path = "/notifications/read",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Read notifications deleted", body = BulkResponse)
    )
)]
pub async fn delete_read(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<BulkResponse>> {
    let affected = state
        .services
        .notifications
        .delete_read(claims.user_id)
        .await?;
    Ok(Json(BulkResponse { affected }))
}
