//! User administration endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    domain::policy::Action,
    error::AppResult,
    models::{
        user::{CreateUser, UpdateRole, UpdateStatus, UpdateUser, UserQuery, UserStats},
        User,
    },
    AppState,
};

use super::{AuthenticatedUser, MessageResponse};

/// Search user accounts
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "Matching users", body = Vec<User>),
        (status = 403, description = "Not allowed")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Vec<User>>> {
    claims.require(Action::ManageUsers)?;
    let users = state.services.users.list(&query).await?;
    Ok(Json(users))
}

/// Membership statistics
#[utoipa::path(
    get,
    path = "/users/stats",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User statistics", body = UserStats),
        (status = 403, description = "Not allowed")
    )
)]
pub async fn user_stats(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UserStats>> {
    claims.require(Action::ManageUsers)?;
    let stats = state.services.users.stats().await?;
    Ok(Json(stats))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    if claims.user_id != id {
        claims.require(Action::ManageUsers)?;
    }
    let user = state.services.users.get(id).await?;
    Ok(Json(user))
}

/// Create an account with an explicit role
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 403, description = "Not allowed"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    claims.require(Action::AdministerUsers)?;
    request.validate()?;
    let user = state.services.users.create(&request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Update an account
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    claims.require(Action::AdministerUsers)?;
    request.validate()?;
    let user = state.services.users.update(id, &request).await?;
    Ok(Json(user))
}

/// Change a user's role
#[utoipa::path(
    put,
    path = "/users/{id}/role",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateRole,
    responses(
        (status = 200, description = "Role changed", body = User),
        (status = 400, description = "Cannot change own role"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateRole>,
) -> AppResult<Json<User>> {
    claims.require(Action::AdministerUsers)?;
    let user = state
        .services
        .users
        .set_role(&claims.actor(), id, request.role)
        .await?;
    Ok(Json(user))
}

/// Change a user's account status
#[utoipa::path(
    put,
    path = "/users/{id}/status",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateStatus,
    responses(
        (status = 200, description = "Status changed", body = User),
        (status = 400, description = "Cannot change own status"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStatus>,
) -> AppResult<Json<User>> {
    claims.require(Action::AdministerUsers)?;
    let user = state
        .services
        .users
        .set_status(&claims.actor(), id, request.status)
        .await?;
    Ok(Json(user))
}

/// Delete an account
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User has active loans")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    claims.require(Action::AdministerUsers)?;
    state.services.users.delete(&claims.actor(), id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
