//! Authentication and profile endpoints

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        user::{AuthResponse, ChangePassword, LoginUser, RegisterUser, UpdateProfile},
        User,
    },
    AppState,
};

use super::{AuthenticatedUser, MessageResponse};

/// Register a new borrower account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterUser>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    request.validate()?;
    let (user, token) = state.services.auth.register(&request).await?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginUser,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials or deactivated account")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginUser>,
) -> AppResult<Json<AuthResponse>> {
    request.validate()?;
    let (user, token) = state
        .services
        .auth
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(AuthResponse { token, user }))
}

/// Get the authenticated user's account
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<User>> {
    let user = state.services.auth.me(claims.user_id).await?;
    Ok(Json(user))
}

/// Update the authenticated user's profile
#[utoipa::path(
    put,
    path = "/auth/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdateProfile>,
) -> AppResult<Json<User>> {
    request.validate()?;
    let user = state
        .services
        .auth
        .update_profile(claims.user_id, &request)
        .await?;
    Ok(Json(user))
}

/// Change the authenticated user's password
#[utoipa::path(
    put,
    path = "/auth/password",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = ChangePassword,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Current password is incorrect")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ChangePassword>,
) -> AppResult<Json<MessageResponse>> {
    request.validate()?;
    state
        .services
        .auth
        .change_password(claims.user_id, &request)
        .await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}
