//! Sanction ledger endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    domain::policy::Action,
    error::AppResult,
    models::{
        sanction::{
            CreateSanction, ExtendSanction, PaySanction, SanctionQuery, SanctionStats,
            UpdateSanction,
        },
        Sanction, SanctionDetails,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Sanction expiry sweep report
#[derive(Serialize, ToSchema)]
pub struct SanctionSweepResponse {
    pub expired_count: u64,
}

/// List sanctions (staff)
#[utoipa::path(
    get,
    path = "/sanctions",
    tag = "sanctions",
    security(("bearer_auth" = [])),
    params(SanctionQuery),
    responses(
        (status = 200, description = "Sanctions", body = Vec<SanctionDetails>),
        (status = 403, description = "Not allowed")
    )
)]
pub async fn list_sanctions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<SanctionQuery>,
) -> AppResult<Json<Vec<SanctionDetails>>> {
    claims.require(Action::ViewAllRecords)?;
    let sanctions = state.services.sanctions.list(&query).await?;
    Ok(Json(sanctions))
}

/// The caller's own sanctions
#[utoipa::path(
    get,
    path = "/sanctions/mine",
    tag = "sanctions",
    security(("bearer_auth" = [])),
    params(SanctionQuery),
    responses(
        (status = 200, description = "Own sanctions", body = Vec<SanctionDetails>)
    )
)]
pub async fn my_sanctions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<SanctionQuery>,
) -> AppResult<Json<Vec<SanctionDetails>>> {
    let sanctions = state.services.sanctions.mine(&claims.actor(), query).await?;
    Ok(Json(sanctions))
}

/// Sanction statistics
#[utoipa::path(
    get,
    path = "/sanctions/stats",
    tag = "sanctions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sanction statistics", body = SanctionStats),
        (status = 403, description = "Not allowed")
    )
)]
pub async fn sanction_stats(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<SanctionStats>> {
    claims.require(Action::ViewAllRecords)?;
    let stats = state.services.sanctions.stats().await?;
    Ok(Json(stats))
}

/// Get a sanction by ID
#[utoipa::path(
    get,
    path = "/sanctions/{id}",
    tag = "sanctions",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Sanction ID")),
    responses(
        (status = 200, description = "Sanction found", body = SanctionDetails),
        (status = 403, description = "Someone else's sanction"),
        (status = 404, description = "Sanction not found")
    )
)]
pub async fn get_sanction(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<SanctionDetails>> {
    let sanction = state.services.sanctions.get(&claims.actor(), id).await?;
    Ok(Json(sanction))
}

/// Issue a sanction
#[utoipa::path(
    post,
    path = "/sanctions",
    tag = "sanctions",
    security(("bearer_auth" = [])),
    request_body = CreateSanction,
    responses(
        (status = 201, description = "Sanction created", body = Sanction),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "User not found")
    )
)]
pub async fn create_sanction(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateSanction>,
) -> AppResult<(StatusCode, Json<Sanction>)> {
    claims.require(Action::ManageSanctions)?;
    request.validate()?;
    let sanction = state
        .services
        .sanctions
        .create(&claims.actor(), &request)
        .await?;
    Ok((StatusCode::CREATED, Json(sanction)))
}

/// Expire elapsed sanctions
#[utoipa::path(
    post,
    path = "/sanctions/check-expired",
    tag = "sanctions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sweep report", body = SanctionSweepResponse),
        (status = 403, description = "Not allowed")
    )
)]
pub async fn check_expired(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<SanctionSweepResponse>> {
    claims.require(Action::RunSweeps)?;
    let expired_count = state.services.sanctions.sweep_expired().await?;
    Ok(Json(SanctionSweepResponse { expired_count }))
}

/// Edit an active sanction
#[utoipa::path(
    put,
    path = "/sanctions/{id}",
    tag = "sanctions",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Sanction ID")),
    request_body = UpdateSanction,
    responses(
        (status = 200, description = "Sanction updated", body = Sanction),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Sanction not found"),
        (status = 422, description = "Sanction is not active")
    )
)]
pub async fn update_sanction(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateSanction>,
) -> AppResult<Json<Sanction>> {
    claims.require(Action::ManageSanctions)?;
    request.validate()?;
    let sanction = state.services.sanctions.update(id, &request).await?;
    Ok(Json(sanction))
}

/// Lift an active sanction
#[utoipa::path(
    put,
    path = "/sanctions/{id}/lift",
    tag = "sanctions",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Sanction ID")),
    responses(
        (status = 200, description = "Sanction lifted", body = Sanction),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Sanction not found"),
        (status = 422, description = "Sanction is not active")
    )
)]
pub async fn lift_sanction(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Sanction>> {
    claims.require(Action::ManageSanctions)?;
    let sanction = state.services.sanctions.lift(&claims.actor(), id).await?;
    Ok(Json(sanction))
}

/// Pay a fine in full
#[utoipa::path(
    put,
    path = "/sanctions/{id}/pay",
    tag = "sanctions",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Sanction ID")),
    request_body = PaySanction,
    responses(
        (status = 200, description = "Fine paid", body = Sanction),
        (status = 403, description = "Someone else's fine"),
        (status = 404, description = "Sanction not found"),
        (status = 422, description = "Not an active fine, or partial payment")
    )
)]
pub async fn pay_sanction(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<PaySanction>,
) -> AppResult<Json<Sanction>> {
    let sanction = state
        .services
        .sanctions
        .pay(&claims.actor(), id, request.amount)
        .await?;
    Ok(Json(sanction))
}

/// Extend an active sanction
#[utoipa::path(
    put,
    path = "/sanctions/{id}/extend",
    tag = "sanctions",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Sanction ID")),
    request_body = ExtendSanction,
    responses(
        (status = 200, description = "Sanction extended", body = Sanction),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Sanction not found"),
        (status = 422, description = "Sanction is not active")
    )
)]
pub async fn extend_sanction(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<ExtendSanction>,
) -> AppResult<Json<Sanction>> {
    claims.require(Action::ManageSanctions)?;
    request.validate()?;
    let sanction = state
        .services
        .sanctions
        .extend(&claims.actor(), id, request.days, request.reason.as_deref())
        .await?;
    Ok(Json(sanction))
}
