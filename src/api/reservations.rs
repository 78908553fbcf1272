//! Reservation queue endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    domain::policy::Action,
    error::AppResult,
    models::{
        reservation::{CreateReservation, ExpirySweepReport, ReservationQuery, ReservationStats},
        Reservation, ReservationDetails,
    },
    AppState,
};

use super::AuthenticatedUser;

/// List reservations (borrowers see their own, staff see everyone's)
#[utoipa::path(
    get,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(ReservationQuery),
    responses(
        (status = 200, description = "Reservations", body = Vec<ReservationDetails>)
    )
)]
pub async fn list_reservations(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReservationQuery>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state
        .services
        .reservations
        .list(&claims.actor(), query)
        .await?;
    Ok(Json(reservations))
}

/// Reservation statistics
#[utoipa::path(
    get,
    path = "/reservations/stats",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reservation statistics", body = ReservationStats),
        (status = 403, description = "Not allowed")
    )
)]
pub async fn reservation_stats(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ReservationStats>> {
    claims.require(Action::ViewAllRecords)?;
    let stats = state.services.reservations.stats().await?;
    Ok(Json(stats))
}

/// Get a reservation by ID
#[utoipa::path(
    get,
    path = "/reservations/{id}",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation found", body = ReservationDetails),
        (status = 403, description = "Someone else's reservation"),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn get_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ReservationDetails>> {
    let reservation = state.services.reservations.get(&claims.actor(), id).await?;
    Ok(Json(reservation))
}

/// Join the queue for an unavailable book
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservation,
    responses(
        (status = 201, description = "Reservation created", body = Reservation),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Admission rule violated")
    )
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateReservation>,
) -> AppResult<(StatusCode, Json<Reservation>)> {
    let reservation = state
        .services
        .reservations
        .create(&claims.actor(), request.book_id)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Expire overdue reservations and advance the queues
#[utoipa::path(
    post,
    path = "/reservations/check-expired",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sweep report", body = ExpirySweepReport),
        (status = 403, description = "Not allowed")
    )
)]
pub async fn check_expired(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ExpirySweepReport>> {
    claims.require(Action::RunSweeps)?;
    let report = state.services.reservations.sweep_expired().await?;
    Ok(Json(report))
}

/// Cancel a reservation
#[utoipa::path(
    put,
    path = "/reservations/{id}/cancel",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation cancelled", body = Reservation),
        (status = 404, description = "Reservation not found"),
        (status = 422, description = "Reservation is not active")
    )
)]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Reservation>> {
    let reservation = state
        .services
        .reservations
        .cancel(&claims.actor(), id)
        .await?;
    Ok(Json(reservation))
}

/// Confirm a reservation for pickup
#[utoipa::path(
    put,
    path = "/reservations/{id}/confirm",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation confirmed", body = Reservation),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Reservation not found"),
        (status = 422, description = "Reservation is not active")
    )
)]
pub async fn confirm_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Reservation>> {
    claims.require(Action::ManageReservations)?;
    let reservation = state.services.reservations.confirm(id).await?;
    Ok(Json(reservation))
}
