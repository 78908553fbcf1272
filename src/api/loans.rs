//! Loan lifecycle endpoints

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
        loan::{CreateLoan, ExtendLoan, LoanQuery, LoanStats, MarkLost},
        Loan, LoanDetails, Sanction,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Return response; `fine` is present when the book came back late
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub loan: Loan,
    pub fine: Option<Sanction>,
}

/// Mark-lost response carrying the replacement fee
#[derive(Serialize, ToSchema)]
pub struct LostResponse {
    pub loan: Loan,
    pub fine: Sanction,
}

/// List loans (borrowers see their own, staff see everyone's)
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Active loans", body = Vec<LoanDetails>)
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.list(&claims.actor(), query).await?;
    Ok(Json(loans))
}

/// List finished loans (returned or lost)
#[utoipa::path(
    get,
    path = "/loans/history",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Loan history", body = Vec<LoanDetails>)
    )
)]
pub async fn loan_history(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.history(&claims.actor(), query).await?;
    Ok(Json(loans))
}

/// Circulation statistics
#[utoipa::path(
    get,
    path = "/loans/stats",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Loan statistics", body = LoanStats),
        (status = 403, description = "Not allowed")
    )
)]
pub async fn loan_stats(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<LoanStats>> {
    claims.require(Action::ViewAllRecords)?;
    let stats = state.services.loans.stats().await?;
    Ok(Json(stats))
}

/// Get a loan by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan found", body = LoanDetails),
        (status = 403, description = "Someone else's loan"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.get(&claims.actor(), id).await?;
    Ok(Json(loan))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 404, description = "Book or user not found"),
        (status = 422, description = "Eligibility rule violated")
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state.services.loans.create(&claims.actor(), &request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Extend a loan's due date
#[utoipa::path(
    put,
    path = "/loans/{id}/extend",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Loan ID")),
    request_body = ExtendLoan,
    responses(
        (status = 200, description = "Loan extended", body = Loan),
        (status = 404, description = "Loan not found"),
        (status = 422, description = "Extension rule violated")
    )
)]
pub async fn extend_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<ExtendLoan>,
) -> AppResult<Json<Loan>> {
    request.validate()?;
    let loan = state
        .services
        .loans
        .extend(&claims.actor(), id, request.days)
        .await?;
    Ok(Json(loan))
}

/// Return a borrowed book
#[utoipa::path(
    put,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "Loan not found"),
        (status = 422, description = "Loan is not active")
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ReturnResponse>> {
    let (loan, fine) = state
        .services
        .loans
        .return_loan(&claims.actor(), id)
        .await?;
    Ok(Json(ReturnResponse { loan, fine }))
}

/// Report a borrowed copy lost
#[utoipa::path(
    put,
    path = "/loans/{id}/lost",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Loan ID")),
    request_body = MarkLost,
    responses(
        (status = 200, description = "Copy marked lost", body = LostResponse),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Loan not found"),
        (status = 422, description = "Loan is not active")
    )
)]
pub async fn mark_lost(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<MarkLost>,
) -> AppResult<Json<LostResponse>> {
    claims.require(Action::ManageLoans)?;
    let (loan, fine) = state
        .services
        .loans
        .mark_lost(&claims.actor(), id, request.notes.as_deref())
        .await?;
    Ok(Json(LostResponse { loan, fine }))
}
