//! Reservation model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::book::Book;
use super::enums::ReservationStatus;
use super::user::UserShort;

/// Reservation model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub reserved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: ReservationStatus,
    /// 1-based rank among active reservations for the same book
    pub queue_position: i32,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reservation with user and book details for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReservationDetails {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub user: Option<UserShort>,
    pub book: Option<Book>,
}

/// Reservation query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ReservationQuery {
    /// Staff only; borrowers always see their own reservations
    pub user_id: Option<i64>,
    pub book_id: Option<i64>,
    pub status: Option<ReservationStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create reservation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservation {
    pub book_id: i64,
}

/// Reservation statistics
#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationStats {
    pub total: i64,
    pub active: i64,
    pub confirmed: i64,
    pub expired: i64,
    pub cancelled: i64,
}

/// Result of the expiry sweep
#[derive(Debug, Serialize, ToSchema)]
pub struct ExpirySweepReport {
    /// Reservations transitioned from active to expired
    pub expired_count: u64,
    /// Users notified that they are now first in queue
    pub notified_count: u64,
}
