//! Sanction model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{SanctionKind, SanctionStatus};
use super::user::UserShort;

/// Sanction model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Sanction {
    pub id: i64,
    pub user_id: i64,
    /// Originating loan, when the sanction was assessed at return time
    pub loan_id: Option<i64>,
    pub kind: SanctionKind,
    pub amount: Option<Decimal>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub reason: String,
    pub status: SanctionStatus,
    /// Staff member who issued the sanction
    pub issued_by: i64,
    /// Append-only audit trail of lift/pay/extend actions
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sanction with user details for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SanctionDetails {
    #[serde(flatten)]
    pub sanction: Sanction,
    pub user: Option<UserShort>,
}

/// Sanction query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SanctionQuery {
    /// Staff only; borrowers always see their own sanctions
    pub user_id: Option<i64>,
    pub kind: Option<SanctionKind>,
    pub status: Option<SanctionStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create sanction request (librarian/administrator)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSanction {
    pub user_id: i64,
    pub kind: SanctionKind,
    #[validate(length(min = 1, max = 500, message = "Reason is required"))]
    pub reason: String,
    /// Required for fines
    pub amount: Option<Decimal>,
    /// Suspension length; defaults to 30 days when omitted
    #[validate(range(min = 1, max = 365, message = "Duration must be between 1 and 365 days"))]
    pub duration_days: Option<i64>,
    pub starts_at: Option<DateTime<Utc>>,
    pub loan_id: Option<i64>,
}

/// Update sanction request (active sanctions only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSanction {
    #[validate(length(min = 1, max = 500, message = "Reason cannot be empty"))]
    pub reason: Option<String>,
    pub amount: Option<Decimal>,
    #[validate(range(min = 1, max = 365, message = "Duration must be between 1 and 365 days"))]
    pub duration_days: Option<i64>,
}

/// Pay fine request; omitted amount pays in full
#[derive(Debug, Deserialize, ToSchema)]
pub struct PaySanction {
    pub amount: Option<Decimal>,
}

/// Extend sanction request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ExtendSanction {
    #[validate(range(min = 1, max = 365, message = "Extension must be between 1 and 365 days"))]
    pub days: i64,
    pub reason: Option<String>,
}

/// Sanction statistics
#[derive(Debug, Serialize, ToSchema)]
pub struct SanctionStats {
    pub total: i64,
    pub active: i64,
    pub paid: i64,
    pub lifted: i64,
    pub expired: i64,
    pub collected_amount: Decimal,
}
