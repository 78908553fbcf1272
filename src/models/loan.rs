//! Loan (borrow) model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::book::Book;
use super::enums::LoanStatus;
use super::user::UserShort;

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub extension_count: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Loan with borrower and book details for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanDetails {
    #[serde(flatten)]
    pub loan: Loan,
    pub user: Option<UserShort>,
    pub book: Option<Book>,
    /// Derived from `due_at` at read time
    pub is_overdue: bool,
    pub overdue_days: i64,
    /// Fine that would be assessed if the loan were returned now
    pub accrued_fine: Decimal,
    pub can_extend: bool,
}

/// Loan query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct LoanQuery {
    /// Staff only; borrowers always see their own loans
    pub user_id: Option<i64>,
    pub book_id: Option<i64>,
    pub status: Option<LoanStatus>,
    /// Only loans past their due date
    pub overdue: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create loan request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLoan {
    pub book_id: i64,
    /// Staff may borrow on behalf of another user
    pub user_id: Option<i64>,
}

/// Extend loan request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ExtendLoan {
    /// Days to add to the due date (1-14, defaults to 7)
    #[validate(range(min = 1, max = 14, message = "Extension must be between 1 and 14 days"))]
    pub days: Option<i64>,
}

/// Mark lost request
#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkLost {
    pub notes: Option<String>,
}

/// Loan statistics
#[derive(Debug, Serialize, ToSchema)]
pub struct LoanStats {
    pub active: i64,
    pub overdue: i64,
    pub returned: i64,
    pub lost: i64,
    pub outstanding_fines: Decimal,
}
