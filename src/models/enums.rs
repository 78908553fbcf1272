//! Shared domain enums, stored as text in Postgres

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Implements string conversions and sqlx text-column mapping for an enum.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!(concat!("invalid ", stringify!($name), ": {}"), other)),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// User roles, driving borrow limits and loan durations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Borrower,
    Librarian,
    Administrator,
}

text_enum!(Role {
    Borrower => "borrower",
    Librarian => "librarian",
    Administrator => "administrator",
});

impl Role {
    /// Maximum number of simultaneously active loans for this role
    pub fn borrow_limit(&self) -> i64 {
        match self {
            Role::Borrower => 5,
            Role::Librarian => 10,
            Role::Administrator => 15,
        }
    }

    /// Loan duration in days granted to this role
    pub fn loan_duration_days(&self) -> i64 {
        match self {
            Role::Borrower => 14,
            Role::Librarian => 30,
            Role::Administrator => 30,
        }
    }

    /// True for librarians and administrators
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Librarian | Role::Administrator)
    }
}

// ---------------------------------------------------------------------------
// UserStatus
// ---------------------------------------------------------------------------

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Suspended,
    Inactive,
}

text_enum!(UserStatus {
    Active => "active",
    Suspended => "suspended",
    Inactive => "inactive",
});

// ---------------------------------------------------------------------------
// BookStatus
// ---------------------------------------------------------------------------

/// Catalog status of a book title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Available,
    Unavailable,
    Maintenance,
    Reserved,
    Loaned,
    Lost,
}

text_enum!(BookStatus {
    Available => "available",
    Unavailable => "unavailable",
    Maintenance => "maintenance",
    Reserved => "reserved",
    Loaned => "loaned",
    Lost => "lost",
});

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Returned,
    Lost,
}

text_enum!(LoanStatus {
    Active => "active",
    Returned => "returned",
    Lost => "lost",
});

// ---------------------------------------------------------------------------
// ReservationStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Active,
    Confirmed,
    Expired,
    Cancelled,
}

text_enum!(ReservationStatus {
    Active => "active",
    Confirmed => "confirmed",
    Expired => "expired",
    Cancelled => "cancelled",
});

// ---------------------------------------------------------------------------
// SanctionKind
// ---------------------------------------------------------------------------

/// Kind of punitive record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SanctionKind {
    Fine,
    Suspension,
    Warning,
}

text_enum!(SanctionKind {
    Fine => "fine",
    Suspension => "suspension",
    Warning => "warning",
});

// ---------------------------------------------------------------------------
// SanctionStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a sanction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SanctionStatus {
    Active,
    Paid,
    Lifted,
    Expired,
}

text_enum!(SanctionStatus {
    Active => "active",
    Paid => "paid",
    Lifted => "lifted",
    Expired => "expired",
});

// ---------------------------------------------------------------------------
// NotificationKind
// ---------------------------------------------------------------------------

/// Kind of outbox notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Reminder,
    Alert,
    Sanction,
    Success,
}

text_enum!(NotificationKind {
    Info => "info",
    Reminder => "reminder",
    Alert => "alert",
    Sanction => "sanction",
    Success => "success",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        for role in [Role::Borrower, Role::Librarian, Role::Administrator] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("janitor".parse::<Role>().is_err());
    }

    #[test]
    fn role_limits_match_policy() {
        assert_eq!(Role::Borrower.borrow_limit(), 5);
        assert_eq!(Role::Librarian.borrow_limit(), 10);
        assert_eq!(Role::Administrator.borrow_limit(), 15);
        assert_eq!(Role::Borrower.loan_duration_days(), 14);
        assert_eq!(Role::Librarian.loan_duration_days(), 30);
        assert_eq!(Role::Administrator.loan_duration_days(), 30);
    }
}
