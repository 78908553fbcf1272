//! Pure business rules for the circulation lifecycle.
//!
//! Every function here operates on immutable snapshots of entity state plus
//! an explicit `now`, and returns either new state or a typed denial. Side
//! effects (rows written, notifications appended) are expressed as values
//! and executed by the repository layer inside a single transaction. This
//! keeps the rules testable without a live database and makes wall-clock
//! comparisons deterministic.

pub mod loans;
pub mod notify;
pub mod policy;
pub mod reservations;
pub mod sanctions;

use rust_decimal::Decimal;

/// Business-rule constants, loaded from the `rules` configuration section.
#[derive(Debug, Clone)]
pub struct CirculationRules {
    /// Fine accrued per whole day of lateness
    pub fine_per_day: Decimal,
    /// Flat fine for a lost book
    pub lost_book_fee: Decimal,
    /// Maximum number of extensions per loan
    pub max_extensions: i32,
    /// Extension length when the caller does not specify one
    pub default_extension_days: i64,
    /// Upper bound on a single extension
    pub max_extension_days: i64,
    /// How long a fresh reservation stays active
    pub reservation_expiry_days: i64,
    /// Pickup window after a reservation is confirmed
    pub pickup_window_days: i64,
    /// Maximum simultaneously active reservations per user
    pub max_active_reservations: i64,
    /// Suspension length when the issuer does not specify one
    pub default_suspension_days: i64,
}

impl Default for CirculationRules {
    fn default() -> Self {
        Self {
            fine_per_day: Decimal::new(50, 2),
            lost_book_fee: Decimal::new(5000, 2),
            max_extensions: 2,
            default_extension_days: 7,
            max_extension_days: 14,
            reservation_expiry_days: 7,
            pickup_window_days: 3,
            max_active_reservations: 5,
            default_suspension_days: 30,
        }
    }
}
