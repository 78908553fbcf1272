//! Sanction ledger rules: activity window, payment, lift, extension.
//!
//! A sanction blocks or charges a user while `status == active` and its end
//! date (when set) has not passed. Expiry is derived from dates; the stored
//! status is refreshed by the explicit sweep.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::AppError;
use crate::models::{
    enums::{SanctionKind, SanctionStatus},
    Sanction,
};

use super::CirculationRules;

/// Why a pay/lift/extend transition is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanctionDenial {
    #[error("sanction is not active")]
    NotActive,
    #[error("only fines can be paid")]
    NotAFine,
    #[error("partial payment is not accepted (owed {owed})")]
    PartialPayment { owed: Decimal },
}

impl From<SanctionDenial> for AppError {
    fn from(denial: SanctionDenial) -> Self {
        AppError::BusinessRule(denial.to_string())
    }
}

/// A sanction is in force while active and before its end date (an absent
/// end date means indefinitely).
pub fn is_in_force(sanction: &Sanction, now: DateTime<Utc>) -> bool {
    sanction.status == SanctionStatus::Active
        && sanction.ends_at.map_or(true, |end| now < end)
}

/// An active sanction whose end date has passed, due for the expiry sweep.
pub fn is_expired(sanction: &Sanction, now: DateTime<Utc>) -> bool {
    sanction.status == SanctionStatus::Active
        && sanction.ends_at.is_some_and(|end| now > end)
}

/// Suspension window starting at `starts_at`; falls back to the default
/// duration when the issuer gave none.
pub fn suspension_end(
    starts_at: DateTime<Utc>,
    duration_days: Option<i64>,
    rules: &CirculationRules,
) -> DateTime<Utc> {
    starts_at + Duration::days(duration_days.unwrap_or(rules.default_suspension_days))
}

pub fn check_lift(sanction: &Sanction) -> Result<(), SanctionDenial> {
    if sanction.status != SanctionStatus::Active {
        return Err(SanctionDenial::NotActive);
    }
    Ok(())
}

/// Fines only, full payment only.
pub fn check_pay(sanction: &Sanction, paid: Option<Decimal>) -> Result<Decimal, SanctionDenial> {
    if sanction.kind != SanctionKind::Fine {
        return Err(SanctionDenial::NotAFine);
    }
    if sanction.status != SanctionStatus::Active {
        return Err(SanctionDenial::NotActive);
    }
    let owed = sanction.amount.unwrap_or(Decimal::ZERO);
    let paid = paid.unwrap_or(owed);
    if paid < owed {
        return Err(SanctionDenial::PartialPayment { owed });
    }
    Ok(paid)
}

/// Validate an extension and compute the new end date. A sanction with no
/// end date yet is extended from `now`.
pub fn check_extend(
    sanction: &Sanction,
    now: DateTime<Utc>,
    days: i64,
) -> Result<DateTime<Utc>, SanctionDenial> {
    if sanction.status != SanctionStatus::Active {
        return Err(SanctionDenial::NotActive);
    }
    Ok(sanction.ends_at.unwrap_or(now) + Duration::days(days))
}

/// One audit line appended to the sanction's notes.
pub fn audit_note(existing: Option<&str>, line: &str) -> String {
    match existing {
        Some(notes) if !notes.is_empty() => format!("{}\n{}", notes, line),
        _ => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanction(
        kind: SanctionKind,
        status: SanctionStatus,
        amount: Option<Decimal>,
        ends_at: Option<DateTime<Utc>>,
    ) -> Sanction {
        let now = Utc::now();
        Sanction {
            id: 11,
            user_id: 1,
            loan_id: None,
            kind,
            amount,
            starts_at: now - Duration::days(1),
            ends_at,
            reason: "late return".into(),
            status,
            issued_by: 2,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn suspension_without_end_date_blocks_indefinitely() {
        let s = sanction(SanctionKind::Suspension, SanctionStatus::Active, None, None);
        assert!(is_in_force(&s, Utc::now()));
        assert!(!is_expired(&s, Utc::now()));
    }

    #[test]
    fn suspension_past_end_date_is_no_longer_in_force() {
        let now = Utc::now();
        let s = sanction(
            SanctionKind::Suspension,
            SanctionStatus::Active,
            None,
            Some(now - Duration::hours(1)),
        );
        assert!(!is_in_force(&s, now));
        assert!(is_expired(&s, now));
    }

    #[test]
    fn default_suspension_lasts_thirty_days() {
        let rules = CirculationRules::default();
        let start = Utc::now();
        assert_eq!(
            suspension_end(start, None, &rules),
            start + Duration::days(30)
        );
        assert_eq!(
            suspension_end(start, Some(10), &rules),
            start + Duration::days(10)
        );
    }

    #[test]
    fn full_payment_accepted_partial_rejected() {
        let owed = Decimal::new(250, 2);
        let s = sanction(SanctionKind::Fine, SanctionStatus::Active, Some(owed), None);
        assert_eq!(check_pay(&s, None), Ok(owed));
        assert_eq!(check_pay(&s, Some(Decimal::new(300, 2))), Ok(Decimal::new(300, 2)));
        assert_eq!(
            check_pay(&s, Some(Decimal::new(100, 2))),
            Err(SanctionDenial::PartialPayment { owed })
        );
    }

    #[test]
    fn only_active_fines_are_payable() {
        let warning = sanction(SanctionKind::Warning, SanctionStatus::Active, None, None);
        assert_eq!(check_pay(&warning, None), Err(SanctionDenial::NotAFine));
        let paid = sanction(
            SanctionKind::Fine,
            SanctionStatus::Paid,
            Some(Decimal::ONE),
            None,
        );
        assert_eq!(check_pay(&paid, None), Err(SanctionDenial::NotActive));
    }

    #[test]
    fn lift_and_extend_require_active_status() {
        let lifted = sanction(SanctionKind::Suspension, SanctionStatus::Lifted, None, None);
        assert!(check_lift(&lifted).is_err());
        assert!(check_extend(&lifted, Utc::now(), 5).is_err());
    }

    #[test]
    fn extension_adds_days_from_end_or_now() {
        let now = Utc::now();
        let end = now + Duration::days(3);
        let dated = sanction(
            SanctionKind::Suspension,
            SanctionStatus::Active,
            None,
            Some(end),
        );
        assert_eq!(check_extend(&dated, now, 5), Ok(end + Duration::days(5)));

        let open = sanction(SanctionKind::Suspension, SanctionStatus::Active, None, None);
        assert_eq!(check_extend(&open, now, 5), Ok(now + Duration::days(5)));
    }

    #[test]
    fn audit_notes_append_with_newlines() {
        assert_eq!(audit_note(None, "lifted by staff #2"), "lifted by staff #2");
        assert_eq!(
            audit_note(Some("issued"), "extended by 5 days"),
            "issued\nextended by 5 days"
        );
    }
}
