//! Loan lifecycle rules: eligibility, extension, return and loss.
//!
//! State machine: `active -> returned` | `active -> lost`. Overdue is never
//! stored; it is derived from `due_at` against the caller-supplied `now`.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::AppError;
use crate::models::{enums::LoanStatus, Book, Loan, User};

use super::CirculationRules;

/// Counters queried alongside the borrower inside the creation transaction
#[derive(Debug, Clone, Copy, Default)]
pub struct BorrowContext {
    /// Active loans currently held by the borrower
    pub active_loans: i64,
    /// Borrower already holds an active loan of this very book
    pub already_borrowing_book: bool,
    /// Borrower has an active, unexpired suspension in the sanction ledger
    pub suspended: bool,
}

/// Why a loan cannot be created
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BorrowDenial {
    #[error("user account is not active")]
    AccountInactive,
    #[error("user is suspended")]
    Suspended,
    #[error("loan limit reached ({current}/{limit})")]
    LimitReached { current: i64, limit: i64 },
    #[error("book is not available")]
    BookUnavailable,
    #[error("user already has an active loan for this book")]
    AlreadyBorrowed,
}

impl From<BorrowDenial> for AppError {
    fn from(denial: BorrowDenial) -> Self {
        AppError::BusinessRule(denial.to_string())
    }
}

/// Why a loan cannot be extended
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtendDenial {
    #[error("loan is not active")]
    NotActive,
    #[error("loan is overdue")]
    Overdue,
    #[error("extension limit reached ({0})")]
    LimitReached(i32),
    #[error("book has active reservations")]
    Reserved,
    #[error("extension must be between 1 and {max} days")]
    InvalidDays { max: i64 },
}

impl From<ExtendDenial> for AppError {
    fn from(denial: ExtendDenial) -> Self {
        AppError::BusinessRule(denial.to_string())
    }
}

/// Why a return/mark-lost transition is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionDenial {
    #[error("loan is not active")]
    NotActive,
}

impl From<TransitionDenial> for AppError {
    fn from(denial: TransitionDenial) -> Self {
        AppError::BusinessRule(denial.to_string())
    }
}

/// All preconditions for creating a loan, in rejection-priority order.
pub fn check_borrow(user: &User, book: &Book, ctx: &BorrowContext) -> Result<(), BorrowDenial> {
    if !user.is_active() {
        return Err(BorrowDenial::AccountInactive);
    }
    if ctx.suspended {
        return Err(BorrowDenial::Suspended);
    }
    let limit = user.role.borrow_limit();
    if ctx.active_loans >= limit {
        return Err(BorrowDenial::LimitReached {
            current: ctx.active_loans,
            limit,
        });
    }
    if !book.is_available() {
        return Err(BorrowDenial::BookUnavailable);
    }
    if ctx.already_borrowing_book {
        return Err(BorrowDenial::AlreadyBorrowed);
    }
    Ok(())
}

/// Due date for a loan created at `now` by a user of the given role
pub fn due_date(now: DateTime<Utc>, user: &User) -> DateTime<Utc> {
    now + Duration::days(user.role.loan_duration_days())
}

/// A loan is overdue while active and past its due date
pub fn is_overdue(loan: &Loan, now: DateTime<Utc>) -> bool {
    loan.status == LoanStatus::Active && now > loan.due_at
}

/// Whole days of lateness; zero when not overdue
pub fn overdue_days(loan: &Loan, now: DateTime<Utc>) -> i64 {
    if !is_overdue(loan, now) {
        return 0;
    }
    (now - loan.due_at).num_days().max(0)
}

/// Fine owed for the given number of overdue days. Unbounded: there is no
/// cap on accrued fines.
pub fn fine_amount(days: i64, rules: &CirculationRules) -> Decimal {
    if days <= 0 {
        return Decimal::ZERO;
    }
    rules.fine_per_day * Decimal::from(days)
}

/// Outcome of assessing a return at `now`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnAssessment {
    pub overdue_days: i64,
    /// Fine to assess, present only when strictly positive
    pub fine: Option<Decimal>,
}

/// Validate a return and compute the fine, if any.
pub fn assess_return(
    loan: &Loan,
    now: DateTime<Utc>,
    rules: &CirculationRules,
) -> Result<ReturnAssessment, TransitionDenial> {
    if loan.status != LoanStatus::Active {
        return Err(TransitionDenial::NotActive);
    }
    let days = overdue_days(loan, now);
    let fine = fine_amount(days, rules);
    Ok(ReturnAssessment {
        overdue_days: days,
        fine: (fine > Decimal::ZERO).then_some(fine),
    })
}

/// Validate an extension and compute the new due date.
pub fn check_extend(
    loan: &Loan,
    now: DateTime<Utc>,
    days: i64,
    active_reservations: i64,
    rules: &CirculationRules,
) -> Result<DateTime<Utc>, ExtendDenial> {
    if loan.status != LoanStatus::Active {
        return Err(ExtendDenial::NotActive);
    }
    if days < 1 || days > rules.max_extension_days {
        return Err(ExtendDenial::InvalidDays {
            max: rules.max_extension_days,
        });
    }
    if is_overdue(loan, now) {
        return Err(ExtendDenial::Overdue);
    }
    if loan.extension_count >= rules.max_extensions {
        return Err(ExtendDenial::LimitReached(rules.max_extensions));
    }
    if active_reservations > 0 {
        return Err(ExtendDenial::Reserved);
    }
    Ok(loan.due_at + Duration::days(days))
}

/// Validate a mark-lost transition.
pub fn check_mark_lost(loan: &Loan) -> Result<(), TransitionDenial> {
    if loan.status != LoanStatus::Active {
        return Err(TransitionDenial::NotActive);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{BookStatus, Role, UserStatus};
    use chrono::TimeZone;

    fn user(role: Role, status: UserStatus) -> User {
        let now = Utc::now();
        User {
            id: 1,
            first_name: "Awa".into(),
            last_name: "Diop".into(),
            email: "awa@example.edu".into(),
            password: String::new(),
            role,
            status,
            student_number: None,
            phone: None,
            address: None,
            registered_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    fn book(available: i32, total: i32, status: BookStatus) -> Book {
        let now = Utc::now();
        Book {
            id: 7,
            title: "Systems Programming".into(),
            author: "K. Thompson".into(),
            isbn: None,
            publisher: None,
            publication_year: None,
            page_count: None,
            language: "en".into(),
            summary: None,
            category_id: 1,
            total_copies: total,
            available_copies: available,
            location: None,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn loan(status: LoanStatus, due_at: DateTime<Utc>, extensions: i32) -> Loan {
        let now = Utc::now();
        Loan {
            id: 3,
            user_id: 1,
            book_id: 7,
            borrowed_at: due_at - Duration::days(14),
            due_at,
            returned_at: None,
            status,
            extension_count: extensions,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn borrow_succeeds_for_eligible_user() {
        let u = user(Role::Borrower, UserStatus::Active);
        let b = book(1, 1, BookStatus::Available);
        assert!(check_borrow(&u, &b, &BorrowContext::default()).is_ok());
    }

    #[test]
    fn borrow_rejected_when_no_copies_left() {
        let u = user(Role::Borrower, UserStatus::Active);
        let b = book(0, 3, BookStatus::Available);
        assert_eq!(
            check_borrow(&u, &b, &BorrowContext::default()),
            Err(BorrowDenial::BookUnavailable)
        );
    }

    #[test]
    fn borrow_rejected_at_role_limit() {
        let u = user(Role::Borrower, UserStatus::Active);
        let b = book(1, 1, BookStatus::Available);
        let ctx = BorrowContext {
            active_loans: 5,
            ..Default::default()
        };
        assert_eq!(
            check_borrow(&u, &b, &ctx),
            Err(BorrowDenial::LimitReached {
                current: 5,
                limit: 5
            })
        );
    }

    #[test]
    fn borrow_rejected_for_suspended_user() {
        let u = user(Role::Borrower, UserStatus::Active);
        let b = book(1, 1, BookStatus::Available);
        let ctx = BorrowContext {
            suspended: true,
            ..Default::default()
        };
        assert_eq!(check_borrow(&u, &b, &ctx), Err(BorrowDenial::Suspended));
    }

    #[test]
    fn borrow_rejected_for_inactive_account() {
        let u = user(Role::Borrower, UserStatus::Inactive);
        let b = book(1, 1, BookStatus::Available);
        assert_eq!(
            check_borrow(&u, &b, &BorrowContext::default()),
            Err(BorrowDenial::AccountInactive)
        );
    }

    #[test]
    fn borrow_rejected_for_duplicate_book() {
        let u = user(Role::Borrower, UserStatus::Active);
        let b = book(2, 2, BookStatus::Available);
        let ctx = BorrowContext {
            already_borrowing_book: true,
            ..Default::default()
        };
        assert_eq!(
            check_borrow(&u, &b, &ctx),
            Err(BorrowDenial::AlreadyBorrowed)
        );
    }

    #[test]
    fn due_dates_follow_role_durations() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let borrower = user(Role::Borrower, UserStatus::Active);
        let librarian = user(Role::Librarian, UserStatus::Active);
        assert_eq!(due_date(now, &borrower), now + Duration::days(14));
        assert_eq!(due_date(now, &librarian), now + Duration::days(30));
    }

    #[test]
    fn five_days_late_costs_two_fifty() {
        let due = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let returned = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let l = loan(LoanStatus::Active, due, 0);
        let assessment = assess_return(&l, returned, &CirculationRules::default()).unwrap();
        assert_eq!(assessment.overdue_days, 5);
        assert_eq!(assessment.fine, Some(Decimal::new(250, 2)));
    }

    #[test]
    fn on_time_return_carries_no_fine() {
        let now = Utc::now();
        let l = loan(LoanStatus::Active, now + Duration::days(3), 0);
        let assessment = assess_return(&l, now, &CirculationRules::default()).unwrap();
        assert_eq!(assessment.overdue_days, 0);
        assert_eq!(assessment.fine, None);
    }

    #[test]
    fn returning_a_returned_loan_is_rejected() {
        let now = Utc::now();
        let l = loan(LoanStatus::Returned, now, 0);
        assert_eq!(
            assess_return(&l, now, &CirculationRules::default()),
            Err(TransitionDenial::NotActive)
        );
    }

    #[test]
    fn extension_moves_due_date_and_stops_at_two() {
        let now = Utc::now();
        let rules = CirculationRules::default();
        let l = loan(LoanStatus::Active, now + Duration::days(2), 1);
        let new_due = check_extend(&l, now, 7, 0, &rules).unwrap();
        assert_eq!(new_due, l.due_at + Duration::days(7));

        let maxed = loan(LoanStatus::Active, now + Duration::days(2), 2);
        assert_eq!(
            check_extend(&maxed, now, 7, 0, &rules),
            Err(ExtendDenial::LimitReached(2))
        );
    }

    #[test]
    fn extension_rejected_when_overdue_or_reserved() {
        let now = Utc::now();
        let rules = CirculationRules::default();
        let overdue = loan(LoanStatus::Active, now - Duration::days(1), 0);
        assert_eq!(
            check_extend(&overdue, now, 7, 0, &rules),
            Err(ExtendDenial::Overdue)
        );

        let reserved = loan(LoanStatus::Active, now + Duration::days(2), 0);
        assert_eq!(
            check_extend(&reserved, now, 7, 1, &rules),
            Err(ExtendDenial::Reserved)
        );
    }

    #[test]
    fn extension_days_are_bounded() {
        let now = Utc::now();
        let rules = CirculationRules::default();
        let l = loan(LoanStatus::Active, now + Duration::days(2), 0);
        assert!(check_extend(&l, now, 0, 0, &rules).is_err());
        assert!(check_extend(&l, now, 15, 0, &rules).is_err());
        assert!(check_extend(&l, now, 14, 0, &rules).is_ok());
    }

    #[test]
    fn mark_lost_requires_active_loan() {
        let now = Utc::now();
        assert!(check_mark_lost(&loan(LoanStatus::Active, now, 0)).is_ok());
        assert!(check_mark_lost(&loan(LoanStatus::Lost, now, 0)).is_err());
    }
}
