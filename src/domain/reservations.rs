//! Reservation queue rules: admission, FIFO positions, expiry.
//!
//! Active reservations for a book form a contiguous 1-based queue ordered by
//! reservation time. Any cancellation or expiry renumbers the survivors.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::error::AppError;
use crate::models::{enums::ReservationStatus, Book, Reservation};

use super::CirculationRules;

/// Counters queried alongside the requester inside the creation transaction
#[derive(Debug, Clone, Copy, Default)]
pub struct ReserveContext {
    /// Requester already has an active reservation for this book
    pub already_reserved: bool,
    /// Active reservations held by the requester across all books
    pub active_reservations: i64,
}

/// Why a reservation cannot be created
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReserveDenial {
    #[error("book is currently available and can be borrowed directly")]
    BookAvailable,
    #[error("user already has an active reservation for this book")]
    AlreadyReserved,
    #[error("reservation limit reached ({0})")]
    LimitReached(i64),
}

impl From<ReserveDenial> for AppError {
    fn from(denial: ReserveDenial) -> Self {
        AppError::BusinessRule(denial.to_string())
    }
}

/// Why a cancel/confirm/expire transition is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationTransitionDenial {
    #[error("reservation is not active")]
    NotActive,
}

impl From<ReservationTransitionDenial> for AppError {
    fn from(denial: ReservationTransitionDenial) -> Self {
        AppError::BusinessRule(denial.to_string())
    }
}

/// Preconditions for joining the queue.
pub fn check_reserve(
    book: &Book,
    ctx: &ReserveContext,
    rules: &CirculationRules,
) -> Result<(), ReserveDenial> {
    if book.is_available() {
        return Err(ReserveDenial::BookAvailable);
    }
    if ctx.already_reserved {
        return Err(ReserveDenial::AlreadyReserved);
    }
    if ctx.active_reservations >= rules.max_active_reservations {
        return Err(ReserveDenial::LimitReached(rules.max_active_reservations));
    }
    Ok(())
}

/// Position for a new reservation: one past the current active queue.
pub fn next_position(active_for_book: i64) -> i32 {
    (active_for_book + 1) as i32
}

/// Expiration timestamp for a fresh reservation.
pub fn initial_expiry(now: DateTime<Utc>, rules: &CirculationRules) -> DateTime<Utc> {
    now + Duration::days(rules.reservation_expiry_days)
}

/// Pickup deadline once a reservation is confirmed.
pub fn pickup_deadline(now: DateTime<Utc>, rules: &CirculationRules) -> DateTime<Utc> {
    now + Duration::days(rules.pickup_window_days)
}

/// An active reservation past its expiration date.
pub fn is_expired(reservation: &Reservation, now: DateTime<Utc>) -> bool {
    reservation.status == ReservationStatus::Active && now > reservation.expires_at
}

pub fn check_cancel(reservation: &Reservation) -> Result<(), ReservationTransitionDenial> {
    if reservation.status != ReservationStatus::Active {
        return Err(ReservationTransitionDenial::NotActive);
    }
    Ok(())
}

pub fn check_confirm(reservation: &Reservation) -> Result<(), ReservationTransitionDenial> {
    if reservation.status != ReservationStatus::Active {
        return Err(ReservationTransitionDenial::NotActive);
    }
    Ok(())
}

/// Contiguous 1..N positions for the surviving active reservations, ordered
/// by reservation time. Returns `(id, new_position)` pairs only for rows
/// whose position actually changes.
pub fn renumber(active: &[Reservation]) -> Vec<(i64, i32)> {
    let mut ordered: Vec<&Reservation> = active
        .iter()
        .filter(|r| r.status == ReservationStatus::Active)
        .collect();
    ordered.sort_by_key(|r| r.reserved_at);
    ordered
        .iter()
        .enumerate()
        .filter_map(|(index, r)| {
            let position = (index + 1) as i32;
            (r.queue_position != position).then_some((r.id, position))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::BookStatus;

    fn book(available: i32, status: BookStatus) -> Book {
        let now = Utc::now();
        Book {
            id: 7,
            title: "Distributed Systems".into(),
            author: "L. Lamport".into(),
            isbn: None,
            publisher: None,
            publication_year: None,
            page_count: None,
            language: "en".into(),
            summary: None,
            category_id: 1,
            total_copies: 2,
            available_copies: available,
            location: None,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn reservation(id: i64, position: i32, minutes_ago: i64, status: ReservationStatus) -> Reservation {
        let now = Utc::now();
        Reservation {
            id,
            user_id: id * 10,
            book_id: 7,
            reserved_at: now - Duration::minutes(minutes_ago),
            expires_at: now + Duration::days(7),
            status,
            queue_position: position,
            notified: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn available_book_cannot_be_reserved() {
        let rules = CirculationRules::default();
        assert_eq!(
            check_reserve(
                &book(1, BookStatus::Available),
                &ReserveContext::default(),
                &rules
            ),
            Err(ReserveDenial::BookAvailable)
        );
        assert!(check_reserve(
            &book(0, BookStatus::Available),
            &ReserveContext::default(),
            &rules
        )
        .is_ok());
    }

    #[test]
    fn duplicate_and_over_limit_reservations_rejected() {
        let rules = CirculationRules::default();
        let b = book(0, BookStatus::Loaned);
        let dup = ReserveContext {
            already_reserved: true,
            ..Default::default()
        };
        assert_eq!(
            check_reserve(&b, &dup, &rules),
            Err(ReserveDenial::AlreadyReserved)
        );
        let full = ReserveContext {
            active_reservations: 5,
            ..Default::default()
        };
        assert_eq!(
            check_reserve(&b, &full, &rules),
            Err(ReserveDenial::LimitReached(5))
        );
    }

    #[test]
    fn new_reservation_goes_to_back_of_queue() {
        assert_eq!(next_position(0), 1);
        assert_eq!(next_position(3), 4);
    }

    #[test]
    fn cancelling_middle_of_queue_shifts_followers_down() {
        // Positions 1,2,3 by age; the middle one was just cancelled.
        let rows = vec![
            reservation(1, 1, 300, ReservationStatus::Active),
            reservation(2, 2, 200, ReservationStatus::Cancelled),
            reservation(3, 3, 100, ReservationStatus::Active),
        ];
        let updates = renumber(&rows);
        assert_eq!(updates, vec![(3, 2)]);
    }

    #[test]
    fn renumber_orders_by_reservation_time() {
        let rows = vec![
            reservation(5, 9, 50, ReservationStatus::Active),
            reservation(4, 7, 500, ReservationStatus::Active),
        ];
        let updates = renumber(&rows);
        assert_eq!(updates, vec![(4, 1), (5, 2)]);
    }

    #[test]
    fn renumber_leaves_correct_queues_untouched() {
        let rows = vec![
            reservation(1, 1, 300, ReservationStatus::Active),
            reservation(2, 2, 200, ReservationStatus::Active),
        ];
        assert!(renumber(&rows).is_empty());
    }

    #[test]
    fn expiry_is_derived_from_dates() {
        let now = Utc::now();
        let mut r = reservation(1, 1, 10, ReservationStatus::Active);
        r.expires_at = now - Duration::hours(1);
        assert!(is_expired(&r, now));
        r.status = ReservationStatus::Confirmed;
        assert!(!is_expired(&r, now));
    }

    #[test]
    fn only_active_reservations_can_be_cancelled_or_confirmed() {
        let cancelled = reservation(1, 1, 10, ReservationStatus::Cancelled);
        assert!(check_cancel(&cancelled).is_err());
        assert!(check_confirm(&cancelled).is_err());
        let active = reservation(2, 1, 10, ReservationStatus::Active);
        assert!(check_cancel(&active).is_ok());
        assert!(check_confirm(&active).is_ok());
    }
}
