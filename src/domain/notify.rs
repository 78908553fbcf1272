//! Notification intents: side effects of lifecycle transitions, expressed
//! as values and appended to the outbox by the repository layer within the
//! same transaction as the transition itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use crate::models::enums::{NotificationKind, Role, SanctionKind, UserStatus};

/// What to write into the outbox
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub payload: serde_json::Value,
}

/// One notification-worthy event, carrying the ids it references
#[derive(Debug, Clone)]
pub enum NotificationIntent {
    Welcome {
        role: Role,
    },
    LoanConfirmed {
        loan_id: i64,
        book_id: i64,
        book_title: String,
        due_at: DateTime<Utc>,
    },
    SanctionApplied {
        sanction_id: i64,
        kind: SanctionKind,
        reason: String,
        amount: Option<Decimal>,
        ends_at: Option<DateTime<Utc>>,
    },
    SanctionLifted {
        sanction_id: i64,
        kind: SanctionKind,
    },
    SanctionPaid {
        sanction_id: i64,
        amount: Decimal,
    },
    SanctionExtended {
        sanction_id: i64,
        kind: SanctionKind,
        days: i64,
        reason: Option<String>,
    },
    ReservationQueued {
        reservation_id: i64,
        book_id: i64,
        book_title: String,
        position: i32,
    },
    ReservationCancelled {
        reservation_id: i64,
        book_title: String,
    },
    /// Confirmed by a librarian; pickup window is running
    ReservationReady {
        reservation_id: i64,
        book_title: String,
        expires_at: DateTime<Utc>,
    },
    /// Queue advance: the subscriber is now first in line for a freed copy
    BookAvailable {
        book_id: i64,
        book_title: String,
    },
    RoleChanged {
        old_role: Role,
        new_role: Role,
    },
    AccountStatusChanged {
        status: UserStatus,
    },
}

impl NotificationIntent {
    /// Fixed message template plus a structured payload of referenced ids.
    pub fn render(&self) -> NotificationDraft {
        match self {
            NotificationIntent::Welcome { role } => NotificationDraft {
                title: "Welcome to the university library".to_string(),
                message: format!(
                    "Your account has been created with the role '{}'. \
                     You now have access to all library services.",
                    role
                ),
                kind: NotificationKind::Info,
                payload: json!({ "role": role }),
            },
            NotificationIntent::LoanConfirmed {
                loan_id,
                book_id,
                book_title,
                due_at,
            } => NotificationDraft {
                title: "Loan confirmed".to_string(),
                message: format!(
                    "You have borrowed \"{}\". Return it by {}.",
                    book_title,
                    due_at.format("%Y-%m-%d")
                ),
                kind: NotificationKind::Info,
                payload: json!({ "loan_id": loan_id, "book_id": book_id, "due_at": due_at }),
            },
            NotificationIntent::SanctionApplied {
                sanction_id,
                kind,
                reason,
                amount,
                ends_at,
            } => {
                let message = match kind {
                    SanctionKind::Fine => format!(
                        "A fine of {} has been applied to your account. Reason: {}",
                        amount.unwrap_or(Decimal::ZERO),
                        reason
                    ),
                    SanctionKind::Suspension => match ends_at {
                        Some(end) => format!(
                            "Your account is suspended until {}. Reason: {}",
                            end.format("%Y-%m-%d"),
                            reason
                        ),
                        None => format!(
                            "Your account is suspended until further notice. Reason: {}",
                            reason
                        ),
                    },
                    SanctionKind::Warning => {
                        format!("A warning has been issued on your account. Reason: {}", reason)
                    }
                };
                NotificationDraft {
                    title: "Sanction applied".to_string(),
                    message,
                    kind: NotificationKind::Sanction,
                    payload: json!({
                        "sanction_id": sanction_id,
                        "kind": kind,
                        "amount": amount,
                        "ends_at": ends_at,
                        "reason": reason,
                    }),
                }
            }
            NotificationIntent::SanctionLifted { sanction_id, kind } => NotificationDraft {
                title: "Sanction lifted".to_string(),
                message: format!("The {} on your account has been lifted.", kind),
                kind: NotificationKind::Success,
                payload: json!({ "sanction_id": sanction_id, "kind": kind }),
            },
            NotificationIntent::SanctionPaid {
                sanction_id,
                amount,
            } => NotificationDraft {
                title: "Payment confirmed".to_string(),
                message: format!("Your payment of {} has been recorded.", amount),
                kind: NotificationKind::Success,
                payload: json!({ "sanction_id": sanction_id, "amount": amount }),
            },
            NotificationIntent::SanctionExtended {
                sanction_id,
                kind,
                days,
                reason,
            } => NotificationDraft {
                title: "Sanction extended".to_string(),
                message: match reason {
                    Some(reason) => format!(
                        "The {} on your account has been extended by {} day(s). Reason: {}",
                        kind, days, reason
                    ),
                    None => format!(
                        "The {} on your account has been extended by {} day(s).",
                        kind, days
                    ),
                },
                kind: NotificationKind::Info,
                payload: json!({ "sanction_id": sanction_id, "kind": kind, "days": days }),
            },
            NotificationIntent::ReservationQueued {
                reservation_id,
                book_id,
                book_title,
                position,
            } => NotificationDraft {
                title: "Reservation registered".to_string(),
                message: format!(
                    "Your reservation for \"{}\" is registered. Queue position: {}.",
                    book_title, position
                ),
                kind: NotificationKind::Success,
                payload: json!({
                    "reservation_id": reservation_id,
                    "book_id": book_id,
                    "position": position,
                }),
            },
            NotificationIntent::ReservationCancelled {
                reservation_id,
                book_title,
            } => NotificationDraft {
                title: "Reservation cancelled".to_string(),
                message: format!("Your reservation for \"{}\" has been cancelled.", book_title),
                kind: NotificationKind::Info,
                payload: json!({ "reservation_id": reservation_id }),
            },
            NotificationIntent::ReservationReady {
                reservation_id,
                book_title,
                expires_at,
            } => NotificationDraft {
                title: "Reserved book ready for pickup".to_string(),
                message: format!(
                    "\"{}\" is ready for you at the front desk. Pick it up before {}.",
                    book_title,
                    expires_at.format("%Y-%m-%d")
                ),
                kind: NotificationKind::Alert,
                payload: json!({ "reservation_id": reservation_id, "expires_at": expires_at }),
            },
            NotificationIntent::BookAvailable {
                book_id,
                book_title,
            } => NotificationDraft {
                title: "Reserved book available".to_string(),
                message: format!(
                    "\"{}\" has been returned and you are first in the queue. \
                     A librarian will confirm your reservation shortly.",
                    book_title
                ),
                kind: NotificationKind::Info,
                payload: json!({ "book_id": book_id }),
            },
            NotificationIntent::RoleChanged { old_role, new_role } => NotificationDraft {
                title: "Account role changed".to_string(),
                message: format!("Your role has been changed from {} to {}.", old_role, new_role),
                kind: NotificationKind::Info,
                payload: json!({ "old_role": old_role, "new_role": new_role }),
            },
            NotificationIntent::AccountStatusChanged { status } => NotificationDraft {
                title: "Account status changed".to_string(),
                message: match status {
                    UserStatus::Active => {
                        "Your account has been reactivated. All library services are available again."
                            .to_string()
                    }
                    _ => "Your account has been deactivated. Contact the administration for details."
                        .to_string(),
                },
                kind: match status {
                    UserStatus::Active => NotificationKind::Info,
                    _ => NotificationKind::Alert,
                },
                payload: json!({ "status": status }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loan_confirmation_references_loan_and_book() {
        let intent = NotificationIntent::LoanConfirmed {
            loan_id: 42,
            book_id: 7,
            book_title: "The Mythical Man-Month".into(),
            due_at: Utc::now(),
        };
        let draft = intent.render();
        assert_eq!(draft.kind, NotificationKind::Info);
        assert_eq!(draft.payload["loan_id"], 42);
        assert_eq!(draft.payload["book_id"], 7);
        assert!(draft.message.contains("The Mythical Man-Month"));
    }

    #[test]
    fn sanction_notifications_use_the_sanction_kind() {
        let intent = NotificationIntent::SanctionApplied {
            sanction_id: 9,
            kind: SanctionKind::Fine,
            reason: "5 day(s) late".into(),
            amount: Some(Decimal::new(250, 2)),
            ends_at: None,
        };
        let draft = intent.render();
        assert_eq!(draft.kind, NotificationKind::Sanction);
        assert!(draft.message.contains("2.50"));
        assert_eq!(draft.payload["sanction_id"], 9);
    }

    #[test]
    fn queue_advance_does_not_promise_confirmation() {
        let intent = NotificationIntent::BookAvailable {
            book_id: 7,
            book_title: "SICP".into(),
        };
        let draft = intent.render();
        assert!(draft.message.contains("first in the queue"));
        assert!(draft.message.contains("librarian"));
    }
}
