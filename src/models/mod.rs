//! Data models for Athenaeum

pub mod book;
pub mod enums;
pub mod loan;
pub mod notification;
pub mod reservation;
pub mod sanction;
pub mod user;

// Re-export commonly used types
pub use book::{Book, Category};
pub use enums::{
    BookStatus, LoanStatus, NotificationKind, ReservationStatus, Role, SanctionKind,
    SanctionStatus, UserStatus,
};
pub use loan::{Loan, LoanDetails};
pub use notification::Notification;
pub use reservation::{Reservation, ReservationDetails};
pub use sanction::{Sanction, SanctionDetails};
pub use user::{Actor, User, UserShort};
