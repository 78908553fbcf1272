//! Capability table keyed by (role, action).
//!
//! Evaluated once at the API boundary instead of ad-hoc role checks inside
//! every business method. Ownership of individual records is a separate
//! concern handled by [`crate::models::Actor`].

use crate::models::Role;

/// Privileged actions gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create and edit catalog entries
    ManageBooks,
    /// Remove catalog entries
    DeleteBooks,
    /// Return or mark-lost loans, and act on behalf of other borrowers
    ManageLoans,
    /// Process a return for another borrower's loan
    ForceReturn,
    /// Confirm reservations
    ManageReservations,
    /// Issue, edit, lift or extend sanctions
    ManageSanctions,
    /// List and inspect other users' accounts
    ManageUsers,
    /// Create, delete and change role/status of accounts
    AdministerUsers,
    /// See loans/reservations/sanctions belonging to any user
    ViewAllRecords,
    /// Run the expiry sweeps
    RunSweeps,
}

impl Action {
    pub fn describe(&self) -> &'static str {
        match self {
            Action::ManageBooks => "manage the catalog",
            Action::DeleteBooks => "delete catalog entries",
            Action::ManageLoans => "manage loans",
            Action::ForceReturn => "process returns for other borrowers",
            Action::ManageReservations => "manage reservations",
            Action::ManageSanctions => "manage sanctions",
            Action::ManageUsers => "manage users",
            Action::AdministerUsers => "administer accounts",
            Action::ViewAllRecords => "view other users' records",
            Action::RunSweeps => "run expiry sweeps",
        }
    }
}

/// The single source of truth for role permissions.
pub fn allows(role: Role, action: Action) -> bool {
    match (role, action) {
        (Role::Administrator, _) => true,

        (Role::Librarian, Action::ManageBooks) => true,
        (Role::Librarian, Action::ManageLoans) => true,
        (Role::Librarian, Action::ForceReturn) => true,
        (Role::Librarian, Action::ManageReservations) => true,
        (Role::Librarian, Action::ManageSanctions) => true,
        (Role::Librarian, Action::ManageUsers) => true,
        (Role::Librarian, Action::ViewAllRecords) => true,
        (Role::Librarian, Action::RunSweeps) => true,
        (Role::Librarian, Action::DeleteBooks) => false,
        (Role::Librarian, Action::AdministerUsers) => false,

        (Role::Borrower, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrators_can_do_everything() {
        for action in [
            Action::ManageBooks,
            Action::DeleteBooks,
            Action::ManageLoans,
            Action::ForceReturn,
            Action::ManageReservations,
            Action::ManageSanctions,
            Action::ManageUsers,
            Action::AdministerUsers,
            Action::ViewAllRecords,
            Action::RunSweeps,
        ] {
            assert!(allows(Role::Administrator, action));
        }
    }

    #[test]
    fn librarians_manage_circulation_but_not_accounts() {
        assert!(allows(Role::Librarian, Action::ManageLoans));
        assert!(allows(Role::Librarian, Action::ManageSanctions));
        assert!(allows(Role::Librarian, Action::RunSweeps));
        assert!(!allows(Role::Librarian, Action::AdministerUsers));
        assert!(!allows(Role::Librarian, Action::DeleteBooks));
    }

    #[test]
    fn borrowers_have_no_privileged_actions() {
        assert!(!allows(Role::Borrower, Action::ManageLoans));
        assert!(!allows(Role::Borrower, Action::ViewAllRecords));
        assert!(!allows(Role::Borrower, Action::RunSweeps));
    }
}
