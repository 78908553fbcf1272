//! Repository layer for database operations

pub mod books;
pub mod loans;
pub mod notifications;
pub mod reservations;
pub mod sanctions;
pub mod users;

use sqlx::{Pool, Postgres};

use crate::domain::CirculationRules;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub books: books::BooksRepository,
    pub loans: loans::LoansRepository,
    pub reservations: reservations::ReservationsRepository,
    pub sanctions: sanctions::SanctionsRepository,
    pub notifications: notifications::NotificationsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>, rules: CirculationRules) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone(), rules.clone()),
            reservations: reservations::ReservationsRepository::new(pool.clone(), rules.clone()),
            sanctions: sanctions::SanctionsRepository::new(pool.clone(), rules),
            notifications: notifications::NotificationsRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Normalized LIMIT/OFFSET for paginated list queries
pub(crate) fn page_limits(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    let page = page.unwrap_or(1).max(1);
    (per_page, (page - 1) * per_page)
}
