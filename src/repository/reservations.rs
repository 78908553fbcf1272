//! Reservations repository for database operations
//!
//! Queue positions are renumbered inside the same transaction as any
//! transition that removes a reservation from the active queue.

use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use crate::{
    domain::{self, notify::NotificationIntent, CirculationRules},
    error::{AppError, AppResult},
    models::{
        reservation::{ExpirySweepReport, ReservationQuery, ReservationStats},
        Book, Reservation, ReservationDetails, UserShort,
    },
    repository::{notifications::NotificationsRepository, page_limits},
};

const DETAILS_SELECT: &str = r#"
    SELECT r.*,
           u.first_name AS u_first_name, u.last_name AS u_last_name,
           u.email AS u_email, u.role AS u_role, u.status AS u_status,
           b.title AS b_title, b.author AS b_author, b.isbn AS b_isbn,
           b.publisher AS b_publisher, b.publication_year AS b_publication_year,
           b.page_count AS b_page_count, b.language AS b_language,
           b.summary AS b_summary, b.category_id AS b_category_id,
           b.total_copies AS b_total_copies, b.available_copies AS b_available_copies,
           b.location AS b_location, b.status AS b_status,
           b.created_at AS b_created_at, b.updated_at AS b_updated_at
    FROM reservations r
    JOIN users u ON r.user_id = u.id
    JOIN books b ON r.book_id = b.id
"#;

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
    rules: CirculationRules,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>, rules: CirculationRules) -> Self {
        Self { pool, rules }
    }

    fn details_from_row(row: &PgRow) -> ReservationDetails {
        let reservation = Reservation {
            id: row.get("id"),
            user_id: row.get("user_id"),
            book_id: row.get("book_id"),
            reserved_at: row.get("reserved_at"),
            expires_at: row.get("expires_at"),
            status: row.get("status"),
            queue_position: row.get("queue_position"),
            notified: row.get("notified"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        };
        let user = UserShort {
            id: reservation.user_id,
            first_name: row.get("u_first_name"),
            last_name: row.get("u_last_name"),
            email: row.get("u_email"),
            role: row.get("u_role"),
            status: row.get("u_status"),
        };
        let book = Book {
            id: reservation.book_id,
            title: row.get("b_title"),
            author: row.get("b_author"),
            isbn: row.get("b_isbn"),
            publisher: row.get("b_publisher"),
            publication_year: row.get("b_publication_year"),
            page_count: row.get("b_page_count"),
            language: row.get("b_language"),
            summary: row.get("b_summary"),
            category_id: row.get("b_category_id"),
            total_copies: row.get("b_total_copies"),
            available_copies: row.get("b_available_copies"),
            location: row.get("b_location"),
            status: row.get("b_status"),
            created_at: row.get("b_created_at"),
            updated_at: row.get("b_updated_at"),
        };
        ReservationDetails {
            reservation,
            user: Some(user),
            book: Some(book),
        }
    }

    /// Get reservation by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))
    }

    /// Get a reservation with user and book details
    pub async fn get_details(&self, id: i64) -> AppResult<ReservationDetails> {
        let row = sqlx::query(&format!("{} WHERE r.id = $1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))?;
        Ok(Self::details_from_row(&row))
    }

    /// List reservations with optional filters
    pub async fn list(&self, query: &ReservationQuery) -> AppResult<Vec<ReservationDetails>> {
        let (limit, offset) = page_limits(query.page, query.per_page);
        let rows = sqlx::query(&format!(
            r#"{}
            WHERE ($1::bigint IS NULL OR r.user_id = $1)
              AND ($2::bigint IS NULL OR r.book_id = $2)
              AND ($3::text IS NULL OR r.status = $3)
            ORDER BY r.book_id, r.queue_position
            LIMIT $4 OFFSET $5
            "#,
            DETAILS_SELECT
        ))
        .bind(query.user_id)
        .bind(query.book_id)
        .bind(query.status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(Self::details_from_row).collect())
    }

    /// Join the queue for an unavailable book
    pub async fn create(&self, user_id: i64, book_id: i64) -> AppResult<Reservation> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        let already_reserved: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reservations WHERE user_id = $1 AND book_id = $2 AND status = 'active')",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        let active_reservations: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE user_id = $1 AND status = 'active'",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let ctx = domain::reservations::ReserveContext {
            already_reserved,
            active_reservations,
        };
        domain::reservations::check_reserve(&book, &ctx, &self.rules)?;

        // Book row is locked, so the queue length cannot shift under us
        let queue_length: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE book_id = $1 AND status = 'active'",
        )
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        let position = domain::reservations::next_position(queue_length);
        let expires_at = domain::reservations::initial_expiry(now, &self.rules);

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (user_id, book_id, reserved_at, expires_at, status,
                                      queue_position, notified)
            VALUES ($1, $2, $3, $4, 'active', $5, FALSE)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .bind(expires_at)
        .bind(position)
        .fetch_one(&mut *tx)
        .await?;

        NotificationsRepository::append(
            &mut *tx,
            user_id,
            &NotificationIntent::ReservationQueued {
                reservation_id: reservation.id,
                book_id,
                book_title: book.title.clone(),
                position,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(reservation)
    }

    /// Cancel an active reservation and close the gap in the queue
    pub async fn cancel(&self, id: i64) -> AppResult<Reservation> {
        let mut tx = self.pool.begin().await?;

        let found = sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))?;

        // Book row first, reservation row second: every queue transition
        // takes locks in this order so renumbering cannot deadlock.
        let book_title: String =
            sqlx::query_scalar("SELECT title FROM books WHERE id = $1 FOR UPDATE")
                .bind(found.book_id)
                .fetch_one(&mut *tx)
                .await?;

        let reservation =
            sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        domain::reservations::check_cancel(&reservation)?;

        let cancelled = sqlx::query_as::<_, Reservation>(
            "UPDATE reservations SET status = 'cancelled', updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        Self::renumber_queue(&mut tx, reservation.book_id).await?;

        NotificationsRepository::append(
            &mut *tx,
            reservation.user_id,
            &NotificationIntent::ReservationCancelled {
                reservation_id: id,
                book_title,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(cancelled)
    }

    /// Confirm an active reservation: the book is set aside and the pickup
    /// window starts running.
    pub async fn confirm(&self, id: i64) -> AppResult<Reservation> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let found = sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))?;

        let book_title: String =
            sqlx::query_scalar("SELECT title FROM books WHERE id = $1 FOR UPDATE")
                .bind(found.book_id)
                .fetch_one(&mut *tx)
                .await?;

        let reservation =
            sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        domain::reservations::check_confirm(&reservation)?;

        let deadline = domain::reservations::pickup_deadline(now, &self.rules);
        let confirmed = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET status = 'confirmed', expires_at = $2, notified = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(deadline)
        .fetch_one(&mut *tx)
        .await?;

        Self::renumber_queue(&mut tx, reservation.book_id).await?;

        NotificationsRepository::append(
            &mut *tx,
            reservation.user_id,
            &NotificationIntent::ReservationReady {
                reservation_id: id,
                book_title,
                expires_at: deadline,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(confirmed)
    }

    /// Expire overdue reservations (active past their window, confirmed past
    /// their pickup deadline), renumber the affected queues, and tell the new
    /// queue heads when a copy is waiting.
    pub async fn sweep_expired(&self) -> AppResult<ExpirySweepReport> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Same lock order as the single-reservation transitions: book rows
        // before reservation rows, in id order.
        sqlx::query(
            r#"
            SELECT id FROM books
            WHERE id IN (SELECT book_id FROM reservations
                         WHERE status IN ('active', 'confirmed') AND expires_at < $1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let expired: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            UPDATE reservations
            SET status = 'expired', updated_at = NOW()
            WHERE status IN ('active', 'confirmed') AND expires_at < $1
            RETURNING id, book_id
            "#,
        )
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        let mut books: Vec<i64> = expired.iter().map(|(_, book_id)| *book_id).collect();
        books.sort_unstable();
        books.dedup();

        let mut notified_count = 0u64;
        for book_id in books {
            Self::renumber_queue(&mut tx, book_id).await?;

            // With a copy on the shelf, the new head of the queue is next
            let available: i64 = sqlx::query_scalar(
                "SELECT available_copies FROM books WHERE id = $1",
            )
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;
            if available == 0 {
                continue;
            }

            let head: Option<(i64, i64)> = sqlx::query_as(
                r#"
                SELECT id, user_id FROM reservations
                WHERE book_id = $1 AND status = 'active' AND notified = FALSE
                ORDER BY queue_position
                LIMIT 1
                "#,
            )
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some((reservation_id, user_id)) = head {
                sqlx::query(
                    "UPDATE reservations SET notified = TRUE, updated_at = NOW() WHERE id = $1",
                )
                .bind(reservation_id)
                .execute(&mut *tx)
                .await?;

                let book_title: String =
                    sqlx::query_scalar("SELECT title FROM books WHERE id = $1")
                        .bind(book_id)
                        .fetch_one(&mut *tx)
                        .await?;
                NotificationsRepository::append(
                    &mut *tx,
                    user_id,
                    &NotificationIntent::BookAvailable {
                        book_id,
                        book_title,
                    },
                )
                .await?;
                notified_count += 1;
            }
        }

        tx.commit().await?;
        Ok(ExpirySweepReport {
            expired_count: expired.len() as u64,
            notified_count,
        })
    }

    /// Rewrite positions 1..N for a book's surviving active queue.
    ///
    /// Callers must already hold the book row lock.
    async fn renumber_queue(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        book_id: i64,
    ) -> AppResult<()> {
        let active = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE book_id = $1 AND status = 'active' FOR UPDATE",
        )
        .bind(book_id)
        .fetch_all(&mut **tx)
        .await?;

        for (id, position) in domain::reservations::renumber(&active) {
            sqlx::query(
                "UPDATE reservations SET queue_position = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(id)
            .bind(position)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    pub async fn stats(&self) -> AppResult<ReservationStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'active') AS active,
                   COUNT(*) FILTER (WHERE status = 'confirmed') AS confirmed,
                   COUNT(*) FILTER (WHERE status = 'expired') AS expired,
                   COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled
            FROM reservations
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(ReservationStats {
            total: row.get("total"),
            active: row.get("active"),
            confirmed: row.get("confirmed"),
            expired: row.get("expired"),
            cancelled: row.get("cancelled"),
        })
    }
}
