//! Loans repository for database operations
//!
//! Every state transition runs in a single transaction: loan row, book
//! counters, assessed sanctions and outbox notifications commit together.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use crate::{
    domain::{self, notify::NotificationIntent, CirculationRules},
    error::{AppError, AppResult},
    models::{
        enums::{LoanStatus, SanctionKind},
        loan::{LoanQuery, LoanStats},
        Book, Loan, LoanDetails, Sanction, User, UserShort,
    },
    repository::{notifications::NotificationsRepository, page_limits},
};

const DETAILS_SELECT: &str = r#"
    SELECT l.*,
           u.first_name AS u_first_name, u.last_name AS u_last_name,
           u.email AS u_email, u.role AS u_role, u.status AS u_status,
           b.title AS b_title, b.author AS b_author, b.isbn AS b_isbn,
           b.publisher AS b_publisher, b.publication_year AS b_publication_year,
           b.page_count AS b_page_count, b.language AS b_language,
           b.summary AS b_summary, b.category_id AS b_category_id,
           b.total_copies AS b_total_copies, b.available_copies AS b_available_copies,
           b.location AS b_location, b.status AS b_status,
           b.created_at AS b_created_at, b.updated_at AS b_updated_at,
           (SELECT COUNT(*) FROM reservations r
            WHERE r.book_id = l.book_id AND r.status = 'active') AS active_reservations
    FROM loans l
    JOIN users u ON l.user_id = u.id
    JOIN books b ON l.book_id = b.id
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
    rules: CirculationRules,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>, rules: CirculationRules) -> Self {
        Self { pool, rules }
    }

    fn details_from_row(&self, row: &PgRow, now: DateTime<Utc>) -> LoanDetails {
        let loan = Loan {
            id: row.get("id"),
            user_id: row.get("user_id"),
            book_id: row.get("book_id"),
            borrowed_at: row.get("borrowed_at"),
            due_at: row.get("due_at"),
            returned_at: row.get("returned_at"),
            status: row.get("status"),
            extension_count: row.get("extension_count"),
            notes: row.get("notes"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        };
        let user = UserShort {
            id: loan.user_id,
            first_name: row.get("u_first_name"),
            last_name: row.get("u_last_name"),
            email: row.get("u_email"),
            role: row.get("u_role"),
            status: row.get("u_status"),
        };
        let book = Book {
            id: loan.book_id,
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
        let active_reservations: i64 = row.get("active_reservations");

        let overdue_days = domain::loans::overdue_days(&loan, now);
        let can_extend = domain::loans::check_extend(
            &loan,
            now,
            self.rules.default_extension_days,
            active_reservations,
            &self.rules,
        )
        .is_ok();
        LoanDetails {
            is_overdue: domain::loans::is_overdue(&loan, now),
            overdue_days,
            accrued_fine: domain::loans::fine_amount(overdue_days, &self.rules),
            can_extend,
            loan,
            user: Some(user),
            book: Some(book),
        }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Get a loan with borrower and book details
    pub async fn get_details(&self, id: i64) -> AppResult<LoanDetails> {
        let row = sqlx::query(&format!("{} WHERE l.id = $1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;
        Ok(self.details_from_row(&row, Utc::now()))
    }

    /// List current loans; defaults to active ones
    pub async fn list(&self, query: &LoanQuery) -> AppResult<Vec<LoanDetails>> {
        let (limit, offset) = page_limits(query.page, query.per_page);
        let status = query.status.unwrap_or(LoanStatus::Active);
        let now = Utc::now();
        let rows = sqlx::query(&format!(
            r#"{}
            WHERE l.status = $1
              AND ($2::bigint IS NULL OR l.user_id = $2)
              AND ($3::bigint IS NULL OR l.book_id = $3)
              AND (NOT $4 OR (l.status = 'active' AND l.due_at < NOW()))
            ORDER BY l.due_at
            LIMIT $5 OFFSET $6
            "#,
            DETAILS_SELECT
        ))
        .bind(status.as_str())
        .bind(query.user_id)
        .bind(query.book_id)
        .bind(query.overdue.unwrap_or(false))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|r| self.details_from_row(r, now)).collect())
    }

    /// List finished loans (returned or lost)
    pub async fn history(&self, query: &LoanQuery) -> AppResult<Vec<LoanDetails>> {
        let (limit, offset) = page_limits(query.page, query.per_page);
        let now = Utc::now();
        let rows = sqlx::query(&format!(
            r#"{}
            WHERE l.status IN ('returned', 'lost')
              AND ($1::bigint IS NULL OR l.user_id = $1)
              AND ($2::bigint IS NULL OR l.book_id = $2)
            ORDER BY l.updated_at DESC
            LIMIT $3 OFFSET $4
            "#,
            DETAILS_SELECT
        ))
        .bind(query.user_id)
        .bind(query.book_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|r| self.details_from_row(r, now)).collect())
    }

    /// Create a loan for `user`, decrementing the shelf counter.
    ///
    /// The decrement is guarded (`available_copies > 0`) so two simultaneous
    /// borrows of the last copy cannot both succeed.
    pub async fn create(&self, user: &User, book_id: i64) -> AppResult<Loan> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        let active_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE user_id = $1 AND status = 'active'",
        )
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await?;

        let already_borrowing_book: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE user_id = $1 AND book_id = $2 AND status = 'active')",
        )
        .bind(user.id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        let suspended: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM sanctions
                WHERE user_id = $1 AND kind = 'suspension' AND status = 'active'
                  AND (ends_at IS NULL OR ends_at > $2)
            )
            "#,
        )
        .bind(user.id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let ctx = domain::loans::BorrowContext {
            active_loans,
            already_borrowing_book,
            suspended,
        };
        domain::loans::check_borrow(user, &book, &ctx)?;

        let updated = sqlx::query(
            r#"
            UPDATE books SET available_copies = available_copies - 1, updated_at = NOW()
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            // Lost the race for the last copy
            return Err(domain::loans::BorrowDenial::BookUnavailable.into());
        }

        let due_at = domain::loans::due_date(now, user);
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, book_id, borrowed_at, due_at, status, extension_count)
            VALUES ($1, $2, $3, $4, 'active', 0)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(book_id)
        .bind(now)
        .bind(due_at)
        .fetch_one(&mut *tx)
        .await?;

        NotificationsRepository::append(
            &mut *tx,
            user.id,
            &NotificationIntent::LoanConfirmed {
                loan_id: loan.id,
                book_id,
                book_title: book.title.clone(),
                due_at,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(loan)
    }

    /// Extend an active loan's due date
    pub async fn extend(&self, loan_id: i64, days: i64) -> AppResult<Loan> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        let active_reservations: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE book_id = $1 AND status = 'active'",
        )
        .bind(loan.book_id)
        .fetch_one(&mut *tx)
        .await?;

        let new_due = domain::loans::check_extend(&loan, now, days, active_reservations, &self.rules)?;

        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET due_at = $2, extension_count = extension_count + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(new_due)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Return an active loan: free the copy, assess any overdue fine and
    /// notify the first reservation in the queue that a copy is available.
    pub async fn return_loan(
        &self,
        loan_id: i64,
        processed_by: i64,
    ) -> AppResult<(Loan, Option<Sanction>)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        let assessment = domain::loans::assess_return(&loan, now, &self.rules)?;

        let returned = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET status = 'returned', returned_at = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let book_title: String = sqlx::query_scalar(
            r#"
            UPDATE books
            SET available_copies = LEAST(available_copies + 1, total_copies), updated_at = NOW()
            WHERE id = $1
            RETURNING title
            "#,
        )
        .bind(loan.book_id)
        .fetch_one(&mut *tx)
        .await?;

        let fine = match assessment.fine {
            Some(amount) => {
                let sanction = sqlx::query_as::<_, Sanction>(
                    r#"
                    INSERT INTO sanctions (user_id, loan_id, kind, amount, starts_at, reason,
                                           status, issued_by)
                    VALUES ($1, $2, 'fine', $3, $4, $5, 'active', $6)
                    RETURNING *
                    "#,
                )
                .bind(loan.user_id)
                .bind(loan_id)
                .bind(amount)
                .bind(now)
                .bind(format!(
                    "Returned \"{}\" {} day(s) late",
                    book_title, assessment.overdue_days
                ))
                .bind(processed_by)
                .fetch_one(&mut *tx)
                .await?;

                NotificationsRepository::append(
                    &mut *tx,
                    loan.user_id,
                    &NotificationIntent::SanctionApplied {
                        sanction_id: sanction.id,
                        kind: SanctionKind::Fine,
                        reason: sanction.reason.clone(),
                        amount: Some(amount),
                        ends_at: None,
                    },
                )
                .await?;
                Some(sanction)
            }
            None => None,
        };

        // Advance the queue: the earliest still-waiting reservation learns a
        // copy is back. Confirmation stays a librarian decision.
        let head: Option<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT id, user_id FROM reservations
            WHERE book_id = $1 AND status = 'active' AND notified = FALSE
            ORDER BY queue_position
            LIMIT 1
            "#,
        )
        .bind(loan.book_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some((reservation_id, reserved_by)) = head {
            sqlx::query("UPDATE reservations SET notified = TRUE, updated_at = NOW() WHERE id = $1")
                .bind(reservation_id)
                .execute(&mut *tx)
                .await?;
            NotificationsRepository::append(
                &mut *tx,
                reserved_by,
                &NotificationIntent::BookAvailable {
                    book_id: loan.book_id,
                    book_title,
                },
            )
            .await?;
        }

        tx.commit().await?;
        Ok((returned, fine))
    }

    /// Mark an active loan's copy as lost: the loan closes and the borrower
    /// is charged the flat replacement fee. The shelf counters are left
    /// alone, so the shortage stays visible (`available < total`) until
    /// staff corrects the inventory.
    pub async fn mark_lost(
        &self,
        loan_id: i64,
        processed_by: i64,
        notes: Option<&str>,
    ) -> AppResult<(Loan, Sanction)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        domain::loans::check_mark_lost(&loan)?;

        let lost = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = 'lost', returned_at = $2, notes = COALESCE($3, notes), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(now)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        let book_title: String = sqlx::query_scalar("SELECT title FROM books WHERE id = $1")
            .bind(loan.book_id)
            .fetch_one(&mut *tx)
            .await?;

        let fee = self.rules.lost_book_fee;
        let sanction = sqlx::query_as::<_, Sanction>(
            r#"
            INSERT INTO sanctions (user_id, loan_id, kind, amount, starts_at, reason,
                                   status, issued_by)
            VALUES ($1, $2, 'fine', $3, $4, $5, 'active', $6)
            RETURNING *
            "#,
        )
        .bind(loan.user_id)
        .bind(loan_id)
        .bind(fee)
        .bind(now)
        .bind(format!("Lost copy of \"{}\"", book_title))
        .bind(processed_by)
        .fetch_one(&mut *tx)
        .await?;

        NotificationsRepository::append(
            &mut *tx,
            loan.user_id,
            &NotificationIntent::SanctionApplied {
                sanction_id: sanction.id,
                kind: SanctionKind::Fine,
                reason: sanction.reason.clone(),
                amount: Some(fee),
                ends_at: None,
            },
        )
        .await?;

        tx.commit().await?;
        Ok((lost, sanction))
    }

    pub async fn stats(&self) -> AppResult<LoanStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) FILTER (WHERE status = 'active') AS active,
                   COUNT(*) FILTER (WHERE status = 'active' AND due_at < NOW()) AS overdue,
                   COUNT(*) FILTER (WHERE status = 'returned') AS returned,
                   COUNT(*) FILTER (WHERE status = 'lost') AS lost
            FROM loans
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let outstanding_fines: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM sanctions WHERE kind = 'fine' AND status = 'active'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(LoanStats {
            active: row.get("active"),
            overdue: row.get("overdue"),
            returned: row.get("returned"),
            lost: row.get("lost"),
            outstanding_fines,
        })
    }
}
