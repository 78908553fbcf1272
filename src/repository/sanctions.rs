//! Sanctions repository for database operations

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use crate::{
    domain::{self, notify::NotificationIntent, CirculationRules},
    error::{AppError, AppResult},
    models::{
        enums::{SanctionKind, SanctionStatus},
        sanction::{CreateSanction, SanctionQuery, SanctionStats, UpdateSanction},
        Sanction, SanctionDetails, UserShort,
    },
    repository::{notifications::NotificationsRepository, page_limits},
};

const DETAILS_SELECT: &str = r#"
    SELECT s.*,
           u.first_name AS u_first_name, u.last_name AS u_last_name,
           u.email AS u_email, u.role AS u_role, u.status AS u_status
    FROM sanctions s
    JOIN users u ON s.user_id = u.id
"#;

#[derive(Clone)]
pub struct SanctionsRepository {
    pool: Pool<Postgres>,
    rules: CirculationRules,
}

impl SanctionsRepository {
    pub fn new(pool: Pool<Postgres>, rules: CirculationRules) -> Self {
        Self { pool, rules }
    }

    fn details_from_row(row: &PgRow) -> SanctionDetails {
        let sanction = Sanction {
            id: row.get("id"),
            user_id: row.get("user_id"),
            loan_id: row.get("loan_id"),
            kind: row.get("kind"),
            amount: row.get("amount"),
            starts_at: row.get("starts_at"),
            ends_at: row.get("ends_at"),
            reason: row.get("reason"),
            status: row.get("status"),
            issued_by: row.get("issued_by"),
            notes: row.get("notes"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        };
        let user = UserShort {
            id: sanction.user_id,
            first_name: row.get("u_first_name"),
            last_name: row.get("u_last_name"),
            email: row.get("u_email"),
            role: row.get("u_role"),
            status: row.get("u_status"),
        };
        SanctionDetails {
            sanction,
            user: Some(user),
        }
    }

    /// Get sanction by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Sanction> {
        sqlx::query_as::<_, Sanction>("SELECT * FROM sanctions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Sanction with id {} not found", id)))
    }

    /// Get a sanction with user details
    pub async fn get_details(&self, id: i64) -> AppResult<SanctionDetails> {
        let row = sqlx::query(&format!("{} WHERE s.id = $1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Sanction with id {} not found", id)))?;
        Ok(Self::details_from_row(&row))
    }

    /// List sanctions with optional filters
    pub async fn list(&self, query: &SanctionQuery) -> AppResult<Vec<SanctionDetails>> {
        let (limit, offset) = page_limits(query.page, query.per_page);
        let rows = sqlx::query(&format!(
            r#"{}
            WHERE ($1::bigint IS NULL OR s.user_id = $1)
              AND ($2::text IS NULL OR s.kind = $2)
              AND ($3::text IS NULL OR s.status = $3)
            ORDER BY s.starts_at DESC
            LIMIT $4 OFFSET $5
            "#,
            DETAILS_SELECT
        ))
        .bind(query.user_id)
        .bind(query.kind.map(|k| k.as_str()))
        .bind(query.status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(Self::details_from_row).collect())
    }

    /// Issue a sanction and notify the account holder
    pub async fn create(&self, request: &CreateSanction, issued_by: i64) -> AppResult<Sanction> {
        if request.kind == SanctionKind::Fine && request.amount.is_none() {
            return Err(AppError::BadRequest(
                "A fine requires an amount".to_string(),
            ));
        }

        let now = Utc::now();
        let starts_at = request.starts_at.unwrap_or(now);
        let ends_at = match request.kind {
            SanctionKind::Suspension => Some(domain::sanctions::suspension_end(
                starts_at,
                request.duration_days,
                &self.rules,
            )),
            _ => request
                .duration_days
                .map(|days| starts_at + chrono::Duration::days(days)),
        };

        let mut tx = self.pool.begin().await?;

        let user_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(request.user_id)
                .fetch_one(&mut *tx)
                .await?;
        if !user_exists {
            return Err(AppError::NotFound(format!(
                "User with id {} not found",
                request.user_id
            )));
        }

        let sanction = sqlx::query_as::<_, Sanction>(
            r#"
            INSERT INTO sanctions (user_id, loan_id, kind, amount, starts_at, ends_at,
                                   reason, status, issued_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'active', $8)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.loan_id)
        .bind(request.kind)
        .bind(request.amount)
        .bind(starts_at)
        .bind(ends_at)
        .bind(&request.reason)
        .bind(issued_by)
        .fetch_one(&mut *tx)
        .await?;

        NotificationsRepository::append(
            &mut *tx,
            sanction.user_id,
            &NotificationIntent::SanctionApplied {
                sanction_id: sanction.id,
                kind: sanction.kind,
                reason: sanction.reason.clone(),
                amount: sanction.amount,
                ends_at: sanction.ends_at,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(sanction)
    }

    /// Edit an active sanction's reason, amount or duration
    pub async fn update(&self, id: i64, update: &UpdateSanction) -> AppResult<Sanction> {
        let mut tx = self.pool.begin().await?;

        let sanction =
            sqlx::query_as::<_, Sanction>("SELECT * FROM sanctions WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Sanction with id {} not found", id)))?;

        if sanction.status != SanctionStatus::Active {
            return Err(domain::sanctions::SanctionDenial::NotActive.into());
        }

        let ends_at = match update.duration_days {
            Some(days) => Some(sanction.starts_at + chrono::Duration::days(days)),
            None => sanction.ends_at,
        };

        let updated = sqlx::query_as::<_, Sanction>(
            r#"
            UPDATE sanctions SET
                reason = COALESCE($2, reason),
                amount = COALESCE($3, amount),
                ends_at = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.reason)
        .bind(update.amount)
        .bind(ends_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Lift an active sanction
    pub async fn lift(&self, id: i64, lifted_by: i64) -> AppResult<Sanction> {
        let mut tx = self.pool.begin().await?;

        let sanction =
            sqlx::query_as::<_, Sanction>("SELECT * FROM sanctions WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Sanction with id {} not found", id)))?;

        domain::sanctions::check_lift(&sanction)?;

        let notes = domain::sanctions::audit_note(
            sanction.notes.as_deref(),
            &format!("lifted by user #{}", lifted_by),
        );
        let lifted = sqlx::query_as::<_, Sanction>(
            "UPDATE sanctions SET status = 'lifted', notes = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        NotificationsRepository::append(
            &mut *tx,
            sanction.user_id,
            &NotificationIntent::SanctionLifted {
                sanction_id: id,
                kind: sanction.kind,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(lifted)
    }

    /// Settle a fine in full
    pub async fn pay(&self, id: i64, amount: Option<Decimal>) -> AppResult<Sanction> {
        let mut tx = self.pool.begin().await?;

        let sanction =
            sqlx::query_as::<_, Sanction>("SELECT * FROM sanctions WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Sanction with id {} not found", id)))?;

        let paid = domain::sanctions::check_pay(&sanction, amount)?;

        let notes = domain::sanctions::audit_note(
            sanction.notes.as_deref(),
            &format!("paid {}", paid),
        );
        let settled = sqlx::query_as::<_, Sanction>(
            "UPDATE sanctions SET status = 'paid', notes = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        NotificationsRepository::append(
            &mut *tx,
            sanction.user_id,
            &NotificationIntent::SanctionPaid {
                sanction_id: id,
                amount: paid,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(settled)
    }

    /// Push an active sanction's end date further out
    pub async fn extend(
        &self,
        id: i64,
        days: i64,
        reason: Option<&str>,
        extended_by: i64,
    ) -> AppResult<Sanction> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let sanction =
            sqlx::query_as::<_, Sanction>("SELECT * FROM sanctions WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Sanction with id {} not found", id)))?;

        let new_end = domain::sanctions::check_extend(&sanction, now, days)?;

        let notes = domain::sanctions::audit_note(
            sanction.notes.as_deref(),
            &format!("extended by {} day(s) by user #{}", days, extended_by),
        );
        let extended = sqlx::query_as::<_, Sanction>(
            "UPDATE sanctions SET ends_at = $2, notes = $3, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(new_end)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        NotificationsRepository::append(
            &mut *tx,
            sanction.user_id,
            &NotificationIntent::SanctionExtended {
                sanction_id: id,
                kind: sanction.kind,
                days,
                reason: reason.map(str::to_string),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(extended)
    }

    /// Expire active sanctions whose end date has passed
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE sanctions SET status = 'expired', updated_at = NOW()
            WHERE status = 'active' AND ends_at IS NOT NULL AND ends_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn stats(&self) -> AppResult<SanctionStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'active') AS active,
                   COUNT(*) FILTER (WHERE status = 'paid') AS paid,
                   COUNT(*) FILTER (WHERE status = 'lifted') AS lifted,
                   COUNT(*) FILTER (WHERE status = 'expired') AS expired,
                   COALESCE(SUM(amount) FILTER (WHERE kind = 'fine' AND status = 'paid'), 0)
                       AS collected_amount
            FROM sanctions
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(SanctionStats {
            total: row.get("total"),
            active: row.get("active"),
            paid: row.get("paid"),
            lifted: row.get("lifted"),
            expired: row.get("expired"),
            collected_amount: row.get("collected_amount"),
        })
    }
}
