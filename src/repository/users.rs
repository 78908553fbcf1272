//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    domain::notify::NotificationIntent,
    error::{AppError, AppResult},
    models::{
        enums::{Role, UserStatus},
        user::{UpdateProfile, UpdateUser, UserQuery, UserStats},
        User,
    },
    repository::{notifications::NotificationsRepository, page_limits},
};

/// Column set and hashed password for an account insert; role and
/// registration route are decided by the service layer.
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub student_number: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by email (login)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Search users with optional role/status filters
    pub async fn list(&self, query: &UserQuery) -> AppResult<Vec<User>> {
        let (limit, offset) = page_limits(query.page, query.per_page);
        let pattern = query.search.as_ref().map(|s| format!("%{}%", s));
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NULL
                   OR first_name ILIKE $1 OR last_name ILIKE $1 OR email ILIKE $1)
              AND ($2::text IS NULL OR role = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY last_name, first_name
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(pattern)
        .bind(query.role.map(|r| r.as_str()))
        .bind(query.status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Insert a new account and its welcome notification atomically
    pub async fn create(&self, new_user: &NewUser) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, password, role, status,
                               student_number, phone, address, registered_at)
            VALUES ($1, $2, $3, $4, $5, 'active', $6, $7, $8, NOW())
            RETURNING *
            "#,
        )
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role)
        .bind(&new_user.student_number)
        .bind(&new_user.phone)
        .bind(&new_user.address)
        .fetch_one(&mut *tx)
        .await?;

        NotificationsRepository::append(
            &mut *tx,
            user.id,
            &NotificationIntent::Welcome { role: user.role },
        )
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Update account fields set by staff
    pub async fn update(&self, id: i64, update: &UpdateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                student_number = COALESCE($5, student_number),
                phone = COALESCE($6, phone),
                address = COALESCE($7, address),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.email)
        .bind(&update.student_number)
        .bind(&update.phone)
        .bind(&update.address)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Update fields a user may change on their own profile
    pub async fn update_profile(&self, id: i64, update: &UpdateProfile) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(&update.address)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    pub async fn update_password(&self, id: i64, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET password = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Change role and notify the account holder
    pub async fn set_role(&self, id: i64, role: Role) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let old = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(role)
        .fetch_one(&mut *tx)
        .await?;

        if old.role != role {
            NotificationsRepository::append(
                &mut *tx,
                id,
                &NotificationIntent::RoleChanged {
                    old_role: old.role,
                    new_role: role,
                },
            )
            .await?;
        }

        tx.commit().await?;
        Ok(user)
    }

    /// Change account status and notify the account holder
    pub async fn set_status(&self, id: i64, status: UserStatus) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let old = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        if old.status != status {
            NotificationsRepository::append(
                &mut *tx,
                id,
                &NotificationIntent::AccountStatusChanged { status },
            )
            .await?;
        }

        tx.commit().await?;
        Ok(user)
    }

    /// Delete an account; refused while the user still holds active loans
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let active_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE user_id = $1 AND status = 'active'",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        if active_loans > 0 {
            return Err(AppError::Conflict(format!(
                "User still has {} active loan(s)",
                active_loans
            )));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn stats(&self) -> AppResult<UserStats> {
        let stats = sqlx::query_as::<_, UserStats>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE role = 'borrower') AS borrowers,
                   COUNT(*) FILTER (WHERE role = 'librarian') AS librarians,
                   COUNT(*) FILTER (WHERE role = 'administrator') AS administrators,
                   COUNT(*) FILTER (WHERE status = 'active') AS active,
                   COUNT(*) FILTER (WHERE status = 'suspended') AS suspended,
                   COUNT(*) FILTER (WHERE status = 'inactive') AS inactive
            FROM users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
