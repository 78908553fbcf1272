//! Books and categories repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookQuery, CreateBook, UpdateBook},
        Book, Category,
    },
    repository::page_limits,
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search the catalog
    pub async fn list(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let (limit, offset) = page_limits(query.page, query.per_page);
        let pattern = query.search.as_ref().map(|s| format!("%{}%", s));
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE ($1::text IS NULL
                   OR title ILIKE $1 OR author ILIKE $1
                   OR isbn ILIKE $1 OR summary ILIKE $1)
              AND ($2::bigint IS NULL OR category_id = $2)
              AND ($3::text IS NULL OR status = $3)
              AND (NOT $4 OR (status = 'available' AND available_copies > 0))
            ORDER BY title
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(pattern)
        .bind(query.category_id)
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.available.unwrap_or(false))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Add a catalog entry; all copies start on the shelf
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(book.category_id)
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Err(AppError::BadRequest(format!(
                "Category with id {} does not exist",
                book.category_id
            )));
        }

        let total = book.total_copies.unwrap_or(1);
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, publisher, publication_year, page_count,
                               language, summary, category_id, total_copies, available_copies,
                               location, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10, $11, 'available')
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.publisher)
        .bind(book.publication_year)
        .bind(book.page_count)
        .bind(book.language.as_deref().unwrap_or("en"))
        .bind(&book.summary)
        .bind(book.category_id)
        .bind(total)
        .bind(&book.location)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Update a catalog entry. Edits to `total_copies` shift availability by
    /// the same delta, clamped so it never goes negative or above the total;
    /// copies out on loan are unaffected.
    pub async fn update(&self, id: i64, update: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        if let Some(category_id) = update.category_id {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                    .bind(category_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !exists {
                return Err(AppError::BadRequest(format!(
                    "Category with id {} does not exist",
                    category_id
                )));
            }
        }

        let new_total = update.total_copies.unwrap_or(current.total_copies);
        if new_total < 1 {
            return Err(AppError::Validation(
                "A book must keep at least one copy".to_string(),
            ));
        }
        let delta = new_total - current.total_copies;
        let new_available = (current.available_copies + delta).clamp(0, new_total);

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                author = COALESCE($3, author),
                isbn = COALESCE($4, isbn),
                publisher = COALESCE($5, publisher),
                publication_year = COALESCE($6, publication_year),
                page_count = COALESCE($7, page_count),
                language = COALESCE($8, language),
                summary = COALESCE($9, summary),
                category_id = COALESCE($10, category_id),
                location = COALESCE($11, location),
                status = COALESCE($12, status),
                total_copies = $13,
                available_copies = $14,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.author)
        .bind(&update.isbn)
        .bind(&update.publisher)
        .bind(update.publication_year)
        .bind(update.page_count)
        .bind(&update.language)
        .bind(&update.summary)
        .bind(update.category_id)
        .bind(&update.location)
        .bind(update.status.map(|s| s.as_str()))
        .bind(new_total)
        .bind(new_available)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(book)
    }

    /// Remove a catalog entry; refused while copies are out or reserved
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let active_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE book_id = $1 AND status = 'active'",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        if active_loans > 0 {
            return Err(AppError::Conflict(format!(
                "Book still has {} active loan(s)",
                active_loans
            )));
        }

        let active_reservations: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE book_id = $1 AND status IN ('active', 'confirmed')",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        if active_reservations > 0 {
            return Err(AppError::Conflict(format!(
                "Book still has {} active reservation(s)",
                active_reservations
            )));
        }

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }
}
