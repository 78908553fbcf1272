//! Book and category models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::BookStatus;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub page_count: Option<i32>,
    pub language: String,
    pub summary: Option<String>,
    pub category_id: i64,
    pub total_copies: i32,
    pub available_copies: i32,
    pub location: Option<String>,
    pub status: BookStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// A book can be borrowed directly when its catalog status is available
    /// and at least one copy is on the shelf.
    pub fn is_available(&self) -> bool {
        self.status == BookStatus::Available && self.available_copies > 0
    }
}

/// Book category
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Book search query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Matches title, author, ISBN or summary
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub status: Option<BookStatus>,
    /// Only books that can be borrowed right now
    pub available: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 500, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(max = 20, message = "ISBN too long"))]
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub page_count: Option<i32>,
    pub language: Option<String>,
    pub summary: Option<String>,
    pub category_id: i64,
    #[validate(range(min = 1, message = "At least one copy is required"))]
    pub total_copies: Option<i32>,
    pub location: Option<String>,
}

/// Update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 500, message = "Title cannot be empty"))]
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub page_count: Option<i32>,
    pub language: Option<String>,
    pub summary: Option<String>,
    pub category_id: Option<i64>,
    pub total_copies: Option<i32>,
    pub location: Option<String>,
    pub status: Option<BookStatus>,
}
