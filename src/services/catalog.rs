//! Catalog service: books and categories

use crate::{
    error::AppResult,
    models::{
        book::{BookQuery, CreateBook, UpdateBook},
        Book, Category,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn search(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.list(query).await
    }

    pub async fn get(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        self.repository.books.create(book).await
    }

    pub async fn update(&self, id: i64, update: &UpdateBook) -> AppResult<Book> {
        self.repository.books.update(id, update).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.repository.books.delete(id).await
    }

    pub async fn categories(&self) -> AppResult<Vec<Category>> {
        self.repository.books.list_categories().await
    }
}
