//! Athenaeum Library Management System
//!
//! A Rust REST API server for a university library: catalog, loans with
//! role-based limits, FIFO reservation queues, a sanction ledger and a
//! notification outbox.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
