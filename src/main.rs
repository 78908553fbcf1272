//! Athenaeum Server - University Library Management System

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use athenaeum_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("athenaeum_server={},tower_http=debug", config.logging.level).into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Athenaeum Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let rules = config.circulation_rules();
    let repository = Repository::new(pool, rules.clone());
    let services = Services::new(repository, config.auth.clone(), rules);

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        .route("/auth/profile", put(api::auth::update_profile))
        .route("/auth/password", put(api::auth::change_password))
        // Books (catalog)
        .route("/books", get(api::books::list_books))
        .route("/books", post(api::books::create_book))
        .route("/books/categories", get(api::books::list_categories))
        .route("/books/:id", get(api::books::get_book))
        .route("/books/:id", put(api::books::update_book))
        .route("/books/:id", delete(api::books::delete_book))
        // Loans
        .route("/loans", get(api::loans::list_loans))
        .route("/loans", post(api::loans::create_loan))
        .route("/loans/history", get(api::loans::loan_history))
        .route("/loans/stats", get(api::loans::loan_stats))
        .route("/loans/:id", get(api::loans::get_loan))
        .route("/loans/:id/extend", put(api::loans::extend_loan))
        .route("/loans/:id/return", put(api::loans::return_loan))
        .route("/loans/:id/lost", put(api::loans::mark_lost))
        // Reservations
        .route("/reservations", get(api::reservations::list_reservations))
        .route("/reservations", post(api::reservations::create_reservation))
        .route("/reservations/stats", get(api::reservations::reservation_stats))
        .route(
            "/reservations/check-expired",
            post(api::reservations::check_expired),
        )
        .route("/reservations/:id", get(api::reservations::get_reservation))
        .route(
            "/reservations/:id/cancel",
            put(api::reservations::cancel_reservation),
        )
        .route(
            "/reservations/:id/confirm",
            put(api::reservations::confirm_reservation),
        )
        // Sanctions
        .route("/sanctions", get(api::sanctions::list_sanctions))
        .route("/sanctions", post(api::sanctions::create_sanction))
        .route("/sanctions/mine", get(api::sanctions::my_sanctions))
        .route("/sanctions/stats", get(api::sanctions::sanction_stats))
        .route(
            "/sanctions/check-expired",
            post(api::sanctions::check_expired),
        )
        .route("/sanctions/:id", get(api::sanctions::get_sanction))
        .route("/sanctions/:id", put(api::sanctions::update_sanction))
        .route("/sanctions/:id/lift", put(api::sanctions::lift_sanction))
        .route("/sanctions/:id/pay", put(api::sanctions::pay_sanction))
        .route("/sanctions/:id/extend", put(api::sanctions::extend_sanction))
        // Notifications
        .route("/notifications", get(api::notifications::list_notifications))
        .route(
            "/notifications/unread",
            get(api::notifications::unread_notifications),
        )
        .route("/notifications/read-all", put(api::notifications::mark_all_read))
        .route("/notifications/read", delete(api::notifications::delete_read))
        .route("/notifications/:id/read", put(api::notifications::mark_read))
        .route(
            "/notifications/:id",
            delete(api::notifications::delete_notification),
        )
        // Users
        .route("/users", get(api::users::list_users))
        .route("/users", post(api::users::create_user))
        .route("/users/stats", get(api::users::user_stats))
        .route("/users/:id", get(api::users::get_user))
        .route("/users/:id", put(api::users::update_user))
        .route("/users/:id", delete(api::users::delete_user))
        .route("/users/:id/role", put(api::users::update_role))
        .route("/users/:id/status", put(api::users::update_status))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
