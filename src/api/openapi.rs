//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, loans, notifications, reservations, sanctions, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Athenaeum API",
        version = "1.0.0",
        description = "University Library Management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&SecurityAddon),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        auth::update_profile,
        auth::change_password,
        // Books
        books::list_books,
        books::list_categories,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Loans
        loans::list_loans,
        loans::loan_history,
        loans::loan_stats,
        loans::get_loan,
        loans::create_loan,
        loans::extend_loan,
        loans::return_loan,
        loans::mark_lost,
        // Reservations
        reservations::list_reservations,
        reservations::reservation_stats,
        reservations::get_reservation,
        reservations::create_reservation,
        reservations::check_expired,
        reservations::cancel_reservation,
        reservations::confirm_reservation,
        // Sanctions
        sanctions::list_sanctions,
        sanctions::my_sanctions,
        sanctions::sanction_stats,
        sanctions::get_sanction,
        sanctions::create_sanction,
        sanctions::check_expired,
        sanctions::update_sanction,
        sanctions::lift_sanction,
        sanctions::pay_sanction,
        sanctions::extend_sanction,
        // Notifications
        notifications::list_notifications,
        notifications::unread_notifications,
        notifications::mark_read,
        notifications::mark_all_read,
        notifications::delete_notification,
        notifications::delete_read,
        // Users
        users::list_users,
        users::user_stats,
        users::get_user,
        users::create_user,
        users::update_user,
        users::update_role,
        users::update_status,
        users::delete_user,
    ),
    components(
        schemas(
            // Enums
            crate::models::enums::Role,
            crate::models::enums::UserStatus,
            crate::models::enums::BookStatus,
            crate::models::enums::LoanStatus,
            crate::models::enums::ReservationStatus,
            crate::models::enums::SanctionKind,
            crate::models::enums::SanctionStatus,
            crate::models::enums::NotificationKind,
            // Auth
            crate::models::user::RegisterUser,
            crate::models::user::LoginUser,
            crate::models::user::AuthResponse,
            crate::models::user::ChangePassword,
            // Users
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::UserQuery,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::UpdateProfile,
            crate::models::user::UpdateRole,
            crate::models::user::UpdateStatus,
            crate::models::user::UserStats,
            // Books
            crate::models::book::Book,
            crate::models::book::Category,
            crate::models::book::BookQuery,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanDetails,
            crate::models::loan::LoanQuery,
            crate::models::loan::CreateLoan,
            crate::models::loan::ExtendLoan,
            crate::models::loan::MarkLost,
            crate::models::loan::LoanStats,
            loans::ReturnResponse,
            loans::LostResponse,
            // Reservations
            crate::models::reservation::Reservation,
            crate::models::reservation::ReservationDetails,
            crate::models::reservation::ReservationQuery,
            crate::models::reservation::CreateReservation,
            crate::models::reservation::ReservationStats,
            crate::models::reservation::ExpirySweepReport,
            // Sanctions
            crate::models::sanction::Sanction,
            crate::models::sanction::SanctionDetails,
            crate::models::sanction::SanctionQuery,
            crate::models::sanction::CreateSanction,
            crate::models::sanction::UpdateSanction,
            crate::models::sanction::PaySanction,
            crate::models::sanction::ExtendSanction,
            crate::models::sanction::SanctionStats,
            sanctions::SanctionSweepResponse,
            // Notifications
            crate::models::notification::Notification,
            crate::models::notification::NotificationQuery,
            notifications::UnreadResponse,
            notifications::BulkResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::api::MessageResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication and profile"),
        (name = "books", description = "Catalog management"),
        (name = "loans", description = "Loan lifecycle"),
        (name = "reservations", description = "Reservation queues"),
        (name = "sanctions", description = "Fines, suspensions and warnings"),
        (name = "notifications", description = "Notification outbox"),
        (name = "users", description = "User administration")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("document has components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
