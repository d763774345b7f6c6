pub mod admin;
pub mod auth;
pub mod bookings;
pub mod cashier;
pub mod extract;
pub mod health;
pub mod reviews;
pub mod salons;
pub mod scores;
pub mod services;
pub mod stylists;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());

    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/salons", get(salons::list_salons).post(salons::create_salon))
        .route("/api/salons/:id", get(salons::get_salon).put(salons::update_salon))
        .route("/api/owner/salons", get(salons::my_salons))
        .route("/api/salons/:id/images", post(salons::add_image))
        .route(
            "/api/salons/:id/images/:image_id",
            axum::routing::delete(salons::delete_image),
        )
        .route(
            "/api/salons/:id/services",
            get(services::list_services).post(services::create_service),
        )
        .route(
            "/api/services/:id",
            put(services::update_service).delete(services::deactivate_service),
        )
        .route(
            "/api/salons/:id/stylists",
            get(stylists::list_stylists).post(stylists::create_stylist),
        )
        .route(
            "/api/stylists/:id",
            put(stylists::update_stylist).delete(stylists::deactivate_stylist),
        )
        .route(
            "/api/stylists/:id/availability",
            get(stylists::get_availability).put(stylists::put_availability),
        )
        .route("/api/stylists/:id/slots", get(stylists::get_slots))
        .route("/api/rendezvous", post(bookings::create_booking))
        .route("/api/rendezvous/mine", get(bookings::my_bookings))
        .route("/api/rendezvous/:id", get(bookings::get_booking))
        .route("/api/rendezvous/:id/cancel", post(bookings::cancel_booking))
        .route("/api/rendezvous/:id/status", patch(bookings::update_status))
        .route("/api/rendezvous/:id/calendar.ics", get(bookings::download_ics))
        .route("/api/salons/:id/rendezvous", get(bookings::salon_bookings))
        .route(
            "/api/salons/:id/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route("/api/favorites", get(reviews::list_favorites))
        .route(
            "/api/favorites/:salon_id",
            post(reviews::add_favorite).delete(reviews::remove_favorite),
        )
        .route("/api/scores/me", get(scores::my_score))
        .route("/api/clients/:id/score", get(scores::client_score))
        .route(
            "/api/clients/:id/score/events",
            get(scores::score_events).post(scores::record_manual_event),
        )
        .route(
            "/api/salons/:id/cashiers",
            get(cashier::list_cashiers).post(cashier::create_cashier),
        )
        .route("/api/cashier/today", get(cashier::today))
        .route("/api/cashier/rendezvous/:id/checkout", post(cashier::checkout))
        .route("/api/admin/stats", get(admin::get_stats))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/:id/activate", post(admin::activate_user))
        .route("/api/admin/users/:id/deactivate", post(admin::deactivate_user))
        .route("/api/admin/salons", get(admin::list_salons))
        .route("/api/admin/salons/:id/activate", post(admin::activate_salon))
        .route("/api/admin/salons/:id/deactivate", post(admin::deactivate_salon))
        .route("/api/admin/admins", post(admin::create_admin))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin.map(str::parse::<HeaderValue>) {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "invalid CORS_ORIGIN, allowing any origin");
            AllowOrigin::any()
        }
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
