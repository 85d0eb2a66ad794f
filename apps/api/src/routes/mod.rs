//! HTTP routes.
//!
//! Handlers extract the caller and body, call one service method, and
//! serialize the result. Creation endpoints answer `201 Created`; every
//! other success is `200 OK` with the resulting entity.

mod bookings;
mod catalog;
mod discounts;
mod reports;
mod tickets;
mod users;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;

use eventhub_db::migrations::migration_status;

use crate::state::AppState;

/// Builds the router with every endpoint mounted.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        // Catalog
        .route("/events", get(catalog::list_events).post(catalog::create_event))
        .route("/events/mine", get(catalog::my_events))
        .route("/events/{id}", get(catalog::get_event).put(catalog::update_event))
        .route("/events/{id}/activate", post(catalog::activate_event))
        .route("/events/{id}/deactivate", post(catalog::deactivate_event))
        .route("/venues", get(catalog::list_venues).post(catalog::create_venue))
        .route("/venues/{id}", put(catalog::update_venue))
        // Accounts
        .route("/users", get(users::list_users).post(users::register))
        .route("/users/me", get(users::me))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/activate", post(users::activate_user))
        .route("/users/{id}/deactivate", post(users::deactivate_user))
        // Discounts
        .route("/discounts", get(discounts::list_discounts).post(discounts::create_discount))
        .route("/discounts/{code}/quote", get(discounts::quote))
        // Booking → payment → ticket
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/mine", get(bookings::my_bookings))
        .route("/bookings/{id}", get(bookings::get_booking))
        .route("/bookings/{id}/cancel", post(bookings::cancel_booking))
        .route("/bookings/{id}/refund", post(bookings::refund_booking))
        .route("/payments", post(bookings::process_payment))
        .route("/tickets/mine", get(tickets::my_tickets))
        .route("/tickets/{ticket_number}/qr", get(tickets::qr_code))
        .route("/tickets/verify", post(tickets::verify))
        .route("/tickets/check-in", post(tickets::check_in))
        // Reports
        .route("/organizer/revenue", get(reports::organizer_revenue))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: bool,
    migrations_applied: usize,
    migrations_total: usize,
}

/// Liveness plus a database round trip.
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let (migrations_total, migrations_applied) =
        migration_status(state.db.pool()).await.unwrap_or((0, 0));

    let healthy = database && migrations_applied == migrations_total;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            database,
            migrations_applied,
            migrations_total,
        }),
    )
}
