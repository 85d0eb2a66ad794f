//! Tickets and door verification.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;

use eventhub_core::Ticket;

use crate::auth::AuthUser;
use crate::error::{ApiJson, ApiResult};
use crate::services::{CheckInResult, TicketService, TicketVerification, VerifyTicketRequest};
use crate::state::AppState;

pub(super) async fn my_tickets(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
) -> ApiResult<Json<Vec<Ticket>>> {
    Ok(Json(TicketService::new(state).my_tickets(&ctx).await?))
}

/// The ticket's QR code as `image/svg+xml`.
pub(super) async fn qr_code(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(ticket_number): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let svg = TicketService::new(state).qr_svg(&ctx, &ticket_number).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "private, no-store"),
        ],
        svg,
    ))
}

/// Read-only check; does not consume the ticket.
pub(super) async fn verify(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    ApiJson(req): ApiJson<VerifyTicketRequest>,
) -> ApiResult<Json<TicketVerification>> {
    Ok(Json(TicketService::new(state).verify(&ctx, &req.payload).await?))
}

pub(super) async fn check_in(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    ApiJson(req): ApiJson<VerifyTicketRequest>,
) -> ApiResult<Json<CheckInResult>> {
    Ok(Json(TicketService::new(state).check_in(&ctx, &req.payload).await?))
}
