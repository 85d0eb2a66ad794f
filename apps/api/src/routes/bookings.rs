//! Bookings and payments.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use eventhub_core::Booking;

use crate::auth::AuthUser;
use crate::error::{ApiJson, ApiResult};
use crate::services::{
    BookingDetails, BookingService, CreateBookingRequest, PaymentReceipt, PaymentService,
    ProcessPaymentRequest,
};
use crate::state::AppState;

pub(super) async fn create_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    ApiJson(req): ApiJson<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let booking = BookingService::new(state).create_booking(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub(super) async fn my_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
) -> ApiResult<Json<Vec<Booking>>> {
    Ok(Json(BookingService::new(state).my_bookings(&ctx).await?))
}

pub(super) async fn get_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<BookingDetails>> {
    Ok(Json(BookingService::new(state).get_booking(&ctx, &id).await?))
}

pub(super) async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Booking>> {
    Ok(Json(BookingService::new(state).cancel_booking(&ctx, &id).await?))
}

pub(super) async fn refund_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Booking>> {
    Ok(Json(PaymentService::new(state).refund_booking(&ctx, &id).await?))
}

/// Pays a pending booking and issues its tickets.
pub(super) async fn process_payment(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    ApiJson(req): ApiJson<ProcessPaymentRequest>,
) -> ApiResult<Json<PaymentReceipt>> {
    Ok(Json(PaymentService::new(state).process_payment(&ctx, req).await?))
}
