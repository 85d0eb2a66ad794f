//! Discount codes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use eventhub_core::{BookingQuote, Discount};

use crate::auth::AuthUser;
use crate::error::{ApiJson, ApiQuery, ApiResult};
use crate::services::{CreateDiscountRequest, DiscountService};
use crate::state::AppState;

pub(super) async fn create_discount(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    ApiJson(req): ApiJson<CreateDiscountRequest>,
) -> ApiResult<(StatusCode, Json<Discount>)> {
    let discount = DiscountService::new(state).create(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(discount)))
}

pub(super) async fn list_discounts(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
) -> ApiResult<Json<Vec<Discount>>> {
    Ok(Json(DiscountService::new(state).list(&ctx).await?))
}

#[derive(Debug, Deserialize)]
pub(super) struct QuoteQuery {
    event_id: String,
    #[serde(default = "one")]
    quantity: i64,
}

fn one() -> i64 {
    1
}

/// Prices a prospective booking; public so the checkout page can preview it.
pub(super) async fn quote(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    ApiQuery(query): ApiQuery<QuoteQuery>,
) -> ApiResult<Json<BookingQuote>> {
    let quote = DiscountService::new(state)
        .quote(&code, &query.event_id, query.quantity)
        .await?;
    Ok(Json(quote))
}
