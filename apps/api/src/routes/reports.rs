//! Organizer reports.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::{ApiQuery, ApiResult};
use crate::services::{ReportService, RevenueReport};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct RevenueQuery {
    /// Admins may report on another organizer.
    organizer_id: Option<String>,
}

pub(super) async fn organizer_revenue(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    ApiQuery(query): ApiQuery<RevenueQuery>,
) -> ApiResult<Json<RevenueReport>> {
    let report = ReportService::new(state)
        .organizer_revenue(&ctx, query.organizer_id.as_deref())
        .await?;
    Ok(Json(report))
}
