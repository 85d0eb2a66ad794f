//! Events and venues.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use eventhub_core::{Event, EventQuery, Venue};

use crate::auth::{AuthUser, MaybeAuthUser};
use crate::error::{ApiJson, ApiQuery, ApiResult};
use crate::services::{
    CreateEventRequest, CreateVenueRequest, EventService, UpdateEventRequest, UpdateVenueRequest,
    VenueService,
};
use crate::state::AppState;

pub(super) async fn list_events(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(ctx): MaybeAuthUser,
    ApiQuery(query): ApiQuery<EventQuery>,
) -> ApiResult<Json<Vec<Event>>> {
    let events = EventService::new(state).list(ctx.as_ref(), query).await?;
    Ok(Json(events))
}

pub(super) async fn my_events(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
) -> ApiResult<Json<Vec<Event>>> {
    Ok(Json(EventService::new(state).mine(&ctx).await?))
}

pub(super) async fn get_event(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(ctx): MaybeAuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Event>> {
    Ok(Json(EventService::new(state).get(ctx.as_ref(), &id).await?))
}

pub(super) async fn create_event(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    ApiJson(req): ApiJson<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let event = EventService::new(state).create(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub(super) async fn update_event(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateEventRequest>,
) -> ApiResult<Json<Event>> {
    Ok(Json(EventService::new(state).update(&ctx, &id, req).await?))
}

pub(super) async fn activate_event(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Event>> {
    Ok(Json(EventService::new(state).set_active(&ctx, &id, true).await?))
}

pub(super) async fn deactivate_event(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Event>> {
    Ok(Json(EventService::new(state).set_active(&ctx, &id, false).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct VenueListQuery {
    include_inactive: bool,
}

pub(super) async fn list_venues(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(ctx): MaybeAuthUser,
    ApiQuery(query): ApiQuery<VenueListQuery>,
) -> ApiResult<Json<Vec<Venue>>> {
    let venues = VenueService::new(state)
        .list(ctx.as_ref(), query.include_inactive)
        .await?;
    Ok(Json(venues))
}

pub(super) async fn create_venue(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    ApiJson(req): ApiJson<CreateVenueRequest>,
) -> ApiResult<(StatusCode, Json<Venue>)> {
    let venue = VenueService::new(state).create(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(venue)))
}

pub(super) async fn update_venue(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateVenueRequest>,
) -> ApiResult<Json<Venue>> {
    Ok(Json(VenueService::new(state).update(&ctx, &id, req).await?))
}
