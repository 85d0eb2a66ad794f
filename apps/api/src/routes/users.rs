//! Accounts.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use eventhub_core::{Role, User};

use crate::auth::{AuthUser, MaybeAuthUser};
use crate::error::{ApiJson, ApiQuery, ApiResult};
use crate::services::{RegisterUserRequest, RegisteredUser, UserService};
use crate::state::AppState;

/// Open registration. An admin token is only needed to create admins.
pub(super) async fn register(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(actor): MaybeAuthUser,
    ApiJson(req): ApiJson<RegisterUserRequest>,
) -> ApiResult<(StatusCode, Json<RegisteredUser>)> {
    let registered = UserService::new(state).register(actor.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

pub(super) async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
) -> ApiResult<Json<User>> {
    Ok(Json(UserService::new(state).me(&ctx).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct UserListQuery {
    role: Option<Role>,
    limit: Option<u32>,
}

pub(super) async fn list_users(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let users = UserService::new(state)
        .list(&ctx, query.role, query.limit)
        .await?;
    Ok(Json(users))
}

pub(super) async fn get_user(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(UserService::new(state).get(&ctx, &id).await?))
}

pub(super) async fn activate_user(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(UserService::new(state).set_active(&ctx, &id, true).await?))
}

pub(super) async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(UserService::new(state).set_active(&ctx, &id, false).await?))
}
