//! Account registration and administration.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use eventhub_core::validation::{validate_email, validate_text, validate_uuid};
use eventhub_core::{AuthContext, CoreError, Role, User};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: u32 = 100;
const MAX_LIST_LIMIT: u32 = 500;

/// Body of `POST /users`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    /// Customer when omitted. Admin accounts can only be created by admins.
    #[serde(default)]
    pub role: Option<Role>,
}

/// A new account with a token to start using it.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredUser {
    pub user: User,
    pub access_token: String,
}

/// User service.
pub struct UserService {
    state: Arc<AppState>,
}

impl UserService {
    pub fn new(state: Arc<AppState>) -> Self {
        UserService { state }
    }

    /// Registers an account and issues its first access token.
    pub async fn register(
        &self,
        actor: Option<&AuthContext>,
        req: RegisterUserRequest,
    ) -> ApiResult<RegisteredUser> {
        let role = req.role.unwrap_or_default();
        if role == Role::Admin && !actor.is_some_and(AuthContext::is_admin) {
            return Err(CoreError::forbidden("only admins can create admin accounts").into());
        }

        validate_text("name", &req.name, 100)?;
        validate_email(&req.email)?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: req.name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            role,
            loyalty_points: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.state.db.users().insert(&user).await.map_err(|e| {
            if e.is_unique_violation_on("users.email") {
                ApiError::new(ErrorCode::Conflict, "Email is already registered")
            } else {
                e.into()
            }
        })?;

        let access_token = self.state.jwt.generate_access_token(&user.id, user.role)?;

        info!(user_id = %user.id, role = ?user.role, "User registered");

        Ok(RegisteredUser { user, access_token })
    }

    /// Gets the caller's own profile.
    pub async fn me(&self, ctx: &AuthContext) -> ApiResult<User> {
        self.load(&ctx.user_id).await
    }

    /// Gets a profile (self or admin).
    pub async fn get(&self, ctx: &AuthContext, user_id: &str) -> ApiResult<User> {
        ctx.require_owner_or_admin(user_id)?;
        self.load(user_id).await
    }

    /// Lists accounts (admin only).
    pub async fn list(
        &self,
        ctx: &AuthContext,
        role: Option<Role>,
        limit: Option<u32>,
    ) -> ApiResult<Vec<User>> {
        ctx.require_admin()?;
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
        Ok(self.state.db.users().list(role, limit).await?)
    }

    /// Activates or deactivates an account (admin only).
    pub async fn set_active(&self, ctx: &AuthContext, user_id: &str, active: bool) -> ApiResult<User> {
        ctx.require_admin()?;
        if !active && ctx.user_id == user_id {
            return Err(ApiError::validation("Admins cannot deactivate themselves"));
        }
        validate_uuid(user_id)?;

        self.state.db.users().set_active(user_id, active).await?;
        info!(user_id = %user_id, active, changed_by = %ctx.user_id, "User active flag changed");

        self.load(user_id).await
    }

    /// Issues an access token for an existing account by email.
    ///
    /// Operator tooling only (`eventhub-api token <email>`); never routed.
    pub async fn issue_token(&self, email: &str) -> ApiResult<String> {
        let user = self
            .state
            .db
            .users()
            .get_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(|| CoreError::UserNotFound(email.to_string()))?;

        if !user.is_active {
            return Err(CoreError::forbidden("account is deactivated").into());
        }

        self.state.jwt.generate_access_token(&user.id, user.role)
    }

    async fn load(&self, user_id: &str) -> ApiResult<User> {
        self.state
            .db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support;

    fn request(email: &str, role: Option<Role>) -> RegisterUserRequest {
        RegisterUserRequest {
            name: "Grace".to_string(),
            email: email.to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_register_issues_token() {
        let state = test_support::state().await;
        let service = UserService::new(state.clone());

        let registered = service
            .register(None, request("  Grace@Example.COM ", None))
            .await
            .unwrap();
        assert_eq!(registered.user.email, "grace@example.com");
        assert_eq!(registered.user.role, Role::Customer);

        let claims = state.jwt.validate_access_token(&registered.access_token).unwrap();
        assert_eq!(claims.sub, registered.user.id);

        let token = service.issue_token("GRACE@example.com").await.unwrap();
        assert!(state.jwt.validate_access_token(&token).is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let state = test_support::state().await;
        let service = UserService::new(state);

        service.register(None, request("dup@example.com", None)).await.unwrap();
        let err = service
            .register(None, request("DUP@example.com", Some(Role::Organizer)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_admin_accounts_need_admin() {
        let state = test_support::state().await;
        let admin = test_support::user(&state, Role::Admin).await;
        let service = UserService::new(state);

        let err = service
            .register(None, request("root@example.com", Some(Role::Admin)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let created = service
            .register(Some(&admin), request("root@example.com", Some(Role::Admin)))
            .await
            .unwrap();
        assert_eq!(created.user.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_deactivation() {
        let state = test_support::state().await;
        let admin = test_support::user(&state, Role::Admin).await;
        let customer = test_support::user(&state, Role::Customer).await;
        let service = UserService::new(state);

        let err = service.set_active(&admin, &admin.user_id, false).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = service.set_active(&customer, &admin.user_id, false).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let user = service.set_active(&admin, &customer.user_id, false).await.unwrap();
        assert!(!user.is_active);
        assert!(service.issue_token(&user.email).await.is_err());

        let customers = service.list(&admin, Some(Role::Customer), None).await.unwrap();
        assert_eq!(customers.len(), 1);

        let err = service.get(&customer, &admin.user_id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert_eq!(service.me(&customer).await.unwrap().id, customer.user_id);
    }
}
