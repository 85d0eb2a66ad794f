//! Discount codes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use eventhub_core::pricing::quote_booking;
use eventhub_core::validation::{
    validate_discount_code, validate_percentage_bps, validate_uuid, validate_window,
};
use eventhub_core::{AuthContext, BookingQuote, CoreError, Discount, ValidationError};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::AppState;

/// Body of `POST /discounts`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDiscountRequest {
    pub code: String,
    /// 1500 = 15%.
    pub percentage_bps: i64,
    #[serde(default)]
    pub event_id: Option<String>,
    /// Defaults to now.
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: DateTime<Utc>,
    #[serde(default)]
    pub max_uses: Option<i64>,
}

/// Discount service.
pub struct DiscountService {
    state: Arc<AppState>,
}

impl DiscountService {
    pub fn new(state: Arc<AppState>) -> Self {
        DiscountService { state }
    }

    /// Creates a discount code (admin only).
    pub async fn create(&self, ctx: &AuthContext, req: CreateDiscountRequest) -> ApiResult<Discount> {
        ctx.require_admin()?;

        let code = req.code.trim().to_uppercase();
        validate_discount_code(&code)?;
        validate_percentage_bps(req.percentage_bps)?;

        let now = Utc::now();
        let valid_from = req.valid_from.unwrap_or(now);
        validate_window("valid_until", valid_from, req.valid_until)?;

        if req.max_uses.is_some_and(|max| max <= 0) {
            return Err(ValidationError::MustBePositive {
                field: "max_uses".to_string(),
            }
            .into());
        }

        if let Some(event_id) = &req.event_id {
            validate_uuid(event_id)?;
            if self.state.db.events().get_by_id(event_id).await?.is_none() {
                return Err(CoreError::EventNotFound(event_id.clone()).into());
            }
        }

        let discount = Discount {
            id: Uuid::new_v4().to_string(),
            code,
            percentage_bps: req.percentage_bps,
            event_id: req.event_id,
            valid_from,
            valid_until: req.valid_until,
            max_uses: req.max_uses,
            times_used: 0,
            is_active: true,
            created_at: now,
        };

        self.state.db.discounts().insert(&discount).await.map_err(|e| {
            if e.is_unique_violation_on("discounts.code") {
                ApiError::new(ErrorCode::Conflict, format!("Code {} already exists", discount.code))
            } else {
                e.into()
            }
        })?;

        info!(code = %discount.code, percentage_bps = discount.percentage_bps, "Discount created");
        Ok(discount)
    }

    /// Lists all discount codes (admin only).
    pub async fn list(&self, ctx: &AuthContext) -> ApiResult<Vec<Discount>> {
        ctx.require_admin()?;
        Ok(self.state.db.discounts().list().await?)
    }

    /// Prices a prospective booking with a code, without reserving anything.
    pub async fn quote(
        &self,
        code: &str,
        event_id: &str,
        quantity: i64,
    ) -> ApiResult<BookingQuote> {
        validate_uuid(event_id)?;
        let code = code.trim().to_uppercase();
        validate_discount_code(&code)?;

        let db = &self.state.db;
        let event = db
            .events()
            .get_by_id(event_id)
            .await?
            .ok_or_else(|| CoreError::EventNotFound(event_id.to_string()))?;
        let discount = db
            .discounts()
            .get_by_code(&code)
            .await?
            .ok_or_else(|| CoreError::DiscountUnavailable {
                code: code.clone(),
                reason: "unknown code".to_string(),
            })?;

        Ok(quote_booking(&event, quantity, Some(&discount), Utc::now())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use eventhub_core::Role;

    use crate::services::test_support;

    fn request(code: &str) -> CreateDiscountRequest {
        CreateDiscountRequest {
            code: code.to_string(),
            percentage_bps: 2500,
            event_id: None,
            valid_from: None,
            valid_until: Utc::now() + Duration::days(7),
            max_uses: Some(50),
        }
    }

    #[tokio::test]
    async fn test_create_and_quote() {
        let state = test_support::state().await;
        let admin = test_support::user(&state, Role::Admin).await;
        let event = test_support::event(&state, 10).await;
        let service = DiscountService::new(state);

        let discount = service.create(&admin, request("spring-25")).await.unwrap();
        assert_eq!(discount.code, "SPRING-25");

        let quote = service.quote("spring-25", &event.id, 2).await.unwrap();
        assert_eq!(quote.subtotal_cents, 5000);
        assert_eq!(quote.discount_cents, 1250);
        assert_eq!(quote.total_cents, 3750);

        assert_eq!(service.list(&admin).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejections() {
        let state = test_support::state().await;
        let admin = test_support::user(&state, Role::Admin).await;
        let organizer = test_support::user(&state, Role::Organizer).await;
        let service = DiscountService::new(state);

        let err = service.create(&organizer, request("NOPE")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let mut zero_uses = request("ZERO");
        zero_uses.max_uses = Some(0);
        let err = service.create(&admin, zero_uses).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut too_much = request("GREEDY");
        too_much.percentage_bps = 10_001;
        let err = service.create(&admin, too_much).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        service.create(&admin, request("TWICE")).await.unwrap();
        let err = service.create(&admin, request("twice")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_quote_unknown_code() {
        let state = test_support::state().await;
        let event = test_support::event(&state, 10).await;

        let err = DiscountService::new(state)
            .quote("MISSING", &event.id, 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountUnavailable);
    }
}
