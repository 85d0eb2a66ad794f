//! Venue management.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use eventhub_core::validation::{validate_capacity, validate_text, validate_uuid};
use eventhub_core::{AuthContext, CoreError, ValidationError, Venue};

use crate::error::ApiResult;
use crate::state::AppState;

/// Body of `POST /venues`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVenueRequest {
    pub name: String,
    pub address: String,
    pub city: String,
    pub capacity: i64,
}

/// Body of `PUT /venues/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateVenueRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub capacity: Option<i64>,
    pub is_active: Option<bool>,
}

/// Venue service.
pub struct VenueService {
    state: Arc<AppState>,
}

impl VenueService {
    pub fn new(state: Arc<AppState>) -> Self {
        VenueService { state }
    }

    /// Lists venues. Inactive ones only for admins.
    pub async fn list(&self, ctx: Option<&AuthContext>, include_inactive: bool) -> ApiResult<Vec<Venue>> {
        let include_inactive = include_inactive && ctx.is_some_and(AuthContext::is_admin);
        Ok(self.state.db.venues().list(include_inactive).await?)
    }

    /// Creates a venue (admin only).
    pub async fn create(&self, ctx: &AuthContext, req: CreateVenueRequest) -> ApiResult<Venue> {
        ctx.require_admin()?;
        validate_text("name", &req.name, 200)?;
        validate_text("address", &req.address, 500)?;
        validate_text("city", &req.city, 100)?;
        validate_capacity(req.capacity)?;

        let now = Utc::now();
        let venue = Venue {
            id: Uuid::new_v4().to_string(),
            name: req.name.trim().to_string(),
            address: req.address.trim().to_string(),
            city: req.city.trim().to_string(),
            capacity: req.capacity,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.state.db.venues().insert(&venue).await?;

        info!(venue_id = %venue.id, capacity = venue.capacity, "Venue created");
        Ok(venue)
    }

    /// Updates a venue (admin only).
    ///
    /// Capacity cannot drop below the largest active event hosted there.
    pub async fn update(
        &self,
        ctx: &AuthContext,
        venue_id: &str,
        req: UpdateVenueRequest,
    ) -> ApiResult<Venue> {
        ctx.require_admin()?;
        let mut venue = self.load(venue_id).await?;

        if let Some(name) = req.name {
            validate_text("name", &name, 200)?;
            venue.name = name.trim().to_string();
        }
        if let Some(address) = req.address {
            validate_text("address", &address, 500)?;
            venue.address = address.trim().to_string();
        }
        if let Some(city) = req.city {
            validate_text("city", &city, 100)?;
            venue.city = city.trim().to_string();
        }
        if let Some(active) = req.is_active {
            venue.is_active = active;
        }
        if let Some(capacity) = req.capacity {
            validate_capacity(capacity)?;
            let largest = self.state.db.venues().max_event_tickets(&venue.id).await?;
            if capacity < largest {
                return Err(ValidationError::OutOfRange {
                    field: "capacity".to_string(),
                    min: largest,
                    max: i64::MAX,
                }
                .into());
            }
            venue.capacity = capacity;
        }

        self.state.db.venues().update(&venue).await?;
        info!(venue_id = %venue.id, updated_by = %ctx.user_id, "Venue updated");

        self.load(venue_id).await
    }

    async fn load(&self, venue_id: &str) -> ApiResult<Venue> {
        validate_uuid(venue_id)?;
        self.state
            .db
            .venues()
            .get_by_id(venue_id)
            .await?
            .ok_or_else(|| CoreError::VenueNotFound(venue_id.to_string()).into())
    }
}
