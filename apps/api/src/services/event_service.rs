//! Event browsing and management.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use eventhub_core::validation::{
    validate_price_cents, validate_text, validate_ticket_total, validate_uuid, validate_window,
};
use eventhub_core::{AuthContext, CoreError, Event, EventQuery, Role, ValidationError, Venue};

use crate::error::ApiResult;
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 200;
const MAX_CATEGORY_LEN: usize = 50;
const MAX_DESCRIPTION_LEN: usize = 4000;

/// Body of `POST /events`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub venue_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price_cents: i64,
    pub total_tickets: i64,
}

/// Body of `PUT /events/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateEventRequest {
    pub venue_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub price_cents: Option<i64>,
    pub total_tickets: Option<i64>,
}

/// Event service.
pub struct EventService {
    state: Arc<AppState>,
}

impl EventService {
    pub fn new(state: Arc<AppState>) -> Self {
        EventService { state }
    }

    /// Lists events matching `query`.
    ///
    /// Inactive events are only listed for admins.
    pub async fn list(&self, ctx: Option<&AuthContext>, mut query: EventQuery) -> ApiResult<Vec<Event>> {
        if query.include_inactive && !ctx.is_some_and(AuthContext::is_admin) {
            query.include_inactive = false;
        }

        Ok(self.state.db.events().search(&query, Utc::now()).await?)
    }

    /// Gets an event.
    ///
    /// Inactive events are visible to their organizer and admins only.
    pub async fn get(&self, ctx: Option<&AuthContext>, event_id: &str) -> ApiResult<Event> {
        let event = self.load(event_id).await?;

        let privileged = ctx.is_some_and(|c| c.is_admin() || c.user_id == event.organizer_id);
        if !event.is_active && !privileged {
            return Err(CoreError::EventNotFound(event_id.to_string()).into());
        }

        Ok(event)
    }

    /// Lists the caller's own events.
    pub async fn mine(&self, ctx: &AuthContext) -> ApiResult<Vec<Event>> {
        ctx.require_role(&[Role::Organizer, Role::Admin])?;
        Ok(self.state.db.events().list_by_organizer(&ctx.user_id).await?)
    }

    /// Creates an event owned by the caller.
    pub async fn create(&self, ctx: &AuthContext, req: CreateEventRequest) -> ApiResult<Event> {
        ctx.require_role(&[Role::Organizer, Role::Admin])?;

        let now = Utc::now();
        let venue = self.load_venue(&req.venue_id).await?;
        validate_fields(
            &req.title,
            req.description.as_deref(),
            &req.category,
            req.start_date,
            req.end_date,
            req.price_cents,
        )?;
        validate_ticket_total(req.total_tickets, venue.capacity)?;
        if req.start_date <= now {
            return Err(ValidationError::Inconsistent {
                field: "start_date".to_string(),
                reason: "must be in the future".to_string(),
            }
            .into());
        }

        let event = Event {
            id: Uuid::new_v4().to_string(),
            organizer_id: ctx.user_id.clone(),
            venue_id: venue.id,
            title: req.title.trim().to_string(),
            description: clean_description(req.description),
            category: req.category.trim().to_lowercase(),
            start_date: req.start_date,
            end_date: req.end_date,
            price_cents: req.price_cents,
            total_tickets: req.total_tickets,
            available_tickets: req.total_tickets,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.state.db.events().insert(&event).await?;

        info!(
            event_id = %event.id,
            organizer_id = %event.organizer_id,
            total_tickets = event.total_tickets,
            "Event created"
        );

        Ok(event)
    }

    /// Updates an event's details.
    ///
    /// `total_tickets` can grow freely up to the venue capacity but never
    /// drop below the tickets already reserved.
    pub async fn update(
        &self,
        ctx: &AuthContext,
        event_id: &str,
        req: UpdateEventRequest,
    ) -> ApiResult<Event> {
        let mut event = self.load(event_id).await?;
        ctx.require_owner_or_admin(&event.organizer_id)?;

        if let Some(venue_id) = req.venue_id {
            event.venue_id = venue_id;
        }
        if let Some(title) = req.title {
            event.title = title.trim().to_string();
        }
        if req.description.is_some() {
            event.description = clean_description(req.description);
        }
        if let Some(category) = req.category {
            event.category = category.trim().to_lowercase();
        }
        if let Some(start) = req.start_date {
            event.start_date = start;
        }
        if let Some(end) = req.end_date {
            event.end_date = end;
        }
        if let Some(price) = req.price_cents {
            event.price_cents = price;
        }

        let reserved = event.tickets_reserved();
        if let Some(total) = req.total_tickets {
            if total < reserved {
                return Err(ValidationError::OutOfRange {
                    field: "total_tickets".to_string(),
                    min: reserved,
                    max: i64::MAX,
                }
                .into());
            }
            event.available_tickets = total - reserved;
            event.total_tickets = total;
        }

        let venue = self.load_venue(&event.venue_id).await?;
        validate_fields(
            &event.title,
            event.description.as_deref(),
            &event.category,
            event.start_date,
            event.end_date,
            event.price_cents,
        )?;
        validate_ticket_total(event.total_tickets, venue.capacity)?;

        // Relative update: concurrent bookings keep their reservations
        self.state.db.events().update(&event).await?;

        info!(event_id = %event.id, updated_by = %ctx.user_id, "Event updated");

        self.load(event_id).await
    }

    /// Activates or deactivates an event (admin moderation).
    pub async fn set_active(&self, ctx: &AuthContext, event_id: &str, active: bool) -> ApiResult<Event> {
        ctx.require_admin()?;
        validate_uuid(event_id)?;

        self.state.db.events().set_active(event_id, active).await?;
        info!(event_id = %event_id, active, moderated_by = %ctx.user_id, "Event moderated");

        self.load(event_id).await
    }

    async fn load(&self, event_id: &str) -> ApiResult<Event> {
        validate_uuid(event_id)?;
        self.state
            .db
            .events()
            .get_by_id(event_id)
            .await?
            .ok_or_else(|| CoreError::EventNotFound(event_id.to_string()).into())
    }

    async fn load_venue(&self, venue_id: &str) -> ApiResult<Venue> {
        validate_uuid(venue_id)?;
        let venue = self
            .state
            .db
            .venues()
            .get_by_id(venue_id)
            .await?
            .ok_or_else(|| CoreError::VenueNotFound(venue_id.to_string()))?;

        if !venue.is_active {
            return Err(ValidationError::Inconsistent {
                field: "venue_id".to_string(),
                reason: "venue is not active".to_string(),
            }
            .into());
        }

        Ok(venue)
    }
}

fn validate_fields(
    title: &str,
    description: Option<&str>,
    category: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    price_cents: i64,
) -> Result<(), ValidationError> {
    validate_text("title", title, MAX_TITLE_LEN)?;
    validate_text("category", category, MAX_CATEGORY_LEN)?;
    if let Some(description) = description {
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::TooLong {
                field: "description".to_string(),
                max: MAX_DESCRIPTION_LEN,
            });
        }
    }
    validate_window("end_date", start, end)?;
    validate_price_cents(price_cents)
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::error::ErrorCode;
    use crate::services::booking_service::{BookingService, CreateBookingRequest};
    use crate::services::test_support;

    fn create_request(venue: &Venue, total: i64) -> CreateEventRequest {
        let start = Utc::now() + Duration::days(10);
        CreateEventRequest {
            venue_id: venue.id.clone(),
            title: "  Rust Meetup ".to_string(),
            description: Some("Talks and pizza".to_string()),
            category: "Tech".to_string(),
            start_date: start,
            end_date: start + Duration::hours(2),
            price_cents: 1500,
            total_tickets: total,
        }
    }

    #[tokio::test]
    async fn test_create_event() {
        let state = test_support::state().await;
        let organizer = test_support::user(&state, Role::Organizer).await;
        let venue = test_support::venue(&state, 100).await;
        let service = EventService::new(state.clone());

        let event = service.create(&organizer, create_request(&venue, 80)).await.unwrap();
        assert_eq!(event.title, "Rust Meetup");
        assert_eq!(event.category, "tech");
        assert_eq!(event.available_tickets, 80);
        assert_eq!(event.organizer_id, organizer.user_id);

        assert_eq!(service.mine(&organizer).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let state = test_support::state().await;
        let organizer = test_support::user(&state, Role::Organizer).await;
        let customer = test_support::user(&state, Role::Customer).await;
        let venue = test_support::venue(&state, 100).await;
        let service = EventService::new(state.clone());

        let err = service.create(&customer, create_request(&venue, 10)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let err = service.create(&organizer, create_request(&venue, 101)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut backwards = create_request(&venue, 10);
        backwards.end_date = backwards.start_date - Duration::hours(1);
        let err = service.create(&organizer, backwards).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut past = create_request(&venue, 10);
        past.start_date = Utc::now() - Duration::days(1);
        let err = service.create(&organizer, past).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_update_keeps_reservations() {
        let state = test_support::state().await;
        let organizer = test_support::user(&state, Role::Organizer).await;
        let customer = test_support::user(&state, Role::Customer).await;
        let venue = test_support::venue(&state, 100).await;
        let service = EventService::new(state.clone());
        let event = service.create(&organizer, create_request(&venue, 20)).await.unwrap();

        BookingService::new(state.clone())
            .create_booking(
                &customer,
                CreateBookingRequest {
                    event_id: event.id.clone(),
                    quantity: 6,
                    discount_code: None,
                },
            )
            .await
            .unwrap();

        let grown = service
            .update(
                &organizer,
                &event.id,
                UpdateEventRequest {
                    total_tickets: Some(30),
                    price_cents: Some(2000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(grown.total_tickets, 30);
        assert_eq!(grown.available_tickets, 24);
        assert_eq!(grown.price_cents, 2000);

        let err = service
            .update(
                &organizer,
                &event.id,
                UpdateEventRequest {
                    total_tickets: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_updates() {
        let state = test_support::state().await;
        let event = test_support::event(&state, 10).await;
        let other = test_support::user(&state, Role::Organizer).await;
        let admin = test_support::user(&state, Role::Admin).await;
        let service = EventService::new(state.clone());

        let rename = UpdateEventRequest {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let err = service.update(&other, &event.id, rename.clone()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let updated = service.update(&admin, &event.id, rename).await.unwrap();
        assert_eq!(updated.title, "Renamed");
    }

    #[tokio::test]
    async fn test_moderation_hides_event() {
        let state = test_support::state().await;
        let event = test_support::event(&state, 10).await;
        let admin = test_support::user(&state, Role::Admin).await;
        let customer = test_support::user(&state, Role::Customer).await;
        let service = EventService::new(state.clone());

        let err = service.set_active(&customer, &event.id, false).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let hidden = service.set_active(&admin, &event.id, false).await.unwrap();
        assert!(!hidden.is_active);

        let err = service.get(Some(&customer), &event.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(service.get(Some(&admin), &event.id).await.is_ok());

        let query = EventQuery {
            include_inactive: true,
            ..Default::default()
        };
        assert!(service.list(None, query.clone()).await.unwrap().is_empty());
        assert_eq!(service.list(Some(&admin), query).await.unwrap().len(), 1);
    }
}
