//! Service layer.
//!
//! Every operation takes the caller's [`AuthContext`](eventhub_core::AuthContext)
//! explicitly and returns [`ApiResult`](crate::error::ApiResult). Handlers
//! stay thin: extract, call one service method, serialize.

pub mod booking_service;
pub mod discount_service;
pub mod event_service;
pub mod payment_service;
pub mod report_service;
pub mod ticket_service;
pub mod user_service;
pub mod venue_service;

pub use booking_service::{BookingDetails, BookingService, CreateBookingRequest};
pub use discount_service::{CreateDiscountRequest, DiscountService};
pub use event_service::{CreateEventRequest, EventService, UpdateEventRequest};
pub use payment_service::{PaymentReceipt, PaymentService, ProcessPaymentRequest};
pub use report_service::{ReportService, RevenueReport};
pub use ticket_service::{
    CheckInResult, SweepSummary, TicketService, TicketVerification, VerifyTicketRequest,
};
pub use user_service::{RegisterUserRequest, RegisteredUser, UserService};
pub use venue_service::{CreateVenueRequest, UpdateVenueRequest, VenueService};

/// Fixtures shared by the service tests.
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, Utc};
    use tempfile::TempDir;
    use uuid::Uuid;

    use eventhub_core::{AuthContext, Discount, Event, Role, User, Venue};
    use eventhub_db::{Database, DbConfig};

    use crate::config::ApiConfig;
    use crate::payment_gateway::{MockPaymentGateway, PaymentGateway};
    use crate::state::AppState;

    pub async fn state() -> Arc<AppState> {
        state_with_gateway(MockPaymentGateway::shared()).await
    }

    pub async fn state_with_gateway(gateway: Arc<dyn PaymentGateway>) -> Arc<AppState> {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Arc::new(AppState::new(db, ApiConfig::default(), gateway))
    }

    /// State over a database file in `dir`, for tests that need several
    /// connections writing at once.
    pub async fn file_state(dir: &TempDir, gateway: Arc<dyn PaymentGateway>) -> Arc<AppState> {
        let config = DbConfig::new(dir.path().join("eventhub.db")).max_connections(16);
        let db = Database::new(config).await.unwrap();
        Arc::new(AppState::new(db, ApiConfig::default(), gateway))
    }

    pub async fn user(state: &AppState, role: Role) -> AuthContext {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let user = User {
            email: format!("{id}@example.com"),
            id,
            name: "Test User".to_string(),
            role,
            loyalty_points: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.db.users().insert(&user).await.unwrap();
        AuthContext::new(user.id, role)
    }

    pub async fn venue(state: &AppState, capacity: i64) -> Venue {
        let now = Utc::now();
        let venue = Venue {
            id: Uuid::new_v4().to_string(),
            name: "Main Hall".to_string(),
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            capacity,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.db.venues().insert(&venue).await.unwrap();
        venue
    }

    /// Inserts an active event owned by `organizer`.
    pub async fn event_for(
        state: &AppState,
        organizer: &AuthContext,
        total: i64,
        price_cents: i64,
        start: DateTime<Utc>,
    ) -> Event {
        let venue = venue(state, total.max(1)).await;
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4().to_string(),
            organizer_id: organizer.user_id.clone(),
            venue_id: venue.id,
            title: "Jazz Night".to_string(),
            description: Some("Live quartet".to_string()),
            category: "music".to_string(),
            start_date: start,
            end_date: start + Duration::hours(3),
            price_cents,
            total_tickets: total,
            available_tickets: total,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.db.events().insert(&event).await.unwrap();
        event
    }

    /// Inserts a $25 event a week out with a fresh organizer.
    pub async fn event(state: &AppState, total: i64) -> Event {
        let organizer = user(state, Role::Organizer).await;
        event_for(state, &organizer, total, 2500, Utc::now() + Duration::days(7)).await
    }

    pub async fn discount(state: &AppState, code: &str, bps: i64, max_uses: Option<i64>) -> Discount {
        let now = Utc::now();
        let discount = Discount {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            percentage_bps: bps,
            event_id: None,
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            max_uses,
            times_used: 0,
            is_active: true,
            created_at: now,
        };
        state.db.discounts().insert(&discount).await.unwrap();
        discount
    }
}
