//! Booking creation, cancellation and lookup.
//!
//! ## Inventory Flow
//! ```text
//! create_booking                      cancel_booking
//! ──────────────                      ──────────────
//! BEGIN                               BEGIN
//!   reserve_tickets  (CAS on qty)       transition Pending → Cancelled (CAS)
//!   consume_use      (CAS on uses)      release_tickets (+qty)
//!   INSERT booking (Pending)          COMMIT
//! COMMIT
//! ```
//! Any failed step drops the transaction, which rolls back every earlier
//! step. Discount uses are not returned on cancellation.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use eventhub_core::pricing::quote_booking;
use eventhub_core::validation::{validate_discount_code, validate_quantity, validate_uuid};
use eventhub_core::{
    AuthContext, Booking, BookingStatus, CoreError, Discount, Payment, Role, Ticket,
};
use eventhub_db::repository::booking::{generate_booking_id, generate_booking_reference};
use eventhub_db::{BookingRepository, DbError, DiscountRepository, EventRepository};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Body of `POST /bookings`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub event_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub discount_code: Option<String>,
}

/// A booking with its payment and issued tickets.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    pub booking: Booking,
    pub payment: Option<Payment>,
    pub tickets: Vec<Ticket>,
}

/// Booking workflow service.
pub struct BookingService {
    state: Arc<AppState>,
}

impl BookingService {
    pub fn new(state: Arc<AppState>) -> Self {
        BookingService { state }
    }

    /// Reserves tickets and creates a Pending booking.
    ///
    /// ## Errors
    /// * `Forbidden` - Caller is not an active customer
    /// * `EventNotFound` / `EventNotBookable` - Unknown, inactive or started event
    /// * `InsufficientInventory` - Fewer tickets left than requested
    /// * `DiscountUnavailable` - Code unknown, expired, exhausted or scoped elsewhere
    pub async fn create_booking(
        &self,
        ctx: &AuthContext,
        req: CreateBookingRequest,
    ) -> ApiResult<Booking> {
        ctx.require_role(&[Role::Customer])?;
        validate_uuid(&req.event_id)?;
        validate_quantity(req.quantity)?;

        let db = &self.state.db;

        let customer = db
            .users()
            .get_by_id(&ctx.user_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(ctx.user_id.clone()))?;
        if !customer.is_active {
            return Err(CoreError::forbidden("account is deactivated").into());
        }

        let event = db
            .events()
            .get_by_id(&req.event_id)
            .await?
            .ok_or_else(|| CoreError::EventNotFound(req.event_id.clone()))?;

        let discount = match req.discount_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => Some(self.lookup_discount(code).await?),
            _ => None,
        };

        let now = Utc::now();
        let quote = quote_booking(&event, req.quantity, discount.as_ref(), now)?;

        let mut tx = db.begin().await?;

        if !EventRepository::reserve_tickets(&mut tx, &event.id, quote.quantity).await? {
            drop(tx);
            return Err(self.reservation_failure(&event.id, quote.quantity).await);
        }

        if let Some(code) = &quote.discount_code {
            if !DiscountRepository::consume_use(&mut tx, code, now).await? {
                drop(tx);
                warn!(code = %code, event_id = %event.id, "Discount exhausted during booking");
                return Err(CoreError::DiscountUnavailable {
                    code: code.clone(),
                    reason: "code has been fully redeemed".to_string(),
                }
                .into());
            }
        }

        let mut booking = Booking {
            id: generate_booking_id(),
            reference: generate_booking_reference(),
            event_id: event.id.clone(),
            customer_id: ctx.user_id.clone(),
            quantity: quote.quantity,
            subtotal_cents: quote.subtotal_cents,
            discount_cents: quote.discount_cents,
            total_cents: quote.total_cents,
            discount_code: quote.discount_code.clone(),
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        };
        BookingRepository::insert_with_unique_reference(
            &mut tx,
            &mut booking,
            generate_booking_reference,
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            event_id = %booking.event_id,
            quantity = booking.quantity,
            total_cents = booking.total_cents,
            "Booking created"
        );

        Ok(booking)
    }

    /// Cancels a Pending booking and returns its tickets to the event.
    pub async fn cancel_booking(&self, ctx: &AuthContext, booking_id: &str) -> ApiResult<Booking> {
        let booking = self.load(booking_id).await?;
        ctx.require_owner_or_admin(&booking.customer_id)?;

        if booking.status != BookingStatus::Pending {
            return Err(CoreError::booking_status(&booking.id, booking.status).into());
        }

        let db = &self.state.db;
        let mut tx = db.begin().await?;

        if !BookingRepository::transition(
            &mut tx,
            &booking.id,
            BookingStatus::Pending,
            BookingStatus::Cancelled,
        )
        .await?
        {
            // Paid or cancelled concurrently
            drop(tx);
            let current = self.load(&booking.id).await?;
            return Err(CoreError::booking_status(&current.id, current.status).into());
        }

        EventRepository::release_tickets(&mut tx, &booking.event_id, booking.quantity).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            booking_id = %booking.id,
            event_id = %booking.event_id,
            released = booking.quantity,
            cancelled_by = %ctx.user_id,
            "Booking cancelled"
        );

        self.load(&booking.id).await
    }

    /// Gets a booking with its payment and tickets.
    pub async fn get_booking(&self, ctx: &AuthContext, booking_id: &str) -> ApiResult<BookingDetails> {
        let booking = self.load(booking_id).await?;
        ctx.require_owner_or_admin(&booking.customer_id)?;

        let db = &self.state.db;
        let payment = db.payments().get_by_booking(&booking.id).await?;
        let tickets = db.tickets().list_by_booking(&booking.id).await?;

        Ok(BookingDetails {
            booking,
            payment,
            tickets,
        })
    }

    /// Lists the caller's bookings, newest first.
    pub async fn my_bookings(&self, ctx: &AuthContext) -> ApiResult<Vec<Booking>> {
        Ok(self.state.db.bookings().list_by_customer(&ctx.user_id).await?)
    }

    async fn load(&self, booking_id: &str) -> ApiResult<Booking> {
        validate_uuid(booking_id)?;
        self.state
            .db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| CoreError::BookingNotFound(booking_id.to_string()).into())
    }

    async fn lookup_discount(&self, code: &str) -> ApiResult<Discount> {
        let code = code.to_uppercase();
        validate_discount_code(&code)?;

        self.state
            .db
            .discounts()
            .get_by_code(&code)
            .await?
            .ok_or_else(|| {
                CoreError::DiscountUnavailable {
                    code,
                    reason: "unknown code".to_string(),
                }
                .into()
            })
    }

    /// Explains why a reservation matched no row, from a fresh read.
    async fn reservation_failure(&self, event_id: &str, requested: i64) -> ApiError {
        let event = match self.state.db.events().get_by_id(event_id).await {
            Ok(Some(event)) => event,
            Ok(None) => return CoreError::EventNotFound(event_id.to_string()).into(),
            Err(e) => return e.into(),
        };

        if let Err(e) = event.ensure_bookable(Utc::now()) {
            return e.into();
        }

        warn!(
            event_id = %event_id,
            available = event.available_tickets,
            requested,
            "Reservation lost to a concurrent booking"
        );

        CoreError::InsufficientInventory {
            event_id: event_id.to_string(),
            available: event.available_tickets,
            requested,
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::payment_gateway::MockPaymentGateway;
    use crate::services::test_support;

    fn request(event_id: &str, quantity: i64) -> CreateBookingRequest {
        CreateBookingRequest {
            event_id: event_id.to_string(),
            quantity,
            discount_code: None,
        }
    }

    async fn available(state: &AppState, event_id: &str) -> i64 {
        state
            .db
            .events()
            .get_by_id(event_id)
            .await
            .unwrap()
            .unwrap()
            .available_tickets
    }

    #[tokio::test]
    async fn test_sell_out_then_reject() {
        let state = test_support::state().await;
        let event = test_support::event(&state, 5).await;
        let alice = test_support::user(&state, Role::Customer).await;
        let bob = test_support::user(&state, Role::Customer).await;
        let service = BookingService::new(state.clone());

        let booking = service.create_booking(&alice, request(&event.id, 5)).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.total_cents, 12_500);
        assert!(booking.reference.starts_with("BK-"));
        assert_eq!(available(&state, &event.id).await, 0);

        let err = service.create_booking(&bob, request(&event.id, 1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientInventory);
        assert_eq!(available(&state, &event.id).await, 0);
    }

    #[tokio::test]
    async fn test_cancel_restores_inventory_once() {
        let state = test_support::state().await;
        let event = test_support::event(&state, 10).await;
        let customer = test_support::user(&state, Role::Customer).await;
        let service = BookingService::new(state.clone());

        let booking = service.create_booking(&customer, request(&event.id, 3)).await.unwrap();
        assert_eq!(available(&state, &event.id).await, 7);

        let cancelled = service.cancel_booking(&customer, &booking.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(available(&state, &event.id).await, 10);

        let err = service.cancel_booking(&customer, &booking.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidBookingStatus);
        assert_eq!(available(&state, &event.id).await, 10);
    }

    #[tokio::test]
    async fn test_only_customers_book_and_only_owners_cancel() {
        let state = test_support::state().await;
        let event = test_support::event(&state, 10).await;
        let organizer = test_support::user(&state, Role::Organizer).await;
        let owner = test_support::user(&state, Role::Customer).await;
        let stranger = test_support::user(&state, Role::Customer).await;
        let admin = test_support::user(&state, Role::Admin).await;
        let service = BookingService::new(state.clone());

        let err = service.create_booking(&organizer, request(&event.id, 1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let booking = service.create_booking(&owner, request(&event.id, 2)).await.unwrap();
        let err = service.cancel_booking(&stranger, &booking.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let err = service.get_booking(&stranger, &booking.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        service.cancel_booking(&admin, &booking.id).await.unwrap();
        assert_eq!(available(&state, &event.id).await, 10);
    }

    #[tokio::test]
    async fn test_discount_applied_and_consumed() {
        let state = test_support::state().await;
        let event = test_support::event(&state, 10).await;
        test_support::discount(&state, "ONCE", 2000, Some(1)).await;
        let alice = test_support::user(&state, Role::Customer).await;
        let bob = test_support::user(&state, Role::Customer).await;
        let service = BookingService::new(state.clone());

        let mut req = request(&event.id, 2);
        req.discount_code = Some("once".to_string());
        let booking = service.create_booking(&alice, req.clone()).await.unwrap();
        assert_eq!(booking.subtotal_cents, 5000);
        assert_eq!(booking.discount_cents, 1000);
        assert_eq!(booking.total_cents, 4000);
        assert_eq!(booking.discount_code.as_deref(), Some("ONCE"));

        let err = service.create_booking(&bob, req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountUnavailable);
        assert_eq!(available(&state, &event.id).await, 8);
    }

    #[tokio::test]
    async fn test_unknown_discount_rejected() {
        let state = test_support::state().await;
        let event = test_support::event(&state, 10).await;
        let customer = test_support::user(&state, Role::Customer).await;

        let mut req = request(&event.id, 1);
        req.discount_code = Some("NOPE".to_string());
        let err = BookingService::new(state.clone())
            .create_booking(&customer, req)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::DiscountUnavailable);
        assert_eq!(available(&state, &event.id).await, 10);
    }

    #[tokio::test]
    async fn test_inactive_event_not_bookable() {
        let state = test_support::state().await;
        let event = test_support::event(&state, 10).await;
        state.db.events().set_active(&event.id, false).await.unwrap();
        let customer = test_support::user(&state, Role::Customer).await;

        let err = BookingService::new(state)
            .create_booking(&customer, request(&event.id, 1))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EventNotBookable);
    }

    #[tokio::test]
    async fn test_quantity_bounds() {
        let state = test_support::state().await;
        let event = test_support::event(&state, 50).await;
        let customer = test_support::user(&state, Role::Customer).await;
        let service = BookingService::new(state);

        for qty in [0, -1, eventhub_core::MAX_TICKETS_PER_BOOKING + 1] {
            let err = service.create_booking(&customer, request(&event.id, qty)).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationError);
        }
    }

    #[tokio::test]
    async fn test_details_and_listing() {
        let state = test_support::state().await;
        let event = test_support::event(&state, 10).await;
        let customer = test_support::user(&state, Role::Customer).await;
        let service = BookingService::new(state);

        let first = service.create_booking(&customer, request(&event.id, 1)).await.unwrap();
        service.create_booking(&customer, request(&event.id, 2)).await.unwrap();

        let details = service.get_booking(&customer, &first.id).await.unwrap();
        assert_eq!(details.booking.id, first.id);
        assert!(details.payment.is_none());
        assert!(details.tickets.is_empty());

        assert_eq!(service.my_bookings(&customer).await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_customers_racing_for_last_ticket() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_support::file_state(&dir, MockPaymentGateway::shared()).await;
        let event = test_support::event(&state, 1).await;

        let mut racers = Vec::new();
        for _ in 0..12 {
            let customer = test_support::user(&state, Role::Customer).await;
            let state = state.clone();
            let event_id = event.id.clone();
            racers.push(tokio::spawn(async move {
                BookingService::new(state)
                    .create_booking(&customer, request(&event_id, 1))
                    .await
            }));
        }

        let mut won = 0;
        for racer in racers {
            match racer.await.unwrap() {
                Ok(_) => won += 1,
                Err(e) => assert_eq!(e.code, ErrorCode::InsufficientInventory),
            }
        }

        assert_eq!(won, 1);
        assert_eq!(available(&state, &event.id).await, 0);
        assert_eq!(
            state
                .db
                .bookings()
                .count_for_event(&event.id, BookingStatus::Pending)
                .await
                .unwrap(),
            1
        );
    }
}
