//! Ticket listing, QR images, door verification and expiry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use eventhub_core::validation::validate_ticket_number;
use eventhub_core::{AuthContext, CoreError, Role, Ticket, TicketStatus};
use eventhub_db::{BookingRepository, DbError, EventRepository, TicketRepository};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::AppState;

/// Body of `POST /tickets/verify` and `POST /tickets/check-in`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyTicketRequest {
    /// Raw string scanned from the QR code.
    pub payload: String,
}

/// Outcome of verifying a scanned payload.
#[derive(Debug, Clone, Serialize)]
pub struct TicketVerification {
    pub ticket: Ticket,
    pub event_title: String,
    /// Only Active tickets admit entry.
    pub valid_for_entry: bool,
}

/// Outcome of a door check-in.
#[derive(Debug, Clone, Serialize)]
pub struct CheckInResult {
    pub ticket: Ticket,
    pub event_title: String,
}

/// Counts from one expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub tickets_expired: u64,
    pub bookings_completed: u64,
    pub bookings_cancelled: u64,
    pub events_released: u64,
}

impl SweepSummary {
    pub fn is_empty(&self) -> bool {
        *self == SweepSummary::default()
    }
}

/// Ticket service.
pub struct TicketService {
    state: Arc<AppState>,
}

impl TicketService {
    pub fn new(state: Arc<AppState>) -> Self {
        TicketService { state }
    }

    /// Lists the caller's tickets, newest first.
    pub async fn my_tickets(&self, ctx: &AuthContext) -> ApiResult<Vec<Ticket>> {
        Ok(self.state.db.tickets().list_by_customer(&ctx.user_id).await?)
    }

    /// Renders a ticket's QR payload as SVG for its holder.
    pub async fn qr_svg(&self, ctx: &AuthContext, ticket_number: &str) -> ApiResult<String> {
        let ticket = self.load(ticket_number).await?;
        ctx.require_owner_or_admin(&ticket.customer_id)?;

        self.state.qr_codes.render_svg(&ticket.qr_payload)
    }

    /// Verifies a scanned payload against the issued ticket.
    ///
    /// ## Checks
    /// 1. Caller is the event's organizer or an admin
    /// 2. Signature and field shape (`QrSigner::verify`)
    /// 3. Ticket exists and the payload is exactly the one issued
    pub async fn verify(&self, ctx: &AuthContext, payload: &str) -> ApiResult<TicketVerification> {
        ctx.require_role(&[Role::Organizer, Role::Admin])?;

        let decoded = self
            .state
            .qr_signer
            .verify(payload, Utc::now())
            .map_err(CoreError::from)?;

        let ticket = self.load(&decoded.ticket_number).await?;
        if ticket.qr_payload != payload.trim()
            || ticket.booking_id != decoded.booking_id
            || ticket.event_id != decoded.event_id
        {
            return Err(ApiError::new(
                ErrorCode::InvalidTicket,
                "Payload does not match the issued ticket",
            ));
        }

        let event = self
            .state
            .db
            .events()
            .get_by_id(&ticket.event_id)
            .await?
            .ok_or_else(|| CoreError::EventNotFound(ticket.event_id.clone()))?;
        if !ctx.is_admin() && event.organizer_id != ctx.user_id {
            return Err(CoreError::forbidden("ticket is for another organizer's event").into());
        }

        debug!(ticket_number = %ticket.ticket_number, status = ?ticket.status, "Ticket verified");

        Ok(TicketVerification {
            valid_for_entry: ticket.status == TicketStatus::Active,
            ticket,
            event_title: event.title,
        })
    }

    /// Verifies a payload and marks the ticket Used.
    pub async fn check_in(&self, ctx: &AuthContext, payload: &str) -> ApiResult<CheckInResult> {
        let verification = self.verify(ctx, payload).await?;
        let ticket = verification.ticket;

        if ticket.status != TicketStatus::Active {
            return Err(ticket_status(&ticket));
        }

        if !self
            .state
            .db
            .tickets()
            .mark_used(&ticket.ticket_number, Utc::now())
            .await?
        {
            // Scanned twice at once
            let current = self.load(&ticket.ticket_number).await?;
            return Err(ticket_status(&current));
        }

        let ticket = self.load(&ticket.ticket_number).await?;
        info!(
            ticket_number = %ticket.ticket_number,
            event_id = %ticket.event_id,
            checked_in_by = %ctx.user_id,
            "Ticket checked in"
        );

        Ok(CheckInResult {
            ticket,
            event_title: verification.event_title,
        })
    }

    /// Closes out events whose end date has passed by `now`.
    ///
    /// Pending bookings are cancelled and their seats released, Confirmed
    /// bookings become Completed, unused Active tickets become Expired. Runs
    /// in one transaction; repeated runs are no-ops.
    pub async fn expire_ended_events(&self, now: DateTime<Utc>) -> ApiResult<SweepSummary> {
        let mut tx = self.state.db.begin().await?;

        // Seats first, while the bookings are still Pending
        let events_released = EventRepository::release_pending_for_ended(&mut tx, now).await?;
        let bookings_cancelled = BookingRepository::cancel_pending_for_ended(&mut tx, now).await?;
        let bookings_completed = BookingRepository::complete_confirmed_for_ended(&mut tx, now).await?;
        let tickets_expired = TicketRepository::expire_for_ended(&mut tx, now).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let summary = SweepSummary {
            tickets_expired,
            bookings_completed,
            bookings_cancelled,
            events_released,
        };

        if !summary.is_empty() {
            info!(
                tickets_expired,
                bookings_completed,
                bookings_cancelled,
                events_released,
                "Expired ended events"
            );
        }

        Ok(summary)
    }

    async fn load(&self, ticket_number: &str) -> ApiResult<Ticket> {
        validate_ticket_number(ticket_number)?;
        self.state
            .db
            .tickets()
            .get_by_number(ticket_number)
            .await?
            .ok_or_else(|| CoreError::TicketNotFound(ticket_number.to_string()).into())
    }
}

fn ticket_status(ticket: &Ticket) -> ApiError {
    CoreError::InvalidTicketStatus {
        ticket_number: ticket.ticket_number.clone(),
        current_status: format!("{:?}", ticket.status),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use eventhub_core::{Booking, BookingStatus, Event, PaymentMethod};

    use crate::services::booking_service::{BookingService, CreateBookingRequest};
    use crate::services::payment_service::{PaymentService, ProcessPaymentRequest};
    use crate::services::test_support;

    async fn book(state: &Arc<AppState>, ctx: &AuthContext, event: &Event, quantity: i64) -> Booking {
        BookingService::new(state.clone())
            .create_booking(
                ctx,
                CreateBookingRequest {
                    event_id: event.id.clone(),
                    quantity,
                    discount_code: None,
                },
            )
            .await
            .unwrap()
    }

    async fn purchase(
        state: &Arc<AppState>,
        ctx: &AuthContext,
        event: &Event,
        quantity: i64,
    ) -> Vec<Ticket> {
        let booking = book(state, ctx, event, quantity).await;
        PaymentService::new(state.clone())
            .process_payment(
                ctx,
                ProcessPaymentRequest {
                    booking_id: booking.id.clone(),
                    method: PaymentMethod::DebitCard,
                    amount_cents: booking.total_cents,
                },
            )
            .await
            .unwrap()
            .tickets
    }

    #[tokio::test]
    async fn test_verify_and_check_in_once() {
        let state = test_support::state().await;
        let organizer = test_support::user(&state, Role::Organizer).await;
        let event =
            test_support::event_for(&state, &organizer, 10, 2500, Utc::now() + Duration::days(2))
                .await;
        let customer = test_support::user(&state, Role::Customer).await;
        let tickets = purchase(&state, &customer, &event, 1).await;
        let payload = &tickets[0].qr_payload;
        let service = TicketService::new(state.clone());

        let verification = service.verify(&organizer, payload).await.unwrap();
        assert!(verification.valid_for_entry);
        assert_eq!(verification.event_title, "Jazz Night");

        let result = service.check_in(&organizer, payload).await.unwrap();
        assert_eq!(result.ticket.status, TicketStatus::Used);
        assert!(result.ticket.used_at.is_some());

        let err = service.check_in(&organizer, payload).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTicketStatus);
        assert!(!service.verify(&organizer, payload).await.unwrap().valid_for_entry);
    }

    #[tokio::test]
    async fn test_tampered_payload_rejected() {
        let state = test_support::state().await;
        let organizer = test_support::user(&state, Role::Organizer).await;
        let event =
            test_support::event_for(&state, &organizer, 10, 2500, Utc::now() + Duration::days(2))
                .await;
        let customer = test_support::user(&state, Role::Customer).await;
        let tickets = purchase(&state, &customer, &event, 2).await;
        let service = TicketService::new(state.clone());

        // Swap in the other ticket's number, keep the signature
        let forged = tickets[0]
            .qr_payload
            .replace(&tickets[0].ticket_number, &tickets[1].ticket_number);
        let err = service.verify(&organizer, &forged).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTicket);

        let mut bad_sig = tickets[0].qr_payload.clone();
        let last = bad_sig.pop();
        bad_sig.push(if last == Some('A') { 'E' } else { 'A' });
        let err = service.verify(&organizer, &bad_sig).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTicket);

        let err = service.verify(&organizer, "not a ticket").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTicket);
    }

    #[tokio::test]
    async fn test_only_event_staff_may_verify() {
        let state = test_support::state().await;
        let organizer = test_support::user(&state, Role::Organizer).await;
        let other_organizer = test_support::user(&state, Role::Organizer).await;
        let admin = test_support::user(&state, Role::Admin).await;
        let event =
            test_support::event_for(&state, &organizer, 10, 2500, Utc::now() + Duration::days(2))
                .await;
        let customer = test_support::user(&state, Role::Customer).await;
        let tickets = purchase(&state, &customer, &event, 1).await;
        let payload = &tickets[0].qr_payload;
        let service = TicketService::new(state.clone());

        assert_eq!(
            service.verify(&customer, payload).await.unwrap_err().code,
            ErrorCode::Forbidden
        );
        assert_eq!(
            service.verify(&other_organizer, payload).await.unwrap_err().code,
            ErrorCode::Forbidden
        );
        assert!(service.verify(&admin, payload).await.is_ok());
    }

    #[tokio::test]
    async fn test_qr_image_for_holder_only() {
        let state = test_support::state().await;
        let event = test_support::event(&state, 10).await;
        let customer = test_support::user(&state, Role::Customer).await;
        let stranger = test_support::user(&state, Role::Customer).await;
        let tickets = purchase(&state, &customer, &event, 1).await;
        let service = TicketService::new(state.clone());

        let svg = service.qr_svg(&customer, &tickets[0].ticket_number).await.unwrap();
        assert!(svg.contains("<svg"));

        let err = service.qr_svg(&stranger, &tickets[0].ticket_number).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        assert_eq!(service.my_tickets(&customer).await.unwrap().len(), 1);
        assert!(service.my_tickets(&stranger).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expiry_sweep() {
        let state = test_support::state().await;
        let organizer = test_support::user(&state, Role::Organizer).await;
        let event =
            test_support::event_for(&state, &organizer, 10, 2500, Utc::now() + Duration::days(1))
                .await;
        let customer = test_support::user(&state, Role::Customer).await;
        purchase(&state, &customer, &event, 2).await;
        let pending = book(&state, &customer, &event, 3).await;
        let service = TicketService::new(state.clone());

        assert!(service.expire_ended_events(Utc::now()).await.unwrap().is_empty());

        let after_end = event.end_date + Duration::minutes(1);
        let summary = service.expire_ended_events(after_end).await.unwrap();
        assert_eq!(
            summary,
            SweepSummary {
                tickets_expired: 2,
                bookings_completed: 1,
                bookings_cancelled: 1,
                events_released: 1,
            }
        );

        let stored = state.db.events().get_by_id(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.available_tickets, 8);
        let booking = state.db.bookings().get_by_id(&pending.id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);

        assert!(service.expire_ended_events(after_end).await.unwrap().is_empty());
    }
}
