//! Payment capture, ticket issuance and refunds.
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          process_payment                                │
//! │                                                                         │
//! │  checks: owner • Pending • amount == total                              │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  gateway.charge ──── declined ───► payment Failed, booking stays Pending│
//! │      │                                                                  │
//! │      ▼ approved                                                         │
//! │  BEGIN                                                                  │
//! │    booking Pending → Confirmed (CAS)                                    │
//! │    payment upsert Completed                                             │
//! │    N tickets with signed QR payloads                                    │
//! │    loyalty += total / 100                                               │
//! │  COMMIT ──── any failure ───► gateway.refund (compensation)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Gateway calls never run while a transaction is open.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use eventhub_core::validation::{validate_payment_amount, validate_uuid};
use eventhub_core::{
    AuthContext, Booking, BookingStatus, CoreError, Money, Payment, PaymentMethod, PaymentStatus,
    Ticket, TicketPayload, TicketStatus,
};
use eventhub_db::repository::payment::generate_payment_id;
use eventhub_db::repository::ticket::{
    generate_ticket_id, generate_ticket_number, MAX_TICKET_NUMBER_ATTEMPTS,
};
use eventhub_db::{
    BookingRepository, DbError, DbTransaction, EventRepository, PaymentRepository,
    TicketRepository, UserRepository,
};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::payment_gateway::GatewayError;
use crate::state::AppState;

/// Body of `POST /payments`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessPaymentRequest {
    pub booking_id: String,
    pub method: PaymentMethod,
    /// Must equal the booking total.
    pub amount_cents: i64,
}

/// Result of a successful payment.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub booking: Booking,
    pub payment: Payment,
    pub tickets: Vec<Ticket>,
    pub loyalty_points_earned: i64,
}

/// Payment workflow service.
pub struct PaymentService {
    state: Arc<AppState>,
}

impl PaymentService {
    pub fn new(state: Arc<AppState>) -> Self {
        PaymentService { state }
    }

    /// Charges a Pending booking and issues its tickets.
    ///
    /// ## Errors
    /// * `Forbidden` - The booking belongs to someone else
    /// * `InvalidBookingStatus` - Booking is not Pending
    /// * `PaymentAmountMismatch` - Amount differs from the booking total
    /// * `EventNotBookable` - Event ended or was deactivated since booking
    /// * `PaymentDeclined` - Gateway refused; a Failed payment is recorded
    /// * `PaymentError` - Gateway unreachable
    pub async fn process_payment(
        &self,
        ctx: &AuthContext,
        req: ProcessPaymentRequest,
    ) -> ApiResult<PaymentReceipt> {
        validate_uuid(&req.booking_id)?;
        validate_payment_amount(req.amount_cents)?;

        let booking = self.load(&req.booking_id).await?;
        if !booking.is_owned_by(&ctx.user_id) {
            return Err(CoreError::forbidden("booking belongs to another user").into());
        }

        if booking.status != BookingStatus::Pending {
            return Err(CoreError::booking_status(&booking.id, booking.status).into());
        }

        if req.amount_cents != booking.total_cents {
            return Err(CoreError::PaymentAmountMismatch {
                expected: booking.total_cents,
                provided: req.amount_cents,
            }
            .into());
        }

        let event = self
            .state
            .db
            .events()
            .get_by_id(&booking.event_id)
            .await?
            .ok_or_else(|| CoreError::EventNotFound(booking.event_id.clone()))?;
        let now = Utc::now();
        if event.has_ended(now) {
            return Err(CoreError::EventNotBookable {
                event_id: event.id,
                reason: "event has already ended".to_string(),
            }
            .into());
        }
        if !event.is_active {
            return Err(CoreError::EventNotBookable {
                event_id: event.id,
                reason: "event has been taken off sale".to_string(),
            }
            .into());
        }

        let amount = booking.total();

        // Free bookings (100% discount) never reach the gateway
        let transaction_reference = if amount.is_zero() {
            None
        } else {
            match self.state.gateway.charge(&booking.reference, amount, req.method).await {
                Ok(receipt) => Some(receipt.transaction_id),
                Err(e) => return Err(self.record_failure(&booking, req.method, e).await),
            }
        };

        match self
            .settle(&booking, req.method, transaction_reference.clone(), now)
            .await
        {
            Ok(receipt) => {
                info!(
                    booking_id = %booking.id,
                    reference = %booking.reference,
                    amount_cents = amount.cents(),
                    tickets = receipt.tickets.len(),
                    loyalty_points = receipt.loyalty_points_earned,
                    "Payment completed"
                );
                Ok(receipt)
            }
            Err(err) => {
                if let Some(txn) = &transaction_reference {
                    self.compensate(&booking, txn, amount).await;
                }
                Err(err)
            }
        }
    }

    /// Refunds a Confirmed booking (admin only).
    ///
    /// Cancels the tickets, returns inventory and takes back the loyalty
    /// points earned. The payment is claimed as Refunded first, the gateway
    /// is called with no transaction open, and the booking is reversed in a
    /// short transaction afterwards. A refused gateway refund puts the
    /// payment back to Completed and leaves the booking untouched.
    pub async fn refund_booking(&self, ctx: &AuthContext, booking_id: &str) -> ApiResult<Booking> {
        ctx.require_admin()?;

        let booking = self.load(booking_id).await?;
        if booking.status != BookingStatus::Confirmed {
            return Err(CoreError::booking_status(&booking.id, booking.status).into());
        }

        let db = &self.state.db;
        let payment = db
            .payments()
            .get_by_booking(&booking.id)
            .await?
            .filter(|p| p.status == PaymentStatus::Completed)
            .ok_or_else(|| {
                ApiError::new(ErrorCode::Conflict, "Booking has no completed payment to refund")
            })?;

        let tickets = db.tickets().list_by_booking(&booking.id).await?;
        if let Some(used) = tickets.iter().find(|t| t.status == TicketStatus::Used) {
            return Err(CoreError::InvalidTicketStatus {
                ticket_number: used.ticket_number.clone(),
                current_status: format!("{:?}", used.status),
            }
            .into());
        }

        if !db.payments().claim_refund(&booking.id).await? {
            return Err(ApiError::new(
                ErrorCode::Conflict,
                "Booking is already being refunded",
            ));
        }

        if let Some(txn) = &payment.transaction_reference {
            if let Err(e) = self.state.gateway.refund(txn, payment.amount()).await {
                warn!(booking_id = %booking.id, error = %e, "Gateway refund failed");
                if let Err(restore) = db.payments().restore_completed(&booking.id).await {
                    error!(
                        booking_id = %booking.id,
                        error = %restore,
                        "Payment left Refunded after a failed gateway refund; manual reconciliation required"
                    );
                }
                return Err(ApiError::new(
                    ErrorCode::PaymentError,
                    format!("Refund failed: {}", e),
                ));
            }
        }

        let cancelled = match self.reverse_booking(&booking, &payment).await {
            Ok(cancelled) => cancelled,
            Err(e) => {
                error!(
                    booking_id = %booking.id,
                    error = %e.message,
                    "Refund sent to gateway but booking not reversed; manual reconciliation required"
                );
                return Err(e);
            }
        };

        info!(
            booking_id = %booking.id,
            refunded_cents = payment.amount_cents,
            tickets_cancelled = cancelled,
            refunded_by = %ctx.user_id,
            "Booking refunded"
        );

        self.load(&booking.id).await
    }

    /// Cancels a refunded booking with its tickets, seats and loyalty credit.
    async fn reverse_booking(&self, booking: &Booking, payment: &Payment) -> ApiResult<u64> {
        let mut tx = self.state.db.begin().await?;

        if !BookingRepository::transition(
            &mut tx,
            &booking.id,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
        )
        .await?
        {
            drop(tx);
            let current = self.load(&booking.id).await?;
            return Err(CoreError::booking_status(&current.id, current.status).into());
        }

        let cancelled = TicketRepository::cancel_for_booking(&mut tx, &booking.id).await?;
        EventRepository::release_tickets(&mut tx, &booking.event_id, booking.quantity).await?;

        let points = payment.amount().loyalty_points();
        if points > 0 {
            UserRepository::deduct_loyalty_points(&mut tx, &booking.customer_id, points).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(cancelled)
    }

    /// Records the confirmed payment, tickets and loyalty credit atomically.
    async fn settle(
        &self,
        booking: &Booking,
        method: PaymentMethod,
        transaction_reference: Option<String>,
        now: DateTime<Utc>,
    ) -> ApiResult<PaymentReceipt> {
        let db = &self.state.db;
        let mut tx = db.begin().await?;

        if !BookingRepository::transition(
            &mut tx,
            &booking.id,
            BookingStatus::Pending,
            BookingStatus::Confirmed,
        )
        .await?
        {
            // Cancelled or paid by a concurrent request
            drop(tx);
            let current = self.load(&booking.id).await?;
            return Err(CoreError::booking_status(&current.id, current.status).into());
        }

        let payment = Payment {
            id: generate_payment_id(),
            booking_id: booking.id.clone(),
            amount_cents: booking.total_cents,
            method,
            status: PaymentStatus::Completed,
            transaction_reference,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };
        let payment = PaymentRepository::upsert(&mut tx, &payment)
            .await?
            .ok_or_else(|| ApiError::new(ErrorCode::Conflict, "Booking is already paid"))?;

        let mut tickets = Vec::with_capacity(booking.quantity as usize);
        let mut next_number = generate_ticket_number;
        for _ in 0..booking.quantity {
            tickets.push(self.issue_ticket(&mut tx, booking, now, &mut next_number).await?);
        }

        let loyalty_points_earned = Money::from_cents(booking.total_cents).loyalty_points();
        if loyalty_points_earned > 0 {
            UserRepository::add_loyalty_points(&mut tx, &booking.customer_id, loyalty_points_earned)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let booking = self.load(&booking.id).await?;

        Ok(PaymentReceipt {
            booking,
            payment,
            tickets,
            loyalty_points_earned,
        })
    }

    /// Signs and stores one ticket, drawing another number while the
    /// current one is taken.
    async fn issue_ticket(
        &self,
        tx: &mut DbTransaction<'_>,
        booking: &Booking,
        now: DateTime<Utc>,
        next_number: &mut impl FnMut() -> String,
    ) -> ApiResult<Ticket> {
        let mut attempt = 1;
        loop {
            let ticket_number = next_number();
            let payload = TicketPayload::new(&ticket_number, &booking.id, &booking.event_id, now);
            let qr_payload = self
                .state
                .qr_signer
                .encode(&payload)
                .map_err(CoreError::from)?;

            let ticket = Ticket {
                id: generate_ticket_id(),
                ticket_number,
                booking_id: booking.id.clone(),
                event_id: booking.event_id.clone(),
                customer_id: booking.customer_id.clone(),
                qr_payload,
                status: TicketStatus::Active,
                issued_at: now,
                used_at: None,
            };

            match TicketRepository::insert(&mut **tx, &ticket).await {
                Ok(()) => return Ok(ticket),
                Err(e)
                    if e.is_unique_violation_on("tickets.ticket_number")
                        && attempt < MAX_TICKET_NUMBER_ATTEMPTS =>
                {
                    warn!(ticket_number = %ticket.ticket_number, attempt, "Ticket number taken, drawing another");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Stores a Failed payment for a refused charge and maps the error.
    async fn record_failure(
        &self,
        booking: &Booking,
        method: PaymentMethod,
        err: GatewayError,
    ) -> ApiError {
        warn!(
            booking_id = %booking.id,
            reference = %booking.reference,
            error = %err,
            "Payment failed at gateway"
        );

        let now = Utc::now();
        let payment = Payment {
            id: generate_payment_id(),
            booking_id: booking.id.clone(),
            amount_cents: booking.total_cents,
            method,
            status: PaymentStatus::Failed,
            transaction_reference: None,
            failure_reason: Some(err.to_string()),
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = self.state.db.payments().record(&payment).await {
            return e.into();
        }

        match err {
            GatewayError::Declined { reason } => CoreError::PaymentDeclined { reason }.into(),
            other => ApiError::new(
                ErrorCode::PaymentError,
                format!("Payment could not be processed: {}", other),
            ),
        }
    }

    /// Refunds a charge whose booking could not be confirmed.
    async fn compensate(&self, booking: &Booking, transaction_id: &str, amount: Money) {
        warn!(
            booking_id = %booking.id,
            transaction_id = %transaction_id,
            "Confirming booking failed after charge, refunding"
        );

        if let Err(e) = self.state.gateway.refund(transaction_id, amount).await {
            error!(
                booking_id = %booking.id,
                transaction_id = %transaction_id,
                amount_cents = amount.cents(),
                error = %e,
                "Compensating refund failed; manual reconciliation required"
            );
        }
    }

    async fn load(&self, booking_id: &str) -> ApiResult<Booking> {
        self.state
            .db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| CoreError::BookingNotFound(booking_id.to_string()).into())
    }
}
