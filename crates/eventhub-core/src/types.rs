//! # Domain Types
//!
//! Core domain types used throughout EventHub.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Event       │   │     Booking     │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  event_id (FK)  │◄──│  booking_id (1:1)│      │
//! │  │  price_cents    │   │  reference      │   │  method         │       │
//! │  │  total_tickets  │   │  quantity       │   │  amount_cents   │       │
//! │  │  available_...  │   │  status         │   │  status         │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │ 1:N                                   │
//! │                        ┌────────▼────────┐   ┌─────────────────┐       │
//! │                        │     Ticket      │   │      User       │       │
//! │                        │  ticket_number  │   │  role           │       │
//! │                        │  qr_payload     │   │  loyalty_points │       │
//! │                        │  status         │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Bookings and tickets carry both:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (`reference`, `ticket_number`) - human-readable, shown to customers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// User
// =============================================================================

/// Role of an EventHub account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Moderates events, venues and users.
    Admin,
    /// Browses events and books tickets.
    Customer,
    /// Creates and runs events.
    Organizer,
}

impl Default for Role {
    fn default() -> Self {
        Role::Customer
    }
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Unique, stored lower-cased.
    pub email: String,
    pub role: Role,
    /// Reward balance, 1 point per currency unit paid.
    pub loyalty_points: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Venue
// =============================================================================

/// A physical location hosting events.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    /// Maximum attendance; caps `Event.total_tickets`.
    pub capacity: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Event
// =============================================================================

/// A ticketed event.
///
/// ## Inventory Invariant
/// `0 <= available_tickets <= total_tickets` at all times. The database
/// enforces it with a CHECK constraint; the repository only ever changes
/// `available_tickets` through conditional updates.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Event {
    pub id: String,
    pub organizer_id: String,
    pub venue_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,
    /// Price per ticket in cents.
    pub price_cents: i64,
    pub total_tickets: i64,
    pub available_tickets: i64,
    /// Inactive events are hidden and cannot be booked (admin moderation).
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Returns the ticket price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Tickets currently reserved or sold.
    #[inline]
    pub fn tickets_reserved(&self) -> i64 {
        self.total_tickets - self.available_tickets
    }

    /// Checks whether the event has started at `now`.
    #[inline]
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now
    }

    /// Checks whether the event has ended at `now`.
    #[inline]
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_date <= now
    }

    /// Checks that the event accepts new bookings.
    ///
    /// Availability is NOT checked here: the reservation itself is the
    /// authoritative check (see `EventRepository::reserve_tickets`).
    pub fn ensure_bookable(&self, now: DateTime<Utc>) -> CoreResult<()> {
        if !self.is_active {
            return Err(CoreError::EventNotBookable {
                event_id: self.id.clone(),
                reason: "event is not active".to_string(),
            });
        }

        if self.has_started(now) {
            return Err(CoreError::EventNotBookable {
                event_id: self.id.clone(),
                reason: "event has already started".to_string(),
            });
        }

        Ok(())
    }
}

/// Sort order for event listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EventSort {
    /// Soonest first.
    Date,
    PriceAsc,
    PriceDesc,
    Title,
}

impl Default for EventSort {
    fn default() -> Self {
        EventSort::Date
    }
}

/// Filters for browsing events.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct EventQuery {
    /// Matches title or description (case-insensitive substring).
    pub search: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    /// Hide events that have already started.
    pub upcoming_only: bool,
    /// Include inactive events (admin moderation view only).
    pub include_inactive: bool,
    pub sort: EventSort,
    pub limit: Option<u32>,
}

/// Per-event revenue line for an organizer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct EventRevenue {
    pub event_id: String,
    pub title: String,
    pub total_tickets: i64,
    /// Tickets issued on confirmed or completed bookings.
    pub tickets_sold: i64,
    /// Sum of completed payments in cents.
    pub revenue_cents: i64,
}

// =============================================================================
// Discount
// =============================================================================

/// A percentage discount code.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Discount {
    pub id: String,
    /// Unique, stored upper-cased.
    pub code: String,
    /// Discount in basis points (1500 = 15%).
    pub percentage_bps: i64,
    /// Restricts the code to one event when set.
    pub event_id: Option<String>,
    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,
    #[ts(as = "String")]
    pub valid_until: DateTime<Utc>,
    /// Unlimited when None.
    pub max_uses: Option<i64>,
    pub times_used: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Discount {
    /// Checks that the code can be applied to `event_id` at `now`.
    pub fn ensure_applicable(&self, event_id: &str, now: DateTime<Utc>) -> CoreResult<()> {
        let reason = if !self.is_active {
            Some("code is disabled")
        } else if now < self.valid_from {
            Some("code is not valid yet")
        } else if now > self.valid_until {
            Some("code has expired")
        } else if self
            .max_uses
            .is_some_and(|max| self.times_used >= max)
        {
            Some("code has been fully redeemed")
        } else if self
            .event_id
            .as_deref()
            .is_some_and(|scoped| scoped != event_id)
        {
            Some("code does not apply to this event")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(CoreError::DiscountUnavailable {
                code: self.code.clone(),
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Booking
// =============================================================================

/// The status of a booking.
///
/// ```text
///            pay                 event ends
/// Pending ───────► Confirmed ───────────────► Completed
///    │                 │
///    │ cancel          │ refund (admin)
///    ▼                 ▼
/// Cancelled ◄──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Tickets reserved, awaiting payment.
    Pending,
    /// Paid, tickets issued.
    Confirmed,
    /// Cancelled or refunded; inventory returned.
    Cancelled,
    /// Event is over.
    Completed,
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Pending
    }
}

/// A reservation of N tickets for one event by one customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Booking {
    pub id: String,
    /// Human-readable reference, e.g. `BK-20261019-7F3A9C`.
    pub reference: String,
    pub event_id: String,
    pub customer_id: String,
    pub quantity: i64,
    /// Ticket price × quantity.
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    /// Amount due: subtotal − discount.
    pub total_cents: i64,
    pub discount_code: Option<String>,
    pub status: BookingStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Returns the amount due as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Checks if `user_id` is the customer who made the booking.
    #[inline]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.customer_id == user_id
    }
}

// =============================================================================
// Payment
// =============================================================================

/// How a booking was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    PayPal,
    BankTransfer,
}

/// The status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    /// Gateway declined; the booking may be paid again.
    Failed,
    Refunded,
}

/// The (single) payment for a booking.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    /// Unique: one payment row per booking, retries update it in place.
    pub booking_id: String,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Gateway transaction id for completed charges.
    pub transaction_reference: Option<String>,
    pub failure_reason: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Ticket
// =============================================================================

/// The status of an issued ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Valid for entry.
    Active,
    /// Scanned at the door.
    Used,
    /// Booking was refunded.
    Cancelled,
    /// Event ended without the ticket being used.
    Expired,
}

/// One admit-one unit issued after payment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Ticket {
    pub id: String,
    /// Human-readable, unique, e.g. `TKT-20261019-3FA85F64`.
    pub ticket_number: String,
    pub booking_id: String,
    pub event_id: String,
    pub customer_id: String,
    /// Signed payload encoded into the QR image.
    pub qr_payload: String,
    pub status: TicketStatus,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub used_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================
