//! # eventhub-core: Pure Business Logic for EventHub
//!
//! This crate is the **heart** of EventHub. It contains the booking rules,
//! money math and ticket payload codec as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        EventHub Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (axum)                              │   │
//! │  │    /bookings ──► /payments ──► /tickets/mine                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ eventhub-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │    qr     │  │   │
//! │  │   │  Event    │  │   Money   │  │  Quote    │  │  payload  │  │   │
//! │  │   │  Booking  │  │  loyalty  │  │  discount │  │  signing  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  eventhub-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Event, Booking, Payment, Ticket, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Booking quotes and discount rules
//! - [`qr`] - Signed QR ticket payloads
//! - [`auth`] - Authenticated caller context
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use eventhub_core::money::Money;
//!
//! let price = Money::from_cents(2500); // $25.00
//! let total = price.multiply_quantity(3);
//!
//! assert_eq!(total.cents(), 7500);
//! assert_eq!(total.loyalty_points(), 75);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod error;
pub mod money;
pub mod pricing;
pub mod qr;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use auth::AuthContext;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::BookingQuote;
pub use qr::{QrError, QrSigner, TicketPayload};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum tickets a customer can reserve in a single booking.
///
/// ## Business Reason
/// Keeps scalpers from draining an event in one request.
pub const MAX_TICKETS_PER_BOOKING: i64 = 10;

/// Cents that earn one loyalty point (1 point per whole currency unit).
pub const CENTS_PER_LOYALTY_POINT: i64 = 100;
