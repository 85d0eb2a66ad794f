//! # EventHub API
//!
//! HTTP server for the booking → payment → ticket workflow.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          EventHub API                                   │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │ BookingService │  │ PaymentService │  │  TicketService             ││
//! │  │                │  │                │  │                            ││
//! │  │ • Create       │  │ • Process      │  │ • MyTickets / QR image     ││
//! │  │ • Cancel       │  │ • Refund       │  │ • Verify / Check-in        ││
//! │  │ • MyBookings   │  │                │  │ • Expiry sweep             ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  EventService  │  │  VenueService  │  │  UserService               ││
//! │  │  ReportService │  │DiscountService │  │  (register, moderation)    ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │  SQLite (eventhub-db) • JWT auth • PaymentGateway • QR signing   │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_PORT` - HTTP port (default: 8080)
//! - `DATABASE_PATH` - SQLite file (default: ./eventhub.db)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `JWT_SECRET` - Secret for JWT signing
//! - `JWT_ACCESS_LIFETIME_SECS` - Access token lifetime (default: 3600)
//! - `QR_SIGNING_SECRET` - HMAC key for ticket payloads
//! - `EXPIRY_SWEEP_INTERVAL_SECS` - Expiry sweep period (default: 300)

pub mod auth;
pub mod config;
pub mod error;
pub mod payment_gateway;
pub mod qr_service;
pub mod routes;
pub mod services;
pub mod state;
pub mod tasks;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use payment_gateway::{MockPaymentGateway, PaymentGateway};
pub use routes::build_router;
pub use state::AppState;
