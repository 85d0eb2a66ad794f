//! # eventhub-db: Database Layer for EventHub
//!
//! This crate provides database access for EventHub.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        EventHub Data Flow                               │
//! │                                                                         │
//! │  HTTP handler → Service (BookingService, PaymentService, ...)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   eventhub-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ EventRepo     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ BookingRepo   │    │ 001_init.sql │  │   │
//! │  │   │ Transactions  │    │ TicketRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Kinds of Repository Methods
//!
//! - `&self` methods run against the pool (reads, single-statement writes).
//! - Associated functions taking `&mut SqliteConnection` run inside a
//!   caller-owned transaction (`db.begin().await?`) so several writes commit
//!   or roll back together.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use eventhub_db::{Database, DbConfig, EventRepository};
//!
//! let db = Database::new(DbConfig::new("eventhub.db")).await?;
//!
//! let mut tx = db.begin().await?;
//! let reserved = EventRepository::reserve_tickets(&mut tx, &event_id, 2).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::booking::BookingRepository;
pub use repository::discount::DiscountRepository;
pub use repository::event::EventRepository;
pub use repository::payment::PaymentRepository;
pub use repository::ticket::TicketRepository;
pub use repository::user::UserRepository;
pub use repository::venue::VenueRepository;

/// Transaction handle handed to transactional repository functions.
pub type DbTransaction<'a> = sqlx::Transaction<'a, sqlx::Sqlite>;
