//! # Repository Module
//!
//! Database repository implementations for EventHub.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  BookingService::create_booking                                        │
//! │       │                                                                 │
//! │       │  db.events().get_by_id(id)          ← pool-backed read         │
//! │       │  let mut tx = db.begin()                                        │
//! │       │  EventRepository::reserve_tickets(&mut tx, id, qty)            │
//! │       │  BookingRepository::insert(&mut tx, &booking)                  │
//! │       │  tx.commit()                        ← all or nothing           │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Accounts and loyalty points
//! - [`VenueRepository`](venue::VenueRepository) - Venues
//! - [`EventRepository`](event::EventRepository) - Events, search, inventory
//! - [`DiscountRepository`](discount::DiscountRepository) - Discount codes
//! - [`BookingRepository`](booking::BookingRepository) - Bookings and status transitions
//! - [`PaymentRepository`](payment::PaymentRepository) - One payment per booking
//! - [`TicketRepository`](ticket::TicketRepository) - Issued tickets

pub mod booking;
pub mod discount;
pub mod event;
pub mod payment;
pub mod ticket;
pub mod user;
pub mod venue;
