//! # Ticket Repository
//!
//! Issued tickets and their door/refund/expiry status changes.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use eventhub_core::Ticket;

/// Number draws per ticket before a collision is reported as a conflict.
pub const MAX_TICKET_NUMBER_ATTEMPTS: u32 = 5;

const TICKET_COLUMNS: &str = r#"
    id, ticket_number, booking_id, event_id, customer_id,
    qr_payload, status, issued_at, used_at
"#;

/// Repository for ticket database operations.
#[derive(Debug, Clone)]
pub struct TicketRepository {
    pool: SqlitePool,
}

impl TicketRepository {
    /// Creates a new TicketRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TicketRepository { pool }
    }

    /// Gets a ticket by its ticket number.
    pub async fn get_by_number(&self, ticket_number: &str) -> DbResult<Option<Ticket>> {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_number = ?1"
        ))
        .bind(ticket_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    /// Lists a customer's tickets, newest first.
    pub async fn list_by_customer(&self, customer_id: &str) -> DbResult<Vec<Ticket>> {
        let tickets = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE customer_id = ?1 ORDER BY issued_at DESC, ticket_number"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    /// Lists the tickets issued for a booking.
    pub async fn list_by_booking(&self, booking_id: &str) -> DbResult<Vec<Ticket>> {
        let tickets = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE booking_id = ?1 ORDER BY ticket_number"
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    /// Marks an Active ticket as Used (door check-in).
    ///
    /// ## Returns
    /// `Ok(false)` when the ticket is missing or not Active.
    pub async fn mark_used(&self, ticket_number: &str, now: DateTime<Utc>) -> DbResult<bool> {
        debug!(ticket_number = %ticket_number, "Checking in ticket");

        let result = sqlx::query(
            "UPDATE tickets SET status = 'used', used_at = ?2 WHERE ticket_number = ?1 AND status = 'active'",
        )
        .bind(ticket_number)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Transactional operations
    // =========================================================================

    /// Inserts an issued ticket.
    pub async fn insert(conn: &mut SqliteConnection, ticket: &Ticket) -> DbResult<()> {
        debug!(ticket_number = %ticket.ticket_number, booking_id = %ticket.booking_id, "Inserting ticket");

        sqlx::query(
            r#"
            INSERT INTO tickets (
                id, ticket_number, booking_id, event_id, customer_id,
                qr_payload, status, issued_at, used_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&ticket.id)
        .bind(&ticket.ticket_number)
        .bind(&ticket.booking_id)
        .bind(&ticket.event_id)
        .bind(&ticket.customer_id)
        .bind(&ticket.qr_payload)
        .bind(ticket.status)
        .bind(ticket.issued_at)
        .bind(ticket.used_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Cancels the Active tickets of a booking (refund).
    pub async fn cancel_for_booking(conn: &mut SqliteConnection, booking_id: &str) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE tickets SET status = 'cancelled' WHERE booking_id = ?1 AND status = 'active'",
        )
        .bind(booking_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Expires Active tickets of events that ended by `now`.
    pub async fn expire_for_ended(conn: &mut SqliteConnection, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE tickets SET status = 'expired'
            WHERE status = 'active'
              AND event_id IN (
                    SELECT id FROM events WHERE julianday(end_date) <= julianday(?1))
            "#,
        )
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Generates a ticket number.
///
/// ## Format
/// `TKT-YYYYMMDD-XXXXXXXX`, eight upper-case hex characters from a fresh
/// UUID. Matches `eventhub_core::validation::validate_ticket_number`.
/// Callers redraw on a `tickets.ticket_number` UniqueViolation.
pub fn generate_ticket_number() -> String {
    let date_part = Utc::now().format("%Y%m%d");
    let random = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("TKT-{}-{}", date_part, &random[..8])
}

/// Helper to generate a new ticket ID.
pub fn generate_ticket_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use chrono::Duration;
    use eventhub_core::validation::validate_ticket_number;
    use eventhub_core::{Booking, BookingStatus, Event, Role, TicketStatus};

    fn ticket(booking: &Booking, event: &Event) -> Ticket {
        Ticket {
            id: generate_ticket_id(),
            ticket_number: generate_ticket_number(),
            booking_id: booking.id.clone(),
            event_id: event.id.clone(),
            customer_id: booking.customer_id.clone(),
            qr_payload: "payload".to_string(),
            status: TicketStatus::Active,
            issued_at: Utc::now(),
            used_at: None,
        }
    }

    #[test]
    fn test_generated_numbers_are_valid() {
        let number = generate_ticket_number();
        assert!(validate_ticket_number(&number).is_ok());
        assert_ne!(number, generate_ticket_number());
    }

    #[tokio::test]
    async fn test_check_in_only_once() {
        let db = test_support::database().await;
        let event = test_support::event(&db, 10).await;
        let customer = test_support::user(&db, Role::Customer).await;
        let booking = test_support::booking(&db, &event, &customer, 1, BookingStatus::Confirmed).await;

        let t = ticket(&booking, &event);
        {
            let mut conn = db.pool().acquire().await.unwrap();
            TicketRepository::insert(&mut conn, &t).await.unwrap();
        }

        assert!(db.tickets().mark_used(&t.ticket_number, Utc::now()).await.unwrap());
        assert!(!db.tickets().mark_used(&t.ticket_number, Utc::now()).await.unwrap());

        let stored = db.tickets().get_by_number(&t.ticket_number).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Used);
        assert!(stored.used_at.is_some());
    }

    #[tokio::test]
    async fn test_cancel_and_expire() {
        let db = test_support::database().await;
        let ended = test_support::event_at(&db, 10, Utc::now() - Duration::days(1)).await;
        let upcoming = test_support::event(&db, 10).await;
        let customer = test_support::user(&db, Role::Customer).await;
        let old = test_support::booking(&db, &ended, &customer, 2, BookingStatus::Confirmed).await;
        let refunded = test_support::booking(&db, &upcoming, &customer, 1, BookingStatus::Confirmed).await;

        let mut tx = db.begin().await.unwrap();
        for t in [ticket(&old, &ended), ticket(&old, &ended), ticket(&refunded, &upcoming)] {
            TicketRepository::insert(&mut tx, &t).await.unwrap();
        }
        assert_eq!(TicketRepository::cancel_for_booking(&mut tx, &refunded.id).await.unwrap(), 1);
        assert_eq!(TicketRepository::expire_for_ended(&mut tx, Utc::now()).await.unwrap(), 2);
        tx.commit().await.unwrap();

        let mine = db.tickets().list_by_customer(&customer.id).await.unwrap();
        assert_eq!(mine.len(), 3);
        assert_eq!(
            db.tickets().list_by_booking(&old.id).await.unwrap()[0].status,
            TicketStatus::Expired
        );
        assert_eq!(
            db.tickets().list_by_booking(&refunded.id).await.unwrap()[0].status,
            TicketStatus::Cancelled
        );
    }
}
