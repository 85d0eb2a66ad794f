//! # Booking Repository
//!
//! Database operations for bookings.
//!
//! ## Booking Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Booking Lifecycle                                 │
//! │                                                                         │
//! │  1. CREATE (with inventory reservation, same transaction)              │
//! │     └── insert() → Booking { status: Pending }                         │
//! │                                                                         │
//! │  2a. PAY                                                               │
//! │     └── transition(Pending → Confirmed) + tickets + payment            │
//! │                                                                         │
//! │  2b. CANCEL                                                            │
//! │     └── transition(Pending → Cancelled) + release inventory            │
//! │                                                                         │
//! │  3. EVENT ENDS (sweep)                                                 │
//! │     ├── complete_confirmed_for_ended() → Completed                     │
//! │     └── cancel_pending_for_ended()     → Cancelled                     │
//! │                                                                         │
//! │  (admin) REFUND: transition(Confirmed → Cancelled)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every status change is `UPDATE ... WHERE status = <from>`; a racing
//! second caller sees 0 rows affected instead of clobbering the first.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::DbResult;
use eventhub_core::{Booking, BookingStatus};

/// Reference draws before a collision is reported as a conflict.
pub const MAX_REFERENCE_ATTEMPTS: u32 = 5;

const BOOKING_COLUMNS: &str = r#"
    id, reference, event_id, customer_id, quantity,
    subtotal_cents, discount_cents, total_cents, discount_code,
    status, created_at, updated_at, cancelled_at
"#;

/// Repository for booking database operations.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    /// Gets a booking by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    /// Gets a booking by its human-readable reference.
    pub async fn get_by_reference(&self, reference: &str) -> DbResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE reference = ?1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    /// Lists a customer's bookings, newest first.
    pub async fn list_by_customer(&self, customer_id: &str) -> DbResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE customer_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Counts bookings for an event in a given status.
    pub async fn count_for_event(&self, event_id: &str, status: BookingStatus) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE event_id = ?1 AND status = ?2")
                .bind(event_id)
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    // =========================================================================
    // Transactional operations
    // =========================================================================

    /// Inserts a booking.
    pub async fn insert(conn: &mut SqliteConnection, booking: &Booking) -> DbResult<()> {
        debug!(id = %booking.id, reference = %booking.reference, "Inserting booking");

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, reference, event_id, customer_id, quantity,
                subtotal_cents, discount_cents, total_cents, discount_code,
                status, created_at, updated_at, cancelled_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13
            )
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.reference)
        .bind(&booking.event_id)
        .bind(&booking.customer_id)
        .bind(booking.quantity)
        .bind(booking.subtotal_cents)
        .bind(booking.discount_cents)
        .bind(booking.total_cents)
        .bind(&booking.discount_code)
        .bind(booking.status)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .bind(booking.cancelled_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a booking, replacing its reference with `next_reference()`
    /// while the current one is already taken.
    ///
    /// SQLite rolls back only the failed statement, so the retry stays in
    /// the caller's transaction.
    pub async fn insert_with_unique_reference(
        conn: &mut SqliteConnection,
        booking: &mut Booking,
        mut next_reference: impl FnMut() -> String,
    ) -> DbResult<()> {
        let mut attempt = 1;
        loop {
            match Self::insert(conn, booking).await {
                Err(e)
                    if e.is_unique_violation_on("bookings.reference")
                        && attempt < MAX_REFERENCE_ATTEMPTS =>
                {
                    warn!(reference = %booking.reference, attempt, "Booking reference taken, drawing another");
                    booking.reference = next_reference();
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Moves a booking from `from` to `to`.
    ///
    /// Sets `cancelled_at` when moving to Cancelled.
    ///
    /// ## Returns
    /// * `Ok(true)` - Transition applied
    /// * `Ok(false)` - Booking missing or no longer in `from`
    pub async fn transition(
        conn: &mut SqliteConnection,
        id: &str,
        from: BookingStatus,
        to: BookingStatus,
    ) -> DbResult<bool> {
        debug!(id = %id, ?from, ?to, "Transitioning booking");

        let now = Utc::now();
        let cancelled_at = (to == BookingStatus::Cancelled).then_some(now);

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = ?3,
                updated_at = ?4,
                cancelled_at = COALESCE(?5, cancelled_at)
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(now)
        .bind(cancelled_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Cancels Pending bookings of events that ended by `now`.
    ///
    /// Call `EventRepository::release_pending_for_ended` first in the same
    /// transaction or their seats are lost.
    pub async fn cancel_pending_for_ended(
        conn: &mut SqliteConnection,
        now: DateTime<Utc>,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = 'cancelled',
                updated_at = ?1,
                cancelled_at = ?1
            WHERE status = 'pending'
              AND event_id IN (
                    SELECT id FROM events WHERE julianday(end_date) <= julianday(?1))
            "#,
        )
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Completes Confirmed bookings of events that ended by `now`.
    pub async fn complete_confirmed_for_ended(
        conn: &mut SqliteConnection,
        now: DateTime<Utc>,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = 'completed',
                updated_at = ?1
            WHERE status = 'confirmed'
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

/// Generates a booking reference.
///
/// ## Format
/// `BK-YYYYMMDD-XXXXXX` where XXXXXX is six upper-case hex characters from a
/// fresh UUID. Uniqueness is enforced by the schema; pair with
/// [`BookingRepository::insert_with_unique_reference`] to redraw on a
/// collision.
pub fn generate_booking_reference() -> String {
    let date_part = Utc::now().format("%Y%m%d");
    let random = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("BK-{}-{}", date_part, &random[..6])
}

/// Helper to generate a new booking ID.
pub fn generate_booking_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use crate::EventRepository;
    use chrono::Duration;
    use eventhub_core::Role;

    #[tokio::test]
    async fn test_transition_is_conditional() {
        let db = test_support::database().await;
        let event = test_support::event(&db, 10).await;
        let customer = test_support::user(&db, Role::Customer).await;
        let booking = test_support::booking(&db, &event, &customer, 2, BookingStatus::Pending).await;

        let mut tx = db.begin().await.unwrap();
        assert!(BookingRepository::transition(
            &mut tx,
            &booking.id,
            BookingStatus::Pending,
            BookingStatus::Cancelled
        )
        .await
        .unwrap());
        // Second attempt loses: booking is no longer Pending.
        assert!(!BookingRepository::transition(
            &mut tx,
            &booking.id,
            BookingStatus::Pending,
            BookingStatus::Confirmed
        )
        .await
        .unwrap());
        tx.commit().await.unwrap();

        let stored = db.bookings().get_by_id(&booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
        assert!(stored.cancelled_at.is_some());
    }

    #[tokio::test]
    async fn test_list_and_reference_lookup() {
        let db = test_support::database().await;
        let event = test_support::event(&db, 10).await;
        let customer = test_support::user(&db, Role::Customer).await;
        let other = test_support::user(&db, Role::Customer).await;
        let booking = test_support::booking(&db, &event, &customer, 1, BookingStatus::Pending).await;
        test_support::booking(&db, &event, &other, 1, BookingStatus::Pending).await;

        let mine = db.bookings().list_by_customer(&customer.id).await.unwrap();
        assert_eq!(mine.len(), 1);

        let found = db
            .bookings()
            .get_by_reference(&booking.reference)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, booking.id);
        assert_eq!(
            db.bookings()
                .count_for_event(&event.id, BookingStatus::Pending)
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_sweep_for_ended_events() {
        let db = test_support::database().await;
        let ended = test_support::event_at(&db, 10, Utc::now() - Duration::days(2)).await;
        let upcoming = test_support::event(&db, 10).await;
        let customer = test_support::user(&db, Role::Customer).await;

        // Mirror what booking creation does: reserve, then insert.
        {
            let mut conn = db.pool().acquire().await.unwrap();
            assert!(EventRepository::reserve_tickets(&mut conn, &ended.id, 3).await.unwrap());
        }
        let pending = test_support::booking(&db, &ended, &customer, 3, BookingStatus::Pending).await;
        let confirmed = test_support::booking(&db, &ended, &customer, 1, BookingStatus::Confirmed).await;
        let future = test_support::booking(&db, &upcoming, &customer, 1, BookingStatus::Confirmed).await;

        let now = Utc::now();
        let mut tx = db.begin().await.unwrap();
        assert_eq!(EventRepository::release_pending_for_ended(&mut tx, now).await.unwrap(), 1);
        assert_eq!(BookingRepository::cancel_pending_for_ended(&mut tx, now).await.unwrap(), 1);
        assert_eq!(BookingRepository::complete_confirmed_for_ended(&mut tx, now).await.unwrap(), 1);
        tx.commit().await.unwrap();

        let status = |b: Option<Booking>| b.map(|b| b.status);
        assert_eq!(
            status(db.bookings().get_by_id(&pending.id).await.unwrap()),
            Some(BookingStatus::Cancelled)
        );
        assert_eq!(
            status(db.bookings().get_by_id(&confirmed.id).await.unwrap()),
            Some(BookingStatus::Completed)
        );
        assert_eq!(
            status(db.bookings().get_by_id(&future.id).await.unwrap()),
            Some(BookingStatus::Confirmed)
        );

        let ended = db.events().get_by_id(&ended.id).await.unwrap().unwrap();
        assert_eq!(ended.available_tickets, 10);
    }

    #[tokio::test]
    async fn test_taken_reference_is_redrawn() {
        let db = test_support::database().await;
        let event = test_support::event(&db, 10).await;
        let customer = test_support::user(&db, Role::Customer).await;
        let existing = test_support::booking(&db, &event, &customer, 1, BookingStatus::Pending).await;

        let mut booking = existing.clone();
        booking.id = generate_booking_id();

        let mut drawn = vec!["BK-20261019-00000B".to_string(), existing.reference.clone()];
        let mut conn = db.pool().acquire().await.unwrap();
        BookingRepository::insert_with_unique_reference(&mut conn, &mut booking, || {
            drawn.pop().unwrap()
        })
        .await
        .unwrap();
        drop(conn);

        // First redraw collided again, second one stuck
        assert_eq!(booking.reference, "BK-20261019-00000B");
        let stored = db.bookings().get_by_id(&booking.id).await.unwrap().unwrap();
        assert_eq!(stored.reference, "BK-20261019-00000B");
    }

    #[tokio::test]
    async fn test_reference_retries_are_bounded() {
        let db = test_support::database().await;
        let event = test_support::event(&db, 10).await;
        let customer = test_support::user(&db, Role::Customer).await;
        let existing = test_support::booking(&db, &event, &customer, 1, BookingStatus::Pending).await;

        let mut booking = existing.clone();
        booking.id = generate_booking_id();

        let mut draws = 0;
        let mut conn = db.pool().acquire().await.unwrap();
        let err = BookingRepository::insert_with_unique_reference(&mut conn, &mut booking, || {
            draws += 1;
            existing.reference.clone()
        })
        .await
        .unwrap_err();
        drop(conn);

        assert!(err.is_unique_violation_on("bookings.reference"));
        assert_eq!(draws, MAX_REFERENCE_ATTEMPTS - 1);
        assert!(db.bookings().get_by_id(&booking.id).await.unwrap().is_none());
    }

    #[test]
    fn test_generate_booking_reference() {
        let reference = generate_booking_reference();
        assert!(reference.starts_with("BK-"));
        assert_eq!(reference.len(), 18);
        assert_ne!(reference, generate_booking_reference());
    }
}
