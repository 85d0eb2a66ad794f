//! # Event Repository
//!
//! Events, browsing, and the inventory counter.
//!
//! ## Inventory Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  available_tickets only changes through conditional UPDATEs:        │
//! │                                                                     │
//! │  reserve:  SET available = available - n                            │
//! │            WHERE id = ? AND is_active AND available >= n            │
//! │            → 0 rows affected = sold out (nothing changed)           │
//! │                                                                     │
//! │  release:  SET available = available + n                            │
//! │            → CHECK (available <= total) rejects a double release    │
//! │                                                                     │
//! │  Two customers racing for the last ticket:                          │
//! │  A: reserve 1 → 1 row  ✓                                           │
//! │  B: reserve 1 → 0 rows → InsufficientInventory                      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use eventhub_core::{Event, EventQuery, EventRevenue, EventSort};

const EVENT_COLUMNS: &str = r#"
    id, organizer_id, venue_id, title, description, category,
    start_date, end_date, price_cents, total_tickets, available_tickets,
    is_active, created_at, updated_at
"#;

const DEFAULT_LIMIT: u32 = 100;
const MAX_LIMIT: u32 = 500;

/// Repository for event database operations.
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    /// Creates a new EventRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EventRepository { pool }
    }

    /// Inserts a new event.
    pub async fn insert(&self, event: &Event) -> DbResult<()> {
        debug!(id = %event.id, title = %event.title, "Inserting event");

        sqlx::query(
            r#"
            INSERT INTO events (
                id, organizer_id, venue_id, title, description, category,
                start_date, end_date, price_cents, total_tickets, available_tickets,
                is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14
            )
            "#,
        )
        .bind(&event.id)
        .bind(&event.organizer_id)
        .bind(&event.venue_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.category)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.price_cents)
        .bind(event.total_tickets)
        .bind(event.available_tickets)
        .bind(event.is_active)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an event by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Searches events.
    ///
    /// ## Filters
    /// - `search`: case-insensitive substring of title or description
    /// - `category`: exact, case-insensitive
    /// - `city`: venue city, exact, case-insensitive
    /// - `upcoming_only`: start_date after `now`
    /// - `include_inactive`: otherwise only active events
    pub async fn search(&self, query: &EventQuery, now: DateTime<Utc>) -> DbResult<Vec<Event>> {
        let order_by = match query.sort {
            EventSort::Date => "julianday(start_date) ASC, title ASC",
            EventSort::PriceAsc => "price_cents ASC, julianday(start_date) ASC",
            EventSort::PriceDesc => "price_cents DESC, julianday(start_date) ASC",
            EventSort::Title => "title COLLATE NOCASE ASC",
        };
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        debug!(?query, "Searching events");

        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE (?1 OR is_active = 1)
              AND (?2 IS NULL
                   OR title LIKE ?2 ESCAPE '\'
                   OR description LIKE ?2 ESCAPE '\')
              AND (?3 IS NULL OR category = ?3 COLLATE NOCASE)
              AND (?4 IS NULL OR venue_id IN (
                      SELECT id FROM venues WHERE city = ?4 COLLATE NOCASE))
              AND (?5 = 0 OR julianday(start_date) > julianday(?6))
            ORDER BY {order_by}
            LIMIT ?7
            "#
        ))
        .bind(query.include_inactive)
        .bind(pattern)
        .bind(query.category.as_deref().map(str::trim))
        .bind(query.city.as_deref().map(str::trim))
        .bind(query.upcoming_only)
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Lists all events owned by an organizer, soonest first.
    pub async fn list_by_organizer(&self, organizer_id: &str) -> DbResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE organizer_id = ?1 ORDER BY julianday(start_date)"
        ))
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Updates the editable fields of an event.
    ///
    /// Changing `total_tickets` shifts `available_tickets` by the same
    /// delta, so tickets already reserved stay reserved. Shrinking below the
    /// reserved count fails the CHECK constraint (`DbError::CheckViolation`).
    pub async fn update(&self, event: &Event) -> DbResult<()> {
        debug!(id = %event.id, "Updating event");

        let result = sqlx::query(
            r#"
            UPDATE events SET
                venue_id = ?2,
                title = ?3,
                description = ?4,
                category = ?5,
                start_date = ?6,
                end_date = ?7,
                price_cents = ?8,
                available_tickets = available_tickets + (?9 - total_tickets),
                total_tickets = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&event.id)
        .bind(&event.venue_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.category)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.price_cents)
        .bind(event.total_tickets)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Event", &event.id));
        }

        Ok(())
    }

    /// Activates or deactivates an event (moderation).
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active, "Setting event active flag");

        let result = sqlx::query("UPDATE events SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Event", id));
        }

        Ok(())
    }

    /// Per-event tickets sold and completed-payment revenue for an organizer.
    pub async fn revenue_for_organizer(&self, organizer_id: &str) -> DbResult<Vec<EventRevenue>> {
        let rows = sqlx::query_as::<_, EventRevenue>(
            r#"
            SELECT
                e.id AS event_id,
                e.title AS title,
                e.total_tickets AS total_tickets,
                (SELECT COUNT(*) FROM tickets t
                  WHERE t.event_id = e.id
                    AND t.status IN ('active', 'used', 'expired')) AS tickets_sold,
                (SELECT COALESCE(SUM(p.amount_cents), 0)
                   FROM payments p
                   JOIN bookings b ON b.id = p.booking_id
                  WHERE b.event_id = e.id
                    AND p.status = 'completed') AS revenue_cents
            FROM events e
            WHERE e.organizer_id = ?1
            ORDER BY julianday(e.start_date)
            "#,
        )
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // =========================================================================
    // Transactional inventory operations
    // =========================================================================

    /// Reserves `quantity` tickets if the event is active and has enough left.
    ///
    /// ## Returns
    /// * `Ok(true)` - Tickets reserved
    /// * `Ok(false)` - Not enough available (or event inactive); nothing changed
    pub async fn reserve_tickets(
        conn: &mut SqliteConnection,
        event_id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        debug!(event_id = %event_id, quantity, "Reserving tickets");

        let result = sqlx::query(
            r#"
            UPDATE events SET
                available_tickets = available_tickets - ?2,
                updated_at = ?3
            WHERE id = ?1
              AND is_active = 1
              AND available_tickets >= ?2
            "#,
        )
        .bind(event_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Returns `quantity` previously reserved tickets to the event.
    pub async fn release_tickets(
        conn: &mut SqliteConnection,
        event_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        debug!(event_id = %event_id, quantity, "Releasing tickets");

        let result = sqlx::query(
            r#"
            UPDATE events SET
                available_tickets = available_tickets + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(event_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Event", event_id));
        }

        Ok(())
    }

    /// Returns the seats held by Pending bookings of ended events.
    ///
    /// Must run before those bookings are cancelled, in the same transaction.
    pub async fn release_pending_for_ended(
        conn: &mut SqliteConnection,
        now: DateTime<Utc>,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE events SET
                available_tickets = available_tickets + (
                    SELECT COALESCE(SUM(b.quantity), 0) FROM bookings b
                     WHERE b.event_id = events.id AND b.status = 'pending'),
                updated_at = ?1
            WHERE julianday(end_date) <= julianday(?1)
              AND EXISTS (
                    SELECT 1 FROM bookings b
                     WHERE b.event_id = events.id AND b.status = 'pending')
            "#,
        )
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Builds a LIKE pattern matching `term` anywhere, with wildcards escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use chrono::Duration;

    #[tokio::test]
    async fn test_reserve_until_sold_out() {
        let db = test_support::database().await;
        let event = test_support::event(&db, 5).await;

        let mut tx = db.begin().await.unwrap();
        assert!(EventRepository::reserve_tickets(&mut tx, &event.id, 5).await.unwrap());
        assert!(!EventRepository::reserve_tickets(&mut tx, &event.id, 1).await.unwrap());
        tx.commit().await.unwrap();

        let event = db.events().get_by_id(&event.id).await.unwrap().unwrap();
        assert_eq!(event.available_tickets, 0);
    }

    #[tokio::test]
    async fn test_reserve_inactive_event_fails() {
        let db = test_support::database().await;
        let event = test_support::event(&db, 5).await;
        db.events().set_active(&event.id, false).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(!EventRepository::reserve_tickets(&mut conn, &event.id, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_cannot_exceed_total() {
        let db = test_support::database().await;
        let event = test_support::event(&db, 5).await;

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(EventRepository::reserve_tickets(&mut conn, &event.id, 2).await.unwrap());
        EventRepository::release_tickets(&mut conn, &event.id, 2).await.unwrap();

        let err = EventRepository::release_tickets(&mut conn, &event.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_keeps_reserved_count() {
        let db = test_support::database().await;
        let mut event = test_support::event(&db, 10).await;
        {
            let mut conn = db.pool().acquire().await.unwrap();
            assert!(EventRepository::reserve_tickets(&mut conn, &event.id, 4).await.unwrap());
        }

        event.total_tickets = 8;
        db.events().update(&event).await.unwrap();
        let stored = db.events().get_by_id(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.total_tickets, 8);
        assert_eq!(stored.available_tickets, 4);

        event.total_tickets = 3;
        assert!(matches!(
            db.events().update(&event).await,
            Err(DbError::CheckViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_filters_and_sort() {
        let db = test_support::database().await;
        let now = Utc::now();

        let mut cheap = test_support::event_at(&db, 10, now + Duration::days(3)).await;
        cheap.title = "100% Rock".to_string();
        cheap.price_cents = 1000;
        db.events().update(&cheap).await.unwrap();

        let mut dear = test_support::event_at(&db, 10, now + Duration::days(1)).await;
        dear.price_cents = 9000;
        dear.category = "Theatre".to_string();
        db.events().update(&dear).await.unwrap();

        let past = test_support::event_at(&db, 10, now - Duration::days(1)).await;
        let hidden = test_support::event(&db, 10).await;
        db.events().set_active(&hidden.id, false).await.unwrap();

        let all = db.events().search(&EventQuery::default(), now).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, past.id);

        let upcoming = EventQuery {
            upcoming_only: true,
            sort: EventSort::PriceDesc,
            ..Default::default()
        };
        let found = db.events().search(&upcoming, now).await.unwrap();
        assert_eq!(
            found.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
            vec![dear.id.as_str(), cheap.id.as_str()]
        );

        let by_text = EventQuery {
            search: Some("100%".to_string()),
            ..Default::default()
        };
        let found = db.events().search(&by_text, now).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, cheap.id);

        let by_category = EventQuery {
            category: Some("theatre".to_string()),
            city: Some("springfield".to_string()),
            ..Default::default()
        };
        assert_eq!(db.events().search(&by_category, now).await.unwrap().len(), 1);

        let moderation = EventQuery {
            include_inactive: true,
            ..Default::default()
        };
        assert_eq!(db.events().search(&moderation, now).await.unwrap().len(), 4);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
