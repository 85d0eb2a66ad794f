//! # Venue Repository

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use eventhub_core::Venue;

const VENUE_COLUMNS: &str = "id, name, address, city, capacity, is_active, created_at, updated_at";

/// Repository for venue database operations.
#[derive(Debug, Clone)]
pub struct VenueRepository {
    pool: SqlitePool,
}

impl VenueRepository {
    /// Creates a new VenueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VenueRepository { pool }
    }

    /// Inserts a new venue.
    pub async fn insert(&self, venue: &Venue) -> DbResult<()> {
        debug!(id = %venue.id, name = %venue.name, "Inserting venue");

        sqlx::query(
            r#"
            INSERT INTO venues (
                id, name, address, city, capacity, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&venue.id)
        .bind(&venue.name)
        .bind(&venue.address)
        .bind(&venue.city)
        .bind(venue.capacity)
        .bind(venue.is_active)
        .bind(venue.created_at)
        .bind(venue.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a venue by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Venue>> {
        let venue = sqlx::query_as::<_, Venue>(&format!(
            "SELECT {VENUE_COLUMNS} FROM venues WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(venue)
    }

    /// Lists venues by city then name.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<Venue>> {
        let venues = sqlx::query_as::<_, Venue>(&format!(
            r#"
            SELECT {VENUE_COLUMNS} FROM venues
            WHERE (?1 OR is_active = 1)
            ORDER BY city, name
            "#
        ))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(venues)
    }

    /// Updates the editable fields of a venue.
    pub async fn update(&self, venue: &Venue) -> DbResult<()> {
        debug!(id = %venue.id, "Updating venue");

        let result = sqlx::query(
            r#"
            UPDATE venues SET
                name = ?2,
                address = ?3,
                city = ?4,
                capacity = ?5,
                is_active = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&venue.id)
        .bind(&venue.name)
        .bind(&venue.address)
        .bind(&venue.city)
        .bind(venue.capacity)
        .bind(venue.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Venue", &venue.id));
        }

        Ok(())
    }

    /// Largest `total_tickets` among the venue's active events.
    ///
    /// A venue cannot shrink below this.
    pub async fn max_event_tickets(&self, venue_id: &str) -> DbResult<i64> {
        let max: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(total_tickets), 0) FROM events WHERE venue_id = ?1 AND is_active = 1",
        )
        .bind(venue_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(max)
    }
}
