//! # Discount Repository
//!
//! Discount codes and their redemption counter.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use eventhub_core::Discount;

const DISCOUNT_COLUMNS: &str = r#"
    id, code, percentage_bps, event_id, valid_from, valid_until,
    max_uses, times_used, is_active, created_at
"#;

/// Repository for discount database operations.
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    /// Creates a new DiscountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Inserts a new discount code.
    ///
    /// ## Errors
    /// `UniqueViolation` on `discounts.code` when the code exists.
    pub async fn insert(&self, discount: &Discount) -> DbResult<()> {
        debug!(code = %discount.code, bps = discount.percentage_bps, "Inserting discount");

        sqlx::query(
            r#"
            INSERT INTO discounts (
                id, code, percentage_bps, event_id, valid_from, valid_until,
                max_uses, times_used, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&discount.id)
        .bind(&discount.code)
        .bind(discount.percentage_bps)
        .bind(&discount.event_id)
        .bind(discount.valid_from)
        .bind(discount.valid_until)
        .bind(discount.max_uses)
        .bind(discount.times_used)
        .bind(discount.is_active)
        .bind(discount.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a discount by its (upper-cased) code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Discount>> {
        let discount = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE code = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(discount)
    }

    /// Lists all discount codes, newest first.
    pub async fn list(&self) -> DbResult<Vec<Discount>> {
        let discounts = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(discounts)
    }

    /// Redeems one use of `code` if it is still redeemable at `now`.
    ///
    /// The same conditions as `Discount::ensure_applicable`, re-checked in
    /// the UPDATE so two bookings cannot both take the last use.
    ///
    /// ## Returns
    /// * `Ok(true)` - One use consumed
    /// * `Ok(false)` - Code exhausted, disabled, or outside its window
    pub async fn consume_use(
        conn: &mut SqliteConnection,
        code: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(code = %code, "Consuming discount use");

        let result = sqlx::query(
            r#"
            UPDATE discounts SET times_used = times_used + 1
            WHERE code = ?1
              AND is_active = 1
              AND (max_uses IS NULL OR times_used < max_uses)
              AND julianday(valid_from) <= julianday(?2)
              AND julianday(valid_until) >= julianday(?2)
            "#,
        )
        .bind(code)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
