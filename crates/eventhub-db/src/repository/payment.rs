//! # Payment Repository
//!
//! One payment row per booking (`UNIQUE(booking_id)`). A declined attempt is
//! stored as Failed; the next attempt updates that same row in place.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use eventhub_core::Payment;

const PAYMENT_COLUMNS: &str = r#"
    id, booking_id, amount_cents, method, status,
    transaction_reference, failure_reason, created_at, updated_at
"#;

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Gets the payment for a booking.
    pub async fn get_by_booking(&self, booking_id: &str) -> DbResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = ?1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Upserts a payment outside any transaction (declined attempts).
    pub async fn record(&self, payment: &Payment) -> DbResult<Option<Payment>> {
        let mut conn = self.pool.acquire().await?;
        Self::upsert(&mut conn, payment).await
    }

    /// Marks the booking's Completed payment as Refunded on its own
    /// connection. Used to claim a refund before the gateway call so a
    /// second refund of the same booking finds nothing to claim.
    pub async fn claim_refund(&self, booking_id: &str) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Self::mark_refunded(&mut conn, booking_id).await
    }

    /// Puts a claimed refund back to Completed after the gateway refused it.
    pub async fn restore_completed(&self, booking_id: &str) -> DbResult<bool> {
        debug!(booking_id = %booking_id, "Restoring payment to completed");

        let result = sqlx::query(
            r#"
            UPDATE payments SET status = 'completed', updated_at = ?2
            WHERE booking_id = ?1 AND status = 'refunded'
            "#,
        )
        .bind(booking_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Inserts the booking's payment or updates the existing row.
    ///
    /// An existing row is only overwritten while it is Pending or Failed;
    /// Completed and Refunded payments are final.
    ///
    /// ## Returns
    /// * `Ok(Some(payment))` - The stored row (keeps the original id on update)
    /// * `Ok(None)` - A final payment already exists for the booking
    pub async fn upsert(
        conn: &mut SqliteConnection,
        payment: &Payment,
    ) -> DbResult<Option<Payment>> {
        debug!(
            booking_id = %payment.booking_id,
            status = ?payment.status,
            amount = payment.amount_cents,
            "Upserting payment"
        );

        let stored = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (
                id, booking_id, amount_cents, method, status,
                transaction_reference, failure_reason, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT (booking_id) DO UPDATE SET
                amount_cents = excluded.amount_cents,
                method = excluded.method,
                status = excluded.status,
                transaction_reference = excluded.transaction_reference,
                failure_reason = excluded.failure_reason,
                updated_at = excluded.updated_at
            WHERE payments.status IN ('pending', 'failed')
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(&payment.id)
        .bind(&payment.booking_id)
        .bind(payment.amount_cents)
        .bind(payment.method)
        .bind(payment.status)
        .bind(&payment.transaction_reference)
        .bind(&payment.failure_reason)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(stored)
    }

    /// Marks a Completed payment as Refunded.
    ///
    /// ## Returns
    /// `Ok(false)` when the booking has no Completed payment.
    pub async fn mark_refunded(conn: &mut SqliteConnection, booking_id: &str) -> DbResult<bool> {
        debug!(booking_id = %booking_id, "Marking payment refunded");

        let result = sqlx::query(
            r#"
            UPDATE payments SET status = 'refunded', updated_at = ?2
            WHERE booking_id = ?1 AND status = 'completed'
            "#,
        )
        .bind(booking_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// Helper to generate a new payment ID.
pub fn generate_payment_id() -> String {
    Uuid::new_v4().to_string()
}
