//! # User Repository
//!
//! Accounts, roles and loyalty balances.
//!
//! Loyalty points move only inside payment/refund transactions, hence the
//! connection-taking associated functions.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use eventhub_core::{Role, User};

const USER_COLUMNS: &str = "id, name, email, role, loyalty_points, is_active, created_at, updated_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user.
    ///
    /// ## Errors
    /// `UniqueViolation` on `users.email` when the email is taken.
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, role = ?user.role, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, role, loyalty_points, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.loyalty_points)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by (lower-cased) email.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists users, newest first, optionally filtered by role.
    pub async fn list(&self, role: Option<Role>, limit: u32) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE (?1 IS NULL OR role = ?1)
            ORDER BY created_at DESC
            LIMIT ?2
            "#
        ))
        .bind(role)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Activates or deactivates an account.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active, "Setting user active flag");

        let result = sqlx::query("UPDATE users SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Counts users (for seeding and diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Credits loyalty points inside a transaction.
    pub async fn add_loyalty_points(
        conn: &mut SqliteConnection,
        user_id: &str,
        points: i64,
    ) -> DbResult<()> {
        debug!(user_id = %user_id, points, "Crediting loyalty points");

        let result = sqlx::query(
            "UPDATE users SET loyalty_points = loyalty_points + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(user_id)
        .bind(points)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        Ok(())
    }

    /// Debits loyalty points inside a transaction, never below zero.
    pub async fn deduct_loyalty_points(
        conn: &mut SqliteConnection,
        user_id: &str,
        points: i64,
    ) -> DbResult<()> {
        debug!(user_id = %user_id, points, "Debiting loyalty points");

        let result = sqlx::query(
            "UPDATE users SET loyalty_points = MAX(loyalty_points - ?2, 0), updated_at = ?3 WHERE id = ?1",
        )
        .bind(user_id)
        .bind(points)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        Ok(())
    }
}
