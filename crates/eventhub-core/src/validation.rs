//! # Validation Module
//!
//! Input validation utilities for EventHub.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (Rust)                                          │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Services / pricing                                           │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / FOREIGN KEY                                   │
//! │  └── CHECK (0 <= available_tickets <= total_tickets)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use eventhub_core::validation::{validate_quantity, validate_email};
//!
//! assert!(validate_quantity(2).is_ok());
//! assert!(validate_email("ada@example.com").is_ok());
//! ```

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::MAX_TICKETS_PER_BOOKING;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field (names, titles, addresses).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most `max` characters
pub fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// Deliberately shallow: one `@`, non-empty local part, a dot in the domain.
/// Ownership of the address is the login flow's problem.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    validate_text("email", email, 254)?;

    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain.tld".to_string(),
        });
    }

    Ok(())
}

/// Validates a discount code.
///
/// ## Rules
/// - 3 to 32 characters
/// - Letters, digits, hyphens only (case is normalised to upper)
pub fn validate_discount_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.len() < 3 {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must be at least 3 characters".to_string(),
        });
    }

    if code.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 32,
        });
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a ticket number of the form `TKT-YYYYMMDD-XXXXXXXX`.
///
/// ## Example
/// ```rust
/// use eventhub_core::validation::validate_ticket_number;
///
/// assert!(validate_ticket_number("TKT-20261019-3FA85F64").is_ok());
/// assert!(validate_ticket_number("TKT-1").is_err());
/// ```
pub fn validate_ticket_number(value: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidFormat {
        field: "ticket_number".to_string(),
        reason: "expected TKT-YYYYMMDD-XXXXXXXX".to_string(),
    };

    let mut parts = value.split('-');
    let (prefix, date, suffix) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(p), Some(d), Some(s), None) => (p, d, s),
        _ => return Err(invalid()),
    };

    if prefix != "TKT"
        || date.len() != 8
        || !date.chars().all(|c| c.is_ascii_digit())
        || suffix.len() != 8
        || !suffix
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    {
        return Err(invalid());
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested ticket quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_TICKETS_PER_BOOKING
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_TICKETS_PER_BOOKING {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_TICKETS_PER_BOOKING,
        });
    }

    Ok(())
}

/// Validates a ticket price in cents. Zero is allowed (free events).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a payment amount in cents.
///
/// Zero is allowed: a fully discounted booking still goes through payment
/// to issue its tickets.
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "payment amount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount percentage in basis points (1..=10000).
pub fn validate_percentage_bps(bps: i64) -> ValidationResult<()> {
    if !(1..=10_000).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: "percentage_bps".to_string(),
            min: 1,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates a venue capacity.
pub fn validate_capacity(capacity: i64) -> ValidationResult<()> {
    if capacity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "capacity".to_string(),
        });
    }

    Ok(())
}

/// Validates an event's ticket total against its venue.
///
/// ## Rules
/// - At least one ticket
/// - No more than the venue holds
pub fn validate_ticket_total(total: i64, venue_capacity: i64) -> ValidationResult<()> {
    if total <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "total_tickets".to_string(),
        });
    }

    if total > venue_capacity {
        return Err(ValidationError::OutOfRange {
            field: "total_tickets".to_string(),
            min: 1,
            max: venue_capacity,
        });
    }

    Ok(())
}

/// Validates that a time window is well-formed (start strictly before end).
pub fn validate_window(
    field: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ValidationResult<()> {
    if start >= end {
        return Err(ValidationError::Inconsistent {
            field: field.to_string(),
            reason: "start must be before end".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use eventhub_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
