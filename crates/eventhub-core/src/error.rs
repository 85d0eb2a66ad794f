//! # Error Types
//!
//! Domain-specific error types for eventhub-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  eventhub-core errors (this file)                                      │
//! │  ├── CoreError        - Booking/payment/ticket rule violations         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  eventhub-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  API errors (apps/api)                                                 │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → JSON response          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::qr::QrError;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations in the booking workflow.
/// They are translated to user-facing messages at the API boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Event cannot be found.
    #[error("Event not found: {0}")]
    EventNotFound(String),

    /// Booking cannot be found (or is not visible to the caller).
    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    /// Ticket cannot be found.
    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    /// User cannot be found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Venue cannot be found.
    #[error("Venue not found: {0}")]
    VenueNotFound(String),

    /// Not enough tickets left to satisfy the booking.
    ///
    /// ## User Workflow
    /// ```text
    /// Book (qty: 5)
    ///      │
    ///      ▼
    /// Reserve: available=3
    ///      │
    ///      ▼
    /// InsufficientInventory { available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 tickets left"
    /// ```
    #[error("Insufficient inventory for event {event_id}: available {available}, requested {requested}")]
    InsufficientInventory {
        event_id: String,
        available: i64,
        requested: i64,
    },

    /// Event exists but cannot currently be booked.
    ///
    /// ## When This Occurs
    /// - Event was deactivated by an admin
    /// - Event already started
    #[error("Event {event_id} cannot be booked: {reason}")]
    EventNotBookable { event_id: String, reason: String },

    /// Booking is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Paying for a cancelled booking
    /// - Cancelling a confirmed booking
    /// - Refunding a pending booking
    #[error("Booking {booking_id} is {current_status}, cannot perform operation")]
    InvalidBookingStatus {
        booking_id: String,
        current_status: String,
    },

    /// Ticket is not in a state that allows the requested operation.
    #[error("Ticket {ticket_number} is {current_status}, cannot perform operation")]
    InvalidTicketStatus {
        ticket_number: String,
        current_status: String,
    },

    /// Amount paid does not match the booking total.
    #[error("Payment amount {provided} does not match booking total {expected}")]
    PaymentAmountMismatch { expected: i64, provided: i64 },

    /// Payment gateway declined the charge.
    #[error("Payment declined: {reason}")]
    PaymentDeclined { reason: String },

    /// Discount code cannot be applied.
    #[error("Discount code {code} cannot be applied: {reason}")]
    DiscountUnavailable { code: String, reason: String },

    /// Caller is not allowed to perform the operation.
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// QR payload failed verification.
    #[error("Invalid ticket payload: {0}")]
    InvalidQrPayload(#[from] QrError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a Forbidden error.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        CoreError::Forbidden {
            reason: reason.into(),
        }
    }

    /// Creates an InvalidBookingStatus error from any debug-printable status.
    pub fn booking_status(booking_id: impl Into<String>, status: impl std::fmt::Debug) -> Self {
        CoreError::InvalidBookingStatus {
            booking_id: booking_id.into(),
            current_status: format!("{:?}", status),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two fields are inconsistent with each other.
    #[error("{field} is invalid: {reason}")]
    Inconsistent { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientInventory {
            event_id: "evt-1".to_string(),
            available: 0,
            requested: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient inventory for event evt-1: available 0, requested 1"
        );
    }

    #[test]
    fn test_booking_status_helper() {
        let err = CoreError::booking_status("b-1", crate::types::BookingStatus::Confirmed);
        assert_eq!(
            err.to_string(),
            "Booking b-1 is Confirmed, cannot perform operation"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "title".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
