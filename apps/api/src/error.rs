//! # API Error Type
//!
//! Unified error type for services and HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in EventHub                               │
//! │                                                                         │
//! │  Handler → Service → Result<T, ApiError>                               │
//! │                         │                                               │
//! │  ValidationError ──► CoreError ──┐                                      │
//! │                                  ├──► ApiError { code, message }        │
//! │  sqlx::Error ──► DbError ────────┘         │                            │
//! │                                            ▼                            │
//! │                          IntoResponse: HTTP status from `code`          │
//! │                                                                         │
//! │  HTTP/1.1 409 Conflict                                                  │
//! │  {                                                                      │
//! │    "success": false,                                                    │
//! │    "code": "INSUFFICIENT_INVENTORY",                                    │
//! │    "message": "Only 3 tickets left, requested 5",                       │
//! │    "details": { "available": 3, "requested": 5 }                        │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Database internals are logged with `tracing::error!` and replaced with a
//! generic message; clients never see SQL.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use eventhub_core::{CoreError, ValidationError};
use eventhub_db::DbError;

/// Error returned by services and handlers.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Structured context (e.g. remaining inventory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing or invalid bearer token (401)
    Unauthorized,

    /// Authenticated but not allowed (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Duplicate or conflicting state (409)
    Conflict,

    /// Not enough tickets left (409)
    InsufficientInventory,

    /// Booking is in the wrong status for the operation (409)
    InvalidBookingStatus,

    /// Ticket is in the wrong status for the operation (409)
    InvalidTicketStatus,

    /// Event inactive or already started (422)
    EventNotBookable,

    /// Discount code cannot be applied (422)
    DiscountUnavailable,

    /// Paid amount differs from the booking total (422)
    PaymentAmountMismatch,

    /// Gateway declined the charge (402)
    PaymentDeclined,

    /// Gateway unreachable or refund failed (502)
    PaymentError,

    /// QR payload malformed, forged, or not matching the ticket (400)
    InvalidTicket,

    /// Database operation failed (500)
    DatabaseError,

    /// Database saturated (503)
    ServiceUnavailable,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError | ErrorCode::InvalidTicket => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict
            | ErrorCode::InsufficientInventory
            | ErrorCode::InvalidBookingStatus
            | ErrorCode::InvalidTicketStatus => StatusCode::CONFLICT,
            ErrorCode::EventNotBookable
            | ErrorCode::DiscountUnavailable
            | ErrorCode::PaymentAmountMismatch => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::PaymentDeclined => StatusCode::PAYMENT_REQUIRED,
            ErrorCode::PaymentError => StatusCode::BAD_GATEWAY,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches structured details.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an unauthorized (401) error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Creates a forbidden (403) error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field } => {
                let field = field.rsplit('.').next().unwrap_or("value").to_string();
                ApiError::new(ErrorCode::Conflict, format!("{} already exists", field))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::error!("Check constraint violation: {}", message);
                ApiError::new(ErrorCode::Conflict, "Change would violate a data constraint")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                tracing::warn!("Database pool exhausted");
                ApiError::new(ErrorCode::ServiceUnavailable, "Server busy, try again")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::EventNotFound(id) => ApiError::not_found("Event", &id),
            CoreError::BookingNotFound(id) => ApiError::not_found("Booking", &id),
            CoreError::TicketNotFound(id) => ApiError::not_found("Ticket", &id),
            CoreError::UserNotFound(id) => ApiError::not_found("User", &id),
            CoreError::VenueNotFound(id) => ApiError::not_found("Venue", &id),
            CoreError::InsufficientInventory {
                available,
                requested,
                ..
            } => ApiError::new(
                ErrorCode::InsufficientInventory,
                format!("Only {} tickets left, requested {}", available, requested),
            )
            .with_details(json!({ "available": available, "requested": requested })),
            CoreError::EventNotBookable { .. } => ApiError::new(ErrorCode::EventNotBookable, message),
            CoreError::InvalidBookingStatus { current_status, .. } => {
                ApiError::new(ErrorCode::InvalidBookingStatus, message)
                    .with_details(json!({ "status": current_status.to_lowercase() }))
            }
            CoreError::InvalidTicketStatus { current_status, .. } => {
                ApiError::new(ErrorCode::InvalidTicketStatus, message)
                    .with_details(json!({ "status": current_status.to_lowercase() }))
            }
            CoreError::PaymentAmountMismatch { expected, provided } => {
                ApiError::new(ErrorCode::PaymentAmountMismatch, message)
                    .with_details(json!({ "expected_cents": expected, "provided_cents": provided }))
            }
            CoreError::PaymentDeclined { .. } => ApiError::new(ErrorCode::PaymentDeclined, message),
            CoreError::DiscountUnavailable { .. } => {
                ApiError::new(ErrorCode::DiscountUnavailable, message)
            }
            CoreError::Forbidden { reason } => ApiError::forbidden(reason),
            CoreError::InvalidQrPayload(_) => ApiError::new(ErrorCode::InvalidTicket, message),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    code: ErrorCode,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        if status.is_server_error() {
            tracing::error!(code = ?self.code, message = %self.message, "Request failed");
        } else {
            tracing::debug!(code = ?self.code, message = %self.message, "Request rejected");
        }

        let body = ErrorBody {
            success: false,
            code: self.code,
            message: &self.message,
            details: self.details.as_ref(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for services and handlers.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// JSON extractor with API-shaped rejections
// =============================================================================

/// `Json<T>` whose rejection is an [`ApiError`] instead of axum's plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::validation(rejection.body_text())),
        }
    }
}

/// `Query<T>` with the same rejection shape as [`ApiJson`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(ApiError::validation(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_error_carries_details() {
        let err: ApiError = CoreError::InsufficientInventory {
            event_id: "evt-1".to_string(),
            available: 0,
            requested: 1,
        }
        .into();

        assert_eq!(err.code, ErrorCode::InsufficientInventory);
        assert_eq!(err.code.status(), StatusCode::CONFLICT);
        assert_eq!(err.details, Some(json!({ "available": 0, "requested": 1 })));
    }

    #[test]
    fn test_db_internals_are_hidden() {
        let err: ApiError = DbError::QueryFailed("near \"SELEC\": syntax error".to_string()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("SELEC"));

        let err: ApiError = DbError::UniqueViolation {
            field: "users.email".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.message, "email already exists");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::PaymentDeclined.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(ErrorCode::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ErrorCode::PaymentAmountMismatch.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::InsufficientInventory).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_INVENTORY\"");
    }
}
