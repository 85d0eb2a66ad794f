//! # QR Ticket Payloads
//!
//! Encodes and verifies the string carried inside a ticket's QR code.
//!
//! ## Wire Format
//! ```text
//! EVH1|TKT-20261019-3FA85F64|<booking uuid>|<event uuid>|1792396800|<sig>
//! ─┬── ──────────┬────────── ──────┬─────── ─────┬────── ────┬───── ──┬──
//!  │             │                 │             │           │        │
//!  version    ticket number     booking id    event id    issued   base64url
//!  tag                                                    (unix)   HMAC-SHA256
//! ```
//!
//! The signature covers everything before the last `|`. Door staff can still
//! read the fields without the secret; only the server can mint or verify.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::validation::{validate_ticket_number, validate_uuid};

type HmacSha256 = Hmac<Sha256>;

/// Version tag leading every payload.
pub const PAYLOAD_VERSION: &str = "EVH1";

const FIELD_SEPARATOR: char = '|';
const FIELD_COUNT: usize = 6;
const MAX_PAYLOAD_LEN: usize = 256;

/// Payloads issued further in the future than this are rejected.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

// =============================================================================
// Errors
// =============================================================================

/// Why a payload failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QrError {
    #[error("malformed payload: {0}")]
    InvalidFormat(String),

    #[error("unsupported payload version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("signature mismatch")]
    InvalidSignature,

    #[error("signing key rejected")]
    InvalidKey,
}

// =============================================================================
// Payload
// =============================================================================

/// The verified fields of a ticket payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPayload {
    pub ticket_number: String,
    pub booking_id: String,
    pub event_id: String,
    /// Unix timestamp (seconds) of issuance.
    pub issued_at: i64,
}

impl TicketPayload {
    pub fn new(
        ticket_number: impl Into<String>,
        booking_id: impl Into<String>,
        event_id: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        TicketPayload {
            ticket_number: ticket_number.into(),
            booking_id: booking_id.into(),
            event_id: event_id.into(),
            issued_at: issued_at.timestamp(),
        }
    }

    fn unsigned_part(&self) -> String {
        format!(
            "{PAYLOAD_VERSION}{sep}{}{sep}{}{sep}{}{sep}{}",
            self.ticket_number,
            self.booking_id,
            self.event_id,
            self.issued_at,
            sep = FIELD_SEPARATOR
        )
    }
}

// =============================================================================
// Signer
// =============================================================================

/// Signs and verifies ticket payloads with a server-side secret.
#[derive(Clone)]
pub struct QrSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for QrSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrSigner").finish_non_exhaustive()
    }
}

impl QrSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        QrSigner {
            secret: secret.into(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, QrError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| QrError::InvalidKey)
    }

    /// Produces the signed payload string for `payload`.
    pub fn encode(&self, payload: &TicketPayload) -> Result<String, QrError> {
        let unsigned = payload.unsigned_part();
        let mut mac = self.mac()?;
        mac.update(unsigned.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{unsigned}{FIELD_SEPARATOR}{sig}"))
    }

    /// Parses, range-checks and authenticates a payload string.
    ///
    /// ## Checks
    /// 1. Length and field count
    /// 2. Version tag
    /// 3. Ticket number shape, UUID ids, timestamp not in the future
    /// 4. HMAC signature (constant-time comparison)
    pub fn verify(&self, raw: &str, now: DateTime<Utc>) -> Result<TicketPayload, QrError> {
        let raw = raw.trim();
        if raw.len() > MAX_PAYLOAD_LEN {
            return Err(QrError::InvalidFormat("payload too long".to_string()));
        }

        let fields: Vec<&str> = raw.split(FIELD_SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            return Err(QrError::InvalidFormat(format!(
                "expected {FIELD_COUNT} fields, found {}",
                fields.len()
            )));
        }

        if fields[0] != PAYLOAD_VERSION {
            return Err(QrError::UnsupportedVersion(fields[0].to_string()));
        }

        validate_ticket_number(fields[1]).map_err(|e| field_error("ticket number", e))?;
        validate_uuid(fields[2]).map_err(|e| field_error("booking id", e))?;
        validate_uuid(fields[3]).map_err(|e| field_error("event id", e))?;

        let issued_at: i64 = fields[4].parse().map_err(|_| QrError::InvalidField {
            field: "timestamp".to_string(),
            reason: "not an integer".to_string(),
        })?;
        if issued_at <= 0 || issued_at > now.timestamp() + MAX_FUTURE_SKEW_SECS {
            return Err(QrError::InvalidField {
                field: "timestamp".to_string(),
                reason: "out of range".to_string(),
            });
        }

        let sig = URL_SAFE_NO_PAD
            .decode(fields[5])
            .map_err(|_| QrError::InvalidSignature)?;

        // Signed part is everything before the final separator.
        let signed_len = raw.len() - fields[5].len() - 1;
        let mut mac = self.mac()?;
        mac.update(raw[..signed_len].as_bytes());
        mac.verify_slice(&sig).map_err(|_| QrError::InvalidSignature)?;

        Ok(TicketPayload {
            ticket_number: fields[1].to_string(),
            booking_id: fields[2].to_string(),
            event_id: fields[3].to_string(),
            issued_at,
        })
    }
}

fn field_error(field: &str, err: crate::error::ValidationError) -> QrError {
    QrError::InvalidField {
        field: field.to_string(),
        reason: err.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
