//! Payment gateway seam.
//!
//! The booking workflow only talks to [`PaymentGateway`]. Development and
//! tests run against [`MockPaymentGateway`]; a real processor integration
//! implements the same trait.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use eventhub_core::{Money, PaymentMethod};
use thiserror::Error;

/// Payment gateway result
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Boxed future returned by gateway calls.
pub type GatewayFuture<T> = Pin<Box<dyn Future<Output = GatewayResult<T>> + Send>>;

/// Payment gateway error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The processor refused the charge; the customer may retry.
    #[error("{reason}")]
    Declined { reason: String },

    #[error("gateway error: {message}")]
    Other { message: String },
}

/// A captured charge.
#[derive(Debug, Clone)]
pub struct ChargeReceipt {
    /// Gateway transaction id, stored as `Payment.transaction_reference`.
    pub transaction_id: String,
    pub amount: Money,
    pub method: PaymentMethod,
}

/// Payment gateway trait
///
/// Abstraction over card/PayPal/bank processors.
pub trait PaymentGateway: Send + Sync {
    /// Charges `amount` for the booking identified by `booking_reference`.
    fn charge(
        &self,
        booking_reference: &str,
        amount: Money,
        method: PaymentMethod,
    ) -> GatewayFuture<ChargeReceipt>;

    /// Refunds a previous charge, returning the refund id.
    fn refund(&self, transaction_id: &str, amount: Money) -> GatewayFuture<String>;
}

/// In-process gateway that approves everything unless told otherwise.
#[derive(Debug, Default)]
pub struct MockPaymentGateway {
    decline_reason: Option<String>,
    fail_refunds: bool,
    charges: AtomicUsize,
    refunds: AtomicUsize,
}

impl MockPaymentGateway {
    /// Creates a gateway that approves every charge and refund.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway that declines every charge with `reason`.
    pub fn declining(reason: impl Into<String>) -> Self {
        MockPaymentGateway {
            decline_reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Creates a gateway whose refunds fail.
    pub fn failing_refunds() -> Self {
        MockPaymentGateway {
            fail_refunds: true,
            ..Self::default()
        }
    }

    /// Creates an Arc-wrapped approving instance for sharing
    pub fn shared() -> Arc<dyn PaymentGateway> {
        Arc::new(Self::new())
    }

    /// Number of approved charges.
    pub fn charge_count(&self) -> usize {
        self.charges.load(Ordering::SeqCst)
    }

    /// Number of approved refunds.
    pub fn refund_count(&self) -> usize {
        self.refunds.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for MockPaymentGateway {
    fn charge(
        &self,
        booking_reference: &str,
        amount: Money,
        method: PaymentMethod,
    ) -> GatewayFuture<ChargeReceipt> {
        if let Some(reason) = &self.decline_reason {
            tracing::info!(
                booking_reference = %booking_reference,
                amount = amount.cents(),
                reason = %reason,
                "Mock payment declined"
            );
            let reason = reason.clone();
            return Box::pin(async move { Err(GatewayError::Declined { reason }) });
        }

        self.charges.fetch_add(1, Ordering::SeqCst);
        let transaction_id = format!("mock_txn_{}", uuid::Uuid::new_v4());

        tracing::info!(
            booking_reference = %booking_reference,
            amount = amount.cents(),
            transaction_id = %transaction_id,
            "Mock payment processed"
        );

        Box::pin(async move {
            Ok(ChargeReceipt {
                transaction_id,
                amount,
                method,
            })
        })
    }

    fn refund(&self, transaction_id: &str, amount: Money) -> GatewayFuture<String> {
        if self.fail_refunds {
            return Box::pin(async move {
                Err(GatewayError::Other {
                    message: "refunds unavailable".to_string(),
                })
            });
        }

        self.refunds.fetch_add(1, Ordering::SeqCst);
        let refund_id = format!("mock_refund_{}", uuid::Uuid::new_v4());

        tracing::info!(
            transaction_id = %transaction_id,
            amount = amount.cents(),
            refund_id = %refund_id,
            "Mock refund processed"
        );

        Box::pin(async move { Ok(refund_id) })
    }
}
