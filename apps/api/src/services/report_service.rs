//! Organizer revenue summaries.

use std::sync::Arc;

use serde::Serialize;

use eventhub_core::{AuthContext, EventRevenue, Role};

use crate::error::ApiResult;
use crate::state::AppState;

/// Revenue lines plus totals across them.
#[derive(Debug, Clone, Serialize)]
pub struct RevenueReport {
    pub organizer_id: String,
    pub events: Vec<EventRevenue>,
    pub total_tickets_sold: i64,
    pub total_revenue_cents: i64,
}

/// Report service.
pub struct ReportService {
    state: Arc<AppState>,
}

impl ReportService {
    pub fn new(state: Arc<AppState>) -> Self {
        ReportService { state }
    }

    /// Per-event revenue for the caller, or for `organizer_id` when an
    /// admin asks on their behalf.
    pub async fn organizer_revenue(
        &self,
        ctx: &AuthContext,
        organizer_id: Option<&str>,
    ) -> ApiResult<RevenueReport> {
        ctx.require_role(&[Role::Organizer, Role::Admin])?;

        let organizer_id = match organizer_id {
            Some(id) if id != ctx.user_id => {
                ctx.require_admin()?;
                id
            }
            _ => ctx.user_id.as_str(),
        };

        let events = self.state.db.events().revenue_for_organizer(organizer_id).await?;

        Ok(RevenueReport {
            organizer_id: organizer_id.to_string(),
            total_tickets_sold: events.iter().map(|e| e.tickets_sold).sum(),
            total_revenue_cents: events.iter().map(|e| e.revenue_cents).sum(),
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use eventhub_core::PaymentMethod;

    use crate::error::ErrorCode;
    use crate::services::booking_service::{BookingService, CreateBookingRequest};
    use crate::services::payment_service::{PaymentService, ProcessPaymentRequest};
    use crate::services::test_support;

    #[tokio::test]
    async fn test_revenue_counts_paid_bookings_only() {
        let state = test_support::state().await;
        let organizer = test_support::user(&state, Role::Organizer).await;
        let customer = test_support::user(&state, Role::Customer).await;
        let event =
            test_support::event_for(&state, &organizer, 20, 1000, Utc::now() + Duration::days(5))
                .await;
        let bookings = BookingService::new(state.clone());

        let paid = bookings
            .create_booking(
                &customer,
                CreateBookingRequest {
                    event_id: event.id.clone(),
                    quantity: 3,
                    discount_code: None,
                },
            )
            .await
            .unwrap();
        PaymentService::new(state.clone())
            .process_payment(
                &customer,
                ProcessPaymentRequest {
                    booking_id: paid.id.clone(),
                    method: PaymentMethod::BankTransfer,
                    amount_cents: paid.total_cents,
                },
            )
            .await
            .unwrap();

        // Unpaid: not counted
        bookings
            .create_booking(
                &customer,
                CreateBookingRequest {
                    event_id: event.id.clone(),
                    quantity: 2,
                    discount_code: None,
                },
            )
            .await
            .unwrap();

        let report = ReportService::new(state.clone())
            .organizer_revenue(&organizer, None)
            .await
            .unwrap();

        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].tickets_sold, 3);
        assert_eq!(report.total_revenue_cents, 3000);
    }

    #[tokio::test]
    async fn test_other_organizers_need_admin() {
        let state = test_support::state().await;
        let organizer = test_support::user(&state, Role::Organizer).await;
        let rival = test_support::user(&state, Role::Organizer).await;
        let admin = test_support::user(&state, Role::Admin).await;
        let customer = test_support::user(&state, Role::Customer).await;
        let service = ReportService::new(state);

        let err = service
            .organizer_revenue(&rival, Some(&organizer.user_id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let err = service.organizer_revenue(&customer, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let report = service
            .organizer_revenue(&admin, Some(&organizer.user_id))
            .await
            .unwrap();
        assert_eq!(report.organizer_id, organizer.user_id);
        assert!(report.events.is_empty());
    }
}
