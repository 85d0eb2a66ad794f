//! # Booking Pricing
//!
//! Turns (event, quantity, optional discount) into the amounts stored on a
//! booking.
//!
//! ## Calculation
//! ```text
//! subtotal = price × quantity
//! discount = subtotal × percentage   (rounded half-up, once, on the subtotal)
//! total    = subtotal − discount
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Discount, Event};
use crate::validation::validate_quantity;

/// Amounts for a prospective booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookingQuote {
    pub event_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub discount_code: Option<String>,
}

impl BookingQuote {
    /// Returns the amount due as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Prices a booking of `quantity` tickets for `event`.
///
/// Checks quantity bounds, that the event is bookable, that the discount (if
/// any) applies, and, as a fast path, that the event currently shows enough
/// availability. The availability check here is advisory; the conditional
/// reservation in the database is the authoritative one.
pub fn quote_booking(
    event: &Event,
    quantity: i64,
    discount: Option<&Discount>,
    now: DateTime<Utc>,
) -> CoreResult<BookingQuote> {
    validate_quantity(quantity)?;
    event.ensure_bookable(now)?;

    if quantity > event.available_tickets {
        return Err(CoreError::InsufficientInventory {
            event_id: event.id.clone(),
            available: event.available_tickets,
            requested: quantity,
        });
    }

    let subtotal = event.price().multiply_quantity(quantity);

    let discount_amount = match discount {
        Some(d) => {
            d.ensure_applicable(&event.id, now)?;
            subtotal.percentage(d.percentage_bps.clamp(0, 10_000) as u32)
        }
        None => Money::zero(),
    };

    let total = subtotal - discount_amount;

    Ok(BookingQuote {
        event_id: event.id.clone(),
        quantity,
        unit_price_cents: event.price_cents,
        subtotal_cents: subtotal.cents(),
        discount_cents: discount_amount.cents(),
        total_cents: total.cents(),
        discount_code: discount.map(|d| d.code.clone()),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_TICKETS_PER_BOOKING;
    use chrono::Duration;

    fn event(now: DateTime<Utc>, available: i64) -> Event {
        Event {
            id: "evt-1".to_string(),
            organizer_id: "org-1".to_string(),
            venue_id: "ven-1".to_string(),
            title: "Jazz Night".to_string(),
            description: None,
            category: "music".to_string(),
            start_date: now + Duration::days(1),
            end_date: now + Duration::days(1) + Duration::hours(3),
            price_cents: 1999,
            total_tickets: 5,
            available_tickets: available,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn discount(now: DateTime<Utc>, bps: i64) -> Discount {
        Discount {
            id: "d-1".to_string(),
            code: "SAVE15".to_string(),
            percentage_bps: bps,
            event_id: None,
            valid_from: now - Duration::hours(1),
            valid_until: now + Duration::hours(1),
            max_uses: None,
            times_used: 0,
            is_active: true,
            created_at: now,
        }
    }

    #[test]
    fn test_quote_without_discount() {
        let now = Utc::now();
        let quote = quote_booking(&event(now, 5), 3, None, now).unwrap();
        assert_eq!(quote.subtotal_cents, 5997);
        assert_eq!(quote.discount_cents, 0);
        assert_eq!(quote.total_cents, 5997);
        assert_eq!(quote.discount_code, None);
    }

    #[test]
    fn test_quote_with_discount() {
        let now = Utc::now();
        let d = discount(now, 1500);
        let quote = quote_booking(&event(now, 5), 2, Some(&d), now).unwrap();
        // 3998 × 15% = 599.7 → 600
        assert_eq!(quote.subtotal_cents, 3998);
        assert_eq!(quote.discount_cents, 600);
        assert_eq!(quote.total_cents, 3398);
        assert_eq!(quote.discount_code.as_deref(), Some("SAVE15"));
    }

    #[test]
    fn test_quote_rejects_over_availability() {
        let now = Utc::now();
        let err = quote_booking(&event(now, 0), 1, None, now).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientInventory {
                available: 0,
                requested: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_quote_rejects_bad_quantity() {
        let now = Utc::now();
        assert!(quote_booking(&event(now, 5), 0, None, now).is_err());
        assert!(quote_booking(&event(now, 50), MAX_TICKETS_PER_BOOKING + 1, None, now).is_err());
    }

    #[test]
    fn test_full_discount_is_free() {
        let now = Utc::now();
        let d = discount(now, 10_000);
        let quote = quote_booking(&event(now, 5), 1, Some(&d), now).unwrap();
        assert_eq!(quote.total_cents, 0);
    }
}
