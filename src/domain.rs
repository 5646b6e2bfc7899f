//! Core order domain types and the total-price arithmetic.
//!
//! All money math uses [`rust_decimal::Decimal`], never binary floats, so
//! totals are exact (3 * 19.99 is 59.97, not 59.970000000000006).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an order.
///
/// Transitions are monotonic: orders are created [`OrderStatus::New`] and
/// only the consumer-side processor moves them to
/// [`OrderStatus::Processed`]. No backward transition exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Committed, event may or may not have been published yet.
    New,
    /// Terminal state applied by the order processor.
    Processed,
}

impl OrderStatus {
    /// The persisted string form of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Processed => "PROCESSED",
        }
    }

    /// Parse a persisted status string. `None` for anything outside the
    /// known lifecycle; the caller treats that as a data-integrity
    /// violation, not a recoverable state.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(Self::New),
            "PROCESSED" => Some(Self::Processed),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line item as supplied by the caller, before persistence.
///
/// Schema validation (quantity > 0, price > 0) happens at the HTTP boundary;
/// by the time a `NewOrderItem` reaches the store it is assumed well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    /// Opaque reference to an external product catalog; no referential
    /// integrity is enforced on it.
    pub product_id: Uuid,
    /// Number of units, strictly positive.
    pub quantity: i32,
    /// Unit price at the time of order, strictly positive.
    pub price: Decimal,
}

/// A persisted line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    /// Item identifier, generated at creation.
    pub id: Uuid,
    /// Owning order.
    pub order_id: Uuid,
    /// Opaque product reference.
    pub product_id: Uuid,
    /// Number of units.
    pub quantity: i32,
    /// Unit price at the time of order.
    pub price: Decimal,
}

/// A fully materialized order with its eagerly loaded items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Order identifier, generated at creation, immutable.
    pub id: Uuid,
    /// Caller-supplied customer reference, immutable.
    pub customer_id: Uuid,
    /// Current lifecycle state.
    pub status: OrderStatus,
    /// Sum of `quantity * price` over the items at creation time; never
    /// recomputed afterwards.
    pub total_price: Decimal,
    /// Set once at creation.
    pub created_at: DateTime<Utc>,
    /// Touched on every mutation.
    pub updated_at: DateTime<Utc>,
    /// The order's line items.
    pub items: Vec<OrderItem>,
}

/// Exact decimal total over a list of new items.
///
/// An empty list totals zero: an order with no items is valid.
#[must_use]
pub fn total_price(items: &[NewOrderItem]) -> Decimal {
    items
        .iter()
        .map(|item| Decimal::from(item.quantity) * item.price)
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(quantity: i32, price: &str) -> NewOrderItem {
        NewOrderItem {
            product_id: Uuid::new_v4(),
            quantity,
            price: price.parse().unwrap(),
        }
    }

    #[test]
    fn total_is_exact_decimal_sum() {
        let total = total_price(&[item(3, "19.99")]);
        assert_eq!(total, "59.97".parse::<Decimal>().unwrap());
        assert_eq!(total.to_string(), "59.97");
    }

    #[test]
    fn total_of_mixed_items() {
        let total = total_price(&[item(2, "50.00"), item(1, "30.00")]);
        assert_eq!(total.to_string(), "130.00");
    }

    #[test]
    fn empty_order_totals_zero() {
        assert_eq!(total_price(&[]), Decimal::ZERO);
    }

    #[test]
    fn status_round_trips_through_persisted_form() {
        for status in [OrderStatus::New, OrderStatus::Processed] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("SHIPPED"), None);
    }

    proptest! {
        // No floating-point drift: the decimal total always equals the
        // integer cent total, for any mix of quantities and cent prices.
        #[test]
        fn total_matches_integer_cent_arithmetic(
            items in prop::collection::vec((1..=1_000i32, 1..=1_000_000i64), 0..20)
        ) {
            let new_items: Vec<NewOrderItem> = items
                .iter()
                .map(|&(quantity, cents)| NewOrderItem {
                    product_id: Uuid::new_v4(),
                    quantity,
                    price: Decimal::new(cents, 2),
                })
                .collect();

            let expected_cents: i128 = items
                .iter()
                .map(|&(quantity, cents)| i128::from(quantity) * i128::from(cents))
                .sum();

            prop_assert_eq!(
                total_price(&new_items),
                Decimal::from_i128_with_scale(expected_cents, 2)
            );
        }
    }
}
