//! Pure part of order creation: pricing every line, checking stock and
//! totalling the order before anything is written.

use std::collections::{BTreeSet, HashMap};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::dto::OrderItemRequest;
use crate::error::OrderError;
use crate::pricing::ProductPricing;
use crate::stock::{validate_stock, StockKey, StockLevels};

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLine {
    pub product_id: Uuid,
    pub size_id: i32,
    pub quantity: i32,
    /// Effective unit price captured at order time.
    pub unit_price: BigDecimal,
}

impl PlannedLine {
    pub fn key(&self) -> StockKey {
        StockKey::new(self.product_id, self.size_id)
    }

    pub fn line_total(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlan {
    pub lines: Vec<PlannedLine>,
    pub subtotal: BigDecimal,
    pub total_quantity: i32,
}

impl OrderPlan {
    /// Distinct products touched by the order, in a stable order.
    pub fn product_ids(&self) -> Vec<Uuid> {
        self.lines
            .iter()
            .map(|line| line.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Build the plan for `items` from pricing and stock rows read in the
/// current transaction.
pub fn plan_order(
    items: &[OrderItemRequest],
    pricing: &HashMap<Uuid, ProductPricing>,
    stock: &StockLevels,
    now: DateTime<Utc>,
) -> Result<OrderPlan, OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyOrderItems);
    }

    if let Some(item) = items.iter().find(|item| item.quantity < 1) {
        return Err(OrderError::InvalidQuantity {
            product_id: item.product_id,
            size_id: item.size_id,
        });
    }

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let product = pricing
            .get(&item.product_id)
            .ok_or(OrderError::PriceNotFound(item.product_id))?;

        lines.push(PlannedLine {
            product_id: item.product_id,
            size_id: item.size_id,
            quantity: item.quantity,
            unit_price: product.effective_price(now),
        });
    }

    validate_stock(lines.iter().map(|line| (line.key(), line.quantity)), stock)?;

    let subtotal = lines
        .iter()
        .fold(BigDecimal::from(0), |acc, line| acc + line.line_total());
    let total_quantity = lines
        .iter()
        .try_fold(0i32, |acc, line| acc.checked_add(line.quantity))
        .ok_or(OrderError::QuantityTooLarge)?;

    Ok(OrderPlan {
        lines,
        subtotal,
        total_quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn window_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn discounted(product_id: Uuid) -> ProductPricing {
        ProductPricing {
            product_id,
            price: BigDecimal::from(10000),
            discount_rate: Some(10),
            discount_start: Some(window_start()),
            discount_end: Some(window_start() + Duration::days(7)),
        }
    }

    fn item(product_id: Uuid, size_id: i32, quantity: i32) -> OrderItemRequest {
        OrderItemRequest {
            product_id,
            size_id,
            quantity,
        }
    }

    #[test]
    fn prices_lines_with_discount_snapshot() {
        let product_id = Uuid::new_v4();
        let pricing = HashMap::from([(product_id, discounted(product_id))]);
        let stock = StockLevels::from([(StockKey::new(product_id, 1), 5)]);

        let plan = plan_order(
            &[item(product_id, 1, 2)],
            &pricing,
            &stock,
            window_start() + Duration::days(1),
        )
        .unwrap();

        assert_eq!(plan.lines[0].unit_price, BigDecimal::from(9000));
        assert_eq!(plan.subtotal, BigDecimal::from(18000));
        assert_eq!(plan.total_quantity, 2);
    }

    #[test]
    fn totals_span_products_and_sizes() {
        let shirt = Uuid::new_v4();
        let hat = Uuid::new_v4();
        let pricing = HashMap::from([
            (shirt, discounted(shirt)),
            (
                hat,
                ProductPricing {
                    product_id: hat,
                    price: BigDecimal::from(2500),
                    discount_rate: None,
                    discount_start: None,
                    discount_end: None,
                },
            ),
        ]);
        let stock = StockLevels::from([
            (StockKey::new(shirt, 1), 1),
            (StockKey::new(shirt, 2), 1),
            (StockKey::new(hat, 1), 4),
        ]);

        let plan = plan_order(
            &[item(shirt, 1, 1), item(shirt, 2, 1), item(hat, 1, 3)],
            &pricing,
            &stock,
            window_start() - Duration::days(1),
        )
        .unwrap();

        // Outside the window: 10000 + 10000 + 3 * 2500
        assert_eq!(plan.subtotal, BigDecimal::from(27500));
        assert_eq!(plan.total_quantity, 5);
        assert_eq!(plan.product_ids().len(), 2);
    }

    #[test]
    fn empty_items_are_rejected() {
        let err = plan_order(&[], &HashMap::new(), &StockLevels::new(), Utc::now()).unwrap_err();
        assert!(matches!(err, OrderError::EmptyOrderItems));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let product_id = Uuid::new_v4();
        let err = plan_order(
            &[item(product_id, 1, 0)],
            &HashMap::new(),
            &StockLevels::new(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, OrderError::InvalidQuantity { .. }));
    }

    #[test]
    fn unknown_product_has_no_price() {
        let product_id = Uuid::new_v4();
        let stock = StockLevels::from([(StockKey::new(product_id, 1), 5)]);
        let err = plan_order(&[item(product_id, 1, 1)], &HashMap::new(), &stock, Utc::now())
            .unwrap_err();
        assert!(matches!(err, OrderError::PriceNotFound(id) if id == product_id));
    }

    #[test]
    fn stock_shortfall_aborts_the_plan() {
        let product_id = Uuid::new_v4();
        let pricing = HashMap::from([(product_id, discounted(product_id))]);
        let stock = StockLevels::from([(StockKey::new(product_id, 1), 1)]);
        let err = plan_order(&[item(product_id, 1, 2)], &pricing, &stock, Utc::now()).unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock { .. }));
    }

    #[test]
    fn total_quantity_past_i32_is_rejected() {
        let shirt = Uuid::new_v4();
        let hat = Uuid::new_v4();
        let pricing = HashMap::from([(shirt, discounted(shirt)), (hat, discounted(hat))]);
        let stock = StockLevels::from([
            (StockKey::new(shirt, 1), i32::MAX),
            (StockKey::new(hat, 1), i32::MAX),
        ]);

        let err = plan_order(
            &[item(shirt, 1, i32::MAX), item(hat, 1, 1)],
            &pricing,
            &stock,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, OrderError::QuantityTooLarge));
    }
}
