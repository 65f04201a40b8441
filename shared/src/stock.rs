use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrderError;

/// Inventory is keyed by (product, size).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockKey {
    pub product_id: Uuid,
    pub size_id: i32,
}

impl StockKey {
    pub fn new(product_id: Uuid, size_id: i32) -> Self {
        Self { product_id, size_id }
    }
}

/// Remaining quantity per (product, size), as read inside the order transaction.
pub type StockLevels = HashMap<StockKey, i32>;

/// Check that every requested (product, size) has a stock row holding at
/// least the requested quantity.
///
/// Demand for the same key is summed first, so two lines for one size cannot
/// each pass against the same units. Keys are checked in sorted order so the
/// reported failure is deterministic.
pub fn validate_stock<I>(requests: I, levels: &StockLevels) -> Result<(), OrderError>
where
    I: IntoIterator<Item = (StockKey, i32)>,
{
    let mut demand: Vec<(StockKey, i32)> = Vec::new();
    for (key, quantity) in requests {
        match demand.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, total)) => *total = total.saturating_add(quantity),
            None => demand.push((key, quantity)),
        }
    }
    demand.sort_by_key(|(key, _)| *key);

    for (key, requested) in demand {
        let available = levels
            .get(&key)
            .copied()
            .ok_or_else(|| OrderError::StockNotFound {
                product_id: key.product_id,
                size_id: key.size_id,
            })?;

        if available < requested {
            return Err(OrderError::InsufficientStock {
                product_id: key.product_id,
                size_id: key.size_id,
                requested,
                available,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(entries: &[(StockKey, i32)]) -> StockLevels {
        entries.iter().copied().collect()
    }

    #[test]
    fn accepts_exact_quantity() {
        let key = StockKey::new(Uuid::new_v4(), 1);
        assert!(validate_stock([(key, 2)], &levels(&[(key, 2)])).is_ok());
    }

    #[test]
    fn missing_row_is_stock_not_found() {
        let key = StockKey::new(Uuid::new_v4(), 1);
        let other = StockKey::new(key.product_id, 2);
        let err = validate_stock([(key, 1)], &levels(&[(other, 10)])).unwrap_err();
        assert!(matches!(err, OrderError::StockNotFound { size_id: 1, .. }));
    }

    #[test]
    fn shortfall_reports_requested_and_available() {
        let key = StockKey::new(Uuid::new_v4(), 4);
        let err = validate_stock([(key, 3)], &levels(&[(key, 2)])).unwrap_err();
        match err {
            OrderError::InsufficientStock {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_lines_are_summed() {
        let key = StockKey::new(Uuid::new_v4(), 1);
        let err = validate_stock([(key, 2), (key, 2)], &levels(&[(key, 3)])).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            }
        ));
    }

    #[test]
    fn zero_stock_row_rejects_any_quantity() {
        let key = StockKey::new(Uuid::new_v4(), 1);
        let err = validate_stock([(key, 1)], &levels(&[(key, 0)])).unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock { available: 0, .. }));
    }
}
