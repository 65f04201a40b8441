use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Price fields of a product as read at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPricing {
    pub product_id: Uuid,
    pub price: BigDecimal,
    /// Percentage, e.g. `10` for 10% off.
    pub discount_rate: Option<i32>,
    pub discount_start: Option<DateTime<Utc>>,
    pub discount_end: Option<DateTime<Utc>>,
}

impl ProductPricing {
    pub fn effective_price(&self, now: DateTime<Utc>) -> BigDecimal {
        effective_price(
            &self.price,
            self.discount_rate,
            self.discount_start,
            self.discount_end,
            now,
        )
    }
}

/// Whether a discount window contains `now`. Both bounds are inclusive and
/// an unset bound is open.
pub fn discount_active(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    let started = start.map_or(true, |start| now >= start);
    let not_ended = end.map_or(true, |end| now <= end);
    started && not_ended
}

/// Unit price after applying the discount active at `now`.
///
/// The result is left unrounded; it is the price of record for the line item.
pub fn effective_price(
    listed: &BigDecimal,
    discount_rate: Option<i32>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> BigDecimal {
    let rate = match discount_rate {
        Some(rate) if rate > 0 => rate.min(100),
        _ => return listed.clone(),
    };

    if !discount_active(start, end, now) {
        return listed.clone();
    }

    listed * BigDecimal::from(100 - rate) / BigDecimal::from(100)
}
