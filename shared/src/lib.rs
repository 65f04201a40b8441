use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod dto;
pub mod error;
pub mod plan;
pub mod points;
pub mod pricing;
pub mod stock;

pub use dto::*;
pub use error::OrderError;
pub use plan::{plan_order, OrderPlan, PlannedLine};
pub use pricing::ProductPricing;
pub use stock::{StockKey, StockLevels};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// Inventory change published to the notification side channel once the
/// order transaction has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StockEvent {
    #[serde(rename_all = "camelCase")]
    Decremented {
        product_id: Uuid,
        size_id: i32,
        quantity: i32,
        order_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    SoldOut {
        product_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
}

impl StockEvent {
    pub fn product_id(&self) -> Uuid {
        match self {
            StockEvent::Decremented { product_id, .. } | StockEvent::SoldOut { product_id, .. } => {
                *product_id
            }
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            StockEvent::Decremented { .. } => "StockDecremented",
            StockEvent::SoldOut { .. } => "ProductSoldOut",
        }
    }

    pub fn to_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_status_round_trips_through_its_column_value() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<PaymentStatus>(), Ok(status));
        }
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn sold_out_event_payload_is_tagged() {
        let product_id = Uuid::new_v4();
        let event = StockEvent::SoldOut {
            product_id,
            occurred_at: Utc::now(),
        };
        let value: serde_json::Value = serde_json::from_str(&event.to_payload().unwrap()).unwrap();
        assert_eq!(value["type"], "soldOut");
        assert_eq!(value["productId"], product_id.to_string());
        assert_eq!(event.product_id(), product_id);
        assert_eq!(event.event_type(), "ProductSoldOut");
    }
}
