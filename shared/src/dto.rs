use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PaymentStatus;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub size_id: i32,
    pub quantity: i32,
}

/// Body of `POST /orders`. Without `orderItems` the buyer's cart is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub name: String,
    pub phone_number: String,
    pub address: String,
    #[serde(default)]
    pub use_point: i32,
    #[serde(default)]
    pub order_items: Option<Vec<OrderItemRequest>>,
}

impl CreateOrderRequest {
    pub fn uses_cart(&self) -> bool {
        self.order_items.as_ref().map_or(true, Vec::is_empty)
    }
}

/// Body of `PATCH /orders/:orderId`. Only shipping fields are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShippingRequest {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

impl UpdateShippingRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone_number.is_none() && self.address.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        let page = self.page.unwrap_or(1).max(1);
        (page - 1).saturating_mul(self.limit())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone_number: String,
    pub subtotal: f64,
    pub total_quantity: i32,
    pub use_point: i32,
    pub created_at: DateTime<Utc>,
    pub order_items: Vec<OrderItemView>,
    pub payments: Option<PaymentView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub id: Uuid,
    pub price: f64,
    pub quantity: i32,
    pub is_reviewed: bool,
    pub product_id: Uuid,
    pub product: ProductSummary,
    pub size: SizeView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub reviews: Vec<ReviewView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: Uuid,
    pub rating: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeView {
    pub size: SizeLabel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLabel {
    pub en: String,
    pub ko: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    pub id: Uuid,
    pub price: f64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_accepts_camel_case_and_defaults() {
        let product_id = Uuid::new_v4();
        let request: CreateOrderRequest = serde_json::from_value(json!({
            "name": "Kim",
            "phoneNumber": "010-1234-5678",
            "address": "Seoul",
            "orderItems": [{ "productId": product_id, "sizeId": 2, "quantity": 1 }]
        }))
        .unwrap();

        assert_eq!(request.use_point, 0);
        assert!(!request.uses_cart());
        assert_eq!(request.order_items.unwrap()[0].size_id, 2);
    }

    #[test]
    fn missing_or_empty_items_fall_back_to_cart() {
        let mut request: CreateOrderRequest = serde_json::from_value(json!({
            "name": "Kim",
            "phoneNumber": "010",
            "address": "Seoul",
            "usePoint": 100
        }))
        .unwrap();
        assert!(request.uses_cart());

        request.order_items = Some(Vec::new());
        assert!(request.uses_cart());
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(Pagination::default().limit(), 10);
        assert_eq!(Pagination::default().offset(), 0);

        let page = Pagination {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(page.offset(), 40);

        let silly = Pagination {
            page: Some(-4),
            limit: Some(5000),
        };
        assert_eq!(silly.limit(), 100);
        assert_eq!(silly.offset(), 0);
    }

    #[test]
    fn response_serializes_in_read_model_shape() {
        let now = Utc::now();
        let response = OrderResponse {
            id: Uuid::new_v4(),
            name: "Kim".into(),
            address: "Seoul".into(),
            phone_number: "010".into(),
            subtotal: 18000.0,
            total_quantity: 2,
            use_point: 18000,
            created_at: now,
            order_items: vec![OrderItemView {
                id: Uuid::new_v4(),
                price: 9000.0,
                quantity: 2,
                is_reviewed: false,
                product_id: Uuid::new_v4(),
                product: ProductSummary {
                    name: "Shirt".into(),
                    image: None,
                    reviews: Vec::new(),
                },
                size: SizeView {
                    size: SizeLabel {
                        en: "M".into(),
                        ko: "중".into(),
                    },
                },
            }],
            payments: None,
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["phoneNumber"], "010");
        assert_eq!(value["totalQuantity"], 2);
        assert_eq!(value["usePoint"], 18000);
        assert_eq!(value["orderItems"][0]["isReviewed"], false);
        assert_eq!(value["orderItems"][0]["size"]["size"]["en"], "M");
        assert!(value["orderItems"][0]["product"].get("image").is_none());
        assert!(value["payments"].is_null());
    }
}
