use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use shared::ProductPricing;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub address: String,
    pub subtotal: BigDecimal,
    pub total_quantity: i32,
    pub use_point: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub address: String,
    pub subtotal: BigDecimal,
    pub total_quantity: i32,
    pub use_point: i32,
}

/// Shipping fields are the only part of an order that may change after creation.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = orders)]
pub struct ShippingChangeset {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

impl From<shared::UpdateShippingRequest> for ShippingChangeset {
    fn from(request: shared::UpdateShippingRequest) -> Self {
        Self {
            name: request.name,
            phone_number: request.phone_number,
            address: request.address,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(Order, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub size_id: i32,
    pub quantity: i32,
    pub price: BigDecimal,
    pub is_reviewed: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub size_id: i32,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub price: BigDecimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub struct NewPayment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub price: BigDecimal,
    pub status: String,
}

/// Price columns of a product; everything order creation reads from `products`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductPriceRow {
    pub id: Uuid,
    pub price: BigDecimal,
    pub discount_rate: Option<i32>,
    pub discount_start_time: Option<DateTime<Utc>>,
    pub discount_end_time: Option<DateTime<Utc>>,
}

impl From<ProductPriceRow> for ProductPricing {
    fn from(row: ProductPriceRow) -> Self {
        Self {
            product_id: row.id,
            price: row.price,
            discount_rate: row.discount_rate,
            discount_start: row.discount_start_time,
            discount_end: row.discount_end_time,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductSummaryRow {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = stocks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Stock {
    pub product_id: Uuid,
    pub size_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sizes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Size {
    pub id: i32,
    pub en: String,
    pub ko: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Cart {
    pub id: Uuid,
    pub buyer_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub size_id: i32,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<CartItem> for shared::OrderItemRequest {
    fn from(item: CartItem) -> Self {
        Self {
            product_id: item.product_id,
            size_id: item.size_id,
            quantity: item.quantity,
        }
    }
}
