//! Order read-model: orders joined up with their line items, size labels,
//! product summaries, the buyer's reviews and the payment row.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use num_traits::ToPrimitive;
use shared::{
    OrderError, OrderItemView, OrderResponse, Pagination, PaymentStatus, PaymentView,
    ProductSummary, ReviewView, SizeLabel, SizeView,
};
use tracing::warn;
use uuid::Uuid;

use crate::models::*;
use crate::schema::*;

fn to_number(value: &BigDecimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

pub async fn find_order(
    conn: &mut AsyncPgConnection,
    buyer_id: Uuid,
    order_id: Uuid,
) -> Result<Option<OrderResponse>, OrderError> {
    let order = orders::table
        .filter(orders::id.eq(order_id))
        .filter(orders::buyer_id.eq(buyer_id))
        .select(Order::as_select())
        .first::<Order>(conn)
        .await
        .optional()?;

    match order {
        Some(order) => Ok(project(conn, buyer_id, vec![order]).await?.pop()),
        None => Ok(None),
    }
}

/// A page of the buyer's orders, newest first.
pub async fn list_orders(
    conn: &mut AsyncPgConnection,
    buyer_id: Uuid,
    page: Pagination,
) -> Result<Vec<OrderResponse>, OrderError> {
    let orders = orders::table
        .filter(orders::buyer_id.eq(buyer_id))
        .order((orders::created_at.desc(), orders::id.desc()))
        .limit(page.limit())
        .offset(page.offset())
        .select(Order::as_select())
        .load::<Order>(conn)
        .await?;

    project(conn, buyer_id, orders).await
}

async fn project(
    conn: &mut AsyncPgConnection,
    buyer_id: Uuid,
    orders: Vec<Order>,
) -> Result<Vec<OrderResponse>, OrderError> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let items = OrderItem::belonging_to(&orders)
        .select(OrderItem::as_select())
        .load::<OrderItem>(conn)
        .await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|order| order.id).collect();
    let mut product_ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
    product_ids.sort_unstable();
    product_ids.dedup();
    let mut size_ids: Vec<i32> = items.iter().map(|item| item.size_id).collect();
    size_ids.sort_unstable();
    size_ids.dedup();

    let products: HashMap<Uuid, ProductSummaryRow> = products::table
        .filter(products::id.eq_any(product_ids.clone()))
        .select(ProductSummaryRow::as_select())
        .load::<ProductSummaryRow>(conn)
        .await?
        .into_iter()
        .map(|row| (row.id, row))
        .collect();

    let sizes: HashMap<i32, Size> = sizes::table
        .filter(sizes::id.eq_any(size_ids))
        .select(Size::as_select())
        .load::<Size>(conn)
        .await?
        .into_iter()
        .map(|size| (size.id, size))
        .collect();

    let mut reviews: HashMap<Uuid, Vec<ReviewView>> = HashMap::new();
    for review in reviews::table
        .filter(reviews::product_id.eq_any(product_ids))
        .filter(reviews::user_id.eq(buyer_id))
        .order(reviews::created_at.desc())
        .select(Review::as_select())
        .load::<Review>(conn)
        .await?
    {
        reviews.entry(review.product_id).or_default().push(ReviewView {
            id: review.id,
            rating: review.rating,
            content: review.content,
            created_at: review.created_at,
        });
    }

    let mut payments: HashMap<Uuid, Payment> = payments::table
        .filter(payments::order_id.eq_any(order_ids))
        .select(Payment::as_select())
        .load::<Payment>(conn)
        .await?
        .into_iter()
        .map(|payment| (payment.order_id, payment))
        .collect();

    let grouped = items.grouped_by(&orders);

    Ok(orders
        .into_iter()
        .zip(grouped)
        .map(|(order, mut items)| {
            items.sort_by_key(|item| (item.product_id, item.size_id));

            let order_items = items
                .into_iter()
                .map(|item| {
                    let product = products.get(&item.product_id);
                    let size = sizes.get(&item.size_id);
                    OrderItemView {
                        id: item.id,
                        price: to_number(&item.price),
                        quantity: item.quantity,
                        is_reviewed: item.is_reviewed,
                        product_id: item.product_id,
                        product: ProductSummary {
                            name: product.map(|p| p.name.clone()).unwrap_or_default(),
                            image: product.and_then(|p| p.image.clone()),
                            reviews: reviews.get(&item.product_id).cloned().unwrap_or_default(),
                        },
                        size: SizeView {
                            size: size
                                .map(|s| SizeLabel {
                                    en: s.en.clone(),
                                    ko: s.ko.clone(),
                                })
                                .unwrap_or_default(),
                        },
                    }
                })
                .collect();

            let payment = payments.remove(&order.id).and_then(|payment| {
                match payment.status.parse::<PaymentStatus>() {
                    Ok(status) => Some(PaymentView {
                        id: payment.id,
                        price: to_number(&payment.price),
                        status,
                        created_at: payment.created_at,
                    }),
                    Err(e) => {
                        warn!("Skipping payment {} of order {}: {}", payment.id, order.id, e);
                        None
                    }
                }
            });

            OrderResponse {
                id: order.id,
                name: order.name,
                address: order.address,
                phone_number: order.phone_number,
                subtotal: to_number(&order.subtotal),
                total_quantity: order.total_quantity,
                use_point: order.use_point,
                created_at: order.created_at,
                order_items,
                payments: payment,
            }
        })
        .collect())
}
