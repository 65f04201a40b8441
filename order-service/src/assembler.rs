//! Order creation and the buyer-facing order operations.
//!
//! Creation is one database transaction. Its writes always happen in the
//! same order: points, order, line items, stock, sold-out flags, payment.
//! Any failure rolls back everything, so a half-created order is never
//! visible. Stock notifications go out only after the commit.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use shared::{
    plan_order, CreateOrderRequest, OrderError, OrderItemRequest, OrderPlan, OrderResponse,
    Pagination, PaymentStatus, StockEvent, StockKey, UpdateShippingRequest,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::ledger;
use crate::models::*;
use crate::notifications::StockEventPublisher;
use crate::projection;
use crate::schema::*;
use crate::settlement;

pub type DbPool = Pool<AsyncPgConnection>;

/// Input of the order transaction, shared by direct and cart-based orders.
#[derive(Debug, Clone)]
pub struct NewOrderInput {
    pub name: String,
    pub phone_number: String,
    pub address: String,
    pub use_point: i32,
    pub items: Vec<OrderItemRequest>,
}

impl NewOrderInput {
    pub fn from_request(request: CreateOrderRequest, items: Vec<OrderItemRequest>) -> Self {
        Self {
            name: request.name,
            phone_number: request.phone_number,
            address: request.address,
            use_point: request.use_point,
            items,
        }
    }
}

/// What a committed order changed in inventory.
struct StockOutcome {
    decremented: Vec<(StockKey, i32)>,
    sold_out: Vec<Uuid>,
}

#[derive(Clone)]
pub struct OrderAssembler {
    pool: DbPool,
    publisher: Arc<dyn StockEventPublisher>,
    conflict_retries: u32,
}

impl OrderAssembler {
    pub fn new(pool: DbPool, publisher: Arc<dyn StockEventPublisher>) -> Self {
        Self {
            pool,
            publisher,
            conflict_retries: 0,
        }
    }

    /// Re-run the whole transaction up to `retries` more times after a lost
    /// stock race. Zero surfaces the conflict immediately.
    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }

    pub(crate) async fn conn(
        &self,
    ) -> Result<PooledConnection<'_, AsyncPgConnection>, OrderError> {
        self.pool
            .get()
            .await
            .map_err(|e| OrderError::Unavailable(e.to_string()))
    }

    pub async fn create_order(
        &self,
        buyer_id: Uuid,
        input: NewOrderInput,
    ) -> Result<OrderResponse, OrderError> {
        let mut attempt = 0;
        loop {
            match self.try_create_order(buyer_id, input.clone()).await {
                Err(e) if e.is_conflict() && attempt < self.conflict_retries => {
                    attempt += 1;
                    warn!("Retrying order for buyer {} after stock conflict ({}/{}): {}",
                        buyer_id, attempt, self.conflict_retries, e);
                }
                Err(e) => {
                    warn!("Order for buyer {} aborted: {}", buyer_id, e);
                    return Err(e);
                }
                Ok(order) => return Ok(order),
            }
        }
    }

    async fn try_create_order(
        &self,
        buyer_id: Uuid,
        input: NewOrderInput,
    ) -> Result<OrderResponse, OrderError> {
        let mut conn = self.conn().await?;
        let now = Utc::now();

        let (order, outcome) = conn
            .transaction::<_, OrderError, _>(|conn| {
                Box::pin(async move { create_in_transaction(conn, buyer_id, input, now).await })
            })
            .await?;

        info!(
            "Order {} created for buyer {}: subtotal {}, {} line(s)",
            order.id,
            buyer_id,
            order.subtotal,
            order.order_items.len()
        );

        self.publish_stock_events(order.id, outcome, now);
        Ok(order)
    }

    fn publish_stock_events(&self, order_id: Uuid, outcome: StockOutcome, at: DateTime<Utc>) {
        for (key, quantity) in outcome.decremented {
            self.publisher.publish(StockEvent::Decremented {
                product_id: key.product_id,
                size_id: key.size_id,
                quantity,
                order_id,
                occurred_at: at,
            });
        }
        for product_id in outcome.sold_out {
            self.publisher.publish(StockEvent::SoldOut {
                product_id,
                occurred_at: at,
            });
        }
    }

    pub async fn list_orders(
        &self,
        buyer_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<OrderResponse>, OrderError> {
        let mut conn = self.conn().await?;
        projection::list_orders(&mut conn, buyer_id, page).await
    }

    pub async fn get_order(
        &self,
        buyer_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderResponse, OrderError> {
        let mut conn = self.conn().await?;
        projection::find_order(&mut conn, buyer_id, order_id)
            .await?
            .ok_or(OrderError::OrderNotFoundOrForbidden(order_id))
    }

    /// Merge new shipping details into an order the buyer owns. Financial
    /// fields are not part of the changeset and never change.
    pub async fn update_shipping(
        &self,
        buyer_id: Uuid,
        order_id: Uuid,
        request: UpdateShippingRequest,
    ) -> Result<OrderResponse, OrderError> {
        let mut conn = self.conn().await?;

        if !request.is_empty() {
            let updated = diesel::update(
                orders::table
                    .filter(orders::id.eq(order_id))
                    .filter(orders::buyer_id.eq(buyer_id)),
            )
            .set(ShippingChangeset::from(request))
            .execute(&mut conn)
            .await?;

            if updated == 0 {
                return Err(OrderError::OrderNotFoundOrForbidden(order_id));
            }
            info!("Updated shipping details of order {}", order_id);
        }

        projection::find_order(&mut conn, buyer_id, order_id)
            .await?
            .ok_or(OrderError::OrderNotFoundOrForbidden(order_id))
    }

    /// Hard delete; line items and the payment row cascade.
    pub async fn delete_order(&self, buyer_id: Uuid, order_id: Uuid) -> Result<(), OrderError> {
        let mut conn = self.conn().await?;

        let deleted = diesel::delete(
            orders::table
                .filter(orders::id.eq(order_id))
                .filter(orders::buyer_id.eq(buyer_id)),
        )
        .execute(&mut conn)
        .await?;

        if deleted == 0 {
            return Err(OrderError::OrderNotFoundOrForbidden(order_id));
        }

        info!("Deleted order {} of buyer {}", order_id, buyer_id);
        Ok(())
    }
}

async fn create_in_transaction(
    conn: &mut AsyncPgConnection,
    buyer_id: Uuid,
    input: NewOrderInput,
    now: DateTime<Utc>,
) -> Result<(OrderResponse, StockOutcome), OrderError> {
    if input.items.is_empty() {
        return Err(OrderError::EmptyOrderItems);
    }

    let mut product_ids: Vec<Uuid> = input.items.iter().map(|item| item.product_id).collect();
    product_ids.sort_unstable();
    product_ids.dedup();
    let keys: Vec<StockKey> = input
        .items
        .iter()
        .map(|item| StockKey::new(item.product_id, item.size_id))
        .collect();

    let pricing = ledger::load_pricing(conn, product_ids).await?;
    let stock = ledger::load_stock(conn, &keys).await?;
    let plan = plan_order(&input.items, &pricing, &stock, now)?;

    let use_point = settlement::settle(conn, buyer_id, input.use_point, &plan.subtotal).await?;

    let order_id = Uuid::new_v4();
    insert_order(conn, order_id, buyer_id, &input, &plan, use_point).await?;

    ledger::decrement_lines(conn, &plan.lines).await?;
    let sold_out = ledger::mark_sold_out(conn, &plan.product_ids()).await?;

    // Points cover the whole subtotal, so nothing is charged in currency.
    diesel::insert_into(payments::table)
        .values(&NewPayment {
            id: Uuid::new_v4(),
            order_id,
            price: BigDecimal::from(0),
            status: PaymentStatus::Completed.as_str().to_string(),
        })
        .execute(conn)
        .await?;

    let order = projection::find_order(conn, buyer_id, order_id)
        .await?
        .ok_or(OrderError::OrderNotFoundOrForbidden(order_id))?;

    let outcome = StockOutcome {
        decremented: plan
            .lines
            .iter()
            .map(|line| (line.key(), line.quantity))
            .collect(),
        sold_out,
    };

    Ok((order, outcome))
}

async fn insert_order(
    conn: &mut AsyncPgConnection,
    order_id: Uuid,
    buyer_id: Uuid,
    input: &NewOrderInput,
    plan: &OrderPlan,
    use_point: i32,
) -> Result<(), OrderError> {
    diesel::insert_into(orders::table)
        .values(&NewOrder {
            id: order_id,
            buyer_id,
            name: input.name.clone(),
            phone_number: input.phone_number.clone(),
            address: input.address.clone(),
            subtotal: plan.subtotal.clone(),
            total_quantity: plan.total_quantity,
            use_point,
        })
        .execute(conn)
        .await?;

    let items: Vec<NewOrderItem> = plan
        .lines
        .iter()
        .map(|line| NewOrderItem {
            id: Uuid::new_v4(),
            order_id,
            product_id: line.product_id,
            size_id: line.size_id,
            quantity: line.quantity,
            price: line.unit_price.clone(),
        })
        .collect();

    diesel::insert_into(order_items::table)
        .values(&items)
        .execute(conn)
        .await?;

    Ok(())
}
