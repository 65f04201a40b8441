//! Inventory reads and writes for order creation.
//!
//! Validation reads plain rows, and the decrement is a conditional update
//! that re-checks the remaining quantity at write time. A decrement that
//! matches no row means a concurrent order got there first, and the caller's
//! transaction must abort.
//!
//! Row locks taken here are held until commit, so they are always taken in
//! key order: stock rows by (product, size), product rows by product id.

use std::collections::HashMap;

use diesel::dsl::sum;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use shared::{OrderError, PlannedLine, ProductPricing, StockKey, StockLevels};
use tracing::debug;
use uuid::Uuid;

use crate::models::{ProductPriceRow, Stock};
use crate::schema::{products, stocks};

pub async fn load_pricing(
    conn: &mut AsyncPgConnection,
    product_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, ProductPricing>, OrderError> {
    let rows = products::table
        .filter(products::id.eq_any(product_ids))
        .select(ProductPriceRow::as_select())
        .load::<ProductPriceRow>(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.id, ProductPricing::from(row)))
        .collect())
}

/// Stock rows for every requested key, read in one query.
pub async fn load_stock(
    conn: &mut AsyncPgConnection,
    keys: &[StockKey],
) -> Result<StockLevels, OrderError> {
    let product_ids: Vec<Uuid> = keys.iter().map(|key| key.product_id).collect();
    let size_ids: Vec<i32> = keys.iter().map(|key| key.size_id).collect();

    let rows = stocks::table
        .filter(stocks::product_id.eq_any(product_ids))
        .filter(stocks::size_id.eq_any(size_ids))
        .select(Stock::as_select())
        .load::<Stock>(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (StockKey::new(row.product_id, row.size_id), row.quantity))
        .filter(|(key, _)| keys.contains(key))
        .collect())
}

/// Decrement one stock row by `quantity`, only if at least that much remains.
pub async fn decrement(
    conn: &mut AsyncPgConnection,
    key: StockKey,
    quantity: i32,
) -> Result<(), OrderError> {
    let affected = diesel::update(
        stocks::table
            .filter(stocks::product_id.eq(key.product_id))
            .filter(stocks::size_id.eq(key.size_id))
            .filter(stocks::quantity.ge(quantity)),
    )
    .set(stocks::quantity.eq(stocks::quantity - quantity))
    .execute(conn)
    .await?;

    if affected == 0 {
        return Err(OrderError::ConcurrentStockConflict {
            product_id: key.product_id,
            size_id: key.size_id,
        });
    }

    debug!("Decremented stock {}/{} by {}", key.product_id, key.size_id, quantity);
    Ok(())
}

/// Decrement every line in stock-key order, whatever order the buyer listed them in.
pub async fn decrement_lines(
    conn: &mut AsyncPgConnection,
    lines: &[PlannedLine],
) -> Result<(), OrderError> {
    let mut ordered: Vec<&PlannedLine> = lines.iter().collect();
    ordered.sort_by_key(|line| line.key());

    for line in ordered {
        decrement(conn, line.key(), line.quantity).await?;
    }
    Ok(())
}

/// Total remaining stock across every size of a product.
pub async fn remaining_stock(
    conn: &mut AsyncPgConnection,
    product_id: Uuid,
) -> Result<i64, OrderError> {
    let total = stocks::table
        .filter(stocks::product_id.eq(product_id))
        .select(sum(stocks::quantity))
        .get_result::<Option<i64>>(conn)
        .await?;

    Ok(total.unwrap_or(0))
}

/// Flag every product in `product_ids` whose stock is exhausted as sold out.
///
/// Each product row is locked before its stock is summed. The sum runs after
/// the lock is granted, so it sees the decrements of any order that held the
/// lock and committed first. Returns the products that were newly flagged.
/// Clearing the flag on restock belongs to the product-update path, not here.
pub async fn mark_sold_out(
    conn: &mut AsyncPgConnection,
    product_ids: &[Uuid],
) -> Result<Vec<Uuid>, OrderError> {
    let mut ordered = product_ids.to_vec();
    ordered.sort_unstable();
    ordered.dedup();

    let mut sold_out = Vec::new();

    for product_id in ordered {
        // NO KEY UPDATE leaves the key-share locks of order_items foreign keys alone.
        products::table
            .find(product_id)
            .select(products::id)
            .for_no_key_update()
            .get_result::<Uuid>(conn)
            .await?;

        if remaining_stock(conn, product_id).await? > 0 {
            continue;
        }

        let flagged = diesel::update(
            products::table
                .filter(products::id.eq(product_id))
                .filter(products::is_sold_out.eq(false)),
        )
        .set(products::is_sold_out.eq(true))
        .execute(conn)
        .await?;

        if flagged > 0 {
            sold_out.push(product_id);
        }
    }

    Ok(sold_out)
}
