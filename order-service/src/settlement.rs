use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use shared::points::{check_balance, check_full_payment};
use shared::OrderError;
use uuid::Uuid;

use crate::schema::users;

pub async fn point_balance(
    conn: &mut AsyncPgConnection,
    buyer_id: Uuid,
) -> Result<i32, OrderError> {
    users::table
        .filter(users::id.eq(buyer_id))
        .select(users::points)
        .first::<i32>(conn)
        .await
        .optional()?
        .ok_or(OrderError::BuyerNotFound(buyer_id))
}

/// Settle an order of `subtotal` entirely with the buyer's points.
///
/// Runs inside the order transaction, before the order row exists. The debit
/// is conditional on the balance still covering it, so two concurrent orders
/// cannot overdraw the same buyer. Returns the points debited.
pub async fn settle(
    conn: &mut AsyncPgConnection,
    buyer_id: Uuid,
    use_point: i32,
    subtotal: &BigDecimal,
) -> Result<i32, OrderError> {
    let use_point = check_full_payment(use_point, subtotal)?;
    if use_point == 0 {
        return Ok(0);
    }

    let balance = point_balance(conn, buyer_id).await?;
    check_balance(balance, use_point)?;

    let debited = diesel::update(
        users::table
            .filter(users::id.eq(buyer_id))
            .filter(users::points.ge(use_point)),
    )
    .set(users::points.eq(users::points - use_point))
    .execute(conn)
    .await?;

    if debited == 0 {
        let available = point_balance(conn, buyer_id).await?;
        return Err(OrderError::InsufficientPoints {
            requested: use_point,
            available,
        });
    }

    Ok(use_point)
}
