use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use shared::{CreateOrderRequest, OrderError, OrderItemRequest, OrderResponse};
use tracing::{info, warn};
use uuid::Uuid;

use crate::assembler::{NewOrderInput, OrderAssembler};
use crate::models::{Cart, CartItem};
use crate::schema::{cart_items, carts};

/// Turns the buyer's cart into an order and empties the cart afterwards.
#[derive(Clone)]
pub struct CartBridge {
    assembler: OrderAssembler,
}

impl CartBridge {
    pub fn new(assembler: OrderAssembler) -> Self {
        Self { assembler }
    }

    pub async fn create_from_cart(
        &self,
        buyer_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, OrderError> {
        let (cart_id, items) = self.load_cart(buyer_id).await?;
        let ordered_ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        let requests = items.into_iter().map(OrderItemRequest::from).collect();

        let order = self
            .assembler
            .create_order(buyer_id, NewOrderInput::from_request(request, requests))
            .await?;

        // The order has committed; a failed cleanup leaves the cart stale
        // but does not undo the order.
        if let Err(e) = self.clear_cart(cart_id, ordered_ids).await {
            warn!("Order {} created but cart {} was not cleared: {}", order.id, cart_id, e);
        }

        Ok(order)
    }

    async fn load_cart(&self, buyer_id: Uuid) -> Result<(Uuid, Vec<CartItem>), OrderError> {
        let mut conn = self.assembler.conn().await?;

        let cart = carts::table
            .filter(carts::buyer_id.eq(buyer_id))
            .select(Cart::as_select())
            .first::<Cart>(&mut conn)
            .await
            .optional()?
            .ok_or(OrderError::EmptyCart)?;

        let items = cart_items::table
            .filter(cart_items::cart_id.eq(cart.id))
            .order(cart_items::created_at.asc())
            .select(CartItem::as_select())
            .load::<CartItem>(&mut conn)
            .await?;

        if items.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        Ok((cart.id, items))
    }

    /// Remove the ordered items only; anything added since `load_cart` stays.
    async fn clear_cart(&self, cart_id: Uuid, item_ids: Vec<Uuid>) -> Result<(), OrderError> {
        let mut conn = self.assembler.conn().await?;

        let removed = diesel::delete(
            cart_items::table
                .filter(cart_items::cart_id.eq(cart_id))
                .filter(cart_items::id.eq_any(item_ids)),
        )
        .execute(&mut conn)
        .await?;

        info!("Cleared {} item(s) from cart {}", removed, cart_id);
        Ok(())
    }
}
