use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use shared::{CreateOrderRequest, OrderResponse, Pagination, UpdateShippingRequest};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::assembler::{NewOrderInput, OrderAssembler};
use crate::auth::AuthenticatedBuyer;
use crate::cart::CartBridge;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderAssembler,
    pub carts: CartBridge,
}

impl AppState {
    pub fn new(orders: OrderAssembler) -> Self {
        let carts = CartBridge::new(orders.clone());
        Self { orders, carts }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/:order_id",
            get(get_order).patch(update_order).delete(delete_order),
        )
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                tower_http::cors::CorsLayer::new()
                    .allow_origin(tower_http::cors::Any)
                    .allow_methods(tower_http::cors::Any)
                    .allow_headers(tower_http::cors::Any),
            ),
        )
}

/// Orders the listed items, or the buyer's cart when no items are given.
pub async fn create_order(
    State(state): State<AppState>,
    AuthenticatedBuyer(buyer_id): AuthenticatedBuyer,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = if request.uses_cart() {
        state.carts.create_from_cart(buyer_id, request).await?
    } else {
        let items = request.order_items.clone().unwrap_or_default();
        state
            .orders
            .create_order(buyer_id, NewOrderInput::from_request(request, items))
            .await?
    };

    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(
    State(state): State<AppState>,
    AuthenticatedBuyer(buyer_id): AuthenticatedBuyer,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    Ok(Json(state.orders.list_orders(buyer_id, page).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    AuthenticatedBuyer(buyer_id): AuthenticatedBuyer,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    Ok(Json(state.orders.get_order(buyer_id, order_id).await?))
}

pub async fn update_order(
    State(state): State<AppState>,
    AuthenticatedBuyer(buyer_id): AuthenticatedBuyer,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateShippingRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    Ok(Json(
        state
            .orders
            .update_shipping(buyer_id, order_id, request)
            .await?,
    ))
}

pub async fn delete_order(
    State(state): State<AppState>,
    AuthenticatedBuyer(buyer_id): AuthenticatedBuyer,
    Path(order_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.orders.delete_order(buyer_id, order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health_check() -> &'static str {
    "OK"
}
