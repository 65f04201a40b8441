use bigdecimal::BigDecimal;
use thiserror::Error;
use uuid::Uuid;

/// The single reason an order operation was aborted.
///
/// Every failure inside the order transaction surfaces as exactly one of
/// these; the first failure wins and the whole transaction rolls back.
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Order must contain at least one item")]
    EmptyOrderItems,

    #[error("Quantity for product {product_id} (size {size_id}) must be at least 1")]
    InvalidQuantity { product_id: Uuid, size_id: i32 },

    #[error("Total order quantity is too large")]
    QuantityTooLarge,

    #[error("No price found for product {0}")]
    PriceNotFound(Uuid),

    #[error("No stock found for product {product_id} (size {size_id})")]
    StockNotFound { product_id: Uuid, size_id: i32 },

    #[error(
        "Insufficient stock for product {product_id} (size {size_id}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: Uuid,
        size_id: i32,
        requested: i32,
        available: i32,
    },

    /// Points must cover the subtotal exactly; there is no cash path.
    #[error("Partial payment is not supported: subtotal {subtotal}, points {use_point}")]
    PartialPaymentNotSupported { subtotal: BigDecimal, use_point: i32 },

    #[error("Insufficient points: requested {requested}, available {available}")]
    InsufficientPoints { requested: i32, available: i32 },

    /// The conditional decrement matched no row: another order took the stock first.
    #[error("Stock for product {product_id} (size {size_id}) changed concurrently, please retry")]
    ConcurrentStockConflict { product_id: Uuid, size_id: i32 },

    #[error("Order {0} not found")]
    OrderNotFoundOrForbidden(Uuid),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Buyer {0} not found")]
    BuyerNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Database unavailable: {0}")]
    Unavailable(String),
}

impl OrderError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            OrderError::EmptyOrderItems => "EMPTY_ORDER_ITEMS",
            OrderError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            OrderError::QuantityTooLarge => "QUANTITY_TOO_LARGE",
            OrderError::PriceNotFound(_) => "PRICE_NOT_FOUND",
            OrderError::StockNotFound { .. } => "STOCK_NOT_FOUND",
            OrderError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            OrderError::PartialPaymentNotSupported { .. } => "PARTIAL_PAYMENT_NOT_SUPPORTED",
            OrderError::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            OrderError::ConcurrentStockConflict { .. } => "CONCURRENT_STOCK_CONFLICT",
            OrderError::OrderNotFoundOrForbidden(_) => "ORDER_NOT_FOUND",
            OrderError::EmptyCart => "EMPTY_CART",
            OrderError::BuyerNotFound(_) => "BUYER_NOT_FOUND",
            OrderError::Database(_) => "DATABASE_ERROR",
            OrderError::Unavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, OrderError::ConcurrentStockConflict { .. })
    }
}
