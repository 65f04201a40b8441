use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::OrderError;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// An error on its way out of an HTTP handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: code.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, "UNAUTHORIZED")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message, "FORBIDDEN")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        let status = match &err {
            OrderError::OrderNotFoundOrForbidden(_) => StatusCode::NOT_FOUND,
            OrderError::BuyerNotFound(_) => StatusCode::UNAUTHORIZED,
            OrderError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            OrderError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };

        if status.is_server_error() {
            error!(code = err.code(), "Order request failed: {}", err);
        }

        let message = match &err {
            OrderError::Database(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        Self::new(status, message, err.code())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    #[test]
    fn business_rule_failures_are_bad_requests() {
        let cases = [
            OrderError::EmptyOrderItems,
            OrderError::EmptyCart,
            OrderError::PriceNotFound(Uuid::new_v4()),
            OrderError::PartialPaymentNotSupported {
                subtotal: BigDecimal::from(18000),
                use_point: 17000,
            },
            OrderError::InsufficientPoints {
                requested: 18000,
                available: 10000,
            },
            OrderError::ConcurrentStockConflict {
                product_id: Uuid::new_v4(),
                size_id: 1,
            },
        ];

        for err in cases {
            assert_eq!(ApiError::from(err).status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn ownership_failures_are_not_found() {
        let err = ApiError::from(OrderError::OrderNotFoundOrForbidden(Uuid::new_v4()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "ORDER_NOT_FOUND");
    }

    #[test]
    fn database_details_are_hidden() {
        let err = ApiError::from(OrderError::Database(diesel::result::Error::NotFound));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "An internal error occurred");
    }

    #[test]
    fn pool_exhaustion_is_unavailable() {
        let err = ApiError::from(OrderError::Unavailable("timed out".into()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
