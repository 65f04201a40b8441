use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

/// Set by the gateway after it has verified the caller's token.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

const BUYER_ROLE: &str = "buyer";

/// The authenticated buyer making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedBuyer(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedBuyer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if !role.eq_ignore_ascii_case(BUYER_ROLE) {
            return Err(ApiError::forbidden("Only buyers can access orders"));
        }

        Ok(AuthenticatedBuyer(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn extract(headers: &[(&str, &str)]) -> Result<AuthenticatedBuyer, ApiError> {
        let mut builder = Request::builder().uri("/orders");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthenticatedBuyer::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn accepts_buyer() {
        let id = Uuid::new_v4();
        let id_header = id.to_string();
        let buyer = extract(&[(USER_ID_HEADER, id_header.as_str()), (USER_ROLE_HEADER, "buyer")])
            .await
            .unwrap();
        assert_eq!(buyer, AuthenticatedBuyer(id));
    }

    #[tokio::test]
    async fn missing_or_malformed_id_is_unauthorized() {
        let err = extract(&[(USER_ROLE_HEADER, "buyer")]).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = extract(&[(USER_ID_HEADER, "not-a-uuid"), (USER_ROLE_HEADER, "buyer")])
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sellers_are_forbidden() {
        let id = Uuid::new_v4().to_string();
        let err = extract(&[(USER_ID_HEADER, id.as_str()), (USER_ROLE_HEADER, "seller")])
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err = extract(&[(USER_ID_HEADER, id.as_str())]).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
