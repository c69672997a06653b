//! Caller identity extractors.
//!
//! The user id arrives in the `x-user-id` header set by the upstream gateway.
//! [`UserIdentity`] accepts guests; [`RequireUser`] rejects them with 401.

use crate::error::ApiError;
use api_shared::auth::{parse_user_id, USER_ID_HEADER};
use axum::{extract::FromRequestParts, http::request::Parts};
use cutis_uuid::ShardableUuid;

/// The caller's user id, `None` for guests.
#[derive(Debug, Clone, PartialEq)]
pub struct UserIdentity(pub Option<ShardableUuid>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for UserIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(USER_ID_HEADER) {
            Some(value) => Some(value.to_str().map_err(|_| invalid_identity())?),
            None => None,
        };
        parse_user_id(header)
            .map(UserIdentity)
            .map_err(|e| ApiError::unauthorized(e.to_string()))
    }
}

/// A signed-in caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RequireUser(pub ShardableUuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let UserIdentity(user) = UserIdentity::from_request_parts(parts, state).await?;
        user.map(RequireUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

fn invalid_identity() -> ApiError {
    ApiError::unauthorized(api_shared::auth::AuthError::InvalidUserId.to_string())
}
