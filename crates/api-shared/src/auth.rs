//! Request identity.
//!
//! Authentication happens upstream. The gateway forwards the authenticated user's id in the
//! [`USER_ID_HEADER`] header; requests without it are treated as guests.

use cutis_uuid::ShardableUuid;

/// Header carrying the authenticated user's canonical UUID.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid user identity")]
    InvalidUserId,
}

/// Parses the forwarded user id.
///
/// Returns `Ok(None)` for guests (header absent or blank) and an error if the header is
/// present but not a canonical UUID.
pub fn parse_user_id(value: Option<&str>) -> Result<Option<ShardableUuid>, AuthError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => ShardableUuid::parse(raw)
            .map(Some)
            .map_err(|_| AuthError::InvalidUserId),
    }
}
