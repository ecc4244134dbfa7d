use adlink_core::Caller;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Set by the identity layer in front of the API once the Telegram init data
/// has been validated.
pub const USER_ID_HEADER: &str = "x-telegram-user-id";

/// The authenticated caller. Rejects with 401 when the header is missing or
/// not a Telegram user id.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Caller);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("missing X-Telegram-User-Id header".to_string()))?;

        let user_id = raw
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::Unauthorized("malformed X-Telegram-User-Id header".to_string()))?;

        Ok(CurrentUser(Caller::new(user_id)))
    }
}
