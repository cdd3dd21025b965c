use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::models::user::User;

/// Header the fronting auth gateway sets after verifying the session.
pub const USER_HEADER: &str = "x-user-id";

/// The signed-in user, if any. Never rejects: anonymous requests get `None`
/// and each action decides what that means.
pub struct CurrentUser(pub Option<User>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(|id| User { id });

        Ok(CurrentUser(user))
    }
}
