use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the signed-in user as vouched for by the auth gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
}
