use serde::Serialize;
use uuid::Uuid;

pub const VOLUNTEER: &str = "volunteer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewResponse {
    pub alert_id: Uuid,
    pub responder_id: Uuid,
    pub response_type: String,
}

impl NewResponse {
    pub fn volunteer(alert_id: Uuid, responder_id: Uuid) -> Self {
        Self {
            alert_id,
            responder_id,
            response_type: VOLUNTEER.to_string(),
        }
    }
}
