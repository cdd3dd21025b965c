use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use tracing::debug;
use uuid::Uuid;

use super::{auth::CurrentUser, AppState};
use crate::error::ActionError;
use crate::models::alert::AlertCard;
use crate::notice::Notice;
use crate::service::{register_donation, CreateAlertForm, DonationForm, ImageUpload};

pub async fn list_alerts(State(state): State<Arc<AppState>>) -> Json<Vec<AlertCard>> {
    let alerts = state.feed.alerts();
    Json(alerts.iter().map(AlertCard::from).collect())
}

pub async fn create_alert(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<Notice>, ActionError> {
    let mut form: Option<CreateAlertForm> = None;
    let mut image: Option<ImageUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ActionError::MalformedPayload)?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "alert" => {
                let bytes = field.bytes().await.map_err(|_| ActionError::MalformedPayload)?;
                form = Some(serde_json::from_slice(&bytes).map_err(|_| ActionError::MalformedPayload)?);
            }
            "image" => {
                if let Some(content_type) = field.content_type() {
                    if !content_type.starts_with("image/") {
                        return Err(ActionError::Invalid(
                            "Only image files can be attached.".to_string(),
                        ));
                    }
                }
                let file_name = field.file_name().unwrap_or("image").to_string();
                let bytes = field.bytes().await.map_err(|_| ActionError::MalformedPayload)?;
                if !bytes.is_empty() {
                    image = Some(ImageUpload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    let form = form.ok_or(ActionError::MalformedPayload)?;
    state.service.create(user, form, image).await.map(Json)
}

pub async fn delete_alert(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(alert_id): Path<Uuid>,
) -> Result<Json<Notice>, ActionError> {
    let alert = state.feed.find(alert_id).ok_or(ActionError::NotFound)?;
    state
        .service
        .delete(user, &alert, state.feed.deletions())
        .await
        .map(Json)
}

pub async fn respond(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(alert_id): Path<Uuid>,
) -> Result<Json<Notice>, ActionError> {
    state.service.respond(user, alert_id).await.map(Json)
}

pub async fn donate(Json(form): Json<DonationForm>) -> Result<Json<Notice>, ActionError> {
    register_donation(&form).map(Json)
}

pub async fn login() -> Json<Notice> {
    Json(Notice::success("Login Attempted", "This feature is coming soon!"))
}
