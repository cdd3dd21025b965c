//! Alert actions: create, soft-delete and volunteer responses.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::AlertStore;
use crate::error::ActionError;
use crate::feed::DeletionSink;
use crate::models::alert::{Alert, AlertStatus, LocationInput, NewAlert, Severity};
use crate::models::relief::{ReliefItem, ReliefItemInput};
use crate::models::response::NewResponse;
use crate::models::user::User;
use crate::notice::Notice;
use crate::storage::{object_key, ObjectStore};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertForm {
    pub title: String,
    pub description: String,
    pub location: LocationInput,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub needed_relief: Vec<ReliefItemInput>,
    #[serde(default)]
    pub contact_info: String,
    #[serde(default)]
    pub additional_notes: String,
}

fn default_severity() -> Severity {
    Severity::Medium
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[derive(Clone)]
pub struct AlertService {
    store: Arc<dyn AlertStore>,
    images: Arc<dyn ObjectStore>,
}

impl AlertService {
    pub fn new(store: Arc<dyn AlertStore>, images: Arc<dyn ObjectStore>) -> Self {
        Self { store, images }
    }

    /// Registers the current user as a volunteer for `alert_id`.
    /// Leaves the feed untouched.
    pub async fn respond(&self, user: Option<User>, alert_id: Uuid) -> Result<Notice, ActionError> {
        let user = user.ok_or(ActionError::Unauthenticated)?;

        self.store
            .insert_response(&NewResponse::volunteer(alert_id, user.id))
            .await
            .map_err(|e| {
                error!("Error registering response for alert {}: {:#}", alert_id, e);
                ActionError::backend("Failed to register response. Please try again.", e)
            })?;

        info!("User {} volunteered for alert {}", user.id, alert_id);
        Ok(Notice::success(
            "Response Registered",
            "धन्यवाद! Thank you for volunteering! A coordinator will contact you shortly.",
        ))
    }

    /// Posts a new alert. The feed learns about it from the change stream.
    pub async fn create(
        &self,
        user: Option<User>,
        form: CreateAlertForm,
        image: Option<ImageUpload>,
    ) -> Result<Notice, ActionError> {
        let user = user.ok_or(ActionError::SignInRequired(
            "You must be logged in to create an alert.",
        ))?;

        if form.title.trim().is_empty() {
            return Err(ActionError::Invalid("Title is required.".to_string()));
        }

        let image_url = match image {
            Some(image) => {
                let key = object_key(&image.file_name).ok_or_else(|| {
                    ActionError::Invalid(
                        "Only JPG, PNG, GIF or WebP images can be attached.".to_string(),
                    )
                })?;
                self.images.upload(&key, image.bytes).await.map_err(|e| {
                    error!("Error uploading image {}: {:#}", image.file_name, e);
                    ActionError::backend("Failed to create alert. Please try again.", e)
                })?;
                Some(self.images.public_url(&key))
            }
            None => None,
        };

        let needed_relief = form
            .needed_relief
            .into_iter()
            .map(|input| ReliefItem::from(input).to_record())
            .collect();

        let new_alert = NewAlert {
            title: form.title,
            description: form.description,
            location: form.location.flatten(),
            severity: form.severity,
            image_url,
            needed_relief,
            created_by: user.id,
            contact_info: non_blank(form.contact_info),
            additional_notes: non_blank(form.additional_notes),
        };

        let alert = self.store.insert_alert(&new_alert).await.map_err(|e| {
            error!("Error creating alert: {:#}", e);
            ActionError::backend("Failed to create alert. Please try again.", e)
        })?;

        info!("Alert {} created by {}", alert.id, user.id);
        Ok(Notice::success(
            "Alert Created",
            "Your disaster alert has been successfully created.",
        ))
    }

    /// Soft-deletes an alert owned by the current user, clears its
    /// responses and tells the feed right away.
    pub async fn delete(
        &self,
        user: Option<User>,
        alert: &Alert,
        feed: &DeletionSink,
    ) -> Result<Notice, ActionError> {
        match user {
            Some(user) if user.id == alert.created_by => {}
            _ => return Err(ActionError::PermissionDenied),
        }

        self.store
            .set_status(alert.id, AlertStatus::Inactive)
            .await
            .map_err(|e| {
                error!("Error deleting alert {}: {:#}", alert.id, e);
                ActionError::backend("Failed to delete the alert. Please try again.", e)
            })?;

        if let Err(e) = self.store.delete_responses(alert.id).await {
            warn!("Alert {} deactivated but its responses remain: {:#}", alert.id, e);
        }

        feed.alert_deleted(alert.id);
        info!("Alert {} deleted by its creator", alert.id);

        Ok(Notice::success(
            "Alert Deleted",
            "The alert has been successfully removed.",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::spawn_feed;
    use crate::models::relief::ReliefPriority;
    use crate::testing::{alert_at, ChannelChangeStream, MemoryObjectStore, MemoryStore, RecordingNotifier};
    use std::time::Duration;

    fn service(store: Arc<MemoryStore>, images: Arc<MemoryObjectStore>) -> AlertService {
        AlertService::new(store, images)
    }

    fn form() -> CreateAlertForm {
        serde_json::from_str(
            r#"
            {
                "title": "Flash flood",
                "description": "Bridge washed away",
                "location": {
                    "district": "Kaski",
                    "municipality": "Pokhara",
                    "ward": "17",
                    "specificLocation": "Seti river bank"
                },
                "severity": "critical",
                "neededRelief": [
                    {"item": "Boats", "priority": "high", "quantity": "3"},
                    {"item": "Dry food", "priority": "medium", "quantity": ""}
                ],
                "contactInfo": "9800000000",
                "additionalNotes": ""
            }
            "#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_respond_unauthenticated_redirects_without_insert() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(store.clone(), Arc::new(MemoryObjectStore::default()));

        let err = svc.respond(None, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ActionError::Unauthenticated));
        assert!(store.responses().is_empty());
    }

    #[tokio::test]
    async fn test_respond_inserts_volunteer_response() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(store.clone(), Arc::new(MemoryObjectStore::default()));
        let user = User { id: Uuid::new_v4() };
        let alert_id = Uuid::new_v4();

        let notice = svc.respond(Some(user), alert_id).await.unwrap();
        assert_eq!(notice.title, "Response Registered");
        assert_eq!(store.responses(), vec![NewResponse::volunteer(alert_id, user.id)]);
        assert_eq!(store.responses()[0].response_type, "volunteer");
    }

    #[tokio::test]
    async fn test_respond_failure_is_reported() {
        let store = Arc::new(MemoryStore::default());
        store.fail_writes();
        let svc = service(store.clone(), Arc::new(MemoryObjectStore::default()));

        let err = svc
            .respond(Some(User { id: Uuid::new_v4() }), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.notice().description, "Failed to register response. Please try again.");
        assert!(store.responses().is_empty());
    }

    #[tokio::test]
    async fn test_create_flattens_location_and_serializes_relief() {
        let store = Arc::new(MemoryStore::default());
        let images = Arc::new(MemoryObjectStore::default());
        let svc = service(store.clone(), images.clone());
        let user = User { id: Uuid::new_v4() };

        let image = ImageUpload {
            file_name: "bridge.jpeg".to_string(),
            bytes: vec![0xff, 0xd8],
        };
        svc.create(Some(user), form(), Some(image)).await.unwrap();

        let stored = store.stored();
        assert_eq!(stored.len(), 1);
        let alert = &stored[0];
        assert_eq!(alert.location, "Kaski, Pokhara, Ward 17, Seti river bank");
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.created_by, user.id);
        assert_eq!(alert.contact_info.as_deref(), Some("9800000000"));
        assert_eq!(alert.additional_notes, None);

        let relief: Vec<ReliefItem> = alert.needed_relief.iter().map(|r| ReliefItem::parse(r)).collect();
        assert_eq!(relief[0].priority, ReliefPriority::High);
        assert_eq!(relief[1].quantity, "Not specified");

        let keys = images.keys();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].ends_with(".jpeg"));
        assert_eq!(alert.image_url, Some(format!("http://images.test/{}", keys[0])));
    }

    #[tokio::test]
    async fn test_create_requires_sign_in() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(store.clone(), Arc::new(MemoryObjectStore::default()));

        let err = svc.create(None, form(), None).await.unwrap_err();
        assert!(matches!(err, ActionError::SignInRequired(_)));
        assert!(store.stored().is_empty());
    }

    #[tokio::test]
    async fn test_create_aborts_when_upload_fails() {
        let store = Arc::new(MemoryStore::default());
        let images = Arc::new(MemoryObjectStore::default());
        images.fail_uploads();
        let svc = service(store.clone(), images);

        let image = ImageUpload {
            file_name: "x.png".to_string(),
            bytes: vec![1],
        };
        let err = svc
            .create(Some(User { id: Uuid::new_v4() }), form(), Some(image))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Backend { .. }));
        assert!(store.stored().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_non_image_attachment() {
        let store = Arc::new(MemoryStore::default());
        let images = Arc::new(MemoryObjectStore::default());
        let svc = service(store.clone(), images.clone());

        let image = ImageUpload {
            file_name: "evil.html".to_string(),
            bytes: b"<script>alert(1)</script>".to_vec(),
        };
        let err = svc
            .create(Some(User { id: Uuid::new_v4() }), form(), Some(image))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Invalid(_)));
        assert!(images.keys().is_empty());
        assert!(store.stored().is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_touches_nothing() {
        let alert = alert_at(1);
        let store = Arc::new(MemoryStore::with_alerts(vec![alert.clone()]));
        let svc = service(store.clone(), Arc::new(MemoryObjectStore::default()));
        let (stream, _events) = ChannelChangeStream::new();
        let handle = spawn_feed(store.clone(), Box::new(stream), Arc::new(RecordingNotifier::default()));
        let view = handle.view();

        let stranger = User { id: Uuid::new_v4() };
        let err = svc.delete(Some(stranger), &alert, view.deletions()).await.unwrap_err();
        assert!(matches!(err, ActionError::PermissionDenied));
        assert_eq!(err.notice().title, "Permission Denied");

        let err = svc.delete(None, &alert, view.deletions()).await.unwrap_err();
        assert!(matches!(err, ActionError::PermissionDenied));

        assert!(store.status_updates().is_empty());
        assert!(store.cleared_responses().is_empty());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_delete_by_owner_soft_deletes_and_updates_feed() {
        let alert = alert_at(1);
        let store = Arc::new(MemoryStore::with_alerts(vec![alert.clone()]));
        let svc = service(store.clone(), Arc::new(MemoryObjectStore::default()));
        let (stream, _events) = ChannelChangeStream::new();
        let handle = spawn_feed(store.clone(), Box::new(stream), Arc::new(RecordingNotifier::default()));
        let view = handle.view();

        let mut rx = view.watch();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| s.len() == 1))
            .await
            .unwrap()
            .unwrap();

        let owner = User { id: alert.created_by };
        let notice = svc.delete(Some(owner), &alert, view.deletions()).await.unwrap();
        assert_eq!(notice.title, "Alert Deleted");
        assert_eq!(store.status_updates(), vec![(alert.id, AlertStatus::Inactive)]);
        assert_eq!(store.cleared_responses(), vec![alert.id]);

        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| s.is_empty()))
            .await
            .unwrap()
            .unwrap();
        handle.shutdown().await;
    }
}
