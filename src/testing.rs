//! In-memory collaborators for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use futures::channel::mpsc;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::db::AlertStore;
use crate::feed::stream::ChangeStream;
use crate::models::alert::{Alert, AlertStatus, NewAlert, Severity};
use crate::models::change::{ChangeEvent, ChangeKind};
use crate::models::response::NewResponse;
use crate::notice::{Notice, Notifier};
use crate::storage::ObjectStore;

/// An active alert created `hours` after a fixed origin.
pub fn alert_at(hours: i64) -> Alert {
    let origin = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();
    Alert {
        id: Uuid::new_v4(),
        title: format!("Alert {}", hours),
        description: "River overflowing".to_string(),
        location: "Sunsari, Inaruwa, Ward 4, School".to_string(),
        severity: Severity::High,
        image_url: None,
        needed_relief: vec![],
        status: Some(AlertStatus::Active),
        created_by: Uuid::new_v4(),
        created_at: origin + Duration::hours(hours),
        contact_info: None,
        additional_notes: None,
    }
}

#[derive(Default)]
pub struct MemoryStore {
    alerts: Mutex<Vec<Alert>>,
    responses: Mutex<Vec<NewResponse>>,
    status_updates: Mutex<Vec<(Uuid, AlertStatus)>>,
    cleared_responses: Mutex<Vec<Uuid>>,
    fetch_gate: Mutex<Option<oneshot::Receiver<()>>>,
    fetch_calls: AtomicUsize,
    fail_fetch: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn with_alerts(alerts: Vec<Alert>) -> Self {
        Self {
            alerts: Mutex::new(alerts),
            ..Default::default()
        }
    }

    pub fn fail_fetch(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Holds the next fetch until the returned sender fires.
    pub fn gate_fetch(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.fetch_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn responses(&self) -> Vec<NewResponse> {
        self.responses.lock().unwrap().clone()
    }

    pub fn status_updates(&self) -> Vec<(Uuid, AlertStatus)> {
        self.status_updates.lock().unwrap().clone()
    }

    pub fn cleared_responses(&self) -> Vec<Uuid> {
        self.cleared_responses.lock().unwrap().clone()
    }

    pub fn stored(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("connection reset by peer"));
        }
        Ok(())
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn fetch_active(&self) -> Result<Vec<Alert>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.fetch_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(anyhow!("service unavailable"));
        }

        let mut alerts: Vec<Alert> = self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.is_active())
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    async fn insert_alert(&self, alert: &NewAlert) -> Result<Alert> {
        self.check_writes()?;
        let stored = Alert {
            id: Uuid::new_v4(),
            title: alert.title.clone(),
            description: alert.description.clone(),
            location: alert.location.clone(),
            severity: alert.severity,
            image_url: alert.image_url.clone(),
            needed_relief: alert.needed_relief.clone(),
            status: Some(AlertStatus::Active),
            created_by: alert.created_by,
            created_at: Utc::now(),
            contact_info: alert.contact_info.clone(),
            additional_notes: alert.additional_notes.clone(),
        };
        self.alerts.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn set_status(&self, alert_id: Uuid, status: AlertStatus) -> Result<()> {
        self.check_writes()?;
        self.status_updates.lock().unwrap().push((alert_id, status));
        for alert in self.alerts.lock().unwrap().iter_mut() {
            if alert.id == alert_id {
                alert.status = Some(status);
            }
        }
        Ok(())
    }

    async fn delete_responses(&self, alert_id: Uuid) -> Result<()> {
        self.check_writes()?;
        self.cleared_responses.lock().unwrap().push(alert_id);
        self.responses
            .lock()
            .unwrap()
            .retain(|r| r.alert_id != alert_id);
        Ok(())
    }

    async fn insert_response(&self, response: &NewResponse) -> Result<()> {
        self.check_writes()?;
        self.responses.lock().unwrap().push(response.clone());
        Ok(())
    }
}

/// Change stream fed by hand through an unbounded channel.
pub struct ChannelChangeStream {
    rx: Option<mpsc::UnboundedReceiver<ChangeEvent>>,
    released: Arc<AtomicBool>,
}

impl ChannelChangeStream {
    pub fn new() -> (Self, mpsc::UnboundedSender<ChangeEvent>) {
        let (tx, rx) = mpsc::unbounded();
        (
            Self {
                rx: Some(rx),
                released: Arc::new(AtomicBool::new(false)),
            },
            tx,
        )
    }

    /// A stream whose subscribe call fails.
    pub fn unavailable() -> Self {
        Self {
            rx: None,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn released(&self) -> Arc<AtomicBool> {
        self.released.clone()
    }
}

#[async_trait]
impl ChangeStream for ChannelChangeStream {
    async fn subscribe(
        &mut self,
        _table: &str,
        kinds: &[ChangeKind],
    ) -> Result<BoxStream<'static, ChangeEvent>> {
        let rx = self.rx.take().ok_or_else(|| anyhow!("change stream unavailable"))?;
        let kinds = kinds.to_vec();
        Ok(rx
            .filter(move |event| futures::future::ready(kinds.contains(&event.kind)))
            .boxed())
    }

    async fn unsubscribe(&mut self) -> Result<()> {
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<Vec<(String, Vec<u8>)>>,
    fail: AtomicBool,
}

impl MemoryObjectStore {
    pub fn fail_uploads(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("bucket not found"));
        }
        self.objects.lock().unwrap().push((key.to_string(), bytes));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("http://images.test/{}", key)
    }
}
