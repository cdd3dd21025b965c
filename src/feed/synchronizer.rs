//! Long-lived task that owns the alert list.
//!
//! The initial fetch, the change stream and the local delete channel are
//! multiplexed on one task, so the list is never mutated concurrently.
//! Readers only ever see published snapshots.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::state::AlertFeed;
use super::stream::ChangeStream;
use crate::db::AlertStore;
use crate::models::alert::Alert;
use crate::models::change::{ChangeEvent, ChangeKind};
use crate::notice::{Notice, Notifier};

pub const ALERTS_TABLE: &str = "disaster_alerts";

pub type Snapshot = Arc<Vec<Alert>>;

/// Hands the id of an alert the current session just deleted to the feed,
/// so it disappears without waiting for the change-stream echo.
#[derive(Clone)]
pub struct DeletionSink {
    tx: mpsc::UnboundedSender<Uuid>,
}

impl DeletionSink {
    pub fn alert_deleted(&self, id: Uuid) {
        if self.tx.send(id).is_err() {
            debug!("Feed already shut down, dropping local delete of {}", id);
        }
    }
}

/// Read side of the feed plus its delete sink; cheap to clone into handlers.
#[derive(Clone)]
pub struct FeedView {
    alerts: watch::Receiver<Snapshot>,
    deletions: DeletionSink,
}

impl FeedView {
    pub fn alerts(&self) -> Snapshot {
        self.alerts.borrow().clone()
    }

    pub fn find(&self, id: Uuid) -> Option<Alert> {
        self.alerts.borrow().iter().find(|alert| alert.id == id).cloned()
    }

    pub fn deletions(&self) -> &DeletionSink {
        &self.deletions
    }

    #[cfg(test)]
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.alerts.clone()
    }
}

/// Owner handle of a running feed. Dropping it tears the task down.
pub struct FeedHandle {
    view: FeedView,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    pub fn view(&self) -> FeedView {
        self.view.clone()
    }

    /// Stops the task and waits until the subscription has been released.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Feed task ended abnormally: {}", e);
            }
        }
    }
}

/// Starts the feed: subscribes to alert changes, issues the initial fetch
/// and returns immediately.
pub fn spawn_feed(
    store: Arc<dyn AlertStore>,
    source: Box<dyn ChangeStream>,
    notifier: Arc<dyn Notifier>,
) -> FeedHandle {
    let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
    let (deletion_tx, deletion_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let task = tokio::spawn(run_feed(
        store,
        source,
        notifier,
        snapshot_tx,
        deletion_rx,
        shutdown_rx,
    ));

    FeedHandle {
        view: FeedView {
            alerts: snapshot_rx,
            deletions: DeletionSink { tx: deletion_tx },
        },
        shutdown: Some(shutdown_tx),
        task: Some(task),
    }
}

async fn next_event(events: &mut Option<BoxStream<'static, ChangeEvent>>) -> Option<ChangeEvent> {
    match events {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn run_feed(
    store: Arc<dyn AlertStore>,
    mut source: Box<dyn ChangeStream>,
    notifier: Arc<dyn Notifier>,
    snapshot_tx: watch::Sender<Snapshot>,
    mut deletions: mpsc::UnboundedReceiver<Uuid>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut feed = AlertFeed::default();

    let mut events = match source.subscribe(ALERTS_TABLE, &ChangeKind::ALL).await {
        Ok(stream) => {
            info!("Subscribed to {} changes", ALERTS_TABLE);
            Some(stream)
        }
        Err(e) => {
            error!("Failed to subscribe to {} changes: {:#}", ALERTS_TABLE, e);
            notifier.notify(Notice::error(
                "Error",
                "Live alert updates are unavailable right now.",
            ));
            None
        }
    };

    let mut fetch = store.fetch_active();
    let mut fetched = false;

    loop {
        let changed = tokio::select! {
            result = &mut fetch, if !fetched => {
                fetched = true;
                match result {
                    Ok(alerts) => {
                        info!("Loaded {} active alerts", alerts.len());
                        feed.replace_all(alerts);
                        true
                    }
                    Err(e) => {
                        error!("Error fetching alerts: {:#}", e);
                        notifier.notify(Notice::error(
                            "Error",
                            "Failed to fetch alerts. Please try again.",
                        ));
                        false
                    }
                }
            }
            event = next_event(&mut events) => match event {
                Some(event) => {
                    debug!("Change received: {:?} {:?}", event.kind, event.subject_id());
                    feed.apply(&event)
                }
                None => {
                    warn!("Change stream for {} ended; live updates stopped", ALERTS_TABLE);
                    events = None;
                    false
                }
            },
            Some(id) = deletions.recv() => feed.remove(id),
            _ = &mut shutdown => break,
        };

        if changed {
            snapshot_tx.send_replace(feed.snapshot());
        }
    }

    drop(events);
    deletions.close();
    if let Err(e) = source.unsubscribe().await {
        warn!("Failed to release {} subscription: {:#}", ALERTS_TABLE, e);
    }
    info!("Alert feed stopped");
}
