//! The locally mirrored list of active alerts and its reconciliation rules.
//!
//! The list holds at most one entry per id and only alerts believed active.
//! Order is newest first as delivered by the initial fetch; later changes
//! prepend new entries and replace existing ones in place, so a long-lived
//! list can drift from strict `created_at` order.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::models::alert::Alert;
use crate::models::change::{ChangeEvent, ChangeKind};

#[derive(Debug, Default, Clone)]
pub struct AlertFeed {
    alerts: Vec<Alert>,
}

impl AlertFeed {
    #[cfg(test)]
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn snapshot(&self) -> Arc<Vec<Alert>> {
        Arc::new(self.alerts.clone())
    }

    /// Replaces the whole list with a fetch result.
    pub fn replace_all(&mut self, alerts: Vec<Alert>) {
        self.alerts = alerts;
    }

    /// Removes the entry with `id`. Returns whether anything changed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|alert| alert.id != id);
        self.alerts.len() != before
    }

    /// Applies one change event. Returns whether the list changed.
    pub fn apply(&mut self, event: &ChangeEvent) -> bool {
        let active = event.new.as_ref().filter(|alert| alert.is_active());

        match (event.kind, active) {
            (ChangeKind::Delete, _) | (ChangeKind::Update, None) => match event.subject_id() {
                Some(id) => self.remove(id),
                None => {
                    debug!("Removal event without an id, ignoring");
                    false
                }
            },
            (ChangeKind::Update, Some(alert)) => {
                self.upsert(alert.clone());
                true
            }
            (ChangeKind::Insert, Some(alert)) => {
                // At-least-once delivery can replay an insert for a live id.
                if self.position(alert.id).is_some() {
                    debug!("Duplicate insert for alert {}, replacing in place", alert.id);
                }
                self.upsert(alert.clone());
                true
            }
            (ChangeKind::Insert, None) => false,
        }
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.alerts.iter().position(|alert| alert.id == id)
    }

    fn upsert(&mut self, alert: Alert) {
        match self.position(alert.id) {
            Some(index) => self.alerts[index] = alert,
            None => self.alerts.insert(0, alert),
        }
    }
}
