use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::alert::Alert;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 3] = [ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete];

    /// Maps a Debezium `op` code. Snapshot reads (`r`) arrive as inserts.
    pub fn from_op(op: &str) -> Option<Self> {
        match op {
            "c" | "r" => Some(ChangeKind::Insert),
            "u" => Some(ChangeKind::Update),
            "d" => Some(ChangeKind::Delete),
            _ => None,
        }
    }
}

/// Pre-image of a changed row. Depending on the table's replica identity it
/// may carry nothing but the key.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RowKey {
    #[serde(default)]
    pub id: Option<Uuid>,
}

/// One row-level change on the alerts table.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub new: Option<Alert>,
    pub old: Option<RowKey>,
}

impl ChangeEvent {
    #[cfg(test)]
    pub fn insert(alert: Alert) -> Self {
        Self {
            kind: ChangeKind::Insert,
            new: Some(alert),
            old: None,
        }
    }

    #[cfg(test)]
    pub fn update(alert: Alert) -> Self {
        let old = Some(RowKey { id: Some(alert.id) });
        Self {
            kind: ChangeKind::Update,
            new: Some(alert),
            old,
        }
    }

    #[cfg(test)]
    pub fn delete(id: Uuid) -> Self {
        Self {
            kind: ChangeKind::Delete,
            new: None,
            old: Some(RowKey { id: Some(id) }),
        }
    }

    /// Id the event is about: post-image first, then pre-image.
    pub fn subject_id(&self) -> Option<Uuid> {
        self.new
            .as_ref()
            .map(|alert| alert.id)
            .or_else(|| self.old.as_ref().and_then(|key| key.id))
    }
}

/// Debezium change envelope. Present either bare or wrapped in
/// `{"schema": .., "payload": ..}` when the JSON converter has schemas on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CdcMessage {
    Wrapped { payload: CdcEnvelope },
    Bare(CdcEnvelope),
}

#[derive(Debug, Deserialize)]
pub struct CdcEnvelope {
    #[serde(default)]
    pub before: Option<Value>,
    #[serde(default)]
    pub after: Option<Value>,
    pub op: String,
    #[serde(default)]
    pub ts_ms: Option<i64>,
}

impl CdcMessage {
    pub fn into_envelope(self) -> CdcEnvelope {
        match self {
            CdcMessage::Wrapped { payload } => payload,
            CdcMessage::Bare(envelope) => envelope,
        }
    }
}
