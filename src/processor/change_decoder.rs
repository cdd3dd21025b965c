use crate::models::alert::Alert;
use crate::models::change::{CdcMessage, ChangeEvent, ChangeKind, RowKey};
use tracing::{debug, warn};

/// Turns one Kafka payload into a change event. Messages that cannot be
/// understood are logged and dropped; they never stop the stream.
pub fn decode_change(payload: &[u8]) -> Option<ChangeEvent> {
    // 1. Parse envelope
    let envelope = match serde_json::from_slice::<CdcMessage>(payload) {
        Ok(m) => m.into_envelope(),
        Err(e) => {
            warn!("Failed to parse change message: {}", e);
            return None;
        }
    };

    // 2. Map operation
    let kind = match ChangeKind::from_op(&envelope.op) {
        Some(kind) => kind,
        None => {
            warn!("Unsupported change op '{}', skipping", envelope.op);
            return None;
        }
    };

    // 3. Post-image must be a full alert row when present
    let new = match envelope.after {
        Some(after) if !after.is_null() => match serde_json::from_value::<Alert>(after) {
            Ok(alert) => Some(alert),
            Err(e) => {
                warn!("Malformed post-image in {:?} event: {}", kind, e);
                return None;
            }
        },
        _ => None,
    };

    // 4. Pre-image only needs the key
    let old = envelope
        .before
        .filter(|before| !before.is_null())
        .and_then(|before| match serde_json::from_value::<RowKey>(before) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!("Unreadable pre-image in {:?} event: {}", kind, e);
                None
            }
        });

    let event = ChangeEvent { kind, new, old };
    debug!(
        "Decoded {:?} for alert {:?} (ts_ms {:?})",
        event.kind,
        event.subject_id(),
        envelope.ts_ms
    );

    Some(event)
}
