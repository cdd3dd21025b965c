use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::models::change::{ChangeEvent, ChangeKind};

/// Server-push source of row-level changes for one table.
#[async_trait]
pub trait ChangeStream: Send {
    /// Opens the subscription and returns the events as they arrive,
    /// restricted to `kinds`.
    async fn subscribe(
        &mut self,
        table: &str,
        kinds: &[ChangeKind],
    ) -> Result<BoxStream<'static, ChangeEvent>>;

    /// Releases the subscription. Safe to call when nothing is subscribed.
    async fn unsubscribe(&mut self) -> Result<()>;
}
