//! Alert feed: the local mirror of active alerts and the task keeping it
//! in step with the backend.

pub mod state;
pub mod stream;
pub mod synchronizer;

pub use stream::ChangeStream;
pub use synchronizer::{spawn_feed, DeletionSink, FeedView};
