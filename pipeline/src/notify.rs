use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{info, warn};

use crate::history::MoveId;

/// Session-unique handle to a raised notification.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NotificationId(pub u64);

/// Outbound user-facing messages. The engine never renders anything;
/// the embedding decides what a toast looks like and how an undo
/// affordance is wired to `PipelineEngine::undo`.
pub trait NotificationSink {
    /// `undo` carries the move this notification can revert.
    fn success(&self, message: &str, undo: Option<MoveId>) -> NotificationId;
    fn failure(&self, message: &str) -> NotificationId;
    /// Retract an earlier notification, e.g. when an undo supersedes
    /// the success toast of the move it reverts.
    fn dismiss(&self, id: NotificationId);
}

/// Default sink: structured log events only.
#[derive(Debug, Default)]
pub struct TracingSink {
    last_id: AtomicU64,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> NotificationId {
        NotificationId(self.last_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl NotificationSink for TracingSink {
    fn success(&self, message: &str, undo: Option<MoveId>) -> NotificationId {
        let id = self.next_id();
        info!(target: "pipeline.notify", id = id.0, undoable = undo.is_some(), "{message}");
        id
    }

    fn failure(&self, message: &str) -> NotificationId {
        let id = self.next_id();
        warn!(target: "pipeline.notify", id = id.0, "{message}");
        id
    }

    fn dismiss(&self, id: NotificationId) {
        info!(target: "pipeline.notify", id = id.0, "notification dismissed");
    }
}
