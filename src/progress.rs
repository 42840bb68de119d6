//! Progress notification decoupled from any front end.

use tokio::sync::mpsc;

/// Receives `(current, total)` pagination updates.
///
/// `current` is monotonically non-decreasing within one pipeline run. A cache
/// hit reports a single `(1, 1)`.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, current: u64, total: u64);
}

/// Observer that discards every update.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _current: u64, _total: u64) {}
}

/// A single progress update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub current: u64,
    pub total: u64,
}

/// Observer that forwards updates into a channel so a front end can consume
/// them from its own task, keeping the core free of any UI dependency.
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ChannelProgress {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressObserver for ChannelProgress {
    fn on_progress(&self, current: u64, total: u64) {
        // A dropped receiver just means nobody is watching.
        let _ = self.tx.send(ProgressUpdate { current, total });
    }
}
