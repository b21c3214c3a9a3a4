//! Best-effort progress notifications
//!
//! The pipeline reports `{stage, progress}` events as it moves through its
//! stages. Reporting never blocks and never fails the run; a missing or
//! closed listener is ignored.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// Progress window covered by the classification batches
pub const CLASSIFICATION_START: u8 = 50;
pub const CLASSIFICATION_END: u8 = 90;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub stage: String,
    /// Whole percentage, 0 to 100
    pub progress: u8,
}

impl ProgressEvent {
    pub fn new(progress: u8, stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            progress: progress.min(100),
        }
    }
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

impl ProgressReporter for UnboundedSender<ProgressEvent> {
    fn report(&self, event: ProgressEvent) {
        if let Err(e) = self.send(event) {
            trace!("Progress listener gone, dropping event: {:?}", e.0);
        }
    }
}

/// Linear interpolation from 50% to 90% over the rows classified so far
pub fn classification_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return CLASSIFICATION_END;
    }
    let span = usize::from(CLASSIFICATION_END - CLASSIFICATION_START);
    let step = done.min(total) * span / total;
    CLASSIFICATION_START + step as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_progress_interpolates() {
        assert_eq!(classification_progress(0, 25), 50);
        assert_eq!(classification_progress(10, 25), 66);
        assert_eq!(classification_progress(20, 25), 82);
        assert_eq!(classification_progress(25, 25), 90);
        assert_eq!(classification_progress(30, 25), 90);
        assert_eq!(classification_progress(0, 0), 90);
    }

    #[test]
    fn test_event_progress_is_capped() {
        assert_eq!(ProgressEvent::new(140, "x").progress, 100);
    }

    #[tokio::test]
    async fn test_channel_reporter_survives_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        tx.report(ProgressEvent::new(10, "Analyzing CSV structure..."));
    }

    #[tokio::test]
    async fn test_channel_reporter_delivers_events() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.report(ProgressEvent::new(30, "Cleaning data..."));
        assert_eq!(rx.recv().await, Some(ProgressEvent::new(30, "Cleaning data...")));
    }
}
