//! Seam between the controllers and the remote files service.

use crate::error::TransportError;
use crate::models::{FilePage, PendingFile, QueryState, UploadProgress};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Operations the UI needs from the remote files API.
#[async_trait]
pub trait FilesApi: Send + Sync {
    /// `GET /api/files` for one page of the listing.
    async fn list_files(&self, query: &QueryState) -> Result<FilePage, TransportError>;

    /// `POST /api/upload` with every file under the `files` field.
    ///
    /// Implementations call [`ProgressTracker::record`] as body bytes are
    /// handed to the transport.
    async fn upload_files(
        &self,
        files: Vec<PendingFile>,
        progress: Arc<ProgressTracker>,
    ) -> Result<(), TransportError>;

    /// `DELETE /api/files/{filename}`; only HTTP 200 counts as success.
    async fn delete_file(&self, filename: &str) -> Result<(), TransportError>;
}

/// Turns byte counts into the published upload percentage.
pub struct ProgressTracker {
    sender: Arc<watch::Sender<UploadProgress>>,
    total: u64,
    sent: AtomicU64,
}

impl ProgressTracker {
    pub fn new(sender: Arc<watch::Sender<UploadProgress>>, total: u64) -> Arc<Self> {
        Arc::new(Self {
            sender,
            total,
            sent: AtomicU64::new(0),
        })
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Account for `bytes` more body bytes. The published percentage never
    /// goes down, and nothing is published once the upload has finished.
    pub fn record(&self, bytes: u64) {
        let sent = self.sent.fetch_add(bytes, Ordering::Relaxed) + bytes;
        let percent = percent_complete(sent, self.total);

        self.sender.send_if_modified(|progress| {
            if progress.uploading && percent > progress.percent {
                progress.percent = percent;
                true
            } else {
                false
            }
        });
    }
}

/// `floor(sent * 100 / total)`, capped at 100.
pub fn percent_complete(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let sent = sent.min(total) as u128;
    (sent * 100 / total as u128) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_floored() {
        assert_eq!(percent_complete(0, 3), 0);
        assert_eq!(percent_complete(1, 3), 33);
        assert_eq!(percent_complete(2, 3), 66);
        assert_eq!(percent_complete(3, 3), 100);
        assert_eq!(percent_complete(5, 3), 100);
        assert_eq!(percent_complete(0, 0), 100);
    }

    #[test]
    fn tracker_publishes_monotonic_progress() {
        let (sender, receiver) = watch::channel(UploadProgress::started());
        let tracker = ProgressTracker::new(Arc::new(sender), 200);

        tracker.record(50);
        assert_eq!(receiver.borrow().percent, 25);
        tracker.record(0);
        assert_eq!(receiver.borrow().percent, 25);
        tracker.record(150);
        assert_eq!(receiver.borrow().percent, 100);
    }

    #[test]
    fn tracker_is_silent_after_upload_finished() {
        let (sender, receiver) = watch::channel(UploadProgress::idle());
        let tracker = ProgressTracker::new(Arc::new(sender), 10);

        tracker.record(10);
        assert_eq!(*receiver.borrow(), UploadProgress::idle());
    }
}
