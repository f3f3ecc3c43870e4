use crate::controllers::coordinator::ReloadTrigger;
use crate::controllers::notifications::Notifier;
use crate::error::{UploadError, ValidationError};
use crate::models::{Notification, PendingFile, UploadProgress};
use crate::services::{FilesApi, ProgressTracker};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Files uploaded successfully!";
pub const UPLOAD_FAILED_MESSAGE: &str = "Error uploading files. Please try again.";

#[derive(Default)]
struct UploadState {
    selection: Vec<PendingFile>,
    error: Option<String>,
    success: Option<String>,
}

/// Stages PDF files and sends them to the files API in one request.
#[derive(Clone)]
pub struct UploadController {
    api: Arc<dyn FilesApi>,
    state: Arc<Mutex<UploadState>>,
    progress: Arc<watch::Sender<UploadProgress>>,
    notifier: Notifier,
    reload: ReloadTrigger,
}

/// What the upload panel renders.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadView {
    pub selected: Vec<String>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub progress: UploadProgress,
}

impl UploadView {
    pub fn can_upload(&self) -> bool {
        !self.progress.uploading && !self.selected.is_empty()
    }
}

impl UploadController {
    pub fn new(api: Arc<dyn FilesApi>, notifier: Notifier, reload: ReloadTrigger) -> Self {
        let (progress, _) = watch::channel(UploadProgress::idle());
        Self {
            api,
            state: Arc::new(Mutex::new(UploadState::default())),
            progress: Arc::new(progress),
            notifier,
            reload,
        }
    }

    /// Current progress, readable while an upload is in flight.
    pub fn progress(&self) -> UploadProgress {
        *self.progress.borrow()
    }

    /// Replace the selection with `candidates`, or discard it entirely if
    /// any candidate is not declared as a PDF.
    pub async fn select_files(&self, candidates: Vec<PendingFile>) -> Result<(), ValidationError> {
        let mut state = self.state.lock().await;

        if let Some(rejected) = candidates.iter().find(|file| !file.is_pdf()) {
            tracing::info!(
                file_name = %rejected.name,
                content_type = %rejected.content_type,
                candidates = candidates.len(),
                "Rejected non-PDF selection"
            );
            state.selection.clear();
            state.error = Some(ValidationError::NonPdfSelection.to_string());
            return Err(ValidationError::NonPdfSelection);
        }

        tracing::debug!(files = candidates.len(), "Selection replaced");
        state.selection = candidates;
        state.error = None;
        Ok(())
    }

    pub async fn clear_selection(&self) {
        let mut state = self.state.lock().await;
        state.selection.clear();
        state.error = None;
    }

    pub async fn selection(&self) -> Vec<PendingFile> {
        self.state.lock().await.selection.clone()
    }

    /// Send the whole selection as one multipart request.
    ///
    /// Success clears the selection and fires the reload trigger once.
    /// Failure keeps the selection so the user can retry.
    pub async fn upload(&self) -> Result<(), UploadError> {
        let files = {
            let mut state = self.state.lock().await;
            if state.selection.is_empty() {
                state.error = Some(ValidationError::EmptySelection.to_string());
                return Err(ValidationError::EmptySelection.into());
            }
            state.error = None;
            state.success = None;
            state.selection.clone()
        };

        let total_bytes = files.iter().map(PendingFile::len).sum();
        self.progress.send_replace(UploadProgress::started());
        let tracker = ProgressTracker::new(self.progress.clone(), total_bytes);

        let result = self.api.upload_files(files, tracker).await;

        self.progress.send_replace(UploadProgress::idle());
        let mut state = self.state.lock().await;

        match result {
            Ok(()) => {
                state.selection.clear();
                state.success = Some(UPLOAD_SUCCESS_MESSAGE.to_string());
                drop(state);

                self.notifier.push(Notification::success(UPLOAD_SUCCESS_MESSAGE));
                self.reload.fire();
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Upload failed");
                state.error = Some(UPLOAD_FAILED_MESSAGE.to_string());
                drop(state);

                let message = e
                    .server_message()
                    .unwrap_or_else(|| UPLOAD_FAILED_MESSAGE.to_string());
                self.notifier.push(Notification::error(message));
                Err(e.into())
            }
        }
    }

    pub async fn view(&self) -> UploadView {
        let state = self.state.lock().await;
        UploadView {
            selected: state.selection.iter().map(|f| f.name.clone()).collect(),
            error: state.error.clone(),
            success: state.success.clone(),
            progress: self.progress(),
        }
    }
}
