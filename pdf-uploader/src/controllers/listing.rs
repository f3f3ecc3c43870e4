use crate::controllers::coordinator::ReloadListener;
use crate::controllers::notifications::Notifier;
use crate::models::{FileRecord, MaxSize, Notification, QueryState};
use crate::services::FilesApi;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const LIST_FAILED_MESSAGE: &str = "Error fetching files. Please try again later.";
pub const DELETE_SUCCESS_MESSAGE: &str = "File deleted successfully";
pub const DELETE_FAILED_MESSAGE: &str = "Error deleting file";

/// Two-step delete guard. At most one row is ever pending or deleting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeleteState {
    #[default]
    Idle,
    PendingConfirmation(String),
    Deleting(String),
}

impl DeleteState {
    pub fn is_pending(&self, filename: &str) -> bool {
        matches!(self, DeleteState::PendingConfirmation(f) if f == filename)
    }

    pub fn is_deleting(&self, filename: &str) -> bool {
        matches!(self, DeleteState::Deleting(f) if f == filename)
    }
}

struct ListingState {
    query: QueryState,
    files: Vec<FileRecord>,
    total_files: u64,
    total_pages: u32,
    loading: bool,
    error: Option<String>,
    delete: DeleteState,
    /// Sequence number of the most recently issued list request.
    latest_request: u64,
}

/// Query parameters, the current page of files and the delete flow.
#[derive(Clone)]
pub struct ListingController {
    api: Arc<dyn FilesApi>,
    state: Arc<Mutex<ListingState>>,
    notifier: Notifier,
    shutdown: CancellationToken,
    /// True while no list request is awaiting its response.
    settled: Arc<watch::Sender<bool>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileRow {
    pub filename: String,
    pub size: String,
    pub uploaded_on: String,
    pub pending_confirmation: bool,
    pub deleting: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizeOption {
    pub value: u8,
    pub label: &'static str,
    pub selected: bool,
}

/// What the listing panel renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingView {
    pub rows: Vec<FileRow>,
    pub filename_filter: String,
    pub size_options: Vec<SizeOption>,
    pub page: u32,
    pub total_pages: u32,
    pub total_files: u64,
    pub prev_disabled: bool,
    pub next_disabled: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub delete: DeleteState,
}

impl ListingView {
    pub fn prev_page(&self) -> u32 {
        self.page.saturating_sub(1)
    }

    pub fn next_page(&self) -> u32 {
        self.page.saturating_add(1)
    }
}

impl ListingController {
    pub fn new(api: Arc<dyn FilesApi>, notifier: Notifier, page_size: u32) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(ListingState {
                query: QueryState::new(page_size),
                files: Vec::new(),
                total_files: 0,
                total_pages: 0,
                loading: false,
                error: None,
                delete: DeleteState::Idle,
                latest_request: 0,
            })),
            notifier,
            shutdown: CancellationToken::new(),
            settled: Arc::new(watch::channel(true).0),
        }
    }

    /// Request the current page. Only the newest request's response is
    /// applied; anything older is dropped on arrival.
    pub async fn fetch_page(&self) {
        let (sequence, query) = {
            let mut state = self.state.lock().await;
            state.latest_request += 1;
            state.loading = true;
            state.error = None;
            self.settled.send_replace(false);
            (state.latest_request, state.query.clone())
        };

        let result = tokio::select! {
            _ = self.shutdown.cancelled() => {
                tracing::debug!(sequence, "List request cancelled");
                return;
            }
            result = self.api.list_files(&query) => result,
        };

        let mut state = self.state.lock().await;
        if sequence != state.latest_request {
            tracing::debug!(
                sequence,
                latest = state.latest_request,
                "Discarding stale listing response"
            );
            return;
        }

        state.loading = false;
        self.settled.send_replace(true);
        match result {
            Ok(page) => {
                state.files = page.files;
                state.total_files = page.total_files;
                state.total_pages = page.total_pages;
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    page = query.page,
                    filename = %query.filename_filter,
                    "Failed to fetch files"
                );
                state.error = Some(LIST_FAILED_MESSAGE.to_string());
            }
        }
    }

    /// Wait until the newest list request has been applied. Returns early
    /// on shutdown.
    pub async fn settled(&self) {
        let mut settled = self.settled.subscribe();
        tokio::select! {
            _ = self.shutdown.cancelled() => {}
            _ = async {
                while !*settled.borrow_and_update() {
                    if settled.changed().await.is_err() {
                        break;
                    }
                }
            } => {}
        }
    }

    /// Change the filename search; returns to page 1 and refetches.
    pub async fn set_filename_filter(&self, filter: impl Into<String>) {
        {
            let mut state = self.state.lock().await;
            state.query.filename_filter = filter.into();
            state.query.page = 1;
        }
        self.fetch_page().await;
    }

    pub async fn clear_search(&self) {
        self.set_filename_filter(String::new()).await;
    }

    /// Change the size bound; returns to page 1 and refetches.
    pub async fn set_size_filter(&self, max_size: MaxSize) {
        {
            let mut state = self.state.lock().await;
            state.query.max_size = max_size;
            state.query.page = 1;
        }
        self.fetch_page().await;
    }

    /// Jump to `page` without bounds checks and refetch.
    pub async fn set_page(&self, page: u32) {
        self.state.lock().await.query.page = page;
        self.fetch_page().await;
    }

    pub async fn query(&self) -> QueryState {
        self.state.lock().await.query.clone()
    }

    /// Ask for confirmation before deleting `filename`. Replaces any other
    /// pending row.
    pub async fn request_delete(&self, filename: impl Into<String>) {
        self.state.lock().await.delete = DeleteState::PendingConfirmation(filename.into());
    }

    pub async fn cancel_delete(&self) {
        let mut state = self.state.lock().await;
        if matches!(state.delete, DeleteState::PendingConfirmation(_)) {
            state.delete = DeleteState::Idle;
        }
    }

    /// Delete `filename`, provided it is the row awaiting confirmation.
    /// A confirmation for any other row is dropped.
    pub async fn confirm_delete(&self, filename: &str) {
        let filename = {
            let mut state = self.state.lock().await;
            if !state.delete.is_pending(filename) {
                tracing::debug!(
                    filename = %filename,
                    state = ?state.delete,
                    "Ignoring confirmation for a row that is not pending"
                );
                return;
            }
            state.delete = DeleteState::Deleting(filename.to_string());
            filename.to_string()
        };

        match self.api.delete_file(&filename).await {
            Ok(()) => {
                self.finish_delete(&filename).await;
                self.notifier.push(Notification::success(DELETE_SUCCESS_MESSAGE));
                self.fetch_page().await;
            }
            Err(e) => {
                tracing::error!(filename = %filename, error = %e, "Failed to delete file");
                self.finish_delete(&filename).await;
                self.notifier.push(Notification::error(DELETE_FAILED_MESSAGE));
            }
        }
    }

    /// Back to idle, unless the user already moved on to another row.
    async fn finish_delete(&self, filename: &str) {
        let mut state = self.state.lock().await;
        if state.delete.is_deleting(filename) {
            state.delete = DeleteState::Idle;
        }
    }

    pub async fn delete_state(&self) -> DeleteState {
        self.state.lock().await.delete.clone()
    }

    /// Refetch on every reload edge until shutdown.
    pub fn watch_reloads(&self, mut listener: ReloadListener) -> JoinHandle<()> {
        let listing = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = listing.shutdown.cancelled() => break,
                    edge = listener.next_edge() => {
                        if !edge {
                            break;
                        }
                        tracing::debug!(generation = listener.generation(), "Reload signal received");
                        listing.fetch_page().await;
                    }
                }
            }
        })
    }

    /// Cancel in-flight list requests and stop the reload watcher.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub async fn view(&self) -> ListingView {
        let state = self.state.lock().await;
        let query = &state.query;

        let rows = state
            .files
            .iter()
            .map(|file| FileRow {
                filename: file.filename.clone(),
                size: file.size_display(),
                uploaded_on: file.uploaded_on(),
                pending_confirmation: state.delete.is_pending(&file.filename),
                deleting: state.delete.is_deleting(&file.filename),
            })
            .collect();

        let size_options = MaxSize::ALL
            .iter()
            .map(|size| SizeOption {
                value: size.megabytes(),
                label: size.label(),
                selected: *size == query.max_size,
            })
            .collect();

        ListingView {
            rows,
            filename_filter: query.filename_filter.clone(),
            size_options,
            page: query.page,
            total_pages: state.total_pages,
            total_files: state.total_files,
            prev_disabled: query.page <= 1,
            next_disabled: query.page >= state.total_pages,
            loading: state.loading,
            error: state.error.clone(),
            delete: state.delete.clone(),
        }
    }
}
