//! Browser pages and the registry that keeps them alive between requests.

use crate::config::PageSettings;
use crate::controllers::{
    notification_channel, ListingController, NotificationInbox, PageCoordinator, ReloadListener,
    UploadController,
};
use crate::models::Notification;
use crate::services::FilesApi;
use crate::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use chrono::Utc;
use dashmap::DashMap;
use service_core::error::AppError;
use std::ops::Deref;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_sessions::Session;
use uuid::Uuid;

/// Session key holding the most recently loaded page id.
pub const PAGE_ID_KEY: &str = "page_id";

/// Header carrying the page id of the document that sent the request.
pub const PAGE_ID_HEADER: &str = "x-page-id";

/// One loaded document: both panels, their coordinator and the toast queue.
pub struct Page {
    id: Uuid,
    upload: UploadController,
    listing: ListingController,
    _coordinator: PageCoordinator,
    inbox: Mutex<NotificationInbox>,
    reloads: Mutex<ReloadListener>,
    reload_task: JoinHandle<()>,
    loaded: OnceCell<()>,
    last_seen_ms: AtomicI64,
}

impl Page {
    /// Must be called inside a tokio runtime; spawns the reload watcher.
    pub fn new(id: Uuid, api: Arc<dyn FilesApi>, page_size: u32) -> Self {
        let coordinator = PageCoordinator::new();
        let (notifier, inbox) = notification_channel();

        let upload = UploadController::new(api.clone(), notifier.clone(), coordinator.trigger());
        let listing = ListingController::new(api, notifier, page_size);
        let reload_task = listing.watch_reloads(coordinator.listener());
        let reloads = coordinator.listener();

        Self {
            id,
            upload,
            listing,
            _coordinator: coordinator,
            inbox: Mutex::new(inbox),
            reloads: Mutex::new(reloads),
            reload_task,
            loaded: OnceCell::new(),
            last_seen_ms: AtomicI64::new(Utc::now().timestamp_millis()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn upload(&self) -> &UploadController {
        &self.upload
    }

    pub fn listing(&self) -> &ListingController {
        &self.listing
    }

    /// Fetch the first listing page exactly once per page.
    pub async fn ensure_loaded(&self) {
        self.loaded
            .get_or_init(|| async {
                tracing::debug!(page_id = %self.id, "Initial listing fetch");
                self.listing.fetch_page().await;
            })
            .await;
    }

    /// Refetch if a reload fired since the last catch-up, then wait for the
    /// newest list request so the caller renders post-reload rows even when
    /// the reload watcher has not run yet.
    pub async fn catch_up_reload(&self) {
        let pending = self.reloads.lock().await.take_pending_edge();
        if pending {
            tracing::debug!(page_id = %self.id, "Catching up on reload");
            self.listing.fetch_page().await;
            self.listing.settled().await;
        }
    }

    pub fn touch(&self) {
        self.last_seen_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    fn idle_for(&self, now_ms: i64) -> Duration {
        let idle_ms = now_ms.saturating_sub(self.last_seen_ms.load(Ordering::Relaxed));
        Duration::from_millis(idle_ms.max(0) as u64)
    }

    pub async fn drain_notifications(&self) -> Vec<Notification> {
        self.inbox.lock().await.drain()
    }

    pub fn shutdown(&self) {
        self.listing.shutdown();
        self.reload_task.abort();
    }
}

pub struct PageRegistry {
    pages: DashMap<Uuid, Arc<Page>>,
    api: Arc<dyn FilesApi>,
    page_size: u32,
}

impl PageRegistry {
    pub fn new(api: Arc<dyn FilesApi>, page_size: u32) -> Self {
        Self {
            pages: DashMap::new(),
            api,
            page_size,
        }
    }

    /// A fresh page for a newly loaded document.
    pub fn open(&self) -> Arc<Page> {
        self.get_or_create(None)
    }

    /// The page stored under `id`, or a fresh one. An unknown id (for
    /// example one evicted by the sweeper) is reused for the new page.
    pub fn get_or_create(&self, id: Option<Uuid>) -> Arc<Page> {
        let id = id.unwrap_or_else(Uuid::new_v4);
        let page = self
            .pages
            .entry(id)
            .or_insert_with(|| {
                tracing::info!(page_id = %id, "Page opened");
                Arc::new(Page::new(id, self.api.clone(), self.page_size))
            })
            .clone();
        page.touch();
        page
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Page>> {
        self.pages.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Evict and shut down every page idle for longer than `idle`.
    pub fn sweep(&self, idle: Duration) -> usize {
        self.sweep_at(Utc::now().timestamp_millis(), idle)
    }

    fn sweep_at(&self, now_ms: i64, idle: Duration) -> usize {
        let expired: Vec<Uuid> = self
            .pages
            .iter()
            .filter(|entry| entry.value().idle_for(now_ms) > idle)
            .map(|entry| *entry.key())
            .collect();

        for id in &expired {
            if let Some((_, page)) = self.pages.remove(id) {
                page.shutdown();
                tracing::info!(page_id = %id, "Idle page evicted");
            }
        }
        expired.len()
    }

    pub fn spawn_sweeper(
        self: &Arc<Self>,
        settings: &PageSettings,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        let idle = Duration::from_secs(settings.idle_timeout_seconds);
        let period = Duration::from_secs(settings.sweep_interval_seconds.max(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = registry.sweep(idle);
                        if evicted > 0 {
                            tracing::debug!(evicted, remaining = registry.len(), "Page sweep");
                        }
                    }
                }
            }
        })
    }

    pub fn shutdown_all(&self) {
        for entry in self.pages.iter() {
            entry.value().shutdown();
        }
        self.pages.clear();
    }
}

/// The caller's page: the `x-page-id` header when the document sent one,
/// otherwise the last page loaded in this session.
pub struct CurrentPage(pub Arc<Page>);

impl Deref for CurrentPage {
    type Target = Page;

    fn deref(&self) -> &Page {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentPage {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::InternalError(anyhow::anyhow!(msg)))?;

        let from_header = parts
            .headers
            .get(PAGE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok());
        if let Some(id) = from_header {
            return Ok(CurrentPage(state.pages.get_or_create(Some(id))));
        }

        let stored: Option<Uuid> = session
            .get(PAGE_ID_KEY)
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Session read failed: {}", e)))?;

        let page = state.pages.get_or_create(stored);
        if stored != Some(page.id()) {
            remember_page(&session, &page).await?;
        }

        Ok(CurrentPage(page))
    }
}

/// Make `page` the session's fallback for requests without a page header.
pub async fn remember_page(session: &Session, page: &Page) -> Result<(), AppError> {
    session
        .insert(PAGE_ID_KEY, page.id())
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Session write failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::fake::{page_of, FakeFilesApi};

    fn registry() -> (Arc<FakeFilesApi>, Arc<PageRegistry>) {
        let api = FakeFilesApi::new();
        let registry = Arc::new(PageRegistry::new(api.clone(), 7));
        (api, registry)
    }

    #[tokio::test]
    async fn same_id_returns_same_page() {
        let (_api, registry) = registry();

        let first = registry.get_or_create(None);
        let again = registry.get_or_create(Some(first.id()));

        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn unknown_id_is_reused_for_new_page() {
        let (_api, registry) = registry();
        let id = Uuid::new_v4();

        let page = registry.get_or_create(Some(id));

        assert_eq!(page.id(), id);
        assert!(registry.get(&id).is_some());
    }

    #[tokio::test]
    async fn initial_fetch_happens_once() {
        let (api, registry) = registry();
        api.push_list(Ok(page_of(&["a.pdf"], 1)));
        let page = registry.get_or_create(None);

        page.ensure_loaded().await;
        page.ensure_loaded().await;

        assert_eq!(api.list_count(), 1);
        assert_eq!(page.listing().view().await.rows.len(), 1);
    }

    #[tokio::test]
    async fn upload_on_a_page_refreshes_its_listing() {
        let (api, registry) = registry();
        let page = registry.get_or_create(None);
        page.upload()
            .select_files(vec![crate::controllers::fake::pdf("a.pdf", 4)])
            .await
            .unwrap();

        page.upload().upload().await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), async {
            while api.list_count() < 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(
            page.drain_notifications().await,
            vec![Notification::success("Files uploaded successfully!")]
        );
    }

    #[tokio::test]
    async fn open_always_creates_a_new_page() {
        let (_api, registry) = registry();

        let first = registry.open();
        let second = registry.open();

        assert_ne!(first.id(), second.id());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn catch_up_refetches_once_after_a_reload() {
        let (api, registry) = registry();
        let page = registry.get_or_create(None);
        page.reload_task.abort();
        page.upload()
            .select_files(vec![crate::controllers::fake::pdf("new.pdf", 4)])
            .await
            .unwrap();
        page.upload().upload().await.unwrap();
        api.push_list(Ok(page_of(&["new.pdf"], 1)));

        page.catch_up_reload().await;
        page.catch_up_reload().await;

        assert_eq!(api.list_count(), 1);
        assert_eq!(page.listing().view().await.rows[0].filename, "new.pdf");
    }

    #[tokio::test]
    async fn sweep_evicts_only_idle_pages_and_shuts_them_down() {
        let (_api, registry) = registry();
        let stale = registry.get_or_create(None);
        let now = Utc::now().timestamp_millis();
        stale.last_seen_ms.store(now - 10_000, Ordering::Relaxed);
        let fresh = registry.get_or_create(None);

        let evicted = registry.sweep_at(now, Duration::from_secs(5));

        assert_eq!(evicted, 1);
        assert!(registry.get(&stale.id()).is_none());
        assert!(registry.get(&fresh.id()).is_some());
        assert!(stale.listing().is_shut_down());
        assert!(!fresh.listing().is_shut_down());
    }

    #[tokio::test]
    async fn shutdown_all_empties_registry() {
        let (_api, registry) = registry();
        let page = registry.get_or_create(None);

        registry.shutdown_all();

        assert!(registry.is_empty());
        assert!(page.listing().is_shut_down());
    }
}
