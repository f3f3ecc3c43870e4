use crate::controllers::{ListingView, UploadView};
use crate::models::Notification;
use crate::pages::remember_page;
use crate::AppState;
use askama::Template;
use axum::extract::State;
use service_core::error::AppError;
use tower_sessions::Session;
use uuid::Uuid;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    /// Sent back on every fragment request as `x-page-id`.
    pub page_id: Uuid,
    pub upload: UploadView,
    pub listing: ListingView,
    pub notifications: Vec<Notification>,
}

/// Full page. Every load starts a new page with default state and fetches
/// the first listing page.
pub async fn index(
    State(state): State<AppState>,
    session: Session,
) -> Result<IndexTemplate, AppError> {
    let page = state.pages.open();
    remember_page(&session, &page).await?;
    page.ensure_loaded().await;

    Ok(IndexTemplate {
        page_id: page.id(),
        upload: page.upload().view().await,
        listing: page.listing().view().await,
        notifications: page.drain_notifications().await,
    })
}

pub async fn health_check() -> &'static str {
    "OK"
}
