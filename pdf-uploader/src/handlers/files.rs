use crate::controllers::ListingView;
use crate::models::{MaxSize, Notification};
use crate::pages::{CurrentPage, Page};
use askama::Template;
use axum::extract::{Form, Path};
use serde::Deserialize;
use service_core::error::AppError;

#[derive(Template)]
#[template(path = "fragments/file_table.html")]
pub struct FileTableFragment {
    pub listing: ListingView,
    pub notifications: Vec<Notification>,
    /// Also blank the search box (out-of-band).
    pub reset_search: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct SizeForm {
    pub size: u8,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub filename: String,
}

async fn render_table(page: &Page, reset_search: bool) -> FileTableFragment {
    FileTableFragment {
        listing: page.listing().view().await,
        notifications: page.drain_notifications().await,
        reset_search,
    }
}

pub async fn list_files(page: CurrentPage) -> FileTableFragment {
    page.ensure_loaded().await;
    page.catch_up_reload().await;
    render_table(&page, false).await
}

pub async fn search(page: CurrentPage, Form(form): Form<SearchForm>) -> FileTableFragment {
    page.listing().set_filename_filter(form.filename).await;
    render_table(&page, false).await
}

pub async fn clear_search(page: CurrentPage) -> FileTableFragment {
    page.listing().clear_search().await;
    render_table(&page, true).await
}

pub async fn set_size(
    page: CurrentPage,
    Form(form): Form<SizeForm>,
) -> Result<FileTableFragment, AppError> {
    let max_size = MaxSize::try_from(form.size).map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?;
    page.listing().set_size_filter(max_size).await;
    Ok(render_table(&page, false).await)
}

pub async fn set_page(page: CurrentPage, Path(number): Path<u32>) -> FileTableFragment {
    page.listing().set_page(number).await;
    render_table(&page, false).await
}

pub async fn request_delete(page: CurrentPage, Form(form): Form<DeleteForm>) -> FileTableFragment {
    page.listing().request_delete(form.filename).await;
    render_table(&page, false).await
}

pub async fn confirm_delete(page: CurrentPage, Form(form): Form<DeleteForm>) -> FileTableFragment {
    page.listing().confirm_delete(&form.filename).await;
    render_table(&page, false).await
}

pub async fn cancel_delete(page: CurrentPage) -> FileTableFragment {
    page.listing().cancel_delete().await;
    render_table(&page, false).await
}
