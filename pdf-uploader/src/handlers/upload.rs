use crate::controllers::UploadView;
use crate::models::{Notification, PendingFile, UploadProgress};
use crate::pages::{CurrentPage, Page};
use askama::Template;
use axum::{
    extract::{multipart::MultipartError, Multipart},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use service_core::error::AppError;

/// Event name the listing panel listens for.
pub const FILES_CHANGED_EVENT: &str = "files-changed";

const FILES_FIELD: &str = "files";

#[derive(Template)]
#[template(path = "fragments/upload_panel.html")]
pub struct UploadPanelFragment {
    pub upload: UploadView,
    pub notifications: Vec<Notification>,
}

#[derive(Template)]
#[template(path = "fragments/upload_progress.html")]
pub struct UploadProgressFragment {
    pub progress: UploadProgress,
}

async fn render_panel(page: &Page) -> UploadPanelFragment {
    UploadPanelFragment {
        upload: page.upload().view().await,
        notifications: page.drain_notifications().await,
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(anyhow::anyhow!("Invalid multipart body: {}", e.body_text()))
    }
}

/// Stage the files chosen in the picker. Every `files` part counts; an
/// empty part (picker cleared) contributes nothing.
pub async fn select_files(
    page: CurrentPage,
    mut multipart: Multipart,
) -> Result<UploadPanelFragment, AppError> {
    let mut candidates = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(multipart_error)?;

        if file_name.is_empty() && data.is_empty() {
            continue;
        }
        candidates.push(PendingFile::new(file_name, content_type, data));
    }

    if let Err(e) = page.upload().select_files(candidates).await {
        tracing::debug!(error = %e, "Selection rejected");
    }

    Ok(render_panel(&page).await)
}

pub async fn clear_selection(page: CurrentPage) -> UploadPanelFragment {
    page.upload().clear_selection().await;
    render_panel(&page).await
}

/// Send the staged files. A successful upload also tells the browser to
/// refresh the listing panel.
pub async fn upload(page: CurrentPage) -> Response {
    let result = page.upload().upload().await;
    let fragment = render_panel(&page).await;

    match result {
        Ok(()) => ([("HX-Trigger", FILES_CHANGED_EVENT)], fragment).into_response(),
        Err(e) => {
            tracing::debug!(page_id = %page.id(), error = %e, "Upload did not complete");
            fragment.into_response()
        }
    }
}

pub async fn progress(page: CurrentPage) -> UploadProgressFragment {
    UploadProgressFragment {
        progress: page.upload().progress(),
    }
}
