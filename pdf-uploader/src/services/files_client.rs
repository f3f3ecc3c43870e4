//! HTTP client for the remote files service.

use crate::config::FilesApiSettings;
use crate::error::TransportError;
use crate::models::{FilePage, PendingFile, QueryState};
use crate::services::files_api::{FilesApi, ProgressTracker};
use crate::services::metrics::record_files_api_call;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode, Url};
use service_core::observability::TracedClientExt;
use std::sync::Arc;
use std::time::Duration;

/// Size of the body chunks handed to the transport; one progress update each.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

pub struct FilesClient {
    client: Client,
    base_url: Url,
}

impl FilesClient {
    pub fn new(settings: FilesApiSettings) -> anyhow::Result<Self> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            anyhow::anyhow!("Invalid files_api.base_url '{}': {}", settings.base_url, e)
        })?;

        if base_url.cannot_be_a_base() {
            anyhow::bail!("files_api.base_url '{}' cannot carry a path", settings.base_url);
        }

        let mut builder = Client::builder();
        if let Some(seconds) = settings.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        tracing::info!(base_url = %base_url, "Files API client configured");

        Ok(Self { client, base_url })
    }

    /// Base URL with `segments` appended, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments.iter().copied());
        Ok(url)
    }

    async fn fetch_page(&self, query: &QueryState) -> Result<FilePage, TransportError> {
        let url = self.endpoint(&["api", "files"])?;

        let response = self
            .client
            .traced_get(url.as_str())
            .query(&query.to_params())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "Failed to send list request");
                TransportError::from(e)
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = %status, body = %body, "Files API rejected list request");
            return Err(TransportError::Status { status, body });
        }

        let page: FilePage = serde_json::from_str(&body)?;

        tracing::debug!(
            files = page.files.len(),
            total_files = page.total_files,
            total_pages = page.total_pages,
            "Listed files"
        );

        Ok(page)
    }

    async fn post_files(
        &self,
        files: Vec<PendingFile>,
        progress: Arc<ProgressTracker>,
    ) -> Result<(), TransportError> {
        let url = self.endpoint(&["api", "upload"])?;
        let file_count = files.len();

        let mut form = Form::new();
        for file in files {
            let length = file.len();
            let tracker = progress.clone();
            let chunks = stream::iter(split_into_chunks(file.data, UPLOAD_CHUNK_SIZE)).map(
                move |chunk| {
                    tracker.record(chunk.len() as u64);
                    Ok::<Bytes, std::io::Error>(chunk)
                },
            );

            let part = Part::stream_with_length(Body::wrap_stream(chunks), length)
                .file_name(file.name)
                .mime_str(&file.content_type)?;
            form = form.part("files", part);
        }

        tracing::info!(
            files = file_count,
            total_bytes = progress.total(),
            "Uploading files"
        );

        let response = self
            .client
            .traced_post(url.as_str())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "Failed to send upload request");
                TransportError::from(e)
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(files = file_count, status = %status, "Files uploaded");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, body = %body, "Files API rejected upload");
        Err(TransportError::Status { status, body })
    }

    async fn remove_file(&self, filename: &str) -> Result<(), TransportError> {
        let url = self.endpoint(&["api", "files", filename])?;

        let response = self
            .client
            .traced_delete(url.as_str())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(filename = %filename, error = %e, "Failed to send delete request");
                TransportError::from(e)
            })?;

        let status = response.status();
        if status == StatusCode::OK {
            tracing::info!(filename = %filename, "File deleted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(filename = %filename, status = %status, "Files API rejected delete");
        Err(TransportError::Status { status, body })
    }
}

#[async_trait]
impl FilesApi for FilesClient {
    async fn list_files(&self, query: &QueryState) -> Result<FilePage, TransportError> {
        let result = self.fetch_page(query).await;
        record_files_api_call("list", result.is_ok());
        result
    }

    async fn upload_files(
        &self,
        files: Vec<PendingFile>,
        progress: Arc<ProgressTracker>,
    ) -> Result<(), TransportError> {
        let result = self.post_files(files, progress).await;
        record_files_api_call("upload", result.is_ok());
        result
    }

    async fn delete_file(&self, filename: &str) -> Result<(), TransportError> {
        let result = self.remove_file(filename).await;
        record_files_api_call("delete", result.is_ok());
        result
    }
}

fn split_into_chunks(data: Bytes, chunk_size: usize) -> Vec<Bytes> {
    (0..data.len())
        .step_by(chunk_size)
        .map(|start| data.slice(start..(start + chunk_size).min(data.len())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base_url: &str) -> FilesApiSettings {
        FilesApiSettings {
            base_url: base_url.to_string(),
            page_size: 7,
            timeout_seconds: None,
        }
    }

    #[test]
    fn endpoint_encodes_filename_as_one_segment() {
        let client = FilesClient::new(settings("http://files.local/")).unwrap();
        let url = client.endpoint(&["api", "files", "my report/v2.pdf"]).unwrap();
        assert_eq!(url.as_str(), "http://files.local/api/files/my%20report%2Fv2.pdf");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let client = FilesClient::new(settings("http://files.local/storage")).unwrap();
        let url = client.endpoint(&["api", "upload"]).unwrap();
        assert_eq!(url.as_str(), "http://files.local/storage/api/upload");
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(FilesClient::new(settings("not a url")).is_err());
        assert!(FilesClient::new(settings("mailto:files@example.com")).is_err());
    }

    #[test]
    fn chunks_cover_the_whole_payload() {
        let data = Bytes::from(vec![7u8; 10]);
        let chunks = split_into_chunks(data, 4);
        assert_eq!(
            chunks.iter().map(Bytes::len).collect::<Vec<_>>(),
            vec![4, 4, 2]
        );
        assert!(split_into_chunks(Bytes::new(), 4).is_empty());
    }
}
