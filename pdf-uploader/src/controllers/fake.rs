//! In-memory `FilesApi` for controller tests.

use crate::error::TransportError;
use crate::models::{FilePage, FileRecord, PendingFile, QueryState};
use crate::services::{FilesApi, ProgressTracker};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

type Scripted<T> = Result<T, (StatusCode, String)>;

struct ScriptedList {
    response: Scripted<FilePage>,
    release: Option<oneshot::Receiver<()>>,
}

#[derive(Default)]
pub struct FakeFilesApi {
    list_script: Mutex<VecDeque<ScriptedList>>,
    upload_script: Mutex<VecDeque<Scripted<()>>>,
    delete_script: Mutex<VecDeque<Scripted<()>>>,
    pub list_calls: Mutex<Vec<QueryState>>,
    pub upload_calls: Mutex<Vec<Vec<PendingFile>>>,
    pub delete_calls: Mutex<Vec<String>>,
}

impl FakeFilesApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_list(&self, response: Scripted<FilePage>) {
        self.list_script.lock().unwrap().push_back(ScriptedList {
            response,
            release: None,
        });
    }

    /// Queue a list response that is held back until the returned sender fires.
    pub fn push_gated_list(&self, response: Scripted<FilePage>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.list_script.lock().unwrap().push_back(ScriptedList {
            response,
            release: Some(rx),
        });
        tx
    }

    pub fn push_upload(&self, response: Scripted<()>) {
        self.upload_script.lock().unwrap().push_back(response);
    }

    pub fn push_delete(&self, response: Scripted<()>) {
        self.delete_script.lock().unwrap().push_back(response);
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }

    pub fn upload_count(&self) -> usize {
        self.upload_calls.lock().unwrap().len()
    }
}

fn into_transport<T>(scripted: Scripted<T>) -> Result<T, TransportError> {
    scripted.map_err(|(status, body)| TransportError::Status { status, body })
}

#[async_trait]
impl FilesApi for FakeFilesApi {
    async fn list_files(&self, query: &QueryState) -> Result<FilePage, TransportError> {
        self.list_calls.lock().unwrap().push(query.clone());
        let scripted = self.list_script.lock().unwrap().pop_front();

        let Some(scripted) = scripted else {
            return Ok(empty_page());
        };
        if let Some(release) = scripted.release {
            let _ = release.await;
        }
        into_transport(scripted.response)
    }

    async fn upload_files(
        &self,
        files: Vec<PendingFile>,
        progress: Arc<ProgressTracker>,
    ) -> Result<(), TransportError> {
        for file in &files {
            progress.record(file.len());
        }
        self.upload_calls.lock().unwrap().push(files);
        let scripted = self.upload_script.lock().unwrap().pop_front();
        into_transport(scripted.unwrap_or(Ok(())))
    }

    async fn delete_file(&self, filename: &str) -> Result<(), TransportError> {
        self.delete_calls.lock().unwrap().push(filename.to_string());
        let scripted = self.delete_script.lock().unwrap().pop_front();
        into_transport(scripted.unwrap_or(Ok(())))
    }
}

pub fn empty_page() -> FilePage {
    FilePage {
        files: Vec::new(),
        total_files: 0,
        total_pages: 0,
    }
}

pub fn record(filename: &str, size_mb: f64) -> FileRecord {
    FileRecord {
        filename: filename.to_string(),
        size_mb,
        uploaded_at: Utc.timestamp_millis_opt(1_690_000_000_000).unwrap(),
    }
}

pub fn page_of(names: &[&str], total_pages: u32) -> FilePage {
    FilePage {
        files: names.iter().map(|name| record(name, 1.0)).collect(),
        total_files: names.len() as u64,
        total_pages,
    }
}

pub fn pdf(name: &str, bytes: usize) -> PendingFile {
    PendingFile::new(name, crate::models::PDF_MIME_TYPE, vec![0u8; bytes])
}
