use bytes::Bytes;

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A file staged for upload, with the MIME type the browser declared.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type == PDF_MIME_TYPE
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Snapshot of the upload progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadProgress {
    pub uploading: bool,
    /// `floor(bytes_sent * 100 / bytes_total)`.
    pub percent: u8,
}

impl UploadProgress {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn started() -> Self {
        Self {
            uploading: true,
            percent: 0,
        }
    }
}
