use reqwest::StatusCode;
use thiserror::Error;

/// Rejected user input. The message is shown inline as-is.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Only PDF files are allowed")]
    NonPdfSelection,

    #[error("Please select files first")]
    EmptySelection,
}

/// Failure talking to the remote files API.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Files API returned {status}")]
    Status { status: StatusCode, body: String },

    #[error("Malformed files API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid files API URL: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// User-facing text carried in an error response body, if any.
    ///
    /// A JSON body contributes its `error` or `message` string; any other
    /// non-blank body is used verbatim.
    pub fn server_message(&self) -> Option<String> {
        let TransportError::Status { body, .. } = self else {
            return None;
        };

        let body = body.trim();
        if body.is_empty() {
            return None;
        }

        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
            return ["error", "message"]
                .iter()
                .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
                .map(str::to_string);
        }

        Some(body.to_string())
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(body: &str) -> TransportError {
        TransportError::Status {
            status: StatusCode::BAD_REQUEST,
            body: body.to_string(),
        }
    }

    #[test]
    fn plain_text_body_is_used_verbatim() {
        assert_eq!(
            status("File too large").server_message().as_deref(),
            Some("File too large")
        );
    }

    #[test]
    fn json_error_field_is_extracted() {
        assert_eq!(
            status(r#"{"error":"Only PDFs accepted"}"#).server_message().as_deref(),
            Some("Only PDFs accepted")
        );
        assert_eq!(
            status(r#"{"message":"Quota exceeded"}"#).server_message().as_deref(),
            Some("Quota exceeded")
        );
    }

    #[test]
    fn blank_or_opaque_bodies_have_no_message() {
        assert_eq!(status("   ").server_message(), None);
        assert_eq!(status(r#"{"code":42}"#).server_message(), None);
        assert_eq!(TransportError::InvalidUrl("files.local".to_string()).server_message(), None);
    }
}
