use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// One stored file as reported by the remote files API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub filename: String,
    #[serde(rename = "sizeMB")]
    pub size_mb: f64,
    #[serde(rename = "uploadedAt", deserialize_with = "deserialize_uploaded_at")]
    pub uploaded_at: DateTime<Utc>,
}

impl FileRecord {
    /// Size with two decimals, e.g. `2.50 MB`.
    pub fn size_display(&self) -> String {
        format!("{:.2} MB", self.size_mb)
    }

    /// Upload day as `M/D/YYYY` (UTC).
    pub fn uploaded_on(&self) -> String {
        format!(
            "{}/{}/{}",
            self.uploaded_at.month(),
            self.uploaded_at.day(),
            self.uploaded_at.year()
        )
    }
}

/// One page of the listing plus the server's totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePage {
    pub files: Vec<FileRecord>,
    pub total_files: u64,
    pub total_pages: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
}

/// The service stores `uploadedAt` either as epoch milliseconds or as an
/// ISO-8601 string depending on the driver; accept both.
fn deserialize_uploaded_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => ms,
        RawTimestamp::FractionalMillis(ms) => ms as i64,
        RawTimestamp::Text(text) => {
            return DateTime::parse_from_rfc3339(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| de::Error::custom(format!("invalid uploadedAt '{}': {}", text, e)));
        }
    };

    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| de::Error::custom(format!("uploadedAt out of range: {}", millis)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_listing_with_millisecond_timestamps() {
        let page: FilePage = serde_json::from_value(json!({
            "files": [{"filename": "a.pdf", "sizeMB": 2.5, "uploadedAt": 1690000000000i64}],
            "totalFiles": 1,
            "totalPages": 1
        }))
        .unwrap();

        assert_eq!(page.total_files, 1);
        assert_eq!(page.total_pages, 1);
        let file = &page.files[0];
        assert_eq!(file.filename, "a.pdf");
        assert_eq!(file.size_display(), "2.50 MB");
        assert_eq!(file.uploaded_on(), "7/22/2023");
    }

    #[test]
    fn parses_iso_timestamps() {
        let file: FileRecord = serde_json::from_value(json!({
            "filename": "report.pdf",
            "sizeMB": 0.123,
            "uploadedAt": "2024-01-05T10:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(file.uploaded_on(), "1/5/2024");
        assert_eq!(file.size_display(), "0.12 MB");
    }

    #[test]
    fn rejects_garbage_timestamps() {
        let result: Result<FileRecord, _> = serde_json::from_value(json!({
            "filename": "x.pdf",
            "sizeMB": 1.0,
            "uploadedAt": "yesterday"
        }));
        assert!(result.is_err());
    }
}
