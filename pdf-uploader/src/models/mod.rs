pub mod file;
pub mod notification;
pub mod query;
pub mod upload;

pub use file::{FilePage, FileRecord};
pub use notification::{Notification, NotificationLevel};
pub use query::{ListFilesParams, MaxSize, QueryState, DEFAULT_PAGE_SIZE};
pub use upload::{PendingFile, UploadProgress, PDF_MIME_TYPE};
