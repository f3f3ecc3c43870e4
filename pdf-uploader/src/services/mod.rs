pub mod files_api;
pub mod files_client;
pub mod metrics;

pub use files_api::{FilesApi, ProgressTracker};
pub use files_client::FilesClient;
