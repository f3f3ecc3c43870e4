//! service-core: Shared infrastructure for the pdf-uploader workspace.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;

pub use axum;
pub use tracing;
