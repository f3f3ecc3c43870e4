use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handlers::{
    app::{health_check, index},
    files::{
        cancel_delete, clear_search, confirm_delete, list_files, request_delete, search, set_page,
        set_size,
    },
    metrics::metrics,
    upload::{clear_selection, progress, select_files, upload},
};
use crate::middleware::metrics::metrics_middleware;
use crate::AppState;

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    // Session setup
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // Set to true in production with HTTPS
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route(
            "/upload/selection",
            post(select_files).delete(clear_selection),
        )
        .route("/upload", post(upload))
        .route("/upload/progress", get(progress))
        .route("/files", get(list_files))
        .route("/files/search", post(search))
        .route("/files/search/clear", post(clear_search))
        .route("/files/size", post(set_size))
        .route("/files/page/:page", post(set_page))
        .route("/files/delete/request", post(request_delete))
        .route("/files/delete/confirm", post(confirm_delete))
        .route("/files/delete/cancel", post(cancel_delete))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(session_layer)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Outermost so the span above sees the generated id
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .with_state(state)
}
