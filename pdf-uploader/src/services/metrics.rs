use prometheus::{Encoder, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static FILES_API_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

pub fn init_metrics() -> Result<(), prometheus::Error> {
    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )?;

    let request_duration = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )?;

    let files_api_requests = IntCounterVec::new(
        Opts::new(
            "files_api_requests_total",
            "Calls made to the remote files API",
        ),
        &["operation", "outcome"],
    )?;

    registry.register(Box::new(requests_total.clone()))?;
    registry.register(Box::new(request_duration.clone()))?;
    registry.register(Box::new(files_api_requests.clone()))?;

    // First initialisation wins
    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = FILES_API_REQUESTS_TOTAL.set(files_api_requests);

    Ok(())
}

/// No-op until [`init_metrics`] has run.
pub fn record_http_request(method: &str, path: &str, status: &str, seconds: f64) {
    let labels = [method, path, status];
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&labels).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram.with_label_values(&labels).observe(seconds);
    }
}

/// No-op until [`init_metrics`] has run.
pub fn record_files_api_call(operation: &str, success: bool) {
    if let Some(counter) = FILES_API_REQUESTS_TOTAL.get() {
        let outcome = if success { "success" } else { "error" };
        counter.with_label_values(&[operation, outcome]).inc();
    }
}

pub fn get_metrics() -> anyhow::Result<String> {
    let registry = REGISTRY
        .get()
        .ok_or_else(|| anyhow::anyhow!("metrics registry not initialized"))?;

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_files_api_counters() {
        init_metrics().unwrap();
        record_files_api_call("delete", true);
        record_http_request("GET", "/files", "200", 0.01);

        let text = get_metrics().unwrap();
        assert!(text.contains("files_api_requests_total"));
        assert!(text.contains("operation=\"delete\""));
        assert!(text.contains("http_requests_total"));
    }
}
