use serde::Deserialize;
use service_core::config::{configuration_directory, load_layered};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    pub files_api: FilesApiSettings,
    #[serde(default)]
    pub pages: PageSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

#[derive(Deserialize, Clone, Debug)]
pub struct FilesApiSettings {
    /// Origin of the remote files service, e.g. `https://files.example.com`.
    pub base_url: String,
    /// Rows requested per listing page (`limit` query parameter).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Overall request timeout. Unset means the transport default.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_page_size() -> u32 {
    crate::models::DEFAULT_PAGE_SIZE
}

#[derive(Deserialize, Clone, Debug)]
pub struct PageSettings {
    /// Browser pages untouched for this long are evicted and their
    /// in-flight requests cancelled.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: default_idle_timeout(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_idle_timeout() -> u64 {
    30 * 60
}

fn default_sweep_interval() -> u64 {
    60
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC collector, e.g. `http://tempo:4317`. Spans stay local when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let directory = configuration_directory("pdf-uploader")?;
    load_layered(&directory)
}
