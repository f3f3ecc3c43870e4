use config::{Config, ConfigError, Environment, File};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Locate `<crate>/config`, whether the process was started from the
/// workspace root or from inside the crate directory.
pub fn configuration_directory(crate_name: &str) -> Result<PathBuf, ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| ConfigError::Foreign(Box::new(e)))?;

    if base_path.ends_with(crate_name) {
        Ok(base_path.join("config"))
    } else {
        Ok(base_path.join(crate_name).join("config"))
    }
}

/// Load `base.yaml` from `directory`, then overlay `APP_`-prefixed
/// environment variables (`APP_SERVER__PORT=9000`).
pub fn load_layered<T: DeserializeOwned>(directory: &Path) -> Result<T, ConfigError> {
    dotenvy::dotenv().ok();

    let settings = Config::builder()
        .add_source(File::from(directory.join("base.yaml")).required(true))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        server: SampleServer,
    }

    #[derive(Debug, Deserialize)]
    struct SampleServer {
        host: String,
        port: u16,
    }

    #[test]
    fn loads_base_yaml() {
        let dir = std::env::temp_dir().join(format!("service-core-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("base.yaml"),
            "server:\n  host: 127.0.0.1\n  port: 8123\n",
        )
        .unwrap();

        let sample: Sample = load_layered(&dir).unwrap();
        assert_eq!(sample.server.host, "127.0.0.1");
        assert_eq!(sample.server.port, 8123);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_base_yaml_is_an_error() {
        let dir = std::env::temp_dir().join(format!("service-core-missing-{}", uuid::Uuid::new_v4()));
        let result: Result<Sample, _> = load_layered(&dir);
        assert!(result.is_err());
    }
}
