//! Layered configuration: defaults, optional TOML file, environment, flags.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use machwatch_engine::SchedulerConfig;
use serde::Deserialize;

/// Prefix for environment overrides, e.g. `MACHWATCH_ENDPOINT`.
pub const ENV_PREFIX: &str = "MACHWATCH";

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// URL prefix of the dashboard API.
    pub endpoint: String,
    pub backend_id: Option<String>,
    pub machine_id: Option<String>,
    /// Refresh step in milliseconds.
    pub step_ms: u64,
    /// Samples per window.
    pub window_points: usize,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

/// Values given on the command line. `None` leaves lower layers in place.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub backend_id: Option<String>,
    pub machine_id: Option<String>,
    pub step_ms: Option<u64>,
    pub window_points: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub log_level: Option<String>,
}

impl Settings {
    /// Load settings using the process environment.
    pub fn load(config_path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        Self::load_with_env(config_path, None, overrides)
    }

    /// Load settings, reading environment variables from `env` when given.
    pub fn load_with_env(
        config_path: Option<&Path>,
        env: Option<HashMap<String, String>>,
        overrides: Overrides,
    ) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("endpoint", "http://localhost:8000")?
            .set_default("step_ms", 5000_i64)?
            .set_default("window_points", 60_i64)?
            .set_default("timeout_ms", 10_000_i64)?
            .set_default("log_level", "info")?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .set_override_option("endpoint", overrides.endpoint)?
            .set_override_option("backend_id", overrides.backend_id)?
            .set_override_option("machine_id", overrides.machine_id)?
            .set_override_option("step_ms", overrides.step_ms)?
            .set_override_option("window_points", overrides.window_points)?
            .set_override_option("timeout_ms", overrides.timeout_ms)?
            .set_override_option("log_level", overrides.log_level)?
            .build()
            .context("Failed to load configuration")?;

        config
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            step: Duration::from_millis(self.step_ms),
            window_points: self.window_points,
            ..SchedulerConfig::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    fn toml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults() {
        let settings = Settings::load_with_env(None, no_env(), Overrides::default()).unwrap();
        assert_eq!(settings.endpoint, "http://localhost:8000");
        assert_eq!(settings.backend_id, None);
        assert_eq!(settings.step_ms, 5000);
        assert_eq!(settings.window_points, 60);
        assert_eq!(settings.timeout(), Duration::from_secs(10));
        assert_eq!(settings.log_level, "info");

        let scheduler = settings.scheduler_config();
        assert_eq!(scheduler.step, Duration::from_secs(5));
        assert_eq!(scheduler.window_points, 60);
    }

    #[test]
    fn file_overrides_defaults() {
        let file = toml_file(
            r#"
endpoint = "https://dash.example.com/api"
backend_id = "ec2-eu"
machine_id = "i-0abc"
window_points = 120
"#,
        );
        let settings =
            Settings::load_with_env(Some(file.path()), no_env(), Overrides::default()).unwrap();
        assert_eq!(settings.endpoint, "https://dash.example.com/api");
        assert_eq!(settings.backend_id.as_deref(), Some("ec2-eu"));
        assert_eq!(settings.machine_id.as_deref(), Some("i-0abc"));
        assert_eq!(settings.window_points, 120);
        assert_eq!(settings.step_ms, 5000);
    }

    #[test]
    fn env_overrides_file_and_flags_override_env() {
        let file = toml_file("backend_id = \"from-file\"\nstep_ms = 1000\n");
        let env = HashMap::from([
            ("MACHWATCH_BACKEND_ID".to_string(), "from-env".to_string()),
            ("MACHWATCH_MACHINE_ID".to_string(), "m-env".to_string()),
            ("MACHWATCH_STEP_MS".to_string(), "2000".to_string()),
        ]);
        let overrides = Overrides {
            machine_id: Some("m-flag".to_string()),
            ..Overrides::default()
        };

        let settings = Settings::load_with_env(Some(file.path()), Some(env), overrides).unwrap();
        assert_eq!(settings.backend_id.as_deref(), Some("from-env"));
        assert_eq!(settings.machine_id.as_deref(), Some("m-flag"));
        assert_eq!(settings.step_ms, 2000);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(Settings::load_with_env(Some(&missing), no_env(), Overrides::default()).is_err());
    }

    #[test]
    fn malformed_value_is_an_error() {
        let file = toml_file("step_ms = \"soon\"\n");
        let err = Settings::load_with_env(Some(file.path()), no_env(), Overrides::default())
            .unwrap_err();
        assert!(format!("{err:#}").contains("Invalid configuration"));
    }
}
