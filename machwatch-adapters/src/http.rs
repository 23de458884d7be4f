//! HTTP adapter for the dashboard's machine stats API.
//!
//! This adapter pulls stats by querying the dashboard backend, which proxies
//! the monitoring service for each machine.
//!
//! ## Endpoints
//!
//! - `GET {prefix}/backends/{backend}/machines/{machine}/stats?start=&stop=&step=`
//!   with `start`/`stop` in epoch seconds and `step` in milliseconds
//! - `GET {prefix}/backends/{backend}/machines/{machine}/monitoring` answering
//!   `{"monitoring": true | false}` (a bare JSON boolean is accepted too)
//! - `POST {prefix}/backends/{backend}/machines/{machine}/monitoring` with a
//!   JSON body `{"action": "enable" | "disable"}`
//!
//! ## Example
//!
//! ```rust,no_run
//! use machwatch_adapters::http::HttpStatsFetcher;
//! use machwatch_adapters::SnapshotFetcher;
//! use machwatch_types::TimeWindow;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = HttpStatsFetcher::builder()
//!         .endpoint("http://localhost:8000")
//!         .backend("ec2-eu")
//!         .machine("i-0abc")
//!         .build()?;
//!
//!     let window = TimeWindow::ending_at(1_700_000_000_000, 60, 5000)?;
//!     let snapshot = fetcher.fetch(window).await?;
//!
//!     println!("cores: {:?}", snapshot.cores());
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use machwatch_types::{RawSnapshot, TimeWindow};

use crate::{FetchError, MonitoringToggle, SnapshotFetcher};

/// Client-side timeout applied to every request unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches stats snapshots for one machine over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStatsFetcher {
    client: Client,
    endpoint: String,
    backend_id: String,
    machine_id: String,
    description: String,
}

impl HttpStatsFetcher {
    /// Create a new builder for configuring the fetcher.
    pub fn builder() -> HttpStatsFetcherBuilder {
        HttpStatsFetcherBuilder::default()
    }

    /// URL of the machine resource, without a trailing slash.
    fn machine_url(&self) -> String {
        format!(
            "{}/backends/{}/machines/{}",
            self.endpoint,
            urlencoded(&self.backend_id),
            urlencoded(&self.machine_id)
        )
    }

    fn stats_url(&self) -> String {
        format!("{}/stats", self.machine_url())
    }

    fn monitoring_url(&self) -> String {
        format!("{}/monitoring", self.machine_url())
    }
}

#[async_trait]
impl SnapshotFetcher for HttpStatsFetcher {
    async fn fetch(&self, window: TimeWindow) -> Result<RawSnapshot, FetchError> {
        let url = self.stats_url();
        debug!(
            url = %url,
            start = window.start_secs(),
            stop = window.stop_secs(),
            step = window.step(),
            "fetching stats"
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("start", window.start_secs()),
                ("stop", window.stop_secs()),
                ("step", window.step()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let snapshot: RawSnapshot = response.json().await?;

        Ok(snapshot)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Body of the monitoring status response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MonitoringStatus {
    Object { monitoring: bool },
    Bare(bool),
}

impl MonitoringStatus {
    fn enabled(&self) -> bool {
        match *self {
            MonitoringStatus::Object { monitoring } | MonitoringStatus::Bare(monitoring) => monitoring,
        }
    }
}

#[async_trait]
impl MonitoringToggle for HttpStatsFetcher {
    async fn monitoring_enabled(&self) -> Result<bool, FetchError> {
        let url = self.monitoring_url();
        debug!(url = %url, "checking monitoring");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let status: MonitoringStatus = response.json().await?;
        Ok(status.enabled())
    }

    async fn set_monitoring(&self, enabled: bool) -> Result<(), FetchError> {
        let action = if enabled { "enable" } else { "disable" };
        let url = self.monitoring_url();
        debug!(url = %url, action, "updating monitoring");

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "action": action }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Builder for HttpStatsFetcher.
#[derive(Debug, Default)]
pub struct HttpStatsFetcherBuilder {
    endpoint: Option<String>,
    backend_id: Option<String>,
    machine_id: Option<String>,
    timeout: Option<Duration>,
}

impl HttpStatsFetcherBuilder {
    /// Set the API prefix (e.g., "http://localhost:8000").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the backend (cloud provider account) the machine belongs to.
    pub fn backend(mut self, backend_id: impl Into<String>) -> Self {
        self.backend_id = Some(backend_id.into());
        self
    }

    /// Set the machine to monitor.
    pub fn machine(mut self, machine_id: impl Into<String>) -> Self {
        self.machine_id = Some(machine_id.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the fetcher.
    ///
    /// Fails if the backend or machine id is missing, or if the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<HttpStatsFetcher, FetchError> {
        let backend_id = self
            .backend_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| FetchError::InvalidEndpoint("backend id is required".to_string()))?;
        let machine_id = self
            .machine_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| FetchError::InvalidEndpoint("machine id is required".to_string()))?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(|e| FetchError::InvalidEndpoint(e.to_string()))?;

        let description = format!("http: {}/backends/{}/machines/{}", endpoint, backend_id, machine_id);

        Ok(HttpStatsFetcher {
            client,
            endpoint,
            backend_id,
            machine_id,
            description,
        })
    }
}

// URL encode a string for use as a single path segment
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            '?' => out.push_str("%3F"),
            '#' => out.push_str("%23"),
            ' ' => out.push_str("%20"),
            _ => out.push(c),
        }
    }
    out
}
