use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub sanity: SanityConfig,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub intervals: IntervalConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default = "default_environment")]
    pub environment: Environment,
}

/// The application under watch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Upstream Sanity content service. `project_id = None` means the upstream
/// check short-circuits to `not_configured` without a network call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanityConfig {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_dataset")]
    pub dataset: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// GROQ probe query, URL-encoded into the query endpoint.
    #[serde(default = "default_probe_query")]
    pub query: String,
    /// Full query-endpoint override (self-hosted mirrors, tests). When set,
    /// the upstream counts as configured even without a project id.
    #[serde(default)]
    pub query_url: Option<String>,
}

/// Webhook alerting. `webhook_url = None` disables alerting entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Errors within the window before an alert fires.
    #[serde(default = "default_alert_threshold")]
    pub threshold: usize,
    /// Sliding error-window length.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Webhook POST timeout. Delivery is best-effort, never retried.
    #[serde(default = "default_webhook_timeout")]
    pub webhook_timeout_secs: u64,
}

/// JSON-lines log files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// Size threshold that triggers rename rotation.
    #[serde(default = "default_max_log_size")]
    pub max_file_size_bytes: u64,
    /// Rotated files to keep per log. 0 = keep all.
    #[serde(default)]
    pub max_rotated_files: usize,
    /// Echo entries to stdout. Unset ⇒ follow `environment` (development echoes).
    #[serde(default)]
    pub console_echo: Option<bool>,
}

/// Periodic check cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalConfig {
    #[serde(default = "default_health_interval")]
    pub health_secs: u64,
    #[serde(default = "default_sanity_interval")]
    pub sanity_secs: u64,
    #[serde(default = "default_performance_interval")]
    pub performance_secs: u64,
    #[serde(default = "default_report_interval")]
    pub report_secs: u64,
}

/// Fixed decision thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// A sample above this latency records a `slow_response` error.
    #[serde(default = "default_slow_response_ms")]
    pub slow_response_ms: u64,
    /// Analysis counts samples above this latency as slow requests.
    #[serde(default = "default_analysis_slow_ms")]
    pub analysis_slow_ms: u64,
    /// Per-request timeout for health/upstream/performance probes.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_host() -> String { "localhost".into() }
fn default_port() -> u16 { 3001 }
fn default_dataset() -> String { "production".into() }
fn default_api_version() -> String { "v2024-03-15".into() }
fn default_probe_query() -> String { r#"*[_type=="gallery"][0]"#.into() }
fn default_alert_threshold() -> usize { 5 }
fn default_window_secs() -> u64 { 300 }
fn default_webhook_timeout() -> u64 { 10 }
fn default_log_dir() -> PathBuf { PathBuf::from("logs") }
fn default_max_log_size() -> u64 { 10 * 1024 * 1024 }
fn default_health_interval() -> u64 { 30 }
fn default_sanity_interval() -> u64 { 60 }
fn default_performance_interval() -> u64 { 15 }
fn default_report_interval() -> u64 { 300 }
fn default_slow_response_ms() -> u64 { 5000 }
fn default_analysis_slow_ms() -> u64 { 2000 }
fn default_request_timeout() -> u64 { 10 }
fn default_environment() -> Environment { Environment::Production }

// ── Impls ─────────────────────────────────────────────────────

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            sanity: SanityConfig::default(),
            alert: AlertConfig::default(),
            log: LogConfig::default(),
            intervals: IntervalConfig::default(),
            thresholds: ThresholdConfig::default(),
            environment: default_environment(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SanityConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            dataset: default_dataset(),
            api_version: default_api_version(),
            query: default_probe_query(),
            query_url: None,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            threshold: default_alert_threshold(),
            window_secs: default_window_secs(),
            webhook_timeout_secs: default_webhook_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            max_file_size_bytes: default_max_log_size(),
            max_rotated_files: 0,
            console_echo: None,
        }
    }
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            health_secs: default_health_interval(),
            sanity_secs: default_sanity_interval(),
            performance_secs: default_performance_interval(),
            report_secs: default_report_interval(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            slow_response_ms: default_slow_response_ms(),
            analysis_slow_ms: default_analysis_slow_ms(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a YAML file (if present) + `VIGIL_` env
    /// overrides. Nested fields use `__`, e.g. `VIGIL_APP__PORT=8080`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: MonitorConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("VIGIL_").split("__"))
            .extract()?;
        Ok(config)
    }

    /// Root URL of the application under watch.
    pub fn app_url(&self) -> String {
        format!("http://{}:{}/", self.app.host, self.app.port)
    }

    /// Query endpoint of the upstream content service, or `None` when the
    /// upstream is not configured.
    pub fn sanity_query_url(&self) -> Option<String> {
        if let Some(url) = &self.sanity.query_url {
            return Some(url.clone());
        }
        let project_id = self.sanity.project_id.as_deref()?;
        Some(format!(
            "https://{}.api.sanity.io/{}/data/query/{}?query={}",
            project_id,
            self.sanity.api_version,
            self.sanity.dataset,
            urlencoding::encode(&self.sanity.query),
        ))
    }

    /// Whether log entries should be echoed to stdout.
    pub fn echo_to_console(&self) -> bool {
        self.log
            .console_echo
            .unwrap_or(self.environment == Environment::Development)
    }
}
