use crate::output::PrinterKind;
use crate::storage::StorageBackend;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Sumi-Crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Builds a configuration with defaults for everything but the seed
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            crawler: CrawlerConfig::new(base_url),
            user_agent: UserAgentConfig::default(),
            output: OutputConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// How a run decides it is finished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionMode {
    /// Stop once no page has been reported for one idle window
    #[default]
    Idle,

    /// Stop once every visit task has finished and nothing is left to visit
    Outstanding,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Seed address, also the scope anchor for every discovered link
    pub base_url: String,

    /// Per-fetch timeout (milliseconds)
    ///
    /// With idle completion this must be shorter than `idle_timeout`, or a
    /// slow fetch can outlast the run and its failure is lost.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout: u64,

    /// Quiescence window (milliseconds)
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout: u64,

    /// Maximum number of concurrent fetches, 0 for no limit
    #[serde(default)]
    pub max_in_flight: usize,

    #[serde(default)]
    pub completion: CompletionMode,
}

impl CrawlerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_timeout: default_http_timeout_ms(),
            idle_timeout: default_idle_timeout_ms(),
            max_in_flight: 0,
            completion: CompletionMode::default(),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,
}

impl UserAgentConfig {
    /// The `User-Agent` header value, `name/version`
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiCrawl".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub printer: PrinterKind,

    /// Write the rendered output to a file as well as stdout
    #[serde(default)]
    pub persist: bool,

    /// Directory that persisted output is written to
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            printer: PrinterKind::default(),
            persist: false,
            directory: default_output_directory(),
        }
    }
}

/// Page store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Path to the SQLite database file, used by the sqlite backend
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_path: default_database_path(),
        }
    }
}

fn default_http_timeout_ms() -> u64 {
    5_000
}

fn default_idle_timeout_ms() -> u64 {
    10_000
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./crawl.db")
}
