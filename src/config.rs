// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the question intake service.
//!
//! Every field has a serde default so a partial config file or an empty
//! environment still yields a working service backed by the in-memory store.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the question intake service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Include backend error details in failure responses (default: false)
    #[serde(default)]
    pub diagnostics: bool,

    /// Key rate limits on the first `X-Forwarded-For` address instead of the
    /// socket peer. Only enable behind a proxy that overwrites the header
    /// (default: false)
    #[serde(default)]
    pub trust_forwarded_for: bool,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Duplicate detection configuration
    #[serde(default)]
    pub duplicates: DuplicateConfig,

    /// Submission validation configuration
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Question store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Sliding-window rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum submissions per identifier within the window (default: 10)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Trailing window length in milliseconds (default: 60000)
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Maximum distinct identifiers tracked at once (default: 1000)
    #[serde(default = "default_max_identifiers")]
    pub max_identifiers: usize,

    /// Idle time after which an identifier is forgotten, in seconds (default: 3600)
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
}

/// Duplicate detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateConfig {
    /// Similarity above which two questions count as duplicates (default: 0.8)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Compare fuzzily against questions of every type, not only the
    /// candidate's own type (default: false)
    #[serde(default)]
    pub fuzzy_across_types: bool,
}

/// Validation configuration for incoming submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Minimum author length after trimming (default: 2)
    #[serde(default = "default_min_author_len")]
    pub min_author_len: usize,

    /// Minimum question length after trimming (default: 10)
    #[serde(default = "default_min_question_len")]
    pub min_question_len: usize,

    /// Minimum interview answer length after trimming (default: 1)
    #[serde(default = "default_min_answer_len")]
    pub min_answer_len: usize,

    /// Minimum number of non-blank MCQ options (default: 2)
    #[serde(default = "default_min_mcq_options")]
    pub min_mcq_options: usize,
}

/// Which question store implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Tables held in process memory
    Memory,
    /// Google Sheets values API
    Sheets,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sheets" => Ok(Self::Sheets),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Question store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store implementation (default: memory)
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Spreadsheet holding the question tables
    #[serde(default)]
    pub spreadsheet_id: String,

    /// OAuth bearer token for the Sheets API
    #[serde(default)]
    pub access_token: String,

    /// Sheets API base URL (default: https://sheets.googleapis.com)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Upper bound on a single store call in milliseconds (default: 5000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_requests() -> u32 {
    10
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_max_identifiers() -> usize {
    1000
}

fn default_idle_ttl_secs() -> u64 {
    3600
}

fn default_similarity_threshold() -> f64 {
    0.8
}

fn default_min_author_len() -> usize {
    2
}

fn default_min_question_len() -> usize {
    10
}

fn default_min_answer_len() -> usize {
    1
}

fn default_min_mcq_options() -> usize {
    2
}

fn default_backend() -> StoreBackend {
    StoreBackend::Memory
}

fn default_api_base_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            diagnostics: false,
            trust_forwarded_for: false,
            rate_limit: RateLimitConfig::default(),
            duplicates: DuplicateConfig::default(),
            validation: ValidationConfig::default(),
            store: StoreConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
            max_identifiers: default_max_identifiers(),
            idle_ttl_secs: default_idle_ttl_secs(),
        }
    }
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            fuzzy_across_types: false,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_author_len: default_min_author_len(),
            min_question_len: default_min_question_len(),
            min_answer_len: default_min_answer_len(),
            min_mcq_options: default_min_mcq_options(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            spreadsheet_id: String::new(),
            access_token: String::new(),
            api_base_url: default_api_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Get the idle expiry duration
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }
}

impl StoreConfig {
    /// Get the per-call store timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(default.bind_addr),
            diagnostics: env_parse("DIAGNOSTICS").unwrap_or(default.diagnostics),
            trust_forwarded_for: env_parse("TRUST_FORWARDED_FOR")
                .unwrap_or(default.trust_forwarded_for),
            rate_limit: RateLimitConfig {
                max_requests: env_parse("RATE_LIMIT_MAX")
                    .unwrap_or(default.rate_limit.max_requests),
                window_ms: env_parse("RATE_LIMIT_WINDOW_MS")
                    .unwrap_or(default.rate_limit.window_ms),
                max_identifiers: env_parse("RATE_LIMIT_MAX_IDENTIFIERS")
                    .unwrap_or(default.rate_limit.max_identifiers),
                idle_ttl_secs: env_parse("RATE_LIMIT_IDLE_TTL_SECS")
                    .unwrap_or(default.rate_limit.idle_ttl_secs),
            },
            duplicates: DuplicateConfig {
                similarity_threshold: env_parse("DUPLICATE_THRESHOLD")
                    .unwrap_or(default.duplicates.similarity_threshold),
                fuzzy_across_types: env_parse("DUPLICATE_FUZZY_ACROSS_TYPES")
                    .unwrap_or(default.duplicates.fuzzy_across_types),
            },
            validation: default.validation,
            store: StoreConfig {
                backend: env_parse("STORE_BACKEND").unwrap_or(default.store.backend),
                spreadsheet_id: std::env::var("SHEETS_SPREADSHEET_ID")
                    .unwrap_or(default.store.spreadsheet_id),
                access_token: std::env::var("SHEETS_ACCESS_TOKEN")
                    .unwrap_or(default.store.access_token),
                api_base_url: std::env::var("SHEETS_API_BASE_URL")
                    .unwrap_or(default.store.api_base_url),
                timeout_ms: env_parse("STORE_TIMEOUT_MS").unwrap_or(default.store.timeout_ms),
            },
            metrics: MetricsConfig {
                enabled: env_parse("METRICS_ENABLED").unwrap_or(default.metrics.enabled),
                ..default.metrics
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
