//! Configuration types for homeip
//!
//! The configuration is a single YAML document loaded once at startup:
//!
//! ```yaml
//! token: "<cloudflare api token>"
//! domains:
//!   - domain: example.com
//!     name: home
//! ```
//!
//! Every other section is optional and falls back to its defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Longest accepted cycle interval (one year)
pub const MAX_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

/// Main homeip configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// DNS provider API token
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub token: String,

    /// Entries to keep up to date
    #[serde(default)]
    pub domains: Vec<DomainEntry>,

    /// Cadence settings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Payload settings for record updates
    #[serde(default)]
    pub update: UpdateConfig,

    /// Public IP service settings
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// DNS provider client settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Lookup and failure handling
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("token", &"<REDACTED>")
            .field("domains", &self.domains)
            .field("schedule", &self.schedule)
            .field("update", &self.update)
            .field("ip_source", &self.ip_source)
            .field("provider", &self.provider)
            .field("reconcile", &self.reconcile)
            .field("log", &self.log)
            .finish()
    }
}

impl AppConfig {
    /// Load and parse a YAML configuration file
    ///
    /// The result is not validated; call [`AppConfig::validate`] once any
    /// overrides have been applied.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_yaml_str(&raw)
    }

    /// Parse a YAML configuration document
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| Error::config(format!("Invalid YAML: {}", e)))
    }

    /// Replace the token when an override is present and non-empty
    pub fn apply_token_override(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = token;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::config("token is required"));
        }

        if self.domains.is_empty() {
            return Err(Error::config("domains must contain at least one entry"));
        }

        for entry in &self.domains {
            entry.validate()?;
        }

        self.schedule.validate()?;
        self.update.validate()?;
        self.ip_source.validate()?;
        self.provider.validate()?;

        Ok(())
    }
}

/// One (zone, record-name fragment) pair to keep pointed at the public IP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEntry {
    /// Zone name, matched exactly (e.g. "example.com")
    pub domain: String,

    /// Record-name fragment (e.g. "home")
    pub name: String,
}

impl DomainEntry {
    /// Create a new entry
    pub fn new(domain: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            name: name.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        validate_domain_name(&self.domain)?;

        if self.name.trim().is_empty() {
            return Err(Error::config(format!(
                "Entry for domain '{}' has an empty name",
                self.domain
            )));
        }

        Ok(())
    }
}

/// Validate that a string is a plausible DNS zone name
///
/// Basic RFC 1035 checks: total length, label length, label characters.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Run a cycle immediately at startup instead of waiting one interval
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,

    /// Capacity of the scheduler event channel
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl ScheduleConfig {
    /// Interval as a [`Duration`]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(Error::config("schedule.interval_secs must be > 0"));
        }
        if self.interval_secs > MAX_INTERVAL_SECS {
            return Err(Error::config(format!(
                "schedule.interval_secs must be at most {}. Got: {}",
                MAX_INTERVAL_SECS, self.interval_secs
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("schedule.event_channel_capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            run_on_start: default_run_on_start(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Configurable fields of every record update payload
///
/// Updated records are never proxied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// TTL in seconds; 1 means "automatic" at Cloudflare
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Comment attached to updated records
    #[serde(default = "default_comment")]
    pub comment: String,
}

impl UpdateConfig {
    fn validate(&self) -> Result<()> {
        if self.ttl != 1 && !(60..=86400).contains(&self.ttl) {
            return Err(Error::config(format!(
                "update.ttl must be 1 (automatic) or between 60 and 86400. Got: {}",
                self.ttl
            )));
        }
        Ok(())
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            comment: default_comment(),
        }
    }
}

/// Public IP service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL returning the caller's IPv4 address as plain text
    #[serde(default = "default_ip_url")]
    pub url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_ip_timeout_secs")]
    pub timeout_secs: u64,
}

impl IpSourceConfig {
    /// Timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        validate_http_url("ip_source.url", &self.url)?;
        if self.timeout_secs == 0 {
            return Err(Error::config("ip_source.timeout_secs must be > 0"));
        }
        Ok(())
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: default_ip_url(),
            timeout_secs: default_ip_timeout_secs(),
        }
    }
}

/// DNS provider client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,

    /// Perform lookups but skip the update call
    #[serde(default)]
    pub dry_run: bool,
}

impl ProviderConfig {
    /// Timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        validate_http_url("provider.api_base", &self.api_base)?;
        if self.timeout_secs == 0 {
            return Err(Error::config("provider.timeout_secs must be > 0"));
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_provider_timeout_secs(),
            dry_run: false,
        }
    }
}

fn validate_http_url(field: &str, url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(Error::config(format!("{} cannot be empty", field)));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            field, url
        )));
    }
    Ok(())
}

/// How a record name is matched against the configured fragment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Record name contains the fragment anywhere (case-sensitive)
    #[default]
    Contains,
    /// Fragment must be the record's leftmost label(s)
    ExactLabel,
}

/// What a cycle does after an entry fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and keep processing remaining entries
    #[default]
    Continue,
    /// Stop the cycle at the first failure
    Abort,
}

/// Reconciliation behavior
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub match_mode: MatchMode,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_interval_secs() -> u64 {
    15 * 60
}

fn default_run_on_start() -> bool {
    true
}

fn default_event_channel_capacity() -> usize {
    64
}

fn default_ttl() -> u32 {
    1
}

fn default_comment() -> String {
    "updated from homeip".to_string()
}

fn default_ip_url() -> String {
    "https://api.ipify.org".to_string()
}

fn default_ip_timeout_secs() -> u64 {
    10
}

fn default_api_base() -> String {
    "https://api.cloudflare.com/client/v4".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}
