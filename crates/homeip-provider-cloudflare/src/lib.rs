// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare implementation of `homeip_core::DnsProvider`.
//
// ## Behavior
//
// - ✅ Lists zones and records across every page (`result_info.total_pages`)
// - ✅ HTTP timeout configured (30 seconds by default)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - ✅ Envelope `success: false` is treated as a failure even on HTTP 200
// - ✅ Dry-run mode for safe testing (lookups run, updates are only logged)
// - ❌ NO retry logic (the next scheduled cycle is the retry)
// - ❌ NO caching (zones and records are listed fresh on every call)
// - ❌ NO background tasks
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Construction fails fast if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?page=&per_page=`
// - List DNS Records: GET `/zones/:zone_id/dns_records?page=&per_page=`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use homeip_core::config::ProviderConfig;
use homeip_core::traits::{DnsProvider, DnsRecord, RecordUpdate, Zone};
use homeip_core::{Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size for zone listings (Cloudflare maximum is 50)
const ZONES_PER_PAGE: u32 = 50;

/// Page size for record listings
const RECORDS_PER_PAGE: u32 = 100;

/// Upper bound on pages fetched for one listing
const MAX_PAGES: u32 = 1000;

const PROVIDER: &str = "cloudflare";

/// Cloudflare v4 response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: Option<u32>,
}

impl<T> Envelope<T> {
    fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return "request unsuccessful".to_string();
        }
        self.errors
            .iter()
            .map(|e| format!("[{}] {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Cloudflare DNS provider
///
/// Stateless and single-shot: every call lists or updates exactly what was
/// asked for and returns.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone and record listings)
/// - Log the intended PUT payload
/// - **NOT** actually modify DNS records
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL, without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:Read and DNS:Edit permissions
    /// - `api_base`: API base URL (normally [`CLOUDFLARE_API_BASE`])
    /// - `timeout`: Per-request timeout
    /// - `dry_run`: If true, perform GET requests but skip PUT updates
    ///
    /// # Security
    ///
    /// The API token will NEVER be logged or displayed in error messages.
    pub fn new(
        api_token: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
            dry_run,
        })
    }

    /// Create a provider against the public API with the default timeout
    pub fn new_live(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, CLOUDFLARE_API_BASE, DEFAULT_HTTP_TIMEOUT, false)
    }

    /// Create a provider from the `provider` section of the config
    pub fn from_config(api_token: impl Into<String>, config: &ProviderConfig) -> Result<Self> {
        if config.dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }
        Self::new(api_token, &config.api_base, config.timeout(), config.dry_run)
    }

    /// Whether updates are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Send a request and unwrap the response envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<Envelope<T>> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("{}: HTTP request failed: {}", context, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &error_text, context));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            Error::provider(PROVIDER, format!("{}: Failed to parse response: {}", context, e))
        })?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER,
                format!("{}: {}", context, envelope.error_summary()),
            ));
        }

        Ok(envelope)
    }

    /// GET every page of a listing endpoint
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        per_page: u32,
        context: &str,
    ) -> Result<Vec<T>> {
        let url = format!("{}{}", self.api_base, path);
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            tracing::debug!(path, page, "Fetching page");

            let request = self
                .client
                .get(&url)
                .query(&[("page", page), ("per_page", per_page)]);
            let envelope: Envelope<Vec<T>> = self.send(request, context).await?;

            let total_pages = envelope
                .result_info
                .as_ref()
                .and_then(|info| info.total_pages)
                .unwrap_or(1);
            items.extend(envelope.result.unwrap_or_default());

            if page >= total_pages || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }

        Ok(items)
    }
}

/// Map a non-2xx status to a provider error
fn status_error(status: StatusCode, error_text: &str, context: &str) -> Error {
    let message = match status.as_u16() {
        401 | 403 => format!(
            "Authentication failed: Invalid API token or insufficient permissions. Status: {}",
            status
        ),
        404 => format!("Not found. Status: {}", status),
        409 => format!(
            "Conflict: Record is being updated by another process. Status: {}",
            status
        ),
        429 => format!("Rate limit exceeded. Please retry later. Status: {}", status),
        500..=599 => format!("Cloudflare server error (transient): {} - {}", status, error_text),
        _ => format!("Request failed: {} - {}", status, error_text),
    };
    Error::provider(PROVIDER, format!("{}: {}", context, message))
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// # API Call
    ///
    /// ```http
    /// GET /zones?page=1&per_page=50
    /// Authorization: Bearer <token>
    /// ```
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let zones: Vec<Zone> = self
            .get_all_pages("/zones", ZONES_PER_PAGE, "Zone listing")
            .await?;
        tracing::debug!(count = zones.len(), "Listed zones");
        Ok(zones)
    }

    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?page=1&per_page=100
    /// Authorization: Bearer <token>
    /// ```
    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        let path = format!("/zones/{}/dns_records", zone_id);
        let records: Vec<DnsRecord> = self
            .get_all_pages(&path, RECORDS_PER_PAGE, "Record listing")
            .await?;
        tracing::debug!(zone_id, count = records.len(), "Listed records");
        Ok(records)
    }

    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "type": "A",
    ///   "name": "home.example.com",
    ///   "content": "1.2.3.4",
    ///   "ttl": 1,
    ///   "proxied": false,
    ///   "comment": "updated from homeip"
    /// }
    /// ```
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<DnsRecord> {
        let url = format!("{}/zones/{}/dns_records/{}", self.api_base, zone_id, record_id);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(update)?
            );
            return Ok(DnsRecord {
                id: record_id.to_string(),
                name: update.name.clone(),
                record_type: update.record_type.clone(),
                content: update.content.clone(),
                ttl: Some(update.ttl),
                proxied: Some(update.proxied),
                comment: Some(update.comment.clone()),
            });
        }

        let request = self.client.put(&url).json(update);
        let envelope: Envelope<DnsRecord> = self.send(request, "Record update").await?;

        envelope
            .result
            .ok_or_else(|| Error::provider(PROVIDER, "Record update: response has no result"))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
