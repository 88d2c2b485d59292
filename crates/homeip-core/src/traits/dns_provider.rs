// # DNS Provider Trait
//
// Defines the capabilities the reconciler consumes from a DNS provider:
// list zones, list records in a zone, update one record by ID.
//
// ## Implementations
//
// - Cloudflare: `homeip-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use homeip_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> homeip_core::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     for zone in provider.list_zones().await? {
//         let records = provider.list_records(&zone.id).await?;
//         println!("{}: {} records", zone.name, records.len());
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A DNS zone as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Provider-assigned opaque ID
    pub id: String,
    /// Zone name (e.g. "example.com")
    pub name: String,
}

impl Zone {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A DNS record as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned opaque ID
    pub id: String,
    /// Fully-qualified record name (e.g. "home.example.com")
    pub name: String,
    /// Record type ("A", "AAAA", "CNAME", ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record value; the address for A records
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub proxied: Option<bool>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl DnsRecord {
    /// Create an A record with only the identifying fields set
    pub fn a(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            record_type: "A".to_string(),
            content: content.into(),
            ttl: None,
            proxied: None,
            comment: None,
        }
    }
}

/// Full replacement body for a record update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
    pub comment: String,
}

/// Trait for DNS provider implementations
///
/// A thin capability wrapper over the provider's API. Lookups and matching
/// live in the core; implementations only perform the calls.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// ## Constraints
///
/// - No retry logic or backoff; the next scheduled cycle is the retry
/// - No caching of zones or records between calls
/// - No spawned tasks
/// - Every request must be bounded by a timeout
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every zone visible to the credential
    ///
    /// Implementations must follow pagination and return all pages.
    async fn list_zones(&self) -> Result<Vec<Zone>, crate::Error>;

    /// List every record in a zone
    ///
    /// Implementations must follow pagination and return all pages.
    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Replace a record's content
    ///
    /// # Returns
    ///
    /// - `Ok(DnsRecord)`: The record as stored after the update
    /// - `Err(Error)`: If the update failed
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<DnsRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
