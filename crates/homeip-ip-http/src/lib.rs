// # HTTP IP Source
//
// Discovers the caller's public IPv4 address by asking an IP-echo service
// (e.g. api.ipify.org, icanhazip.com) that answers a GET with the address as
// plain text.
//
// One request per call, no caching, no retries: the scheduler's next tick
// is the retry.

use homeip_core::config::IpSourceConfig;
use homeip_core::traits::IpSource;
use homeip_core::{Error, Result};

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Default IP-echo service
pub const DEFAULT_IP_SERVICE: &str = "https://api.ipify.org";

/// HTTP-based public IP source
#[derive(Debug)]
pub struct HttpIpSource {
    /// URL to fetch the address from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch IP from (e.g., "https://api.ipify.org")
    /// - `timeout`: Per-request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create a source from the `ip_source` section of the config
    pub fn from_config(config: &IpSourceConfig) -> Result<Self> {
        Self::new(&config.url, config.timeout())
    }

    /// Configured service URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Parse an IP-echo response body
fn parse_ipv4(body: &str) -> Result<Ipv4Addr> {
    let ip_text = body.trim();

    let ip: IpAddr = ip_text
        .parse()
        .map_err(|_| Error::network(format!("Invalid IP address: {:?}", ip_text)))?;

    match ip {
        IpAddr::V4(v4) => Ok(v4),
        IpAddr::V6(v6) => Err(Error::network(format!("Expected IPv4, got: {}", v6))),
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "{} returned HTTP {}",
                self.url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        let ip = parse_ipv4(&body)?;
        tracing::debug!(url = %self.url, %ip, "Resolved public IP");
        Ok(ip)
    }
}
