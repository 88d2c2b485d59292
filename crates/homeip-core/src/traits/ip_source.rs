// # IP Source Trait
//
// Defines the interface for discovering the caller's current public IPv4
// address.
//
// ## Implementations
//
// - HTTP IP-echo service: `homeip-ip-http` crate

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for IP source implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// ## Constraints
///
/// - One outbound request per call, bounded by a timeout
/// - No retry logic (the scheduler's next tick is the retry)
/// - No caching: every call reflects the address at call time
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The current address
    /// - `Err(Error::Network)`: Transport failure or malformed response
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;
}
