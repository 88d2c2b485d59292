//! Core traits for homeip
//!
//! This module defines the abstract interfaces the reconciler depends on.
//!
//! - [`IpSource`]: Discover the current public IP
//! - [`DnsProvider`]: List zones and records, update records

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, DnsRecord, RecordUpdate, Zone};
