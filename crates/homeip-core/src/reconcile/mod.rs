//! Update reconciler
//!
//! The Reconciler brings configured entries in line with the current public IP:
//!
//! ```text
//! DomainEntry ──► ZoneResolver ──► Zone ──► ZoneResolver ──► DnsRecord
//!                                                               │
//!                          IpSource ──► Ipv4Addr ──► RecordUpdate
//!                                                               │
//!                                                               ▼
//!                                              DnsProvider::update_record
//! ```
//!
//! Entries are processed sequentially, in configuration order. Every update
//! is pushed whether or not the record already holds the current address.

use std::net::Ipv4Addr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::config::{DomainEntry, FailurePolicy, ReconcileConfig, UpdateConfig};
use crate::error::{EntryFailure, Error, Result};
use crate::resolver::ZoneResolver;
use crate::traits::{DnsProvider, DnsRecord, IpSource, RecordUpdate, Zone};

/// Record type written by every update
const RECORD_TYPE_A: &str = "A";

/// A record successfully pushed during a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedRecord {
    pub domain: String,
    pub zone_id: String,
    pub record_id: String,
    pub record_name: String,
    /// Content sent in the update
    pub content: String,
}

/// Summary of a cycle in which every entry succeeded
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Number of configured entries
    pub total: usize,
    pub updated: Vec<UpdatedRecord>,
}

/// Orchestrates lookup, IP resolution and update for configured entries
pub struct Reconciler {
    resolver: ZoneResolver,
    provider: Arc<dyn DnsProvider>,
    ip_source: Arc<dyn IpSource>,
    update: UpdateConfig,
    failure_policy: FailurePolicy,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `provider`: DNS provider implementation
    /// - `ip_source`: Public IP source implementation
    /// - `update`: Fixed payload fields (TTL, comment)
    /// - `reconcile`: Match mode and failure policy
    pub fn new(
        provider: Arc<dyn DnsProvider>,
        ip_source: Arc<dyn IpSource>,
        update: UpdateConfig,
        reconcile: ReconcileConfig,
    ) -> Self {
        Self {
            resolver: ZoneResolver::new(Arc::clone(&provider), reconcile.match_mode),
            provider,
            ip_source,
            update,
            failure_policy: reconcile.failure_policy,
        }
    }

    /// Point one record at the current public IP
    ///
    /// Resolves the public IP fresh, then replaces the record with an A record
    /// keeping its existing name. No comparison against the current content
    /// is made.
    ///
    /// # Returns
    ///
    /// - `Ok(DnsRecord)`: The record as stored by the provider
    /// - `Err(Error::Network)`: IP resolution failed; no update was sent
    /// - `Err(Error::Provider)`: The update call failed
    pub async fn update_entry(&self, zone: &Zone, record: &DnsRecord) -> Result<DnsRecord> {
        debug!(record = %record.name, "Resolving current public IP");
        let ip = self.ip_source.current().await?;
        debug!(record = %record.name, %ip, "Resolved public IP");

        let payload = self.build_update(record, ip);

        info!(
            zone = %zone.name,
            record = %record.name,
            previous = %record.content,
            ip = %payload.content,
            "Updating record"
        );

        let stored = self
            .provider
            .update_record(&zone.id, &record.id, &payload)
            .await?;

        info!(record = %stored.name, content = %stored.content, "Record updated");
        Ok(stored)
    }

    /// Reconcile every entry, in order
    ///
    /// With [`FailurePolicy::Continue`] every entry is attempted and all
    /// failures are collected. With [`FailurePolicy::Abort`] the first failure
    /// ends the cycle and the remaining entries are counted as skipped.
    ///
    /// # Returns
    ///
    /// - `Ok(CycleReport)`: Every entry was updated
    /// - `Err(Error::Cycle)`: At least one entry failed
    pub async fn process_all(&self, entries: &[DomainEntry]) -> Result<CycleReport> {
        let started_at = Utc::now();
        let total = entries.len();
        let mut updated = Vec::with_capacity(total);
        let mut failures = Vec::new();
        let mut skipped = 0;

        for (index, entry) in entries.iter().enumerate() {
            match self.process_entry(entry).await {
                Ok(record) => updated.push(record),
                Err(e) => {
                    error!(domain = %entry.domain, name = %entry.name, error = %e, "Entry failed");
                    failures.push(EntryFailure {
                        domain: entry.domain.clone(),
                        name: entry.name.clone(),
                        error: e,
                    });

                    if self.failure_policy == FailurePolicy::Abort {
                        skipped = total - index - 1;
                        if skipped > 0 {
                            warn!(skipped, "Aborting cycle after failure");
                        }
                        break;
                    }
                }
            }
        }

        if !failures.is_empty() {
            return Err(Error::Cycle {
                total,
                skipped,
                failures,
            });
        }

        Ok(CycleReport {
            started_at,
            finished_at: Utc::now(),
            total,
            updated,
        })
    }

    async fn process_entry(&self, entry: &DomainEntry) -> Result<UpdatedRecord> {
        let zone = self
            .resolver
            .find_zone_by_domain(&entry.domain)
            .await?
            .ok_or_else(|| Error::ZoneNotFound {
                domain: entry.domain.clone(),
            })?;

        let record = self
            .resolver
            .find_record_by_subdomain(&zone, &entry.name)
            .await?
            .ok_or_else(|| Error::RecordNotFound {
                zone: zone.name.clone(),
                name: entry.name.clone(),
            })?;

        let stored = self.update_entry(&zone, &record).await?;

        Ok(UpdatedRecord {
            domain: entry.domain.clone(),
            zone_id: zone.id,
            record_id: record.id,
            record_name: stored.name,
            content: stored.content,
        })
    }

    fn build_update(&self, record: &DnsRecord, ip: Ipv4Addr) -> RecordUpdate {
        RecordUpdate {
            record_type: RECORD_TYPE_A.to_string(),
            name: record.name.clone(),
            content: ip.to_string(),
            ttl: self.update.ttl,
            proxied: false,
            comment: self.update.comment.clone(),
        }
    }
}
