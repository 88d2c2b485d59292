//! Test doubles and common utilities for contract tests
//!
//! The doubles record every call so tests can assert on exactly what the
//! reconciler and scheduler asked the provider to do.

#![allow(dead_code)]

use homeip_core::config::{FailurePolicy, MatchMode, ReconcileConfig, UpdateConfig};
use homeip_core::error::{Error, Result};
use homeip_core::traits::{DnsProvider, DnsRecord, IpSource, RecordUpdate, Zone};
use homeip_core::Reconciler;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded `update_record` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub zone_id: String,
    pub record_id: String,
    pub update: RecordUpdate,
}

/// An in-memory provider with call tracking and injectable failures
pub struct MockDnsProvider {
    zones: Vec<Zone>,
    records: Mutex<HashMap<String, Vec<DnsRecord>>>,
    /// Delay applied to list_zones (simulates a slow API)
    delay: Duration,
    fail_list_zones: AtomicBool,
    fail_list_records: AtomicBool,
    fail_updates: AtomicBool,
    list_zones_calls: AtomicUsize,
    list_records_calls: AtomicUsize,
    updates: Mutex<Vec<UpdateCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            zones: Vec::new(),
            records: Mutex::new(HashMap::new()),
            delay: Duration::ZERO,
            fail_list_zones: AtomicBool::new(false),
            fail_list_records: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
            list_zones_calls: AtomicUsize::new(0),
            list_records_calls: AtomicUsize::new(0),
            updates: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Add a zone and its records
    pub fn with_zone(mut self, zone: Zone, records: Vec<DnsRecord>) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert(zone.id.clone(), records);
        self.zones.push(zone);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fail_list_zones(&self, fail: bool) {
        self.fail_list_zones.store(fail, Ordering::SeqCst);
    }

    pub fn fail_list_records(&self, fail: bool) {
        self.fail_list_records.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn list_zones_calls(&self) -> usize {
        self.list_zones_calls.load(Ordering::SeqCst)
    }

    pub fn list_records_calls(&self) -> usize {
        self.list_records_calls.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> Vec<UpdateCall> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Highest number of concurrent list_zones calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.list_zones_calls.fetch_add(1, Ordering::SeqCst);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_list_zones.load(Ordering::SeqCst) {
            return Err(Error::provider("mock", "zone listing failed"));
        }
        Ok(self.zones.clone())
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        self.list_records_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_list_records.load(Ordering::SeqCst) {
            return Err(Error::provider("mock", "record listing failed"));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(zone_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<DnsRecord> {
        self.updates.lock().unwrap().push(UpdateCall {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            update: update.clone(),
        });

        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Error::provider("mock", "update rejected"));
        }

        let stored = DnsRecord {
            id: record_id.to_string(),
            name: update.name.clone(),
            record_type: update.record_type.clone(),
            content: update.content.clone(),
            ttl: Some(update.ttl),
            proxied: Some(update.proxied),
            comment: Some(update.comment.clone()),
        };

        if let Some(records) = self.records.lock().unwrap().get_mut(zone_id)
            && let Some(existing) = records.iter_mut().find(|r| r.id == record_id)
        {
            *existing = stored.clone();
        }

        Ok(stored)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// An IP source returning a settable address, or failing when unset
pub struct StaticIpSource {
    ip: Mutex<Option<Ipv4Addr>>,
    calls: AtomicUsize,
}

impl StaticIpSource {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip: Mutex::new(Some(ip)),
            calls: AtomicUsize::new(0),
        }
    }

    /// A source whose every call fails with a network error
    pub fn failing() -> Self {
        Self {
            ip: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, ip: Option<Ipv4Addr>) {
        *self.ip.lock().unwrap() = ip;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (*self.ip.lock().unwrap()).ok_or_else(|| Error::network("ip service unreachable"))
    }
}

/// The canonical fixture: zone z1 "example.com" with record r1 "home.example.com" at 1.2.3.4
pub fn example_provider() -> MockDnsProvider {
    MockDnsProvider::new().with_zone(
        Zone::new("z1", "example.com"),
        vec![DnsRecord::a("r1", "home.example.com", "1.2.3.4")],
    )
}

/// Build a reconciler over shared doubles with default payload settings
pub fn reconciler(
    provider: &Arc<MockDnsProvider>,
    ip_source: &Arc<StaticIpSource>,
    failure_policy: FailurePolicy,
) -> Reconciler {
    Reconciler::new(
        provider.clone(),
        ip_source.clone(),
        UpdateConfig::default(),
        ReconcileConfig {
            match_mode: MatchMode::Contains,
            failure_policy,
        },
    )
}
