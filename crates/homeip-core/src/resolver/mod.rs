//! Zone and record lookup
//!
//! Both lookups list everything the provider returns and pick the first
//! match by linear search. An absent match is `Ok(None)`, never an error;
//! only a failed provider call is an `Err`.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::MatchMode;
use crate::error::Result;
use crate::traits::{DnsProvider, DnsRecord, Zone};

/// Finds the zone for a domain and the record for a name fragment
pub struct ZoneResolver {
    provider: Arc<dyn DnsProvider>,
    match_mode: MatchMode,
}

impl ZoneResolver {
    pub fn new(provider: Arc<dyn DnsProvider>, match_mode: MatchMode) -> Self {
        Self {
            provider,
            match_mode,
        }
    }

    /// Find the zone whose name equals `domain` exactly
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Zone))`: First zone with a matching name
    /// - `Ok(None)`: No zone matches
    /// - `Err(Error::Provider)`: The zone listing failed
    pub async fn find_zone_by_domain(&self, domain: &str) -> Result<Option<Zone>> {
        debug!(domain, "Looking up zone");

        let zones = self.provider.list_zones().await?;
        let zone = zones.into_iter().find(|zone| zone.name == domain);

        match &zone {
            Some(zone) => info!(domain, zone_id = %zone.id, "Found matching zone"),
            None => debug!(domain, "No zone matches domain"),
        }

        Ok(zone)
    }

    /// Find the first record in `zone` whose name matches `fragment`
    ///
    /// With [`MatchMode::Contains`] the record name must contain the fragment
    /// as a case-sensitive substring, so "home" also matches
    /// "homework.example.com". [`MatchMode::ExactLabel`] requires the
    /// fragment to be the record's leftmost label(s).
    pub async fn find_record_by_subdomain(
        &self,
        zone: &Zone,
        fragment: &str,
    ) -> Result<Option<DnsRecord>> {
        debug!(zone = %zone.name, fragment, "Looking up record");

        let records = self.provider.list_records(&zone.id).await?;
        let record = records
            .into_iter()
            .find(|record| self.matches(&record.name, fragment));

        match &record {
            Some(record) => info!(
                zone = %zone.name,
                record = %record.name,
                record_id = %record.id,
                "Found matching record"
            ),
            None => debug!(zone = %zone.name, fragment, "No record matches fragment"),
        }

        Ok(record)
    }

    fn matches(&self, record_name: &str, fragment: &str) -> bool {
        match self.match_mode {
            MatchMode::Contains => record_name.contains(fragment),
            MatchMode::ExactLabel => {
                record_name == fragment
                    || record_name
                        .strip_prefix(fragment)
                        .is_some_and(|rest| rest.starts_with('.'))
            }
        }
    }
}
