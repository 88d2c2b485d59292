// # homeip-core
//
// Core library for the homeip dynamic DNS updater.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for discovering the current public IPv4 address
// - **DnsProvider**: Trait for listing zones/records and updating records
// - **ZoneResolver**: Finds the zone and record for a configured entry
// - **Reconciler**: Pushes the current IP to every configured record
// - **Scheduler**: Runs the reconciler on a fixed, non-overlapping cadence
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from provider and IP source implementations
// 2. **No hidden state**: Zones and records are listed fresh every cycle, nothing is cached
// 3. **Failures are reported**: Every per-entry failure surfaces in the cycle result
// 4. **Library-First**: All core functionality can be used as a library

pub mod traits;
pub mod resolver;
pub mod reconcile;
pub mod scheduler;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsProvider, DnsRecord, IpSource, RecordUpdate, Zone};
pub use resolver::ZoneResolver;
pub use reconcile::{CycleReport, Reconciler, UpdatedRecord};
pub use scheduler::{CycleOutcome, Scheduler, SchedulerEvent, SchedulerState};
pub use config::{AppConfig, DomainEntry, FailurePolicy, MatchMode};
pub use error::{EntryFailure, Error, Result};
