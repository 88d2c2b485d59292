//! Fixed-interval scheduler
//!
//! Drives [`Reconciler::process_all`] on a fixed cadence.
//!
//! ## Lifecycle
//!
//! ```text
//!  Idle ──run()──► Running ──shutdown──► Stopped
//! ```
//!
//! - Cycles never overlap: each cycle runs to completion inside the loop
//!   before the next tick is awaited, and [`Scheduler::run_cycle`] refuses to
//!   start while another cycle holds the in-flight guard.
//! - Ticks missed while a cycle was running are skipped, not replayed.
//! - After shutdown no new cycle starts; an in-flight cycle completes before
//!   [`Scheduler::run`] returns.
//! - Cycle failures are logged and never end the loop.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::{DomainEntry, ScheduleConfig};
use crate::error::{Error, Result};
use crate::reconcile::Reconciler;

/// Smallest accepted period; tokio intervals panic on zero
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed, not yet running
    Idle,
    /// Cadence active; zero or one cycle in flight
    Running,
    /// Terminal
    Stopped,
}

/// Events emitted by the Scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Scheduler entered Running
    Started {
        entries: usize,
        interval: Duration,
    },

    /// A cycle began
    CycleStarted {
        cycle: u64,
    },

    /// A cycle finished (successfully or not)
    CycleCompleted {
        cycle: u64,
        updated: usize,
        failed: usize,
        skipped: usize,
    },

    /// A cycle was refused because another one was in flight
    CycleSkipped,

    /// Scheduler entered Stopped
    Stopped {
        reason: String,
    },
}

/// Result of one [`Scheduler::run_cycle`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every entry was updated
    Succeeded { updated: usize },
    /// At least one entry failed
    Failed {
        updated: usize,
        failed: usize,
        skipped: usize,
    },
    /// Another cycle was in flight; nothing was done
    Skipped,
}

/// Periodic driver for the reconciler
pub struct Scheduler {
    /// Reconciler invoked once per cycle
    reconciler: Arc<Reconciler>,

    /// Entries loaded at startup; read-only for the process lifetime
    entries: Arc<[DomainEntry]>,

    /// Time between cycle starts
    interval: Duration,

    /// Fire the first cycle immediately instead of after one interval
    run_on_start: bool,

    /// Held for the duration of a cycle
    in_flight: Mutex<()>,

    /// Number of cycles started so far
    cycles: AtomicU64,

    /// Current lifecycle state
    state_tx: watch::Sender<SchedulerState>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SchedulerEvent>,
}

impl Scheduler {
    /// Create a new scheduler
    ///
    /// # Returns
    ///
    /// A tuple of (scheduler, event_receiver) where event_receiver yields
    /// scheduler events
    pub fn new(
        reconciler: Arc<Reconciler>,
        entries: impl Into<Arc<[DomainEntry]>>,
        config: &ScheduleConfig,
    ) -> (Self, mpsc::Receiver<SchedulerEvent>) {
        let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity.max(1));
        let (state_tx, _) = watch::channel(SchedulerState::Idle);

        let scheduler = Self {
            reconciler,
            entries: entries.into(),
            interval: config.interval().max(MIN_INTERVAL),
            run_on_start: config.run_on_start,
            in_flight: Mutex::new(()),
            cycles: AtomicU64::new(0),
            state_tx,
            event_tx,
        };

        (scheduler, event_rx)
    }

    /// Override the interval with sub-second precision
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> SchedulerState {
        *self.state_tx.borrow()
    }

    /// Subscribe to lifecycle state changes
    pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
        self.state_tx.subscribe()
    }

    /// Number of cycles started so far
    pub fn cycles_started(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Run the cadence until `shutdown` resolves
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error::InvalidInput)`: The scheduler was not Idle
    /// - `Err(Error::Config)`: The first deadline is not representable
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let now = Instant::now();
        let first_tick = if self.run_on_start {
            now
        } else {
            now.checked_add(self.interval).ok_or_else(|| {
                Error::config(format!("Interval {:?} is too large", self.interval))
            })?
        };

        let started = self.state_tx.send_if_modified(|state| {
            if *state == SchedulerState::Idle {
                *state = SchedulerState::Running;
                true
            } else {
                false
            }
        });

        if !started {
            return Err(Error::invalid_input(format!(
                "Scheduler cannot start from state {:?}",
                self.state()
            )));
        }

        info!(
            entries = self.entries.len(),
            interval = ?self.interval,
            "Scheduler running"
        );
        self.emit_event(SchedulerEvent::Started {
            entries: self.entries.len(),
            interval: self.interval,
        });

        let mut ticker = tokio::time::interval_at(first_tick, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping scheduler");
                    break;
                }

                _ = ticker.tick() => {
                    // Runs to completion; shutdown is only observed between cycles.
                    self.run_cycle().await;
                }
            }
        }

        self.state_tx.send_replace(SchedulerState::Stopped);
        self.emit_event(SchedulerEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
        info!("Scheduler stopped");

        Ok(())
    }

    /// Run one reconciliation cycle now
    ///
    /// Returns [`CycleOutcome::Skipped`] without doing anything if another
    /// cycle is in flight. Errors are logged and folded into the outcome.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("Previous cycle still running, skipping");
            self.emit_event(SchedulerEvent::CycleSkipped);
            return CycleOutcome::Skipped;
        };

        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        info!(cycle, entries = self.entries.len(), "Starting reconciliation cycle");
        self.emit_event(SchedulerEvent::CycleStarted { cycle });

        let outcome = match self.reconciler.process_all(&self.entries).await {
            Ok(report) => {
                let elapsed = report.finished_at - report.started_at;
                info!(
                    cycle,
                    updated = report.updated.len(),
                    elapsed_ms = elapsed.num_milliseconds(),
                    "Cycle complete"
                );
                CycleOutcome::Succeeded {
                    updated: report.updated.len(),
                }
            }
            Err(Error::Cycle {
                total,
                skipped,
                failures,
            }) => {
                for failure in &failures {
                    error!(cycle, %failure, "Entry not updated");
                }
                let failed = failures.len();
                let updated = total.saturating_sub(failed + skipped);
                error!(cycle, updated, failed, skipped, "Cycle finished with failures");
                CycleOutcome::Failed {
                    updated,
                    failed,
                    skipped,
                }
            }
            Err(e) => {
                error!(cycle, error = %e, "Cycle failed");
                CycleOutcome::Failed {
                    updated: 0,
                    failed: self.entries.len(),
                    skipped: 0,
                }
            }
        };

        let (updated, failed, skipped) = match outcome {
            CycleOutcome::Succeeded { updated } => (updated, 0, 0),
            CycleOutcome::Failed {
                updated,
                failed,
                skipped,
            } => (updated, failed, skipped),
            CycleOutcome::Skipped => (0, 0, 0),
        };
        self.emit_event(SchedulerEvent::CycleCompleted {
            cycle,
            updated,
            failed,
            skipped,
        });

        outcome
    }

    /// Emit a scheduler event
    ///
    /// Never blocks: a full channel drops the event with a warning.
    fn emit_event(&self, event: SchedulerEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing schedule.event_channel_capacity.");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Event receiver dropped");
            }
        }
    }
}
