//! Periodic status refresh of every known accessory

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::accessory::{Accessory, Refresh};
use crate::error::BridgeError;
use crate::host::HostRegistry;
use crate::identity::AccessoryId;

/// Accessories shared by the platform and the poller
pub type AccessoryStore = Arc<RwLock<Vec<Accessory>>>;

/// Summary of one poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Routines that completed
    pub refreshed: usize,
    /// Routines that failed
    pub failed: usize,
    /// The cycle did not run because another one was in flight
    pub skipped: bool,
}

/// Runs every registered refresh routine on a fixed interval.
///
/// Cycles never overlap: routines of one cycle are awaited in turn and a
/// cycle requested while another is running is skipped.
pub struct StatusPoller {
    store: AccessoryStore,
    host: Arc<dyn HostRegistry>,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl StatusPoller {
    pub fn new(store: AccessoryStore, host: Arc<dyn HostRegistry>) -> Self {
        Self {
            store,
            host,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one cycle over the current accessory set
    pub async fn poll_once(&self) -> CycleReport {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("Status cycle already in flight, skipping");
            return CycleReport {
                skipped: true,
                ..CycleReport::default()
            };
        }
        let _guard = InFlight(&self.in_flight);

        // Snapshot so the lock is not held across device calls
        let registrations: Vec<(AccessoryId, String, Vec<Arc<dyn Refresh>>)> = self
            .store
            .read()
            .iter()
            .filter(|accessory| !accessory.refresh_routines().is_empty())
            .map(|accessory| {
                (
                    accessory.id,
                    accessory.display_name.clone(),
                    accessory.refresh_routines().to_vec(),
                )
            })
            .collect();

        let mut report = CycleReport::default();

        for (id, name, routines) in registrations {
            for routine in routines {
                match routine.refresh().await {
                    Ok(updates) => {
                        trace!(accessory = %name, updates = updates.len(), "Refreshed accessory");
                        if !updates.is_empty() {
                            self.host.update_characteristics(&id, &updates);
                        }
                        report.refreshed += 1;
                    }
                    Err(e) => {
                        let failure = BridgeError::RefreshFailure {
                            accessory: name.clone(),
                            source: Box::new(e),
                        };
                        warn!(accessory = %name, id = %id, error = %failure, "Status refresh failed");
                        self.host.report_unreachable(&id, &failure.to_string());
                        report.failed += 1;
                    }
                }
            }
        }

        report
    }

    /// Poll every `period` until the returned task is aborted
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let report = self.poll_once().await;
                debug!(
                    refreshed = report.refreshed,
                    failed = report.failed,
                    "Status cycle complete"
                );
            }
        })
    }
}
