//! The bridge platform as the host sees it

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use yamaha_discovery::{Endpoint, ScanConfig, ScanSource, SsdpScanner};

use crate::accessory::{Accessory, AccessoryCommand};
use crate::config::BridgeConfig;
use crate::discovery::{
    manual_endpoints, DiscoveryCoordinator, DiscoveryOutcome, HttpReceiverFactory, ReceiverFactory,
};
use crate::error::{BridgeError, Result};
use crate::host::HostRegistry;
use crate::identity::AccessoryId;
use crate::poller::{AccessoryStore, StatusPoller};

/// Owns configuration, the host handle and the known accessories.
///
/// The host calls [`configure_accessory`](Platform::configure_accessory) for
/// every accessory it restored, then
/// [`did_finish_launching`](Platform::did_finish_launching) once.
pub struct Platform {
    config: Arc<BridgeConfig>,
    host: Arc<dyn HostRegistry>,
    factory: Arc<dyn ReceiverFactory>,
    persisted: Mutex<Vec<Accessory>>,
    store: AccessoryStore,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl Platform {
    pub fn new(config: BridgeConfig, host: Arc<dyn HostRegistry>) -> Self {
        let factory = Arc::new(HttpReceiverFactory::new(config.cache));

        Self {
            config: Arc::new(config),
            host,
            factory,
            persisted: Mutex::new(Vec::new()),
            store: Arc::new(RwLock::new(Vec::new())),
            poller: Mutex::new(None),
        }
    }

    /// Build from the host's JSON platform block
    pub fn from_json(json: &str, host: Arc<dyn HostRegistry>) -> Result<Self> {
        Ok(Self::new(BridgeConfig::from_json(json)?, host))
    }

    /// Replace how discovered endpoints are connected
    pub fn with_factory(mut self, factory: Arc<dyn ReceiverFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Collect an accessory the host restored from its persistence
    pub fn configure_accessory(&self, accessory: Accessory) {
        info!(name = %accessory.display_name, id = %accessory.id, "Restored accessory");
        self.persisted.lock().push(accessory);
    }

    /// Discover receivers on the network and start polling them
    pub async fn did_finish_launching(&self) -> Result<DiscoveryOutcome> {
        let mut scan = scan_source(ScanConfig::default());
        self.launch_with(&mut *scan).await
    }

    /// Launch with an explicit scan source.
    ///
    /// Flushes persisted accessories when `flush` is set, runs discovery,
    /// registers new accessories, updates reused ones and starts the
    /// status poller. Accessories from an earlier launch count as known,
    /// so launching again never registers an accessory twice.
    pub async fn launch_with<S>(&self, scan: &mut S) -> Result<DiscoveryOutcome>
    where
        S: ScanSource + ?Sized,
    {
        let mut restored = std::mem::take(&mut *self.persisted.lock());

        if self.config.flush && !restored.is_empty() {
            info!(count = restored.len(), "Flushing persisted accessories");
            self.host.unregister_platform_accessories(&restored);
            restored.clear();
        }

        let mut known = self.store.read().clone();
        let live: HashSet<AccessoryId> = known.iter().map(|accessory| accessory.id).collect();
        known.extend(
            restored
                .iter()
                .filter(|accessory| !live.contains(&accessory.id))
                .cloned(),
        );

        let mut coordinator = DiscoveryCoordinator::new(
            Arc::clone(&self.config),
            Arc::clone(&self.factory),
            known.clone(),
        );
        let outcome = match coordinator.run(scan, manual_endpoints(&self.config)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Discovery produced no accessories");
                self.restore_ahead(restored);
                return Err(e);
            }
        };

        if !outcome.created.is_empty() {
            self.host.register_platform_accessories(&outcome.created);
        }
        if !outcome.reused.is_empty() {
            self.host.update_platform_accessories(&outcome.reused);
        }

        let claimed: HashSet<AccessoryId> = outcome
            .created
            .iter()
            .chain(&outcome.reused)
            .map(|accessory| accessory.id)
            .collect();
        let unclaimed: Vec<Accessory> = known
            .into_iter()
            .filter(|accessory| !claimed.contains(&accessory.id))
            .collect();
        if !unclaimed.is_empty() {
            debug!(count = unclaimed.len(), "Keeping accessories no device claimed");
            self.restore_ahead(unclaimed);
        }

        {
            let mut store = self.store.write();
            store.clear();
            store.extend(outcome.created.iter().cloned());
            store.extend(outcome.reused.iter().cloned());
        }

        self.start_poller();
        Ok(outcome)
    }

    /// Put accessories back ahead of any restored since the launch began
    fn restore_ahead(&self, accessories: Vec<Accessory>) {
        let mut persisted = self.persisted.lock();
        let later = std::mem::replace(&mut *persisted, accessories);
        persisted.extend(later);
    }

    fn start_poller(&self) {
        let poller = Arc::new(StatusPoller::new(
            Arc::clone(&self.store),
            Arc::clone(&self.host),
        ));
        let task = poller.spawn(self.config.status_interval());

        if let Some(previous) = self.poller.lock().replace(task) {
            previous.abort();
        }
        info!(interval = ?self.config.status_interval(), "Status poller started");
    }

    /// Route a host command to an accessory.
    ///
    /// Momentary accessories are switched back off by a delayed status
    /// update once the command has been applied.
    pub async fn handle_command(&self, id: &AccessoryId, command: AccessoryCommand) -> Result<()> {
        let (name, binding) = {
            let store = self.store.read();
            let accessory = store
                .iter()
                .find(|accessory| accessory.id == *id)
                .ok_or_else(|| BridgeError::UnknownAccessory(id.to_string()))?;
            let binding = accessory
                .binding()
                .cloned()
                .ok_or_else(|| BridgeError::UnknownAccessory(id.to_string()))?;
            (accessory.display_name.clone(), binding)
        };

        info!(accessory = %name, command = %command, "Applying command");
        if let Err(e) = binding.kind.apply_command(binding.device.as_ref(), &command).await {
            warn!(accessory = %name, command = %command, error = %e, "Command failed");
            return Err(e);
        }

        if let Some(delay) = binding.kind.momentary_reset() {
            let updates = binding.kind.reset_updates(&command);
            if !updates.is_empty() {
                let host = Arc::clone(&self.host);
                let id = *id;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    host.update_characteristics(&id, &updates);
                });
            }
        }

        Ok(())
    }

    /// Snapshot of the accessories under control
    pub fn accessories(&self) -> Vec<Accessory> {
        self.store.read().clone()
    }

    /// Stop the status poller
    pub fn shutdown(&self) {
        if let Some(task) = self.poller.lock().take() {
            task.abort();
        }
    }
}

impl Drop for Platform {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The SSDP scanner, or a source that yields nothing when it cannot start
fn scan_source(config: ScanConfig) -> Box<dyn ScanSource> {
    match SsdpScanner::start(config) {
        Ok(scanner) => Box::new(scanner),
        Err(e) => {
            warn!(error = %e, "Network scan unavailable, probing manual addresses only");
            Box::new(NoScan)
        }
    }
}

/// Scan source used when the network scan cannot start
struct NoScan;

#[async_trait]
impl ScanSource for NoScan {
    async fn next_endpoint(&mut self) -> Option<Endpoint> {
        None
    }

    fn stop(&mut self) {}
}
