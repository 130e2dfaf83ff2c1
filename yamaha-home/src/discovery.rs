//! Bounded-time discovery of receivers
//!
//! The coordinator merges the network scan with the configured manual
//! addresses, probes every endpoint concurrently, drops devices whose
//! identity was already seen in this run, and reconciles each confirmed
//! device's accessories as one batch.
//!
//! Discovery moves through `Idle -> Scanning -> Draining -> Done`. It
//! drains once the number of reconciled accessories reaches
//! `expected_devices`, or once `discovery_timeout` has elapsed. Both are
//! checked on a fixed tick; the count is also checked after every batch.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};
use yamaha_client::{ReceiverControl, YamahaClient};
use yamaha_discovery::device::DEFAULT_CONTROL_PORT;
use yamaha_discovery::{Endpoint, ScanSource};

use crate::accessory::{Accessory, AccessoryDescriptor};
use crate::capabilities;
use crate::config::{BridgeConfig, CacheOptions};
use crate::error::{BridgeError, Result};
use crate::identity::{identity_of, DeviceIdentity};
use crate::proxy::CachedReceiver;
use crate::reconcile::{Reconciled, Reconciler};

/// Phase of one discovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    Idle,
    Scanning,
    Draining,
    Done,
}

/// Termination settings for a discovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryOptions {
    pub timeout: Duration,
    pub tick: Duration,
    /// Soft target; overshoot between checks is accepted
    pub expected_accessories: usize,
}

impl From<&BridgeConfig> for DiscoveryOptions {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            timeout: config.discovery_timeout(),
            tick: config.discovery_tick(),
            expected_accessories: config.expected_devices,
        }
    }
}

/// Opens a control handle for a discovered endpoint
pub trait ReceiverFactory: Send + Sync {
    fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn ReceiverControl>>;
}

/// Connects over HTTP and wraps every client in a response cache
#[derive(Debug, Clone, Default)]
pub struct HttpReceiverFactory {
    cache: CacheOptions,
}

impl HttpReceiverFactory {
    pub fn new(cache: CacheOptions) -> Self {
        Self { cache }
    }
}

impl ReceiverFactory for HttpReceiverFactory {
    fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn ReceiverControl>> {
        let client = YamahaClient::new(endpoint.preferred_host()).map_err(|e| {
            BridgeError::ProbeFailure {
                endpoint: endpoint.name.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Arc::new(CachedReceiver::new(client, self.cache)))
    }
}

/// Endpoints for the configured `manual_addresses`
pub fn manual_endpoints(config: &BridgeConfig) -> Vec<Endpoint> {
    config
        .manual_addresses
        .iter()
        .map(|(name, host)| Endpoint::new(name.clone(), host.clone(), DEFAULT_CONTROL_PORT))
        .collect()
}

/// A probed endpoint that answered as a receiver
#[derive(Clone)]
pub struct ConfirmedDevice {
    pub name: String,
    pub identity: DeviceIdentity,
    pub device: Arc<dyn ReceiverControl>,
}

/// Confirm that `endpoint` is a receiver and read its identity
pub async fn probe(factory: &dyn ReceiverFactory, endpoint: &Endpoint) -> Result<ConfirmedDevice> {
    if endpoint.port != DEFAULT_CONTROL_PORT {
        return Err(BridgeError::ProbeFailure {
            endpoint: endpoint.name.clone(),
            reason: format!("control port {} is not {}", endpoint.port, DEFAULT_CONTROL_PORT),
        });
    }

    let device = factory.connect(endpoint)?;
    let config = device
        .get_system_config()
        .await
        .map_err(|e| BridgeError::ProbeFailure {
            endpoint: endpoint.name.clone(),
            reason: e.to_string(),
        })?;
    let identity = identity_of(&config)?;

    debug!(
        endpoint = %endpoint.name,
        host = %endpoint.preferred_host(),
        system_id = %identity.system_id,
        model = %identity.model_name,
        "Confirmed receiver"
    );

    Ok(ConfirmedDevice {
        name: endpoint.name.clone(),
        identity,
        device,
    })
}

/// Accessories produced by one discovery run
#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    /// Accessories the host has not seen before
    pub created: Vec<Accessory>,
    /// Persisted accessories rebound to a live receiver
    pub reused: Vec<Accessory>,
    /// Receivers that contributed accessories
    pub devices: Vec<DeviceIdentity>,
}

impl DiscoveryOutcome {
    pub fn len(&self) -> usize {
        self.created.len() + self.reused.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs one discovery pass
pub struct DiscoveryCoordinator {
    config: Arc<BridgeConfig>,
    options: DiscoveryOptions,
    factory: Arc<dyn ReceiverFactory>,
    state: DiscoveryState,
    seen: HashSet<String>,
    reconciler: Reconciler,
    outcome: DiscoveryOutcome,
}

impl DiscoveryCoordinator {
    /// `known` are the accessories the host restored before launch
    pub fn new(
        config: Arc<BridgeConfig>,
        factory: Arc<dyn ReceiverFactory>,
        known: impl IntoIterator<Item = Accessory>,
    ) -> Self {
        Self {
            options: DiscoveryOptions::from(config.as_ref()),
            config,
            factory,
            state: DiscoveryState::Idle,
            seen: HashSet::new(),
            reconciler: Reconciler::new(known),
            outcome: DiscoveryOutcome::default(),
        }
    }

    pub fn state(&self) -> DiscoveryState {
        self.state
    }

    /// Run discovery over `scan` plus `manual` until it drains.
    ///
    /// # Errors
    ///
    /// `NoDevicesFound` when the run ends without a single accessory.
    pub async fn run<S>(&mut self, scan: &mut S, manual: Vec<Endpoint>) -> Result<DiscoveryOutcome>
    where
        S: ScanSource + ?Sized,
    {
        let started = Instant::now();
        let mut ticker = interval_at(started + self.options.tick, self.options.tick);
        let mut probes: JoinSet<Result<ConfirmedDevice>> = JoinSet::new();
        let mut expansions: JoinSet<(ConfirmedDevice, Vec<AccessoryDescriptor>)> = JoinSet::new();
        let mut scan_open = true;

        self.state = DiscoveryState::Scanning;
        info!(
            timeout = ?self.options.timeout,
            expected = self.options.expected_accessories,
            manual = manual.len(),
            "Starting receiver discovery"
        );

        for endpoint in manual {
            self.spawn_probe(&mut probes, endpoint);
        }

        while self.state == DiscoveryState::Scanning {
            tokio::select! {
                endpoint = scan.next_endpoint(), if scan_open => match endpoint {
                    Some(endpoint) => self.spawn_probe(&mut probes, endpoint),
                    None => {
                        debug!("Network scan ended");
                        scan_open = false;
                    }
                },
                Some(joined) = probes.join_next() => match joined {
                    Ok(Ok(confirmed)) => self.accept(&mut expansions, confirmed),
                    Ok(Err(e)) => warn!(error = %e, "Discarding endpoint"),
                    Err(e) => warn!(error = %e, "Probe task failed"),
                },
                Some(joined) = expansions.join_next() => match joined {
                    Ok((confirmed, descriptors)) => {
                        self.record_batch(&confirmed, &descriptors);
                        if self.target_reached() {
                            self.state = DiscoveryState::Draining;
                        }
                    }
                    Err(e) => warn!(error = %e, "Expansion task failed"),
                },
                _ = ticker.tick() => {
                    if self.target_reached() {
                        self.state = DiscoveryState::Draining;
                    } else if started.elapsed() >= self.options.timeout {
                        info!(elapsed = ?started.elapsed(), "Discovery timed out");
                        self.state = DiscoveryState::Draining;
                    }
                }
            }
        }

        scan.stop();
        probes.abort_all();
        expansions.abort_all();
        self.state = DiscoveryState::Done;

        let outcome = std::mem::take(&mut self.outcome);
        info!(
            devices = outcome.devices.len(),
            created = outcome.created.len(),
            reused = outcome.reused.len(),
            elapsed = ?started.elapsed(),
            "Discovery finished"
        );

        if outcome.is_empty() {
            return Err(BridgeError::NoDevicesFound);
        }

        Ok(outcome)
    }

    fn spawn_probe(&self, probes: &mut JoinSet<Result<ConfirmedDevice>>, endpoint: Endpoint) {
        debug!(endpoint = %endpoint.name, port = endpoint.port, "Probing endpoint");
        let factory = Arc::clone(&self.factory);
        probes.spawn(async move { probe(factory.as_ref(), &endpoint).await });
    }

    fn accept(
        &mut self,
        expansions: &mut JoinSet<(ConfirmedDevice, Vec<AccessoryDescriptor>)>,
        confirmed: ConfirmedDevice,
    ) {
        if !self.seen.insert(confirmed.identity.system_id.clone()) {
            let duplicate = BridgeError::DuplicateIdentity {
                system_id: confirmed.identity.system_id.clone(),
            };
            warn!(endpoint = %confirmed.name, "{}", duplicate);
            return;
        }

        let config = Arc::clone(&self.config);
        expansions.spawn(async move {
            let descriptors = capabilities::expand(
                confirmed.device.as_ref(),
                &confirmed.identity,
                &confirmed.name,
                &config,
            )
            .await;
            (confirmed, descriptors)
        });
    }

    fn record_batch(&mut self, confirmed: &ConfirmedDevice, descriptors: &[AccessoryDescriptor]) {
        let batch = self.reconciler.reconcile_batch(descriptors, &confirmed.device);
        info!(
            device = %confirmed.name,
            system_id = %confirmed.identity.system_id,
            accessories = batch.len(),
            "Reconciled receiver"
        );

        for result in batch {
            match result {
                Reconciled::Created(accessory) => self.outcome.created.push(accessory),
                Reconciled::Reused(accessory) => self.outcome.reused.push(accessory),
            }
        }
        self.outcome.devices.push(confirmed.identity.clone());
    }

    fn target_reached(&self) -> bool {
        self.reconciler.produced() >= self.options.expected_accessories
    }
}
