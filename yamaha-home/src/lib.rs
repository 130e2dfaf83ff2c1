//! Yamaha receivers as home-automation accessories
//!
//! This crate discovers receivers on the local network, turns each one into
//! a stable set of accessories (main control, zones, inputs, tuner presets,
//! party mode, Spotify transport) and keeps them in sync with the devices.
//!
//! # Overview
//!
//! - [`discovery`] finds receivers within a bounded window and probes them
//! - [`reconcile`] reuses accessories the host persisted, by deterministic id
//! - [`proxy`] caches device reads and invalidates on every mutation
//! - [`poller`] refreshes every accessory on a fixed interval
//! - [`Platform`] wires these together for a [`HostRegistry`]
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use yamaha_home::{BridgeConfig, Platform};
//!
//! let config = BridgeConfig::new().with_manual_address("Family", "192.168.1.40");
//! let platform = Platform::new(config, Arc::new(my_host));
//! let outcome = platform.did_finish_launching().await?;
//! println!("{} accessories", outcome.len());
//! ```

pub mod accessory;
pub mod capabilities;
pub mod config;
pub mod discovery;
pub mod error;
pub mod host;
pub mod identity;
pub mod logging;
pub mod platform;
pub mod poller;
pub mod proxy;
pub mod reconcile;
pub mod volume;

#[cfg(test)]
pub(crate) mod testing;

pub use accessory::{
    Accessory, AccessoryCommand, AccessoryContext, AccessoryDescriptor, AccessoryKind, Binding,
    Characteristic, CharacteristicValue, Refresh, ServiceKind, StatusUpdate, TransportButton,
};
pub use config::{BridgeConfig, CacheOptions, InputAccessoryConfig};
pub use discovery::{
    DiscoveryCoordinator, DiscoveryOptions, DiscoveryOutcome, DiscoveryState,
    HttpReceiverFactory, ReceiverFactory,
};
pub use error::{BridgeError, Result};
pub use host::HostRegistry;
pub use identity::{identity_of, AccessoryId, DeviceIdentity};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use platform::Platform;
pub use poller::{AccessoryStore, CycleReport, StatusPoller};
pub use proxy::{CachedReceiver, Command, Operation, Query, Reply};
pub use reconcile::{reconcile, Reconciled, Reconciler};
pub use volume::VolumeRange;
