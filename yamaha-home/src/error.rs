//! Error types for the bridge

use thiserror::Error;
use yamaha_client::ClientError;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors surfaced by discovery, reconciliation and polling.
///
/// Probe, identity and refresh failures are contained to one device or
/// accessory by the callers that produce them. `NoDevicesFound` and
/// `InvalidConfig` reach the platform's caller.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// An endpoint could not be confirmed as a receiver
    #[error("Probe of {endpoint} failed: {reason}")]
    ProbeFailure { endpoint: String, reason: String },

    /// The system config lacks a usable identity
    #[error("Malformed system config: {0}")]
    MalformedConfig(String),

    /// A device already processed in this run answered again
    #[error("Duplicate device identity {system_id}")]
    DuplicateIdentity { system_id: String },

    /// A refresh routine of one accessory failed
    #[error("Refresh of {accessory} failed: {source}")]
    RefreshFailure {
        accessory: String,
        #[source]
        source: Box<BridgeError>,
    },

    /// Discovery finished without a single accessory
    #[error("No Yamaha receivers found")]
    NoDevicesFound,

    /// A device call failed
    #[error("Control call failed: {0}")]
    ControlCallFailure(#[from] ClientError),

    /// The accessory kind does not accept the command
    #[error("{kind} accessory does not support {command}")]
    UnsupportedCommand { kind: String, command: String },

    /// A command named an accessory the platform does not control
    #[error("Unknown accessory {0}")]
    UnknownAccessory(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
