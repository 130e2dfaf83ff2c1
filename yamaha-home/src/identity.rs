//! Stable identities for receivers and their accessories

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use yamaha_client::SystemConfig;

use crate::error::{BridgeError, Result};

/// Namespace for accessory ids; changing it orphans every persisted accessory
const ACCESSORY_NAMESPACE: Uuid = Uuid::from_u128(0x6d1f_0c2e_8a4b_5e37_9c1d_4f2a_b7e8_3015);

/// Identity of one physical receiver, taken from the receiver itself
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub system_id: String,
    pub model_name: String,
}

/// Extract the identity from a receiver's system config.
///
/// # Errors
///
/// `MalformedConfig` when the system id or model name is missing or empty.
pub fn identity_of(config: &SystemConfig) -> Result<DeviceIdentity> {
    let system_id = config
        .system_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| BridgeError::MalformedConfig("missing System_ID".to_string()))?;

    let model_name = config
        .model_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| BridgeError::MalformedConfig("missing Model_Name".to_string()))?;

    Ok(DeviceIdentity {
        system_id: system_id.to_string(),
        model_name: model_name.to_string(),
    })
}

/// Deterministic accessory identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccessoryId(Uuid);

impl AccessoryId {
    /// Derive the id of sub-unit `sub_key` of kind `kind` on device `system_id`
    pub fn derive(kind: &str, system_id: &str, sub_key: &str) -> Self {
        let name = format!("{}:{}:{}", kind, system_id, sub_key);
        Self(Uuid::new_v5(&ACCESSORY_NAMESPACE, name.as_bytes()))
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AccessoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
