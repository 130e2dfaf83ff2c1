//! Platform configuration
//!
//! The host hands the platform its JSON configuration block. Every option
//! has a default, so an empty object is a valid configuration. Option names
//! follow the host's configuration schema, including its camel-cased
//! `setMainInputTo`, `setInputTo` and cache options.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{BridgeError, Result};
use crate::volume::VolumeRange;

/// Configuration for the whole bridge platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Upper bound on the discovery window, in seconds
    /// Default: 10
    pub discovery_timeout: u64,

    /// Period of the discovery termination check, in seconds
    /// Default: 5
    pub discovery_tick: u64,

    /// Accessory count after which discovery stops early
    /// Default: 100
    pub expected_devices: usize,

    /// Receivers to probe regardless of the network scan, name -> host
    pub manual_addresses: BTreeMap<String, String>,

    /// Skip zone controllers entirely
    pub nozones: bool,

    /// Only create zone controllers for these zone names
    pub zone_controllers_only_for: Option<Vec<String>>,

    /// Rename zone controllers, receiver zone name -> display name
    pub zone_name_map: HashMap<String, String>,

    /// Volume (dB) shown as 0%
    /// Default: -65.0
    pub min_volume: f64,

    /// Volume (dB) shown as 100%
    /// Default: -10.0
    pub max_volume: f64,

    /// Volume (dB) applied when the main accessory powers on
    pub play_volume: Option<f64>,

    /// Input selected when the main accessory powers on
    #[serde(rename = "setMainInputTo")]
    pub set_main_input_to: Option<String>,

    /// Report the selected source's display name
    #[serde(deserialize_with = "yes_no")]
    pub show_input_name: bool,

    /// Create a switch per stored tuner preset
    pub radio_presets: bool,

    /// Name preset switches by preset number instead of frequency
    pub preset_num: bool,

    /// Create Spotify transport buttons
    pub spotify: bool,

    /// Create a party-mode switch
    #[serde(deserialize_with = "yes_no")]
    pub party_switch: bool,

    /// Input switches per device, device name -> input number -> settings
    pub inputs_as_accessories: BTreeMap<String, BTreeMap<String, InputAccessoryConfig>>,

    /// Unregister all persisted accessories at launch
    pub flush: bool,

    /// Period of the status poller, in seconds
    /// Default: 10
    pub status_interval: u64,

    pub cache: CacheOptions,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            discovery_timeout: 10,
            discovery_tick: 5,
            expected_devices: 100,
            manual_addresses: BTreeMap::new(),
            nozones: false,
            zone_controllers_only_for: None,
            zone_name_map: HashMap::new(),
            min_volume: -65.0,
            max_volume: -10.0,
            play_volume: None,
            set_main_input_to: None,
            show_input_name: false,
            radio_presets: false,
            preset_num: false,
            spotify: false,
            party_switch: false,
            inputs_as_accessories: BTreeMap::new(),
            flush: false,
            status_interval: 10,
            cache: CacheOptions::default(),
        }
    }
}

/// One input switch from `inputs_as_accessories`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputAccessoryConfig {
    pub name: String,

    /// Input to select; falls back to `setMainInputTo`
    #[serde(rename = "setInputTo", default)]
    pub set_input_to: Option<String>,

    /// Scene number recalled after switching
    #[serde(default)]
    pub set_scene: Option<u32>,

    /// Volume (dB) applied after switching
    #[serde(default)]
    pub set_default_volume: Option<f64>,
}

/// Time-to-live settings for the per-device response cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Seconds a cached response stays valid
    /// Default: 30
    #[serde(rename = "stdTTL")]
    pub std_ttl: u64,

    /// Seconds between sweeps of expired entries
    /// Default: 60
    #[serde(rename = "checkperiod")]
    pub check_period: u64,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            std_ttl: 30,
            check_period: 60,
        }
    }
}

impl CacheOptions {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.std_ttl)
    }

    pub fn sweep_period(&self) -> Duration {
        Duration::from_secs(self.check_period)
    }
}

impl BridgeConfig {
    /// Create a BridgeConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the host's JSON configuration block and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| BridgeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Build from an already parsed JSON value and validate it
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value)
            .map_err(|e| BridgeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Add a receiver to probe at launch
    pub fn with_manual_address(mut self, name: impl Into<String>, host: impl Into<String>) -> Self {
        self.manual_addresses.insert(name.into(), host.into());
        self
    }

    /// Validate the configuration and return the first issue found
    pub fn validate(&self) -> Result<()> {
        if self.discovery_tick == 0 {
            return Err(BridgeError::InvalidConfig(
                "discovery_tick must be greater than 0".to_string(),
            ));
        }

        if self.expected_devices == 0 {
            return Err(BridgeError::InvalidConfig(
                "expected_devices must be greater than 0".to_string(),
            ));
        }

        if self.status_interval == 0 {
            return Err(BridgeError::InvalidConfig(
                "status_interval must be greater than 0".to_string(),
            ));
        }

        if self.min_volume >= self.max_volume {
            return Err(BridgeError::InvalidConfig(format!(
                "min_volume ({}) must be below max_volume ({})",
                self.min_volume, self.max_volume
            )));
        }

        if self.cache.std_ttl == 0 || self.cache.check_period == 0 {
            return Err(BridgeError::InvalidConfig(
                "cache stdTTL and checkperiod must be greater than 0".to_string(),
            ));
        }

        for (device, inputs) in &self.inputs_as_accessories {
            for (key, input) in inputs {
                if input.set_input_to.is_none() && self.set_main_input_to.is_none() {
                    return Err(BridgeError::InvalidConfig(format!(
                        "input accessory {} ({}) on {} has no setInputTo and no setMainInputTo",
                        input.name, key, device
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn volume_range(&self) -> VolumeRange {
        VolumeRange::new(self.min_volume, self.max_volume)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout)
    }

    pub fn discovery_tick(&self) -> Duration {
        Duration::from_secs(self.discovery_tick)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval)
    }

    /// Input switches configured for the device announced as `device_name`
    pub fn inputs_for(&self, device_name: &str) -> Option<&BTreeMap<String, InputAccessoryConfig>> {
        self.inputs_as_accessories.get(device_name)
    }

    /// Whether a zone controller named `zone_name` passes `zone_controllers_only_for`
    pub fn wants_zone(&self, zone_name: &str) -> bool {
        self.zone_controllers_only_for
            .as_ref()
            .map_or(true, |names| names.iter().any(|name| name == zone_name))
    }

    /// Display name for a zone, after `zone_name_map`
    pub fn zone_display_name(&self, zone_name: &str) -> String {
        self.zone_name_map
            .get(zone_name)
            .cloned()
            .unwrap_or_else(|| zone_name.to_string())
    }
}

/// Accept `true`/`false` as well as the host's `"yes"`/`"no"` strings
fn yes_no<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => match text.to_ascii_lowercase().as_str() {
            "yes" | "true" | "on" => Ok(true),
            "no" | "false" | "off" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected \"yes\" or \"no\", got \"{}\"",
                other
            ))),
        },
    }
}
