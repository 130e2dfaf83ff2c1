//! Accessories and their behaviour
//!
//! An [`Accessory`] is what the host persists and shows. Its live
//! [`Binding`] ties it to the cached control handle of its receiver and to
//! an [`AccessoryKind`], which knows how to read status from the device and
//! how to apply host commands to it.

mod receiver;
pub mod status;
mod switches;

pub use receiver::{InputSettings, MainSettings, PowerOnSettings, ZoneSettings};
pub use status::{
    AccessoryCommand, Characteristic, CharacteristicValue, ServiceKind, StatusUpdate,
    TransportButton,
};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use yamaha_client::ReceiverControl;

use crate::error::{BridgeError, Result};
use crate::identity::{AccessoryId, DeviceIdentity};

/// How long momentary switches stay on before resetting
pub const MOMENTARY_RESET: Duration = Duration::from_secs(5);

/// A status routine the poller runs for one accessory
#[async_trait]
pub trait Refresh: Send + Sync {
    async fn refresh(&self) -> Result<Vec<StatusUpdate>>;
}

/// The controllable unit an accessory stands for
#[derive(Debug, Clone, PartialEq)]
pub enum AccessoryKind {
    /// Main device control: power, volume, mute and input
    Main(MainSettings),
    /// Power and volume of one zone
    Zone(ZoneSettings),
    /// Switch that selects a configured input
    InputSwitch(InputSettings),
    /// Momentary switch that tunes a stored tuner preset
    Preset { number: u32 },
    Party,
    /// Momentary Spotify playback buttons
    Transport,
}

impl AccessoryKind {
    /// Kind component of the accessory id
    pub fn key(&self) -> &'static str {
        match self {
            AccessoryKind::Main(_) => "main",
            AccessoryKind::Zone(_) => "zone",
            AccessoryKind::InputSwitch(_) => "input",
            AccessoryKind::Preset { .. } => "preset",
            AccessoryKind::Party => "party",
            AccessoryKind::Transport => "transport",
        }
    }

    /// Services the host should create for this kind
    pub fn services(&self) -> Vec<ServiceKind> {
        match self {
            AccessoryKind::Main(_) => vec![
                ServiceKind::PowerSwitch,
                ServiceKind::ZoneControl,
                ServiceKind::Speaker,
                ServiceKind::InputFunctions,
            ],
            AccessoryKind::Zone(settings) => receiver::zone_services(settings),
            AccessoryKind::InputSwitch(_) | AccessoryKind::Preset { .. } | AccessoryKind::Party => {
                vec![ServiceKind::Switch]
            }
            AccessoryKind::Transport => TransportButton::SWITCHES
                .iter()
                .copied()
                .map(ServiceKind::Button)
                .collect(),
        }
    }

    /// Whether the poller should refresh this kind
    pub fn reports_status(&self) -> bool {
        !matches!(self, AccessoryKind::Transport)
    }

    /// Reset delay for momentary kinds
    pub fn momentary_reset(&self) -> Option<Duration> {
        match self {
            AccessoryKind::Preset { .. } | AccessoryKind::Transport => Some(MOMENTARY_RESET),
            _ => None,
        }
    }

    /// Updates that return a momentary switch to off after `command`
    pub fn reset_updates(&self, command: &AccessoryCommand) -> Vec<StatusUpdate> {
        match (self, command) {
            (AccessoryKind::Preset { .. }, AccessoryCommand::SetOn(true)) => {
                vec![StatusUpdate::on(ServiceKind::Switch, false)]
            }
            (AccessoryKind::Transport, AccessoryCommand::Press(button)) => {
                vec![StatusUpdate::on(ServiceKind::Button(*button), false)]
            }
            (AccessoryKind::Transport, AccessoryCommand::RemoteKey(key)) => {
                TransportButton::from_remote_key(*key)
                    .map(|button| vec![StatusUpdate::on(ServiceKind::Button(button), false)])
                    .unwrap_or_default()
            }
            _ => Vec::new(),
        }
    }

    /// Read the current state of this unit from the device
    pub async fn refresh_status(&self, device: &dyn ReceiverControl) -> Result<Vec<StatusUpdate>> {
        match self {
            AccessoryKind::Main(settings) => receiver::main_status(settings, device).await,
            AccessoryKind::Zone(settings) => receiver::zone_status(settings, device).await,
            AccessoryKind::InputSwitch(settings) => receiver::input_status(settings, device).await,
            AccessoryKind::Preset { number } => switches::preset_status(*number, device).await,
            AccessoryKind::Party => switches::party_status(device).await,
            AccessoryKind::Transport => Ok(Vec::new()),
        }
    }

    /// Apply a host command to the device
    pub async fn apply_command(
        &self,
        device: &dyn ReceiverControl,
        command: &AccessoryCommand,
    ) -> Result<()> {
        match self {
            AccessoryKind::Main(settings) => receiver::main_command(settings, device, command).await,
            AccessoryKind::Zone(settings) => receiver::zone_command(settings, device, command).await,
            AccessoryKind::InputSwitch(settings) => {
                receiver::input_command(settings, device, command).await
            }
            AccessoryKind::Preset { number } => {
                switches::preset_command(*number, device, command).await
            }
            AccessoryKind::Party => switches::party_command(device, command).await,
            AccessoryKind::Transport => switches::transport_command(device, command).await,
        }
    }

    pub(crate) fn unsupported(&self, command: &AccessoryCommand) -> BridgeError {
        BridgeError::UnsupportedCommand {
            kind: self.to_string(),
            command: command.to_string(),
        }
    }
}

impl fmt::Display for AccessoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessoryKind::Main(_) => f.write_str("Main"),
            AccessoryKind::Zone(settings) => write!(f, "Zone {}", settings.zone),
            AccessoryKind::InputSwitch(settings) => write!(f, "Input {}", settings.input),
            AccessoryKind::Preset { number } => write!(f, "Preset {}", number),
            AccessoryKind::Party => f.write_str("Party"),
            AccessoryKind::Transport => f.write_str("Transport"),
        }
    }
}

/// Refresh routine that reads an accessory kind's status through its device handle
pub struct KindRefresh {
    device: Arc<dyn ReceiverControl>,
    kind: AccessoryKind,
}

impl KindRefresh {
    pub fn new(device: Arc<dyn ReceiverControl>, kind: AccessoryKind) -> Self {
        Self { device, kind }
    }
}

#[async_trait]
impl Refresh for KindRefresh {
    async fn refresh(&self) -> Result<Vec<StatusUpdate>> {
        self.kind.refresh_status(self.device.as_ref()).await
    }
}

/// Live binding of an accessory to its receiver
#[derive(Clone)]
pub struct Binding {
    pub device: Arc<dyn ReceiverControl>,
    pub kind: AccessoryKind,
    pub refresh: Vec<Arc<dyn Refresh>>,
}

impl Binding {
    /// Bind `kind` to `device` with its standard refresh routine
    pub fn new(device: Arc<dyn ReceiverControl>, kind: AccessoryKind) -> Self {
        let refresh: Vec<Arc<dyn Refresh>> = if kind.reports_status() {
            vec![Arc::new(KindRefresh::new(Arc::clone(&device), kind.clone()))]
        } else {
            Vec::new()
        };

        Self {
            device,
            kind,
            refresh,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("kind", &self.kind)
            .field("refresh", &self.refresh.len())
            .finish()
    }
}

/// Per-accessory state: the host's opaque data plus the live binding
#[derive(Debug, Clone, Default)]
pub struct AccessoryContext {
    /// Host-owned data, carried over unchanged when an accessory is reused
    pub host_state: serde_json::Value,
    /// Absent until the accessory is bound to a discovered receiver
    pub binding: Option<Binding>,
}

/// A host-visible accessory
#[derive(Debug, Clone)]
pub struct Accessory {
    pub id: AccessoryId,
    pub display_name: String,
    pub context: AccessoryContext,
}

impl Accessory {
    /// An accessory restored by the host, not yet bound to a device
    pub fn persisted(id: AccessoryId, display_name: impl Into<String>, host_state: serde_json::Value) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            context: AccessoryContext {
                host_state,
                binding: None,
            },
        }
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.context.binding.as_ref()
    }

    pub fn kind(&self) -> Option<&AccessoryKind> {
        self.binding().map(|binding| &binding.kind)
    }

    /// Registered refresh routines, empty for unbound accessories
    pub fn refresh_routines(&self) -> &[Arc<dyn Refresh>] {
        self.binding()
            .map(|binding| binding.refresh.as_slice())
            .unwrap_or(&[])
    }
}

/// What reconciliation should produce for one controllable unit
#[derive(Debug, Clone, PartialEq)]
pub struct AccessoryDescriptor {
    pub identity: DeviceIdentity,
    pub kind: AccessoryKind,
    pub name: String,
    /// Distinguishes units of the same kind on one device
    pub sub_key: String,
}

impl AccessoryDescriptor {
    pub fn new(
        identity: &DeviceIdentity,
        kind: AccessoryKind,
        name: impl Into<String>,
        sub_key: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.clone(),
            kind,
            name: name.into(),
            sub_key: sub_key.into(),
        }
    }

    pub fn id(&self) -> AccessoryId {
        AccessoryId::derive(self.kind.key(), &self.identity.system_id, &self.sub_key)
    }
}
