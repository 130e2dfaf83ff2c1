//! Values exchanged with the host for one accessory

use std::fmt;

use serde::{Deserialize, Serialize};

/// A host-side service an accessory exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceKind {
    /// Whole-unit power switch on the main accessory
    PowerSwitch,
    /// Power plus volume slider of a zone (a fan with rotation speed on the host)
    ZoneControl,
    Speaker,
    InputFunctions,
    /// A plain on/off switch
    Switch,
    /// One momentary transport button
    Button(TransportButton),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Characteristic {
    On,
    Volume,
    Mute,
    Input,
    InputName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacteristicValue {
    Bool(bool),
    Percent(u8),
    Text(String),
}

/// One (service, characteristic, value) triple pushed to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub service: ServiceKind,
    pub characteristic: Characteristic,
    pub value: CharacteristicValue,
}

impl StatusUpdate {
    pub fn new(service: ServiceKind, characteristic: Characteristic, value: CharacteristicValue) -> Self {
        Self {
            service,
            characteristic,
            value,
        }
    }

    pub fn on(service: ServiceKind, on: bool) -> Self {
        Self::new(service, Characteristic::On, CharacteristicValue::Bool(on))
    }

    pub fn volume(service: ServiceKind, percent: u8) -> Self {
        Self::new(service, Characteristic::Volume, CharacteristicValue::Percent(percent))
    }
}

/// A host request to change accessory state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessoryCommand {
    SetOn(bool),
    SetVolume(u8),
    SetMute(bool),
    Press(TransportButton),
    /// A key code from the host's remote control
    RemoteKey(u8),
}

impl fmt::Display for AccessoryCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessoryCommand::SetOn(on) => write!(f, "SetOn({})", on),
            AccessoryCommand::SetVolume(percent) => write!(f, "SetVolume({}%)", percent),
            AccessoryCommand::SetMute(muted) => write!(f, "SetMute({})", muted),
            AccessoryCommand::Press(button) => write!(f, "Press({})", button),
            AccessoryCommand::RemoteKey(key) => write!(f, "RemoteKey({})", key),
        }
    }
}

/// Playback buttons of the transport accessory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportButton {
    Play,
    Pause,
    SkipFwd,
    SkipRev,
    Stop,
}

impl TransportButton {
    /// Buttons exposed as switches
    pub const SWITCHES: [TransportButton; 4] = [
        TransportButton::Play,
        TransportButton::Pause,
        TransportButton::SkipFwd,
        TransportButton::SkipRev,
    ];

    /// Value of the receiver's `Playback` element
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportButton::Play => "Play",
            TransportButton::Pause => "Pause",
            TransportButton::SkipFwd => "Skip Fwd",
            TransportButton::SkipRev => "Skip Rev",
            TransportButton::Stop => "Stop",
        }
    }

    /// Map a remote key code: right, left, play/pause, select, back
    pub fn from_remote_key(key: u8) -> Option<Self> {
        match key {
            7 => Some(TransportButton::SkipFwd),
            6 => Some(TransportButton::SkipRev),
            11 => Some(TransportButton::Pause),
            8 => Some(TransportButton::Play),
            9 => Some(TransportButton::Stop),
            _ => None,
        }
    }
}

impl fmt::Display for TransportButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(7, Some(TransportButton::SkipFwd))]
    #[case(6, Some(TransportButton::SkipRev))]
    #[case(11, Some(TransportButton::Pause))]
    #[case(8, Some(TransportButton::Play))]
    #[case(9, Some(TransportButton::Stop))]
    #[case(4, None)]
    fn test_remote_keys(#[case] key: u8, #[case] expected: Option<TransportButton>) {
        assert_eq!(TransportButton::from_remote_key(key), expected);
    }

    #[test]
    fn test_button_labels() {
        let labels: Vec<_> = TransportButton::SWITCHES.iter().map(|b| b.as_str()).collect();
        assert_eq!(labels, vec!["Play", "Pause", "Skip Fwd", "Skip Rev"]);
    }
}
