//! Typed views over receiver responses.
//!
//! Every `GET` answer is a `<YAMAHA_AV rsp="GET" RC="0">` document. The
//! types here pick the handful of fields the bridge relies on and keep the
//! rest out of the way.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use xmltree::{Element, XMLNode};

use crate::error::{ClientError, Result};

/// Volume value reported when a zone has no usable volume reading
pub const VOLUME_UNAVAILABLE: i32 = -999;

/// A controllable zone of the receiver.
///
/// `System` addresses the whole unit and is only meaningful for power
/// control. Operations that take `Option<Zone>` treat `None` as `Main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    #[serde(rename = "System")]
    System,
    #[serde(rename = "Main_Zone")]
    Main,
    #[serde(rename = "Zone_2")]
    Zone2,
    #[serde(rename = "Zone_3")]
    Zone3,
    #[serde(rename = "Zone_4")]
    Zone4,
}

impl Zone {
    /// XML element name used for this zone in control documents
    pub fn tag(&self) -> &'static str {
        match self {
            Zone::System => "System",
            Zone::Main => "Main_Zone",
            Zone::Zone2 => "Zone_2",
            Zone::Zone3 => "Zone_3",
            Zone::Zone4 => "Zone_4",
        }
    }

    /// Resolve an optional zone argument to the zone actually addressed
    pub fn or_main(zone: Option<Zone>) -> Zone {
        zone.unwrap_or(Zone::Main)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Zone {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "System" => Ok(Zone::System),
            "Main_Zone" => Ok(Zone::Main),
            "Zone_2" => Ok(Zone::Zone2),
            "Zone_3" => Ok(Zone::Zone3),
            "Zone_4" => Ok(Zone::Zone4),
            other => Err(ClientError::Parse(format!("Unknown zone: {}", other))),
        }
    }
}

/// Static system configuration (`System/Config`)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemConfig {
    pub model_name: Option<String>,
    pub system_id: Option<String>,
    pub version: Option<String>,
    /// `Feature_Existence` entries in document order
    pub features: Vec<(String, bool)>,
}

impl SystemConfig {
    pub fn from_response(root: &Element) -> Result<Self> {
        let config = descend(root, &["System", "Config"])
            .ok_or_else(|| ClientError::Parse("Missing System/Config element".to_string()))?;

        let features = config
            .get_child("Feature_Existence")
            .map(|existence| {
                child_elements(existence)
                    .map(|feature| (feature.name.clone(), text_of(feature).as_deref() == Some("1")))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            model_name: non_empty(config.get_child("Model_Name").and_then(text_of)),
            system_id: non_empty(config.get_child("System_ID").and_then(text_of)),
            version: non_empty(config.get_child("Version").and_then(text_of)),
            features,
        })
    }

    /// Zones whose feature flag is set, in document order
    pub fn available_zones(&self) -> Vec<Zone> {
        self.features
            .iter()
            .filter(|(name, present)| *present && name.contains("one"))
            .filter_map(|(name, _)| name.parse().ok())
            .collect()
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.features.iter().any(|(feature, present)| *present && feature == name)
    }
}

/// Live zone status (`<Zone>/Basic_Status`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicInfo {
    pub zone: Zone,
    pub power: Option<String>,
    /// Volume in tenths of a dB, or [`VOLUME_UNAVAILABLE`]
    pub volume: i32,
    pub muted: bool,
    pub current_input: Option<String>,
    pub source_name: Option<String>,
}

impl BasicInfo {
    pub fn from_response(root: &Element, zone: Zone) -> Result<Self> {
        let status = descend(root, &[zone.tag(), "Basic_Status"]).ok_or_else(|| {
            ClientError::Parse(format!("Missing {}/Basic_Status element", zone.tag()))
        })?;

        let volume = descend(status, &["Volume", "Lvl", "Val"])
            .and_then(text_of)
            .and_then(|v| v.trim().parse::<i32>().ok())
            .unwrap_or(VOLUME_UNAVAILABLE);

        Ok(Self {
            zone,
            power: descend(status, &["Power_Control", "Power"]).and_then(text_of),
            volume,
            muted: descend(status, &["Volume", "Mute"]).and_then(text_of).as_deref() == Some("On"),
            current_input: non_empty(descend(status, &["Input", "Input_Sel"]).and_then(text_of)),
            source_name: non_empty(
                descend(status, &["Input", "Input_Sel_Item_Info", "Src_Name"]).and_then(text_of),
            ),
        })
    }

    pub fn is_on(&self) -> bool {
        self.power.as_deref() == Some("On")
    }

    /// Whether the zone reported a usable volume
    pub fn has_volume(&self) -> bool {
        self.volume != VOLUME_UNAVAILABLE
    }

    /// Volume in dB
    pub fn volume_db(&self) -> f64 {
        f64::from(self.volume) / 10.0
    }

    /// Display name of the selected source without the `Osdname:` prefix
    pub fn input_display_name(&self) -> Option<String> {
        self.source_name
            .as_deref()
            .map(|name| name.replace("Osdname:", ""))
    }
}

/// Per-zone configuration (`<Zone>/Config`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneConfig {
    pub zone: Zone,
    pub name: Option<String>,
}

impl ZoneConfig {
    pub fn from_response(root: &Element, zone: Zone) -> Result<Self> {
        let config = descend(root, &[zone.tag(), "Config"])
            .ok_or_else(|| ClientError::Parse(format!("Missing {}/Config element", zone.tag())))?;

        Ok(Self {
            zone,
            name: non_empty(descend(config, &["Name", "Zone"]).and_then(text_of)),
        })
    }
}

/// One stored tuner preset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TunerPreset {
    pub number: u32,
    /// Frequency text as shown by the receiver, e.g. `"87.50"`
    pub value: String,
}

impl TunerPreset {
    /// Parse `Tuner/Play_Control/Preset/Data`; unused slots are skipped
    pub fn list_from_response(root: &Element) -> Result<Vec<Self>> {
        let data = descend(root, &["Tuner", "Play_Control", "Preset", "Data"]).ok_or_else(|| {
            ClientError::Parse("Missing Tuner/Play_Control/Preset/Data element".to_string())
        })?;

        let presets = child_elements(data)
            .filter_map(|item| {
                let number = item
                    .get_child("Param")
                    .and_then(text_of)
                    .or_else(|| item.name.strip_prefix("Item_").map(str::to_string))
                    .and_then(|n| n.trim().parse::<u32>().ok())?;
                let value = non_empty(
                    item.get_child("Value")
                        .or_else(|| item.get_child("Text"))
                        .and_then(text_of),
                )?;
                Some(TunerPreset { number, value })
            })
            .collect();

        Ok(presets)
    }
}

/// Tuner playback status (`Tuner/Play_Info`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TunerInfo {
    pub availability: Option<String>,
    pub search_mode: Option<String>,
    pub selected_preset: Option<u32>,
}

impl TunerInfo {
    pub fn from_response(root: &Element) -> Result<Self> {
        let info = descend(root, &["Tuner", "Play_Info"])
            .ok_or_else(|| ClientError::Parse("Missing Tuner/Play_Info element".to_string()))?;

        Ok(Self {
            availability: info.get_child("Feature_Availability").and_then(text_of),
            search_mode: info.get_child("Search_Mode").and_then(text_of),
            selected_preset: descend(info, &["Preset", "Preset_Sel"])
                .and_then(text_of)
                .and_then(|n| n.trim().parse().ok()),
        })
    }

    /// True when the tuner is ready, in preset mode, and on `preset`
    pub fn is_playing_preset(&self, preset: u32) -> bool {
        self.availability.as_deref() == Some("Ready")
            && self.search_mode.as_deref() == Some("Preset")
            && self.selected_preset == Some(preset)
    }
}

/// Parse `System/Party_Mode/Mode`
pub(crate) fn party_mode_from_response(root: &Element) -> Result<bool> {
    descend(root, &["System", "Party_Mode", "Mode"])
        .and_then(text_of)
        .map(|mode| mode == "On")
        .ok_or_else(|| ClientError::Parse("Missing System/Party_Mode/Mode element".to_string()))
}

fn descend<'a>(element: &'a Element, path: &[&str]) -> Option<&'a Element> {
    path.iter()
        .try_fold(element, |current, name| current.get_child(*name))
}

fn child_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(|node| match node {
        XMLNode::Element(child) => Some(child),
        _ => None,
    })
}

fn text_of(element: &Element) -> Option<String> {
    element.get_text().map(|text| text.trim().to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
