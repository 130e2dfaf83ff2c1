//! Expansion of a confirmed receiver into accessory descriptors

use tracing::{debug, warn};
use yamaha_client::{ReceiverControl, TunerPreset, Zone};

use crate::accessory::{
    AccessoryDescriptor, AccessoryKind, InputSettings, MainSettings, PowerOnSettings, ZoneSettings,
};
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::identity::DeviceIdentity;

/// Zone name used when a receiver does not report one
const FALLBACK_ZONE_NAME: &str = "Main_Zone";

/// Build the descriptors for every capability of one receiver.
///
/// The main accessory is always produced. A capability whose query fails
/// is logged and left out; the others are still expanded.
pub async fn expand(
    device: &dyn ReceiverControl,
    identity: &DeviceIdentity,
    device_name: &str,
    config: &BridgeConfig,
) -> Vec<AccessoryDescriptor> {
    let range = config.volume_range();
    let power_on = PowerOnSettings {
        play_volume: config.play_volume,
        main_input: config.set_main_input_to.clone(),
    };

    let mut descriptors = vec![AccessoryDescriptor::new(
        identity,
        AccessoryKind::Main(MainSettings {
            range,
            power_on: power_on.clone(),
            show_input_name: config.show_input_name,
        }),
        device_name,
        "",
    )];

    if !config.nozones {
        match device.get_available_zones().await {
            Ok(zones) => {
                for zone in zones {
                    match zone_descriptor(device, identity, zone, &power_on, config).await {
                        Ok(Some(descriptor)) => descriptors.push(descriptor),
                        Ok(None) => {}
                        Err(e) => warn!(device = %device_name, zone = %zone, error = %e, "Skipping zone"),
                    }
                }
            }
            Err(e) => warn!(device = %device_name, error = %e, "Failed to list zones"),
        }
    }

    if let Some(inputs) = config.inputs_for(device_name) {
        for (key, input) in inputs {
            let Some(target) = input
                .set_input_to
                .clone()
                .or_else(|| config.set_main_input_to.clone())
            else {
                warn!(device = %device_name, input = %key, "Input accessory has no target input");
                continue;
            };

            descriptors.push(AccessoryDescriptor::new(
                identity,
                AccessoryKind::InputSwitch(InputSettings {
                    input: target,
                    scene: input.set_scene,
                    default_volume: input.set_default_volume,
                }),
                input.name.clone(),
                key.clone(),
            ));
        }
    }

    if config.party_switch {
        descriptors.push(AccessoryDescriptor::new(
            identity,
            AccessoryKind::Party,
            "Party Mode",
            "",
        ));
    }

    if config.spotify {
        descriptors.push(AccessoryDescriptor::new(
            identity,
            AccessoryKind::Transport,
            format!("Spotify {}", device_name),
            "",
        ));
    }

    if config.radio_presets {
        match device.get_tuner_preset_list().await {
            Ok(presets) => {
                for preset in presets {
                    descriptors.push(AccessoryDescriptor::new(
                        identity,
                        AccessoryKind::Preset {
                            number: preset.number,
                        },
                        preset_name(&preset, config.preset_num),
                        preset.number.to_string(),
                    ));
                }
            }
            Err(e) => warn!(device = %device_name, error = %e, "Failed to read tuner presets"),
        }
    }

    debug!(
        device = %device_name,
        system_id = %identity.system_id,
        count = descriptors.len(),
        "Expanded receiver capabilities"
    );

    descriptors
}

async fn zone_descriptor(
    device: &dyn ReceiverControl,
    identity: &DeviceIdentity,
    zone: Zone,
    power_on: &PowerOnSettings,
    config: &BridgeConfig,
) -> Result<Option<AccessoryDescriptor>> {
    let info = device.get_basic_info(Some(zone)).await?;
    if !info.has_volume() {
        debug!(zone = %zone, "Zone reports no volume");
        return Ok(None);
    }

    let zone_config = device.get_zone_config(zone).await?;
    let name = zone_config
        .name
        .unwrap_or_else(|| FALLBACK_ZONE_NAME.to_string());

    if !config.wants_zone(&name) {
        debug!(zone = %zone, name = %name, "Zone filtered out by zone_controllers_only_for");
        return Ok(None);
    }

    let settings = ZoneSettings {
        zone,
        range: config.volume_range(),
        power_on: power_on.clone(),
    };

    Ok(Some(AccessoryDescriptor::new(
        identity,
        AccessoryKind::Zone(settings),
        config.zone_display_name(&name),
        zone.tag(),
    )))
}

/// `Preset <n>` by preset number, or by the integer part of the frequency
fn preset_name(preset: &TunerPreset, by_number: bool) -> String {
    if by_number {
        return format!("Preset {}", preset.number);
    }

    let digits: String = preset
        .value
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();

    if digits.is_empty() {
        format!("Preset {}", preset.number)
    } else {
        format!("Preset {}", digits)
    }
}
