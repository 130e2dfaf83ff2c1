use yamaha_client::{commands, ReceiverControl, Zone};

use super::status::{
    AccessoryCommand, Characteristic, CharacteristicValue, ServiceKind, StatusUpdate,
};
use super::AccessoryKind;
use crate::error::Result;
use crate::volume::{db_to_tenths, VolumeRange};

/// What happens after a unit is powered on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerOnSettings {
    /// Volume in dB applied after power on
    pub play_volume: Option<f64>,
    /// Input selected after power on
    pub main_input: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MainSettings {
    pub range: VolumeRange,
    pub power_on: PowerOnSettings,
    pub show_input_name: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSettings {
    pub zone: Zone,
    pub range: VolumeRange,
    pub power_on: PowerOnSettings,
}

impl ZoneSettings {
    pub fn new(zone: Zone, range: VolumeRange) -> Self {
        Self {
            zone,
            range,
            power_on: PowerOnSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputSettings {
    /// Receiver input name, e.g. `HDMI3`
    pub input: String,
    pub scene: Option<u32>,
    /// Volume in dB applied after switching
    pub default_volume: Option<f64>,
}

pub(super) fn zone_services(settings: &ZoneSettings) -> Vec<ServiceKind> {
    if settings.zone == Zone::Main {
        vec![ServiceKind::PowerSwitch, ServiceKind::ZoneControl]
    } else {
        vec![ServiceKind::ZoneControl]
    }
}

// Power `power_zone`, then apply the configured volume and input. AirPlay
// needs an explicit play command after it is selected.
async fn start_playback(
    device: &dyn ReceiverControl,
    power_zone: Zone,
    volume_zone: Option<Zone>,
    settings: &PowerOnSettings,
) -> Result<()> {
    device.power_on(Some(power_zone)).await?;

    if let Some(db) = settings.play_volume {
        device.set_volume_to(db_to_tenths(db), volume_zone).await?;
    }

    if let Some(input) = &settings.main_input {
        device.set_main_input_to(input).await?;

        if input == "AirPlay" {
            device
                .send_raw_command(&commands::playback("AirPlay", "Play"))
                .await?;
        }
    }

    Ok(())
}

pub(super) async fn main_status(
    settings: &MainSettings,
    device: &dyn ReceiverControl,
) -> Result<Vec<StatusUpdate>> {
    let info = device.get_basic_info(None).await?;
    let on = info.is_on();

    let mut updates = vec![
        StatusUpdate::on(ServiceKind::PowerSwitch, on),
        StatusUpdate::on(ServiceKind::ZoneControl, on),
    ];

    if info.has_volume() {
        let percent = settings.range.to_percent(info.volume);
        updates.push(StatusUpdate::volume(ServiceKind::ZoneControl, percent));
        updates.push(StatusUpdate::volume(ServiceKind::Speaker, percent));
    }

    updates.push(StatusUpdate::new(
        ServiceKind::Speaker,
        Characteristic::Mute,
        CharacteristicValue::Bool(info.muted),
    ));

    if let Some(input) = &info.current_input {
        updates.push(StatusUpdate::new(
            ServiceKind::InputFunctions,
            Characteristic::Input,
            CharacteristicValue::Text(input.clone()),
        ));
    }

    if settings.show_input_name {
        if let Some(name) = info.input_display_name() {
            updates.push(StatusUpdate::new(
                ServiceKind::InputFunctions,
                Characteristic::InputName,
                CharacteristicValue::Text(name),
            ));
        }
    }

    Ok(updates)
}

pub(super) async fn main_command(
    settings: &MainSettings,
    device: &dyn ReceiverControl,
    command: &AccessoryCommand,
) -> Result<()> {
    match command {
        AccessoryCommand::SetOn(true) => {
            start_playback(device, Zone::System, None, &settings.power_on).await
        }
        AccessoryCommand::SetOn(false) => Ok(device.power_off(Some(Zone::System)).await?),
        AccessoryCommand::SetVolume(percent) => Ok(device
            .set_volume_to(settings.range.to_device(*percent), None)
            .await?),
        AccessoryCommand::SetMute(muted) => Ok(device
            .send_raw_command(&commands::mute(Zone::Main, *muted))
            .await?),
        other => Err(AccessoryKind::Main(settings.clone()).unsupported(other)),
    }
}

pub(super) async fn zone_status(
    settings: &ZoneSettings,
    device: &dyn ReceiverControl,
) -> Result<Vec<StatusUpdate>> {
    let info = device.get_basic_info(Some(settings.zone)).await?;
    let on = info.is_on();

    let mut updates = vec![StatusUpdate::on(ServiceKind::ZoneControl, on)];

    if info.has_volume() {
        updates.push(StatusUpdate::volume(
            ServiceKind::ZoneControl,
            settings.range.to_percent(info.volume),
        ));
    }

    if settings.zone == Zone::Main {
        updates.push(StatusUpdate::on(ServiceKind::PowerSwitch, on));
    }

    Ok(updates)
}

pub(super) async fn zone_command(
    settings: &ZoneSettings,
    device: &dyn ReceiverControl,
    command: &AccessoryCommand,
) -> Result<()> {
    let zone = settings.zone;

    match command {
        AccessoryCommand::SetOn(true) => {
            start_playback(device, zone, Some(zone), &settings.power_on).await
        }
        AccessoryCommand::SetOn(false) => Ok(device.power_off(Some(zone)).await?),
        AccessoryCommand::SetVolume(percent) => Ok(device
            .set_volume_to(settings.range.to_device(*percent), Some(zone))
            .await?),
        other => Err(AccessoryKind::Zone(settings.clone()).unsupported(other)),
    }
}

pub(super) async fn input_status(
    settings: &InputSettings,
    device: &dyn ReceiverControl,
) -> Result<Vec<StatusUpdate>> {
    let info = device.get_basic_info(None).await?;
    let selected = info.is_on() && info.current_input.as_deref() == Some(settings.input.as_str());

    Ok(vec![StatusUpdate::on(ServiceKind::Switch, selected)])
}

pub(super) async fn input_command(
    settings: &InputSettings,
    device: &dyn ReceiverControl,
    command: &AccessoryCommand,
) -> Result<()> {
    match command {
        AccessoryCommand::SetOn(true) => {
            device.power_on(None).await?;
            device.set_main_input_to(&settings.input).await?;

            if let Some(scene) = settings.scene {
                device.send_raw_command(&commands::scene(scene)).await?;
            }

            if let Some(db) = settings.default_volume {
                device.set_volume_to(db_to_tenths(db), None).await?;
            }

            Ok(())
        }
        // Switching an input off leaves the receiver as it is
        AccessoryCommand::SetOn(false) => Ok(()),
        other => Err(AccessoryKind::InputSwitch(settings.clone()).unsupported(other)),
    }
}
