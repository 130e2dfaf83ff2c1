use yamaha_client::{commands, ReceiverControl};

use super::status::{AccessoryCommand, ServiceKind, StatusUpdate, TransportButton};
use super::AccessoryKind;
use crate::error::Result;

const TUNER_INPUT: &str = "TUNER";
const TRANSPORT_SOURCE: &str = "Spotify";

pub(super) async fn preset_status(number: u32, device: &dyn ReceiverControl) -> Result<Vec<StatusUpdate>> {
    let info = device.get_basic_info(None).await?;

    let on = if info.is_on() && info.current_input.as_deref() == Some(TUNER_INPUT) {
        device.get_tuner_info().await?.is_playing_preset(number)
    } else {
        false
    };

    Ok(vec![StatusUpdate::on(ServiceKind::Switch, on)])
}

pub(super) async fn preset_command(
    number: u32,
    device: &dyn ReceiverControl,
    command: &AccessoryCommand,
) -> Result<()> {
    match command {
        AccessoryCommand::SetOn(true) => {
            device.set_main_input_to(TUNER_INPUT).await?;
            device.select_tuner_preset(number).await?;
            Ok(())
        }
        // The momentary reset turns the switch off again
        AccessoryCommand::SetOn(false) => Ok(()),
        other => Err(AccessoryKind::Preset { number }.unsupported(other)),
    }
}

pub(super) async fn party_status(device: &dyn ReceiverControl) -> Result<Vec<StatusUpdate>> {
    let enabled = device.is_party_mode_enabled().await?;
    Ok(vec![StatusUpdate::on(ServiceKind::Switch, enabled)])
}

pub(super) async fn party_command(device: &dyn ReceiverControl, command: &AccessoryCommand) -> Result<()> {
    match command {
        AccessoryCommand::SetOn(true) => {
            device.power_on(None).await?;
            device.party_mode_on().await?;
            Ok(())
        }
        AccessoryCommand::SetOn(false) => Ok(device.party_mode_off().await?),
        other => Err(AccessoryKind::Party.unsupported(other)),
    }
}

pub(super) async fn transport_command(device: &dyn ReceiverControl, command: &AccessoryCommand) -> Result<()> {
    let button = match command {
        AccessoryCommand::Press(button) => *button,
        AccessoryCommand::RemoteKey(key) => TransportButton::from_remote_key(*key)
            .ok_or_else(|| AccessoryKind::Transport.unsupported(command))?,
        other => return Err(AccessoryKind::Transport.unsupported(other)),
    };

    device
        .send_raw_command(&commands::playback(TRANSPORT_SOURCE, button.as_str()))
        .await?;
    Ok(())
}
