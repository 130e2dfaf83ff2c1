use async_trait::async_trait;

use crate::error::Result;
use crate::model::{BasicInfo, SystemConfig, TunerInfo, TunerPreset, Zone, ZoneConfig};

/// The device-control surface of one receiver.
///
/// Every operation that takes `Option<Zone>` addresses `Main_Zone` when the
/// zone is `None`. Implementations must be shareable across tasks; the bridge
/// holds them as `Arc<dyn ReceiverControl>`.
#[async_trait]
pub trait ReceiverControl: Send + Sync {
    async fn get_system_config(&self) -> Result<SystemConfig>;

    /// Zones advertised in the system config's feature-existence block
    async fn get_available_zones(&self) -> Result<Vec<Zone>> {
        Ok(self.get_system_config().await?.available_zones())
    }

    async fn get_basic_info(&self, zone: Option<Zone>) -> Result<BasicInfo>;

    async fn get_zone_config(&self, zone: Zone) -> Result<ZoneConfig>;

    async fn is_on(&self, zone: Option<Zone>) -> Result<bool> {
        Ok(self.get_basic_info(zone).await?.is_on())
    }

    /// `Zone::System` powers the whole unit
    async fn power_on(&self, zone: Option<Zone>) -> Result<()>;

    async fn power_off(&self, zone: Option<Zone>) -> Result<()>;

    /// Set the volume in tenths of a dB (`-300` is -30.0 dB)
    async fn set_volume_to(&self, value: i32, zone: Option<Zone>) -> Result<()>;

    async fn set_main_input_to(&self, input: &str) -> Result<()>;

    async fn get_current_input(&self) -> Result<Option<String>> {
        Ok(self.get_basic_info(None).await?.current_input)
    }

    async fn select_tuner_preset(&self, preset: u32) -> Result<()>;

    async fn get_tuner_preset_list(&self) -> Result<Vec<TunerPreset>>;

    async fn get_tuner_info(&self) -> Result<TunerInfo>;

    /// Send a complete `<YAMAHA_AV>` document as-is
    async fn send_raw_command(&self, payload: &str) -> Result<()>;

    async fn is_party_mode_enabled(&self) -> Result<bool>;

    async fn party_mode_on(&self) -> Result<()>;

    async fn party_mode_off(&self) -> Result<()>;
}
