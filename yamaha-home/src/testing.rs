//! In-memory receivers, hosts and scan sources for unit tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use yamaha_client::{
    BasicInfo, ClientError, ReceiverControl, Result as ClientResult, SystemConfig, TunerInfo,
    TunerPreset, Zone, ZoneConfig, VOLUME_UNAVAILABLE,
};
use yamaha_discovery::{Endpoint, ScanSource};

use crate::accessory::{Accessory, StatusUpdate};
use crate::discovery::ReceiverFactory;
use crate::error::{BridgeError, Result};
use crate::host::HostRegistry;
use crate::identity::AccessoryId;

#[derive(Debug, Clone)]
struct ZoneState {
    power: bool,
    volume: i32,
    name: Option<String>,
}

#[derive(Debug)]
struct ReceiverState {
    system_id: String,
    model_name: String,
    zones: Vec<(Zone, ZoneState)>,
    input: Option<String>,
    source_name: Option<String>,
    party_mode: bool,
    presets: Vec<TunerPreset>,
    tuner: TunerInfo,
    failing: HashSet<String>,
    calls: Vec<String>,
    history: Vec<String>,
    raw: Vec<String>,
}

impl ReceiverState {
    fn zone_mut(&mut self, zone: Zone) -> Option<&mut ZoneState> {
        self.zones
            .iter_mut()
            .find(|(z, _)| *z == zone)
            .map(|(_, state)| state)
    }

    fn zone(&self, zone: Zone) -> Option<&ZoneState> {
        self.zones.iter().find(|(z, _)| *z == zone).map(|(_, state)| state)
    }

    fn set_power(&mut self, zone: Option<Zone>, on: bool) {
        match Zone::or_main(zone) {
            Zone::System => self.zones.iter_mut().for_each(|(_, state)| state.power = on),
            zone => {
                if let Some(state) = self.zone_mut(zone) {
                    state.power = on;
                }
            }
        }
    }
}

/// Receiver double whose clones share state
#[derive(Debug, Clone)]
pub(crate) struct FakeReceiver {
    state: Arc<Mutex<ReceiverState>>,
}

impl FakeReceiver {
    pub(crate) fn new(system_id: &str, model_name: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(ReceiverState {
                system_id: system_id.to_string(),
                model_name: model_name.to_string(),
                zones: Vec::new(),
                input: None,
                source_name: None,
                party_mode: false,
                presets: Vec::new(),
                tuner: TunerInfo {
                    availability: Some("Ready".to_string()),
                    search_mode: Some("Preset".to_string()),
                    selected_preset: None,
                },
                failing: HashSet::new(),
                calls: Vec::new(),
                history: Vec::new(),
                raw: Vec::new(),
            })),
        }
    }

    /// Add or replace a zone in standby
    pub(crate) fn with_zone(self, zone: Zone, volume: i32, name: Option<&str>) -> Self {
        {
            let mut state = self.state.lock();
            let zone_state = ZoneState {
                power: false,
                volume,
                name: name.map(str::to_string),
            };
            match state.zone_mut(zone) {
                Some(existing) => *existing = zone_state,
                None => state.zones.push((zone, zone_state)),
            }
        }
        self
    }

    /// Set the power of every zone
    pub(crate) fn with_power(self, on: bool) -> Self {
        self.state.lock().set_power(Some(Zone::System), on);
        self
    }

    pub(crate) fn with_input(self, input: &str, source_name: Option<&str>) -> Self {
        {
            let mut state = self.state.lock();
            state.input = Some(input.to_string());
            state.source_name = source_name.map(str::to_string);
        }
        self
    }

    pub(crate) fn with_party_mode(self, enabled: bool) -> Self {
        self.state.lock().party_mode = enabled;
        self
    }

    pub(crate) fn with_presets(self, presets: &[(u32, &str)]) -> Self {
        self.state.lock().presets = presets
            .iter()
            .map(|(number, value)| TunerPreset {
                number: *number,
                value: value.to_string(),
            })
            .collect();
        self
    }

    pub(crate) fn with_tuner(self, tuner: TunerInfo) -> Self {
        self.state.lock().tuner = tuner;
        self
    }

    /// Make `method` fail with a network error
    pub(crate) fn failing(self, method: &str) -> Self {
        self.state.lock().failing.insert(method.to_string());
        self
    }

    /// How many times `method` reached the device
    pub(crate) fn calls(&self, method: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| *c == method).count()
    }

    /// Successful mutating calls in order
    pub(crate) fn history(&self) -> Vec<String> {
        self.state.lock().history.clone()
    }

    pub(crate) fn raw_commands(&self) -> Vec<String> {
        self.state.lock().raw.clone()
    }

    pub(crate) fn volume(&self, zone: Zone) -> Option<i32> {
        self.state.lock().zone(zone).map(|z| z.volume)
    }

    fn enter(&self, method: &str) -> ClientResult<parking_lot::MutexGuard<'_, ReceiverState>> {
        let mut state = self.state.lock();
        state.calls.push(method.to_string());
        if state.failing.contains(method) {
            return Err(ClientError::Network(format!("{} unavailable", method)));
        }
        Ok(state)
    }
}

#[async_trait]
impl ReceiverControl for FakeReceiver {
    async fn get_system_config(&self) -> ClientResult<SystemConfig> {
        let state = self.enter("get_system_config")?;
        let mut features: Vec<(String, bool)> = state
            .zones
            .iter()
            .map(|(zone, _)| (zone.tag().to_string(), true))
            .collect();
        features.push(("Tuner".to_string(), true));

        Ok(SystemConfig {
            model_name: Some(state.model_name.clone()),
            system_id: Some(state.system_id.clone()),
            version: None,
            features,
        })
    }

    async fn get_basic_info(&self, zone: Option<Zone>) -> ClientResult<BasicInfo> {
        let state = self.enter("get_basic_info")?;
        let zone = Zone::or_main(zone);

        Ok(match state.zone(zone) {
            Some(zone_state) => BasicInfo {
                zone,
                power: Some(if zone_state.power { "On" } else { "Standby" }.to_string()),
                volume: zone_state.volume,
                muted: false,
                current_input: state.input.clone(),
                source_name: state.source_name.clone(),
            },
            None => BasicInfo {
                zone,
                power: None,
                volume: VOLUME_UNAVAILABLE,
                muted: false,
                current_input: None,
                source_name: None,
            },
        })
    }

    async fn get_zone_config(&self, zone: Zone) -> ClientResult<ZoneConfig> {
        let state = self.enter("get_zone_config")?;
        Ok(ZoneConfig {
            zone,
            name: state.zone(zone).and_then(|z| z.name.clone()),
        })
    }

    async fn is_on(&self, zone: Option<Zone>) -> ClientResult<bool> {
        let state = self.enter("is_on")?;
        Ok(state.zone(Zone::or_main(zone)).map_or(false, |z| z.power))
    }

    async fn power_on(&self, zone: Option<Zone>) -> ClientResult<()> {
        let mut state = self.enter("power_on")?;
        state.set_power(zone, true);
        state.history.push(format!("power_on({})", Zone::or_main(zone)));
        Ok(())
    }

    async fn power_off(&self, zone: Option<Zone>) -> ClientResult<()> {
        let mut state = self.enter("power_off")?;
        state.set_power(zone, false);
        state.history.push(format!("power_off({})", Zone::or_main(zone)));
        Ok(())
    }

    async fn set_volume_to(&self, value: i32, zone: Option<Zone>) -> ClientResult<()> {
        let mut state = self.enter("set_volume_to")?;
        let zone = Zone::or_main(zone);
        if let Some(zone_state) = state.zone_mut(zone) {
            zone_state.volume = value;
        }
        state.history.push(format!("set_volume_to({}, {})", value, zone));
        Ok(())
    }

    async fn set_main_input_to(&self, input: &str) -> ClientResult<()> {
        let mut state = self.enter("set_main_input_to")?;
        state.input = Some(input.to_string());
        state.history.push(format!("set_main_input_to({})", input));
        Ok(())
    }

    async fn select_tuner_preset(&self, preset: u32) -> ClientResult<()> {
        let mut state = self.enter("select_tuner_preset")?;
        state.tuner.selected_preset = Some(preset);
        state.history.push(format!("select_tuner_preset({})", preset));
        Ok(())
    }

    async fn get_tuner_preset_list(&self) -> ClientResult<Vec<TunerPreset>> {
        let state = self.enter("get_tuner_preset_list")?;
        Ok(state.presets.clone())
    }

    async fn get_tuner_info(&self) -> ClientResult<TunerInfo> {
        let state = self.enter("get_tuner_info")?;
        Ok(state.tuner.clone())
    }

    async fn send_raw_command(&self, payload: &str) -> ClientResult<()> {
        let mut state = self.enter("send_raw_command")?;
        state.raw.push(payload.to_string());
        state.history.push(format!("send_raw_command({})", payload));
        Ok(())
    }

    async fn is_party_mode_enabled(&self) -> ClientResult<bool> {
        let state = self.enter("is_party_mode_enabled")?;
        Ok(state.party_mode)
    }

    async fn party_mode_on(&self) -> ClientResult<()> {
        let mut state = self.enter("party_mode_on")?;
        state.party_mode = true;
        state.history.push("party_mode_on".to_string());
        Ok(())
    }

    async fn party_mode_off(&self) -> ClientResult<()> {
        let mut state = self.enter("party_mode_off")?;
        state.party_mode = false;
        state.history.push("party_mode_off".to_string());
        Ok(())
    }
}

/// Host that records every call
#[derive(Debug, Default)]
pub(crate) struct RecordingHost {
    registered: Mutex<Vec<AccessoryId>>,
    updated: Mutex<Vec<AccessoryId>>,
    unregistered: Mutex<Vec<AccessoryId>>,
    updates: Mutex<Vec<(AccessoryId, Vec<StatusUpdate>)>>,
    unreachable: Mutex<Vec<(AccessoryId, String)>>,
}

impl RecordingHost {
    pub(crate) fn registered_ids(&self) -> Vec<AccessoryId> {
        self.registered.lock().clone()
    }

    pub(crate) fn updated_ids(&self) -> Vec<AccessoryId> {
        self.updated.lock().clone()
    }

    pub(crate) fn unregistered_ids(&self) -> Vec<AccessoryId> {
        self.unregistered.lock().clone()
    }

    pub(crate) fn updates(&self) -> Vec<(AccessoryId, Vec<StatusUpdate>)> {
        self.updates.lock().clone()
    }

    pub(crate) fn updates_for(&self, id: &AccessoryId) -> Vec<Vec<StatusUpdate>> {
        self.updates
            .lock()
            .iter()
            .filter(|(updated, _)| updated == id)
            .map(|(_, updates)| updates.clone())
            .collect()
    }

    pub(crate) fn unreachable_ids(&self) -> Vec<AccessoryId> {
        self.unreachable.lock().iter().map(|(id, _)| *id).collect()
    }
}

impl HostRegistry for RecordingHost {
    fn register_platform_accessories(&self, accessories: &[Accessory]) {
        self.registered.lock().extend(accessories.iter().map(|a| a.id));
    }

    fn update_platform_accessories(&self, accessories: &[Accessory]) {
        self.updated.lock().extend(accessories.iter().map(|a| a.id));
    }

    fn unregister_platform_accessories(&self, accessories: &[Accessory]) {
        self.unregistered.lock().extend(accessories.iter().map(|a| a.id));
    }

    fn update_characteristics(&self, id: &AccessoryId, updates: &[StatusUpdate]) {
        self.updates.lock().push((*id, updates.to_vec()));
    }

    fn report_unreachable(&self, id: &AccessoryId, reason: &str) {
        self.unreachable.lock().push((*id, reason.to_string()));
    }
}

/// Scan source fed from a queue
#[derive(Debug)]
pub(crate) struct FakeScan {
    pending: VecDeque<Endpoint>,
    hold_open: bool,
    stopped: bool,
}

impl FakeScan {
    /// Yields `endpoints`, then stays silent until stopped
    pub(crate) fn open(endpoints: Vec<Endpoint>) -> Self {
        Self {
            pending: endpoints.into(),
            hold_open: true,
            stopped: false,
        }
    }

    /// Yields `endpoints`, then ends
    pub(crate) fn closed(endpoints: Vec<Endpoint>) -> Self {
        Self {
            pending: endpoints.into(),
            hold_open: false,
            stopped: false,
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[async_trait]
impl ScanSource for FakeScan {
    async fn next_endpoint(&mut self) -> Option<Endpoint> {
        if let Some(endpoint) = self.pending.pop_front() {
            return Some(endpoint);
        }
        if self.hold_open && !self.stopped {
            std::future::pending::<()>().await;
        }
        None
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

/// Connects endpoints to fake receivers by host
#[derive(Debug, Default)]
pub(crate) struct FakeFactory {
    receivers: HashMap<String, FakeReceiver>,
}

impl FakeFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_receiver(mut self, host: &str, receiver: FakeReceiver) -> Self {
        self.receivers.insert(host.to_string(), receiver);
        self
    }
}

impl ReceiverFactory for FakeFactory {
    fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn ReceiverControl>> {
        self.receivers
            .get(endpoint.preferred_host())
            .map(|receiver| Arc::new(receiver.clone()) as Arc<dyn ReceiverControl>)
            .ok_or_else(|| BridgeError::ProbeFailure {
                endpoint: endpoint.name.clone(),
                reason: "host unreachable".to_string(),
            })
    }
}
