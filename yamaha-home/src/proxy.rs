//! Cached control proxy
//!
//! [`CachedReceiver`] wraps a raw [`ReceiverControl`] handle. Queries are
//! served from a per-device time-to-live cache; commands always reach the
//! device and empty the cache once they succeed.
//!
//! Cache keys are the method name plus the JSON serialization of its
//! arguments, e.g. `getBasicInfo-["Zone_2"]`. The expiry check on read is
//! authoritative; the background sweep only reclaims memory.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};
use yamaha_client::{
    BasicInfo, ClientError, ReceiverControl, Result, SystemConfig, TunerInfo, TunerPreset, Zone,
    ZoneConfig,
};

use crate::config::CacheOptions;

/// A read against the device
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    GetSystemConfig,
    GetAvailableZones,
    GetBasicInfo { zone: Option<Zone> },
    GetZoneConfig { zone: Zone },
    IsOn { zone: Option<Zone> },
    GetCurrentInput,
    GetTunerPresetList,
    GetTunerInfo,
    IsPartyModeEnabled,
}

impl Query {
    pub fn method(&self) -> &'static str {
        match self {
            Query::GetSystemConfig => "getSystemConfig",
            Query::GetAvailableZones => "getAvailableZones",
            Query::GetBasicInfo { .. } => "getBasicInfo",
            Query::GetZoneConfig { .. } => "getZoneConfig",
            Query::IsOn { .. } => "isOn",
            Query::GetCurrentInput => "getCurrentInput",
            Query::GetTunerPresetList => "getTunerPresetList",
            Query::GetTunerInfo => "getTunerInfo",
            Query::IsPartyModeEnabled => "isPartyModeEnabled",
        }
    }

    /// Method name plus serialized arguments.
    ///
    /// An absent zone is keyed as `Main_Zone`, the zone the device reads.
    pub fn cache_key(&self) -> String {
        let args = match self {
            Query::GetBasicInfo { zone } | Query::IsOn { zone } => json!([Zone::or_main(*zone)]),
            Query::GetZoneConfig { zone } => json!([zone]),
            _ => json!([]),
        };
        format!("{}-{}", self.method(), args)
    }
}

/// A mutation of device state
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PowerOn { zone: Option<Zone> },
    PowerOff { zone: Option<Zone> },
    SetVolume { value: i32, zone: Option<Zone> },
    SetMainInput { input: String },
    SelectTunerPreset { preset: u32 },
    SendRaw { payload: String },
    PartyModeOn,
    PartyModeOff,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Query(Query),
    Command(Command),
}

/// Result of an [`Operation`]
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    SystemConfig(SystemConfig),
    Zones(Vec<Zone>),
    BasicInfo(BasicInfo),
    ZoneConfig(ZoneConfig),
    Flag(bool),
    Input(Option<String>),
    TunerPresets(Vec<TunerPreset>),
    TunerInfo(TunerInfo),
    Done,
}

/// Time-bounded key/value store.
///
/// Entries older than the TTL are never returned, whether or not a sweep
/// has run since they expired.
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, (V, Instant)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((value, expires)) if Instant::now() < *expires => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, value: V) {
        let expires = Instant::now() + self.ttl;
        self.entries.lock().insert(key, (value, expires));
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Drop expired entries, returning how many were removed
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, (_, expires)| now < *expires);
        before - entries.len()
    }

    /// Number of stored entries, expired ones included until swept
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A [`ReceiverControl`] decorator with a per-device response cache
pub struct CachedReceiver<C> {
    inner: C,
    cache: Arc<TtlCache<Reply>>,
    sweeper: Option<JoinHandle<()>>,
}

impl<C: ReceiverControl> CachedReceiver<C> {
    /// Wrap `inner`.
    ///
    /// The periodic sweep only runs when this is called inside a tokio
    /// runtime; reads stay correct without it.
    pub fn new(inner: C, options: CacheOptions) -> Self {
        let cache = Arc::new(TtlCache::new(options.ttl()));
        let sweeper = tokio::runtime::Handle::try_current()
            .ok()
            .map(|handle| handle.spawn(sweep_loop(Arc::downgrade(&cache), options.sweep_period())));

        Self {
            inner,
            cache,
            sweeper,
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn cache(&self) -> &TtlCache<Reply> {
        &self.cache
    }

    /// Run one operation through the cache
    pub async fn invoke(&self, operation: Operation) -> Result<Reply> {
        match operation {
            Operation::Command(command) => {
                let reply = self.execute(command).await?;
                self.cache.clear();
                Ok(reply)
            }
            Operation::Query(query) => {
                let key = query.cache_key();
                if let Some(reply) = self.cache.get(&key) {
                    trace!(%key, "Cache hit");
                    return Ok(reply);
                }

                let reply = self.fetch(query).await?;
                trace!(%key, "Cache miss");
                self.cache.insert(key, reply.clone());
                Ok(reply)
            }
        }
    }

    async fn fetch(&self, query: Query) -> Result<Reply> {
        Ok(match query {
            Query::GetSystemConfig => Reply::SystemConfig(self.inner.get_system_config().await?),
            Query::GetAvailableZones => Reply::Zones(self.inner.get_available_zones().await?),
            Query::GetBasicInfo { zone } => Reply::BasicInfo(self.inner.get_basic_info(zone).await?),
            Query::GetZoneConfig { zone } => {
                Reply::ZoneConfig(self.inner.get_zone_config(zone).await?)
            }
            Query::IsOn { zone } => Reply::Flag(self.inner.is_on(zone).await?),
            Query::GetCurrentInput => Reply::Input(self.inner.get_current_input().await?),
            Query::GetTunerPresetList => {
                Reply::TunerPresets(self.inner.get_tuner_preset_list().await?)
            }
            Query::GetTunerInfo => Reply::TunerInfo(self.inner.get_tuner_info().await?),
            Query::IsPartyModeEnabled => Reply::Flag(self.inner.is_party_mode_enabled().await?),
        })
    }

    async fn execute(&self, command: Command) -> Result<Reply> {
        debug!(?command, "Sending command");
        match command {
            Command::PowerOn { zone } => self.inner.power_on(zone).await?,
            Command::PowerOff { zone } => self.inner.power_off(zone).await?,
            Command::SetVolume { value, zone } => self.inner.set_volume_to(value, zone).await?,
            Command::SetMainInput { input } => self.inner.set_main_input_to(&input).await?,
            Command::SelectTunerPreset { preset } => self.inner.select_tuner_preset(preset).await?,
            Command::SendRaw { payload } => self.inner.send_raw_command(&payload).await?,
            Command::PartyModeOn => self.inner.party_mode_on().await?,
            Command::PartyModeOff => self.inner.party_mode_off().await?,
        }
        Ok(Reply::Done)
    }
}

impl<C> Drop for CachedReceiver<C> {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

async fn sweep_loop(cache: Weak<TtlCache<Reply>>, period: Duration) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    loop {
        interval.tick().await;
        match cache.upgrade() {
            Some(cache) => {
                let removed = cache.sweep();
                if removed > 0 {
                    trace!(removed, "Swept expired cache entries");
                }
            }
            None => break,
        }
    }
}

macro_rules! reply_as {
    ($reply:expr, $variant:ident) => {
        match $reply.await? {
            Reply::$variant(value) => Ok(value),
            other => Err(ClientError::Parse(format!(
                "unexpected {} reply: {:?}",
                stringify!($variant),
                other
            ))),
        }
    };
}

macro_rules! command {
    ($self:ident, $command:expr) => {
        $self.invoke(Operation::Command($command)).await.map(|_| ())
    };
}

#[async_trait]
impl<C: ReceiverControl> ReceiverControl for CachedReceiver<C> {
    async fn get_system_config(&self) -> Result<SystemConfig> {
        reply_as!(self.invoke(Operation::Query(Query::GetSystemConfig)), SystemConfig)
    }

    async fn get_available_zones(&self) -> Result<Vec<Zone>> {
        reply_as!(self.invoke(Operation::Query(Query::GetAvailableZones)), Zones)
    }

    async fn get_basic_info(&self, zone: Option<Zone>) -> Result<BasicInfo> {
        reply_as!(self.invoke(Operation::Query(Query::GetBasicInfo { zone })), BasicInfo)
    }

    async fn get_zone_config(&self, zone: Zone) -> Result<ZoneConfig> {
        reply_as!(self.invoke(Operation::Query(Query::GetZoneConfig { zone })), ZoneConfig)
    }

    async fn is_on(&self, zone: Option<Zone>) -> Result<bool> {
        reply_as!(self.invoke(Operation::Query(Query::IsOn { zone })), Flag)
    }

    async fn power_on(&self, zone: Option<Zone>) -> Result<()> {
        command!(self, Command::PowerOn { zone })
    }

    async fn power_off(&self, zone: Option<Zone>) -> Result<()> {
        command!(self, Command::PowerOff { zone })
    }

    async fn set_volume_to(&self, value: i32, zone: Option<Zone>) -> Result<()> {
        command!(self, Command::SetVolume { value, zone })
    }

    async fn set_main_input_to(&self, input: &str) -> Result<()> {
        command!(
            self,
            Command::SetMainInput {
                input: input.to_string()
            }
        )
    }

    async fn get_current_input(&self) -> Result<Option<String>> {
        reply_as!(self.invoke(Operation::Query(Query::GetCurrentInput)), Input)
    }

    async fn select_tuner_preset(&self, preset: u32) -> Result<()> {
        command!(self, Command::SelectTunerPreset { preset })
    }

    async fn get_tuner_preset_list(&self) -> Result<Vec<TunerPreset>> {
        reply_as!(self.invoke(Operation::Query(Query::GetTunerPresetList)), TunerPresets)
    }

    async fn get_tuner_info(&self) -> Result<TunerInfo> {
        reply_as!(self.invoke(Operation::Query(Query::GetTunerInfo)), TunerInfo)
    }

    async fn send_raw_command(&self, payload: &str) -> Result<()> {
        command!(
            self,
            Command::SendRaw {
                payload: payload.to_string()
            }
        )
    }

    async fn is_party_mode_enabled(&self) -> Result<bool> {
        reply_as!(self.invoke(Operation::Query(Query::IsPartyModeEnabled)), Flag)
    }

    async fn party_mode_on(&self) -> Result<()> {
        command!(self, Command::PartyModeOn)
    }

    async fn party_mode_off(&self) -> Result<()> {
        command!(self, Command::PartyModeOff)
    }
}
