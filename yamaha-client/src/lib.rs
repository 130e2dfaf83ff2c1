//! Control client for Yamaha AV receivers
//!
//! Receivers accept XML documents posted to `/YamahaRemoteControl/ctrl`.
//! A `GET` document asks for a block of state, a `PUT` document changes it.
//! Every answer carries an `RC` attribute on its root element; anything but
//! `0` means the receiver rejected the request.
//!
//! [`ReceiverControl`] is the async surface the rest of the workspace
//! programs against, and [`YamahaClient`] is its HTTP implementation.

pub mod commands;
mod control;
mod error;
mod model;

pub use control::ReceiverControl;
pub use error::{ClientError, Result};
pub use model::{
    BasicInfo, SystemConfig, TunerInfo, TunerPreset, Zone, ZoneConfig, VOLUME_UNAVAILABLE,
};

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};
use xmltree::Element;

/// Path of the control endpoint on every receiver
pub const CONTROL_PATH: &str = "/YamahaRemoteControl/ctrl";

/// HTTP client for one receiver
#[derive(Debug, Clone)]
pub struct YamahaClient {
    http: reqwest::Client,
    host: String,
}

impl YamahaClient {
    /// Create a client for `host` (an address, optionally with `:port`)
    pub fn new(host: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self::with_http_client(host, http))
    }

    /// Create a client that shares an existing connection pool
    pub fn with_http_client(host: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            host: host.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Post a complete control document and return the parsed root element
    pub async fn send_xml(&self, body: &str) -> Result<Element> {
        let url = format!("http://{}{}", self.host, CONTROL_PATH);
        trace!(host = %self.host, body, "Sending control document");

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "text/xml; charset=\"utf-8\"")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Network(format!("HTTP {}", status)));
        }

        let xml_text = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let root =
            Element::parse(xml_text.as_bytes()).map_err(|e| ClientError::Parse(e.to_string()))?;

        check_response_code(&root)?;
        Ok(root)
    }

    async fn get(&self, inner: &str) -> Result<Element> {
        self.send_xml(&commands::get(inner)).await
    }

    async fn put(&self, inner: &str) -> Result<()> {
        self.send_xml(&commands::put(inner)).await.map(|_| ())
    }

    async fn set_power(&self, zone: Option<Zone>, state: &str) -> Result<()> {
        let zone = Zone::or_main(zone);
        debug!(host = %self.host, %zone, state, "Setting power");
        self.put(&commands::in_zone(
            zone,
            &format!("<Power_Control><Power>{}</Power></Power_Control>", state),
        ))
        .await
    }

    async fn set_party_mode(&self, mode: &str) -> Result<()> {
        self.put(&format!(
            "<System><Party_Mode><Mode>{}</Mode></Party_Mode></System>",
            mode
        ))
        .await
    }
}

fn check_response_code(root: &Element) -> Result<()> {
    let code = match root.attributes.get("RC") {
        Some(rc) => rc
            .trim()
            .parse::<u16>()
            .map_err(|_| ClientError::Parse(format!("Invalid RC attribute: {}", rc)))?,
        None => return Err(ClientError::Parse("Missing RC attribute".to_string())),
    };

    if code == 0 {
        Ok(())
    } else {
        Err(ClientError::Device { code })
    }
}

#[async_trait]
impl ReceiverControl for YamahaClient {
    async fn get_system_config(&self) -> Result<SystemConfig> {
        let root = self.get("<System><Config>GetParam</Config></System>").await?;
        SystemConfig::from_response(&root)
    }

    async fn get_basic_info(&self, zone: Option<Zone>) -> Result<BasicInfo> {
        let zone = Zone::or_main(zone);
        let root = self
            .get(&commands::in_zone(zone, "<Basic_Status>GetParam</Basic_Status>"))
            .await?;
        BasicInfo::from_response(&root, zone)
    }

    async fn get_zone_config(&self, zone: Zone) -> Result<ZoneConfig> {
        let root = self
            .get(&commands::in_zone(zone, "<Config>GetParam</Config>"))
            .await?;
        ZoneConfig::from_response(&root, zone)
    }

    async fn power_on(&self, zone: Option<Zone>) -> Result<()> {
        self.set_power(zone, "On").await
    }

    async fn power_off(&self, zone: Option<Zone>) -> Result<()> {
        self.set_power(zone, "Standby").await
    }

    async fn set_volume_to(&self, value: i32, zone: Option<Zone>) -> Result<()> {
        let zone = Zone::or_main(zone);
        debug!(host = %self.host, %zone, value, "Setting volume");
        self.put(&commands::in_zone(
            zone,
            &format!(
                "<Volume><Lvl><Val>{}</Val><Exp>1</Exp><Unit>dB</Unit></Lvl></Volume>",
                value
            ),
        ))
        .await
    }

    async fn set_main_input_to(&self, input: &str) -> Result<()> {
        debug!(host = %self.host, input, "Selecting input");
        self.put(&commands::select_input(Zone::Main, input)).await
    }

    async fn select_tuner_preset(&self, preset: u32) -> Result<()> {
        self.put(&format!(
            "<Tuner><Play_Control><Preset><Preset_Sel>{}</Preset_Sel></Preset></Play_Control></Tuner>",
            preset
        ))
        .await
    }

    async fn get_tuner_preset_list(&self) -> Result<Vec<TunerPreset>> {
        let root = self
            .get("<Tuner><Play_Control><Preset><Data>GetParam</Data></Preset></Play_Control></Tuner>")
            .await?;
        TunerPreset::list_from_response(&root)
    }

    async fn get_tuner_info(&self) -> Result<TunerInfo> {
        let root = self.get("<Tuner><Play_Info>GetParam</Play_Info></Tuner>").await?;
        TunerInfo::from_response(&root)
    }

    async fn send_raw_command(&self, payload: &str) -> Result<()> {
        self.send_xml(payload).await.map(|_| ())
    }

    async fn is_party_mode_enabled(&self) -> Result<bool> {
        let root = self
            .get("<System><Party_Mode><Mode>GetParam</Mode></Party_Mode></System>")
            .await?;
        model::party_mode_from_response(&root)
    }

    async fn party_mode_on(&self) -> Result<()> {
        self.set_party_mode("On").await
    }

    async fn party_mode_off(&self) -> Result<()> {
        self.set_party_mode("Off").await
    }
}
