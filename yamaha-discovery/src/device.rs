//! UPnP device description parsing and receiver validation.

use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::error::{DiscoveryError, Result};
use crate::Endpoint;

/// Port of the receiver control endpoint when the description names none
pub const DEFAULT_CONTROL_PORT: u16 = 80;

#[derive(Debug, Deserialize)]
struct Root {
    device: DeviceDescription,
}

/// The `<device>` block of a UPnP description
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescription {
    pub device_type: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub model_name: Option<String>,
    #[serde(rename = "UDN")]
    pub udn: Option<String>,
}

impl DeviceDescription {
    /// Parse the description document.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::DescriptionParse` if the XML is malformed or
    /// missing required fields.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let root: Root = quick_xml::de::from_str(xml)
            .map_err(|e| DiscoveryError::DescriptionParse(e.to_string()))?;

        Ok(root.device)
    }

    pub fn is_yamaha(&self) -> bool {
        self.manufacturer.to_lowercase().contains("yamaha")
    }
}

/// Port of the vendor control URL base (`X_URLBase`), if the description has one.
///
/// The element lives in a vendor namespace, so it is located by name
/// rather than through the typed description.
pub fn control_port(xml: &str) -> Option<u16> {
    let start = xml.find("X_URLBase>")? + "X_URLBase>".len();
    let rest = &xml[start..];
    let base = rest[..rest.find('<')?].trim();
    Url::parse(base).ok()?.port_or_known_default()
}

/// Fetch the description at `location` and turn a Yamaha receiver into an endpoint.
///
/// # Errors
///
/// `DescriptionFetch` when the fetch fails, `InvalidLocation` or
/// `DescriptionParse` for unusable input and `NotYamaha` for devices from
/// other manufacturers.
pub async fn describe(http: &reqwest::Client, location: &str) -> Result<Endpoint> {
    let url =
        Url::parse(location).map_err(|_| DiscoveryError::InvalidLocation(location.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| DiscoveryError::InvalidLocation(location.to_string()))?
        .to_string();

    let fetch_failed = |source: reqwest::Error| DiscoveryError::DescriptionFetch {
        location: location.to_string(),
        source,
    };
    let xml = http
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(fetch_failed)?
        .text()
        .await
        .map_err(fetch_failed)?;

    let description = DeviceDescription::from_xml(&xml)?;
    if !description.is_yamaha() {
        return Err(DiscoveryError::NotYamaha {
            name: description.friendly_name,
            manufacturer: description.manufacturer,
        });
    }

    let port = control_port(&xml).unwrap_or(DEFAULT_CONTROL_PORT);
    debug!(name = %description.friendly_name, %host, port, "Described Yamaha receiver");

    Ok(Endpoint {
        name: description.friendly_name,
        addresses: vec![host],
        port,
    })
}
