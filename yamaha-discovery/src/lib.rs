//! Yamaha receiver discovery
//!
//! Receivers announce themselves over SSDP as UPnP media renderers. This
//! crate searches for them, fetches each device description, keeps the
//! Yamaha ones and yields them as [`Endpoint`]s.
//!
//! # Quick Start
//!
//! ```no_run
//! use yamaha_discovery::{ScanConfig, ScanSource, SsdpScanner};
//!
//! # async fn run() -> yamaha_discovery::Result<()> {
//! let mut scanner = SsdpScanner::start(ScanConfig::default())?;
//! while let Some(endpoint) = scanner.next_endpoint().await {
//!     println!("Found {} at {}", endpoint.name, endpoint.preferred_host());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod ssdp;
pub mod device;
mod scanner;

pub use error::{DiscoveryError, Result};
pub use scanner::{ScanConfig, SsdpScanner};
pub use ssdp::MEDIA_RENDERER_URN;

use std::net::IpAddr;

use async_trait::async_trait;

/// A network location that may host a receiver.
///
/// Produced by a scan or from static configuration and consumed right away
/// by probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Name the device announced, or the configured name for manual entries
    pub name: String,
    /// Addresses the device answered on
    pub addresses: Vec<String>,
    /// Port of the receiver's control endpoint
    pub port: u16,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            addresses: vec![address.into()],
            port,
        }
    }

    /// First IPv4 address, falling back to the first address of any kind
    pub fn preferred_host(&self) -> &str {
        self.addresses
            .iter()
            .find(|address| matches!(address.parse::<IpAddr>(), Ok(IpAddr::V4(_))))
            .or_else(|| self.addresses.first())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// A source of candidate endpoints.
///
/// `next_endpoint` returns `None` once the source is exhausted or stopped.
#[async_trait]
pub trait ScanSource: Send {
    async fn next_endpoint(&mut self) -> Option<Endpoint>;

    /// Stop producing endpoints; further calls to `next_endpoint` drain and end
    fn stop(&mut self);
}
