//! Failures of the SSDP scan and of describing a found device

use std::{fmt, io};

/// Why a scan could not start or a device could not be described.
///
/// Only [`DiscoveryError::SocketBind`] and [`DiscoveryError::HttpClient`]
/// reach the caller of [`SsdpScanner::start`](crate::SsdpScanner::start);
/// the rest concern a single device and are logged by the scanner.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The SSDP socket could not be bound or configured for multicast
    SocketBind(io::Error),
    /// Sending an M-SEARCH or receiving a response failed
    Socket(io::Error),
    /// The HTTP client for description fetches could not be built
    HttpClient(reqwest::Error),
    /// The announced description location is not a usable URL
    InvalidLocation(String),
    /// Fetching the description document failed
    DescriptionFetch {
        location: String,
        source: reqwest::Error,
    },
    /// The description document is not a UPnP device description
    DescriptionParse(String),
    /// The device is a media renderer from another manufacturer
    NotYamaha { name: String, manufacturer: String },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::SocketBind(e) => write!(f, "cannot bind SSDP socket: {}", e),
            DiscoveryError::Socket(e) => write!(f, "SSDP socket failure: {}", e),
            DiscoveryError::HttpClient(e) => write!(f, "cannot build HTTP client: {}", e),
            DiscoveryError::InvalidLocation(location) => {
                write!(f, "unusable description location {:?}", location)
            }
            DiscoveryError::DescriptionFetch { location, source } => {
                write!(f, "cannot fetch description from {}: {}", location, source)
            }
            DiscoveryError::DescriptionParse(reason) => {
                write!(f, "malformed device description: {}", reason)
            }
            DiscoveryError::NotYamaha { name, manufacturer } => {
                write!(f, "{} is made by {}", name, manufacturer)
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiscoveryError::SocketBind(e) | DiscoveryError::Socket(e) => Some(e),
            DiscoveryError::HttpClient(e) => Some(e),
            DiscoveryError::DescriptionFetch { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_bind_failure_keeps_io_source() {
        let error = DiscoveryError::SocketBind(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            "address not available",
        ));

        assert_eq!(
            error.to_string(),
            "cannot bind SSDP socket: address not available"
        );
        assert!(error.source().is_some());
    }

    #[test]
    fn test_not_yamaha_names_the_manufacturer() {
        let error = DiscoveryError::NotYamaha {
            name: "Kitchen".to_string(),
            manufacturer: "Sonos, Inc.".to_string(),
        };

        assert_eq!(error.to_string(), "Kitchen is made by Sonos, Inc.");
        assert!(error.source().is_none());
    }
}
