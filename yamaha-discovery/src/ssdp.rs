//! SSDP search over a tokio UDP socket
//!
//! Internal to the crate; the scanner drives it.

use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::error::{DiscoveryError, Result};

/// Multicast group and port every UPnP device listens on
pub(crate) const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// Search target answered by Yamaha network receivers
pub const MEDIA_RENDERER_URN: &str = "urn:schemas-upnp-org:device:MediaRenderer:1";

/// The headers the scanner needs from one search response
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SsdpResponse {
    pub location: String,
    pub search_target: String,
    pub usn: String,
    pub server: Option<String>,
}

pub(crate) struct SsdpClient {
    socket: UdpSocket,
}

impl SsdpClient {
    /// Bind the search socket.
    ///
    /// Binding is synchronous so callers learn about an unusable interface
    /// before any task is spawned. Must run inside a tokio runtime.
    pub fn bind(address: SocketAddr) -> Result<Self> {
        let socket = std::net::UdpSocket::bind(address).map_err(DiscoveryError::SocketBind)?;
        socket
            .set_multicast_loop_v4(true)
            .map_err(DiscoveryError::SocketBind)?;
        socket.set_nonblocking(true).map_err(DiscoveryError::SocketBind)?;

        let socket = UdpSocket::from_std(socket).map_err(DiscoveryError::SocketBind)?;
        Ok(Self { socket })
    }

    /// Multicast one M-SEARCH for `search_target`
    pub async fn search(&self, search_target: &str) -> Result<()> {
        self.socket
            .send_to(m_search(search_target).as_bytes(), SSDP_MULTICAST_ADDR)
            .await
            .map_err(DiscoveryError::Socket)?;
        Ok(())
    }

    /// Wait for the next datagram.
    ///
    /// Returns `Ok(None)` for datagrams that are not a usable search response.
    pub async fn recv(&self, buffer: &mut [u8]) -> Result<Option<(SsdpResponse, SocketAddr)>> {
        let (size, from) = self
            .socket
            .recv_from(buffer)
            .await
            .map_err(DiscoveryError::Socket)?;

        Ok(std::str::from_utf8(&buffer[..size])
            .ok()
            .and_then(parse_ssdp_response)
            .map(|response| (response, from)))
    }
}

fn m_search(search_target: &str) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: 3\r\n\
         ST: {}\r\n\
         USER-AGENT: yamaha-home/0.3 UPnP/1.1\r\n\
         \r\n",
        SSDP_MULTICAST_ADDR, search_target
    )
}

/// Parse the headers of a search response; `None` unless LOCATION, ST and USN are present
fn parse_ssdp_response(response: &str) -> Option<SsdpResponse> {
    let mut location = None;
    let mut search_target = None;
    let mut usn = None;
    let mut server = None;

    for (name, value) in response.lines().filter_map(header) {
        match name.to_ascii_uppercase().as_str() {
            "LOCATION" => location = Some(value),
            "ST" => search_target = Some(value),
            "USN" => usn = Some(value),
            "SERVER" => server = Some(value),
            _ => {}
        }
    }

    Some(SsdpResponse {
        location: location?,
        search_target: search_target?,
        usn: usn?,
        server,
    })
}

fn header(line: &str) -> Option<(&str, String)> {
    let (name, value) = line.trim().split_once(':')?;
    let name = name.trim();
    if name.is_empty() || name.contains(' ') {
        return None;
    }
    Some((name, value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "HTTP/1.1 200 OK\r\n\
        CACHE-CONTROL: max-age=1800\r\n\
        EXT:\r\n\
        LOCATION: http://192.168.1.20:8080/MediaRenderer/desc.xml\r\n\
        SERVER: Network Module/1.0, UPnP/1.0, MediaRenderer/1.0\r\n\
        ST: urn:schemas-upnp-org:device:MediaRenderer:1\r\n\
        USN: uuid:9ab0c000-f668-11de-9976-00a0dea4b14f::urn:schemas-upnp-org:device:MediaRenderer:1\r\n\
        \r\n";

    #[test]
    fn test_parse_search_response() {
        let parsed = parse_ssdp_response(RESPONSE).unwrap();

        assert_eq!(parsed.location, "http://192.168.1.20:8080/MediaRenderer/desc.xml");
        assert_eq!(parsed.search_target, MEDIA_RENDERER_URN);
        assert!(parsed.usn.starts_with("uuid:9ab0c000"));
        assert_eq!(
            parsed.server.as_deref(),
            Some("Network Module/1.0, UPnP/1.0, MediaRenderer/1.0")
        );
    }

    #[test]
    fn test_parse_lowercase_headers() {
        let response = "HTTP/1.1 200 OK\r\n\
            location: http://10.0.0.5:8080/MediaRenderer/desc.xml\r\n\
            st: urn:schemas-upnp-org:device:MediaRenderer:1\r\n\
            usn: uuid:abc::urn:schemas-upnp-org:device:MediaRenderer:1\r\n\r\n";

        let parsed = parse_ssdp_response(response).unwrap();
        assert_eq!(parsed.location, "http://10.0.0.5:8080/MediaRenderer/desc.xml");
        assert_eq!(parsed.server, None);
    }

    #[test]
    fn test_parse_requires_location() {
        let response = "HTTP/1.1 200 OK\r\n\
            ST: urn:schemas-upnp-org:device:MediaRenderer:1\r\n\
            USN: uuid:abc\r\n\r\n";
        assert!(parse_ssdp_response(response).is_none());
    }

    #[test]
    fn test_parse_rejects_noise() {
        assert!(parse_ssdp_response("").is_none());
        assert!(parse_ssdp_response("NOTIFY * HTTP/1.1\r\nsome random text\r\n").is_none());
    }

    #[test]
    fn test_header_keeps_colons_in_value() {
        assert_eq!(
            header("USN: uuid:abc::urn:x"),
            Some(("USN", "uuid:abc::urn:x".to_string()))
        );
        assert_eq!(header("not a header line"), None);
    }

    #[test]
    fn test_m_search_targets_media_renderers() {
        let request = m_search(MEDIA_RENDERER_URN);
        assert!(request.starts_with("M-SEARCH * HTTP/1.1\r\n"));
        assert!(request.contains("ST: urn:schemas-upnp-org:device:MediaRenderer:1\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
    }
}
