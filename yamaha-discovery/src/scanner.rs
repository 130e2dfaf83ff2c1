//! Background SSDP scan that yields receiver endpoints.

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::device::describe;
use crate::error::{DiscoveryError, Result};
use crate::ssdp::{SsdpClient, MEDIA_RENDERER_URN};
use crate::{Endpoint, ScanSource};

/// Tuning for [`SsdpScanner`]
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// `ST` header of every M-SEARCH
    pub search_target: String,
    /// Time between repeated searches
    pub search_interval: Duration,
    /// Timeout for fetching one device description
    pub description_timeout: Duration,
    /// Capacity of the endpoint channel
    pub buffer_size: usize,
    /// Local address of the search socket
    pub bind_address: SocketAddr,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            search_target: MEDIA_RENDERER_URN.to_string(),
            search_interval: Duration::from_secs(5),
            description_timeout: Duration::from_secs(3),
            buffer_size: 32,
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
        }
    }
}

/// Scans the local network for Yamaha receivers until stopped.
///
/// Each description location is resolved once per scanner; endpoints are
/// delivered in the order their descriptions resolve.
pub struct SsdpScanner {
    receiver: mpsc::Receiver<Endpoint>,
    task: Option<JoinHandle<()>>,
}

impl SsdpScanner {
    /// Bind the search socket and start scanning in a background task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// `SocketBind` when the socket cannot be bound at `bind_address`,
    /// `HttpClient` when the description client cannot be built.
    pub fn start(config: ScanConfig) -> Result<Self> {
        let client = SsdpClient::bind(config.bind_address)?;
        let http = reqwest::Client::builder()
            .timeout(config.description_timeout)
            .build()
            .map_err(DiscoveryError::HttpClient)?;

        let (sender, receiver) = mpsc::channel(config.buffer_size);
        let task = tokio::spawn(scan(config, client, http, sender));

        Ok(Self {
            receiver,
            task: Some(task),
        })
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

#[async_trait]
impl ScanSource for SsdpScanner {
    async fn next_endpoint(&mut self) -> Option<Endpoint> {
        self.receiver.recv().await
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("Stopping SSDP scan");
            task.abort();
        }
        self.receiver.close();
    }
}

impl Drop for SsdpScanner {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn scan(
    config: ScanConfig,
    client: SsdpClient,
    http: reqwest::Client,
    sender: mpsc::Sender<Endpoint>,
) {
    info!(search_target = %config.search_target, "Starting SSDP scan");

    let mut seen_locations = HashSet::new();
    let mut search = tokio::time::interval(config.search_interval);
    let mut buffer = [0u8; 2048];

    loop {
        tokio::select! {
            _ = search.tick() => {
                if let Err(e) = client.search(&config.search_target).await {
                    warn!(error = %e, "M-SEARCH failed");
                }
            }
            received = client.recv(&mut buffer) => match received {
                Ok(Some((response, from))) => {
                    if !response.search_target.contains("MediaRenderer") {
                        continue;
                    }
                    if seen_locations.insert(response.location.clone()) {
                        debug!(location = %response.location, %from, "SSDP response");
                        tokio::spawn(resolve(http.clone(), response.location, sender.clone()));
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "SSDP receive failed"),
            },
            _ = sender.closed() => break,
        }
    }
}

async fn resolve(http: reqwest::Client, location: String, sender: mpsc::Sender<Endpoint>) {
    match describe(&http, &location).await {
        Ok(endpoint) => {
            info!(name = %endpoint.name, host = %endpoint.preferred_host(), "Found receiver");
            let _ = sender.send(endpoint).await;
        }
        Err(e @ DiscoveryError::NotYamaha { .. }) => debug!(%location, reason = %e, "Skipping device"),
        Err(e) => warn!(%location, error = %e, "Failed to describe device"),
    }
}
