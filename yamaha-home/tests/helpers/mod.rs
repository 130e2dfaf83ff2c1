//! Shared helpers for platform-level tests against a mocked receiver

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use mockito::{Matcher, Mock, ServerGuard};
use yamaha_discovery::{Endpoint, ScanSource};
use yamaha_home::{Accessory, AccessoryId, HostRegistry, StatusUpdate};

pub const CONTROL_PATH: &str = "/YamahaRemoteControl/ctrl";

pub fn fixture(filename: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(filename);

    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", filename, e))
}

pub fn put_ok() -> String {
    r#"<YAMAHA_AV rsp="PUT" RC="0"></YAMAHA_AV>"#.to_string()
}

/// Mount a control-endpoint mock answering requests whose body matches `pattern`
pub async fn mock_control(server: &mut ServerGuard, pattern: &str, response: String) -> Mock {
    server
        .mock("POST", CONTROL_PATH)
        .match_body(Matcher::Regex(pattern.to_string()))
        .with_status(200)
        .with_header("content-type", "text/xml; charset=utf-8")
        .with_body(response)
        .create_async()
        .await
}

/// Serve the read-only documents of a two-zone RX-V671 with System_ID `ABC123`
pub async fn mock_two_zone_receiver(server: &mut ServerGuard) -> Vec<Mock> {
    let documents = [
        ("<System><Config>GetParam", "system_config_abc123.xml"),
        ("<Main_Zone><Basic_Status>GetParam", "basic_status_main_zone.xml"),
        ("<Zone_2><Basic_Status>GetParam", "basic_status_zone_2.xml"),
        ("<Main_Zone><Config>GetParam", "zone_config_main_zone.xml"),
        ("<Zone_2><Config>GetParam", "zone_config_zone_2.xml"),
    ];

    let mut mocks = Vec::with_capacity(documents.len());
    for (pattern, file) in documents {
        mocks.push(mock_control(server, pattern, fixture(file)).await);
    }
    mocks
}

/// Scan source that never finds anything and stays open until stopped
#[derive(Debug, Default)]
pub struct SilentScan {
    pub stopped: bool,
}

#[async_trait]
impl ScanSource for SilentScan {
    async fn next_endpoint(&mut self) -> Option<Endpoint> {
        if !self.stopped {
            std::future::pending::<()>().await;
        }
        None
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

/// Host registry that remembers what it was given
#[derive(Debug, Default)]
pub struct TestHost {
    pub registered: Mutex<Vec<Accessory>>,
    pub updated: Mutex<Vec<Accessory>>,
    pub characteristics: Mutex<Vec<(AccessoryId, Vec<StatusUpdate>)>>,
}

impl TestHost {
    pub fn registered_names(&self) -> Vec<String> {
        self.registered
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.display_name.clone())
            .collect()
    }
}

impl HostRegistry for TestHost {
    fn register_platform_accessories(&self, accessories: &[Accessory]) {
        self.registered.lock().unwrap().extend_from_slice(accessories);
    }

    fn update_platform_accessories(&self, accessories: &[Accessory]) {
        self.updated.lock().unwrap().extend_from_slice(accessories);
    }

    fn unregister_platform_accessories(&self, _accessories: &[Accessory]) {}

    fn update_characteristics(&self, id: &AccessoryId, updates: &[StatusUpdate]) {
        self.characteristics
            .lock()
            .unwrap()
            .push((*id, updates.to_vec()));
    }
}
