//! Test helpers for HTTP-level client tests

use std::fs;
use std::path::PathBuf;

use mockito::{Matcher, Mock, ServerGuard};

/// Path the receiver serves control documents on
pub const CONTROL_PATH: &str = "/YamahaRemoteControl/ctrl";

/// Load a captured receiver response from the fixtures directory
pub fn fixture(filename: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(filename);

    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", filename, e))
}

/// Bare acknowledgement the receiver sends for a successful `PUT`
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
