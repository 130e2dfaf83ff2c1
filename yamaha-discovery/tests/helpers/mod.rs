//! Test helpers for description-based integration tests

use std::fs;
use std::path::PathBuf;

/// A captured UPnP description served by a mock HTTP server
#[derive(Debug, Clone)]
pub struct DescriptionFixture {
    pub name: String,
    pub xml_content: String,
}

impl DescriptionFixture {
    /// Load a fixture from the fixtures directory
    pub fn load(filename: &str) -> Self {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("tests/fixtures");
        path.push(filename);

        let xml_content = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", filename, e));

        Self {
            name: filename.to_string(),
            xml_content,
        }
    }

    /// Path the description is served under
    pub fn path(&self) -> String {
        format!("/{}", self.name)
    }

    /// Location URL of this description on `server`
    pub fn location(&self, server: &mockito::ServerGuard) -> String {
        format!("{}{}", server.url(), self.path())
    }
}
