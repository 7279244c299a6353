//! Cassette configuration for composable per-port replay.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// Per-port cassette file paths. Ports without a cassette path panic if
/// called during replay.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Path to the LLM port cassette file.
    pub llm: Option<PathBuf>,
    /// Path to the filesystem port cassette file.
    pub fs: Option<PathBuf>,
}

/// Per-port replayers, each with its own interaction stream.
pub struct PortReplayers {
    /// Replayer for the LLM port.
    pub llm: Option<CassetteReplayer>,
    /// Replayer for the filesystem port.
    pub fs: Option<CassetteReplayer>,
}

impl CassetteConfig {
    /// Returns a config where all port paths are `None`.
    #[must_use]
    pub fn panic_on_unspecified() -> Self {
        Self::default()
    }

    /// Points each port at `<dir>/<port>.cassette.yaml`, the layout written
    /// by a recording session. Missing files leave the port unconfigured.
    #[must_use]
    pub fn from_session_dir(dir: &Path) -> Self {
        let port_file = |port: &str| {
            let path = dir.join(format!("{port}.cassette.yaml"));
            path.exists().then_some(path)
        };
        Self {
            llm: port_file("llm"),
            fs: port_file("fs"),
        }
    }

    /// Load a cassette file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_cassette(path: &Path) -> Result<Cassette, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))
    }

    /// Load all configured per-port cassette files and create replayers.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, String> {
        let load = |path: &Path| Self::load_cassette(path).map(|c| CassetteReplayer::new(&c));
        Ok(PortReplayers {
            llm: self.llm.as_deref().map(load).transpose()?,
            fs: self.fs.as_deref().map(load).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::recorder::CassetteRecorder;
    use serde_json::json;

    #[test]
    fn from_session_dir_only_picks_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = CassetteRecorder::new(dir.path().join("llm.cassette.yaml"), "llm");
        rec.record("llm", "complete", json!({}), json!({"Ok": {"text": "a"}}));
        rec.finish().unwrap();

        let config = CassetteConfig::from_session_dir(dir.path());
        assert!(config.llm.is_some());
        assert!(config.fs.is_none());

        let mut replayers = config.load_all().unwrap();
        let llm = replayers.llm.as_mut().unwrap();
        assert_eq!(llm.next_interaction("llm", "complete").output, json!({"Ok": {"text": "a"}}));
        assert!(replayers.fs.is_none());
    }

    #[test]
    fn load_all_reports_unparseable_cassette() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fs.cassette.yaml");
        std::fs::write(&path, "not: [a, cassette").unwrap();

        let config = CassetteConfig {
            fs: Some(path),
            ..CassetteConfig::default()
        };
        let err = config.load_all().err().unwrap();
        assert!(err.contains("Failed to parse cassette file"));
    }

    #[test]
    fn load_all_with_no_cassettes() {
        let replayers = CassetteConfig::panic_on_unspecified().load_all().unwrap();
        assert!(replayers.llm.is_none());
        assert!(replayers.fs.is_none());
    }
}
