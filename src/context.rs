//! Service context bundling the port trait objects.

use std::path::{Path, PathBuf};

use crate::adapters::live::{LiveFileSystem, LiveLlmClient};
use crate::adapters::recording::{RecordingFileSystem, RecordingLlmClient};
use crate::adapters::replaying::{ReplayingFileSystem, ReplayingLlmClient};
use crate::cassette::config::CassetteConfig;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::error::PortError;
use crate::ports::filesystem::FileSystem;
use crate::ports::llm::{CompletionFuture, CompletionRequest, LlmClient};

/// Bundles the port trait objects into a single context.
///
/// Constructors wire up different adapter implementations (live, replaying,
/// recording).
pub struct ServiceContext {
    /// Filesystem for reading code and persisting the summary store.
    pub fs: Box<dyn FileSystem>,
    /// LLM client for chunk and combine completions.
    pub llm: Box<dyn LlmClient>,
}

impl ServiceContext {
    /// Creates a live context backed by the real disk and the OpenAI API.
    #[must_use]
    pub fn live() -> Self {
        Self {
            fs: Box::new(LiveFileSystem),
            llm: Box::new(LiveLlmClient::new()),
        }
    }

    /// Creates a recording context that captures every port interaction
    /// into a new session under `base`.
    ///
    /// The returned session must be finished after the context is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the session directory cannot be created.
    pub fn recording_at(base: PathBuf) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::new(&base)?;
        let ctx = Self {
            fs: Box::new(RecordingFileSystem::new(
                Box::new(LiveFileSystem),
                std::sync::Arc::clone(&session.fs),
            )),
            llm: Box::new(RecordingLlmClient::new(
                Box::new(LiveLlmClient::new()),
                std::sync::Arc::clone(&session.llm),
            )),
        };
        Ok((ctx, session))
    }

    /// Creates a replaying context from a single cassette holding both
    /// ports' interactions.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = CassetteConfig::load_cassette(path)?;

        // Each port gets its own replayer so per-port cursors are independent.
        Ok(Self {
            fs: Box::new(ReplayingFileSystem::new(CassetteReplayer::new(&cassette))),
            llm: Box::new(ReplayingLlmClient::new(CassetteReplayer::new(&cassette))),
        })
    }

    /// Creates a replaying context from per-port cassette files.
    ///
    /// Ports without a configured cassette use a panicking adapter that
    /// fails with a clear message when called.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;

        Ok(Self {
            fs: match replayers.fs {
                Some(r) => Box::new(ReplayingFileSystem::new(r)),
                None => Box::new(PanickingFileSystem),
            },
            llm: match replayers.llm {
                Some(r) => Box::new(ReplayingLlmClient::new(r)),
                None => Box::new(PanickingLlmClient),
            },
        })
    }
}

// --- Panicking adapters for unspecified ports ---

struct PanickingFileSystem;
impl FileSystem for PanickingFileSystem {
    fn read_to_string(&self, _path: &Path) -> Result<String, PortError> {
        panic!("FileSystem port not configured in CassetteConfig; no cassette loaded for fs");
    }
    fn write(&self, _path: &Path, _contents: &str) -> Result<(), PortError> {
        panic!("FileSystem port not configured in CassetteConfig; no cassette loaded for fs");
    }
    fn exists(&self, _path: &Path) -> bool {
        panic!("FileSystem port not configured in CassetteConfig; no cassette loaded for fs");
    }
    fn walk(&self, _root: &Path, _recursive: bool) -> Result<Vec<PathBuf>, PortError> {
        panic!("FileSystem port not configured in CassetteConfig; no cassette loaded for fs");
    }
}

struct PanickingLlmClient;
impl LlmClient for PanickingLlmClient {
    fn complete(&self, _request: &CompletionRequest) -> CompletionFuture<'_> {
        panic!("LlmClient port not configured in CassetteConfig; no cassette loaded for llm");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::recorder::CassetteRecorder;
    use serde_json::json;

    #[tokio::test]
    async fn replaying_context_from_single_cassette() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.cassette.yaml");

        let mut rec = CassetteRecorder::new(&path, "run");
        rec.record("fs", "read_to_string", json!({"path": "/code/a.sas"}), json!({"Ok": "run;"}));
        rec.record(
            "llm",
            "complete",
            json!({"prompt": "..."}),
            json!({"Ok": {"text": "Ends a step.", "prompt_tokens": 9, "completion_tokens": 3}}),
        );
        rec.finish().unwrap();

        let ctx = ServiceContext::replaying(&path).unwrap();
        assert_eq!(ctx.fs.read_to_string(Path::new("/code/a.sas")).unwrap(), "run;");
        let request = CompletionRequest {
            model: "gpt-3.5-turbo".into(),
            prompt: "...".into(),
            max_tokens: 8,
            temperature: 0.5,
        };
        assert_eq!(ctx.llm.complete(&request).await.unwrap().text, "Ends a step.");
    }

    #[test]
    #[should_panic(expected = "not configured in CassetteConfig")]
    fn unspecified_port_panics_with_clear_message() {
        let ctx = ServiceContext::replaying_from(&CassetteConfig::panic_on_unspecified()).unwrap();
        let _ = ctx.fs.exists(Path::new("/code"));
    }
}
