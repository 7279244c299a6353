//! Recording adapter for the `LlmClient` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{CompletionFuture, CompletionRequest, LlmClient};

/// Records LLM interactions while delegating to an inner implementation.
pub struct RecordingLlmClient {
    inner: Box<dyn LlmClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingLlmClient {
    /// Creates a new recording LLM client wrapping the given implementation.
    pub fn new(inner: Box<dyn LlmClient>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl LlmClient for RecordingLlmClient {
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let result = self.inner.complete(&request).await;
            record_result(&self.recorder, "llm", "complete", &request, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::Cassette;
    use crate::error::PortError;
    use crate::ports::CompletionResponse;

    struct EchoClient;

    impl LlmClient for EchoClient {
        fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
            let text = format!("echo: {}", request.prompt);
            let response: Result<CompletionResponse, PortError> = Ok(CompletionResponse {
                text,
                prompt_tokens: 3,
                completion_tokens: 2,
            });
            Box::pin(async move { response })
        }
    }

    #[tokio::test]
    async fn records_request_and_response() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "llm")));

        {
            let client = RecordingLlmClient::new(Box::new(EchoClient), Arc::clone(&recorder));
            let request = CompletionRequest {
                model: "gpt-3.5-turbo".into(),
                prompt: "summarise".into(),
                max_tokens: 16,
                temperature: 0.5,
            };
            let resp = client.complete(&request).await.unwrap();
            assert_eq!(resp.text, "echo: summarise");
        }

        let recorder = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap();
        recorder.finish().unwrap();

        let cassette: Cassette =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(cassette.interactions.len(), 1);
        let interaction = &cassette.interactions[0];
        assert_eq!(interaction.port, "llm");
        assert_eq!(interaction.input["prompt"], "summarise");
        assert_eq!(interaction.output["Ok"]["text"], "echo: summarise");
    }
}
