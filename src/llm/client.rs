//! HTTP client for the local generation endpoint.

use crate::config::LlmConfig;
use crate::error::{AssistantError, Result};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::info;

/// Client for an Ollama-compatible `/api/generate` endpoint.
///
/// HTTP is synchronous (`ureq`) and runs inside `spawn_blocking`;
/// streaming responses are bridged to the async caller through an mpsc
/// token channel.
#[derive(Clone)]
pub struct LlmClient {
    config: LlmConfig,
    agent: ureq::Agent,
}

impl LlmClient {
    /// Create a client for the configured server.
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            config: config.clone(),
            agent: ureq::agent(),
        }
    }

    fn endpoint(&self) -> String {
        let base = self.config.api_url.trim_end_matches('/');
        format!("{base}/api/generate")
    }

    fn request_body(&self, prompt: &str, stream: bool) -> String {
        serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": stream,
            "options": {
                "num_predict": self.config.num_predict,
                "temperature": self.config.temperature,
                "top_p": self.config.top_p,
            },
        })
        .to_string()
    }

    /// Generate a complete response in one request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response has no
    /// `response` field.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint();
        let body = self.request_body(prompt, false);
        let agent = self.agent.clone();

        let started = Instant::now();
        let response = tokio::task::spawn_blocking(move || -> std::result::Result<String, String> {
            let response = agent
                .post(&url)
                .set("Content-Type", "application/json")
                .send_string(&body)
                .map_err(|e| format!("generate request failed: {e}"))?;
            let text = response
                .into_string()
                .map_err(|e| format!("generate response read failed: {e}"))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| format!("generate response parse failed: {e}"))?;
            value["response"]
                .as_str()
                .map(str::to_owned)
                .ok_or_else(|| "generate response missing `response` field".to_owned())
        })
        .await
        .map_err(|e| AssistantError::Llm(format!("generate task panicked: {e}")))?
        .map_err(AssistantError::Llm)?;

        info!(
            "generated {} chars in {:.1}s",
            response.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(response)
    }

    /// Generate a streaming response, sending each token through `tx`.
    ///
    /// Tokens are the `response` fields of the newline-delimited JSON
    /// objects the server emits; malformed lines are skipped. Returns the
    /// full concatenated response once the stream ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the request itself fails. A dropped receiver
    /// ends the stream early without error.
    pub async fn generate_streaming(
        &self,
        prompt: &str,
        tx: mpsc::Sender<String>,
    ) -> Result<String> {
        let url = self.endpoint();
        let body = self.request_body(prompt, true);
        let agent = self.agent.clone();

        let started = Instant::now();
        let full = tokio::task::spawn_blocking(move || -> std::result::Result<String, String> {
            let response = agent
                .post(&url)
                .set("Content-Type", "application/json")
                .send_string(&body)
                .map_err(|e| format!("streaming request failed: {e}"))?;

            let reader = std::io::BufReader::new(response.into_reader());
            let mut full = String::new();
            for line in std::io::BufRead::lines(reader) {
                let line = line.map_err(|e| format!("stream read error: {e}"))?;
                if line.is_empty() {
                    continue;
                }
                let Ok(chunk) = serde_json::from_str::<serde_json::Value>(&line) else {
                    continue;
                };
                if let Some(token) = chunk["response"].as_str()
                    && !token.is_empty()
                {
                    full.push_str(token);
                    if tx.blocking_send(token.to_owned()).is_err() {
                        break;
                    }
                }
                if chunk["done"].as_bool() == Some(true) {
                    break;
                }
            }
            Ok(full)
        })
        .await
        .map_err(|e| AssistantError::Llm(format!("streaming task panicked: {e}")))?
        .map_err(AssistantError::Llm)?;

        info!(
            "streamed {} chars in {:.1}s",
            full.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(full)
    }
}
