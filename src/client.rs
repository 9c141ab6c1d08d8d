use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::StatusCode;
use serde::Serialize;
use tokio::time::Duration;

use crate::config::Config;

/// Failure modes of one chat exchange. Cancellation is deliberately not a
/// variant: an aborted request is a normal outcome, not an error.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat endpoint returned status {0}")]
    Status(StatusCode),
    #[error("failed to reach chat endpoint: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("stream interrupted: {0}")]
    Interrupted(String),
}

/// Byte stream of one chat response body. Lazy, finite, not restartable;
/// chunk boundaries carry no meaning.
pub type ChunkStream = BoxStream<'static, Result<Bytes, ChatError>>;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
}

/// HTTP client for the chat endpoint.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    bypass_interstitial: bool,
}

impl ChatClient {
    pub fn new(config: &Config) -> Self {
        // No overall timeout: a streamed answer may stay open for as long as
        // the model keeps talking. Only connecting is bounded.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bypass_interstitial: config.bypass_interstitial,
        }
    }

    /// POST the question and hand back the raw response body as a chunk
    /// stream. A non-2xx status is terminal for the exchange.
    pub async fn ask(&self, question: &str) -> Result<ChunkStream, ChatError> {
        let url = format!("{}/chat", self.base_url);
        log::debug!("POST {url}");

        let mut request = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&ChatRequest { question });
        if self.bypass_interstitial {
            // Some tunnel proxies front the backend with an HTML warning
            // page unless this header is present.
            request = request.header("ngrok-skip-browser-warning", "true");
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("chat endpoint answered {status}");
            return Err(ChatError::Status(status));
        }

        Ok(response
            .bytes_stream()
            .map_err(|e| ChatError::Interrupted(e.to_string()))
            .boxed())
    }
}
