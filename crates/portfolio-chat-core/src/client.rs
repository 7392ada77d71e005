use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ChatError;

/// Shown in place of a reply whenever the endpoint can't produce one.
pub const FALLBACK_REPLY: &str = "⚠️ Server is busy. Please try again.";

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    reply: String,
}

/// Anything that can answer a chat message.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, message: &str) -> Result<String, ChatError>;

    /// Like [`send`](Self::send) but never fails: errors become
    /// [`FALLBACK_REPLY`].
    async fn send_or_fallback(&self, message: &str) -> String {
        match self.send(message).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "chat request failed, using fallback reply");
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

#[derive(Clone)]
pub struct HttpChatClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
    max_retries: u32,
}

impl HttpChatClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 0,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extra attempts after a transient failure. Zero means a single request.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_once(&self, message: &str) -> Result<String, ChatError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            return Err(ChatError::Status(response.status()));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let chat_response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ChatError::MalformedResponse(e.to_string()))?;
        Ok(chat_response.reply)
    }

    fn classify(&self, error: reqwest::Error) -> ChatError {
        if error.is_timeout() {
            ChatError::Timeout(self.timeout)
        } else {
            ChatError::Transport(error)
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatClient {
    async fn send(&self, message: &str) -> Result<String, ChatError> {
        let mut attempt = 0;
        loop {
            match self.send_once(message).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    debug!(error = %e, attempt, "retrying chat request");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
