use crate::conversation::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Upstream error: {message}")]
    Upstream { message: String },

    #[error("Upstream returned an empty reply")]
    EmptyReply,
}

/// Per-call sampling options and extra request headers.
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub headers: Vec<(String, String)>,
}

impl CompletionOptions {
    pub fn new(max_tokens: Option<u32>, temperature: Option<f32>) -> Self {
        CompletionOptions {
            max_tokens,
            temperature,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// An external text-completion capability.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        model_id: &str,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub base_url: String,
    pub api_key: String,
    pub referer: Option<String>,
    pub title: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    error: Option<UpstreamErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    message: String,
}

pub fn api_path(url: &str, api_path: &str) -> String {
    let url = url.trim_end_matches('/');
    if api_path.starts_with('/') {
        format!("{}{}", url, api_path)
    } else {
        format!("{}/{}", url, api_path)
    }
}

/// Speaks the OpenAI-compatible `/chat/completions` protocol.
#[derive(Debug, Clone)]
pub struct HttpCompletionBackend {
    client: reqwest::Client,
    config: HttpBackendConfig,
}

impl HttpCompletionBackend {
    pub fn new(config: HttpBackendConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionBackend {
    async fn complete(
        &self,
        model_id: &str,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, GatewayError> {
        let url = api_path(&self.config.base_url, "/chat/completions");
        let body = ChatCompletionRequest {
            model: model_id,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let mut request = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&body);
        if let Some(referer) = &self.config.referer {
            request = request.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.config.title {
            request = request.header("X-Title", title);
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = resp.json().await?;
        if let Some(err) = parsed.error {
            return Err(GatewayError::Upstream {
                message: err.message,
            });
        }
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(GatewayError::EmptyReply)
    }
}

/// Outcome of one gateway invocation.
#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub model_id: String,
    pub elapsed: Duration,
    pub outcome: Result<String, String>,
}

impl CompletionResult {
    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn reply(&self) -> Option<&str> {
        self.outcome.as_deref().ok()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }

    pub fn into_reply(self) -> Option<String> {
        self.outcome.ok()
    }
}

/// Times a single backend call and folds every failure into the result.
#[derive(Clone)]
pub struct CompletionGateway {
    backend: Arc<dyn CompletionBackend>,
}

impl CompletionGateway {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub async fn invoke(
        &self,
        model_id: &str,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> CompletionResult {
        let start = Instant::now();
        let outcome = self.backend.complete(model_id, messages, options).await;
        let elapsed = start.elapsed();

        match outcome {
            Ok(reply) => {
                log::debug!("{} replied in {:.2}s", model_id, elapsed.as_secs_f64());
                CompletionResult {
                    model_id: model_id.to_string(),
                    elapsed,
                    outcome: Ok(reply),
                }
            }
            Err(e) => {
                log::warn!(
                    "{} failed after {:.2}s: {}",
                    model_id,
                    elapsed.as_secs_f64(),
                    e
                );
                CompletionResult {
                    model_id: model_id.to_string(),
                    elapsed,
                    outcome: Err(e.to_string()),
                }
            }
        }
    }
}
