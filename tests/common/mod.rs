// These helpers are shared by several test binaries
#![allow(dead_code)]

pub mod mock_upstream;

use async_trait::async_trait;
use chat_relay::config::RelayConfig;
use chat_relay::conversation::Message;
use chat_relay::gateway::{CompletionBackend, CompletionOptions, GatewayError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const GUARDIAN: &str = "guard/free";

#[derive(Debug, Clone)]
pub enum Script {
    Reply { text: String, delay_ms: u64 },
    Fail { delay_ms: u64 },
}

/// In-process backend whose behaviour is fixed per model id. Unknown
/// models fail immediately.
#[derive(Default)]
pub struct ScriptedBackend {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, model_id: &str, text: &str, delay_ms: u64) -> Self {
        self.scripts.insert(
            model_id.to_string(),
            Script::Reply {
                text: text.to_string(),
                delay_ms,
            },
        );
        self
    }

    pub fn fail(mut self, model_id: &str, delay_ms: u64) -> Self {
        self.scripts
            .insert(model_id.to_string(), Script::Fail { delay_ms });
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(
        &self,
        model_id: &str,
        _messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<String, GatewayError> {
        self.calls.lock().push(model_id.to_string());
        match self.scripts.get(model_id).cloned() {
            Some(Script::Reply { text, delay_ms }) => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(text)
            }
            Some(Script::Fail { delay_ms }) => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Err(GatewayError::Status {
                    status: 502,
                    body: "bad gateway".to_string(),
                })
            }
            None => Err(GatewayError::EmptyReply),
        }
    }
}

pub fn create_test_config(candidates: &[&str]) -> RelayConfig {
    RelayConfig {
        api_key: Some("sk-test".to_string()),
        candidate_models: candidates.iter().map(|c| c.to_string()).collect(),
        guardian_model: GUARDIAN.to_string(),
        race_timeout_secs: 2,
        ..Default::default()
    }
}

pub fn shared(backend: ScriptedBackend) -> Arc<ScriptedBackend> {
    Arc::new(backend)
}
