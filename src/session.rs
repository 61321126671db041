use crate::conversation::{ConversationStore, Message};
use crate::gateway::{CompletionGateway, CompletionOptions, CompletionResult};
use crate::guardian::GuardianFilter;
use crate::models::ModelRegistry;
use crate::persona::PersonaCatalog;
use crate::race::RaceCoordinator;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Message must not be empty")]
    InvalidInput,

    #[error("No model produced a reply, please try again")]
    UpstreamUnavailable,
}

impl ResponseError for RequestError {
    fn status_code(&self) -> StatusCode {
        match self {
            RequestError::InvalidInput => StatusCode::BAD_REQUEST,
            RequestError::UpstreamUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub reply: String,
    pub model_used: String,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub total_messages: usize,
    pub max_history: usize,
    pub candidate_models: usize,
    pub guardian_models: usize,
}

/// Runs one conversational turn end to end: history, persona, race (or a
/// direct call), guardian review.
pub struct ChatSession {
    history: Arc<ConversationStore>,
    registry: ModelRegistry,
    personas: PersonaCatalog,
    gateway: CompletionGateway,
    race: RaceCoordinator,
    guardian: Option<GuardianFilter>,
    candidate_options: CompletionOptions,
}

impl ChatSession {
    pub fn new(
        history: Arc<ConversationStore>,
        registry: ModelRegistry,
        personas: PersonaCatalog,
        gateway: CompletionGateway,
        race_timeout: Duration,
        guardian_options: Option<CompletionOptions>,
        candidate_options: CompletionOptions,
    ) -> Self {
        let race = RaceCoordinator::new(gateway.clone(), race_timeout);
        let guardian = guardian_options.map(|options| {
            GuardianFilter::new(gateway.clone(), registry.guardian().id.clone(), options)
        });
        ChatSession {
            history,
            registry,
            personas,
            gateway,
            race,
            guardian,
            candidate_options,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn guardian_enabled(&self) -> bool {
        self.guardian.is_some()
    }

    pub async fn handle_turn(
        &self,
        user_text: &str,
        explicit_model: Option<&str>,
        language: Option<&str>,
    ) -> Result<TurnOutcome, RequestError> {
        if user_text.trim().is_empty() {
            return Err(RequestError::InvalidInput);
        }

        let history = self.history.push_and_snapshot(Message::user(user_text));
        let persona = self.personas.choose(language);
        log::debug!(
            "Turn with persona {} over {} history messages",
            persona.name,
            history.len()
        );

        let mut full_messages = Vec::with_capacity(history.len() + 1);
        full_messages.push(Message::system(persona.prompt));
        full_messages.extend(history);

        let result = match explicit_model {
            Some(model_id) if self.registry.is_candidate(model_id) => {
                self.invoke_direct(model_id, &full_messages).await
            }
            other => {
                if let Some(model_id) = other {
                    log::warn!("Requested model {} is not a candidate, racing instead", model_id);
                }
                self.race
                    .race(
                        Arc::from(full_messages),
                        &self.registry.candidate_ids(),
                        &self.candidate_options,
                    )
                    .await
            }
        };

        let Some(winner) = result else {
            return Err(RequestError::UpstreamUnavailable);
        };
        let model_used = winner.model_id.clone();
        let elapsed = winner.elapsed;
        let Some(raw_reply) = winner.into_reply() else {
            return Err(RequestError::UpstreamUnavailable);
        };

        let reply = match &self.guardian {
            Some(guardian) => guardian.filter(&raw_reply, persona.prompt).await,
            None => raw_reply,
        };
        self.history.push(Message::assistant(reply.clone()));

        Ok(TurnOutcome {
            reply,
            model_used,
            elapsed,
        })
    }

    async fn invoke_direct(
        &self,
        model_id: &str,
        messages: &[Message],
    ) -> Option<CompletionResult> {
        let result = self
            .gateway
            .invoke(model_id, messages, &self.candidate_options)
            .await;
        result.success().then_some(result)
    }

    pub fn clear(&self) {
        self.history.clear();
        log::info!("Conversation history cleared");
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            total_messages: self.history.len(),
            max_history: self.history.max_len(),
            candidate_models: self.registry.candidate_count(),
            guardian_models: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::gateway::{CompletionBackend, GatewayError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    const GUARDIAN: &str = "guard/free";

    /// Candidates listed in `working` reply with their own id; everything
    /// else fails. The guardian prefixes whatever it reviews.
    struct ScriptedBackend {
        working: HashSet<&'static str>,
        guardian_ok: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(
            &self,
            model_id: &str,
            messages: &[Message],
            _options: &CompletionOptions,
        ) -> Result<String, GatewayError> {
            self.calls.lock().push(model_id.to_string());
            if model_id == GUARDIAN {
                return if self.guardian_ok {
                    Ok("reviewed".to_string())
                } else {
                    Err(GatewayError::EmptyReply)
                };
            }
            assert_eq!(messages[0].role, Role::System);
            if self.working.contains(model_id) {
                Ok(format!("answer from {}", model_id))
            } else {
                Err(GatewayError::Status {
                    status: 502,
                    body: String::new(),
                })
            }
        }
    }

    fn create_test_session(
        working: &[&'static str],
        guardian_ok: bool,
        max_history: usize,
    ) -> (ChatSession, Arc<ScriptedBackend>, Arc<ConversationStore>) {
        let backend = Arc::new(ScriptedBackend {
            working: working.iter().copied().collect(),
            guardian_ok,
            calls: Mutex::new(Vec::new()),
        });
        let history = Arc::new(ConversationStore::new(max_history));
        let session = ChatSession::new(
            Arc::clone(&history),
            ModelRegistry::new(
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
                GUARDIAN.to_string(),
            ),
            PersonaCatalog::default(),
            CompletionGateway::new(backend.clone()),
            Duration::from_secs(2),
            Some(CompletionOptions::new(None, Some(0.3))),
            CompletionOptions::new(Some(512), Some(0.7)),
        );
        (session, backend, history)
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected_without_mutation() {
        let (session, backend, history) = create_test_session(&["a"], true, 40);

        let err = session.handle_turn("   ", None, None).await.unwrap_err();
        assert!(matches!(err, RequestError::InvalidInput));
        assert!(history.is_empty());
        assert!(backend.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_successful_turn_appends_user_and_assistant() {
        let (session, _, history) = create_test_session(&["b"], true, 40);

        let outcome = session.handle_turn("hi", None, None).await.unwrap();
        assert_eq!(outcome.model_used, "b");
        assert_eq!(outcome.reply, "reviewed");

        let messages = history.snapshot();
        assert_eq!(messages, vec![Message::user("hi"), Message::assistant("reviewed")]);
    }

    #[tokio::test]
    async fn test_total_failure_keeps_only_user_turn() {
        let (session, backend, history) = create_test_session(&[], true, 40);

        let err = session.handle_turn("hi", None, None).await.unwrap_err();
        assert!(matches!(err, RequestError::UpstreamUnavailable));
        assert_eq!(history.snapshot(), vec![Message::user("hi")]);
        assert!(!backend.calls.lock().iter().any(|m| m == GUARDIAN));
    }

    #[tokio::test]
    async fn test_guardian_failure_passes_reply_through() {
        let (session, _, history) = create_test_session(&["c"], false, 40);

        let outcome = session.handle_turn("hi", None, None).await.unwrap();
        assert_eq!(outcome.reply, "answer from c");
        assert_eq!(history.snapshot()[1], Message::assistant("answer from c"));
    }

    #[tokio::test]
    async fn test_explicit_candidate_skips_race() {
        let (session, backend, _) = create_test_session(&["a", "b", "c"], true, 40);

        let outcome = session.handle_turn("hi", Some("b"), None).await.unwrap();
        assert_eq!(outcome.model_used, "b");

        let calls = backend.calls.lock();
        assert_eq!(calls.as_slice(), ["b", GUARDIAN]);
    }

    #[tokio::test]
    async fn test_explicit_candidate_failure_is_upstream_error() {
        let (session, backend, history) = create_test_session(&["a"], true, 40);

        let err = session.handle_turn("hi", Some("b"), None).await.unwrap_err();
        assert!(matches!(err, RequestError::UpstreamUnavailable));
        assert_eq!(backend.calls.lock().as_slice(), ["b"]);
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_explicit_model_falls_back_to_race() {
        let (session, backend, _) = create_test_session(&["a"], true, 40);

        let outcome = session
            .handle_turn("hi", Some("not-a-candidate"), None)
            .await
            .unwrap();
        assert_eq!(outcome.model_used, "a");
        assert!(!backend.calls.lock().iter().any(|m| m == "not-a-candidate"));
    }

    #[tokio::test]
    async fn test_history_is_trimmed_to_cap() {
        let (session, _, history) = create_test_session(&["a"], false, 4);

        for i in 0..5 {
            session.handle_turn(&format!("turn {}", i), None, None).await.unwrap();
            assert!(history.len() <= 4);
        }
        let messages = history.snapshot();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Message::user("turn 3"));
    }

    #[tokio::test]
    async fn test_clear_and_stats() {
        let (session, _, _) = create_test_session(&["a"], true, 40);
        session.handle_turn("hi", None, None).await.unwrap();
        assert_eq!(session.stats().total_messages, 2);

        session.clear();
        let stats = session.stats();
        assert_eq!(stats.total_messages, 0);
        assert_eq!(stats.candidate_models, 3);
        assert_eq!(stats.guardian_models, 1);
        assert_eq!(stats.max_history, 40);
    }

    #[tokio::test]
    async fn test_disabled_guardian_is_never_called() {
        let backend = Arc::new(ScriptedBackend {
            working: ["a"].into_iter().collect(),
            guardian_ok: true,
            calls: Mutex::new(Vec::new()),
        });
        let session = ChatSession::new(
            Arc::new(ConversationStore::default()),
            ModelRegistry::new(vec!["a".to_string()], GUARDIAN.to_string()),
            PersonaCatalog::default(),
            CompletionGateway::new(backend.clone()),
            Duration::from_secs(2),
            None,
            CompletionOptions::default(),
        );

        let outcome = session.handle_turn("hi", None, None).await.unwrap();
        assert_eq!(outcome.reply, "answer from a");
        assert!(!session.guardian_enabled());
        assert_eq!(backend.calls.lock().as_slice(), ["a"]);
    }
}
