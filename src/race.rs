use crate::conversation::Message;
use crate::gateway::{CompletionGateway, CompletionOptions, CompletionResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

pub const DEFAULT_RACE_TIMEOUT: Duration = Duration::from_secs(10);

/// Fans one prompt out to every candidate and keeps the first success.
#[derive(Clone)]
pub struct RaceCoordinator {
    gateway: CompletionGateway,
    timeout: Duration,
}

impl RaceCoordinator {
    pub fn new(gateway: CompletionGateway, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the first successful result, or `None` if every candidate
    /// failed or the overall timeout elapsed first. Losing tasks are
    /// aborted and drained before this returns.
    pub async fn race(
        &self,
        messages: Arc<[Message]>,
        candidates: &[String],
        options: &CompletionOptions,
    ) -> Option<CompletionResult> {
        if candidates.is_empty() {
            log::warn!("Race requested with no candidate models");
            return None;
        }

        let deadline = Instant::now() + self.timeout;
        let mut tasks = JoinSet::new();
        for model_id in candidates {
            let gateway = self.gateway.clone();
            let messages = Arc::clone(&messages);
            let options = options.clone();
            let model_id = model_id.clone();
            tasks.spawn(async move { gateway.invoke(&model_id, &messages, &options).await });
        }

        let winner = loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok(result))) if result.success() => break Some(result),
                Ok(Some(Ok(result))) => {
                    log::debug!(
                        "Candidate {} dropped out of the race: {}",
                        result.model_id,
                        result.failure_reason().unwrap_or("unknown failure")
                    );
                }
                Ok(Some(Err(e))) => {
                    log::error!("Candidate task did not complete: {}", e);
                }
                Ok(None) => {
                    log::warn!("All {} candidates failed", candidates.len());
                    break None;
                }
                Err(_) => {
                    log::warn!(
                        "Race timed out after {:.1}s with {} candidates outstanding",
                        self.timeout.as_secs_f64(),
                        tasks.len()
                    );
                    break None;
                }
            }
        };

        tasks.abort_all();
        while tasks.join_next().await.is_some() {}

        if let Some(result) = &winner {
            log::info!(
                "Race won by {} in {:.2}s",
                result.model_id,
                result.elapsed.as_secs_f64()
            );
        }
        winner
    }
}
