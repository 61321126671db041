use crate::session::{SessionStats, TurnOutcome};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize)]
pub struct ChatReqInput {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl ChatReqInput {
    /// Explicit model, ignoring the empty selection browsers send.
    pub fn requested_model(&self) -> Option<&str> {
        self.model.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ChatRespOutput {
    pub reply: String,
    pub model_used: String,
    pub response_time: String,
}

pub fn format_response_time(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}

impl From<TurnOutcome> for ChatRespOutput {
    fn from(outcome: TurnOutcome) -> Self {
        ChatRespOutput {
            reply: outcome.reply,
            model_used: outcome.model_used,
            response_time: format_response_time(outcome.elapsed),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MessageOutput {
    pub message: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ModelsOutput {
    pub candidates: Vec<String>,
    pub guardian: String,
    pub guardian_enabled: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StatsOutput {
    pub total_messages: usize,
    pub max_history: usize,
    pub candidate_models: usize,
    pub guardian_models: usize,
}

impl From<SessionStats> for StatsOutput {
    fn from(stats: SessionStats) -> Self {
        StatsOutput {
            total_messages: stats.total_messages,
            max_history: stats.max_history,
            candidate_models: stats.candidate_models,
            guardian_models: stats.guardian_models,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HealthOutput {
    pub status: String,
    pub models: usize,
}
