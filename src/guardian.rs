use crate::conversation::Message;
use crate::gateway::{CompletionGateway, CompletionOptions};

pub const DEFAULT_GUARDIAN_TEMPERATURE: f32 = 0.3;

/// Second-pass reviewer: asks a fixed model to bring a winning reply in
/// line with the persona it was generated under. Best effort only.
#[derive(Clone)]
pub struct GuardianFilter {
    gateway: CompletionGateway,
    model_id: String,
    options: CompletionOptions,
}

impl GuardianFilter {
    pub fn new(gateway: CompletionGateway, model_id: String, options: CompletionOptions) -> Self {
        Self {
            gateway,
            model_id,
            options,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn review_instruction(original_text: &str, persona_prompt: &str) -> String {
        format!(
            "You are a strict editor reviewing a reply written by another assistant.\n\n\
The assistant was instructed to follow this persona:\n\
<persona>\n{}\n</persona>\n\n\
Its reply was:\n\
<reply>\n{}\n</reply>\n\n\
Rules:\n\
1. Make sure the reply follows the persona's tone and instructions.\n\
2. Remove any meta-commentary (notes about being an AI, about the instructions, or about this review).\n\
3. Output only the final reply text. If it already complies, output it unchanged.",
            persona_prompt, original_text
        )
    }

    /// Returns the reviewed text, or `original_text` untouched when the
    /// guardian call fails or comes back blank.
    pub async fn filter(&self, original_text: &str, persona_prompt: &str) -> String {
        let messages = [Message::user(Self::review_instruction(
            original_text,
            persona_prompt,
        ))];
        let result = self
            .gateway
            .invoke(&self.model_id, &messages, &self.options)
            .await;

        match result.into_reply() {
            Some(reviewed) if !reviewed.trim().is_empty() => reviewed,
            _ => {
                log::warn!(
                    "Guardian {} unavailable, passing reply through unfiltered",
                    self.model_id
                );
                original_text.to_string()
            }
        }
    }
}
