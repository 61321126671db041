use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_MAX_HISTORY: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged entry of the conversational timeline, in the
/// OpenAI chat wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Process-wide conversation history.
///
/// Every mutation happens under one lock, so concurrent requests never
/// observe a half-trimmed log. The log is bounded: once it grows past
/// `max_len` the oldest entries are evicted first.
#[derive(Debug)]
pub struct ConversationStore {
    messages: Mutex<VecDeque<Message>>,
    max_len: usize,
}

impl ConversationStore {
    pub fn new(max_len: usize) -> Self {
        ConversationStore {
            messages: Mutex::new(VecDeque::with_capacity(max_len + 1)),
            max_len,
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn push(&self, message: Message) {
        let mut messages = self.messages.lock();
        messages.push_back(message);
        Self::trim_locked(&mut messages, self.max_len);
    }

    /// Appends `message` and returns the resulting history in one critical
    /// section, so the caller's prompt always contains its own turn.
    pub fn push_and_snapshot(&self, message: Message) -> Vec<Message> {
        let mut messages = self.messages.lock();
        messages.push_back(message);
        Self::trim_locked(&mut messages, self.max_len);
        messages.iter().cloned().collect()
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }

    fn trim_locked(messages: &mut VecDeque<Message>, max_len: usize) {
        while messages.len() > max_len {
            messages.pop_front();
        }
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        ConversationStore::new(DEFAULT_MAX_HISTORY)
    }
}
