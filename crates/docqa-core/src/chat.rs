//! Chat transcript for a single document conversation.
//!
//! The transcript is append-only apart from the pending placeholder, which is
//! shown while a question is in flight and removed when the answer (or the
//! error) arrives.

use std::fmt::Display;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A chat message in the document conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Local>,
    /// Set only on the placeholder shown while awaiting an answer.
    #[serde(default)]
    pub pending: bool,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    AwaitingResponse,
}

#[derive(Debug)]
pub struct Transcript {
    document_name: Option<String>,
    messages: Vec<ChatMessage>,
    next_id: u64,
    state: ChatState,
}

impl Transcript {
    pub fn new(document_name: Option<&str>) -> Self {
        let mut transcript = Self {
            document_name: document_name.map(str::to_string),
            messages: Vec::new(),
            next_id: 1,
            state: ChatState::Idle,
        };
        transcript.push_greeting();
        transcript
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn is_awaiting(&self) -> bool {
        self.state == ChatState::AwaitingResponse
    }

    /// Number of messages excluding the pending placeholder.
    pub fn len_settled(&self) -> usize {
        self.messages.iter().filter(|m| !m.pending).count()
    }

    /// Append the user's question and the pending placeholder.
    ///
    /// Returns the question to send, or `None` when the text is blank or a
    /// question is already in flight.
    pub fn submit(&mut self, text: &str) -> Option<String> {
        if text.trim().is_empty() || self.is_awaiting() {
            return None;
        }

        self.push(ChatRole::User, text.to_string(), false);
        self.push(ChatRole::Assistant, String::new(), true);
        self.state = ChatState::AwaitingResponse;

        Some(text.to_string())
    }

    /// Replace the placeholder with the answer, or with an apology carrying the error.
    pub fn resolve<E: Display>(&mut self, result: Result<String, E>) {
        if !self.is_awaiting() {
            return;
        }

        self.messages.retain(|m| !m.pending);
        let content = match result {
            Ok(answer) => answer,
            Err(err) => format!("Sorry, I encountered an error: {}", err),
        };
        self.push(ChatRole::Assistant, content, false);
        self.state = ChatState::Idle;
    }

    /// Drop everything but a fresh greeting. Refused while awaiting an answer.
    pub fn clear(&mut self) -> bool {
        if self.is_awaiting() {
            return false;
        }
        self.messages.clear();
        self.push_greeting();
        true
    }

    fn push_greeting(&mut self) {
        let greeting = format!(
            "Hello! I'm ready to help you with \"{}\". Ask me anything about the content.",
            self.document_name.as_deref().unwrap_or("your document")
        );
        self.push(ChatRole::Assistant, greeting, false);
    }

    fn push(&mut self, role: ChatRole, content: String, pending: bool) {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id,
            role,
            content,
            timestamp: Local::now(),
            pending,
        });
    }
}
