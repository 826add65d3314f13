//! Conversation view state
//!
//! Holds the ordered message list and the per-submission state machine
//! `Idle -> Sending -> Streaming -> Idle`. Every append hands back a stable
//! [`MessageId`]; the reply placeholder is always updated through its id, so
//! nothing depends on list positions.

use thiserror::Error;

use crate::persona::{APOLOGY, GREETING};
use crate::state::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u64);

#[derive(Debug, Clone)]
pub struct Entry {
    pub id: MessageId,
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Request sent, nothing received yet
    Sending,
    /// At least one fragment has arrived
    Streaming,
}

/// What a reply stream reports back to the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyEvent {
    Fragment(String),
    Done,
    Failed(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Message is empty")]
    Empty,
    #[error("Still waiting for the previous reply")]
    Busy,
}

/// An accepted user turn
#[derive(Debug, Clone)]
pub struct Submission {
    /// Placeholder the reply streams into
    pub reply_id: MessageId,
    /// Everything before the placeholder, to be sent to the relay as-is
    pub history: Vec<ChatMessage>,
}

#[derive(Debug)]
struct PendingReply {
    id: MessageId,
    accumulated: String,
}

#[derive(Debug)]
pub struct Conversation {
    entries: Vec<Entry>,
    next_id: u64,
    phase: Phase,
    pending: Option<PendingReply>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// A conversation opened by the assistant's greeting.
    pub fn new() -> Self {
        Self::with_greeting(GREETING)
    }

    pub fn with_greeting(greeting: &str) -> Self {
        let mut conversation = Self {
            entries: Vec::new(),
            next_id: 0,
            phase: Phase::Idle,
            pending: None,
        };
        conversation.push(ChatMessage::assistant(greeting));
        conversation
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter().map(|entry| &entry.message)
    }

    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.message)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Id of the placeholder currently being filled, if any.
    pub fn pending_reply(&self) -> Option<MessageId> {
        self.pending.as_ref().map(|pending| pending.id)
    }

    fn push(&mut self, message: ChatMessage) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, message });
        id
    }

    fn set_content(&mut self, id: MessageId, content: String) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == id) {
            entry.message.content = content;
        }
    }

    /// Accept a user turn.
    ///
    /// Appends the user message and an empty assistant placeholder, and
    /// returns the history to send: every message up to and including the
    /// new user message.
    pub fn submit(&mut self, input: &str) -> Result<Submission, SubmitError> {
        if input.trim().is_empty() {
            return Err(SubmitError::Empty);
        }
        if self.is_loading() {
            return Err(SubmitError::Busy);
        }

        self.push(ChatMessage::user(input));
        let history: Vec<ChatMessage> = self.messages().cloned().collect();

        let reply_id = self.push(ChatMessage::assistant(""));
        self.pending = Some(PendingReply {
            id: reply_id,
            accumulated: String::new(),
        });
        self.phase = Phase::Sending;

        Ok(Submission { reply_id, history })
    }

    /// Apply one reply event to the placeholder `id`.
    ///
    /// Events for anything but the pending placeholder are ignored.
    pub fn apply(&mut self, id: MessageId, event: ReplyEvent) {
        let Some(pending) = self.pending.as_mut().filter(|pending| pending.id == id) else {
            tracing::debug!(?id, ?event, "Ignoring reply event for a finished message");
            return;
        };

        match event {
            ReplyEvent::Fragment(content) => {
                if content.is_empty() {
                    return;
                }
                pending.accumulated.push_str(&content);
                let snapshot = pending.accumulated.clone();
                self.set_content(id, snapshot);
                self.phase = Phase::Streaming;
            }
            ReplyEvent::Done => {
                self.pending = None;
                self.phase = Phase::Idle;
            }
            ReplyEvent::Failed(reason) => {
                tracing::warn!(reason = %reason, "Reply failed");
                self.set_content(id, APOLOGY.to_string());
                self.pending = None;
                self.phase = Phase::Idle;
            }
        }
    }
}
