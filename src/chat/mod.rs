//! Demo coastal alert assistant.
//!
//! Replies are canned and arrive after a simulated "typing" delay.

mod replies;

pub use replies::*;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

pub const MAX_MESSAGE_CHARS: usize = 1000;
pub const DEFAULT_MAX_CONVERSATIONS: usize = 256;

const GREETING: &str = "Hello! I can help you check coastal hazard alerts for any location. Enter a location name or coordinates.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_level: Option<AlertLevel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

/// Chat error types.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("message is {0} characters, limit is {1}")]
    TooLong(usize, usize),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatHistory {
    pub messages: Vec<ChatMessage>,
    pub is_typing: bool,
}

struct Conversation {
    messages: Vec<ChatMessage>,
    last_id: u64,
    pending: usize,
    /// Value of the service clock at the last send
    last_active: u64,
}

impl Conversation {
    fn new() -> Self {
        let mut conv = Self {
            messages: Vec::new(),
            last_id: 0,
            pending: 0,
            last_active: 0,
        };
        conv.push(Role::Assistant, GREETING.to_string(), None);
        conv
    }

    fn push(&mut self, role: Role, content: String, reply: Option<&Reply>) -> ChatMessage {
        self.last_id += 1;
        let msg = ChatMessage {
            id: self.last_id,
            role,
            content,
            timestamp: Utc::now(),
            location: reply.and_then(|r| r.location).map(str::to_string),
            alert_level: reply.and_then(|r| r.alert_level),
            sources: reply
                .map(|r| r.sources.iter().map(|s| s.to_string()).collect())
                .unwrap_or_default(),
        };
        self.messages.push(msg.clone());
        msg
    }

    fn history(&self) -> ChatHistory {
        ChatHistory {
            messages: self.messages.clone(),
            is_typing: self.pending > 0,
        }
    }
}

#[derive(Default)]
struct Conversations {
    by_name: HashMap<String, Conversation>,
    clock: u64,
}

impl Conversations {
    /// Get or create `name`, dropping the least recently active conversation
    /// when a new one would exceed `max`.
    fn activate(&mut self, name: &str, max: usize) -> &mut Conversation {
        self.clock += 1;

        if !self.by_name.contains_key(name) && self.by_name.len() >= max {
            let oldest = self
                .by_name
                .iter()
                .min_by_key(|(_, conv)| conv.last_active)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                self.by_name.remove(&key);
                tracing::debug!("ChatService: Dropped idle conversation {}", key);
            }
        }

        let conv = self.by_name.entry(name.to_string()).or_insert_with(Conversation::new);
        conv.last_active = self.clock;
        conv
    }
}

/// Session-wide set of assistant conversations, keyed by name.
pub struct ChatService {
    conversations: Arc<RwLock<Conversations>>,
    reply_delay_ms: RangeInclusive<u64>,
    max_conversations: usize,
}

impl ChatService {
    pub fn new(reply_delay_ms: RangeInclusive<u64>) -> Self {
        Self {
            conversations: Arc::new(RwLock::new(Conversations::default())),
            reply_delay_ms,
            max_conversations: DEFAULT_MAX_CONVERSATIONS,
        }
    }

    /// Keep at most `max` conversations; the least recently active is dropped first.
    pub fn with_max_conversations(mut self, max: usize) -> Self {
        self.max_conversations = max.max(1);
        self
    }

    /// Append a user message and schedule the assistant's reply.
    pub async fn send(&self, conversation: &str, content: &str) -> Result<ChatMessage, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let chars = content.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(ChatError::TooLong(chars, MAX_MESSAGE_CHARS));
        }

        let (delay, reply) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(self.reply_delay_ms.clone()), pick_reply(content, &mut rng))
        };

        let user_msg = {
            let mut conversations = self.conversations.write().await;
            let conv = conversations.activate(conversation, self.max_conversations);
            conv.pending += 1;
            conv.push(Role::User, content.to_string(), None)
        };

        let conversations = self.conversations.clone();
        let key = conversation.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;

            let mut conversations = conversations.write().await;
            // Gone if it was dropped while the reply was pending
            if let Some(conv) = conversations.by_name.get_mut(&key) {
                conv.pending = conv.pending.saturating_sub(1);
                conv.push(Role::Assistant, reply.content.to_string(), Some(&reply));
            }
        });

        Ok(user_msg)
    }

    /// Messages of a conversation in id order. Unknown conversations show the greeting.
    pub async fn history(&self, conversation: &str) -> ChatHistory {
        match self.conversations.read().await.by_name.get(conversation) {
            Some(conv) => conv.history(),
            None => Conversation::new().history(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_reply_arrives_after_delay() {
        let chat = ChatService::new(1000..=2000);
        let sent = chat.send("coast", "Any tsunami risk today?").await.unwrap();
        assert_eq!(sent.id, 2);
        assert_eq!(sent.role, Role::User);

        let pending = chat.history("coast").await;
        assert!(pending.is_typing);
        assert_eq!(pending.messages.len(), 2);

        tokio::time::sleep(Duration::from_millis(2001)).await;

        let done = chat.history("coast").await;
        assert!(!done.is_typing);
        assert_eq!(done.messages.len(), 3);

        let reply = &done.messages[2];
        assert_eq!(reply.id, 3);
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, REPLIES[7].content);
        assert!(!reply.sources.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_strictly_increase() {
        let chat = ChatService::new(50..=50);
        for text in ["first", "second", "third"] {
            chat.send("ids", text).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        let history = chat.history("ids").await;
        assert_eq!(history.messages.len(), 7);
        assert!(history.messages.windows(2).all(|w| w[1].id > w[0].id));
    }

    #[tokio::test]
    async fn test_blank_and_oversized_messages_are_rejected() {
        let chat = ChatService::new(0..=0);
        assert!(matches!(chat.send("c", "   ").await, Err(ChatError::EmptyMessage)));

        let long = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(matches!(chat.send("c", &long).await, Err(ChatError::TooLong(_, _))));
    }

    #[test]
    fn test_unknown_conversation_shows_greeting() {
        let chat = ChatService::new(0..=0);
        let history = tokio_test::block_on(chat.history("nobody"));
        assert_eq!(history.messages.len(), 1);
        assert_eq!(history.messages[0].role, Role::Assistant);
        assert!(!history.is_typing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_least_recently_active_conversation_is_dropped() {
        let chat = ChatService::new(10..=10).with_max_conversations(2);
        chat.send("a", "hello").await.unwrap();
        chat.send("b", "hello").await.unwrap();
        chat.send("a", "again").await.unwrap();
        chat.send("c", "hello").await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;

        // "b" was the least recently active when "c" arrived
        assert_eq!(chat.history("b").await.messages.len(), 1);
        assert_eq!(chat.history("a").await.messages.len(), 5);
        assert_eq!(chat.history("c").await.messages.len(), 3);
        assert_eq!(chat.conversations.read().await.by_name.len(), 2);
    }
}
