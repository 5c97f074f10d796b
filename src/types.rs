//! Common types shared by the pipeline, the clients and the stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message sent to the text-generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Persona and style instructions
    System,
    /// The conversation text to respond to
    User,
}

/// A post that mentions the bot account, as returned by the mention feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub id: String,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Id of the post that started the thread, when the feed exposes one.
    pub conversation_root_id: Option<String>,
    pub raw_text: String,
}

impl Mention {
    /// True when the mention is itself the first post of its thread.
    #[must_use]
    pub fn is_self_rooted(&self) -> bool {
        self.conversation_root_id.as_deref() == Some(self.id.as_str())
    }
}

/// The first post of the thread a mention belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRoot {
    pub id: String,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Persisted proof that a conversation root has been answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRecord {
    pub conversation_root_id: String,
    pub conversation_root_text: String,
    pub reply_post_id: String,
    pub reply_text: String,
    pub replied_at: DateTime<Utc>,
    pub mentioned_at: DateTime<Utc>,
}

/// Counters for a single pipeline run. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Mentions returned by the feed, before truncation.
    pub mentions_found: usize,
    pub mentions_replied: usize,
    pub mentions_replied_errors: usize,
    pub mentions_skipped: usize,
    /// Replies that were published but could not be recorded.
    pub records_failed: usize,
}

impl RunStatistics {
    /// Number of mentions the run actually looked at.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.mentions_replied + self.mentions_replied_errors + self.mentions_skipped
    }
}
