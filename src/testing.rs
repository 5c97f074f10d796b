//! In-memory fakes for the pipeline's remote collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, TimeZone, Utc};

use crate::error::{BotError, Result};
use crate::generator::TextBackend;
use crate::openrouter::Message;
use crate::pipeline::SocialClient;
use crate::store::ReplyStore;
use crate::types::{ConversationRoot, Mention, MessageRole, ReplyRecord};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn mentioned_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0)
        .single()
        .unwrap_or_default()
}

pub fn mention(id: &str, root: Option<&str>) -> Mention {
    Mention {
        id: id.to_string(),
        author: Some("42".to_string()),
        created_at: mentioned_at(),
        conversation_root_id: root.map(str::to_string),
        raw_text: format!("@bot what about this? ({id})"),
    }
}

pub fn record_for(conversation_root_id: &str) -> ReplyRecord {
    ReplyRecord {
        conversation_root_id: conversation_root_id.to_string(),
        conversation_root_text: "earlier".to_string(),
        reply_post_id: format!("r{conversation_root_id}"),
        reply_text: "Already said it.".to_string(),
        replied_at: mentioned_at(),
        mentioned_at: mentioned_at(),
    }
}

#[derive(Default)]
struct SocialState {
    mentions: Vec<Mention>,
    posts: HashMap<String, ConversationRoot>,
    fail_feed: bool,
    fail_fetch: HashSet<String>,
    fail_publish: HashSet<String>,
    next_post_id: u64,
    window_starts: Vec<DateTime<Utc>>,
    fetched: Vec<String>,
    published: Vec<(String, String)>,
}

#[derive(Clone, Default)]
pub struct FakeSocial {
    state: Arc<Mutex<SocialState>>,
}

impl FakeSocial {
    pub fn with_mentions(self, mentions: Vec<Mention>) -> Self {
        lock(&self.state).mentions = mentions;
        self
    }

    pub fn with_post(self, id: &str, text: &str) -> Self {
        lock(&self.state).posts.insert(
            id.to_string(),
            ConversationRoot {
                id: id.to_string(),
                text: text.to_string(),
                created_at: None,
            },
        );
        self
    }

    pub fn with_next_post_id(self, id: u64) -> Self {
        lock(&self.state).next_post_id = id;
        self
    }

    pub fn fail_feed(self) -> Self {
        lock(&self.state).fail_feed = true;
        self
    }

    pub fn fail_fetch_for(self, post_id: &str) -> Self {
        lock(&self.state).fail_fetch.insert(post_id.to_string());
        self
    }

    pub fn fail_publish_to(self, in_reply_to_id: &str) -> Self {
        lock(&self.state)
            .fail_publish
            .insert(in_reply_to_id.to_string());
        self
    }

    pub fn window_starts(&self) -> Vec<DateTime<Utc>> {
        lock(&self.state).window_starts.clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        lock(&self.state).fetched.clone()
    }

    /// `(reply text, in-reply-to id)` for every successful publish.
    pub fn published(&self) -> Vec<(String, String)> {
        lock(&self.state).published.clone()
    }
}

impl SocialClient for FakeSocial {
    async fn mentions_since(&self, start_time: DateTime<Utc>) -> Result<Vec<Mention>> {
        let mut state = lock(&self.state);
        state.window_starts.push(start_time);
        if state.fail_feed {
            return Err(BotError::TwitterResponse("feed unavailable".to_string()));
        }
        Ok(state.mentions.clone())
    }

    async fn fetch_post(&self, post_id: &str) -> Result<Option<ConversationRoot>> {
        let mut state = lock(&self.state);
        state.fetched.push(post_id.to_string());
        if state.fail_fetch.contains(post_id) {
            return Err(BotError::TwitterResponse(format!("lookup of {post_id} failed")));
        }
        Ok(state.posts.get(post_id).cloned())
    }

    async fn publish_reply(&self, text: &str, in_reply_to_id: &str) -> Result<String> {
        let mut state = lock(&self.state);
        if state.fail_publish.contains(in_reply_to_id) {
            return Err(BotError::TwitterResponse("duplicate content".to_string()));
        }
        let id = state.next_post_id;
        state.next_post_id += 1;
        state
            .published
            .push((text.to_string(), in_reply_to_id.to_string()));
        Ok(id.to_string())
    }
}

#[derive(Default)]
struct BackendState {
    reply: Option<String>,
    calls: Vec<(Vec<Message>, f32)>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    pub fn replying(reply: &str) -> Self {
        let backend = Self::default();
        lock(&backend.state).reply = Some(reply.to_string());
        backend
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(Vec<Message>, f32)> {
        lock(&self.state).calls.clone()
    }

    /// The user message of every call, in order.
    pub fn user_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .flat_map(|(messages, _)| messages)
            .filter(|message| message.role == MessageRole::User)
            .map(|message| message.content)
            .collect()
    }
}

impl TextBackend for FakeBackend {
    async fn complete(&self, messages: &[Message], temperature: f32) -> Result<String> {
        let mut state = lock(&self.state);
        state.calls.push((messages.to_vec(), temperature));
        state
            .reply
            .clone()
            .ok_or_else(|| BotError::OpenRouterResponse("backend unavailable".to_string()))
    }
}

#[derive(Default)]
struct StoreState {
    records: Vec<ReplyRecord>,
    lookups: Vec<String>,
    fail_lookups: bool,
    fail_inserts: bool,
}

#[derive(Clone, Default)]
pub struct FakeStore {
    state: Arc<Mutex<StoreState>>,
}

impl FakeStore {
    pub fn with_records(records: Vec<ReplyRecord>) -> Self {
        let store = Self::default();
        lock(&store.state).records = records;
        store
    }

    pub fn failing_lookups(self) -> Self {
        lock(&self.state).fail_lookups = true;
        self
    }

    pub fn failing_inserts(self) -> Self {
        lock(&self.state).fail_inserts = true;
        self
    }

    pub fn records(&self) -> Vec<ReplyRecord> {
        lock(&self.state).records.clone()
    }

    pub fn lookups(&self) -> Vec<String> {
        lock(&self.state).lookups.clone()
    }
}

impl ReplyStore for FakeStore {
    async fn has_reply_for(&self, conversation_root_id: &str) -> Result<bool> {
        let mut state = lock(&self.state);
        state.lookups.push(conversation_root_id.to_string());
        if state.fail_lookups {
            return Err(BotError::S3("connection reset".to_string()));
        }
        Ok(state
            .records
            .iter()
            .any(|record| record.conversation_root_id == conversation_root_id))
    }

    async fn insert(&self, record: &ReplyRecord) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_inserts {
            return Err(BotError::S3("access denied".to_string()));
        }
        state.records.push(record.clone());
        Ok(())
    }
}
