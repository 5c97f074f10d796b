//! One polling cycle: fetch mentions, reply to new conversations, record replies.

mod publisher;
mod resolver;

use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, error, info, warn};
use strum::Display;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::generator::{ReplyGenerator, TextBackend};
use crate::store::ReplyStore;
use crate::types::{ConversationRoot, Mention, RunStatistics};

use resolver::resolve_root;

/// The social network as the pipeline sees it.
pub trait SocialClient {
    /// Mentions of the bot account created at or after `start_time`, in
    /// feed order. Only the first page is returned.
    fn mentions_since(
        &self,
        start_time: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Mention>>> + Send;

    /// Look up a post by id; `None` when it does not exist.
    fn fetch_post(
        &self,
        post_id: &str,
    ) -> impl Future<Output = Result<Option<ConversationRoot>>> + Send;

    /// Publish `text` as a reply to `in_reply_to_id`, returning the new post id.
    fn publish_reply(
        &self,
        text: &str,
        in_reply_to_id: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Why a mention was left unanswered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    NoConversationRoot,
    SelfRooted,
    AlreadyAnswered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MentionOutcome {
    Replied { recorded: bool },
    Skipped(SkipReason),
}

pub struct MentionPipeline<C, B, S> {
    client: C,
    generator: ReplyGenerator<B>,
    store: S,
    config: PipelineConfig,
}

impl<C, B, S> MentionPipeline<C, B, S>
where
    C: SocialClient + Sync,
    B: TextBackend + Sync,
    S: ReplyStore + Sync,
{
    pub fn new(client: C, generator: ReplyGenerator<B>, store: S, config: PipelineConfig) -> Self {
        Self {
            client,
            generator,
            store,
            config,
        }
    }

    /// Run one polling cycle against the current time.
    ///
    /// # Errors
    ///
    /// Returns an error only if the mention feed cannot be fetched.
    /// Failures on individual mentions are logged and counted instead.
    pub async fn run(&self) -> Result<RunStatistics> {
        self.run_at(Utc::now()).await
    }

    /// Run one polling cycle whose window ends at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the mention feed cannot be fetched.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunStatistics> {
        info!(
            "Starting Job: {}",
            now.to_rfc3339_opts(SecondsFormat::Secs, true)
        );

        let stats = self.respond_to_mentions(now).await?;

        info!(
            "Finished Job: {}, Found: {}, Replied: {}, Errors: {}, Skipped: {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            stats.mentions_found,
            stats.mentions_replied,
            stats.mentions_replied_errors,
            stats.mentions_skipped
        );
        if stats.records_failed > 0 {
            warn!(
                "{} published replies could not be recorded and may be repeated",
                stats.records_failed
            );
        }

        Ok(stats)
    }

    async fn respond_to_mentions(&self, now: DateTime<Utc>) -> Result<RunStatistics> {
        let start_time = now - self.config.lookback;
        let mentions = self.client.mentions_since(start_time).await?;

        let mut stats = RunStatistics {
            mentions_found: mentions.len(),
            ..RunStatistics::default()
        };
        if mentions.is_empty() {
            debug!("No mentions since {start_time}");
            return Ok(stats);
        }

        if mentions.len() > self.config.response_limit {
            info!(
                "Found {} mentions, handling the first {} this run",
                mentions.len(),
                self.config.response_limit
            );
        }

        for mention in mentions.iter().take(self.config.response_limit) {
            match self.process_mention(mention).await {
                Ok(MentionOutcome::Replied { recorded }) => {
                    stats.mentions_replied += 1;
                    if !recorded {
                        stats.records_failed += 1;
                    }
                }
                Ok(MentionOutcome::Skipped(reason)) => {
                    debug!("Skipping mention {}: {reason}", mention.id);
                    stats.mentions_skipped += 1;
                }
                Err(e) => {
                    error!("Failed to reply to mention {}: {e}", mention.id);
                    stats.mentions_replied_errors += 1;
                }
            }
        }

        Ok(stats)
    }

    async fn process_mention(&self, mention: &Mention) -> Result<MentionOutcome> {
        let Some(root) = resolve_root(&self.client, mention).await? else {
            return Ok(MentionOutcome::Skipped(SkipReason::NoConversationRoot));
        };

        // A mention that starts its own thread has nothing to reply to.
        if root.id == mention.id {
            return Ok(MentionOutcome::Skipped(SkipReason::SelfRooted));
        }

        if self.store.has_reply_for(&root.id).await? {
            return Ok(MentionOutcome::Skipped(SkipReason::AlreadyAnswered));
        }

        let reply_text = self.generator.generate(&root.text).await?;
        let reply_post_id = publisher::publish_reply(&self.client, mention, &reply_text).await?;

        let record =
            publisher::reply_record(&root, mention, reply_text, reply_post_id, Utc::now());
        let recorded = match publisher::record_reply(&self.store, &record).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    "Reply {} to conversation {} was published but not recorded: {e}",
                    record.reply_post_id, record.conversation_root_id
                );
                false
            }
        };

        Ok(MentionOutcome::Replied { recorded })
    }
}
