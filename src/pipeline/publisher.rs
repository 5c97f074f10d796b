//! Publishing a reply and recording it once it is live.

use chrono::{DateTime, Utc};
use log::info;

use crate::error::Result;
use crate::store::ReplyStore;
use crate::types::{ConversationRoot, Mention, ReplyRecord};

use super::SocialClient;

/// Post `reply_text` as a reply to `mention`. Exactly one attempt is made.
pub async fn publish_reply<C>(client: &C, mention: &Mention, reply_text: &str) -> Result<String>
where
    C: SocialClient + Sync,
{
    let post_id = client.publish_reply(reply_text, &mention.id).await?;
    info!(
        "Replied to mention {} with post {post_id}: {reply_text}",
        mention.id
    );
    Ok(post_id)
}

/// Metadata for a reply that has been published.
pub fn reply_record(
    root: &ConversationRoot,
    mention: &Mention,
    reply_text: String,
    reply_post_id: String,
    replied_at: DateTime<Utc>,
) -> ReplyRecord {
    ReplyRecord {
        conversation_root_id: root.id.clone(),
        conversation_root_text: root.text.clone(),
        reply_post_id,
        reply_text,
        replied_at,
        mentioned_at: mention.created_at,
    }
}

/// Persist `record`. Must only be called after a successful publish.
pub async fn record_reply<S>(store: &S, record: &ReplyRecord) -> Result<()>
where
    S: ReplyStore + Sync,
{
    store.insert(record).await
}
