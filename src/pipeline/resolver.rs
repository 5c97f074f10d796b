//! Maps a mention to the first post of its thread.

use log::debug;

use crate::error::Result;
use crate::types::{ConversationRoot, Mention};

use super::SocialClient;

/// Resolve the conversation root of `mention`.
///
/// Returns `Ok(None)` when the mention has no root reference or the root
/// post no longer exists. A self-rooted mention resolves to itself without a
/// remote call.
pub async fn resolve_root<C>(client: &C, mention: &Mention) -> Result<Option<ConversationRoot>>
where
    C: SocialClient + Sync,
{
    let Some(root_id) = mention.conversation_root_id.as_deref() else {
        debug!("Mention {} has no conversation reference", mention.id);
        return Ok(None);
    };

    if mention.is_self_rooted() {
        return Ok(Some(ConversationRoot {
            id: mention.id.clone(),
            text: mention.raw_text.clone(),
            created_at: Some(mention.created_at),
        }));
    }

    let root = client.fetch_post(root_id).await?;
    if root.is_none() {
        debug!(
            "Conversation root {root_id} for mention {} was not found",
            mention.id
        );
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::testing::FakeSocial;

    fn mention(id: &str, root: Option<&str>) -> Mention {
        Mention {
            id: id.to_string(),
            author: Some("42".to_string()),
            created_at: Utc::now(),
            conversation_root_id: root.map(str::to_string),
            raw_text: "@bot thoughts?".to_string(),
        }
    }

    #[tokio::test]
    async fn no_reference_resolves_to_none() -> Result<()> {
        let social = FakeSocial::default();
        assert_eq!(resolve_root(&social, &mention("100", None)).await?, None);
        assert!(social.fetched().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn self_rooted_mention_needs_no_fetch() -> Result<()> {
        let social = FakeSocial::default();
        let root = resolve_root(&social, &mention("100", Some("100"))).await?;
        assert_eq!(root.map(|r| r.id), Some("100".to_string()));
        assert!(social.fetched().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn fetches_distinct_root() -> Result<()> {
        let social = FakeSocial::default().with_post("50", "AI will replace X");
        let root = resolve_root(&social, &mention("100", Some("50"))).await?;
        assert_eq!(root.map(|r| r.text), Some("AI will replace X".to_string()));
        assert_eq!(social.fetched(), vec!["50".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn missing_root_post_is_not_an_error() -> Result<()> {
        let social = FakeSocial::default();
        assert_eq!(resolve_root(&social, &mention("100", Some("50"))).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn fetch_failures_propagate() {
        let social = FakeSocial::default().fail_fetch_for("50");
        assert!(resolve_root(&social, &mention("100", Some("50"))).await.is_err());
    }
}
