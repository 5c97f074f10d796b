//! Twitter API v2 payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BotError;
use crate::types::{ConversationRoot, Mention};

/// Envelope shared by every v2 response.
#[derive(Debug, Deserialize)]
pub(super) struct ApiResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiError {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        self.error_type
            .as_deref()
            .is_some_and(|t| t.ends_with("resource-not-found"))
            || self.title.as_deref() == Some("Not Found Error")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.title, &self.detail) {
            (Some(title), Some(detail)) => write!(f, "{title}: {detail}"),
            (Some(message), None) | (None, Some(message)) => f.write_str(message),
            (None, None) => f.write_str("unknown error"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct Tweet {
    pub id: String,
    pub text: String,
    pub author_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub referenced_tweets: Vec<ReferencedTweet>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReferencedTweet {
    #[serde(rename = "type")]
    pub ref_type: String,
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct User {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateTweetRequest<'a> {
    pub text: &'a str,
    pub reply: ReplySettings<'a>,
}

#[derive(Debug, Serialize)]
pub(super) struct ReplySettings<'a> {
    pub in_reply_to_tweet_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreatedTweet {
    pub id: String,
}

impl Tweet {
    /// The thread root: the conversation id when present, otherwise the post
    /// this one replies to.
    fn root_reference(&self) -> Option<String> {
        self.conversation_id.clone().or_else(|| {
            self.referenced_tweets
                .iter()
                .find(|r| r.ref_type == "replied_to")
                .map(|r| r.id.clone())
        })
    }
}

impl TryFrom<Tweet> for Mention {
    type Error = BotError;

    fn try_from(tweet: Tweet) -> Result<Self, Self::Error> {
        let conversation_root_id = tweet.root_reference();
        let created_at = tweet.created_at.ok_or_else(|| {
            BotError::TwitterResponse(format!("Mention {} has no created_at", tweet.id))
        })?;
        Ok(Mention {
            id: tweet.id,
            author: tweet.author_id,
            created_at,
            conversation_root_id,
            raw_text: tweet.text,
        })
    }
}

impl From<Tweet> for ConversationRoot {
    fn from(tweet: Tweet) -> Self {
        ConversationRoot {
            id: tweet.id,
            text: tweet.text,
            created_at: tweet.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_mentions_page() -> Result<(), BotError> {
        let body = r#"{
            "data": [
                {
                    "id": "100",
                    "text": "@bot what do you think?",
                    "author_id": "42",
                    "created_at": "2024-05-01T12:30:00.000Z",
                    "conversation_id": "50",
                    "referenced_tweets": [{"type": "replied_to", "id": "60"}]
                },
                {
                    "id": "101",
                    "text": "@bot hello",
                    "created_at": "2024-05-01T12:31:00.000Z",
                    "referenced_tweets": [
                        {"type": "quoted", "id": "70"},
                        {"type": "replied_to", "id": "71"}
                    ]
                },
                {
                    "id": "102",
                    "text": "@bot standalone",
                    "created_at": "2024-05-01T12:32:00.000Z"
                }
            ],
            "meta": {"result_count": 3, "newest_id": "102", "oldest_id": "100"}
        }"#;
        let page: ApiResponse<Vec<Tweet>> = serde_json::from_str(body)?;
        let mentions = page
            .data
            .unwrap_or_default()
            .into_iter()
            .map(Mention::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        assert_eq!(mentions.len(), 3);
        assert_eq!(mentions[0].conversation_root_id.as_deref(), Some("50"));
        assert_eq!(mentions[0].author.as_deref(), Some("42"));
        assert_eq!(mentions[1].conversation_root_id.as_deref(), Some("71"));
        assert_eq!(mentions[2].conversation_root_id, None);
        Ok(())
    }

    #[test]
    fn empty_page_has_no_data() -> Result<(), BotError> {
        let page: ApiResponse<Vec<Tweet>> =
            serde_json::from_str(r#"{"meta": {"result_count": 0}}"#)?;
        assert!(page.data.is_none());
        assert!(page.errors.is_empty());
        Ok(())
    }

    #[test]
    fn mention_without_timestamp_is_rejected() -> Result<(), BotError> {
        let tweet: Tweet = serde_json::from_str(r#"{"id": "5", "text": "@bot"}"#)?;
        assert!(Mention::try_from(tweet).is_err());
        Ok(())
    }

    #[test]
    fn recognises_not_found_errors() -> Result<(), BotError> {
        let body = r#"{
            "errors": [{
                "value": "50",
                "detail": "Could not find tweet with id: [50].",
                "title": "Not Found Error",
                "resource_type": "tweet",
                "parameter": "id",
                "resource_id": "50",
                "type": "https://api.twitter.com/2/problems/resource-not-found"
            }]
        }"#;
        let response: ApiResponse<Tweet> = serde_json::from_str(body)?;
        assert!(response.data.is_none());
        assert!(response.errors.iter().all(ApiError::is_not_found));
        assert_eq!(
            response.errors[0].to_string(),
            "Not Found Error: Could not find tweet with id: [50]."
        );
        Ok(())
    }

    #[test]
    fn reply_request_shape() -> Result<(), BotError> {
        let request = CreateTweetRequest {
            text: "Bold prediction.",
            reply: ReplySettings {
                in_reply_to_tweet_id: "100",
            },
        };
        let value = serde_json::to_value(&request)?;
        assert_eq!(value["reply"]["in_reply_to_tweet_id"], "100");
        assert_eq!(value["text"], "Bold prediction.");
        Ok(())
    }
}
