//! Signed HTTP client for the Twitter API v2.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use reqwest::{Method, Response, StatusCode, header::HeaderMap};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

use crate::error::{BotError, Result};
use crate::pipeline::SocialClient;
use crate::types::{ConversationRoot, Mention};

use super::models::{
    ApiError, ApiResponse, CreateTweetRequest, CreatedTweet, ReplySettings, Tweet, User,
};
use super::oauth::OAuthCredentials;

const TWITTER_API_BASE: &str = "https://api.twitter.com/2";

// Largest page the mentions endpoint returns; later pages are not fetched.
const MENTIONS_PAGE_SIZE: &str = "100";

const MIN_RATE_LIMIT_WAIT: Duration = Duration::from_secs(1);
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(15 * 60);
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

pub struct TwitterClient {
    client: reqwest::Client,
    credentials: OAuthCredentials,
    api_base: String,
    user_id: OnceCell<String>,
}

impl TwitterClient {
    #[must_use]
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            api_base: TWITTER_API_BASE.to_string(),
            user_id: OnceCell::new(),
        }
    }

    /// Id of the authenticated account, looked up once per process.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the response is
    /// malformed.
    pub async fn user_id(&self) -> Result<&str> {
        let id = self
            .user_id
            .get_or_try_init(|| async {
                let url = format!("{}/users/me", self.api_base);
                let response = self.send(Method::GET, &url, &[], None).await?;
                let user: User = Self::decode(response)
                    .await?
                    .ok_or_else(|| BotError::TwitterResponse("No user data returned".to_string()))?;
                info!("Authenticated as @{} (ID: {})", user.username, user.id);
                Ok::<_, BotError>(user.id)
            })
            .await?;
        Ok(id.as_str())
    }

    /// Send a signed request, waiting out rate limits instead of failing.
    async fn send(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> Result<Response> {
        let full_url = if params.is_empty() {
            url.to_string()
        } else {
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            format!("{url}?{query}")
        };

        loop {
            let auth_header = self
                .credentials
                .authorization_header(method.as_str(), url, params)?;

            let mut request = self
                .client
                .request(method.clone(), &full_url)
                .header(reqwest::header::AUTHORIZATION, auth_header);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            let wait = rate_limit_wait(response.headers(), Utc::now());
            warn!(
                "Twitter rate limit hit on {} {}, waiting {}s",
                method,
                url,
                wait.as_secs()
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Decode a v2 response. Any non-2xx status is an error.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<Option<T>> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            return Err(BotError::TwitterApi { status, message });
        }

        let body: ApiResponse<T> = response.json().await?;
        into_data(body)
    }

    /// Decode a single-resource lookup, where a 404 means the resource is gone.
    async fn decode_lookup<T: DeserializeOwned>(response: Response) -> Result<Option<T>> {
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(response).await
    }
}

impl SocialClient for TwitterClient {
    async fn mentions_since(&self, start_time: DateTime<Utc>) -> Result<Vec<Mention>> {
        let user_id = self.user_id().await?;
        let url = format!("{}/users/{user_id}/mentions", self.api_base);
        let start_time = format_start_time(start_time);
        let params = [
            ("expansions", "referenced_tweets.id"),
            ("max_results", MENTIONS_PAGE_SIZE),
            ("start_time", start_time.as_str()),
            ("tweet.fields", "created_at,author_id,conversation_id"),
        ];

        debug!("Fetching mentions since {start_time}");
        let response = self.send(Method::GET, &url, &params, None).await?;
        let tweets: Vec<Tweet> = Self::decode(response).await?.unwrap_or_default();
        tweets.into_iter().map(Mention::try_from).collect()
    }

    async fn fetch_post(&self, post_id: &str) -> Result<Option<ConversationRoot>> {
        let url = format!("{}/tweets/{post_id}", self.api_base);
        let params = [("tweet.fields", "created_at")];
        let response = self.send(Method::GET, &url, &params, None).await?;
        let tweet: Option<Tweet> = Self::decode_lookup(response).await?;
        Ok(tweet.map(ConversationRoot::from))
    }

    async fn publish_reply(&self, text: &str, in_reply_to_id: &str) -> Result<String> {
        let url = format!("{}/tweets", self.api_base);
        let body = serde_json::to_value(CreateTweetRequest {
            text,
            reply: ReplySettings {
                in_reply_to_tweet_id: in_reply_to_id,
            },
        })?;
        let response = self.send(Method::POST, &url, &[], Some(&body)).await?;
        let created: CreatedTweet = Self::decode(response).await?.ok_or_else(|| {
            BotError::TwitterResponse(format!("No tweet created in reply to {in_reply_to_id}"))
        })?;
        Ok(created.id)
    }
}

/// The payload of a successful response. No data with only "not found"
/// errors (or none at all) is `None`; any other error is reported.
fn into_data<T>(body: ApiResponse<T>) -> Result<Option<T>> {
    match body.data {
        Some(data) => Ok(Some(data)),
        None if body.errors.iter().all(ApiError::is_not_found) => Ok(None),
        None => Err(BotError::TwitterResponse(
            body.errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )),
    }
}

/// The `start_time` format accepted by the search and timeline endpoints.
fn format_start_time(start_time: DateTime<Utc>) -> String {
    start_time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// How long to sleep after a 429, based on the `x-rate-limit-reset` header.
fn rate_limit_wait(headers: &HeaderMap, now: DateTime<Utc>) -> Duration {
    headers
        .get("x-rate-limit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .map_or(DEFAULT_RATE_LIMIT_WAIT, |reset| {
            let secs = reset.saturating_sub(now.timestamp()).saturating_add(1);
            Duration::from_secs(u64::try_from(secs).unwrap_or(0))
        })
        .clamp(MIN_RATE_LIMIT_WAIT, MAX_RATE_LIMIT_WAIT)
}
