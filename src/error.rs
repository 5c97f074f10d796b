use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Twitter API error ({status}): {message}")]
    TwitterApi {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Twitter response error: {0}")]
    TwitterResponse(String),

    #[error("OpenRouter API error ({status}): {message}")]
    OpenRouterApi {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("OpenRouter response error: {0}")]
    OpenRouterResponse(String),

    #[error("Airtable API error ({status}): {message}")]
    AirtableApi {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("S3 error: {0}")]
    S3(String),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl<E, R> From<SdkError<E, R>> for BotError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    fn from(err: SdkError<E, R>) -> Self {
        BotError::S3(DisplayErrorContext(err).to_string())
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
