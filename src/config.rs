use std::{env, str::FromStr, time::Duration};

use chrono::TimeDelta;
use log::{debug, info, warn};
use strum::{Display, EnumString};

use crate::error::{BotError, Result};
use crate::generator::DEFAULT_PERSONA;
use crate::twitter::OAuthCredentials;

/// Stand-in for credentials missing from the environment. Remote calls made
/// with it are rejected by the service, which is where the failure surfaces.
const PLACEHOLDER_SECRET: &str = "YourKey";

const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4o-mini";
const DEFAULT_TEMPERATURE: f32 = 0.5;
const DEFAULT_LOOKBACK_MINUTES: i64 = 120;
const DEFAULT_RESPONSE_LIMIT: usize = 35;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_S3_PREFIX: &str = "replies/";
const DEFAULT_S3_REGION: &str = "us-east-1";

#[derive(Debug, Clone)]
pub struct Config {
    pub twitter: OAuthCredentials,
    pub openrouter: OpenRouterConfig,
    pub store: StoreConfig,
    pub pipeline: PipelineConfig,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
    pub temperature: f32,
}

/// Tuning for a single polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// How far back each run looks for mentions.
    pub lookback: TimeDelta,
    /// Maximum number of mentions handled per run.
    pub response_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lookback: TimeDelta::minutes(DEFAULT_LOOKBACK_MINUTES),
            response_limit: DEFAULT_RESPONSE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreKind {
    Airtable,
    S3,
}

#[derive(Debug, Clone)]
pub enum StoreConfig {
    Airtable(AirtableConfig),
    S3(S3Config),
}

#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub api_key: String,
    pub base_key: String,
    pub table_name: String,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub prefix: String,
    pub region: String,
    pub endpoint: Option<String>,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but malformed.
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but malformed, or if the S3
    /// store is selected without a bucket.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let twitter = OAuthCredentials {
            consumer_key: secret(&get, "TWITTER_API_KEY"),
            consumer_secret: secret(&get, "TWITTER_API_SECRET"),
            access_token: secret(&get, "TWITTER_ACCESS_TOKEN"),
            access_token_secret: secret(&get, "TWITTER_ACCESS_TOKEN_SECRET"),
        };

        let openrouter = OpenRouterConfig {
            api_key: secret(&get, "OPENROUTER_API_KEY"),
            model: get("OPENROUTER_MODEL").unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
            system_prompt: get("SYSTEM_PROMPT").unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
            temperature: parsed(&get, "REPLY_TEMPERATURE", DEFAULT_TEMPERATURE)?,
        };

        let store_kind = parsed(&get, "REPLY_STORE", StoreKind::Airtable)?;
        let store = match store_kind {
            StoreKind::Airtable => StoreConfig::Airtable(AirtableConfig {
                api_key: secret(&get, "AIRTABLE_API_KEY"),
                base_key: secret(&get, "AIRTABLE_BASE_KEY"),
                table_name: secret(&get, "AIRTABLE_TABLE_NAME"),
            }),
            StoreKind::S3 => StoreConfig::S3(S3Config {
                bucket: get("S3_BUCKET").ok_or_else(|| {
                    BotError::Config("S3_BUCKET is required when REPLY_STORE=s3".to_string())
                })?,
                prefix: get("S3_PREFIX").unwrap_or_else(|| DEFAULT_S3_PREFIX.to_string()),
                region: get("S3_REGION").unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
                endpoint: get("S3_ENDPOINT"),
            }),
        };

        let lookback_minutes: i64 = parsed(&get, "LOOKBACK_MINUTES", DEFAULT_LOOKBACK_MINUTES)?;
        let lookback = TimeDelta::try_minutes(lookback_minutes)
            .filter(|delta| *delta > TimeDelta::zero())
            .ok_or_else(|| {
                BotError::Config(format!("LOOKBACK_MINUTES out of range: {lookback_minutes}"))
            })?;
        let pipeline = PipelineConfig {
            lookback,
            response_limit: parsed(&get, "TWEET_RESPONSE_LIMIT", DEFAULT_RESPONSE_LIMIT)?,
        };

        let poll_secs: u64 = parsed(&get, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        if poll_secs == 0 {
            return Err(BotError::Config(
                "POLL_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        let poll_interval = Duration::from_secs(poll_secs);

        if lookback.num_seconds().unsigned_abs() <= poll_secs {
            warn!(
                "Lookback window ({lookback_minutes} min) does not exceed the poll interval ({poll_secs}s); mentions may be missed between runs"
            );
        }

        info!("Configuration loaded successfully");
        debug!("Reply store: {store_kind}");
        debug!("OpenRouter model: {}", openrouter.model);
        debug!(
            "System prompt length: {} characters",
            openrouter.system_prompt.len()
        );
        debug!(
            "Lookback: {lookback_minutes} min, response limit: {}, poll interval: {poll_secs}s",
            pipeline.response_limit
        );

        Ok(Self {
            twitter,
            openrouter,
            store,
            pipeline,
            poll_interval,
        })
    }
}

fn secret<F>(get: &F, key: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    get(key).unwrap_or_else(|| {
        warn!("{key} is not set; remote calls using it will be rejected");
        PLACEHOLDER_SECRET.to_string()
    })
}

fn parsed<F, T>(get: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| BotError::Config(format!("Invalid value for {key} ({raw}): {e}"))),
        None => Ok(default),
    }
}
