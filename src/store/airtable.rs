//! Airtable-backed reply records.

use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::AirtableConfig;
use crate::error::{BotError, Result};
use crate::types::ReplyRecord;

use super::ReplyStore;

const AIRTABLE_API_URL: &str = "https://api.airtable.com/v0/";
const ROOT_ID_FIELD: &str = "conversation_root_id";

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<ListedRecord>,
}

#[derive(Debug, Deserialize)]
struct ListedRecord {
    #[serde(default)]
    fields: RootIdFields,
}

#[derive(Debug, Default, Deserialize)]
struct RootIdFields {
    conversation_root_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    fields: &'a ReplyRecord,
    typecast: bool,
}

#[derive(Debug)]
pub struct AirtableStore {
    client: reqwest::Client,
    api_key: String,
    table_url: Url,
}

impl AirtableStore {
    /// # Errors
    ///
    /// Returns an error if the base or table name cannot form a valid URL.
    pub fn from_config(config: &AirtableConfig) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            table_url: table_url(&config.base_key, &config.table_name)?,
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
        Err(BotError::AirtableApi { status, message })
    }
}

impl ReplyStore for AirtableStore {
    async fn has_reply_for(&self, conversation_root_id: &str) -> Result<bool> {
        let response = self
            .client
            .get(lookup_url(&self.table_url, conversation_root_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let listing: ListResponse = Self::check(response).await?.json().await?;

        let found = contains_root(&listing, conversation_root_id);
        debug!("Airtable lookup for conversation {conversation_root_id}: found={found}");
        Ok(found)
    }

    async fn insert(&self, record: &ReplyRecord) -> Result<()> {
        let response = self
            .client
            .post(self.table_url.clone())
            .bearer_auth(&self.api_key)
            .json(&CreateRequest {
                fields: record,
                typecast: true,
            })
            .send()
            .await?;

        Self::check(response).await?;
        debug!(
            "Recorded reply {} for conversation {} in Airtable",
            record.reply_post_id, record.conversation_root_id
        );
        Ok(())
    }
}

fn table_url(base_key: &str, table_name: &str) -> Result<Url> {
    let mut url = Url::parse(AIRTABLE_API_URL)?;
    url.path_segments_mut()
        .map_err(|()| BotError::Config("Airtable API URL cannot have a path".to_string()))?
        .pop_if_empty()
        .push(base_key)
        .push(table_name);
    Ok(url)
}

/// List query returning at most one row for `conversation_root_id`.
fn lookup_url(table_url: &Url, conversation_root_id: &str) -> Url {
    let mut url = table_url.clone();
    url.query_pairs_mut()
        .append_pair("filterByFormula", &lookup_formula(conversation_root_id))
        .append_pair("fields[]", ROOT_ID_FIELD)
        .append_pair("maxRecords", "1");
    url
}

/// Airtable formula selecting rows whose root id equals `conversation_root_id`.
fn lookup_formula(conversation_root_id: &str) -> String {
    let escaped = conversation_root_id
        .replace('\\', "\\\\")
        .replace('\'', "\\'");
    format!("{{{ROOT_ID_FIELD}}} = '{escaped}'")
}

/// Exact, case-sensitive comparison on top of the server-side filter.
fn contains_root(listing: &ListResponse, conversation_root_id: &str) -> bool {
    listing
        .records
        .iter()
        .any(|record| record.fields.conversation_root_id.as_deref() == Some(conversation_root_id))
}
