//! Persisted reply records, the deduplication index for the pipeline.

mod airtable;
mod s3;

use std::future::Future;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::types::ReplyRecord;

pub use airtable::AirtableStore;
pub use s3::S3ReplyStore;

/// Append-only record store. Lookups must be exact matches on the
/// conversation root id and must see every previously committed insert.
pub trait ReplyStore {
    fn has_reply_for(
        &self,
        conversation_root_id: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn insert(&self, record: &ReplyRecord) -> impl Future<Output = Result<()>> + Send;
}

/// The store selected by configuration.
#[derive(Debug)]
pub enum ReplyStoreBackend {
    Airtable(AirtableStore),
    S3(S3ReplyStore),
}

impl ReplyStoreBackend {
    /// Build the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store URL is invalid.
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        match config {
            StoreConfig::Airtable(airtable) => {
                Ok(Self::Airtable(AirtableStore::from_config(airtable)?))
            }
            StoreConfig::S3(s3) => Ok(Self::S3(S3ReplyStore::from_config(s3).await)),
        }
    }
}

impl ReplyStore for ReplyStoreBackend {
    async fn has_reply_for(&self, conversation_root_id: &str) -> Result<bool> {
        match self {
            Self::Airtable(store) => store.has_reply_for(conversation_root_id).await,
            Self::S3(store) => store.has_reply_for(conversation_root_id).await,
        }
    }

    async fn insert(&self, record: &ReplyRecord) -> Result<()> {
        match self {
            Self::Airtable(store) => store.insert(record).await,
            Self::S3(store) => store.insert(record).await,
        }
    }
}
