//! S3-backed reply records, one JSON object per conversation root.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
    Client, operation::head_object::HeadObjectError, primitives::ByteStream,
};
use log::{debug, info};

use crate::{config::S3Config, error::Result, types::ReplyRecord};

use super::ReplyStore;

#[derive(Debug)]
pub struct S3ReplyStore {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3ReplyStore {
    /// Build a new store from configuration. Credentials are resolved from
    /// the usual AWS sources and only checked on the first request.
    pub async fn from_config(config: &S3Config) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let shared_config = loader.load().await;

        info!(
            "Using reply store s3://{}/{}",
            config.bucket, config.prefix
        );

        Self {
            client: Client::new(&shared_config),
            bucket: config.bucket.clone(),
            prefix: config.prefix.clone(),
        }
    }

    fn key_for(&self, conversation_root_id: &str) -> String {
        record_key(&self.prefix, conversation_root_id)
    }
}

impl ReplyStore for S3ReplyStore {
    async fn has_reply_for(&self, conversation_root_id: &str) -> Result<bool> {
        let key = self.key_for(conversation_root_id);
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(HeadObjectError::is_not_found) => {
                debug!("No reply record at s3://{}/{key}", self.bucket);
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn insert(&self, record: &ReplyRecord) -> Result<()> {
        let key = self.key_for(&record.conversation_root_id);
        let body = serde_json::to_vec_pretty(record)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("application/json")
            .body(ByteStream::from(body))
            .send()
            .await?;

        debug!("Recorded reply {} at s3://{}/{key}", record.reply_post_id, self.bucket);
        Ok(())
    }
}

fn record_key(prefix: &str, conversation_root_id: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        format!("{prefix}{conversation_root_id}.json")
    } else {
        format!("{prefix}/{conversation_root_id}.json")
    }
}
