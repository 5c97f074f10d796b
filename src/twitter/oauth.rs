//! OAuth 1.0a request signing (HMAC-SHA1) for the Twitter API.

use std::fmt::Write;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use urlencoding::encode;

use crate::error::{BotError, Result};

type HmacSha1 = Hmac<Sha1>;

/// User-context credentials for a single bot account.
#[derive(Clone)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key_len", &self.consumer_key.len())
            .field("access_token_len", &self.access_token.len())
            .finish_non_exhaustive()
    }
}

impl OAuthCredentials {
    /// Build the `Authorization` header for a request.
    ///
    /// `url` must not carry a query string; query parameters go in `params`
    /// so they are part of the signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the signing key is rejected by the HMAC
    /// implementation.
    pub fn authorization_header(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<String> {
        let nonce: String = (0..16).fold(String::new(), |mut nonce, _| {
            let _ = write!(nonce, "{:02x}", rand::random::<u8>());
            nonce
        });
        let timestamp = Utc::now().timestamp().to_string();
        self.signed_header(method, url, params, &nonce, &timestamp)
    }

    fn signed_header(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String> {
        let oauth_params = [
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.access_token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let mut encoded: Vec<(String, String)> = oauth_params
            .iter()
            .chain(params)
            .map(|(k, v)| (encode(k).into_owned(), encode(v).into_owned()))
            .collect();
        encoded.sort();

        let param_string = encoded
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let base_string = format!(
            "{}&{}&{}",
            method.to_uppercase(),
            encode(url),
            encode(&param_string)
        );
        let signing_key = format!(
            "{}&{}",
            encode(&self.consumer_secret),
            encode(&self.access_token_secret)
        );

        let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
            .map_err(|e| BotError::Config(format!("Invalid OAuth signing key: {e}")))?;
        mac.update(base_string.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        let header = oauth_params
            .iter()
            .copied()
            .chain(std::iter::once(("oauth_signature", signature.as_str())))
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {header}"))
    }
}
