//! Twitter API v2 access: mention feed, post lookup and reply publishing.

mod client;
mod models;
mod oauth;

pub use client::TwitterClient;
pub use oauth::OAuthCredentials;
