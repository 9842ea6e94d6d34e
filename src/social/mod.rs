//! Social feed posting with OAuth 1.0a user-context auth.
//!
//! Requests are signed with HMAC-SHA1 over the OAuth signature base string:
//!
//!   METHOD & enc(url) & enc(sorted, encoded params joined with '&')
//!
//! keyed by `enc(consumer_secret) & enc(token_secret)`, base64 encoded.
//! JSON request bodies are not part of the signature.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use sha1::Sha1;
use thiserror::Error;
use tracing::debug;

use crate::config::TwitterConfig;

type HmacSha1 = Hmac<Sha1>;

const TWEETS_PATH: &str = "/2/tweets";
const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

/// RFC 3986 unreserved characters pass through, everything else is encoded.
const OAUTH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Error, Debug)]
pub enum SocialError {
    #[error("authentication rejected ({status}): {body}")]
    Auth { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Response(String),
    #[error("HMAC key error: {0}")]
    HmacKey(String),
}

/// Publishes a text post, returning the new post's id.
#[async_trait]
pub trait SocialPoster: Send + Sync {
    async fn create_post(&self, text: &str) -> Result<String, SocialError>;
}

#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

impl OAuthCredentials {
    /// `None` unless all four credentials are present.
    pub fn from_config(config: &TwitterConfig) -> Option<Self> {
        if !config.has_credentials() {
            return None;
        }
        Some(Self {
            consumer_key: config.api_key.clone(),
            consumer_secret: config.api_secret.clone(),
            access_token: config.access_token.clone(),
            access_secret: config.access_secret.clone(),
        })
    }
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE).to_string()
}

/// Build the OAuth 1.0a signature base string.
pub fn signature_base_string(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> =
        params.iter().map(|(k, v)| (encode(k), encode(v))).collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(url),
        encode(&param_string)
    )
}

/// HMAC-SHA1 signature of `base`, base64 encoded.
pub fn sign(base: &str, consumer_secret: &str, token_secret: &str) -> Result<String, SocialError> {
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| SocialError::HmacKey(e.to_string()))?;
    mac.update(base.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// `Authorization: OAuth ...` header value for one request.
///
/// `extra_params` are query or form parameters that take part in the
/// signature. Timestamp and nonce are passed in so signing is deterministic.
pub fn authorization_header(
    creds: &OAuthCredentials,
    method: &str,
    url: &str,
    extra_params: &[(&str, &str)],
    timestamp: i64,
    nonce: &str,
) -> Result<String, SocialError> {
    let timestamp = timestamp.to_string();
    let oauth_params = [
        ("oauth_consumer_key", creds.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", SIGNATURE_METHOD),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", creds.access_token.as_str()),
        ("oauth_version", OAUTH_VERSION),
    ];

    let mut all_params: Vec<(&str, &str)> = oauth_params.to_vec();
    all_params.extend_from_slice(extra_params);

    let base = signature_base_string(method, url, &all_params);
    let signature = sign(&base, &creds.consumer_secret, &creds.access_secret)?;

    let mut header_params: Vec<(&str, &str)> = oauth_params.to_vec();
    header_params.push(("oauth_signature", signature.as_str()));
    header_params.sort();

    let fields = header_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {}", fields))
}

fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

/// Map a non-success HTTP status to an error.
fn status_error(status: u16, body: String) -> SocialError {
    match status {
        401 | 403 => SocialError::Auth { status, body },
        429 => SocialError::RateLimited,
        _ => SocialError::Api { status, body },
    }
}

#[derive(Debug, Deserialize)]
struct CreatePostResponse {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
}

/// Twitter API v2 client posting as the configured user.
pub struct TwitterClient {
    client: reqwest::Client,
    api_url: String,
    creds: OAuthCredentials,
}

impl TwitterClient {
    pub fn new(api_url: &str, creds: OAuthCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            creds,
        }
    }

    /// `None` when any credential is missing.
    pub fn from_config(config: &TwitterConfig) -> Option<Self> {
        OAuthCredentials::from_config(config).map(|creds| Self::new(&config.api_url, creds))
    }
}

#[async_trait]
impl SocialPoster for TwitterClient {
    async fn create_post(&self, text: &str) -> Result<String, SocialError> {
        let url = format!("{}{}", self.api_url, TWEETS_PATH);
        let header = authorization_header(
            &self.creds,
            "POST",
            &url,
            &[],
            chrono::Utc::now().timestamp(),
            &nonce(),
        )?;

        debug!(url = %url, chars = text.chars().count(), "posting to social feed");

        let resp = self
            .client
            .post(&url)
            .header(AUTHORIZATION, header)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status >= 400 {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let parsed: CreatePostResponse = resp
            .json()
            .await
            .map_err(|e| SocialError::Response(e.to_string()))?;
        Ok(parsed.data.id)
    }
}
