//! The upstream token-issuance API.

mod http;

pub use http::HttpTokenFetcher;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::RelayError;

pub const DEFAULT_BASE_URL: &str = "https://api.weixin.qq.com";
pub const TOKEN_PATH: &str = "/cgi-bin/token";

/// Application identifier and shared secret used to request a token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub appid: String,
    pub secret: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.appid.is_empty() && !self.secret.is_empty()
    }
}

// Keep the secret out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("appid", &self.appid)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Body returned by the token endpoint. A success omits `errcode`/`errmsg`,
/// a failure omits `access_token`/`expires_in`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpstreamTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub errcode: i64,
    pub errmsg: String,
}

/// Build the token URL. The credentials are interpolated as-is, without
/// percent-encoding.
pub fn token_url(base_url: &str, credentials: &Credentials) -> String {
    format!(
        "{base_url}{TOKEN_PATH}?grant_type=client_credential&appid={}&secret={}",
        credentials.appid, credentials.secret
    )
}

/// Performs the single outbound call and hands back the raw response body.
///
/// Connection failures map to [`RelayError::Request`] and body read failures
/// to [`RelayError::ReadBody`]. Parsing is left to the caller.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch(&self, credentials: &Credentials) -> Result<String, RelayError>;
}
