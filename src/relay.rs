//! Turns the upstream token API into a normalized `AccessTokenResult`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::CredentialsConfig;
use crate::env::ReadEnv;
use crate::error::RelayError;
use crate::upstream::{Credentials, TokenFetcher, UpstreamTokenResponse};

pub const SUCCESS_MESSAGE: &str = "access_token fetched successfully";

/// Payload returned to the caller of the access token endpoint.
///
/// `success == true` always comes with a non-empty token; a failure carries an
/// empty token and a message explaining why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResult {
    pub access_token: String,
    pub expires_in: i64,
    pub timestamp: i64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl AccessTokenResult {
    pub fn succeeded(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            expires_in,
            timestamp: unix_now(),
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            access_token: String::new(),
            expires_in: 0,
            timestamp: 0,
            success: false,
            message,
        }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Reads credentials and performs one upstream exchange per call.
#[derive(Clone)]
pub struct TokenRelay {
    env: Arc<dyn ReadEnv + Send + Sync>,
    fetcher: Arc<dyn TokenFetcher>,
    keys: CredentialsConfig,
}

impl TokenRelay {
    pub fn new(
        env: Arc<dyn ReadEnv + Send + Sync>,
        fetcher: Arc<dyn TokenFetcher>,
        keys: CredentialsConfig,
    ) -> Self {
        Self { env, fetcher, keys }
    }

    /// Current credentials, read fresh from the environment.
    fn credentials(&self) -> Credentials {
        Credentials {
            appid: self.env.var_or_empty(&self.keys.appid_env),
            secret: self.env.var_or_empty(&self.keys.secret_env),
        }
    }

    /// `Err` means the relay could not answer; an unsuccessful
    /// `AccessTokenResult` means it answered "no token".
    pub async fn access_token(&self) -> Result<AccessTokenResult, RelayError> {
        let credentials = self.credentials();
        if !credentials.is_complete() {
            tracing::warn!(
                appid_env = %self.keys.appid_env,
                secret_env = %self.keys.secret_env,
                "Credentials not configured, skipping upstream call"
            );
            return Ok(AccessTokenResult::failed(format!(
                "configure both {} and {} environment variables",
                self.keys.appid_env, self.keys.secret_env
            )));
        }

        let body = self.fetcher.fetch(&credentials).await?;
        let upstream: UpstreamTokenResponse = serde_json::from_str(&body)?;

        if upstream.errcode != 0 {
            tracing::warn!(
                errcode = upstream.errcode,
                errmsg = %upstream.errmsg,
                "Upstream rejected token request"
            );
            return Ok(AccessTokenResult::failed(format!(
                "upstream API error: {} (errcode: {})",
                upstream.errmsg, upstream.errcode
            )));
        }

        if upstream.access_token.is_empty() {
            tracing::warn!("Upstream reported success without an access_token");
            return Ok(AccessTokenResult::failed(
                "upstream API returned no access_token".to_string(),
            ));
        }

        tracing::info!(
            appid = %credentials.appid,
            expires_in = upstream.expires_in,
            "Access token relayed"
        );
        Ok(AccessTokenResult::succeeded(
            upstream.access_token,
            upstream.expires_in,
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::env::InMemoryEnv;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays a canned outcome and records every call.
    pub(crate) struct StubFetcher {
        outcome: Result<String, RelayError>,
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<Credentials>>,
    }

    impl StubFetcher {
        pub(crate) fn body(body: &str) -> Arc<Self> {
            Self::outcome(Ok(body.to_string()))
        }

        pub(crate) fn outcome(outcome: Result<String, RelayError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenFetcher for StubFetcher {
        async fn fetch(&self, credentials: &Credentials) -> Result<String, RelayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(credentials.clone());
            self.outcome.clone()
        }
    }

    pub(crate) fn configured_env() -> InMemoryEnv {
        InMemoryEnv::new()
            .with("WECHAT_APPID", "wx123")
            .with("WECHAT_SECRET", "s3cret")
    }

    fn relay(env: InMemoryEnv, fetcher: Arc<StubFetcher>) -> TokenRelay {
        TokenRelay::new(Arc::new(env), fetcher, CredentialsConfig::default())
    }

    #[tokio::test]
    async fn test_missing_credentials_skip_upstream() {
        let cases = [
            InMemoryEnv::new(),
            InMemoryEnv::new().with("WECHAT_APPID", "wx123"),
            InMemoryEnv::new().with("WECHAT_SECRET", "s3cret"),
            InMemoryEnv::new()
                .with("WECHAT_APPID", "")
                .with("WECHAT_SECRET", ""),
        ];

        for env in cases {
            let fetcher = StubFetcher::body("{}");
            let result = relay(env, fetcher.clone()).access_token().await.unwrap();

            assert!(!result.success);
            assert!(result.access_token.is_empty());
            assert!(result.message.contains("WECHAT_APPID"));
            assert!(result.message.contains("WECHAT_SECRET"));
            assert_eq!(fetcher.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_custom_variable_names() {
        let env = InMemoryEnv::new()
            .with("MP_ID", "wx999")
            .with("MP_SECRET", "other");
        let fetcher = StubFetcher::body(r#"{"access_token":"T","expires_in":60}"#);
        let keys = CredentialsConfig {
            appid_env: "MP_ID".to_string(),
            secret_env: "MP_SECRET".to_string(),
        };
        let relay = TokenRelay::new(Arc::new(env), fetcher.clone(), keys);

        assert!(relay.access_token().await.unwrap().success);
        let seen = fetcher.seen.lock().unwrap();
        assert_eq!(seen[0].appid, "wx999");
        assert_eq!(seen[0].secret, "other");
    }

    #[tokio::test]
    async fn test_success_copies_token_and_stamps_time() {
        let fetcher = StubFetcher::body(r#"{"access_token":"ACCESS_TOKEN","expires_in":7200}"#);
        let before = unix_now();
        let result = relay(configured_env(), fetcher.clone())
            .access_token()
            .await
            .unwrap();
        let after = unix_now();

        assert!(result.success);
        assert_eq!(result.access_token, "ACCESS_TOKEN");
        assert_eq!(result.expires_in, 7200);
        assert_eq!(result.message, SUCCESS_MESSAGE);
        assert!(result.timestamp >= before && result.timestamp <= after);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_upstream_errcode_is_business_failure() {
        let fetcher = StubFetcher::body(r#"{"errcode":40013,"errmsg":"invalid appid"}"#);
        let result = relay(configured_env(), fetcher)
            .access_token()
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.access_token.is_empty());
        assert!(result.message.contains("invalid appid"));
        assert!(result.message.contains("40013"));
    }

    #[tokio::test]
    async fn test_success_without_token_is_business_failure() {
        for body in ["{}", r#"{"errcode":0,"errmsg":"ok"}"#, r#"{"access_token":"","expires_in":7200}"#] {
            let result = relay(configured_env(), StubFetcher::body(body))
                .access_token()
                .await
                .unwrap();

            assert!(!result.success, "body {body} must not count as success");
            assert!(result.access_token.is_empty());
            assert_eq!(result.message, "upstream API returned no access_token");
        }
    }

    #[tokio::test]
    async fn test_fetch_errors_propagate() {
        for err in [
            RelayError::Request("connection refused".to_string()),
            RelayError::ReadBody("connection reset".to_string()),
        ] {
            let fetcher = StubFetcher::outcome(Err(err.clone()));
            let result = relay(configured_env(), fetcher).access_token().await;
            assert_eq!(result.unwrap_err(), err);
        }
    }

    #[tokio::test]
    async fn test_unparsable_body_is_parse_error() {
        let fetcher = StubFetcher::body("<html>bad gateway</html>");
        let err = relay(configured_env(), fetcher)
            .access_token()
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Parse(_)));
    }

    #[test]
    fn test_failed_result_omits_message_only_when_empty() {
        let v = serde_json::to_value(AccessTokenResult::failed(String::new())).unwrap();
        assert!(v.get("message").is_none());
        assert_eq!(v["access_token"], "");
        assert_eq!(v["success"], false);

        let v = serde_json::to_value(AccessTokenResult::failed("why".to_string())).unwrap();
        assert_eq!(v["message"], "why");
    }
}
