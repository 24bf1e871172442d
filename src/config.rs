use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::env::ReadEnv;
use crate::upstream::DEFAULT_BASE_URL;

/// Top-level configuration parsed from TOML. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub credentials: CredentialsConfig,
}

/// Server-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path the access token endpoint is mounted on.
    pub route: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            route: "/api/access_token".to_string(),
        }
    }
}

/// Where tokens are requested from.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Overall deadline for the upstream call. Unset means no deadline.
    pub timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Names of the environment variables holding the app id and secret.
/// The values themselves are read on every request, never stored here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub appid_env: String,
    pub secret_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            appid_env: "WECHAT_APPID".to_string(),
            secret_env: "WECHAT_SECRET".to_string(),
        }
    }
}

/// Load config from an optional TOML file, apply environment overrides and validate.
pub fn load_config(path: Option<&Path>, env: &impl ReadEnv) -> Result<Config, String> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                format!("Failed to read config file '{}': {}", path.display(), e)
            })?;
            toml::from_str::<Config>(&content)
                .map_err(|e| format!("Failed to parse TOML config: {e}"))?
        }
        None => Config::default(),
    };

    apply_env_overrides(&mut config, env)?;
    validate(&config)?;

    Ok(config)
}

/// Apply environment variable overrides.
fn apply_env_overrides(config: &mut Config, env: &impl ReadEnv) -> Result<(), String> {
    if let Ok(val) = env.var("TOKEN_RELAY_HOST") {
        config.server.host = val;
    }

    if let Ok(val) = env.var("TOKEN_RELAY_PORT") {
        config.server.port = val
            .parse()
            .map_err(|e| format!("TOKEN_RELAY_PORT '{val}' is not a valid port: {e}"))?;
    }

    if let Ok(val) = env.var("TOKEN_RELAY_UPSTREAM_URL") {
        config.upstream.base_url = val;
    }

    Ok(())
}

/// Validate the entire configuration. Returns an error string on failure.
pub fn validate(config: &Config) -> Result<(), String> {
    validate_server(&config.server)?;
    validate_upstream(&config.upstream)?;
    validate_credentials(&config.credentials)?;
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), String> {
    if server.host.is_empty() {
        return Err("server.host is required".to_string());
    }

    if !server.route.starts_with('/') {
        return Err(format!(
            "server.route '{}' must be an absolute path starting with '/'",
            server.route
        ));
    }

    Ok(())
}

fn validate_upstream(upstream: &UpstreamConfig) -> Result<(), String> {
    if upstream.base_url.is_empty() {
        return Err("upstream.base_url is required".to_string());
    }

    // The token path is appended verbatim.
    if upstream.base_url.ends_with('/') {
        return Err("upstream.base_url must not have a trailing slash".to_string());
    }

    // Allow http:// for local mocks; require https:// otherwise
    if upstream.base_url.starts_with("http://") {
        tracing::warn!(
            base_url = %upstream.base_url,
            "upstream.base_url uses http:// — credentials will be sent in clear text"
        );
    } else if !upstream.base_url.starts_with("https://") {
        return Err(
            "upstream.base_url must start with https:// (or http:// for local dev)".to_string(),
        );
    }

    if upstream.timeout_secs == Some(0) {
        return Err("upstream.timeout_secs must be greater than zero when set".to_string());
    }

    Ok(())
}

fn validate_credentials(credentials: &CredentialsConfig) -> Result<(), String> {
    let missing: Vec<&str> = [
        ("credentials.appid_env", credentials.appid_env.as_str()),
        ("credentials.secret_env", credentials.secret_env.as_str()),
    ]
    .iter()
    .filter(|(_, v)| v.is_empty())
    .map(|(k, _)| *k)
    .collect();

    if !missing.is_empty() {
        return Err(format!(
            "environment variable names are required: {}",
            missing.join(", ")
        ));
    }

    Ok(())
}
