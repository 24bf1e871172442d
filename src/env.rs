//! Key/value access to process configuration.
//!
//! Credentials are looked up through [`ReadEnv`] on every request so tests can
//! swap the process environment for a fixed map.

use std::env;

/// Does **not** require `Send + Sync`. Add the bounds where the accessor is
/// shared across tasks, e.g. `Arc<dyn ReadEnv + Send + Sync>`.
pub trait ReadEnv {
    fn var(&self, key: &str) -> Result<String, env::VarError>;

    /// Value of `key`, with an unset or non-unicode variable read as empty.
    fn var_or_empty(&self, key: &str) -> String {
        self.var(key).unwrap_or_default()
    }
}

/// Zero-sized type that delegates to `std::env`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl ReadEnv for SystemEnv {
    #[inline]
    fn var(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }
}

/// Fixed map of variables, for tests.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct InMemoryEnv {
    vars: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl InMemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }
}

#[cfg(test)]
impl ReadEnv for InMemoryEnv {
    fn var(&self, key: &str) -> Result<String, env::VarError> {
        self.vars.get(key).cloned().ok_or(env::VarError::NotPresent)
    }
}
