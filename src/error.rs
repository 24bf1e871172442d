use std::fmt;

/// Reasons the relay could not produce an answer at all.
///
/// Business-negative outcomes (missing credentials, upstream `errcode`) are
/// not errors; they travel as an unsuccessful `AccessTokenResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    UnsupportedMethod(String),
    Request(String),
    ReadBody(String),
    Parse(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::UnsupportedMethod(method) => {
                write!(f, "request method {method} is not supported, use GET")
            }
            RelayError::Request(cause) => write!(f, "request to upstream API failed: {cause}"),
            RelayError::ReadBody(cause) => write!(f, "failed to read response: {cause}"),
            RelayError::Parse(cause) => write!(f, "failed to parse response: {cause}"),
        }
    }
}

impl std::error::Error for RelayError {}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::Parse(e.to_string())
    }
}
