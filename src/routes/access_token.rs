use axum::extract::State;
use axum::http::Method;
use axum::response::Response;

use super::{envelope_response, AppState};
use crate::envelope::Envelope;
use crate::error::RelayError;
use crate::relay::AccessTokenResult;

/// GET <route> — fetch a fresh access token from upstream and relay it.
pub async fn access_token(State(state): State<AppState>, method: Method) -> Response {
    tracing::debug!(%method, "Access token requested");

    let envelope: Envelope<AccessTokenResult> = if method == Method::GET {
        state.relay.access_token().await.into()
    } else {
        Envelope::fault(RelayError::UnsupportedMethod(method.to_string()))
    };

    if let Envelope::Fault { message, .. } = &envelope {
        tracing::warn!(code = envelope.code(), error = %message, "Access token request failed");
    }

    envelope_response(&envelope)
}
