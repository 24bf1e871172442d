pub mod access_token;

use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use serde::Serialize;

use crate::envelope::Envelope;
use crate::relay::TokenRelay;

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub relay: TokenRelay,
}

/// Build the service router with the access token endpoint mounted on `route`.
///
/// The route accepts every method so that non-GET requests get an envelope
/// rather than a bare 405.
pub fn router(route: &str, state: AppState) -> Router {
    Router::new()
        .route(route, any(access_token::access_token))
        .with_state(state)
}

/// Write an envelope as a JSON response, falling back to plain text if it
/// cannot be serialized.
pub fn envelope_response<T: Serialize>(envelope: &Envelope<T>) -> Response {
    match serde_json::to_vec(envelope) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            tracing::error!("Failed to serialize response envelope: {e}");
            "internal error".into_response()
        }
    }
}
