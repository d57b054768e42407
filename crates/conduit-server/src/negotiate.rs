//! Negotiation handshake: hands the client an identity and the socket URL.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::debug;

use conduit_core::ids::ConnectionId;

use crate::state::ServerState;

/// Body returned by `GET /{endpoint}/negotiate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateResponse {
    /// Fresh identity the client echoes back on connect.
    pub connection_id: ConnectionId,
    /// Relative URL of the socket endpoint for this connection.
    pub url: String,
}

/// Mint an identity for a mounted endpoint; unknown endpoints are 404.
pub async fn negotiate(
    State(state): State<Arc<ServerState>>,
    Path(endpoint): Path<String>,
) -> Response {
    if state.endpoint(&endpoint).is_none() {
        return (StatusCode::NOT_FOUND, "unknown endpoint").into_response();
    }
    let connection_id = ConnectionId::mint();
    debug!(endpoint, connection_id = %connection_id, "negotiated");
    Json(NegotiateResponse {
        connection_id,
        url: format!("/{endpoint}/connect"),
    })
    .into_response()
}
