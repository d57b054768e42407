//! WebSocket upgrade and the per-socket pump driver.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use metrics::{counter, gauge};
use serde::Deserialize;
use tracing::{debug, info, warn};

use conduit_broker::BrokerConnection;
use conduit_core::cursor::Cursor;
use conduit_core::ids::ConnectionId;
use conduit_core::serialize::JsonSerializer;
use conduit_transport::{ConnectionEvents, TransportPump};

use crate::channel::WsChannel;
use crate::state::ServerState;

/// Query parameters of `GET /{endpoint}/connect`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    /// Identity from negotiation (or a previous session, on resume).
    #[serde(default)]
    pub connection_id: Option<String>,
    /// Last cursor the client observed; absent on fresh connects.
    #[serde(default)]
    pub cursor: Option<String>,
}

impl ConnectParams {
    /// Validate into an identity plus optional resume cursor.
    pub fn validate(self) -> Result<(ConnectionId, Option<Cursor>), &'static str> {
        let id = self
            .connection_id
            .and_then(ConnectionId::new)
            .ok_or("connectionId is required")?;
        let cursor = match self.cursor.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(Cursor::parse(raw).ok_or("cursor is not a valid position")?),
        };
        Ok((id, cursor))
    }
}

/// Upgrade handler. A denied handshake (unknown endpoint, bad query) never
/// constructs a pump — the socket is refused before it opens.
pub async fn connect(
    State(state): State<Arc<ServerState>>,
    Path(endpoint): Path<String>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(factory) = state.endpoint(&endpoint) else {
        return (StatusCode::NOT_FOUND, "unknown endpoint").into_response();
    };
    let (id, cursor) = match params.validate() {
        Ok(parts) => parts,
        Err(reason) => {
            warn!(endpoint, reason, "rejecting websocket handshake");
            return (StatusCode::BAD_REQUEST, reason).into_response();
        }
    };
    let events = factory(&id);
    ws.on_upgrade(move |socket| drive_socket(state, endpoint, id, cursor, events, socket))
        .into_response()
}

/// Own one physical socket: split it, wire the pump, forward socket events,
/// and wait on the lifecycle completion signal before deregistering.
async fn drive_socket(
    state: Arc<ServerState>,
    endpoint: String,
    id: ConnectionId,
    cursor: Option<Cursor>,
    events: Arc<dyn ConnectionEvents>,
    socket: WebSocket,
) {
    counter!("ws_connections_total").increment(1);
    let socket_token = state.registry.add(&id);
    gauge!("ws_connections_active").set(state.registry.count() as f64);
    info!(endpoint, connection_id = %id, resume = cursor.is_some(), "websocket connected");

    let (sink, mut stream) = socket.split();
    let channel = Arc::new(WsChannel::new(sink));
    let connection: Arc<BrokerConnection> = Arc::new(state.broker.connect(id.clone()));

    let pump = TransportPump::new(
        connection,
        Arc::clone(&channel),
        Arc::new(JsonSerializer),
        events,
        cursor,
    );
    pump.on_open();

    // Inbound side: socket frames become pump events. Decoupled from the
    // outbound loop inside the pump itself.
    let reader = {
        let pump = Arc::clone(&pump);
        tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(Message::Text(text)) => pump.on_message(text.as_str().to_owned()),
                    Ok(Message::Close(_)) => {
                        pump.on_close();
                        return;
                    }
                    Ok(Message::Binary(_)) => {
                        debug!("ignoring binary frame");
                    }
                    Ok(Message::Ping(_) | Message::Pong(_)) => {}
                    Err(err) => {
                        pump.on_error(err.to_string());
                        return;
                    }
                }
            }
            // Stream ended without a close frame.
            pump.on_close();
        })
    };

    let outcome = pump.completion().wait().await;
    if let Some(fault) = outcome.fault() {
        warn!(endpoint, connection_id = %id, error = %fault, "connection ended faulted");
    } else {
        info!(endpoint, connection_id = %id, "connection ended");
    }

    channel.close().await;
    reader.abort();
    counter!("ws_disconnections_total").increment(1);
    let _ = state.registry.remove(&id, socket_token);
    gauge!("ws_connections_active").set(state.registry.count() as f64);

    // The mailbox stays open across the resume window so the client can
    // reconnect with its cursor; after that it is reclaimed unless a new
    // socket re-attached in the meantime.
    let window = state.resume_window;
    let _ = tokio::spawn(async move {
        tokio::time::sleep(window).await;
        if !state.registry.contains(&id) {
            state.broker.close(&id);
        }
    });
}
