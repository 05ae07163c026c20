//! WebSocket handling for shop observers.
//!
//! Each accepted connection becomes a hub [`Client`] served by two tasks: a
//! write pump draining the client's outbound queue to the socket with periodic
//! pings, and a read pump that only watches for liveness and peer close. The
//! read side owns cleanup; the write side stops once the hub closes the queue.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use bazaar_domain::{ClientId, ShopId, UserId};
use bazaar_shared::ClientMessage;

use super::connections::{Client, HubHandle};
use super::http::{credentials_from_headers, ApiError};
use crate::app::App;
use crate::infrastructure::config::PumpConfig;
use crate::infrastructure::ports::Credentials;

/// Combined state for WebSocket handlers.
pub struct WsState {
    pub app: Arc<App>,
    pub hub: HubHandle,
    pub pump: PumpConfig,
}

impl WsState {
    pub fn new(app: Arc<App>) -> Self {
        Self {
            hub: app.hub.clone(),
            pump: app.config.pump,
            app,
        }
    }
}

/// Query parameters for `GET /ws`. Identity fields are accepted here for
/// clients that cannot set headers on the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub shop_id: Uuid,
    pub user_id: Option<String>,
    pub role: Option<String>,
    pub shop_ids: Option<String>,
}

/// WebSocket upgrade handler.
///
/// The caller is authenticated and checked against the requested shop before
/// the upgrade; failures are plain 401/403 responses.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<WsState>>,
    headers: HeaderMap,
    Query(params): Query<WsParams>,
) -> Result<Response, ApiError> {
    let from_headers = credentials_from_headers(&headers);
    let credentials = Credentials {
        user_id: from_headers.user_id.or(params.user_id),
        role: from_headers.role.or(params.role),
        shop_ids: from_headers.shop_ids.or(params.shop_ids),
    };
    let identity = state.app.identity.resolve(&credentials)?;
    let shop_id = ShopId::from_uuid(params.shop_id);
    if !identity.can_access(shop_id) {
        tracing::info!(
            shop_id = %shop_id,
            user_id = %identity.user_id,
            "WebSocket subscription refused"
        );
        return Err(ApiError::Forbidden);
    }

    let user_id = identity.user_id;
    Ok(ws
        .max_message_size(state.pump.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state, shop_id, user_id)))
}

async fn handle_socket(socket: WebSocket, state: Arc<WsState>, shop_id: ShopId, user_id: UserId) {
    let (ws_sender, ws_receiver) = socket.split();

    let (client, queue) = Client::new(shop_id, user_id, state.pump.client_queue);
    let client_id = client.id;
    state.hub.register(client);

    tracing::info!(
        shop_id = %shop_id,
        client_id = %client_id,
        user_id = %user_id,
        "WebSocket connection established"
    );

    tokio::spawn(write_pump(ws_sender, queue, state.pump, client_id));
    read_pump(ws_receiver, state.pump, client_id).await;

    state.hub.unregister(shop_id, client_id);
    tracing::info!(
        shop_id = %shop_id,
        client_id = %client_id,
        "WebSocket connection terminated"
    );
}

/// Drain the outbound queue to the socket, pinging on every `ping_period`.
///
/// Queued frames go first: a tick only sends its probe once nothing is waiting.
/// Traffic does not reset the tick; a receive-only peer only speaks when pinged.
///
/// Returns when the queue is closed (after sending a close frame) or when a
/// write fails or misses its deadline. Never unregisters.
async fn write_pump(
    mut sink: SplitSink<WebSocket, Message>,
    mut queue: mpsc::Receiver<Utf8Bytes>,
    config: PumpConfig,
    client_id: ClientId,
) {
    let start = tokio::time::Instant::now() + config.ping_period;
    let mut ping = tokio::time::interval_at(start, config.ping_period);

    loop {
        tokio::select! {
            biased;
            next = queue.recv() => {
                let Some(frame) = next else {
                    let close = Message::Close(None);
                    let _ = send_with_deadline(&mut sink, close, &config, client_id).await;
                    tracing::debug!(client_id = %client_id, "Outbound queue closed");
                    return;
                };
                if !send_with_deadline(&mut sink, Message::Text(frame), &config, client_id).await {
                    return;
                }
            }
            _ = ping.tick() => {
                let probe = Message::Ping(Bytes::new());
                if !send_with_deadline(&mut sink, probe, &config, client_id).await {
                    return;
                }
            }
        }
    }
}

async fn send_with_deadline(
    sink: &mut SplitSink<WebSocket, Message>,
    message: Message,
    config: &PumpConfig,
    client_id: ClientId,
) -> bool {
    match tokio::time::timeout(config.write_wait, sink.send(message)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::debug!(client_id = %client_id, error = %e, "WebSocket write failed");
            false
        }
        Err(_) => {
            tracing::debug!(client_id = %client_id, "WebSocket write deadline exceeded");
            false
        }
    }
}

/// Read frames until the peer closes, errors, or stays silent for `pong_wait`.
///
/// Any frame counts as a sign of life. Client messages are parsed and logged
/// but otherwise ignored.
async fn read_pump(mut stream: SplitStream<WebSocket>, config: PumpConfig, client_id: ClientId) {
    loop {
        match tokio::time::timeout(config.pong_wait, stream.next()).await {
            Err(_) => {
                tracing::info!(client_id = %client_id, "WebSocket read timed out");
                return;
            }
            Ok(None) => return,
            Ok(Some(Err(e))) => {
                tracing::debug!(client_id = %client_id, error = %e, "WebSocket read failed");
                return;
            }
            Ok(Some(Ok(Message::Close(_)))) => {
                tracing::info!(client_id = %client_id, "WebSocket closed by client");
                return;
            }
            Ok(Some(Ok(Message::Text(text)))) => {
                match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(msg) => tracing::trace!(client_id = %client_id, ?msg, "Client message"),
                    Err(e) => {
                        tracing::debug!(client_id = %client_id, error = %e, "Unparseable client message");
                    }
                }
            }
            Ok(Some(Ok(_))) => {}
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod ws_integration_tests;
