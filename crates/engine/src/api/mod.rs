//! API layer - HTTP, server-streaming and WebSocket entry points.

pub mod connections;
pub mod http;
pub mod stream;
pub mod websocket;

pub use connections::{Client, Hub, HubHandle};

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::app::App;
use websocket::WsState;

/// Build the full router with separate states for HTTP and WebSocket.
pub fn router(app: Arc<App>) -> Router {
    let ws_state = Arc::new(WsState::new(app.clone()));
    http::routes()
        .with_state(app)
        .route("/ws", get(websocket::ws_handler).with_state(ws_state))
}
