use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;

use bazaar_domain::{Identity, ShopId};
use bazaar_shared::ServerMessage;

use crate::app::App;
use crate::infrastructure::{
    auth::TrustedHeaderResolver, clock::SystemClock, config::EngineConfig,
    memory::InMemoryOrderRepo,
};

pub(crate) type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// App over the in-memory store, trusting identity from headers or query.
pub(crate) fn test_app(config: EngineConfig) -> Arc<App> {
    Arc::new(App::new(
        Arc::new(InMemoryOrderRepo::new()),
        Arc::new(TrustedHeaderResolver::new()),
        Arc::new(SystemClock::new()),
        config,
        CancellationToken::new(),
    ))
}

pub(crate) async fn spawn_server(app: Arc<App>) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let router = crate::api::router(app);

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, handle)
}

pub(crate) fn ws_url(addr: SocketAddr, shop_id: ShopId, identity: &Identity) -> String {
    let shop_ids: Vec<String> = identity.shop_ids.iter().map(ToString::to_string).collect();
    format!(
        "ws://{}/ws?shop_id={}&user_id={}&role={}&shop_ids={}",
        addr,
        shop_id,
        identity.user_id,
        identity.role,
        shop_ids.join(",")
    )
}

pub(crate) async fn ws_connect(addr: SocketAddr, shop_id: ShopId, identity: &Identity) -> WsClient {
    let (ws, _resp) = connect_async(ws_url(addr, shop_id, identity)).await.unwrap();
    ws
}

/// Wait until the hub reports `expected` clients for `shop_id`.
pub(crate) async fn wait_for_clients(app: &App, shop_id: ShopId, expected: usize) {
    tokio::time::timeout(Duration::from_secs(3), async {
        while app.hub.client_count(shop_id) != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {expected} clients for shop {shop_id}, hub reports {}",
            app.hub.client_count(shop_id)
        )
    });
}

pub(crate) async fn ws_recv_server(ws: &mut WsClient) -> ServerMessage {
    loop {
        let msg = ws.next().await.unwrap().unwrap();
        match msg {
            WsMessage::Text(text) => {
                return serde_json::from_str::<ServerMessage>(&text).unwrap();
            }
            WsMessage::Binary(bin) => {
                let text = String::from_utf8(bin).unwrap();
                return serde_json::from_str::<ServerMessage>(&text).unwrap();
            }
            _ => {}
        }
    }
}

pub(crate) async fn ws_expect_message<F>(
    ws: &mut WsClient,
    timeout: Duration,
    mut predicate: F,
) -> ServerMessage
where
    F: FnMut(&ServerMessage) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                return msg;
            }
        }
    })
    .await
    .unwrap()
}

pub(crate) async fn ws_expect_no_message_matching<F>(
    ws: &mut WsClient,
    timeout: Duration,
    mut predicate: F,
) where
    F: FnMut(&ServerMessage) -> bool,
{
    let result = tokio::time::timeout(timeout, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                panic!("unexpected message: {:?}", msg);
            }
        }
    })
    .await;

    // We only succeed if we timed out without seeing a matching message.
    assert!(result.is_err());
}
