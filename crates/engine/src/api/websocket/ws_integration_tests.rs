use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite};

use bazaar_domain::{
    Identity, NewOrder, OrderEventKind, OrderItem, OrderStatus, ProductId, Role, ShopId, UserId,
};
use bazaar_shared::ServerMessage;

use super::test_support::*;
use crate::infrastructure::config::{EngineConfig, PumpConfig};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

fn basket(customer: UserId) -> NewOrder {
    NewOrder::new(
        customer,
        vec![OrderItem::new(ProductId::new(), "Espresso beans", 2, 1450)],
    )
}

#[tokio::test]
async fn when_order_is_created_then_socket_and_bus_of_that_shop_receive_it() {
    let app = test_app(EngineConfig::default());
    let (addr, _server) = spawn_server(app.clone()).await;

    let shop_a = ShopId::new();
    let shop_b = ShopId::new();
    let seller_a = Identity::seller(UserId::new(), shop_a);
    let seller_b = Identity::seller(UserId::new(), shop_b);

    let mut ws_a = ws_connect(addr, shop_a, &seller_a).await;
    let mut ws_b = ws_connect(addr, shop_b, &seller_b).await;
    wait_for_clients(&app, shop_a, 1).await;
    wait_for_clients(&app, shop_b, 1).await;

    let mut bus_a = app.events.subscribe(shop_a);
    let mut bus_b = app.events.subscribe(shop_b);

    let customer = Identity::new(UserId::new(), Role::Customer, Vec::new());
    let order = app
        .use_cases
        .orders
        .create
        .execute(&customer, shop_a, basket(customer.user_id))
        .await
        .expect("order created");

    let msg = ws_expect_message(&mut ws_a, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::OrderCreated(_))
    })
    .await;
    assert_eq!(msg.order().id, order.id.to_uuid());
    assert_eq!(msg.order().total_cents, 2900);

    let event = tokio::time::timeout(RECV_TIMEOUT, bus_a.recv())
        .await
        .expect("bus delivery")
        .expect("subscription open");
    assert_eq!(event.kind, OrderEventKind::Created);
    assert_eq!(event.order.id, order.id);

    ws_expect_no_message_matching(&mut ws_b, Duration::from_millis(200), |_| true).await;
    let nothing = tokio::time::timeout(Duration::from_millis(100), bus_b.recv()).await;
    assert!(nothing.is_err(), "shop B bus subscriber must see nothing");
}

#[tokio::test]
async fn when_order_ships_then_is_deleted_then_observers_see_both_in_order() {
    let app = test_app(EngineConfig::default());
    let (addr, _server) = spawn_server(app.clone()).await;

    let shop = ShopId::new();
    let seller = Identity::seller(UserId::new(), shop);
    let mut ws = ws_connect(addr, shop, &seller).await;
    wait_for_clients(&app, shop, 1).await;

    let order = app
        .use_cases
        .orders
        .create
        .execute(&seller, shop, basket(UserId::new()))
        .await
        .expect("order created");
    ws_expect_message(&mut ws, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::OrderCreated(_))
    })
    .await;

    let mut bus = app.events.subscribe(shop);
    app.use_cases
        .orders
        .update_status
        .execute(&seller, order.id, OrderStatus::Shipping)
        .await
        .expect("shipped");
    app.use_cases
        .orders
        .delete
        .execute(&seller, order.id)
        .await
        .expect("deleted");

    let first = ws_recv_server(&mut ws).await;
    let second = ws_recv_server(&mut ws).await;
    assert!(matches!(first, ServerMessage::OrderStatusChanged(_)));
    assert_eq!(first.order().status, OrderStatus::Shipping);
    assert!(matches!(second, ServerMessage::OrderDeleted(_)));
    assert_eq!(second.order().status, OrderStatus::Shipping);
    assert_eq!(second.order().id, order.id.to_uuid());

    let changed = bus.recv().await.expect("status change");
    let deleted = bus.recv().await.expect("delete");
    assert_eq!(changed.kind, OrderEventKind::StatusChanged);
    assert_eq!(changed.status(), OrderStatus::Shipping);
    assert_eq!(deleted.kind, OrderEventKind::Deleted);
    assert_eq!(deleted.status(), OrderStatus::Shipping);
}

#[tokio::test]
async fn when_client_closes_then_hub_unregisters_it() {
    let app = test_app(EngineConfig::default());
    let (addr, _server) = spawn_server(app.clone()).await;

    let shop = ShopId::new();
    let seller = Identity::seller(UserId::new(), shop);
    let mut ws = ws_connect(addr, shop, &seller).await;
    wait_for_clients(&app, shop, 1).await;

    ws.close(None).await.expect("close sent");

    wait_for_clients(&app, shop, 0).await;
    assert_eq!(app.hub.shop_count(), 0);
}

#[tokio::test]
async fn when_peer_goes_silent_then_read_timeout_unregisters_it() {
    let config = EngineConfig {
        pump: PumpConfig {
            pong_wait: Duration::from_millis(400),
            ping_period: Duration::from_millis(200),
            ..PumpConfig::default()
        },
        ..EngineConfig::default()
    };
    let app = test_app(config);
    let (addr, _server) = spawn_server(app.clone()).await;

    let shop = ShopId::new();
    let seller = Identity::seller(UserId::new(), shop);
    // Never polled, so pings from the server go unanswered.
    let _silent = ws_connect(addr, shop, &seller).await;
    wait_for_clients(&app, shop, 1).await;

    wait_for_clients(&app, shop, 0).await;
}

#[tokio::test]
async fn when_client_sends_messages_then_connection_stays_registered() {
    let app = test_app(EngineConfig::default());
    let (addr, _server) = spawn_server(app.clone()).await;

    let shop = ShopId::new();
    let seller = Identity::seller(UserId::new(), shop);
    let mut ws = ws_connect(addr, shop, &seller).await;
    wait_for_clients(&app, shop, 1).await;

    ws.send(tungstenite::Message::Text(r#"{"type":"heartbeat"}"#.into()))
        .await
        .expect("heartbeat");
    ws.send(tungstenite::Message::Text(r#"{"type":"something_new"}"#.into()))
        .await
        .expect("unknown message");
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(app.hub.client_count(shop), 1);
}

#[tokio::test]
async fn when_traffic_is_steady_then_receive_only_client_is_still_pinged() {
    let config = EngineConfig {
        pump: PumpConfig {
            pong_wait: Duration::from_millis(400),
            ping_period: Duration::from_millis(200),
            ..PumpConfig::default()
        },
        ..EngineConfig::default()
    };
    let app = test_app(config);
    let (addr, _server) = spawn_server(app.clone()).await;

    let shop = ShopId::new();
    let seller = Identity::seller(UserId::new(), shop);
    let mut ws = ws_connect(addr, shop, &seller).await;
    wait_for_clients(&app, shop, 1).await;

    const ORDERS: usize = 16;
    let feeder = app.clone();
    tokio::spawn(async move {
        let customer = Identity::new(UserId::new(), Role::Customer, Vec::new());
        for _ in 0..ORDERS {
            feeder
                .use_cases
                .orders
                .create
                .execute(&customer, shop, basket(customer.user_id))
                .await
                .expect("order created");
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    });

    let (mut texts, mut pings) = (0, 0);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while texts < ORDERS {
        let frame = tokio::time::timeout_at(deadline, ws.next())
            .await
            .expect("frames keep arriving")
            .expect("socket open")
            .expect("valid frame");
        match frame {
            tungstenite::Message::Text(_) => texts += 1,
            tungstenite::Message::Ping(_) => pings += 1,
            _ => {}
        }
    }

    assert!(pings > 0, "no probe sent during steady traffic");
    assert_eq!(app.hub.client_count(shop), 1);
}

#[tokio::test]
async fn when_inbound_message_exceeds_limit_then_connection_is_dropped() {
    let app = test_app(EngineConfig::default());
    let (addr, _server) = spawn_server(app.clone()).await;

    let shop = ShopId::new();
    let seller = Identity::seller(UserId::new(), shop);
    let mut ws = ws_connect(addr, shop, &seller).await;
    wait_for_clients(&app, shop, 1).await;

    let oversized = "x".repeat(4096);
    let _ = ws.send(tungstenite::Message::Text(oversized)).await;

    wait_for_clients(&app, shop, 0).await;
}

#[tokio::test]
async fn when_credentials_are_missing_then_upgrade_is_unauthorized() {
    let app = test_app(EngineConfig::default());
    let (addr, _server) = spawn_server(app.clone()).await;

    let url = format!("ws://{}/ws?shop_id={}", addr, ShopId::new());
    let err = connect_async(url).await.expect_err("must be refused");

    match err {
        tungstenite::Error::Http(response) => assert_eq!(response.status(), 401),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn when_shop_is_not_permitted_then_upgrade_is_forbidden() {
    let app = test_app(EngineConfig::default());
    let (addr, _server) = spawn_server(app.clone()).await;

    let seller = Identity::seller(UserId::new(), ShopId::new());
    let other_shop = ShopId::new();
    let err = connect_async(ws_url(addr, other_shop, &seller))
        .await
        .expect_err("must be refused");

    match err {
        tungstenite::Error::Http(response) => assert_eq!(response.status(), 403),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(app.hub.client_count(other_shop), 0);
}
