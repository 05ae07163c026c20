//! Application state and composition.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::connections::{Hub, HubHandle};
use crate::infrastructure::{
    config::EngineConfig,
    event_bus::ShopEventBus,
    ports::{ClockPort, IdentityResolver, OrderEventSink, OrderRepo},
};
use crate::use_cases::orders::{
    CreateOrder, DeleteOrder, GetOrder, ListShopOrders, OrderEventPublisher, OrderUseCases,
    UpdateOrderStatus,
};

/// Main application state.
///
/// Holds repositories, use cases and both fan-out paths.
/// Passed to HTTP/WebSocket handlers via Axum state.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
    /// Fan-out path for streaming subscribers.
    pub events: ShopEventBus,
    /// Fan-out path for socket clients.
    pub hub: HubHandle,
    pub identity: Arc<dyn IdentityResolver>,
    /// Root token; streaming calls run on child tokens.
    pub shutdown: CancellationToken,
    pub config: EngineConfig,
}

/// Container for all repository modules.
pub struct Repositories {
    pub orders: Arc<dyn OrderRepo>,
}

/// Container for all use cases.
pub struct UseCases {
    pub orders: OrderUseCases,
}

impl App {
    /// Wire the application and start the hub loop.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        orders: Arc<dyn OrderRepo>,
        identity: Arc<dyn IdentityResolver>,
        clock: Arc<dyn ClockPort>,
        config: EngineConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let events = ShopEventBus::with_capacity(config.event_bus_capacity);
        let (hub, hub_handle) = Hub::new();
        tokio::spawn(hub.run());

        let sinks: Vec<Arc<dyn OrderEventSink>> =
            vec![Arc::new(events.clone()), Arc::new(hub_handle.clone())];
        let publisher = Arc::new(OrderEventPublisher::new(sinks));

        let order_use_cases = OrderUseCases::new(
            Arc::new(CreateOrder::new(
                orders.clone(),
                publisher.clone(),
                clock.clone(),
            )),
            Arc::new(UpdateOrderStatus::new(
                orders.clone(),
                publisher.clone(),
                clock,
            )),
            Arc::new(DeleteOrder::new(orders.clone(), publisher)),
            Arc::new(GetOrder::new(orders.clone())),
            Arc::new(ListShopOrders::new(orders.clone())),
        );

        Self {
            repositories: Repositories { orders },
            use_cases: UseCases {
                orders: order_use_cases,
            },
            events,
            hub: hub_handle,
            identity,
            shutdown,
            config,
        }
    }
}
