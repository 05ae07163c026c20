//! In-memory shop event bus.
//!
//! Routes committed order events to every live subscription of a shop. Each
//! subscription owns a bounded delivery channel; publishing never waits on a
//! slow subscriber, it drops that subscriber's copy instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};

use bazaar_domain::{OrderEvent, ShopId};

use crate::infrastructure::ports::OrderEventSink;

/// Default per-subscriber delivery channel capacity.
pub const DEFAULT_CAPACITY: usize = 32;

type SubscriberId = u64;

struct BusInner {
    shops: DashMap<ShopId, HashMap<SubscriberId, mpsc::Sender<OrderEvent>>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl BusInner {
    fn remove(&self, shop_id: ShopId, subscriber_id: SubscriberId) {
        let removed = match self.shops.get_mut(&shop_id) {
            Some(mut subscribers) => subscribers.remove(&subscriber_id).is_some(),
            None => false,
        };

        if self.shops.remove_if(&shop_id, |_, s| s.is_empty()).is_some() {
            tracing::debug!(shop_id = %shop_id, "Pruned empty shop from event bus");
        }

        if removed {
            tracing::debug!(
                shop_id = %shop_id,
                subscriber_id,
                "Event bus subscription cancelled"
            );
        }
    }
}

/// Per-shop publish/subscribe router for order events.
///
/// Cloning is cheap and every clone routes through the same table.
#[derive(Clone)]
pub struct ShopEventBus {
    inner: Arc<BusInner>,
}

impl ShopEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                shops: DashMap::new(),
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Register a new subscription for `shop_id`.
    pub fn subscribe(&self, shop_id: ShopId) -> Subscription {
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let subscriber_id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        let subscribers = {
            let mut entry = self.inner.shops.entry(shop_id).or_default();
            entry.insert(subscriber_id, tx);
            entry.len()
        };

        tracing::debug!(
            shop_id = %shop_id,
            subscriber_id,
            subscribers,
            "Event bus subscription registered"
        );

        Subscription {
            receiver: rx,
            cancel: CancelHandle {
                bus: Arc::downgrade(&self.inner),
                shop_id,
                subscriber_id,
                cancelled: Arc::new(AtomicBool::new(false)),
            },
        }
    }

    /// Deliver `event` to every current subscriber of `shop_id`.
    ///
    /// Returns how many subscribers accepted the event. A subscriber whose
    /// channel is full misses this event; nobody else is affected.
    pub fn publish(&self, shop_id: ShopId, event: OrderEvent) -> usize {
        let senders: Vec<(SubscriberId, mpsc::Sender<OrderEvent>)> =
            match self.inner.shops.get(&shop_id) {
                Some(subscribers) => subscribers
                    .iter()
                    .map(|(id, tx)| (*id, tx.clone()))
                    .collect(),
                None => return 0,
            };

        let mut delivered = 0;
        for (subscriber_id, tx) in senders {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(
                        shop_id = %shop_id,
                        subscriber_id,
                        kind = event.kind.as_str(),
                        "Subscriber channel full, dropping event"
                    );
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
        delivered
    }

    /// Number of shops with at least one subscriber.
    pub fn shop_count(&self) -> usize {
        self.inner.shops.len()
    }

    pub fn subscriber_count(&self, shop_id: ShopId) -> usize {
        self.inner
            .shops
            .get(&shop_id)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

impl Default for ShopEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderEventSink for ShopEventBus {
    fn deliver(&self, shop_id: ShopId, event: &OrderEvent) {
        let delivered = self.publish(shop_id, event.clone());
        tracing::trace!(shop_id = %shop_id, delivered, "Published order event to bus");
    }
}

/// Idempotent release for one subscription. Clones share the same state.
#[derive(Clone)]
pub struct CancelHandle {
    bus: Weak<BusInner>,
    shop_id: ShopId,
    subscriber_id: SubscriberId,
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Remove the subscription from the bus. Later calls do nothing.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.shop_id, self.subscriber_id);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A live subscription to one shop's events. Dropping it cancels.
pub struct Subscription {
    receiver: mpsc::Receiver<OrderEvent>,
    cancel: CancelHandle,
}

impl Subscription {
    pub fn shop_id(&self) -> ShopId {
        self.cancel.shop_id
    }

    /// Next event, or `None` once the subscription has been cancelled and the
    /// buffered events are drained.
    pub async fn recv(&mut self) -> Option<OrderEvent> {
        self.receiver.recv().await
    }

    /// Handle that can cancel this subscription from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Unsubscribe and close the delivery channel.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.receiver.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_domain::{NewOrder, Order, OrderItem, OrderStatus, ProductId, UserId};
    use chrono::Utc;
    use std::time::Duration;

    fn order_for(shop_id: ShopId) -> Order {
        let items = vec![OrderItem::new(ProductId::new(), "Teapot", 1, 2500)];
        Order::new(shop_id, NewOrder::new(UserId::new(), items), Utc::now())
            .expect("valid order")
    }

    fn created(shop_id: ShopId) -> OrderEvent {
        OrderEvent::created(order_for(shop_id))
    }

    #[tokio::test]
    async fn when_publishing_then_every_subscriber_of_the_shop_receives() {
        let bus = ShopEventBus::new();
        let shop = ShopId::new();
        let mut first = bus.subscribe(shop);
        let mut second = bus.subscribe(shop);

        let event = created(shop);
        assert_eq!(bus.publish(shop, event.clone()), 2);

        let got_first = first.recv().await.expect("first receives");
        let got_second = second.recv().await.expect("second receives");
        assert_eq!(got_first.order.id, event.order.id);
        assert_eq!(got_second.order.id, event.order.id);
    }

    #[tokio::test]
    async fn when_publishing_to_one_shop_then_other_shops_receive_nothing() {
        let bus = ShopEventBus::new();
        let shop_a = ShopId::new();
        let shop_b = ShopId::new();
        let _sub_a = bus.subscribe(shop_a);
        let mut sub_b = bus.subscribe(shop_b);

        assert_eq!(bus.publish(shop_a, created(shop_a)), 1);

        let nothing = tokio::time::timeout(Duration::from_millis(50), sub_b.recv()).await;
        assert!(nothing.is_err(), "shop B must not see shop A's events");
    }

    #[tokio::test]
    async fn when_subscriber_never_drains_then_overflow_is_dropped_without_blocking() {
        let bus = ShopEventBus::with_capacity(4);
        let shop = ShopId::new();
        let mut slow = bus.subscribe(shop);

        for _ in 0..4 {
            assert_eq!(bus.publish(shop, created(shop)), 1);
        }

        let overflow = tokio::time::timeout(Duration::from_millis(100), async {
            bus.publish(shop, created(shop))
        })
        .await
        .expect("publish must not block");
        assert_eq!(overflow, 0);

        let mut buffered = 0;
        while let Ok(Some(_)) =
            tokio::time::timeout(Duration::from_millis(20), slow.recv()).await
        {
            buffered += 1;
        }
        assert_eq!(buffered, 4);
    }

    #[tokio::test]
    async fn when_one_subscriber_is_full_then_others_still_receive() {
        let bus = ShopEventBus::with_capacity(1);
        let shop = ShopId::new();
        let _stuck = bus.subscribe(shop);
        let mut healthy = bus.subscribe(shop);

        assert_eq!(bus.publish(shop, created(shop)), 2);
        healthy.recv().await.expect("first event");

        assert_eq!(bus.publish(shop, created(shop)), 1);
        assert!(healthy.recv().await.is_some());
    }

    #[tokio::test]
    async fn when_cancelled_twice_then_second_cancel_is_a_noop() {
        let bus = ShopEventBus::new();
        let shop = ShopId::new();
        let mut keep = bus.subscribe(shop);
        let mut sub = bus.subscribe(shop);
        let handle = sub.cancel_handle();

        sub.cancel();
        assert!(handle.is_cancelled());
        handle.cancel();
        sub.cancel();

        assert_eq!(bus.subscriber_count(shop), 1);
        assert!(sub.recv().await.is_none());

        assert_eq!(bus.publish(shop, created(shop)), 1);
        assert!(keep.recv().await.is_some());
    }

    #[tokio::test]
    async fn when_handle_cancels_from_elsewhere_then_receiver_ends() {
        let bus = ShopEventBus::new();
        let shop = ShopId::new();
        let mut sub = bus.subscribe(shop);

        sub.cancel_handle().cancel();

        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn when_last_subscriber_leaves_then_shop_entry_is_pruned() {
        let bus = ShopEventBus::new();
        let shop = ShopId::new();
        let mut sub = bus.subscribe(shop);
        assert_eq!(bus.shop_count(), 1);

        sub.cancel();

        assert_eq!(bus.shop_count(), 0);
        assert_eq!(bus.publish(shop, created(shop)), 0);
    }

    #[tokio::test]
    async fn when_subscription_is_dropped_then_it_unsubscribes() {
        let bus = ShopEventBus::new();
        let shop = ShopId::new();
        {
            let _sub = bus.subscribe(shop);
            assert_eq!(bus.subscriber_count(shop), 1);
        }
        assert_eq!(bus.subscriber_count(shop), 0);
        assert_eq!(bus.shop_count(), 0);
    }

    #[tokio::test]
    async fn when_delivered_as_sink_then_snapshot_is_shared() {
        let bus = ShopEventBus::new();
        let shop = ShopId::new();
        let mut sub = bus.subscribe(shop);
        let event = created(shop);

        OrderEventSink::deliver(&bus, shop, &event);

        let got = sub.recv().await.expect("delivered");
        assert!(Arc::ptr_eq(&got.order, &event.order));
        assert_eq!(got.status(), OrderStatus::New);
    }
}
