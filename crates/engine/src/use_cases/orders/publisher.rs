//! The single publish call site for committed order changes.

use std::sync::Arc;

use bazaar_domain::OrderEvent;

use crate::infrastructure::ports::OrderEventSink;

/// Hands every committed order event to each injected sink, in registration order.
///
/// Sinks are independent: what one drops or evicts has no bearing on the others.
pub struct OrderEventPublisher {
    sinks: Vec<Arc<dyn OrderEventSink>>,
}

impl OrderEventPublisher {
    pub fn new(sinks: Vec<Arc<dyn OrderEventSink>>) -> Self {
        Self { sinks }
    }

    pub fn publish(&self, event: OrderEvent) {
        let shop_id = event.shop_id();
        for sink in &self.sinks {
            sink.deliver(shop_id, &event);
        }
        tracing::debug!(
            shop_id = %shop_id,
            order_id = %event.order.id,
            kind = event.kind.as_str(),
            sinks = self.sinks.len(),
            "Published order event"
        );
    }
}
