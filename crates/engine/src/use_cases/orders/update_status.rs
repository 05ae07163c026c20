//! Move an order to a new status.

use std::sync::Arc;

use bazaar_domain::{Identity, Order, OrderEvent, OrderId, OrderStatus};

use super::{can_manage, is_own_order, OrderError, OrderEventPublisher};
use crate::infrastructure::ports::{ClockPort, OrderRepo};

/// Applies a status transition and publishes `StatusChanged` with the stored snapshot.
///
/// Sellers and admins may make any legal transition. A customer may only cancel
/// their own order.
pub struct UpdateOrderStatus {
    repo: Arc<dyn OrderRepo>,
    publisher: Arc<OrderEventPublisher>,
    clock: Arc<dyn ClockPort>,
}

impl UpdateOrderStatus {
    pub fn new(
        repo: Arc<dyn OrderRepo>,
        publisher: Arc<OrderEventPublisher>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            repo,
            publisher,
            clock,
        }
    }

    pub async fn execute(
        &self,
        actor: &Identity,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let current = self
            .repo
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        let permitted = can_manage(actor, current.shop_id)
            || (is_own_order(actor, &current) && status == OrderStatus::Cancelled);
        if !permitted {
            return Err(OrderError::Forbidden);
        }

        current.status.ensure_transition(status)?;

        let updated = self
            .repo
            .update_status(order_id, current.status, status, self.clock.now())
            .await
            .map_err(|e| OrderError::from_repo(order_id, e))?;

        tracing::info!(
            shop_id = %updated.shop_id,
            order_id = %order_id,
            from = %current.status,
            to = %updated.status,
            "Order status changed"
        );
        self.publisher
            .publish(OrderEvent::status_changed(updated.clone()));

        Ok(updated)
    }
}
