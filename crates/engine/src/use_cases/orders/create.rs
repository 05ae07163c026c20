//! Place a new order.

use std::sync::Arc;

use bazaar_domain::{Identity, NewOrder, Order, OrderEvent, Role, ShopId};

use super::{can_manage, OrderError, OrderEventPublisher};
use crate::infrastructure::ports::{ClockPort, OrderRepo};

/// Validates and stores a new order, then publishes `Created`.
///
/// Customers may order from any shop, but only on their own behalf. Sellers and
/// admins may record an order for any customer of a shop they manage.
pub struct CreateOrder {
    repo: Arc<dyn OrderRepo>,
    publisher: Arc<OrderEventPublisher>,
    clock: Arc<dyn ClockPort>,
}

impl CreateOrder {
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
        shop_id: ShopId,
        input: NewOrder,
    ) -> Result<Order, OrderError> {
        let permitted = match actor.role {
            Role::Customer => input.customer_id == actor.user_id,
            _ => can_manage(actor, shop_id),
        };
        if !permitted {
            return Err(OrderError::Forbidden);
        }

        let order = Order::new(shop_id, input, self.clock.now())?;
        let stored = self.repo.create(&order).await?;

        tracing::info!(
            shop_id = %shop_id,
            order_id = %stored.id,
            total_cents = stored.total_cents,
            "Order created"
        );
        self.publisher.publish(OrderEvent::created(stored.clone()));

        Ok(stored)
    }
}
