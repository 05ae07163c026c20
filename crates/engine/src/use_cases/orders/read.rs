//! Read paths. These never publish.

use std::sync::Arc;

use bazaar_domain::{Identity, Order, OrderId, OrderStatus, ShopId};

use super::{is_own_order, OrderError};
use crate::infrastructure::ports::OrderRepo;

pub struct GetOrder {
    repo: Arc<dyn OrderRepo>,
}

impl GetOrder {
    pub fn new(repo: Arc<dyn OrderRepo>) -> Self {
        Self { repo }
    }

    /// Anyone with access to the shop, or the customer who placed the order.
    pub async fn execute(&self, actor: &Identity, order_id: OrderId) -> Result<Order, OrderError> {
        let order = self
            .repo
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        if !actor.can_access(order.shop_id) && !is_own_order(actor, &order) {
            return Err(OrderError::Forbidden);
        }
        Ok(order)
    }
}

pub struct ListShopOrders {
    repo: Arc<dyn OrderRepo>,
}

impl ListShopOrders {
    pub fn new(repo: Arc<dyn OrderRepo>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        actor: &Identity,
        shop_id: ShopId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, OrderError> {
        if !actor.can_access(shop_id) {
            return Err(OrderError::Forbidden);
        }
        Ok(self.repo.list_for_shop(shop_id, status).await?)
    }
}
