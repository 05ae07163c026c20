//! In-memory order store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use bazaar_domain::{Order, OrderId, OrderStatus, ShopId};

use crate::infrastructure::ports::{OrderRepo, RepoError};

/// Process-local `OrderRepo`. Writes are committed once the lock is released.
#[derive(Default)]
pub struct InMemoryOrderRepo {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepo for InMemoryOrderRepo {
    async fn create(&self, order: &Order) -> Result<Order, RepoError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(RepoError::constraint(format!(
                "order {} already exists",
                order.id
            )));
        }
        orders.insert(order.id, order.clone());
        Ok(order.clone())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_for_shop(
        &self,
        shop_id: ShopId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepoError> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|o| o.shop_id == shop_id)
            .filter(|o| status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(matching)
    }

    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Order, RepoError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("Order", id))?;
        if order.status != expected {
            return Err(RepoError::conflict(format!(
                "order {id} is {}, expected {expected}",
                order.status
            )));
        }
        *order = order.with_status(status, updated_at);
        Ok(order.clone())
    }

    async fn delete(&self, id: OrderId) -> Result<Order, RepoError> {
        self.orders
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| RepoError::not_found("Order", id))
    }
}
