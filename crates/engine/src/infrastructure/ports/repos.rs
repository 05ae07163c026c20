//! Repository port traits for order persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use bazaar_domain::{Order, OrderId, OrderStatus, ShopId};

use super::error::RepoError;

/// The persistence layer behind the order write paths.
///
/// Every mutating call returns only after the write is committed, and hands
/// back the fully materialized order as stored.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepo: Send + Sync {
    async fn create(&self, order: &Order) -> Result<Order, RepoError>;
    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepoError>;
    async fn list_for_shop(
        &self,
        shop_id: ShopId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepoError>;
    /// Moves the order from `expected` to `status`.
    ///
    /// Fails with `RepoError::Conflict` and writes nothing when the stored
    /// status is no longer `expected`.
    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Order, RepoError>;
    /// Removes the order and returns the last stored snapshot.
    async fn delete(&self, id: OrderId) -> Result<Order, RepoError>;
}
