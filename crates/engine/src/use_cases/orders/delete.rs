//! Remove an order.

use std::sync::Arc;

use bazaar_domain::{Identity, Order, OrderEvent, OrderId};

use super::{can_manage, OrderError, OrderEventPublisher};
use crate::infrastructure::ports::OrderRepo;

/// Deletes an order and publishes `Deleted` carrying its last stored snapshot.
pub struct DeleteOrder {
    repo: Arc<dyn OrderRepo>,
    publisher: Arc<OrderEventPublisher>,
}

impl DeleteOrder {
    pub fn new(repo: Arc<dyn OrderRepo>, publisher: Arc<OrderEventPublisher>) -> Self {
        Self { repo, publisher }
    }

    pub async fn execute(&self, actor: &Identity, order_id: OrderId) -> Result<Order, OrderError> {
        let current = self
            .repo
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        if !can_manage(actor, current.shop_id) {
            return Err(OrderError::Forbidden);
        }

        let removed = self
            .repo
            .delete(order_id)
            .await
            .map_err(|e| OrderError::from_repo(order_id, e))?;

        tracing::info!(shop_id = %removed.shop_id, order_id = %order_id, "Order deleted");
        self.publisher.publish(OrderEvent::deleted(removed.clone()));

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockOrderEventSink, MockOrderRepo, RepoError};
    use crate::use_cases::orders::test_support::{fixed_now, stored_order};
    use bazaar_domain::{OrderEventKind, OrderStatus, Role, ShopId, UserId};

    fn publisher_expecting(times: usize) -> Arc<OrderEventPublisher> {
        let mut sink = MockOrderEventSink::new();
        sink.expect_deliver()
            .withf(|_, ev| ev.kind == OrderEventKind::Deleted)
            .times(times)
            .return_const(());
        Arc::new(OrderEventPublisher::new(vec![Arc::new(sink)]))
    }

    #[tokio::test]
    async fn when_seller_deletes_then_last_snapshot_is_published() {
        let shop_id = ShopId::new();
        let order = stored_order(shop_id, UserId::new())
            .with_status(OrderStatus::Shipping, fixed_now());
        let order_id = order.id;
        let snapshot = order.clone();

        let mut repo = MockOrderRepo::new();
        repo.expect_get().returning(move |_| Ok(Some(snapshot.clone())));
        repo.expect_delete()
            .times(1)
            .returning(move |_| Ok(order.clone()));

        let use_case = DeleteOrder::new(Arc::new(repo), publisher_expecting(1));
        let removed = use_case
            .execute(&Identity::seller(UserId::new(), shop_id), order_id)
            .await
            .expect("deleted");

        assert_eq!(removed.status, OrderStatus::Shipping);
    }

    #[tokio::test]
    async fn when_customer_deletes_then_forbidden() {
        let customer = UserId::new();
        let order = stored_order(ShopId::new(), customer);
        let order_id = order.id;

        let mut repo = MockOrderRepo::new();
        repo.expect_get().returning(move |_| Ok(Some(order.clone())));
        repo.expect_delete().never();

        let use_case = DeleteOrder::new(Arc::new(repo), publisher_expecting(0));
        let err = use_case
            .execute(&Identity::new(customer, Role::Customer, Vec::new()), order_id)
            .await
            .expect_err("forbidden");

        assert!(matches!(err, OrderError::Forbidden));
    }

    #[tokio::test]
    async fn when_order_vanishes_before_delete_then_not_found_and_nothing_published() {
        let shop_id = ShopId::new();
        let order = stored_order(shop_id, UserId::new());
        let order_id = order.id;

        let mut repo = MockOrderRepo::new();
        repo.expect_get().returning(move |_| Ok(Some(order.clone())));
        repo.expect_delete()
            .returning(|id| Err(RepoError::not_found("Order", id)));

        let use_case = DeleteOrder::new(Arc::new(repo), publisher_expecting(0));
        let err = use_case
            .execute(&Identity::admin(UserId::new()), order_id)
            .await
            .expect_err("gone");

        assert!(matches!(err, OrderError::NotFound(id) if id == order_id));
    }
}
