//! Order use cases.
//!
//! The three write paths (create, status update, delete) are the only places
//! order events originate. Each commits through `OrderRepo` first and publishes
//! exactly one envelope afterwards; a failed write publishes nothing.

mod create;
mod delete;
mod error;
mod publisher;
mod read;
mod update_status;

pub use create::CreateOrder;
pub use delete::DeleteOrder;
pub use error::OrderError;
pub use publisher::OrderEventPublisher;
pub use read::{GetOrder, ListShopOrders};
pub use update_status::UpdateOrderStatus;

use std::sync::Arc;

use bazaar_domain::{Identity, Order, Role, ShopId};

/// Container for order use cases.
pub struct OrderUseCases {
    pub create: Arc<CreateOrder>,
    pub update_status: Arc<UpdateOrderStatus>,
    pub delete: Arc<DeleteOrder>,
    pub get: Arc<GetOrder>,
    pub list: Arc<ListShopOrders>,
}

impl OrderUseCases {
    pub fn new(
        create: Arc<CreateOrder>,
        update_status: Arc<UpdateOrderStatus>,
        delete: Arc<DeleteOrder>,
        get: Arc<GetOrder>,
        list: Arc<ListShopOrders>,
    ) -> Self {
        Self {
            create,
            update_status,
            delete,
            get,
            list,
        }
    }
}

/// Admins, and sellers of the shop, may change any of its orders.
fn can_manage(actor: &Identity, shop_id: ShopId) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Seller => actor.can_access(shop_id),
        Role::Customer => false,
    }
}

fn is_own_order(actor: &Identity, order: &Order) -> bool {
    actor.role == Role::Customer && order.customer_id == actor.user_id
}
