//! Order event envelope
//!
//! The unit broadcast to live observers of a shop: what happened, plus the
//! order snapshot as it stood right after the write committed.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entities::Order;
use crate::ids::ShopId;
use crate::types::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventKind {
    Created,
    StatusChanged,
    Deleted,
}

impl OrderEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEventKind::Created => "created",
            OrderEventKind::StatusChanged => "status_changed",
            OrderEventKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for OrderEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable envelope; clones share the same snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEvent {
    pub kind: OrderEventKind,
    pub order: Arc<Order>,
}

impl OrderEvent {
    pub fn new(kind: OrderEventKind, order: Order) -> Self {
        Self {
            kind,
            order: Arc::new(order),
        }
    }

    pub fn created(order: Order) -> Self {
        Self::new(OrderEventKind::Created, order)
    }

    pub fn status_changed(order: Order) -> Self {
        Self::new(OrderEventKind::StatusChanged, order)
    }

    pub fn deleted(order: Order) -> Self {
        Self::new(OrderEventKind::Deleted, order)
    }

    /// Routing key. Not re-checked against permissions at delivery time.
    pub fn shop_id(&self) -> ShopId {
        self.order.shop_id
    }

    pub fn status(&self) -> OrderStatus {
        self.order.status
    }
}
