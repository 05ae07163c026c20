//! Wire-format DTOs.
//!
//! Ids travel as raw `uuid::Uuid`; conversion from domain types lives here so
//! every front serializes an order the same way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_domain::{Order, OrderEvent, OrderEventKind, OrderItem, OrderStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemData {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderData {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub items: Vec<OrderItemData>,
    pub total_cents: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload of one server-streamed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEventData {
    pub kind: OrderEventKind,
    pub order: OrderData,
}

impl From<&OrderItem> for OrderItemData {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.to_uuid(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
        }
    }
}

impl From<&Order> for OrderData {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_uuid(),
            shop_id: order.shop_id.to_uuid(),
            customer_id: order.customer_id.to_uuid(),
            status: order.status,
            items: order.items.iter().map(OrderItemData::from).collect(),
            total_cents: order.total_cents,
            note: order.note.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

impl From<&OrderEvent> for OrderEventData {
    fn from(event: &OrderEvent) -> Self {
        Self {
            kind: event.kind,
            order: OrderData::from(event.order.as_ref()),
        }
    }
}
