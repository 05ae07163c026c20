//! Request bodies accepted by the HTTP front.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_domain::OrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    /// Defaults to the caller when omitted
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}
