//! Order entity - a customer's purchase from a single shop
//!
//! An `Order` value is a fully denormalized snapshot: its items carry the
//! product name and unit price captured at checkout, so observers never need a
//! second lookup to render it. State changes never mutate a published snapshot;
//! `with_status` hands back a fresh one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{OrderId, ProductId, ShopId, UserId};
use crate::types::OrderStatus;

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Price per unit in the smallest currency unit
    pub unit_price_cents: i64,
}

impl OrderItem {
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price_cents: i64,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price_cents,
        }
    }

    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents.saturating_mul(i64::from(self.quantity))
    }
}

/// What a caller supplies to place an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: UserId,
    pub items: Vec<OrderItem>,
    pub note: Option<String>,
}

impl NewOrder {
    pub fn new(customer_id: UserId, items: Vec<OrderItem>) -> Self {
        Self {
            customer_id,
            items,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub shop_id: ShopId,
    pub customer_id: UserId,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub total_cents: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a validated order in the `new` status.
    ///
    /// Rejects empty orders, zero quantities, and negative prices.
    pub fn new(shop_id: ShopId, input: NewOrder, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if input.items.is_empty() {
            return Err(DomainError::validation("an order needs at least one item"));
        }
        for item in &input.items {
            if item.quantity == 0 {
                return Err(DomainError::validation(format!(
                    "quantity for product {} must be positive",
                    item.product_id
                )));
            }
            if item.unit_price_cents < 0 {
                return Err(DomainError::validation(format!(
                    "price for product {} cannot be negative",
                    item.product_id
                )));
            }
            if item.product_name.trim().is_empty() {
                return Err(DomainError::validation(format!(
                    "product {} has no name",
                    item.product_id
                )));
            }
        }

        let total_cents = input
            .items
            .iter()
            .map(OrderItem::line_total_cents)
            .fold(0i64, i64::saturating_add);
        let note = input
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(Self {
            id: OrderId::new(),
            shop_id,
            customer_id: input.customer_id,
            status: OrderStatus::New,
            items: input.items,
            total_cents,
            note,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_id(mut self, id: OrderId) -> Self {
        self.id = id;
        self
    }

    /// A fresh snapshot carrying the new status.
    pub fn with_status(&self, status: OrderStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            updated_at: now,
            ..self.clone()
        }
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}
