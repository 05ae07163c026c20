//! WebSocket message types.
//!
//! Every server frame is a JSON object `{"type": ..., "payload": ...}`.

use serde::{Deserialize, Serialize};

use bazaar_domain::OrderEventKind;

use crate::dto::OrderData;

// =============================================================================
// Client Messages (socket -> Engine)
// =============================================================================

/// Messages a socket client may send. The engine reads them only to keep the
/// connection alive; none of them triggers application behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    Heartbeat,
    /// Forward-compatibility fallback for newer variants
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Server Messages (Engine -> socket)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    OrderCreated(OrderData),
    OrderStatusChanged(OrderData),
    OrderDeleted(OrderData),
}

impl ServerMessage {
    pub fn for_event(kind: OrderEventKind, order: OrderData) -> Self {
        match kind {
            OrderEventKind::Created => ServerMessage::OrderCreated(order),
            OrderEventKind::StatusChanged => ServerMessage::OrderStatusChanged(order),
            OrderEventKind::Deleted => ServerMessage::OrderDeleted(order),
        }
    }

    /// The `type` tag as it appears on the wire.
    pub fn type_name(&self) -> &'static str {
        match self {
            ServerMessage::OrderCreated(_) => Self::type_name_for(OrderEventKind::Created),
            ServerMessage::OrderStatusChanged(_) => {
                Self::type_name_for(OrderEventKind::StatusChanged)
            }
            ServerMessage::OrderDeleted(_) => Self::type_name_for(OrderEventKind::Deleted),
        }
    }

    /// Wire name used for an event kind, on the socket and as the SSE event name.
    pub fn type_name_for(kind: OrderEventKind) -> &'static str {
        match kind {
            OrderEventKind::Created => "order_created",
            OrderEventKind::StatusChanged => "order_status_changed",
            OrderEventKind::Deleted => "order_deleted",
        }
    }

    pub fn order(&self) -> &OrderData {
        match self {
            ServerMessage::OrderCreated(order)
            | ServerMessage::OrderStatusChanged(order)
            | ServerMessage::OrderDeleted(order) => order,
        }
    }
}
