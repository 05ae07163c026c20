//! Bazaar Protocol - types shared by the engine and its clients
//!
//! - Wire-format DTOs (REST + SSE)
//! - WebSocket message types (ClientMessage, ServerMessage)
//! - Request bodies
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - serde, uuid, chrono, and domain vocabulary types
//! 2. **No business logic** - pure data types and serialization
//! 3. **No domain IDs** - use raw `uuid::Uuid` in DTOs

pub mod dto;
pub mod messages;
pub mod requests;

pub use dto::{OrderData, OrderEventData, OrderItemData};
pub use messages::{ClientMessage, ServerMessage};
pub use requests::{CreateOrderRequest, OrderItemInput, UpdateOrderStatusRequest};
