//! Bazaar domain: orders, the events they emit, and who may see them.

pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod types;
pub mod value_objects;

pub use entities::{NewOrder, Order, OrderItem};
pub use error::DomainError;
pub use events::{OrderEvent, OrderEventKind};
pub use ids::{ClientId, OrderId, ProductId, ShopId, UserId};
pub use types::{Identity, OrderStatus, Role};
pub use value_objects::StatusFilter;
