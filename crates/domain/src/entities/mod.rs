//! Domain entities.

mod order;

pub use order::{NewOrder, Order, OrderItem};
