//! Domain events
//!
//! Events communicate what happened to an aggregate after the change was
//! committed, so other parts of the system can react.

mod order_events;

pub use order_events::{OrderEvent, OrderEventKind};
