//! Shared vocabulary types.

mod identity;
pub use identity::{Identity, Role};

mod order_status;
pub use order_status::OrderStatus;
