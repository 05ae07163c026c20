//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific domain area.

pub mod orders;

pub use orders::{OrderEventPublisher, OrderUseCases};
