//! Infrastructure implementations.
//!
//! Contains port trait implementations and the in-process event bus.

pub mod auth;
pub mod clock;
pub mod config;
pub mod event_bus;
pub mod memory;
pub mod ports;
