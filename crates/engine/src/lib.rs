//! Bazaar Engine library.
//!
//! Shop-scoped live order events for a marketplace backend.
//!
//! ## Structure
//!
//! - `use_cases/` - Order write paths (the publish call sites) and reads
//! - `infrastructure/` - Port traits, adapters, the shop event bus, configuration
//! - `api/` - HTTP, server-streaming and WebSocket entry points, the connection hub
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
