//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - Order persistence (the write path that commits before anything is published)
//! - Event fan-out sinks (shop event bus, socket hub)
//! - Identity resolution (the authentication layer in front of every subscription)
//! - Clock (for testing)

mod error;
mod external;
mod repos;
mod testing;

pub use error::{AuthError, RepoError};
pub use external::{Credentials, IdentityResolver, OrderEventSink};
pub use repos::OrderRepo;
pub use testing::ClockPort;

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::MockOrderEventSink;
#[cfg(test)]
pub use repos::MockOrderRepo;
#[cfg(test)]
pub use testing::MockClockPort;
