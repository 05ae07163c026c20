//! Port traits for collaborators outside the order write path:
//! event fan-out sinks and the authentication layer.

use bazaar_domain::{Identity, OrderEvent, ShopId};

use super::error::AuthError;

// =============================================================================
// Event Fan-out
// =============================================================================

/// A destination for committed order events.
///
/// `deliver` must not block and cannot fail: a sink that cannot keep up drops
/// or evicts on its own side.
#[cfg_attr(test, mockall::automock)]
pub trait OrderEventSink: Send + Sync {
    fn deliver(&self, shop_id: ShopId, event: &OrderEvent);
}

// =============================================================================
// Authentication
// =============================================================================

/// Raw, unverified caller credentials as presented to a transport front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user_id: Option<String>,
    pub role: Option<String>,
    pub shop_ids: Option<String>,
}

/// Resolves credentials into an identity with its permitted shop scope.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, credentials: &Credentials) -> Result<Identity, AuthError>;
}
