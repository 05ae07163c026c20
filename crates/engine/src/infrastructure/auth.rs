//! Identity resolution from gateway-set headers.

use std::str::FromStr;

use bazaar_domain::{Identity, Role, ShopId, UserId};

use crate::infrastructure::ports::{AuthError, Credentials, IdentityResolver};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const SHOP_IDS_HEADER: &str = "x-shop-ids";

/// Trusts identity fields placed on the request by an authenticating gateway.
///
/// The role defaults to `customer` when absent. `x-shop-ids` is a
/// comma-separated list of shop UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedHeaderResolver;

impl TrustedHeaderResolver {
    pub fn new() -> Self {
        Self
    }
}

impl IdentityResolver for TrustedHeaderResolver {
    fn resolve(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let raw_user = credentials
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingCredentials)?;
        let user_id = UserId::from_str(raw_user)
            .map_err(|_| AuthError::InvalidCredentials(format!("bad user id: {raw_user}")))?;

        let role = match credentials.role.as_deref().map(str::trim) {
            None | Some("") => Role::Customer,
            Some(raw) => Role::from_str(raw)
                .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?,
        };

        let shop_ids = match credentials.shop_ids.as_deref() {
            None => Vec::new(),
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    ShopId::from_str(s)
                        .map_err(|_| AuthError::InvalidCredentials(format!("bad shop id: {s}")))
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(Identity::new(user_id, role, shop_ids))
    }
}
