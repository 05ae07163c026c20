//! Caller identity as resolved by the authentication layer.

use crate::error::DomainError;
use crate::ids::{ShopId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Marketplace operator - sees every shop
    Admin,
    /// Shop owner or staff - limited to their shops
    Seller,
    /// Buyer - limited to the shops they were granted
    Customer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Seller => f.write_str("seller"),
            Role::Customer => f.write_str("customer"),
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "seller" => Ok(Role::Seller),
            "customer" => Ok(Role::Customer),
            other => Err(DomainError::parse(format!("unknown role: {other}"))),
        }
    }
}

/// Who is calling, and which shops they may observe or modify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
    pub shop_ids: Vec<ShopId>,
}

impl Identity {
    pub fn new(user_id: UserId, role: Role, shop_ids: Vec<ShopId>) -> Self {
        Self {
            user_id,
            role,
            shop_ids,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, Role::Admin, Vec::new())
    }

    pub fn seller(user_id: UserId, shop_id: ShopId) -> Self {
        Self::new(user_id, Role::Seller, vec![shop_id])
    }

    pub fn can_access(&self, shop_id: ShopId) -> bool {
        self.role == Role::Admin || self.shop_ids.contains(&shop_id)
    }
}
