//! Errors shared by the order use cases.

use bazaar_domain::{DomainError, OrderId};

use crate::infrastructure::ports::RepoError;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),
    #[error("Not permitted to access this shop's orders")]
    Forbidden,
    /// Another write changed the order first; nothing was stored or published.
    #[error("Order {0} was changed by another request")]
    Conflict(OrderId),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl OrderError {
    /// Map a repository error for `order_id`, keeping not-found and conflicts distinct.
    pub(crate) fn from_repo(order_id: OrderId, err: RepoError) -> Self {
        if err.is_not_found() {
            OrderError::NotFound(order_id)
        } else if err.is_conflict() {
            OrderError::Conflict(order_id)
        } else {
            OrderError::Repo(err)
        }
    }
}
