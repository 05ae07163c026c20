//! Status filter for live order streams.

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::DomainError;
use crate::events::OrderEvent;
use crate::types::OrderStatus;

/// Set of statuses an observer cares about. Empty means "everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFilter {
    statuses: BTreeSet<OrderStatus>,
}

impl StatusFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only(statuses: impl IntoIterator<Item = OrderStatus>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn statuses(&self) -> impl Iterator<Item = &OrderStatus> {
        self.statuses.iter()
    }

    pub fn accepts_status(&self, status: OrderStatus) -> bool {
        self.statuses.is_empty() || self.statuses.contains(&status)
    }

    /// Filtering looks at the snapshot's status, whatever the event kind.
    pub fn accepts(&self, event: &OrderEvent) -> bool {
        self.accepts_status(event.status())
    }
}

impl FromStr for StatusFilter {
    type Err = DomainError;

    /// Parses a comma-separated list such as `"completed,cancelled"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(OrderStatus::from_str)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(|statuses| Self { statuses })
    }
}
