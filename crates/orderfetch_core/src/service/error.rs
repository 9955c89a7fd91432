//! Fetch engine error kinds.

use crate::model::order::OrderId;
use crate::repo::order_repo::StoreError;
use crate::service::order_fetch_service::FetchStrategy;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type FetchResult<T> = Result<T, FetchError>;

/// Lazy edge of an order aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LazyEdge {
    Member,
    Delivery,
    Items,
}

impl LazyEdge {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Delivery => "delivery",
            Self::Items => "items",
        }
    }
}

/// Why a paging request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingViolation {
    /// Strategy joins the collection, so a row window is not an order window.
    NotPageable(FetchStrategy),
    ZeroLimit,
    LimitAboveCeiling { limit: u32, ceiling: u32 },
}

impl Display for PagingViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPageable(strategy) => {
                write!(f, "strategy `{strategy}` does not support paging")
            }
            Self::ZeroLimit => write!(f, "limit must be positive"),
            Self::LimitAboveCeiling { limit, ceiling } => {
                write!(f, "limit {limit} exceeds the IN-clause ceiling {ceiling}")
            }
        }
    }
}

/// Failure of one fetch request. Never recovered inside the engine.
#[derive(Debug)]
pub enum FetchError {
    /// An edge needed for projection was not loaded while the session was open.
    UnresolvedLazyAccess { order_id: OrderId, edge: LazyEdge },
    /// Rejected before any store access.
    InvalidPagingRequest(PagingViolation),
    /// The store failed a read.
    StoreAccessFailure(StoreError),
    /// Flat rows of one order disagree on a to-one field.
    InconsistentFlatGroup {
        order_id: OrderId,
        field: &'static str,
    },
}

impl FetchError {
    /// Maps a failed lazy load. A closed session means the edge escaped its
    /// scope unresolved.
    pub(crate) fn from_lazy_load(err: StoreError, order_id: OrderId, edge: LazyEdge) -> Self {
        match err {
            StoreError::SessionClosed => Self::UnresolvedLazyAccess { order_id, edge },
            other => Self::StoreAccessFailure(other),
        }
    }

    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnresolvedLazyAccess { .. } => "unresolved_lazy_access",
            Self::InvalidPagingRequest(_) => "invalid_paging_request",
            Self::StoreAccessFailure(_) => "store_access_failure",
            Self::InconsistentFlatGroup { .. } => "inconsistent_flat_group",
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnresolvedLazyAccess { order_id, edge } => write!(
                f,
                "order {order_id}: `{}` edge was not resolved inside the store session",
                edge.as_str()
            ),
            Self::InvalidPagingRequest(violation) => {
                write!(f, "invalid paging request: {violation}")
            }
            Self::StoreAccessFailure(err) => write!(f, "store access failed: {err}"),
            Self::InconsistentFlatGroup { order_id, field } => write!(
                f,
                "flat rows of order {order_id} disagree on `{field}`"
            ),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreAccessFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for FetchError {
    fn from(value: StoreError) -> Self {
        Self::StoreAccessFailure(value)
    }
}

impl From<PagingViolation> for FetchError {
    fn from(value: PagingViolation) -> Self {
        Self::InvalidPagingRequest(value)
    }
}
