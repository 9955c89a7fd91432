//! Order fetch engine.
//!
//! Reads orders with their member, delivery and lines through six data-access
//! strategies that trade round-trips, join fan-out, paging and memory against
//! each other while returning identical projections.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, FetchConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::order::{
    Address, Association, Delivery, DeliveryStatus, FlatRow, Item, Member, Order, OrderId,
    OrderItem, OrderStatus,
};
pub use model::view::{OrderLineView, OrderSummary, OrderView};
pub use repo::order_repo::{
    OrderFilter, OrderRepository, Page, SqliteOrderRepository, StoreError, StoreResult,
};
pub use service::error::{FetchError, FetchResult, LazyEdge, PagingViolation};
pub use service::order_fetch_service::{FetchStrategy, OrderFetchService};
pub use service::regroup::regroup_flat_rows;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
