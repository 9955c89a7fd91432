//! Wire-level order projections.
//!
//! Every fetch strategy returns these shapes, so equality between results of
//! different strategies is plain `PartialEq`.

use crate::model::order::{Address, OrderId, OrderStatus};
use serde::{Deserialize, Serialize};

/// One order with its member, delivery address and lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order_id: OrderId,
    pub member_name: String,
    /// Unix epoch milliseconds.
    pub order_date: i64,
    pub status: OrderStatus,
    /// Delivery address.
    pub address: Address,
    /// Lines in line id order.
    pub items: Vec<OrderLineView>,
}

/// One order line as exposed on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineView {
    pub item_name: String,
    /// Line unit price.
    pub price: i64,
    pub count: u32,
}

/// To-one-only order projection, loaded directly by a DTO query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub member_name: String,
    pub order_date: i64,
    pub status: OrderStatus,
    pub address: Address,
}
