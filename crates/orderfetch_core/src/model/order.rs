//! Order aggregate entities as read from the store.
//!
//! # Invariants
//! - An `Order` references exactly one member and one delivery.
//! - `Order::items` keeps line order (order item id ascending).
//! - Entities are read-only for the fetch engine.

use serde::{Deserialize, Serialize};

/// Store row identifier shared by every entity table.
pub type RowId = i64;
pub type OrderId = RowId;
pub type MemberId = RowId;
pub type DeliveryId = RowId;
pub type ItemId = RowId;
pub type OrderItemId = RowId;

/// Order lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Ordered,
    Canceled,
}

/// Delivery lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Ready,
    Comp,
}

/// Postal address value object. Copied by value wherever it is embedded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    pub street: String,
    pub zipcode: String,
}

impl Address {
    pub fn new(
        city: impl Into<String>,
        street: impl Into<String>,
        zipcode: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            street: street.into(),
            zipcode: zipcode.into(),
        }
    }
}

/// State of a lazily loaded edge.
///
/// Mapping code has to match on `Pending` explicitly; nothing resolves an
/// edge implicitly behind the caller's back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Association<T> {
    /// Edge contents were loaded while the store session was open.
    Resolved(T),
    /// Edge not loaded yet. `key` is the row id the loader needs.
    Pending { key: RowId },
}

impl<T> Association<T> {
    pub fn pending(key: RowId) -> Self {
        Self::Pending { key }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn as_resolved(&self) -> Option<&T> {
        match self {
            Self::Resolved(value) => Some(value),
            Self::Pending { .. } => None,
        }
    }

    /// Returns the loader key while the edge is still pending.
    pub fn pending_key(&self) -> Option<RowId> {
        match self {
            Self::Resolved(_) => None,
            Self::Pending { key } => Some(*key),
        }
    }

    pub fn resolve(&mut self, value: T) {
        *self = Self::Resolved(value);
    }
}

/// Customer owning orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub address: Address,
}

/// Shipment record owned by exactly one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub id: DeliveryId,
    pub address: Address,
    pub status: DeliveryStatus,
}

/// Catalog item referenced by order lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub price: i64,
}

/// One order line. Destroyed together with its order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub item: Item,
    /// Unit price captured when the order was placed.
    pub order_price: i64,
    pub count: u32,
}

/// Order root entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    /// Unix epoch milliseconds.
    pub order_date: i64,
    pub member: Association<Member>,
    pub delivery: Association<Delivery>,
    /// Pending key is the order id itself.
    pub items: Association<Vec<OrderItem>>,
}

/// Denormalized row from the wide order/member/delivery/item join.
///
/// To-one columns repeat once per order line. Only lives inside the flat
/// fetch strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub order_id: OrderId,
    pub member_name: String,
    pub order_date: i64,
    pub status: OrderStatus,
    pub address: Address,
    pub item_name: String,
    pub order_price: i64,
    pub count: u32,
}
