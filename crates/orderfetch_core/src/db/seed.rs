//! Fixture writer for demo and test order data.
//!
//! # Responsibility
//! - Insert complete orders (member, delivery, items, lines) in one
//!   transaction.
//! - Provide the two-member demo data set.
//!
//! # Invariants
//! - Every inserted order has exactly one member, one delivery and at least
//!   one line.
//! - Members and items are reused by name; deliveries are never shared.

use crate::db::{DbError, DbResult};
use crate::model::order::{Address, DeliveryStatus, OrderId, OrderStatus, RowId};
use crate::repo::order_repo::{delivery_status_to_db, order_status_to_db};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

/// Base order date of the demo data set (2024-01-01T00:00:00Z).
pub const DEMO_ORDER_DATE: i64 = 1_704_067_200_000;

/// One line of a fixture order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub item_name: String,
    /// Catalog price, also captured as the line unit price.
    pub price: i64,
    pub count: u32,
}

impl NewOrderLine {
    pub fn new(item_name: impl Into<String>, price: i64, count: u32) -> Self {
        Self {
            item_name: item_name.into(),
            price,
            count,
        }
    }
}

/// Fixture order with its to-one data and lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub member_name: String,
    pub member_address: Address,
    pub delivery_address: Address,
    pub order_date: i64,
    pub status: OrderStatus,
    pub lines: Vec<NewOrderLine>,
}

impl NewOrder {
    /// Order shipped to the member's own address.
    pub fn new(
        member_name: impl Into<String>,
        address: Address,
        order_date: i64,
        lines: Vec<NewOrderLine>,
    ) -> Self {
        Self {
            member_name: member_name.into(),
            member_address: address.clone(),
            delivery_address: address,
            order_date,
            status: OrderStatus::Ordered,
            lines,
        }
    }
}

/// Inserts one order and returns its id.
pub fn insert_order(conn: &mut Connection, order: &NewOrder) -> DbResult<OrderId> {
    if order.lines.is_empty() {
        return Err(DbError::InvalidFixture(format!(
            "order for `{}` has no lines",
            order.member_name
        )));
    }
    if let Some(line) = order.lines.iter().find(|line| line.count == 0) {
        return Err(DbError::InvalidFixture(format!(
            "line `{}` has zero count",
            line.item_name
        )));
    }

    let tx = conn.transaction()?;
    let member_id = member_id_for(&tx, &order.member_name, &order.member_address)?;

    tx.execute(
        "INSERT INTO deliveries (city, street, zipcode, status) VALUES (?1, ?2, ?3, ?4);",
        params![
            order.delivery_address.city,
            order.delivery_address.street,
            order.delivery_address.zipcode,
            delivery_status_to_db(DeliveryStatus::Ready),
        ],
    )?;
    let delivery_id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO orders (member_id, delivery_id, order_date, status) VALUES (?1, ?2, ?3, ?4);",
        params![
            member_id,
            delivery_id,
            order.order_date,
            order_status_to_db(order.status),
        ],
    )?;
    let order_id = tx.last_insert_rowid();

    for line in &order.lines {
        let item_id = item_id_for(&tx, line)?;
        tx.execute(
            "INSERT INTO order_items (order_id, item_id, order_price, count)
             VALUES (?1, ?2, ?3, ?4);",
            params![order_id, item_id, line.price, line.count],
        )?;
    }

    tx.commit()?;
    Ok(order_id)
}

/// Seeds two members with one two-line order each.
pub fn seed_demo_orders(conn: &mut Connection) -> DbResult<Vec<OrderId>> {
    let orders = [
        NewOrder::new(
            "userA",
            Address::new("Seoul", "1", "1111"),
            DEMO_ORDER_DATE,
            vec![
                NewOrderLine::new("JPA1 BOOK", 10_000, 1),
                NewOrderLine::new("JPA2 BOOK", 20_000, 2),
            ],
        ),
        NewOrder::new(
            "userB",
            Address::new("Jinju", "2", "2222"),
            DEMO_ORDER_DATE + 60_000,
            vec![
                NewOrderLine::new("SPRING1 BOOK", 20_000, 3),
                NewOrderLine::new("SPRING2 BOOK", 40_000, 4),
            ],
        ),
    ];

    let mut ids = Vec::with_capacity(orders.len());
    for order in &orders {
        ids.push(insert_order(conn, order)?);
    }
    info!("event=store_seed module=db status=ok orders={}", ids.len());
    Ok(ids)
}

fn member_id_for(tx: &Transaction<'_>, name: &str, address: &Address) -> DbResult<RowId> {
    let existing = tx
        .query_row("SELECT id FROM members WHERE name = ?1;", [name], |row| {
            row.get(0)
        })
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    tx.execute(
        "INSERT INTO members (name, city, street, zipcode) VALUES (?1, ?2, ?3, ?4);",
        params![name, address.city, address.street, address.zipcode],
    )?;
    Ok(tx.last_insert_rowid())
}

fn item_id_for(tx: &Transaction<'_>, line: &NewOrderLine) -> DbResult<RowId> {
    let existing = tx
        .query_row(
            "SELECT id FROM items WHERE name = ?1;",
            [line.item_name.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    tx.execute(
        "INSERT INTO items (name, price, stock_quantity) VALUES (?1, ?2, 100);",
        params![line.item_name, line.price],
    )?;
    Ok(tx.last_insert_rowid())
}
