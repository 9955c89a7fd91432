#![allow(dead_code)]

use orderfetch_core::db::open_db_in_memory;
use orderfetch_core::db::seed::{insert_order, seed_demo_orders, NewOrder, NewOrderLine};
use orderfetch_core::{Address, OrderId};
use rusqlite::Connection;

pub fn demo_store() -> (Connection, Vec<OrderId>) {
    let mut conn = open_db_in_memory().unwrap();
    let ids = seed_demo_orders(&mut conn).unwrap();
    (conn, ids)
}

/// Five orders from three members with 1, 3, 2, 1 and 4 lines.
pub fn five_order_store() -> (Connection, Vec<OrderId>) {
    store_with_line_counts(&[1, 3, 2, 1, 4])
}

/// One order per entry, each with the given number of lines.
pub fn store_with_line_counts(line_counts: &[u32]) -> (Connection, Vec<OrderId>) {
    let mut conn = open_db_in_memory().unwrap();
    let members = [
        ("userA", Address::new("Seoul", "1", "1111")),
        ("userB", Address::new("Jinju", "2", "2222")),
        ("userC", Address::new("Busan", "3", "3333")),
    ];

    let mut ids = Vec::new();
    for (index, line_count) in line_counts.iter().enumerate() {
        let (member_name, address) = &members[index % members.len()];
        let lines = (0..*line_count)
            .map(|line| {
                NewOrderLine::new(
                    format!("BOOK-{index}-{line}"),
                    1_000 * i64::from(line + 1),
                    line + 1,
                )
            })
            .collect();
        let order = NewOrder::new(
            *member_name,
            address.clone(),
            1_700_000_000_000 + index as i64,
            lines,
        );
        ids.push(insert_order(&mut conn, &order).unwrap());
    }
    (conn, ids)
}
