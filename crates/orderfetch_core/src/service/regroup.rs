//! Re-grouping of flat join rows into order projections.
//!
//! # Responsibility
//! - Collapse one-row-per-line join output back into one view per order.
//!
//! # Invariants
//! - Single pass, no store access.
//! - Orders come out in first-seen order; lines keep input row order.
//! - Every row of one order carries the same to-one header.

use crate::model::order::{Address, FlatRow, OrderId, OrderStatus};
use crate::model::view::{OrderLineView, OrderView};
use crate::service::error::{FetchError, FetchResult};
use indexmap::map::Entry;
use indexmap::IndexMap;
use log::debug;

/// Rebuilds order views from flat rows.
///
/// The output has one view per distinct order id and exactly one line per
/// input row. A row whose member name, order date, status or address differs
/// from the first row of its order fails with `InconsistentFlatGroup`.
pub fn regroup_flat_rows(rows: Vec<FlatRow>) -> FetchResult<Vec<OrderView>> {
    let row_count = rows.len();
    let mut groups: IndexMap<OrderId, OrderView> = IndexMap::new();

    for row in rows {
        let FlatRow {
            order_id,
            member_name,
            order_date,
            status,
            address,
            item_name,
            order_price,
            count,
        } = row;
        let line = OrderLineView {
            item_name,
            price: order_price,
            count,
        };

        match groups.entry(order_id) {
            Entry::Occupied(entry) => {
                let view = entry.into_mut();
                ensure_same_header(view, &member_name, order_date, status, &address)?;
                view.items.push(line);
            }
            Entry::Vacant(entry) => {
                entry.insert(OrderView {
                    order_id,
                    member_name,
                    order_date,
                    status,
                    address,
                    items: vec![line],
                });
            }
        }
    }

    debug!(
        "event=flat_regroup module=fetch status=ok rows={row_count} orders={}",
        groups.len()
    );
    Ok(groups.into_values().collect())
}

fn ensure_same_header(
    view: &OrderView,
    member_name: &str,
    order_date: i64,
    status: OrderStatus,
    address: &Address,
) -> FetchResult<()> {
    let field = if view.member_name != member_name {
        "member_name"
    } else if view.order_date != order_date {
        "order_date"
    } else if view.status != status {
        "status"
    } else if &view.address != address {
        "address"
    } else {
        return Ok(());
    };

    Err(FetchError::InconsistentFlatGroup {
        order_id: view.order_id,
        field,
    })
}

#[cfg(test)]
mod tests {
    use super::regroup_flat_rows;
    use crate::model::order::{Address, FlatRow, OrderStatus};
    use crate::service::error::FetchError;

    fn row(order_id: i64, member: &str, item: &str, count: u32) -> FlatRow {
        FlatRow {
            order_id,
            member_name: member.to_string(),
            order_date: 1_000 * order_id,
            status: OrderStatus::Ordered,
            address: Address::new("Seoul", "1", "1111"),
            item_name: item.to_string(),
            order_price: 10_000,
            count,
        }
    }

    #[test]
    fn groups_rows_by_order_in_first_seen_order() {
        let rows = vec![
            row(4, "userB", "SPRING1 BOOK", 3),
            row(4, "userB", "SPRING2 BOOK", 4),
            row(1, "userA", "JPA1 BOOK", 1),
            row(1, "userA", "JPA2 BOOK", 2),
            row(9, "userC", "RUST BOOK", 1),
        ];

        let views = regroup_flat_rows(rows).unwrap();
        let ids: Vec<_> = views.iter().map(|view| view.order_id).collect();
        assert_eq!(ids, [4, 1, 9]);
        let line_total: usize = views.iter().map(|view| view.items.len()).sum();
        assert_eq!(line_total, 5);
    }

    #[test]
    fn preserves_line_order_within_an_order() {
        let rows = vec![
            row(1, "userA", "item1", 1),
            row(1, "userA", "item2", 2),
            row(1, "userA", "item3", 3),
        ];

        let views = regroup_flat_rows(rows).unwrap();
        assert_eq!(views.len(), 1);
        let names: Vec<_> = views[0]
            .items
            .iter()
            .map(|line| line.item_name.as_str())
            .collect();
        assert_eq!(names, ["item1", "item2", "item3"]);
    }

    #[test]
    fn interleaved_rows_still_group_per_order() {
        let rows = vec![
            row(1, "userA", "a1", 1),
            row(2, "userB", "b1", 1),
            row(1, "userA", "a2", 1),
        ];

        let views = regroup_flat_rows(rows).unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].items.len(), 2);
        assert_eq!(views[0].items[1].item_name, "a2");
    }

    #[test]
    fn empty_input_yields_no_orders() {
        assert!(regroup_flat_rows(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn diverging_to_one_field_fails_loudly() {
        let mut second = row(1, "userA", "JPA2 BOOK", 2);
        second.status = OrderStatus::Canceled;
        let rows = vec![row(1, "userA", "JPA1 BOOK", 1), second];

        let err = regroup_flat_rows(rows).unwrap_err();
        assert!(matches!(
            err,
            FetchError::InconsistentFlatGroup {
                order_id: 1,
                field: "status"
            }
        ));
    }

    #[test]
    fn diverging_member_name_is_reported_first() {
        let rows = vec![row(2, "userA", "x", 1), row(2, "userZ", "y", 1)];

        let err = regroup_flat_rows(rows).unwrap_err();
        assert!(matches!(
            err,
            FetchError::InconsistentFlatGroup {
                field: "member_name",
                ..
            }
        ));
    }
}
