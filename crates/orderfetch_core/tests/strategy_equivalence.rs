mod common;

use common::{demo_store, five_order_store};
use orderfetch_core::{
    Address, FetchStrategy, OrderFetchService, OrderFilter, OrderStatus, OrderView,
    SqliteOrderRepository,
};
use rusqlite::Connection;

fn fetch_all(
    conn: &Connection,
    strategy: FetchStrategy,
    filter: &OrderFilter,
) -> Vec<OrderView> {
    let service = OrderFetchService::new(SqliteOrderRepository::new(conn));
    service.fetch(strategy, filter, None).unwrap()
}

#[test]
fn every_strategy_returns_the_same_projections() {
    let (conn, ids) = five_order_store();
    let baseline = fetch_all(&conn, FetchStrategy::GraphWalk, &OrderFilter::default());
    assert_eq!(baseline.len(), ids.len());

    for strategy in FetchStrategy::ALL {
        let views = fetch_all(&conn, strategy, &OrderFilter::default());
        assert_eq!(views, baseline, "strategy {strategy} diverged");
    }
}

#[test]
fn demo_orders_project_member_address_and_lines() {
    let (conn, ids) = demo_store();

    for strategy in FetchStrategy::ALL {
        let views = fetch_all(&conn, strategy, &OrderFilter::default());
        assert_eq!(views.len(), 2);

        let first = &views[0];
        assert_eq!(first.order_id, ids[0]);
        assert_eq!(first.member_name, "userA");
        assert_eq!(first.status, OrderStatus::Ordered);
        assert_eq!(first.address, Address::new("Seoul", "1", "1111"));
        let lines: Vec<_> = first
            .items
            .iter()
            .map(|line| (line.item_name.as_str(), line.price, line.count))
            .collect();
        assert_eq!(lines, [("JPA1 BOOK", 10_000, 1), ("JPA2 BOOK", 20_000, 2)]);

        let second = &views[1];
        assert_eq!(second.member_name, "userB");
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.items[1].item_name, "SPRING2 BOOK");
    }
}

#[test]
fn member_name_filter_applies_to_every_strategy() {
    let (conn, _) = five_order_store();
    let filter = OrderFilter::by_member_name("userA");

    for strategy in FetchStrategy::ALL {
        let views = fetch_all(&conn, strategy, &filter);
        assert_eq!(views.len(), 2, "strategy {strategy}");
        assert!(views.iter().all(|view| view.member_name == "userA"));
    }
}

#[test]
fn blank_member_name_filter_is_ignored() {
    let (conn, ids) = five_order_store();
    let views = fetch_all(
        &conn,
        FetchStrategy::IdListChildren,
        &OrderFilter::by_member_name("   "),
    );
    assert_eq!(views.len(), ids.len());
}

#[test]
fn status_filter_without_matches_returns_empty_for_every_strategy() {
    let (conn, _) = demo_store();
    let filter = OrderFilter::by_status(OrderStatus::Canceled);

    for strategy in FetchStrategy::ALL {
        assert!(fetch_all(&conn, strategy, &filter).is_empty());
    }
}

#[test]
fn canceled_orders_are_selected_by_status_filter() {
    let (conn, ids) = five_order_store();
    conn.execute(
        "UPDATE orders SET status = 'canceled' WHERE id = ?1;",
        [ids[3]],
    )
    .unwrap();

    for strategy in FetchStrategy::ALL {
        let filter = OrderFilter::by_status(OrderStatus::Canceled);
        let views = fetch_all(&conn, strategy, &filter);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].order_id, ids[3]);
        assert_eq!(views[0].status, OrderStatus::Canceled);
    }
}

#[test]
fn order_view_serializes_to_wire_shape() {
    let (conn, _) = demo_store();
    let views = fetch_all(&conn, FetchStrategy::FlatRows, &OrderFilter::default());

    let json = serde_json::to_value(&views[0]).unwrap();
    assert_eq!(json["memberName"], "userA");
    assert_eq!(json["status"], "ORDERED");
    assert_eq!(json["address"]["city"], "Seoul");
    assert_eq!(json["items"][0]["itemName"], "JPA1 BOOK");
    assert_eq!(json["items"][0]["price"], 10_000);
    assert_eq!(json["items"][1]["count"], 2);
    assert!(json.get("orderId").is_some());
    assert!(json.get("orderDate").is_some());
}
