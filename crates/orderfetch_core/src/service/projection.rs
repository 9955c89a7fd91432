//! Projection builder from entities and DTO rows to wire views.
//!
//! # Invariants
//! - A pending edge is an error, never an empty or default field.
//! - No store access happens here.

use crate::model::order::{Association, Order, OrderId, OrderItem};
use crate::model::view::{OrderLineView, OrderSummary, OrderView};
use crate::service::error::{FetchError, FetchResult, LazyEdge};

/// Projects one fully resolved order graph.
pub fn project_order(order: &Order) -> FetchResult<OrderView> {
    let member = resolved(&order.member, order.id, LazyEdge::Member)?;
    let delivery = resolved(&order.delivery, order.id, LazyEdge::Delivery)?;
    let items = resolved(&order.items, order.id, LazyEdge::Items)?;

    Ok(OrderView {
        order_id: order.id,
        member_name: member.name.clone(),
        order_date: order.order_date,
        status: order.status,
        address: delivery.address.clone(),
        items: project_lines(items),
    })
}

pub fn project_orders(orders: &[Order]) -> FetchResult<Vec<OrderView>> {
    orders.iter().map(project_order).collect()
}

/// Projects lines keeping their order.
pub fn project_lines(items: &[OrderItem]) -> Vec<OrderLineView> {
    items
        .iter()
        .map(|line| OrderLineView {
            item_name: line.item.name.clone(),
            price: line.order_price,
            count: line.count,
        })
        .collect()
}

/// Attaches separately loaded lines to a to-one summary.
pub fn project_summary(summary: OrderSummary, items: &[OrderItem]) -> OrderView {
    OrderView {
        order_id: summary.order_id,
        member_name: summary.member_name,
        order_date: summary.order_date,
        status: summary.status,
        address: summary.address,
        items: project_lines(items),
    }
}

fn resolved<T>(edge: &Association<T>, order_id: OrderId, kind: LazyEdge) -> FetchResult<&T> {
    edge.as_resolved()
        .ok_or(FetchError::UnresolvedLazyAccess {
            order_id,
            edge: kind,
        })
}

#[cfg(test)]
mod tests {
    use super::{project_order, project_summary};
    use crate::model::order::{
        Address, Association, Delivery, DeliveryStatus, Item, Member, Order, OrderItem,
        OrderStatus,
    };
    use crate::model::view::OrderSummary;
    use crate::service::error::{FetchError, LazyEdge};

    fn line(id: i64, name: &str, price: i64, count: u32) -> OrderItem {
        OrderItem {
            id,
            order_id: 1,
            item: Item {
                id,
                name: name.to_string(),
                price,
            },
            order_price: price,
            count,
        }
    }

    fn resolved_order() -> Order {
        Order {
            id: 1,
            status: OrderStatus::Ordered,
            order_date: 1_700_000_000_000,
            member: Association::Resolved(Member {
                id: 7,
                name: "userA".to_string(),
                address: Address::new("Seoul", "1", "1111"),
            }),
            delivery: Association::Resolved(Delivery {
                id: 9,
                address: Address::new("Seoul", "1", "1111"),
                status: DeliveryStatus::Ready,
            }),
            items: Association::Resolved(vec![
                line(1, "JPA1 BOOK", 10_000, 1),
                line(2, "JPA2 BOOK", 20_000, 2),
            ]),
        }
    }

    #[test]
    fn resolved_graph_projects_lines_in_order() {
        let view = project_order(&resolved_order()).unwrap();
        assert_eq!(view.member_name, "userA");
        let names: Vec<_> = view.items.iter().map(|l| l.item_name.as_str()).collect();
        assert_eq!(names, ["JPA1 BOOK", "JPA2 BOOK"]);
        assert_eq!(view.items[1].price, 20_000);
    }

    #[test]
    fn pending_member_is_reported_instead_of_defaulted() {
        let mut order = resolved_order();
        order.member = Association::pending(7);

        let err = project_order(&order).unwrap_err();
        assert!(matches!(
            err,
            FetchError::UnresolvedLazyAccess {
                order_id: 1,
                edge: LazyEdge::Member
            }
        ));
    }

    #[test]
    fn pending_items_are_reported() {
        let mut order = resolved_order();
        order.items = Association::pending(1);

        let err = project_order(&order).unwrap_err();
        assert!(matches!(
            err,
            FetchError::UnresolvedLazyAccess {
                edge: LazyEdge::Items,
                ..
            }
        ));
    }

    #[test]
    fn summary_projection_matches_graph_projection() {
        let order = resolved_order();
        let summary = OrderSummary {
            order_id: 1,
            member_name: "userA".to_string(),
            order_date: order.order_date,
            status: OrderStatus::Ordered,
            address: Address::new("Seoul", "1", "1111"),
        };
        let items = order.items.as_resolved().unwrap().clone();

        assert_eq!(
            project_summary(summary, &items),
            project_order(&order).unwrap()
        );
    }
}
