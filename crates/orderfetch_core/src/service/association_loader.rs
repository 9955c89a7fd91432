//! Lazy association resolution inside an open store session.
//!
//! # Responsibility
//! - Resolve pending edges one read per edge (graph walk).
//! - Resolve pending line collections in `IN (...)` batches.
//!
//! # Invariants
//! - To-one edges of an order are resolved before its lines.
//! - A closed session surfaces as `UnresolvedLazyAccess`, never as empty data.

use crate::model::order::{Order, OrderId, OrderItem};
use crate::repo::order_repo::OrderRepository;
use crate::service::error::{FetchError, FetchResult, LazyEdge};
use indexmap::IndexSet;
use log::debug;
use std::collections::HashMap;

/// Resolves every pending edge of `order` with one read per edge.
pub fn resolve_graph<R: OrderRepository>(repo: &R, order: &mut Order) -> FetchResult<()> {
    if let Some(member_id) = order.member.pending_key() {
        let member = repo
            .load_member(member_id)
            .map_err(|err| FetchError::from_lazy_load(err, order.id, LazyEdge::Member))?;
        order.member.resolve(member);
    }

    if let Some(delivery_id) = order.delivery.pending_key() {
        let delivery = repo
            .load_delivery(delivery_id)
            .map_err(|err| FetchError::from_lazy_load(err, order.id, LazyEdge::Delivery))?;
        order.delivery.resolve(delivery);
    }

    resolve_items(repo, order)
}

/// Resolves the pending line collection of one order with a single read.
pub fn resolve_items<R: OrderRepository>(repo: &R, order: &mut Order) -> FetchResult<()> {
    if let Some(order_id) = order.items.pending_key() {
        let items = repo
            .load_order_items(order_id)
            .map_err(|err| FetchError::from_lazy_load(err, order.id, LazyEdge::Items))?;
        order.items.resolve(items);
    }
    Ok(())
}

/// Batched line loader.
///
/// Pending parent keys are collected in root order and loaded
/// `batch_size` at a time, turning N collection reads into
/// `ceil(N / batch_size)` reads. Wider batches mean fewer reads and longer
/// `IN` lists; memory use is the same for any batch size.
pub struct BatchedAssociationLoader<'r, R: OrderRepository> {
    repo: &'r R,
    batch_size: usize,
}

impl<'r, R: OrderRepository> BatchedAssociationLoader<'r, R> {
    pub fn new(repo: &'r R, batch_size: u32) -> Self {
        Self {
            repo,
            batch_size: usize::try_from(batch_size).unwrap_or(usize::MAX).max(1),
        }
    }

    /// Resolves every pending line collection and returns the number of
    /// batch reads issued.
    pub fn resolve_items(&self, orders: &mut [Order]) -> FetchResult<usize> {
        let pending: IndexSet<OrderId> = orders
            .iter()
            .filter_map(|order| order.items.pending_key())
            .collect();
        if pending.is_empty() {
            return Ok(0);
        }

        let keys: Vec<OrderId> = pending.into_iter().collect();
        let mut loaded: HashMap<OrderId, Vec<OrderItem>> = HashMap::with_capacity(keys.len());
        let mut batches = 0;
        for chunk in keys.chunks(self.batch_size) {
            let children = self
                .repo
                .fetch_children_by_root_ids(chunk)
                .map_err(|err| FetchError::from_lazy_load(err, chunk[0], LazyEdge::Items))?;
            loaded.extend(children);
            batches += 1;
        }

        for order in orders.iter_mut() {
            if let Some(order_id) = order.items.pending_key() {
                order
                    .items
                    .resolve(loaded.remove(&order_id).unwrap_or_default());
            }
        }

        debug!(
            "event=batch_association_load module=fetch status=ok parents={} batch_size={} batches={batches}",
            keys.len(),
            self.batch_size
        );
        Ok(batches)
    }
}
