//! Fetch strategy selector.
//!
//! # Responsibility
//! - Expose one read operation per fetch strategy over the same order data.
//! - Validate paging before touching the store.
//! - Emit one `orders_fetch` event per request with round-trip counts.
//!
//! # Invariants
//! - All strategies return identical projections for identical data.
//! - Roots are returned in order id ascending order.
//! - To-one edges are resolved before line collections.

use crate::config::{ConfigError, FetchConfig};
use crate::model::order::{Order, OrderId, OrderItem};
use crate::model::view::{OrderSummary, OrderView};
use crate::repo::order_repo::{OrderFilter, OrderRepository, Page};
use crate::service::association_loader::{resolve_graph, resolve_items, BatchedAssociationLoader};
use crate::service::error::{FetchError, FetchResult, PagingViolation};
use crate::service::projection::{project_orders, project_summary};
use crate::service::regroup::regroup_flat_rows;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::time::Instant;

/// Data-access strategy used to assemble order projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Root read, then one read per lazy edge per order (N+1).
    GraphWalk,
    /// Member and delivery joined; lines loaded per order.
    ToOneJoin,
    /// Everything joined in one read; duplicated roots removed in memory.
    CollectionJoin,
    /// Member and delivery joined; lines loaded in `IN (...)` batches.
    BatchedAssociation,
    /// Summary projection, then every order's lines by one id-list read.
    IdListChildren,
    /// One wide flat join, regrouped in memory.
    FlatRows,
}

impl FetchStrategy {
    pub const ALL: [Self; 6] = [
        Self::GraphWalk,
        Self::ToOneJoin,
        Self::CollectionJoin,
        Self::BatchedAssociation,
        Self::IdListChildren,
        Self::FlatRows,
    ];

    /// Whether a root window can be pushed down to the store.
    ///
    /// Collection joins window joined rows, not orders.
    pub fn supports_paging(self) -> bool {
        !matches!(self, Self::CollectionJoin | Self::FlatRows)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GraphWalk => "graph_walk",
            Self::ToOneJoin => "to_one_join",
            Self::CollectionJoin => "collection_join",
            Self::BatchedAssociation => "batched_association",
            Self::IdListChildren => "id_list_children",
            Self::FlatRows => "flat_rows",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == value.trim())
    }
}

impl Display for FetchStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only order fetch service over one store session.
pub struct OrderFetchService<R: OrderRepository> {
    repo: R,
    config: FetchConfig,
}

impl<R: OrderRepository> OrderFetchService<R> {
    /// Creates a service with the default configuration.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            config: FetchConfig::default(),
        }
    }

    /// Creates a service with a validated configuration.
    pub fn with_config(repo: R, config: FetchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { repo, config })
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Runs the operation matching `strategy`.
    pub fn fetch(
        &self,
        strategy: FetchStrategy,
        filter: &OrderFilter,
        page: Option<Page>,
    ) -> FetchResult<Vec<OrderView>> {
        match strategy {
            FetchStrategy::GraphWalk => self.fetch_graph_walk(filter, page),
            FetchStrategy::ToOneJoin => self.fetch_to_one_join(filter, page),
            FetchStrategy::CollectionJoin => self.fetch_collection_join(filter, page),
            FetchStrategy::BatchedAssociation => self.fetch_batched(filter, page),
            FetchStrategy::IdListChildren => self.fetch_with_id_list(filter, page),
            FetchStrategy::FlatRows => self.fetch_flat(filter, page),
        }
    }

    /// Strategy A: `1 + 3 * N` round-trips.
    pub fn fetch_graph_walk(
        &self,
        filter: &OrderFilter,
        page: Option<Page>,
    ) -> FetchResult<Vec<OrderView>> {
        self.instrumented(FetchStrategy::GraphWalk, page, || {
            let mut orders = self.repo.fetch_roots(filter, page)?;
            for order in orders.iter_mut() {
                resolve_graph(&self.repo, order)?;
            }
            project_orders(&orders)
        })
    }

    /// Strategy B: one joined root read, then one line read per order.
    pub fn fetch_to_one_join(
        &self,
        filter: &OrderFilter,
        page: Option<Page>,
    ) -> FetchResult<Vec<OrderView>> {
        self.instrumented(FetchStrategy::ToOneJoin, page, || {
            let mut orders = self.roots_with_to_one(filter, page)?;
            for order in orders.iter_mut() {
                resolve_items(&self.repo, order)?;
            }
            project_orders(&orders)
        })
    }

    /// Strategy C: a single read joining every edge. Not pageable.
    pub fn fetch_collection_join(
        &self,
        filter: &OrderFilter,
        page: Option<Page>,
    ) -> FetchResult<Vec<OrderView>> {
        self.instrumented(FetchStrategy::CollectionJoin, page, || {
            let joined = self.repo.fetch_roots_with_to_one_and_collection(filter)?;
            let joined_rows = joined.len();
            let distinct = distinct_roots(joined);
            debug!(
                "event=collection_join_dedup module=fetch joined_rows={joined_rows} orders={}",
                distinct.len()
            );
            project_orders(&distinct)
        })
    }

    /// Strategy D: `1 + ceil(N / batch_size)` round-trips.
    pub fn fetch_batched(
        &self,
        filter: &OrderFilter,
        page: Option<Page>,
    ) -> FetchResult<Vec<OrderView>> {
        self.instrumented(FetchStrategy::BatchedAssociation, page, || {
            let mut orders = self.roots_with_to_one(filter, page)?;
            BatchedAssociationLoader::new(&self.repo, self.config.batch_size)
                .resolve_items(&mut orders)?;
            project_orders(&orders)
        })
    }

    /// Strategy E: summary read plus one id-list line read, 2 round-trips.
    ///
    /// When no roots match the line read is skipped, so the cost is 1.
    /// Id lists longer than the IN-clause ceiling are split, which only
    /// happens for unpaged requests.
    pub fn fetch_with_id_list(
        &self,
        filter: &OrderFilter,
        page: Option<Page>,
    ) -> FetchResult<Vec<OrderView>> {
        self.instrumented(FetchStrategy::IdListChildren, page, || {
            let summaries = self.repo.fetch_order_summaries(filter, page)?;
            let ids: Vec<OrderId> = summaries.iter().map(|summary| summary.order_id).collect();
            let mut children = self.children_by_ids(&ids)?;

            Ok(summaries
                .into_iter()
                .map(|summary| {
                    let items = children.remove(&summary.order_id).unwrap_or_default();
                    project_summary(summary, &items)
                })
                .collect())
        })
    }

    /// Strategy F: one flat read regrouped in memory. Not pageable.
    pub fn fetch_flat(
        &self,
        filter: &OrderFilter,
        page: Option<Page>,
    ) -> FetchResult<Vec<OrderView>> {
        self.instrumented(FetchStrategy::FlatRows, page, || {
            let rows = self.repo.fetch_flat_join(filter)?;
            regroup_flat_rows(rows)
        })
    }

    /// Lists to-one order summaries without lines in one read.
    pub fn list_order_summaries(
        &self,
        filter: &OrderFilter,
        page: Option<Page>,
    ) -> FetchResult<Vec<OrderSummary>> {
        self.check_page(FetchStrategy::IdListChildren, page)?;
        let summaries = self.repo.fetch_order_summaries(filter, page)?;
        debug!(
            "event=order_summaries module=fetch status=ok orders={}",
            summaries.len()
        );
        Ok(summaries)
    }

    fn roots_with_to_one(
        &self,
        filter: &OrderFilter,
        page: Option<Page>,
    ) -> FetchResult<Vec<Order>> {
        let orders = match page {
            Some(page) => self.repo.fetch_roots_paged(filter, page.offset, page.limit)?,
            None => self.repo.fetch_roots_with_to_one(filter)?,
        };
        Ok(orders)
    }

    fn children_by_ids(
        &self,
        ids: &[OrderId],
    ) -> FetchResult<HashMap<OrderId, Vec<OrderItem>>> {
        let chunk_size = usize::try_from(self.config.in_clause_ceiling)
            .unwrap_or(usize::MAX)
            .max(1);
        let mut children = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(chunk_size) {
            children.extend(self.repo.fetch_children_by_root_ids(chunk)?);
        }
        Ok(children)
    }

    fn check_page(&self, strategy: FetchStrategy, page: Option<Page>) -> FetchResult<()> {
        let Some(page) = page else {
            return Ok(());
        };

        if !strategy.supports_paging() {
            return Err(PagingViolation::NotPageable(strategy).into());
        }
        if page.limit == 0 {
            return Err(PagingViolation::ZeroLimit.into());
        }
        if page.limit > self.config.in_clause_ceiling {
            return Err(PagingViolation::LimitAboveCeiling {
                limit: page.limit,
                ceiling: self.config.in_clause_ceiling,
            }
            .into());
        }
        Ok(())
    }

    fn instrumented<F>(
        &self,
        strategy: FetchStrategy,
        page: Option<Page>,
        body: F,
    ) -> FetchResult<Vec<OrderView>>
    where
        F: FnOnce() -> FetchResult<Vec<OrderView>>,
    {
        let started_at = Instant::now();
        let round_trips_before = self.repo.round_trips();

        let result = self.check_page(strategy, page).and_then(|()| body());
        let round_trips = self.repo.round_trips().saturating_sub(round_trips_before);
        match &result {
            Ok(orders) => info!(
                "event=orders_fetch module=fetch status=ok strategy={strategy} orders={} lines={} round_trips={round_trips} duration_ms={}",
                orders.len(),
                orders.iter().map(|order| order.items.len()).sum::<usize>(),
                started_at.elapsed().as_millis()
            ),
            Err(err @ FetchError::InvalidPagingRequest(_)) => warn!(
                "event=orders_fetch module=fetch status=rejected strategy={strategy} error_code={} error={err}",
                err.code()
            ),
            Err(err) => error!(
                "event=orders_fetch module=fetch status=error strategy={strategy} round_trips={round_trips} duration_ms={} error_code={} error={err}",
                started_at.elapsed().as_millis(),
                err.code()
            ),
        }
        result
    }
}

/// Keeps the first occurrence of every order id.
///
/// Repeated handles are dropped first so each kept order is unwrapped
/// without copying its lines.
fn distinct_roots(joined: Vec<Rc<Order>>) -> Vec<Order> {
    let mut seen = HashSet::with_capacity(joined.len());
    let distinct: Vec<Rc<Order>> = joined
        .into_iter()
        .filter(|order| seen.insert(order.id))
        .collect();
    distinct
        .into_iter()
        .map(|order| Rc::try_unwrap(order).unwrap_or_else(|shared| (*shared).clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{distinct_roots, FetchStrategy};
    use crate::model::order::{Association, Order, OrderStatus};
    use std::rc::Rc;

    #[test]
    fn only_collection_joins_refuse_paging() {
        let unpageable: Vec<_> = FetchStrategy::ALL
            .into_iter()
            .filter(|strategy| !strategy.supports_paging())
            .collect();
        assert_eq!(
            unpageable,
            [FetchStrategy::CollectionJoin, FetchStrategy::FlatRows]
        );
    }

    #[test]
    fn strategy_names_round_trip_through_parse() {
        for strategy in FetchStrategy::ALL {
            assert_eq!(FetchStrategy::parse(strategy.as_str()), Some(strategy));
        }
        assert_eq!(FetchStrategy::parse("v3.1"), None);
    }

    #[test]
    fn distinct_roots_keeps_first_occurrence_in_order() {
        let order = |id| {
            Rc::new(Order {
                id,
                status: OrderStatus::Ordered,
                order_date: 0,
                member: Association::pending(id),
                delivery: Association::pending(id),
                items: Association::Resolved(Vec::new()),
            })
        };
        let first = order(1);
        let second = order(2);
        let joined = vec![
            Rc::clone(&first),
            Rc::clone(&first),
            Rc::clone(&second),
            first,
        ];

        let ids: Vec<_> = distinct_roots(joined).iter().map(|order| order.id).collect();
        assert_eq!(ids, [1, 2]);
    }
}
