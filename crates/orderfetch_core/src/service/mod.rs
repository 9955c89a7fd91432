//! Fetch engine use-case services.
//!
//! # Responsibility
//! - Turn store reads into order projections through six fetch strategies.
//! - Rebuild order/line hierarchies from flat join rows.
//! - Fail fast on unresolved lazy edges instead of emitting empty fields.
//!
//! # Invariants
//! - Every strategy returns the same projections for the same data set.
//! - Paging is validated before the first store read.
//! - Store failures propagate without partial results.

pub mod association_loader;
pub mod error;
pub mod order_fetch_service;
pub mod projection;
pub mod regroup;
