//! Order domain model and wire projections.
//!
//! # Responsibility
//! - Define the store-resident entities read by the fetch engine.
//! - Define the wire-level projections every fetch strategy produces.
//!
//! # Invariants
//! - Lazy edges are explicit `Association` values, never hidden proxies.
//! - Ownership is directional: an order points at its member, a member never
//!   stores its orders.

pub mod order;
pub mod view;
