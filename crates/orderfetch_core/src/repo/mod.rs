//! Store access layer for the order fetch engine.
//!
//! # Responsibility
//! - Define the primitive read contract the fetch strategies are built on.
//! - Keep SQLite query details out of the strategy code.
//!
//! # Invariants
//! - Every executed statement counts as one round-trip.
//! - Reads on a closed session fail; they never return empty data.
//! - The store layer never retries a failed read.

pub mod order_repo;
