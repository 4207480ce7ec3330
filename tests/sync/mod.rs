//! Synchronizer tests
//!
//! Schema edits made behind the tree's back, and what reconciliation keeps,
//! adopts and drops.

pub mod tests_reconcile;
