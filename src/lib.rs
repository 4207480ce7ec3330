//! # axi-base
//!
//! Editable abstraction tree over XML Schema documents, kept in step with the
//! schema in both directions, plus design-pattern driven schema generation.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! session   → DocumentSession: sync / flush / transform entry points
//!   ↓
//! generator → SchemaGenerator family, update units, global names, patterns
//!   ↓
//! sync      → AxiModelUpdater: shadow-tree reconciliation
//!   ↓
//! axi       → Abstraction arena, builders, proxies, edits, usage map
//!   ↓
//! schema    → In-memory schema object model with transactions
//!   ↓
//! base      → Handles, qualified names, constants
//! ```

// ============================================================================
// MODULES (dependency order: base → schema → axi → sync → generator → session)
// ============================================================================

/// Foundation types: handles, QName, constants
pub mod base;

/// Schema object model: typed nodes, transactions, reference resolution
pub mod schema;

/// Abstraction tree: arena, component kinds, builders, proxies, edits
pub mod axi;

/// Tree synchronization against the schema
pub mod sync;

/// Schema generation: incremental update and pattern transforms
pub mod generator;

/// Document session owning the tree and the schema lock
pub mod session;

// Re-export commonly needed items
pub use axi::{AxiError, AxiKind, AxiModel, AxiType, ComponentType, KindFamily, Property, PropertyChange};
pub use base::{AxiId, ModelId, SchemaNodeId, SchemaRef};
pub use generator::{GeneratorError, Pattern, SchemaGenerator, SchemaUpdate, TransformConfig, TransformHint};
pub use schema::{SchemaError, SchemaKind, SchemaModel, SchemaSet};
pub use session::{DocumentSession, SessionConfig};
pub use sync::{AxiModelUpdater, ModelState, SyncState};
