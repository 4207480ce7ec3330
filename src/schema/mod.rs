//! In-memory XML Schema object model.
//!
//! The abstraction engine treats the schema tree as an external collaborator
//! with a small contract: typed nodes, transactional mutation, change events
//! and reference resolution. This module provides that contract.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    SchemaSet                              │
//! │  - models: IndexMap<ModelId, SchemaModel>                │
//! │  - resolve_global / resolve_type (import/include aware)  │
//! └──────────────────────────┬───────────────────────────────┘
//!                            │
//!                            ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                    SchemaModel (one document)            │
//! │  - slots: Vec<Option<SchemaNode>>  (append-only arena)   │
//! │  - transact(|m| ...) / take_changes()                    │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod error;
mod kind;
mod model;
mod node;
mod set;
#[cfg(feature = "xsd")]
pub mod xsd;

pub use error::SchemaError;
pub use kind::{FacetKind, SchemaKind};
pub use model::{ChangeKind, SchemaChange, SchemaModel, SchemaState};
pub use node::SchemaNode;
pub use set::{SchemaSet, TypeTarget};
