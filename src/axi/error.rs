//! Error types for abstraction-tree operations.

use thiserror::Error;

use crate::base::{AxiId, ModelId};
use crate::schema::SchemaError;

/// Errors raised while building or editing the abstraction tree.
#[derive(Debug, Error)]
pub enum AxiError {
    /// The handle does not address a node of this model.
    #[error("Unknown component: {0}")]
    UnknownComponent(AxiId),

    /// The component was removed from the tree.
    #[error("Component {0} has been removed")]
    Removed(AxiId),

    /// The schema document backing the model is not loaded.
    #[error("Schema document {0} is not loaded")]
    MissingDocument(ModelId),

    /// The child's kind may not appear under the parent's kind.
    #[error("{child} cannot be added under {parent}")]
    InvalidChild { parent: AxiId, child: AxiId },

    /// The component is already part of the tree.
    #[error("Component {0} already has a parent")]
    AlreadyAttached(AxiId),

    /// The component is not a child of the given parent.
    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: AxiId, child: AxiId },

    /// The property does not apply or the value has the wrong shape.
    #[error("Invalid value for property {property}")]
    InvalidProperty { property: &'static str },

    /// A reference operation was applied to a non-reference.
    #[error("Component {0} is not a reference")]
    NotAReference(AxiId),

    /// A reference target of the wrong kind.
    #[error("Component {0} cannot be referenced here")]
    InvalidReferent(AxiId),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
