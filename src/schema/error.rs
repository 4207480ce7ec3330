//! Error types for schema model operations.

use thiserror::Error;

use crate::base::{ModelId, SchemaNodeId};

/// Errors raised by the in-memory schema object model.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A document-attached node was mutated outside a transaction.
    #[error("Mutation of {0} requires an open transaction")]
    NotInTransaction(SchemaNodeId),

    /// The handle does not address a live node.
    #[error("Unknown schema node: {0}")]
    UnknownNode(SchemaNodeId),

    /// The handle does not address a loaded document.
    #[error("Unknown schema document: {0}")]
    UnknownModel(ModelId),

    /// A structural edit would break the tree.
    #[error("Invalid {kind}: {message}")]
    Invalid { kind: &'static str, message: String },

    /// XML serialisation error.
    #[error("XML error: {0}")]
    Xml(String),

    /// IO error while persisting a document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// Create an invalid-structure error.
    pub fn invalid(kind: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            kind,
            message: message.into(),
        }
    }

    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }
}
