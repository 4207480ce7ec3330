//! Error types for schema generation.

use thiserror::Error;

use crate::axi::AxiError;
use crate::schema::SchemaError;

/// Errors raised while writing abstraction edits back into the schema.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// A component was edited before it was attached to the schema.
    #[error("Component {0} needs to be added to its parent before its children can be populated")]
    MissingPeer(String),

    /// The transformation ran, but the tree could not be re-synchronized.
    #[error("Schema document was transformed but the tree failed to synchronize")]
    SyncFailed,

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Axi(#[from] AxiError),
}
