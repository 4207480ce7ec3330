//! Foundation types for the AXI engine.
//!
//! This module provides the handles and small helpers used throughout the crate:
//! - [`ModelId`], [`SchemaNodeId`], [`SchemaRef`] - schema document and node handles
//! - [`AxiId`] - abstraction node handles
//! - [`QName`] - prefixed name splitting
//! - Domain constants (XML Schema namespace, cardinality defaults)
//!
//! This module has NO dependencies on other axi modules.

pub mod constants;
mod ids;
mod qname;

pub use ids::{AxiId, ModelId, SchemaNodeId, SchemaRef};
pub use qname::QName;
