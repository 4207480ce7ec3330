//! The abstraction tree ("AXI tree") over one schema document.
//!
//! Nodes live in an append-only arena owned by [`AxiModel`] and are addressed
//! by [`AxiId`](crate::base::AxiId). Each node has a kind ([`AxiKind`]), a
//! component type ([`ComponentType`]) and usually a peer: the schema node it
//! mirrors.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 AxiModel (document session)               │
//! │  - nodes: Vec<AxiNode>       (arena, handles never reused)│
//! │  - globals: SchemaRef → AxiId (one node per global)       │
//! │  - listeners / mirrors       (proxy + reference plumbing) │
//! │  - notifications / pending   (observers / flush input)    │
//! └──────────────────────────────────────────────────────────┘
//!        ▲                    ▲                    ▲
//!        │ factory + builder  │ edit API           │ sync
//!   SchemaSet peers      user edits        AxiModelUpdater
//! ```
//!
//! Children are populated lazily. Content a node inherits from a shared
//! definition appears as proxies, never as copies.

mod builder;
pub mod component;
pub mod datatype;
mod edit;
mod error;
pub mod events;
mod factory;
mod model;
mod proxy;
pub mod query;
pub mod usage;
pub mod validator;

pub use component::{
    AnyData, AttributeData, AttributeUse, AxiKind, AxiNode, AxiType, ComponentType,
    CompositorData, CompositorType, ContentModelData, ContentModelKind, DocumentData, ElementData,
    Form, KindFamily, ProcessContents, SchemaReferenceData, SchemaReferenceKind,
};
pub use datatype::{Datatype, DatatypeBuilder, Facet, Primitive, Variety};
pub use error::AxiError;
pub use events::{NotificationChannel, Property, PropertyChange, PropertyValue};
pub use model::AxiModel;
pub use usage::{UsageMap, master_global_elements};
pub use validator::is_valid_peer;

pub(crate) use factory::is_cached_kind;
