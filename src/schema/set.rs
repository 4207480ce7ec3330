//! All loaded schema documents and cross-document name resolution.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::error::SchemaError;
use super::kind::SchemaKind;
use super::model::SchemaModel;
use super::node::SchemaNode;
use crate::base::constants::attr;
use crate::base::{ModelId, QName, SchemaRef};

/// What a `type` or `base` attribute points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTarget {
    /// A built-in XML Schema type, by local name.
    Builtin(SmolStr),
    Complex(SchemaRef),
    Simple(SchemaRef),
    Unresolved,
}

/// Registry of schema documents keyed by [`ModelId`] and location.
#[derive(Debug, Default)]
pub struct SchemaSet {
    models: IndexMap<ModelId, SchemaModel>,
    by_location: FxHashMap<SmolStr, ModelId>,
    next_id: u32,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document registered under `location`.
    pub fn create(&mut self, location: impl Into<SmolStr>) -> ModelId {
        let id = ModelId(self.next_id);
        self.next_id += 1;
        let location = location.into();
        self.by_location.insert(location.clone(), id);
        self.models.insert(id, SchemaModel::new(id, location));
        id
    }

    pub fn get(&self, id: ModelId) -> Option<&SchemaModel> {
        self.models.get(&id)
    }

    pub fn get_mut(&mut self, id: ModelId) -> Option<&mut SchemaModel> {
        self.models.get_mut(&id)
    }

    pub fn model(&self, id: ModelId) -> Result<&SchemaModel, SchemaError> {
        self.get(id).ok_or(SchemaError::UnknownModel(id))
    }

    pub fn model_mut(&mut self, id: ModelId) -> Result<&mut SchemaModel, SchemaError> {
        self.get_mut(id).ok_or(SchemaError::UnknownModel(id))
    }

    pub fn by_location(&self, location: &str) -> Option<ModelId> {
        self.by_location.get(location).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaModel> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    // ── Cross-document node access ──────────────────────────────────

    pub fn node(&self, r: SchemaRef) -> Option<&SchemaNode> {
        self.get(r.model).and_then(|m| m.node(r.node))
    }

    pub fn kind(&self, r: SchemaRef) -> Option<SchemaKind> {
        self.node(r).map(SchemaNode::kind)
    }

    pub fn attr(&self, r: SchemaRef, name: &str) -> Option<&str> {
        self.node(r).and_then(|n| n.attr(name))
    }

    pub fn name(&self, r: SchemaRef) -> Option<&str> {
        self.attr(r, attr::NAME)
    }

    /// Children of `r` as document-qualified handles.
    pub fn children(&self, r: SchemaRef) -> Vec<SchemaRef> {
        match self.get(r.model) {
            Some(m) => m
                .children(r.node)
                .iter()
                .map(|c| SchemaRef::new(r.model, *c))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn parent(&self, r: SchemaRef) -> Option<SchemaRef> {
        let m = self.get(r.model)?;
        m.parent(r.node).map(|p| SchemaRef::new(r.model, p))
    }

    /// Whether `r` belongs to a loaded document and is reachable from its root.
    pub fn is_attached(&self, r: SchemaRef) -> bool {
        self.get(r.model).is_some_and(|m| m.is_attached(r.node))
    }

    // ── Resolution ──────────────────────────────────────────────────

    /// `from` and every document reachable through import, include or redefine.
    pub fn reachable_models(&self, from: ModelId) -> Vec<ModelId> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut queue = vec![from];
        while let Some(id) = queue.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(model) = self.get(id) else {
                continue;
            };
            order.push(id);
            for child in model.children(model.root()) {
                let is_ref = model.kind(*child).is_some_and(SchemaKind::is_schema_reference);
                if !is_ref {
                    continue;
                }
                if let Some(target) = model
                    .attr(*child, attr::SCHEMA_LOCATION)
                    .and_then(|loc| self.by_location(loc))
                {
                    queue.push(target);
                }
            }
        }
        order
    }

    /// Resolve a QName to a global definition of `kind`, searching the
    /// document owning `from` first.
    pub fn resolve_global(&self, from: SchemaRef, kind: SchemaKind, raw: &str) -> Option<SchemaRef> {
        let local = QName::parse(raw).local;
        self.reachable_models(from.model).into_iter().find_map(|id| {
            let model = self.get(id)?;
            model
                .find_global(kind, local)
                .map(|node| SchemaRef::new(id, node))
        })
    }

    /// Resolve a `type`/`base` value as seen from `from`.
    pub fn resolve_type(&self, from: SchemaRef, raw: &str) -> TypeTarget {
        let Some(model) = self.get(from.model) else {
            return TypeTarget::Unresolved;
        };
        if model.is_builtin_type(raw) {
            return TypeTarget::Builtin(SmolStr::new(QName::parse(raw).local));
        }
        if let Some(ct) = self.resolve_global(from, SchemaKind::GlobalComplexType, raw) {
            return TypeTarget::Complex(ct);
        }
        if let Some(st) = self.resolve_global(from, SchemaKind::GlobalSimpleType, raw) {
            return TypeTarget::Simple(st);
        }
        tracing::trace!("[SCHEMA] unresolved type {raw} from {from}");
        TypeTarget::Unresolved
    }
}
