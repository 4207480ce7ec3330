//! The abstraction tree of one schema document.
//!
//! `AxiModel` is the document session state: it owns the node arena, the
//! global-node cache, the listener and mirror registries, the notification
//! channel and the log of pending user edits. Every operation receives the
//! [`SchemaSet`] it reads peers from; the model never holds on to it.
//!
//! ## Registries
//!
//! - `globals`: peer → node for global definitions, so each global appears
//!   once per tree. Globals of other documents are cached here too and listed
//!   in `foreign`; they have no parent.
//! - `listeners`: shared node → references/proxies delegating to it. Property
//!   changes on the shared node are re-broadcast to each of them.
//! - `mirrors`: source node → parents whose children are proxies of the
//!   source's children. Child insertions and removals on the source are
//!   replayed on every mirror.

use rustc_hash::{FxHashMap, FxHashSet};

use super::component::{
    AxiKind, AxiNode, AxiType, ComponentType, CompositorType, ContentModelKind, KindFamily,
};
use super::datatype::Datatype;
use super::error::AxiError;
use super::events::{NotificationChannel, Property, PropertyChange, PropertyValue};
use crate::base::{AxiId, ModelId, SchemaRef};
use crate::schema::SchemaSet;

/// Mirror propagation stops below this depth.
const MAX_PROPAGATION_DEPTH: usize = 64;

/// Editable abstraction over one schema document.
#[derive(Debug)]
pub struct AxiModel {
    schema: ModelId,
    nodes: Vec<AxiNode>,
    root: AxiId,
    globals: FxHashMap<SchemaRef, AxiId>,
    foreign: Vec<AxiId>,
    listeners: FxHashMap<AxiId, Vec<AxiId>>,
    mirrors: FxHashMap<AxiId, Vec<AxiId>>,
    notifications: NotificationChannel,
    pending: Vec<PropertyChange>,
    recording: bool,
}

impl AxiModel {
    /// Open the abstraction for document `schema`.
    ///
    /// Only the document node is built; children populate on first access.
    pub fn new(schemas: &SchemaSet, schema: ModelId) -> Result<Self, AxiError> {
        let document = schemas
            .get(schema)
            .ok_or(AxiError::MissingDocument(schema))?;
        let root_peer = SchemaRef::new(schema, document.root());

        let mut model = Self {
            schema,
            nodes: Vec::new(),
            root: AxiId(0),
            globals: FxHashMap::default(),
            foreign: Vec::new(),
            listeners: FxHashMap::default(),
            mirrors: FxHashMap::default(),
            notifications: NotificationChannel::new(),
            pending: Vec::new(),
            recording: true,
        };
        model.root = model
            .fabricate(schemas, root_peer)
            .ok_or(AxiError::MissingDocument(schema))?;
        Ok(model)
    }

    pub fn schema_id(&self) -> ModelId {
        self.schema
    }

    pub fn root(&self) -> AxiId {
        self.root
    }

    // ── Arena ───────────────────────────────────────────────────────

    pub fn node(&self, id: AxiId) -> Option<&AxiNode> {
        self.nodes.get(id.index())
    }

    pub(crate) fn node_mut(&mut self, id: AxiId) -> Result<&mut AxiNode, AxiError> {
        self.nodes
            .get_mut(id.index())
            .ok_or(AxiError::UnknownComponent(id))
    }

    pub(crate) fn alloc(&mut self, node: AxiNode) -> AxiId {
        let id = AxiId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Number of slots ever allocated. Handles at or above a recorded mark
    /// were created after it.
    pub(crate) fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes currently alive in the arena, attached or not.
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.alive).count()
    }

    pub fn is_alive(&self, id: AxiId) -> bool {
        self.node(id).is_some_and(AxiNode::is_alive)
    }

    // ── Structure ───────────────────────────────────────────────────

    pub fn kind(&self, id: AxiId) -> Option<&AxiKind> {
        self.node(id).map(AxiNode::kind)
    }

    pub fn family(&self, id: AxiId) -> Option<KindFamily> {
        self.node(id).map(AxiNode::family)
    }

    pub fn component_type(&self, id: AxiId) -> Option<ComponentType> {
        self.node(id).map(AxiNode::component_type)
    }

    pub fn parent(&self, id: AxiId) -> Option<AxiId> {
        self.node(id).and_then(AxiNode::parent)
    }

    pub fn shared(&self, id: AxiId) -> Option<AxiId> {
        self.node(id).and_then(AxiNode::shared)
    }

    /// Backing schema node. A proxy reports its shared node's peer.
    pub fn peer(&self, id: AxiId) -> Option<SchemaRef> {
        let mut current = id;
        for _ in 0..MAX_PROPAGATION_DEPTH {
            let node = self.node(current)?;
            match (node.component_type, node.shared) {
                (ComponentType::Proxy, Some(shared)) => current = shared,
                _ => return node.peer,
            }
        }
        None
    }

    pub(crate) fn set_peer_raw(&mut self, id: AxiId, peer: Option<SchemaRef>) -> Result<(), AxiError> {
        self.node_mut(id)?.peer = peer;
        Ok(())
    }

    /// Children if they have been populated.
    pub fn children_initialized(&self, id: AxiId) -> Option<&[AxiId]> {
        self.node(id).and_then(|n| n.children.as_deref())
    }

    pub(crate) fn children_vec(&self, id: AxiId) -> Vec<AxiId> {
        self.children_initialized(id)
            .map(<[AxiId]>::to_vec)
            .unwrap_or_default()
    }

    /// Follow references to their referent and proxies to their shared node
    /// until an original is reached.
    pub fn original(&self, id: AxiId) -> AxiId {
        let mut current = id;
        for _ in 0..MAX_PROPAGATION_DEPTH {
            match self.node(current) {
                Some(node) if node.component_type != ComponentType::Original => {
                    match node.shared {
                        Some(shared) => current = shared,
                        None => return current,
                    }
                }
                _ => return current,
            }
        }
        current
    }

    /// First node on the proxy chain that is not itself a proxy.
    pub fn unproxied(&self, id: AxiId) -> AxiId {
        let mut current = id;
        for _ in 0..MAX_PROPAGATION_DEPTH {
            match self.node(current) {
                Some(node) if node.component_type == ComponentType::Proxy => match node.shared {
                    Some(shared) if shared != current => current = shared,
                    _ => return current,
                },
                _ => return current,
            }
        }
        current
    }

    /// Whether the node mirrors a definition of another document.
    pub fn is_foreign(&self, id: AxiId) -> bool {
        self.peer(self.original(id))
            .is_some_and(|p| p.model != self.schema)
    }

    /// Globals of other documents adopted into this tree.
    pub fn foreign_originals(&self) -> &[AxiId] {
        &self.foreign
    }

    /// Cached global nodes of this document and of other documents.
    pub fn globals(&self) -> impl Iterator<Item = (SchemaRef, AxiId)> + '_ {
        self.globals.iter().map(|(k, v)| (*k, *v))
    }

    pub(crate) fn cache_global(&mut self, peer: SchemaRef, id: AxiId) {
        self.globals.insert(peer, id);
        if peer.model != self.schema && !self.foreign.contains(&id) {
            self.foreign.push(id);
        }
    }

    pub(crate) fn cached_global(&self, peer: SchemaRef) -> Option<AxiId> {
        self.globals
            .get(&peer)
            .copied()
            .filter(|id| self.is_alive(*id))
    }

    pub(crate) fn is_cached(&self, id: AxiId) -> bool {
        self.globals.values().any(|v| *v == id)
    }

    /// Whether the node is a top-level definition of its document.
    pub fn is_global(&self, id: AxiId) -> bool {
        let original = self.original(id);
        match self.parent(original) {
            Some(parent) => parent == self.root,
            None => self.is_cached(original),
        }
    }

    // ── Delegated reads ─────────────────────────────────────────────

    /// The node that owns `property` for reads and writes on `id`.
    pub(crate) fn effective(&self, id: AxiId, property: Property) -> AxiId {
        let mut current = id;
        for _ in 0..MAX_PROPAGATION_DEPTH {
            let Some(node) = self.node(current) else {
                return current;
            };
            let next = match node.component_type {
                ComponentType::Original => None,
                ComponentType::Reference => {
                    if node.family().reference_local().contains(&property) {
                        None
                    } else {
                        node.shared
                    }
                }
                ComponentType::Proxy => node.shared,
            };
            match next {
                Some(shared) => current = shared,
                None => return current,
            }
        }
        current
    }

    /// Current value of a property, following delegation.
    pub fn property(&self, id: AxiId, property: Property) -> Option<PropertyValue> {
        let target = self.effective(id, property);
        self.kind(target).and_then(|k| k.get(property))
    }

    pub fn name(&self, id: AxiId) -> Option<&str> {
        match self.kind(self.effective(id, Property::Name))? {
            AxiKind::Element(e) => Some(&e.name),
            AxiKind::Attribute(a) => Some(&a.name),
            AxiKind::ContentModel(c) => Some(&c.name),
            _ => None,
        }
    }

    pub fn min_occurs(&self, id: AxiId) -> Option<&str> {
        match self.kind(self.effective(id, Property::MinOccurs))? {
            AxiKind::Element(e) => Some(&e.min_occurs),
            AxiKind::Compositor(c) => Some(&c.min_occurs),
            AxiKind::AnyElement(a) => Some(&a.min_occurs),
            _ => None,
        }
    }

    pub fn max_occurs(&self, id: AxiId) -> Option<&str> {
        match self.kind(self.effective(id, Property::MaxOccurs))? {
            AxiKind::Element(e) => Some(&e.max_occurs),
            AxiKind::Compositor(c) => Some(&c.max_occurs),
            AxiKind::AnyElement(a) => Some(&a.max_occurs),
            _ => None,
        }
    }

    pub fn element_type(&self, id: AxiId) -> Option<&AxiType> {
        match self.kind(self.effective(id, Property::Type))? {
            AxiKind::Element(e) => e.ty.as_ref(),
            _ => None,
        }
    }

    pub fn attribute_type(&self, id: AxiId) -> Option<&Datatype> {
        match self.kind(self.effective(id, Property::Type))? {
            AxiKind::Attribute(a) => a.ty.as_ref(),
            _ => None,
        }
    }

    pub fn compositor_type(&self, id: AxiId) -> Option<CompositorType> {
        match self.kind(self.effective(id, Property::CompositorType))? {
            AxiKind::Compositor(c) => Some(c.compositor),
            _ => None,
        }
    }

    pub fn content_model_kind(&self, id: AxiId) -> Option<ContentModelKind> {
        match self.kind(self.original(id))? {
            AxiKind::ContentModel(c) => Some(c.kind),
            _ => None,
        }
    }

    // ── Events ──────────────────────────────────────────────────────

    /// Drain notifications published since the last call.
    pub fn take_notifications(&mut self) -> Vec<PropertyChange> {
        self.notifications.drain()
    }

    /// User edits not yet flushed to the schema.
    pub fn pending_changes(&self) -> &[PropertyChange] {
        &self.pending
    }

    pub fn take_pending_changes(&mut self) -> Vec<PropertyChange> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Toggle edit recording; returns the previous setting.
    pub(crate) fn set_recording(&mut self, recording: bool) -> bool {
        std::mem::replace(&mut self.recording, recording)
    }

    /// Record (when recording) and broadcast a change.
    pub(crate) fn fire(&mut self, change: PropertyChange) {
        if self.recording && change.property != Property::Refresh {
            self.pending.push(change.clone());
        }
        self.broadcast(change);
    }

    /// Broadcast without recording.
    pub(crate) fn notify(&mut self, change: PropertyChange) {
        self.broadcast(change);
    }

    /// Tell observers of a delegating node that its view changed.
    pub(crate) fn force_fire(&mut self, id: AxiId) {
        self.notifications.publish(PropertyChange::refresh(id));
    }

    fn broadcast(&mut self, change: PropertyChange) {
        let origin = change.source;
        let mut seen = FxHashSet::default();
        seen.insert(origin);
        let mut stack = vec![origin];
        self.notifications.publish(change.clone());
        while let Some(source) = stack.pop() {
            let wrappers = self.listeners.get(&source).cloned().unwrap_or_default();
            for wrapper in wrappers {
                if seen.insert(wrapper) {
                    self.notifications.publish(PropertyChange {
                        source: wrapper,
                        ..change.clone()
                    });
                    stack.push(wrapper);
                }
            }
        }
    }

    // ── Registries ──────────────────────────────────────────────────

    pub(crate) fn listen(&mut self, shared: AxiId, wrapper: AxiId) {
        let entry = self.listeners.entry(shared).or_default();
        if !entry.contains(&wrapper) {
            entry.push(wrapper);
        }
    }

    pub(crate) fn unlisten(&mut self, shared: AxiId, wrapper: AxiId) {
        if let Some(entry) = self.listeners.get_mut(&shared) {
            entry.retain(|w| *w != wrapper);
            if entry.is_empty() {
                self.listeners.remove(&shared);
            }
        }
    }

    /// References and proxies currently delegating to `shared`.
    pub fn listeners_of(&self, shared: AxiId) -> &[AxiId] {
        self.listeners.get(&shared).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace the nodes whose children `id` mirrors.
    pub(crate) fn set_mirror_sources(&mut self, id: AxiId, sources: Vec<AxiId>) {
        let old = match self.nodes.get_mut(id.index()) {
            Some(node) => std::mem::replace(&mut node.mirror_sources, sources.clone()),
            None => return,
        };
        for source in old {
            if let Some(entry) = self.mirrors.get_mut(&source) {
                entry.retain(|m| *m != id);
                if entry.is_empty() {
                    self.mirrors.remove(&source);
                }
            }
        }
        for source in sources {
            let entry = self.mirrors.entry(source).or_default();
            if !entry.contains(&id) {
                entry.push(id);
            }
        }
    }

    /// Drop every registration held by `id`.
    fn release(&mut self, id: AxiId) {
        if let Some(shared) = self.shared(id) {
            self.unlisten(shared, id);
        }
        self.set_mirror_sources(id, Vec::new());
    }

    // ── Tree operations ─────────────────────────────────────────────

    /// Attach `child` under `parent` and replay the insertion on mirrors.
    pub(crate) fn insert_child(
        &mut self,
        parent: AxiId,
        child: AxiId,
        index: Option<usize>,
        record: bool,
    ) -> Result<(), AxiError> {
        self.attach(parent, child, index, record, 0)
    }

    fn attach(
        &mut self,
        parent: AxiId,
        child: AxiId,
        index: Option<usize>,
        record: bool,
        depth: usize,
    ) -> Result<(), AxiError> {
        let children = self
            .node_mut(parent)?
            .children
            .get_or_insert_with(Vec::new);
        let at = index.unwrap_or(children.len()).min(children.len());
        children.insert(at, child);
        let node = self.node_mut(child)?;
        node.parent = Some(parent);
        node.alive = true;

        let change = PropertyChange::new(
            parent,
            Property::Child,
            None,
            Some(PropertyValue::Component(child)),
        );
        if record {
            self.fire(change);
        } else {
            self.notify(change);
        }
        self.propagate_insert(parent, child, depth);
        Ok(())
    }

    /// Detach `child` from `parent`, replay the removal on mirrors and retire
    /// the detached subtree.
    pub(crate) fn detach_child(
        &mut self,
        parent: AxiId,
        child: AxiId,
        record: bool,
    ) -> Result<(), AxiError> {
        self.detach(parent, child, record, 0)
    }

    fn detach(
        &mut self,
        parent: AxiId,
        child: AxiId,
        record: bool,
        depth: usize,
    ) -> Result<(), AxiError> {
        if let Some(children) = self.node_mut(parent)?.children.as_mut() {
            children.retain(|c| *c != child);
        }
        self.node_mut(child)?.parent = None;

        let change = PropertyChange::new(
            parent,
            Property::Child,
            Some(PropertyValue::Component(child)),
            None,
        );
        if record {
            self.fire(change);
        } else {
            self.notify(change);
        }
        self.propagate_remove(parent, child, depth);
        self.retire(child);
        Ok(())
    }

    /// Mark a detached subtree dead and drop its registrations.
    ///
    /// Node data stays in the arena so pending update units can still read it.
    pub(crate) fn retire(&mut self, id: AxiId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get_mut(current.index()) else {
                continue;
            };
            if !node.alive {
                continue;
            }
            node.alive = false;
            let owned: Vec<AxiId> = node.children.clone().unwrap_or_default();
            self.release(current);
            self.globals.retain(|_, v| *v != current);
            self.foreign.retain(|f| *f != current);
            for child in owned {
                if self.parent(child) == Some(current) {
                    stack.push(child);
                }
            }
        }
    }

    /// Kill nodes built at or after `mark` that were not adopted elsewhere.
    pub(crate) fn discard(&mut self, id: AxiId, mark: usize) {
        if id.index() < mark || self.is_cached(id) {
            return;
        }
        let owned = self.children_vec(id);
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.alive = false;
        }
        self.release(id);
        for child in owned {
            if self.parent(child) != Some(id) {
                continue;
            }
            if child.index() < mark || self.is_cached(child) {
                if let Some(node) = self.nodes.get_mut(child.index()) {
                    node.parent = None;
                }
            } else {
                self.discard(child, mark);
            }
        }
    }

    fn propagate_insert(&mut self, source: AxiId, child: AxiId, depth: usize) {
        if depth >= MAX_PROPAGATION_DEPTH {
            tracing::warn!("[AXI] mirror propagation from {source} exceeds depth limit");
            return;
        }
        let parents = self.mirrors.get(&source).cloned().unwrap_or_default();
        if parents.is_empty() {
            return;
        }
        let siblings = self.children_vec(source);
        let Some(pos) = siblings.iter().position(|c| *c == child) else {
            return;
        };

        for parent in parents {
            if !self.is_alive(parent) || self.children_initialized(parent).is_none() {
                continue;
            }
            let current = self.children_vec(parent);
            let mirrored = |target: AxiId| {
                current
                    .iter()
                    .position(|c| self.nodes.get(c.index()).and_then(|n| n.shared) == Some(target))
            };
            let after = siblings[..pos].iter().rev().find_map(|s| mirrored(*s)).map(|i| i + 1);
            let before = || siblings[pos + 1..].iter().find_map(|s| mirrored(*s));
            let at = after.or_else(before).unwrap_or_else(|| {
                let first_source = self
                    .node(parent)
                    .and_then(|n| n.mirror_sources.first().copied());
                if first_source == Some(source) {
                    0
                } else {
                    current.len()
                }
            });

            let Some(proxy) = self.create_proxy(child) else {
                continue;
            };
            if let Err(err) = self.attach(parent, proxy, Some(at), false, depth + 1) {
                tracing::warn!("[AXI] could not mirror {child} into {parent}: {err}");
            }
        }
    }

    fn propagate_remove(&mut self, source: AxiId, child: AxiId, depth: usize) {
        if depth >= MAX_PROPAGATION_DEPTH {
            tracing::warn!("[AXI] mirror propagation from {source} exceeds depth limit");
            return;
        }
        let parents = self.mirrors.get(&source).cloned().unwrap_or_default();
        for parent in parents {
            let doomed: Vec<AxiId> = self
                .children_vec(parent)
                .into_iter()
                .filter(|c| self.shared(*c) == Some(child))
                .collect();
            for proxy in doomed {
                if let Err(err) = self.detach(parent, proxy, false, depth + 1) {
                    tracing::warn!("[AXI] could not unmirror {proxy} from {parent}: {err}");
                }
            }
        }
    }
}
