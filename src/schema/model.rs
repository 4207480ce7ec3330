//! One schema document: an arena of [`SchemaNode`]s with transactional edits.
//!
//! ## Invariants
//!
//! - Slot 0 is the `<schema>` root and cannot be removed.
//! - Slots are append-only. Removing a node empties its slot, so a handle
//!   never comes back to life as a different node.
//! - A node attached to the document (reachable from the root) may only be
//!   mutated inside a transaction. Detached nodes can be built freely and
//!   attached later, which is how generators stage new content.
//! - Every mutation of an attached node records a [`SchemaChange`].

use smol_str::SmolStr;

use super::error::SchemaError;
use super::kind::SchemaKind;
use super::node::SchemaNode;
use crate::base::constants::{XSD_NAMESPACE, XSD_PREFIX, attr};
use crate::base::{ModelId, QName, SchemaNodeId};

/// Structural health of a document as reported by its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaState {
    #[default]
    Valid,
    NotWellFormed,
}

/// What happened to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    ChildAdded(SchemaNodeId),
    ChildRemoved(SchemaNodeId),
    AttributeChanged(SmolStr),
    TextChanged,
}

/// A change event raised by an attached mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaChange {
    /// The node whose state changed (the parent, for child events).
    pub node: SchemaNodeId,
    pub kind: ChangeKind,
}

/// An XML Schema document held in memory.
#[derive(Clone, Debug)]
pub struct SchemaModel {
    id: ModelId,
    location: SmolStr,
    slots: Vec<Option<SchemaNode>>,
    root: SchemaNodeId,
    state: SchemaState,
    transaction_depth: u32,
    auto_sync: bool,
    changes: Vec<SchemaChange>,
}

impl SchemaModel {
    /// Create an empty document whose root binds `xs` to the XML Schema namespace.
    pub fn new(id: ModelId, location: impl Into<SmolStr>) -> Self {
        let mut root = SchemaNode::new(SchemaKind::Schema);
        root.attributes
            .insert(SmolStr::new(format!("xmlns:{XSD_PREFIX}")), SmolStr::new(XSD_NAMESPACE));
        Self {
            id,
            location: location.into(),
            slots: vec![Some(root)],
            root: SchemaNodeId(0),
            state: SchemaState::Valid,
            transaction_depth: 0,
            auto_sync: true,
            changes: Vec::new(),
        }
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn root(&self) -> SchemaNodeId {
        self.root
    }

    pub fn state(&self) -> SchemaState {
        self.state
    }

    pub fn set_state(&mut self, state: SchemaState) {
        self.state = state;
    }

    pub fn is_auto_sync(&self) -> bool {
        self.auto_sync
    }

    pub fn set_auto_sync(&mut self, auto_sync: bool) {
        self.auto_sync = auto_sync;
    }

    pub fn is_in_transaction(&self) -> bool {
        self.transaction_depth > 0
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub fn node(&self, id: SchemaNodeId) -> Option<&SchemaNode> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: SchemaNodeId) -> Result<&mut SchemaNode, SchemaError> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(SchemaError::UnknownNode(id))
    }

    pub fn kind(&self, id: SchemaNodeId) -> Option<SchemaKind> {
        self.node(id).map(SchemaNode::kind)
    }

    pub fn parent(&self, id: SchemaNodeId) -> Option<SchemaNodeId> {
        self.node(id).and_then(SchemaNode::parent)
    }

    /// Children in document order; empty for unknown handles.
    pub fn children(&self, id: SchemaNodeId) -> &[SchemaNodeId] {
        self.node(id).map(SchemaNode::children).unwrap_or(&[])
    }

    pub fn attr(&self, id: SchemaNodeId, name: &str) -> Option<&str> {
        self.node(id).and_then(|n| n.attr(name))
    }

    pub fn name(&self, id: SchemaNodeId) -> Option<&str> {
        self.attr(id, attr::NAME)
    }

    pub fn text(&self, id: SchemaNodeId) -> Option<&str> {
        self.node(id).and_then(SchemaNode::text)
    }

    /// Whether the handle addresses a node that has not been removed.
    pub fn is_alive(&self, id: SchemaNodeId) -> bool {
        self.node(id).is_some()
    }

    /// Whether the node is reachable from the document root.
    pub fn is_attached(&self, id: SchemaNodeId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == self.root {
                return true;
            }
            current = match self.node(cur) {
                Some(node) => node.parent,
                None => return false,
            };
        }
        false
    }

    /// Position of `id` among its parent's children.
    pub fn index_in_parent(&self, id: SchemaNodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// First child whose kind satisfies `pred`.
    pub fn child_where(
        &self,
        id: SchemaNodeId,
        pred: impl Fn(SchemaKind) -> bool,
    ) -> Option<SchemaNodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.kind(*c).is_some_and(&pred))
    }

    /// Top-level children of the root with the given kind, in document order.
    pub fn globals_of(&self, kind: SchemaKind) -> impl Iterator<Item = SchemaNodeId> + '_ {
        self.children(self.root)
            .iter()
            .copied()
            .filter(move |c| self.kind(*c) == Some(kind))
    }

    /// Find a top-level definition by kind and local name.
    pub fn find_global(&self, kind: SchemaKind, local: &str) -> Option<SchemaNodeId> {
        self.globals_of(kind).find(|g| self.name(*g) == Some(local))
    }

    /// Node and all of its descendants, preorder.
    pub fn descendants(&self, id: SchemaNodeId) -> Vec<SchemaNodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if !self.is_alive(cur) {
                continue;
            }
            out.push(cur);
            stack.extend(self.children(cur).iter().rev().copied());
        }
        out
    }

    // ── Namespaces ──────────────────────────────────────────────────

    pub fn target_namespace(&self) -> Option<&str> {
        self.attr(self.root, attr::TARGET_NAMESPACE)
    }

    /// Namespace bound to `prefix` on the root (`None` = default namespace).
    pub fn namespace_for_prefix(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            Some(p) => self.attr(self.root, &format!("xmlns:{p}")),
            None => self.attr(self.root, "xmlns"),
        }
    }

    /// Prefix bound to `namespace` on the root. `Some("")` is the default namespace.
    pub fn prefix_for_namespace(&self, namespace: &str) -> Option<&str> {
        let root = self.node(self.root)?;
        root.attributes().find_map(|(key, value)| {
            if value != namespace {
                return None;
            }
            if key == "xmlns" {
                Some("")
            } else {
                key.strip_prefix("xmlns:")
            }
        })
    }

    /// Whether a `type`/`base` value names a built-in XML Schema type.
    pub fn is_builtin_type(&self, raw: &str) -> bool {
        let q = QName::parse(raw);
        match self.namespace_for_prefix(q.prefix) {
            Some(ns) => ns == XSD_NAMESPACE,
            None => matches!(q.prefix, Some("xs") | Some("xsd")),
        }
    }

    /// Spell a built-in type name with this document's XML Schema prefix.
    pub fn builtin_type_name(&self, local: &str) -> String {
        let prefix = self.prefix_for_namespace(XSD_NAMESPACE).unwrap_or(XSD_PREFIX);
        QName::format(Some(prefix), local)
    }

    /// Spell a reference to one of this document's own globals.
    pub fn qualify(&self, local: &str) -> String {
        let prefix = self
            .target_namespace()
            .and_then(|ns| self.prefix_for_namespace(ns));
        QName::format(prefix, local)
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Open a (possibly nested) transaction.
    pub fn begin_transaction(&mut self) {
        self.transaction_depth += 1;
    }

    /// Close the innermost transaction.
    pub fn end_transaction(&mut self) {
        self.transaction_depth = self.transaction_depth.saturating_sub(1);
    }

    /// Run `f` inside a transaction. The transaction closes even when `f` fails.
    pub fn transact<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, SchemaError>,
    ) -> Result<R, SchemaError> {
        self.begin_transaction();
        let result = f(self);
        self.end_transaction();
        result
    }

    fn ensure_writable(&self, id: SchemaNodeId) -> Result<(), SchemaError> {
        if !self.is_alive(id) {
            return Err(SchemaError::UnknownNode(id));
        }
        if self.is_attached(id) && !self.is_in_transaction() {
            return Err(SchemaError::NotInTransaction(id));
        }
        Ok(())
    }

    fn record(&mut self, node: SchemaNodeId, kind: ChangeKind) {
        if self.is_attached(node) {
            self.changes.push(SchemaChange { node, kind });
        }
    }

    /// Drain the change events recorded since the last call.
    pub fn take_changes(&mut self) -> Vec<SchemaChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Create a detached node.
    pub fn create(&mut self, kind: SchemaKind) -> SchemaNodeId {
        let id = SchemaNodeId(self.slots.len() as u32);
        self.slots.push(Some(SchemaNode::new(kind)));
        id
    }

    /// Create a detached node with attributes.
    pub fn create_with(&mut self, kind: SchemaKind, attrs: &[(&str, &str)]) -> SchemaNodeId {
        let id = self.create(kind);
        if let Some(Some(node)) = self.slots.get_mut(id.index()) {
            for (key, value) in attrs {
                node.attributes.insert(SmolStr::new(key), SmolStr::new(value));
            }
        }
        id
    }

    /// Attach a detached node under `parent`. `None` appends.
    pub fn add_child(
        &mut self,
        parent: SchemaNodeId,
        child: SchemaNodeId,
        index: Option<usize>,
    ) -> Result<(), SchemaError> {
        self.ensure_writable(parent)?;
        if child == self.root {
            return Err(SchemaError::invalid("child", "the schema root cannot be re-parented"));
        }
        let child_node = self.node(child).ok_or(SchemaError::UnknownNode(child))?;
        if child_node.parent.is_some() {
            return Err(SchemaError::invalid("child", format!("{child} already has a parent")));
        }
        let mut cursor = Some(parent);
        while let Some(cur) = cursor {
            if cur == child {
                return Err(SchemaError::invalid("child", format!("{child} is an ancestor of {parent}")));
            }
            cursor = self.parent(cur);
        }

        let parent_node = self.node_mut(parent)?;
        let at = index
            .unwrap_or(parent_node.children.len())
            .min(parent_node.children.len());
        parent_node.children.insert(at, child);
        self.node_mut(child)?.parent = Some(parent);
        self.record(parent, ChangeKind::ChildAdded(child));
        Ok(())
    }

    /// Create a node with attributes and attach it under `parent`.
    pub fn append(
        &mut self,
        parent: SchemaNodeId,
        kind: SchemaKind,
        attrs: &[(&str, &str)],
    ) -> Result<SchemaNodeId, SchemaError> {
        let id = self.create_with(kind, attrs);
        self.add_child(parent, id, None)?;
        Ok(id)
    }

    /// Detach a node from its parent, keeping its subtree alive.
    pub fn detach(&mut self, id: SchemaNodeId) -> Result<(), SchemaError> {
        self.ensure_writable(id)?;
        if id == self.root {
            return Err(SchemaError::invalid("node", "the schema root cannot be detached"));
        }
        let Some(parent) = self.parent(id) else {
            return Ok(());
        };
        self.record(parent, ChangeKind::ChildRemoved(id));
        self.node_mut(parent)?.children.retain(|c| *c != id);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Detach a node and destroy its whole subtree.
    pub fn remove(&mut self, id: SchemaNodeId) -> Result<(), SchemaError> {
        self.detach(id)?;
        for dead in self.descendants(id) {
            if let Some(slot) = self.slots.get_mut(dead.index()) {
                *slot = None;
            }
        }
        Ok(())
    }

    /// Set or clear an attribute. Setting the current value records nothing.
    pub fn set_attr(
        &mut self,
        id: SchemaNodeId,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), SchemaError> {
        self.ensure_writable(id)?;
        let node = self.node_mut(id)?;
        let changed = match value {
            Some(v) => {
                if node.attr(name) == Some(v) {
                    false
                } else {
                    node.attributes.insert(SmolStr::new(name), SmolStr::new(v));
                    true
                }
            }
            None => node.attributes.shift_remove(name).is_some(),
        };
        if changed {
            self.record(id, ChangeKind::AttributeChanged(SmolStr::new(name)));
        }
        Ok(())
    }

    pub fn set_text(&mut self, id: SchemaNodeId, text: Option<&str>) -> Result<(), SchemaError> {
        self.ensure_writable(id)?;
        self.node_mut(id)?.text = text.map(SmolStr::new);
        self.record(id, ChangeKind::TextChanged);
        Ok(())
    }

    /// Copy a subtree into a new detached subtree and return its root.
    pub fn deep_copy(&mut self, id: SchemaNodeId) -> Result<SchemaNodeId, SchemaError> {
        let source = self.node(id).ok_or(SchemaError::UnknownNode(id))?.clone();
        let copy = self.create(source.kind);
        {
            let node = self.node_mut(copy)?;
            node.attributes = source.attributes.clone();
            node.text = source.text.clone();
        }
        for child in source.children {
            let child_copy = self.deep_copy(child)?;
            self.add_child(copy, child_copy, None)?;
        }
        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> SchemaModel {
        SchemaModel::new(ModelId(0), "test.xsd")
    }

    #[test]
    fn attached_mutation_needs_transaction() {
        let mut m = model();
        let root = m.root();
        let el = m.create_with(SchemaKind::GlobalElement, &[("name", "a")]);
        assert!(matches!(
            m.add_child(root, el, None),
            Err(SchemaError::NotInTransaction(_))
        ));
        m.transact(|m| m.add_child(root, el, None)).unwrap();
        assert!(m.is_attached(el));
        assert!(matches!(
            m.set_attr(el, "name", Some("b")),
            Err(SchemaError::NotInTransaction(_))
        ));
    }

    #[test]
    fn detached_nodes_build_freely() {
        let mut m = model();
        let ct = m.create(SchemaKind::LocalComplexType);
        let seq = m.create(SchemaKind::Sequence);
        m.add_child(ct, seq, None).unwrap();
        m.set_attr(seq, "minOccurs", Some("0")).unwrap();
        assert_eq!(m.children(ct), &[seq]);
        assert!(!m.has_changes());
    }

    #[test]
    fn removed_handles_are_not_reused() {
        let mut m = model();
        let root = m.root();
        let a = m
            .transact(|m| m.append(root, SchemaKind::GlobalElement, &[("name", "a")]))
            .unwrap();
        m.transact(|m| m.remove(a)).unwrap();
        let b = m
            .transact(|m| m.append(root, SchemaKind::GlobalElement, &[("name", "a")]))
            .unwrap();
        assert_ne!(a, b);
        assert!(!m.is_alive(a));
        assert_eq!(m.find_global(SchemaKind::GlobalElement, "a"), Some(b));
    }

    #[test]
    fn changes_are_recorded_for_attached_nodes() {
        let mut m = model();
        let root = m.root();
        let el = m
            .transact(|m| m.append(root, SchemaKind::GlobalElement, &[("name", "a")]))
            .unwrap();
        m.transact(|m| m.set_attr(el, "name", Some("b"))).unwrap();
        let changes = m.take_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].kind, ChangeKind::ChildAdded(el));
        assert_eq!(changes[1].kind, ChangeKind::AttributeChanged(SmolStr::new("name")));
        assert!(!m.has_changes());
    }

    #[test]
    fn builtin_types_follow_prefix_bindings() {
        let m = model();
        assert!(m.is_builtin_type("xs:string"));
        assert!(!m.is_builtin_type("tns:string"));
        assert_eq!(m.builtin_type_name("int"), "xs:int");
    }

    #[test]
    fn deep_copy_is_detached() {
        let mut m = model();
        let root = m.root();
        let el = m
            .transact(|m| {
                let el = m.append(root, SchemaKind::GlobalElement, &[("name", "a")])?;
                let ct = m.append(el, SchemaKind::LocalComplexType, &[])?;
                m.append(ct, SchemaKind::Sequence, &[])?;
                Ok(el)
            })
            .unwrap();
        let copy = m.deep_copy(el).unwrap();
        assert!(!m.is_attached(copy));
        assert_eq!(m.descendants(copy).len(), 3);
        assert_eq!(m.name(copy), Some("a"));
    }
}
