//! Tree synchronizer.
//!
//! [`AxiModelUpdater`] reconciles a live abstraction tree against the schema
//! after external edits. For each populated node it builds a *shadow*: a
//! fresh, uncached node built from the same peer, showing what the children
//! should be now. Live children are matched to shadow children by peer:
//!
//! 1. live children without a matching (and kind-compatible) shadow child are
//!    removed;
//! 2. shadow children without a live counterpart are adopted at their shadow
//!    position (wrapped in a proxy when the live parent is a proxy);
//! 3. only surviving children are visited recursively.
//!
//! Fresh shadow nodes that were not adopted are discarded afterwards. Live
//! children without a peer are unflushed edits and are left alone.
//!
//! Visit order is the document, then every top-level node that is not a
//! content model, then content models, then globals adopted from other
//! documents.

use rustc_hash::FxHashSet;

use crate::axi::validator::is_valid_peer;
use crate::axi::{
    AxiError, AxiKind, AxiModel, ComponentType, KindFamily, Property, PropertyChange, PropertyValue,
};
use crate::base::constants::attr;
use crate::base::{AxiId, SchemaRef};
use crate::schema::{SchemaKind, SchemaSet, SchemaState};

/// Progress of one [`AxiModelUpdater::do_sync`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

/// Outcome of [`AxiModel::sync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Valid,
    /// Reconciliation failed; the tree is in an unknown state.
    NotSynced,
    /// The schema is structurally broken; nothing was reconciled.
    NotWellFormed,
}

/// One reconciliation pass over an [`AxiModel`].
pub struct AxiModelUpdater<'a> {
    model: &'a mut AxiModel,
    schemas: &'a SchemaSet,
    state: SyncState,
    visited: FxHashSet<AxiId>,
    /// Properties with unflushed user edits; sync must not overwrite them.
    edited: FxHashSet<(AxiId, Property)>,
}

impl<'a> AxiModelUpdater<'a> {
    pub fn new(model: &'a mut AxiModel, schemas: &'a SchemaSet) -> Self {
        Self {
            model,
            schemas,
            state: SyncState::NotStarted,
            visited: FxHashSet::default(),
            edited: FxHashSet::default(),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Run the reconciliation. Any error aborts the pass without rollback
    /// and is reported as `false`.
    pub fn do_sync(&mut self) -> bool {
        self.state = SyncState::InProgress;
        self.visited.clear();
        self.edited = self
            .model
            .pending_changes()
            .iter()
            .map(|c| (c.source, c.property))
            .collect();

        let recording = self.model.set_recording(false);
        let result = self.sync_document();
        self.model.set_recording(recording);

        match result {
            Ok(()) => {
                self.state = SyncState::Completed;
                true
            }
            Err(err) => {
                tracing::warn!(
                    "[SYNC] synchronization of {} failed: {err}",
                    self.model.schema_id()
                );
                self.state = SyncState::Failed;
                false
            }
        }
    }

    fn sync_document(&mut self) -> Result<(), AxiError> {
        let schema = self.model.schema_id();
        if self.schemas.get(schema).is_none() {
            return Err(AxiError::MissingDocument(schema));
        }

        self.retire_orphaned_foreign();

        let root = self.model.root();
        self.visited.insert(root);
        self.refresh_properties(root)?;
        self.model.ensure_children(self.schemas, root);
        self.reconcile(root)?;

        let (content_models, others): (Vec<AxiId>, Vec<AxiId>) = self
            .model
            .children_vec(root)
            .into_iter()
            .partition(|c| self.model.family(*c) == Some(KindFamily::ContentModel));
        for child in others.into_iter().chain(content_models) {
            self.visit(child)?;
        }

        for original in self.model.foreign_originals().to_vec() {
            self.visit(original)?;
        }
        Ok(())
    }

    /// Drop adopted globals whose definition left its document.
    fn retire_orphaned_foreign(&mut self) {
        for original in self.model.foreign_originals().to_vec() {
            let attached = self
                .model
                .peer(original)
                .is_some_and(|p| self.schemas.is_attached(p));
            if !attached {
                tracing::debug!("[SYNC] foreign definition {original} is gone");
                self.model.retire(original);
            }
        }
    }

    fn visit(&mut self, id: AxiId) -> Result<(), AxiError> {
        if !self.model.is_alive(id) || !self.visited.insert(id) {
            return Ok(());
        }
        self.refresh_properties(id)?;
        let dirty = self.reconcile(id)?;
        for child in dirty {
            self.visit(child)?;
        }
        Ok(())
    }

    // ── Properties ──────────────────────────────────────────────────

    fn refresh_properties(&mut self, id: AxiId) -> Result<(), AxiError> {
        let Some(node) = self.model.node(id) else {
            return Ok(());
        };
        let component_type = node.component_type();
        let family = node.family();
        let Some(peer) = self.model.peer(id) else {
            return Ok(());
        };
        if component_type == ComponentType::Proxy || !self.schemas.is_attached(peer) {
            return Ok(());
        }
        if component_type == ComponentType::Reference {
            return self.refresh_reference(id, peer, family);
        }

        let Some(fresh) = self.model.read_kind(self.schemas, peer) else {
            return Ok(());
        };
        if fresh.family() != family {
            return Ok(());
        }
        self.apply(id, &fresh, family.properties())
    }

    fn refresh_reference(&mut self, id: AxiId, peer: SchemaRef, family: KindFamily) -> Result<(), AxiError> {
        let target_kind = match family {
            KindFamily::Element => SchemaKind::GlobalElement,
            KindFamily::Attribute => SchemaKind::GlobalAttribute,
            _ => return Ok(()),
        };
        let referent = self
            .schemas
            .attr(peer, attr::REF)
            .and_then(|raw| self.schemas.resolve_global(peer, target_kind, raw))
            .and_then(|target| self.model.create_from_schema_node(self.schemas, target));

        match referent {
            None => tracing::debug!("[SYNC] reference {id} no longer resolves"),
            Some(referent) => {
                let old = self.model.shared(id);
                if old != Some(referent) && !self.edited.contains(&(id, Property::Ref)) {
                    tracing::trace!("[SYNC] repointing {id} to {referent}");
                    if let Some(old) = old {
                        self.model.unlisten(old, id);
                    }
                    self.model.node_mut(id)?.shared = Some(referent);
                    self.model.listen(referent, id);
                    self.model.notify(PropertyChange::new(
                        id,
                        Property::Ref,
                        old.map(PropertyValue::Component),
                        Some(PropertyValue::Component(referent)),
                    ));
                    self.model.force_fire(id);
                }
            }
        }

        if let Some(fresh) = self.model.read_kind(self.schemas, peer) {
            self.apply(id, &fresh, family.reference_local())?;
        }
        Ok(())
    }

    fn apply(&mut self, id: AxiId, fresh: &AxiKind, properties: &[Property]) -> Result<(), AxiError> {
        for property in properties {
            if self.edited.contains(&(id, *property)) {
                continue;
            }
            let current = self.model.kind(id).and_then(|k| k.get(*property));
            let new = fresh.get(*property);
            if current == new {
                continue;
            }
            tracing::trace!("[SYNC] {id}.{} changed", property.name());
            self.model.node_mut(id)?.kind.set(*property, new.clone())?;
            self.model
                .notify(PropertyChange::new(id, *property, current, new));
        }
        Ok(())
    }

    // ── Children ────────────────────────────────────────────────────

    /// Reconcile the children of `id`; returns the surviving children.
    fn reconcile(&mut self, id: AxiId) -> Result<Vec<AxiId>, AxiError> {
        let Some(node) = self.model.node(id) else {
            return Ok(Vec::new());
        };
        let has_children = matches!(
            node.family(),
            KindFamily::Document | KindFamily::Element | KindFamily::ContentModel | KindFamily::Compositor
        );
        let Some(live) = node.children.clone().filter(|_| has_children) else {
            return Ok(Vec::new());
        };
        let component_type = node.component_type();
        let shared = node.shared();
        let peer = node.peer;
        let mark = self.model.arena_len();

        let (shadow, fresh) = match component_type {
            ComponentType::Proxy => {
                let Some(shared) = shared else {
                    return Ok(Vec::new());
                };
                if !self.model.is_foreign(shared) {
                    return Ok(Vec::new());
                }
                self.model.ensure_children(self.schemas, shared);
                (shared, false)
            }
            ComponentType::Original | ComponentType::Reference => {
                let Some(peer) = peer.filter(|p| self.schemas.is_attached(*p)) else {
                    return Ok(Vec::new());
                };
                match self.model.create_new(self.schemas, peer) {
                    Some(shadow) => (shadow, true),
                    None => return Ok(Vec::new()),
                }
            }
        };
        let shadow_children = self.model.children_vec(shadow);

        let mut dirty = Vec::new();
        for child in live {
            let Some(child_peer) = self.model.peer(child) else {
                continue;
            };
            let matched = shadow_children
                .iter()
                .any(|s| self.model.peer(*s) == Some(child_peer));
            let kind = self.schemas.kind(child_peer);
            let valid = matched && kind.is_some_and(|k| is_valid_peer(self.model, child, k));
            if valid {
                dirty.push(child);
                continue;
            }
            if let (true, Some(kind)) = (matched, kind) {
                tracing::debug!(
                    "[SYNC] {child} is backed by a {} node of the wrong kind, removing it",
                    kind.tag()
                );
            } else {
                tracing::trace!("[SYNC] {child} left {id}");
            }
            self.model.detach_child(id, child, false)?;
        }

        for (index, candidate) in shadow_children.iter().enumerate() {
            let Some(candidate_peer) = self.model.peer(*candidate) else {
                continue;
            };
            let current = self.model.children_vec(id);
            if current
                .iter()
                .any(|c| self.model.peer(*c) == Some(candidate_peer))
            {
                continue;
            }
            if !self.schemas.is_attached(candidate_peer) {
                continue;
            }
            let position = shadow_children[..index]
                .iter()
                .rev()
                .find_map(|prev| {
                    let prev_peer = self.model.peer(*prev)?;
                    current
                        .iter()
                        .position(|c| self.model.peer(*c) == Some(prev_peer))
                })
                .map_or(0, |i| i + 1);

            let adopted = if component_type == ComponentType::Proxy {
                match self.model.create_proxy(*candidate) {
                    Some(proxy) => proxy,
                    None => continue,
                }
            } else {
                *candidate
            };
            tracing::trace!("[SYNC] {adopted} joins {id} at {position}");
            self.model.insert_child(id, adopted, Some(position), false)?;
        }

        if fresh {
            let sources = self
                .model
                .node(shadow)
                .map(|n| n.mirror_sources.clone())
                .unwrap_or_default();
            self.model.discard(shadow, mark);
            self.model.set_mirror_sources(id, sources);
        }
        Ok(dirty)
    }
}

impl AxiModel {
    /// Bring the tree in line with the schema.
    pub fn sync(&mut self, schemas: &SchemaSet) -> ModelState {
        let Some(document) = schemas.get(self.schema_id()) else {
            tracing::warn!("[SYNC] schema document {} is not loaded", self.schema_id());
            return ModelState::NotSynced;
        };
        if document.state() == SchemaState::NotWellFormed {
            return ModelState::NotWellFormed;
        }
        let mut updater = AxiModelUpdater::new(self, schemas);
        if updater.do_sync() {
            ModelState::Valid
        } else {
            ModelState::NotSynced
        }
    }
}
