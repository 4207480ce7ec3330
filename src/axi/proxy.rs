//! Reference and proxy layer.
//!
//! A reference stands for a `ref="..."` construct and delegates every read
//! except its cardinality (or `use`) to the referent. A proxy is a transient
//! mirror of one shared node under another parent and delegates everything.
//! Neither owns the node it points at: removing or retiring a wrapper only
//! drops its listener registration.

use super::component::{AxiNode, ComponentType, KindFamily};
use super::error::AxiError;
use super::events::{Property, PropertyChange, PropertyValue};
use super::model::AxiModel;
use crate::base::AxiId;
use crate::schema::SchemaSet;

impl AxiModel {
    /// Wrap `shared` in a new, parentless proxy.
    pub(crate) fn create_proxy(&mut self, shared: AxiId) -> Option<AxiId> {
        let kind = self.kind(shared)?.clone();
        let mut node = AxiNode::new(kind, ComponentType::Proxy, None);
        node.shared = Some(shared);
        let id = self.alloc(node);
        self.listen(shared, id);
        Some(id)
    }

    /// Fresh proxies of every child of `shared`.
    pub(crate) fn proxies_of(&mut self, schemas: &SchemaSet, shared: AxiId) -> Vec<AxiId> {
        self.ensure_children(schemas, shared);
        self.children_vec(shared)
            .into_iter()
            .filter_map(|child| self.create_proxy(child))
            .collect()
    }

    /// Point `reference` at another global definition.
    ///
    /// The reference stops listening to its old referent, fires `Ref` and a
    /// forced refresh, and rebuilds populated children as proxies of the new
    /// referent's children.
    pub fn set_ref(&mut self, schemas: &SchemaSet, reference: AxiId, referent: AxiId) -> Result<(), AxiError> {
        let node = self
            .node(reference)
            .ok_or(AxiError::UnknownComponent(reference))?;
        if node.component_type != ComponentType::Reference {
            return Err(AxiError::NotAReference(reference));
        }
        let family = node.family();
        let old = node.shared;
        let populated = node.children.is_some();

        let target = self
            .node(referent)
            .ok_or(AxiError::UnknownComponent(referent))?;
        let acceptable = target.is_alive()
            && target.component_type == ComponentType::Original
            && target.family() == family
            && matches!(family, KindFamily::Element | KindFamily::Attribute)
            && self.is_global(referent);
        if !acceptable {
            return Err(AxiError::InvalidReferent(referent));
        }
        if old == Some(referent) {
            return Ok(());
        }

        if let Some(old) = old {
            self.unlisten(old, reference);
        }
        self.node_mut(reference)?.shared = Some(referent);
        self.listen(referent, reference);

        self.fire(PropertyChange::new(
            reference,
            Property::Ref,
            old.map(PropertyValue::Component),
            Some(PropertyValue::Component(referent)),
        ));
        self.force_fire(reference);

        if populated {
            for child in self.children_vec(reference) {
                self.detach_child(reference, child, false)?;
            }
            let proxies = self.proxies_of(schemas, referent);
            for proxy in proxies {
                self.insert_child(reference, proxy, None, false)?;
            }
            self.set_mirror_sources(reference, vec![referent]);
        }
        Ok(())
    }

    /// Referent of a reference.
    pub fn referent(&self, reference: AxiId) -> Option<AxiId> {
        match self.component_type(reference)? {
            ComponentType::Reference => self.shared(reference),
            _ => None,
        }
    }
}
