//! Child population.
//!
//! Children are built on first access. The slot is marked populated before
//! any child is built, so a content model reached again through its own
//! content sees an empty list instead of recursing.
//!
//! Content inherited from another node (a named type, a group, an attribute
//! group, an extension base, a substitution-group head) appears as proxies of
//! that node's children, and the node is recorded as a mirror source so later
//! insertions and removals there are replayed here.

use super::component::{AxiType, ComponentType, KindFamily};
use super::factory::substitution_head;
use super::model::AxiModel;
use crate::base::constants::attr;
use crate::base::{AxiId, SchemaRef};
use crate::schema::{SchemaKind, SchemaSet, TypeTarget};

/// Children built for one node and the nodes they mirror.
#[derive(Default)]
struct Built {
    children: Vec<AxiId>,
    sources: Vec<AxiId>,
}

impl Built {
    fn push(&mut self, child: Option<AxiId>) {
        if let Some(child) = child {
            self.children.push(child);
        }
    }

    fn mirror(&mut self, source: AxiId, proxies: Vec<AxiId>) {
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
        self.children.extend(proxies);
    }

    fn extend(&mut self, other: Built) {
        self.children.extend(other.children);
        for source in other.sources {
            if !self.sources.contains(&source) {
                self.sources.push(source);
            }
        }
    }
}

impl AxiModel {
    /// Children of `id`, populating them on first access.
    pub fn children(&mut self, schemas: &SchemaSet, id: AxiId) -> Vec<AxiId> {
        self.ensure_children(schemas, id);
        self.children_vec(id)
    }

    pub(crate) fn ensure_children(&mut self, schemas: &SchemaSet, id: AxiId) {
        match self.node_mut(id) {
            Ok(node) if node.children.is_none() => node.children = Some(Vec::new()),
            _ => return,
        }

        let built = self.build_children(schemas, id);
        for child in &built.children {
            if let Ok(node) = self.node_mut(*child) {
                if node.parent.is_none() {
                    node.parent = Some(id);
                }
            }
        }
        if let Ok(node) = self.node_mut(id) {
            node.children = Some(built.children);
        }
        self.set_mirror_sources(id, built.sources);
    }

    fn build_children(&mut self, schemas: &SchemaSet, id: AxiId) -> Built {
        let Some(node) = self.node(id) else {
            return Built::default();
        };
        let family = node.family();
        let peer = node.peer;
        let shared = node.shared;

        if node.component_type != ComponentType::Original {
            let mut built = Built::default();
            if let Some(shared) = shared {
                let proxies = self.proxies_of(schemas, shared);
                built.mirror(shared, proxies);
            }
            return built;
        }

        let Some(peer) = peer else {
            return Built::default();
        };
        match family {
            KindFamily::Document => self.document_children(schemas, peer),
            KindFamily::Element => self.element_children(schemas, id, peer),
            KindFamily::ContentModel => self.complex_content(schemas, peer),
            KindFamily::Compositor => self.particles(schemas, peer),
            KindFamily::Attribute
            | KindFamily::AnyElement
            | KindFamily::AnyAttribute
            | KindFamily::SchemaReference => Built::default(),
        }
    }

    fn document_children(&mut self, schemas: &SchemaSet, root: SchemaRef) -> Built {
        let mut built = Built::default();
        for child in schemas.children(root) {
            let relevant = schemas.kind(child).is_some_and(|k| {
                k.is_schema_reference()
                    || matches!(
                        k,
                        SchemaKind::GlobalElement
                            | SchemaKind::GlobalAttribute
                            | SchemaKind::GlobalComplexType
                            | SchemaKind::GlobalGroup
                            | SchemaKind::GlobalAttributeGroup
                    )
            });
            if relevant {
                built.push(self.create_from_schema_node(schemas, child));
            }
        }
        built
    }

    fn element_children(&mut self, schemas: &SchemaSet, id: AxiId, peer: SchemaRef) -> Built {
        if let Some(inline) = schemas
            .children(peer)
            .into_iter()
            .find(|c| schemas.kind(*c) == Some(SchemaKind::LocalComplexType))
        {
            return self.complex_content(schemas, inline);
        }

        let mut built = Built::default();
        if let Some(AxiType::ContentModel(cm)) = self.element_type(id).cloned() {
            let proxies = self.proxies_of(schemas, cm);
            built.mirror(cm, proxies);
            return built;
        }

        if let Some(head) = substitution_head(schemas, peer)
            .and_then(|head| self.create_from_schema_node(schemas, head))
            .filter(|head| *head != id)
        {
            let proxies = self.proxies_of(schemas, head);
            built.mirror(head, proxies);
        }
        built
    }

    /// Content of a complex type, group or attribute group: base content
    /// first for extensions, then local particles and attributes.
    fn complex_content(&mut self, schemas: &SchemaSet, holder: SchemaRef) -> Built {
        let mut built = Built::default();
        for child in schemas.children(holder) {
            let Some(kind) = schemas.kind(child) else {
                continue;
            };
            match kind {
                SchemaKind::Sequence
                | SchemaKind::Choice
                | SchemaKind::All
                | SchemaKind::LocalAttribute
                | SchemaKind::AttributeReference
                | SchemaKind::AnyAttribute => {
                    built.push(self.create_from_schema_node(schemas, child));
                }
                SchemaKind::GroupReference => {
                    self.mirror_global(schemas, child, SchemaKind::GlobalGroup, &mut built);
                }
                SchemaKind::AttributeGroupReference => {
                    self.mirror_global(schemas, child, SchemaKind::GlobalAttributeGroup, &mut built);
                }
                SchemaKind::ComplexContent | SchemaKind::SimpleContent => {
                    let inner = self.complex_content(schemas, child);
                    built.extend(inner);
                }
                SchemaKind::Extension => {
                    if let Some(TypeTarget::Complex(base)) = schemas
                        .attr(child, attr::BASE)
                        .map(|raw| schemas.resolve_type(child, raw))
                    {
                        if let Some(cm) = self.create_from_schema_node(schemas, base) {
                            let proxies = self.proxies_of(schemas, cm);
                            built.mirror(cm, proxies);
                        }
                    }
                    let local = self.complex_content(schemas, child);
                    built.extend(local);
                }
                SchemaKind::Restriction => {
                    let local = self.complex_content(schemas, child);
                    built.extend(local);
                }
                _ => {}
            }
        }
        built
    }

    fn particles(&mut self, schemas: &SchemaSet, compositor: SchemaRef) -> Built {
        let mut built = Built::default();
        for child in schemas.children(compositor) {
            match schemas.kind(child) {
                Some(
                    SchemaKind::LocalElement
                    | SchemaKind::ElementReference
                    | SchemaKind::Sequence
                    | SchemaKind::Choice
                    | SchemaKind::All
                    | SchemaKind::AnyElement,
                ) => built.push(self.create_from_schema_node(schemas, child)),
                Some(SchemaKind::GroupReference) => {
                    self.mirror_global(schemas, child, SchemaKind::GlobalGroup, &mut built);
                }
                _ => {}
            }
        }
        built
    }

    /// Proxies for the children of the global a `ref` attribute names.
    fn mirror_global(
        &mut self,
        schemas: &SchemaSet,
        reference: SchemaRef,
        kind: SchemaKind,
        built: &mut Built,
    ) {
        let Some(target) = schemas
            .attr(reference, attr::REF)
            .and_then(|raw| schemas.resolve_global(reference, kind, raw))
        else {
            tracing::trace!("[BUILDER] skipping unresolved {} reference {reference}", kind.tag());
            return;
        };
        if let Some(cm) = self.create_from_schema_node(schemas, target) {
            let proxies = self.proxies_of(schemas, cm);
            built.mirror(cm, proxies);
        }
    }
}
