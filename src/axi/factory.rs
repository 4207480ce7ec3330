//! Abstraction component factory: one schema node in, zero or one node out.
//!
//! Global definitions are singletons per tree. Globals of this document go
//! through [`AxiModel::lookup`], globals of other documents through
//! [`AxiModel::lookup_from_other_model`]; everything else is fabricated
//! fresh on each call.

use smol_str::SmolStr;

use super::component::{
    AnyData, AttributeData, AttributeUse, AxiKind, AxiNode, AxiType, ComponentType,
    CompositorData, CompositorType, ContentModelData, ContentModelKind, DocumentData, ElementData,
    Form, ProcessContents, SchemaReferenceData, SchemaReferenceKind,
};
use super::datatype::{Datatype, DatatypeBuilder};
use super::model::AxiModel;
use crate::base::constants::{OCCURS_ONE, attr};
use crate::base::{AxiId, QName, SchemaRef};
use crate::schema::{SchemaKind, SchemaSet, TypeTarget};

/// Substitution-group chains are followed at most this far.
const MAX_SUBSTITUTION_DEPTH: usize = 16;

/// Schema kinds cached as per-tree singletons.
pub(crate) fn is_cached_kind(kind: SchemaKind) -> bool {
    matches!(
        kind,
        SchemaKind::GlobalElement
            | SchemaKind::GlobalAttribute
            | SchemaKind::GlobalComplexType
            | SchemaKind::GlobalGroup
            | SchemaKind::GlobalAttributeGroup
    )
}

fn occurs(schemas: &SchemaSet, peer: SchemaRef, name: &str) -> SmolStr {
    SmolStr::new(schemas.attr(peer, name).unwrap_or(OCCURS_ONE))
}

fn text(schemas: &SchemaSet, peer: SchemaRef, name: &str) -> Option<SmolStr> {
    schemas.attr(peer, name).map(SmolStr::new)
}

fn flag(schemas: &SchemaSet, peer: SchemaRef, name: &str) -> bool {
    schemas.attr(peer, name) == Some("true")
}

fn form(schemas: &SchemaSet, peer: SchemaRef, name: &str) -> Option<Form> {
    schemas.attr(peer, name).and_then(Form::parse)
}

impl AxiModel {
    /// Cached node for a global definition of this document.
    pub fn lookup(&self, peer: SchemaRef) -> Option<AxiId> {
        if peer.model != self.schema_id() {
            return None;
        }
        self.cached_global(peer)
    }

    /// Node for a global definition of another document, adopting it into
    /// this tree on first use.
    pub fn lookup_from_other_model(&mut self, schemas: &SchemaSet, peer: SchemaRef) -> Option<AxiId> {
        if peer.model == self.schema_id() {
            return self.lookup(peer);
        }
        if let Some(id) = self.cached_global(peer) {
            return Some(id);
        }
        if !schemas.is_attached(peer) || !schemas.kind(peer).is_some_and(is_cached_kind) {
            return None;
        }
        let id = self.fabricate(schemas, peer)?;
        tracing::trace!("[BUILDER] adopted {peer} from another document as {id}");
        self.cache_global(peer, id);
        Some(id)
    }

    /// Node for `peer`, reusing the cached node for global definitions.
    ///
    /// Returns `None` for schema kinds without a representation and for
    /// references whose target cannot be resolved.
    pub fn create_from_schema_node(&mut self, schemas: &SchemaSet, peer: SchemaRef) -> Option<AxiId> {
        let kind = schemas.kind(peer)?;
        if !is_cached_kind(kind) {
            return self.fabricate(schemas, peer);
        }
        if peer.model != self.schema_id() {
            return self.lookup_from_other_model(schemas, peer);
        }
        if let Some(id) = self.lookup(peer) {
            return Some(id);
        }
        let id = self.fabricate(schemas, peer)?;
        self.cache_global(peer, id);
        Some(id)
    }

    /// Uncached node for `peer` with its children populated. Used to compute
    /// what an existing node should look like now.
    pub fn create_new(&mut self, schemas: &SchemaSet, peer: SchemaRef) -> Option<AxiId> {
        let id = self.fabricate(schemas, peer)?;
        self.ensure_children(schemas, id);
        Some(id)
    }

    /// Allocate a node for `peer` without consulting the cache.
    pub(crate) fn fabricate(&mut self, schemas: &SchemaSet, peer: SchemaRef) -> Option<AxiId> {
        let kind = schemas.kind(peer)?;
        let target_kind = match kind {
            SchemaKind::ElementReference => Some(SchemaKind::GlobalElement),
            SchemaKind::AttributeReference => Some(SchemaKind::GlobalAttribute),
            _ => None,
        };

        let Some(target_kind) = target_kind else {
            let data = self.read_kind(schemas, peer)?;
            return Some(self.alloc(AxiNode::new(data, ComponentType::Original, Some(peer))));
        };

        let Some(target) = schemas
            .attr(peer, attr::REF)
            .and_then(|raw| schemas.resolve_global(peer, target_kind, raw))
        else {
            tracing::trace!("[BUILDER] skipping unresolved reference {peer}");
            return None;
        };
        let referent = self.create_from_schema_node(schemas, target)?;
        let data = self.read_kind(schemas, peer)?;
        let mut node = AxiNode::new(data, ComponentType::Reference, Some(peer));
        node.shared = Some(referent);
        let id = self.alloc(node);
        self.listen(referent, id);
        Some(id)
    }

    /// Property record of `peer` as the schema describes it now.
    pub(crate) fn read_kind(&mut self, schemas: &SchemaSet, peer: SchemaRef) -> Option<AxiKind> {
        let kind = schemas.kind(peer)?;
        let data = match kind {
            SchemaKind::Schema => AxiKind::Document(DocumentData {
                target_namespace: text(schemas, peer, attr::TARGET_NAMESPACE),
                element_form_default: form(schemas, peer, attr::ELEMENT_FORM_DEFAULT)
                    .unwrap_or_default(),
                attribute_form_default: form(schemas, peer, attr::ATTRIBUTE_FORM_DEFAULT)
                    .unwrap_or_default(),
                version: text(schemas, peer, attr::VERSION),
            }),

            SchemaKind::GlobalElement | SchemaKind::LocalElement => {
                let ty = self.compute_element_type(schemas, peer);
                let (min_occurs, max_occurs) = if kind == SchemaKind::GlobalElement {
                    (SmolStr::new_static(OCCURS_ONE), SmolStr::new_static(OCCURS_ONE))
                } else {
                    (
                        occurs(schemas, peer, attr::MIN_OCCURS),
                        occurs(schemas, peer, attr::MAX_OCCURS),
                    )
                };
                AxiKind::Element(ElementData {
                    name: text(schemas, peer, attr::NAME).unwrap_or_default(),
                    min_occurs,
                    max_occurs,
                    fixed: text(schemas, peer, attr::FIXED),
                    default: text(schemas, peer, attr::DEFAULT),
                    nillable: flag(schemas, peer, attr::NILLABLE),
                    is_abstract: flag(schemas, peer, attr::ABSTRACT),
                    form: form(schemas, peer, attr::FORM),
                    ty,
                })
            }
            SchemaKind::ElementReference => AxiKind::Element(ElementData {
                name: reference_name(schemas, peer),
                min_occurs: occurs(schemas, peer, attr::MIN_OCCURS),
                max_occurs: occurs(schemas, peer, attr::MAX_OCCURS),
                ..ElementData::default()
            }),

            SchemaKind::GlobalAttribute | SchemaKind::LocalAttribute => {
                AxiKind::Attribute(AttributeData {
                    name: text(schemas, peer, attr::NAME).unwrap_or_default(),
                    use_: schemas
                        .attr(peer, attr::USE)
                        .and_then(AttributeUse::parse)
                        .unwrap_or_default(),
                    fixed: text(schemas, peer, attr::FIXED),
                    default: text(schemas, peer, attr::DEFAULT),
                    form: form(schemas, peer, attr::FORM),
                    ty: attribute_type(schemas, peer),
                })
            }
            SchemaKind::AttributeReference => AxiKind::Attribute(AttributeData {
                name: reference_name(schemas, peer),
                use_: schemas
                    .attr(peer, attr::USE)
                    .and_then(AttributeUse::parse)
                    .unwrap_or_default(),
                ..AttributeData::default()
            }),

            SchemaKind::Sequence | SchemaKind::Choice | SchemaKind::All => {
                let compositor = CompositorType::from_schema_kind(kind)?;
                AxiKind::Compositor(CompositorData {
                    compositor,
                    min_occurs: occurs(schemas, peer, attr::MIN_OCCURS),
                    max_occurs: occurs(schemas, peer, attr::MAX_OCCURS),
                })
            }

            SchemaKind::GlobalComplexType => content_model(schemas, peer, ContentModelKind::ComplexType),
            SchemaKind::GlobalGroup => content_model(schemas, peer, ContentModelKind::Group),
            SchemaKind::GlobalAttributeGroup => {
                content_model(schemas, peer, ContentModelKind::AttributeGroup)
            }

            SchemaKind::AnyElement => AxiKind::AnyElement(AnyData {
                namespace: text(schemas, peer, attr::NAMESPACE),
                process_contents: schemas
                    .attr(peer, attr::PROCESS_CONTENTS)
                    .and_then(ProcessContents::parse),
                min_occurs: occurs(schemas, peer, attr::MIN_OCCURS),
                max_occurs: occurs(schemas, peer, attr::MAX_OCCURS),
            }),
            SchemaKind::AnyAttribute => AxiKind::AnyAttribute(AnyData {
                namespace: text(schemas, peer, attr::NAMESPACE),
                process_contents: schemas
                    .attr(peer, attr::PROCESS_CONTENTS)
                    .and_then(ProcessContents::parse),
                ..AnyData::default()
            }),

            SchemaKind::Import | SchemaKind::Include | SchemaKind::Redefine => {
                let reference = match kind {
                    SchemaKind::Import => SchemaReferenceKind::Import,
                    SchemaKind::Include => SchemaReferenceKind::Include,
                    _ => SchemaReferenceKind::Redefine,
                };
                AxiKind::SchemaReference(SchemaReferenceData {
                    kind: reference,
                    namespace: text(schemas, peer, attr::NAMESPACE),
                    location: text(schemas, peer, attr::SCHEMA_LOCATION),
                })
            }

            _ => return None,
        };
        Some(data)
    }

    /// Type of an element: inline complex or simple type, then the `type`
    /// attribute, then the substitution-group head's type.
    pub(crate) fn compute_element_type(&mut self, schemas: &SchemaSet, peer: SchemaRef) -> Option<AxiType> {
        let mut current = peer;
        for _ in 0..MAX_SUBSTITUTION_DEPTH {
            for child in schemas.children(current) {
                match schemas.kind(child) {
                    Some(SchemaKind::LocalComplexType) => return Some(AxiType::Anonymous),
                    Some(SchemaKind::LocalSimpleType) => {
                        let datatype = DatatypeBuilder::new(schemas).from_simple_type(child);
                        return Some(AxiType::Datatype(datatype));
                    }
                    _ => {}
                }
            }

            if let Some(raw) = schemas.attr(current, attr::TYPE) {
                return match schemas.resolve_type(current, raw) {
                    TypeTarget::Builtin(local) => Some(AxiType::Datatype(Datatype::builtin(&local))),
                    TypeTarget::Simple(st) => Some(AxiType::Datatype(
                        DatatypeBuilder::new(schemas).from_simple_type(st),
                    )),
                    TypeTarget::Complex(ct) => self
                        .create_from_schema_node(schemas, ct)
                        .map(AxiType::ContentModel),
                    TypeTarget::Unresolved => None,
                };
            }

            current = substitution_head(schemas, current)?;
        }
        tracing::warn!("[BUILDER] substitution chain of {peer} exceeds depth limit");
        None
    }
}

/// Head of an element's substitution group, if it resolves.
pub(crate) fn substitution_head(schemas: &SchemaSet, element: SchemaRef) -> Option<SchemaRef> {
    let raw = schemas.attr(element, attr::SUBSTITUTION_GROUP)?;
    let head = schemas.resolve_global(element, SchemaKind::GlobalElement, raw)?;
    (head != element).then_some(head)
}

fn reference_name(schemas: &SchemaSet, peer: SchemaRef) -> SmolStr {
    schemas
        .attr(peer, attr::REF)
        .map(|raw| SmolStr::new(QName::parse(raw).local))
        .unwrap_or_default()
}

fn content_model(schemas: &SchemaSet, peer: SchemaRef, kind: ContentModelKind) -> AxiKind {
    AxiKind::ContentModel(ContentModelData {
        name: text(schemas, peer, attr::NAME).unwrap_or_default(),
        kind,
    })
}

fn attribute_type(schemas: &SchemaSet, peer: SchemaRef) -> Option<Datatype> {
    let builder = DatatypeBuilder::new(schemas);
    if let Some(raw) = schemas.attr(peer, attr::TYPE) {
        return builder.from_type_name(peer, raw);
    }
    schemas
        .children(peer)
        .into_iter()
        .find(|c| schemas.kind(*c) == Some(SchemaKind::LocalSimpleType))
        .map(|st| builder.from_simple_type(st))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axi::component::KindFamily;
    use crate::base::ModelId;

    fn fixture() -> (SchemaSet, ModelId) {
        let mut set = SchemaSet::new();
        let id = set.create("f.xsd");
        let root = set.model(id).unwrap().root();
        set.model_mut(id)
            .unwrap()
            .transact(|m| {
                let ct = m.append(root, SchemaKind::GlobalComplexType, &[("name", "PersonType")])?;
                m.append(ct, SchemaKind::Sequence, &[])?;
                m.append(root, SchemaKind::GlobalElement, &[("name", "person"), ("type", "PersonType")])?;
                m.append(root, SchemaKind::GlobalElement, &[("name", "age"), ("type", "xs:int")])?;
                m.append(root, SchemaKind::Annotation, &[])
            })
            .unwrap();
        (set, id)
    }

    #[test]
    fn globals_are_singletons() {
        let (set, id) = fixture();
        let mut axi = AxiModel::new(&set, id).unwrap();
        let model = set.model(id).unwrap();
        let person = SchemaRef::new(id, model.find_global(SchemaKind::GlobalElement, "person").unwrap());

        let first = axi.create_from_schema_node(&set, person).unwrap();
        let second = axi.create_from_schema_node(&set, person).unwrap();
        assert_eq!(first, second);
        assert_eq!(axi.lookup(person), Some(first));

        let fresh = axi.create_new(&set, person).unwrap();
        assert_ne!(fresh, first);
    }

    #[test]
    fn element_types_resolve() {
        let (set, id) = fixture();
        let mut axi = AxiModel::new(&set, id).unwrap();
        let model = set.model(id).unwrap();
        let person = SchemaRef::new(id, model.find_global(SchemaKind::GlobalElement, "person").unwrap());
        let age = SchemaRef::new(id, model.find_global(SchemaKind::GlobalElement, "age").unwrap());
        let person_type =
            SchemaRef::new(id, model.find_global(SchemaKind::GlobalComplexType, "PersonType").unwrap());

        let person = axi.create_from_schema_node(&set, person).unwrap();
        let cm = axi.lookup(person_type).unwrap();
        assert_eq!(axi.element_type(person), Some(&AxiType::ContentModel(cm)));
        assert_eq!(axi.family(cm), Some(KindFamily::ContentModel));

        let age = axi.create_from_schema_node(&set, age).unwrap();
        assert_eq!(
            axi.element_type(age),
            Some(&AxiType::Datatype(Datatype::builtin("int")))
        );
    }

    #[test]
    fn annotations_have_no_node() {
        let (set, id) = fixture();
        let mut axi = AxiModel::new(&set, id).unwrap();
        let model = set.model(id).unwrap();
        let annotation = model.globals_of(SchemaKind::Annotation).next().unwrap();
        assert!(axi.create_from_schema_node(&set, SchemaRef::new(id, annotation)).is_none());
    }

    #[test]
    fn unresolved_reference_is_skipped() {
        let mut set = SchemaSet::new();
        let id = set.create("r.xsd");
        let root = set.model(id).unwrap().root();
        let dangling = set
            .model_mut(id)
            .unwrap()
            .transact(|m| {
                let el = m.append(root, SchemaKind::GlobalElement, &[("name", "a")])?;
                let ct = m.append(el, SchemaKind::LocalComplexType, &[])?;
                let seq = m.append(ct, SchemaKind::Sequence, &[])?;
                m.append(seq, SchemaKind::ElementReference, &[("ref", "missing")])
            })
            .unwrap();
        let mut axi = AxiModel::new(&set, id).unwrap();
        assert!(axi.create_from_schema_node(&set, SchemaRef::new(id, dangling)).is_none());
    }
}
