//! Incremental update: replay recorded edits against the schema.
//!
//! Pending [`PropertyChange`]s become [`UpdateUnit`]s, classified as
//! additions, deletions or modifications. Replay runs inside one schema
//! transaction and dispatches on the source node's kind family and the
//! concrete kind of its peer.

use smol_str::SmolStr;

use super::emit::{
    clear_inline_types, content_start, set_flag, set_occurs, write_datatype,
};
use super::error::GeneratorError;
use super::names::{NameKind, find_unique_global_name};
use crate::axi::{
    AttributeData, AttributeUse, AxiError, AxiKind, AxiModel, AxiType, ComponentType, ContentModelKind,
    ElementData, Form, KindFamily, Property, PropertyChange, PropertyValue, is_cached_kind,
};
use crate::base::constants::attr;
use crate::base::{AxiId, ModelId, QName, SchemaNodeId, SchemaRef};
use crate::schema::{SchemaError, SchemaKind, SchemaModel, SchemaSet};

/// What an update unit does to its source's schema counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    ChildAdded,
    ChildDeleted,
    ChildModified,
}

/// One recorded edit, ready for replay.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateUnit {
    id: usize,
    kind: UpdateKind,
    source: AxiId,
    old: Option<PropertyValue>,
    new: Option<PropertyValue>,
    property: Property,
}

impl UpdateUnit {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn kind(&self) -> UpdateKind {
        self.kind
    }

    pub fn source(&self) -> AxiId {
        self.source
    }

    pub fn old_value(&self) -> Option<&PropertyValue> {
        self.old.as_ref()
    }

    pub fn new_value(&self) -> Option<&PropertyValue> {
        self.new.as_ref()
    }

    pub fn property(&self) -> Property {
        self.property
    }
}

/// Ordered log of update units.
#[derive(Debug, Clone, Default)]
pub struct SchemaUpdate {
    units: Vec<UpdateUnit>,
}

impl SchemaUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_changes(changes: impl IntoIterator<Item = PropertyChange>) -> Self {
        let mut update = Self::new();
        for change in changes {
            update.record(change);
        }
        update
    }

    /// Classify and append one change. Changes carrying no value on either
    /// side, and forced refreshes, produce no unit.
    pub fn record(&mut self, change: PropertyChange) -> Option<&UpdateUnit> {
        let kind = classify(&change)?;
        self.units.push(UpdateUnit {
            id: self.units.len(),
            kind,
            source: change.source,
            old: change.old,
            new: change.new,
            property: change.property,
        });
        self.units.last()
    }

    pub fn units(&self) -> &[UpdateUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl IntoIterator for SchemaUpdate {
    type Item = UpdateUnit;
    type IntoIter = std::vec::IntoIter<UpdateUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.into_iter()
    }
}

fn classify(change: &PropertyChange) -> Option<UpdateKind> {
    if change.property == Property::Refresh {
        return None;
    }
    let structural = change.property == Property::Child;
    match (&change.old, &change.new) {
        (Some(_), Some(_)) => Some(UpdateKind::ChildModified),
        (Some(old), None) if structural && old.is_component() => Some(UpdateKind::ChildDeleted),
        (None, Some(new)) if structural && new.is_component() => Some(UpdateKind::ChildAdded),
        (Some(_), None) | (None, Some(_)) => Some(UpdateKind::ChildModified),
        (None, None) => None,
    }
}

/// Replay `update` against the document backing `axi`.
pub(crate) fn apply(axi: &mut AxiModel, schemas: &mut SchemaSet, update: SchemaUpdate) -> Result<(), GeneratorError> {
    let schema = axi.schema_id();
    let model = schemas.model_mut(schema)?;
    let mut updater = SchemaUpdater { axi, model, schema };

    updater.model.begin_transaction();
    let result = update
        .into_iter()
        .try_for_each(|unit| updater.apply_unit(&unit));
    updater.model.end_transaction();
    result
}

struct SchemaUpdater<'a> {
    axi: &'a mut AxiModel,
    model: &'a mut SchemaModel,
    schema: ModelId,
}

fn text(value: Option<&PropertyValue>) -> Option<&str> {
    value.and_then(PropertyValue::as_text)
}

impl SchemaUpdater<'_> {
    fn apply_unit(&mut self, unit: &UpdateUnit) -> Result<(), GeneratorError> {
        tracing::trace!(
            "[GENERATOR] unit {} {:?} {} on {}",
            unit.id(),
            unit.kind(),
            unit.property().name(),
            unit.source()
        );
        match unit.kind() {
            UpdateKind::ChildAdded => self.add(unit),
            UpdateKind::ChildDeleted => self.delete(unit),
            UpdateKind::ChildModified => self.modify(unit),
        }
    }

    /// Peer of `id` when it lives in this document.
    fn local_peer(&self, id: AxiId) -> Option<SchemaNodeId> {
        self.axi
            .peer(id)
            .filter(|p| p.model == self.schema && self.model.is_alive(p.node))
            .map(|p| p.node)
    }

    fn describe(&self, id: AxiId) -> String {
        match (self.axi.name(id), self.axi.family(id)) {
            (Some(name), _) => name.to_string(),
            (None, Some(family)) => format!("{family:?} {id}"),
            (None, None) => id.to_string(),
        }
    }

    fn in_tree(&self, id: AxiId) -> bool {
        let root = self.axi.root();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == root {
                return true;
            }
            cursor = self.axi.parent(current);
        }
        false
    }

    // ── Additions ───────────────────────────────────────────────────

    fn add(&mut self, unit: &UpdateUnit) -> Result<(), GeneratorError> {
        let source = unit.source();
        let Some(child) = unit.new_value().and_then(PropertyValue::as_component) else {
            return Ok(());
        };
        if !self.axi.is_alive(child)
            || self.axi.parent(child) != Some(source)
            || self.axi.component_type(child) == Some(ComponentType::Proxy)
            || self.local_peer(child).is_some_and(|p| self.model.is_attached(p))
        {
            return Ok(());
        }

        let Some(parent_peer) = self.local_peer(source) else {
            if self.axi.peer(source).is_some() {
                tracing::warn!("[GENERATOR] {source} belongs to another document, skipping");
                return Ok(());
            }
            if self.in_tree(source) {
                // An ancestor's own addition will emit this subtree.
                return Ok(());
            }
            return Err(GeneratorError::MissingPeer(self.describe(source)));
        };

        let (Some(parent_family), Some(child_family)) = (self.axi.family(source), self.axi.family(child)) else {
            return Ok(());
        };
        let siblings = self.axi.children_vec(source);
        let position = siblings
            .iter()
            .position(|c| *c == child)
            .unwrap_or(siblings.len());

        let (container, global) = match parent_family {
            KindFamily::Document => (parent_peer, true),
            KindFamily::Element | KindFamily::ContentModel => (self.content_container(parent_peer)?, false),
            KindFamily::Compositor => (parent_peer, false),
            _ => {
                tracing::warn!("[GENERATOR] {source} cannot hold {child}");
                return Ok(());
            }
        };

        let node = self.emit(child, global)?;
        let at = self
            .anchor_index(container, &siblings, position)
            .unwrap_or_else(|| self.default_index(container, child_family, position));
        self.model.add_child(container, node, Some(at))?;
        if global && self.model.kind(node).is_some_and(is_cached_kind) {
            self.axi.cache_global(SchemaRef::new(self.schema, node), child);
        }
        Ok(())
    }

    /// Schema index next to the nearest already-emitted sibling.
    fn anchor_index(&self, container: SchemaNodeId, siblings: &[AxiId], position: usize) -> Option<usize> {
        let placed = |sibling: &AxiId| {
            self.local_peer(*sibling)
                .filter(|p| self.model.parent(*p) == Some(container))
                .and_then(|p| self.model.index_in_parent(p))
        };
        siblings[..position]
            .iter()
            .rev()
            .find_map(placed)
            .map(|i| i + 1)
            .or_else(|| siblings.get(position + 1..)?.iter().find_map(placed))
    }

    fn default_index(&self, container: SchemaNodeId, family: KindFamily, position: usize) -> usize {
        let children = self.model.children(container);
        let in_compositor = self
            .model
            .kind(container)
            .is_some_and(SchemaKind::is_compositor);
        match family {
            _ if in_compositor && position == 0 => content_start(self.model, container),
            KindFamily::SchemaReference => {
                let start = content_start(self.model, container);
                start
                    + children[start..]
                        .iter()
                        .take_while(|c| self.model.kind(**c).is_some_and(SchemaKind::is_schema_reference))
                        .count()
            }
            KindFamily::Compositor if !in_compositor => content_start(self.model, container),
            KindFamily::Attribute => children
                .iter()
                .position(|c| self.model.kind(*c) == Some(SchemaKind::AnyAttribute))
                .unwrap_or(children.len()),
            _ => children.len(),
        }
    }

    /// Node that holds the particles and attributes of an element or type,
    /// creating an inline complex type when the element has none.
    fn content_container(&mut self, peer: SchemaNodeId) -> Result<SchemaNodeId, GeneratorError> {
        let complex_type = match self.model.kind(peer) {
            Some(SchemaKind::GlobalComplexType | SchemaKind::GlobalGroup | SchemaKind::GlobalAttributeGroup) => peer,
            Some(SchemaKind::GlobalElement | SchemaKind::LocalElement) => {
                let inline = self
                    .model
                    .child_where(peer, |k| k == SchemaKind::LocalComplexType);
                let named = self
                    .model
                    .attr(peer, attr::TYPE)
                    .and_then(|raw| {
                        self.model
                            .find_global(SchemaKind::GlobalComplexType, QName::parse(raw).local)
                    });
                match inline.or(named) {
                    Some(ct) => ct,
                    None => {
                        clear_inline_types(self.model, peer)?;
                        self.model.set_attr(peer, attr::TYPE, None)?;
                        let ct = self.model.create(SchemaKind::LocalComplexType);
                        let at = content_start(self.model, peer);
                        self.model.add_child(peer, ct, Some(at))?;
                        ct
                    }
                }
            }
            _ => return Err(SchemaError::invalid("content", format!("{peer} holds no particles")).into()),
        };
        Ok(self.derivation_or_self(complex_type))
    }

    fn derivation_or_self(&self, complex_type: SchemaNodeId) -> SchemaNodeId {
        self.model
            .child_where(complex_type, |k| {
                matches!(k, SchemaKind::ComplexContent | SchemaKind::SimpleContent)
            })
            .and_then(|content| {
                self.model.child_where(content, |k| {
                    matches!(k, SchemaKind::Extension | SchemaKind::Restriction)
                })
            })
            .unwrap_or(complex_type)
    }

    // ── Emission ────────────────────────────────────────────────────

    /// Build a detached schema subtree for `id` and its non-proxy
    /// descendants, stamping peers as it goes.
    fn emit(&mut self, id: AxiId, global: bool) -> Result<SchemaNodeId, GeneratorError> {
        let node = self.axi.node(id).ok_or(AxiError::UnknownComponent(id))?;
        let component_type = node.component_type();
        let kind = node.kind().clone();

        let schema_node = match (kind, component_type) {
            (AxiKind::Element(e), ComponentType::Reference) => {
                let name = self.referent_name(id);
                let reference = self
                    .model
                    .create_with(SchemaKind::ElementReference, &[(attr::REF, name.as_str())]);
                set_occurs(self.model, reference, attr::MIN_OCCURS, Some(e.min_occurs.as_str()))?;
                set_occurs(self.model, reference, attr::MAX_OCCURS, Some(e.max_occurs.as_str()))?;
                reference
            }
            (AxiKind::Attribute(a), ComponentType::Reference) => {
                let name = self.referent_name(id);
                let reference = self
                    .model
                    .create_with(SchemaKind::AttributeReference, &[(attr::REF, name.as_str())]);
                self.write_use(reference, a.use_)?;
                reference
            }
            (AxiKind::Element(e), _) => self.emit_element(id, &e, global)?,
            (AxiKind::Attribute(a), _) => self.emit_attribute(id, &a, global)?,
            (AxiKind::Compositor(c), _) => {
                let compositor = self.model.create(c.compositor.schema_kind());
                set_occurs(self.model, compositor, attr::MIN_OCCURS, Some(c.min_occurs.as_str()))?;
                set_occurs(self.model, compositor, attr::MAX_OCCURS, Some(c.max_occurs.as_str()))?;
                self.emit_children(id, compositor)?;
                compositor
            }
            (AxiKind::ContentModel(cm), _) => {
                let name_kind = content_model_name_kind(cm.kind);
                let name = self.claim_global_name(id, name_kind, &cm.name);
                let definition = self
                    .model
                    .create_with(cm.kind.schema_kind(), &[(attr::NAME, name.as_str())]);
                self.emit_children(id, definition)?;
                definition
            }
            (AxiKind::AnyElement(a), _) => {
                let any = self.model.create(SchemaKind::AnyElement);
                self.model.set_attr(any, attr::NAMESPACE, a.namespace.as_deref())?;
                self.model
                    .set_attr(any, attr::PROCESS_CONTENTS, a.process_contents.map(|p| p.as_str()))?;
                set_occurs(self.model, any, attr::MIN_OCCURS, Some(a.min_occurs.as_str()))?;
                set_occurs(self.model, any, attr::MAX_OCCURS, Some(a.max_occurs.as_str()))?;
                any
            }
            (AxiKind::AnyAttribute(a), _) => {
                let any = self.model.create(SchemaKind::AnyAttribute);
                self.model.set_attr(any, attr::NAMESPACE, a.namespace.as_deref())?;
                self.model
                    .set_attr(any, attr::PROCESS_CONTENTS, a.process_contents.map(|p| p.as_str()))?;
                any
            }
            (AxiKind::SchemaReference(s), _) => {
                let reference = self.model.create(s.kind.schema_kind());
                self.model.set_attr(reference, attr::NAMESPACE, s.namespace.as_deref())?;
                self.model
                    .set_attr(reference, attr::SCHEMA_LOCATION, s.location.as_deref())?;
                reference
            }
            (AxiKind::Document(_), _) => {
                let root = self.axi.root();
                return Err(AxiError::InvalidChild { parent: root, child: id }.into());
            }
        };

        self.axi
            .set_peer_raw(id, Some(SchemaRef::new(self.schema, schema_node)))?;
        Ok(schema_node)
    }

    fn emit_children(&mut self, id: AxiId, parent: SchemaNodeId) -> Result<(), GeneratorError> {
        for child in self.axi.children_vec(id) {
            if self.axi.component_type(child) == Some(ComponentType::Proxy) {
                continue;
            }
            let node = self.emit(child, false)?;
            self.model.add_child(parent, node, None)?;
        }
        Ok(())
    }

    fn emit_element(&mut self, id: AxiId, e: &ElementData, global: bool) -> Result<SchemaNodeId, GeneratorError> {
        let (kind, name) = if global {
            (
                SchemaKind::GlobalElement,
                self.claim_global_name(id, NameKind::Element, &e.name),
            )
        } else {
            (SchemaKind::LocalElement, e.name.clone())
        };
        let element = self.model.create_with(kind, &[(attr::NAME, name.as_str())]);
        if global {
            set_flag(self.model, element, attr::ABSTRACT, e.is_abstract)?;
        } else {
            set_occurs(self.model, element, attr::MIN_OCCURS, Some(e.min_occurs.as_str()))?;
            set_occurs(self.model, element, attr::MAX_OCCURS, Some(e.max_occurs.as_str()))?;
            self.model
                .set_attr(element, attr::FORM, e.form.map(Form::as_str))?;
        }
        self.model.set_attr(element, attr::FIXED, e.fixed.as_deref())?;
        self.model
            .set_attr(element, attr::DEFAULT, e.default.as_deref())?;
        set_flag(self.model, element, attr::NILLABLE, e.nillable)?;

        let has_content = self
            .axi
            .children_initialized(id)
            .is_some_and(|c| !c.is_empty());
        match &e.ty {
            Some(AxiType::Datatype(datatype)) => write_datatype(self.model, element, datatype)?,
            Some(AxiType::ContentModel(cm)) => {
                let name = self.model.qualify(self.axi.name(*cm).unwrap_or_default());
                self.model.set_attr(element, attr::TYPE, Some(&name))?;
            }
            Some(AxiType::Anonymous) | None if has_content || e.ty.is_some() => {
                let complex_type = self.model.create(SchemaKind::LocalComplexType);
                self.emit_children(id, complex_type)?;
                self.model.add_child(element, complex_type, None)?;
            }
            _ => {}
        }
        Ok(element)
    }

    fn emit_attribute(&mut self, id: AxiId, a: &AttributeData, global: bool) -> Result<SchemaNodeId, GeneratorError> {
        let (kind, name) = if global {
            (
                SchemaKind::GlobalAttribute,
                self.claim_global_name(id, NameKind::Attribute, &a.name),
            )
        } else {
            (SchemaKind::LocalAttribute, a.name.clone())
        };
        let attribute = self.model.create_with(kind, &[(attr::NAME, name.as_str())]);
        if !global {
            self.write_use(attribute, a.use_)?;
            self.model
                .set_attr(attribute, attr::FORM, a.form.map(Form::as_str))?;
        }
        self.model.set_attr(attribute, attr::FIXED, a.fixed.as_deref())?;
        self.model
            .set_attr(attribute, attr::DEFAULT, a.default.as_deref())?;
        if let Some(datatype) = &a.ty {
            write_datatype(self.model, attribute, datatype)?;
        }
        Ok(attribute)
    }

    fn write_use(&mut self, node: SchemaNodeId, use_: AttributeUse) -> Result<(), GeneratorError> {
        let value = (use_ != AttributeUse::Optional).then(|| use_.as_str());
        self.model.set_attr(node, attr::USE, value)?;
        Ok(())
    }

    fn referent_name(&self, reference: AxiId) -> String {
        let referent = self.axi.referent(reference).unwrap_or(reference);
        self.model
            .qualify(self.axi.name(referent).unwrap_or_default())
    }

    /// A free global name for `id`; a collision renames the node.
    fn claim_global_name(&mut self, id: AxiId, kind: NameKind, seed: &str) -> SmolStr {
        let name = find_unique_global_name(self.model, kind, seed);
        if name != seed {
            tracing::debug!("[GENERATOR] global name {seed} is taken, using {name}");
            self.rename_quietly(id, &name);
        }
        name
    }

    fn rename_quietly(&mut self, id: AxiId, name: &str) {
        let old = self.axi.property(id, Property::Name);
        let new = Some(PropertyValue::from(name));
        let renamed = self
            .axi
            .node_mut(id)
            .and_then(|n| n.kind.set(Property::Name, new.clone()));
        if renamed.is_ok() {
            self.axi
                .notify(PropertyChange::new(id, Property::Name, old, new));
        }
    }

    // ── Deletions ───────────────────────────────────────────────────

    fn delete(&mut self, unit: &UpdateUnit) -> Result<(), GeneratorError> {
        let Some(child) = unit.old_value().and_then(PropertyValue::as_component) else {
            return Ok(());
        };
        if self.axi.component_type(child) == Some(ComponentType::Proxy) {
            return Ok(());
        }
        if let Some(peer) = self.local_peer(child).filter(|p| self.model.is_attached(*p)) {
            self.model.remove(peer)?;
        }
        Ok(())
    }

    // ── Modifications ───────────────────────────────────────────────

    fn modify(&mut self, unit: &UpdateUnit) -> Result<(), GeneratorError> {
        let source = unit.source();
        let Some(peer) = self.local_peer(source) else {
            // Emission of the source will carry the current value.
            return Ok(());
        };
        let Some(family) = self.axi.family(source) else {
            return Ok(());
        };
        let property = unit.property();
        let new = unit.new_value();

        match (family, self.model.kind(peer)) {
            (KindFamily::Document, _) => self.modify_document(peer, property, new),
            (KindFamily::Element, Some(SchemaKind::LocalElement)) => {
                if self.modify_cardinality(peer, property, new)? {
                    return Ok(());
                }
                if property == Property::Name {
                    self.model.set_attr(peer, attr::NAME, text(new))?;
                    return Ok(());
                }
                self.modify_element(peer, property, new)
            }
            (KindFamily::Element, Some(SchemaKind::GlobalElement)) => match property {
                Property::MinOccurs | Property::MaxOccurs => Ok(()),
                Property::Name => self.rename_global(source, peer, NameKind::Element, text(new)),
                _ => self.modify_element(peer, property, new),
            },
            (KindFamily::Element, Some(SchemaKind::ElementReference)) => {
                if self.modify_cardinality(peer, property, new)? {
                    return Ok(());
                }
                if property == Property::Ref {
                    self.retarget(peer, new)?;
                }
                Ok(())
            }
            (KindFamily::Attribute, Some(SchemaKind::LocalAttribute)) => match property {
                Property::Name => Ok(self.model.set_attr(peer, attr::NAME, text(new))?),
                _ => self.modify_attribute(peer, property, new),
            },
            (KindFamily::Attribute, Some(SchemaKind::GlobalAttribute)) => match property {
                Property::Name => self.rename_global(source, peer, NameKind::Attribute, text(new)),
                Property::Use | Property::Form => Ok(()),
                _ => self.modify_attribute(peer, property, new),
            },
            (KindFamily::Attribute, Some(SchemaKind::AttributeReference)) => match property {
                Property::Ref => self.retarget(peer, new),
                _ => self.modify_attribute(peer, property, new),
            },
            (KindFamily::ContentModel, Some(kind)) if property == Property::Name => {
                let name_kind = match kind {
                    SchemaKind::GlobalGroup => NameKind::Group,
                    SchemaKind::GlobalAttributeGroup => NameKind::AttributeGroup,
                    _ => NameKind::ComplexType,
                };
                self.rename_global(source, peer, name_kind, text(new))
            }
            (KindFamily::Compositor, _) => {
                if self.modify_cardinality(peer, property, new)? {
                    return Ok(());
                }
                if let (Property::CompositorType, Some(PropertyValue::Compositor(compositor))) = (property, new) {
                    self.replace_compositor(source, peer, compositor.schema_kind())?;
                }
                Ok(())
            }
            (KindFamily::AnyElement | KindFamily::AnyAttribute, _) => {
                if self.modify_cardinality(peer, property, new)? {
                    return Ok(());
                }
                match (property, new) {
                    (Property::ProcessContents, Some(PropertyValue::ProcessContents(p))) => {
                        self.model.set_attr(peer, attr::PROCESS_CONTENTS, Some(p.as_str()))?
                    }
                    (Property::ProcessContents, _) => {
                        self.model.set_attr(peer, attr::PROCESS_CONTENTS, None)?
                    }
                    (Property::Namespace, _) => self.model.set_attr(peer, attr::NAMESPACE, text(new))?,
                    _ => {}
                }
                Ok(())
            }
            (KindFamily::SchemaReference, _) => {
                match property {
                    Property::Namespace => self.model.set_attr(peer, attr::NAMESPACE, text(new))?,
                    Property::SchemaLocation => {
                        self.model.set_attr(peer, attr::SCHEMA_LOCATION, text(new))?
                    }
                    _ => {}
                }
                Ok(())
            }
            (family, kind) => {
                tracing::trace!("[GENERATOR] no handler for {family:?} backed by {kind:?}");
                Ok(())
            }
        }
    }

    fn modify_document(&mut self, peer: SchemaNodeId, property: Property, new: Option<&PropertyValue>) -> Result<(), GeneratorError> {
        let form = |value: Option<&PropertyValue>| match value {
            Some(PropertyValue::Form(f)) if *f != Form::default() => Some(f.as_str()),
            _ => None,
        };
        match property {
            Property::TargetNamespace => self.model.set_attr(peer, attr::TARGET_NAMESPACE, text(new))?,
            Property::ElementFormDefault => self.model.set_attr(peer, attr::ELEMENT_FORM_DEFAULT, form(new))?,
            Property::AttributeFormDefault => {
                self.model.set_attr(peer, attr::ATTRIBUTE_FORM_DEFAULT, form(new))?
            }
            Property::Version => self.model.set_attr(peer, attr::VERSION, text(new))?,
            _ => {}
        }
        Ok(())
    }

    /// Returns whether the property was a cardinality.
    fn modify_cardinality(&mut self, peer: SchemaNodeId, property: Property, new: Option<&PropertyValue>) -> Result<bool, GeneratorError> {
        let name = match property {
            Property::MinOccurs => attr::MIN_OCCURS,
            Property::MaxOccurs => attr::MAX_OCCURS,
            _ => return Ok(false),
        };
        set_occurs(self.model, peer, name, text(new))?;
        Ok(true)
    }

    fn modify_element(&mut self, peer: SchemaNodeId, property: Property, new: Option<&PropertyValue>) -> Result<(), GeneratorError> {
        match (property, new) {
            (Property::Fixed, _) => self.model.set_attr(peer, attr::FIXED, text(new))?,
            (Property::Default, _) => self.model.set_attr(peer, attr::DEFAULT, text(new))?,
            (Property::Nillable, Some(PropertyValue::Bool(b))) => set_flag(self.model, peer, attr::NILLABLE, *b)?,
            (Property::Nillable, None) => set_flag(self.model, peer, attr::NILLABLE, false)?,
            (Property::Abstract, Some(PropertyValue::Bool(b))) => {
                if self.model.kind(peer) == Some(SchemaKind::GlobalElement) {
                    set_flag(self.model, peer, attr::ABSTRACT, *b)?;
                }
            }
            (Property::Form, Some(PropertyValue::Form(f))) => self.model.set_attr(peer, attr::FORM, Some(f.as_str()))?,
            (Property::Form, None) => self.model.set_attr(peer, attr::FORM, None)?,
            (Property::Type, _) => self.write_element_type(peer, new.and_then(PropertyValue::as_type))?,
            _ => {}
        }
        Ok(())
    }

    fn write_element_type(&mut self, peer: SchemaNodeId, ty: Option<&AxiType>) -> Result<(), GeneratorError> {
        match ty {
            Some(AxiType::ContentModel(cm)) => {
                clear_inline_types(self.model, peer)?;
                let name = self.model.qualify(self.axi.name(*cm).unwrap_or_default());
                self.model.set_attr(peer, attr::TYPE, Some(&name))?;
            }
            Some(AxiType::Datatype(datatype)) => write_datatype(self.model, peer, datatype)?,
            Some(AxiType::Anonymous) => {
                self.model.set_attr(peer, attr::TYPE, None)?;
                if self
                    .model
                    .child_where(peer, |k| k == SchemaKind::LocalComplexType)
                    .is_none()
                {
                    clear_inline_types(self.model, peer)?;
                    let complex_type = self.model.create(SchemaKind::LocalComplexType);
                    let at = content_start(self.model, peer);
                    self.model.add_child(peer, complex_type, Some(at))?;
                }
            }
            None => {
                self.model.set_attr(peer, attr::TYPE, None)?;
                clear_inline_types(self.model, peer)?;
            }
        }
        Ok(())
    }

    fn modify_attribute(&mut self, peer: SchemaNodeId, property: Property, new: Option<&PropertyValue>) -> Result<(), GeneratorError> {
        match (property, new) {
            (Property::Fixed, _) => self.model.set_attr(peer, attr::FIXED, text(new))?,
            (Property::Default, _) => self.model.set_attr(peer, attr::DEFAULT, text(new))?,
            (Property::Form, Some(PropertyValue::Form(f))) => self.model.set_attr(peer, attr::FORM, Some(f.as_str()))?,
            (Property::Form, None) => self.model.set_attr(peer, attr::FORM, None)?,
            (Property::Use, Some(PropertyValue::Use(u))) => self.write_use(peer, *u)?,
            (Property::Use, None) => self.write_use(peer, AttributeUse::Optional)?,
            (Property::Type, Some(PropertyValue::Type(AxiType::Datatype(datatype)))) => {
                write_datatype(self.model, peer, datatype)?
            }
            (Property::Type, None) => {
                self.model.set_attr(peer, attr::TYPE, None)?;
                clear_inline_types(self.model, peer)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn retarget(&mut self, peer: SchemaNodeId, new: Option<&PropertyValue>) -> Result<(), GeneratorError> {
        let Some(referent) = new.and_then(PropertyValue::as_component) else {
            return Ok(());
        };
        let name = self
            .model
            .qualify(self.axi.name(referent).unwrap_or_default());
        self.model.set_attr(peer, attr::REF, Some(&name))?;
        Ok(())
    }

    /// Rename a top-level definition to a free name and rewrite every use of
    /// the old name in this document.
    fn rename_global(
        &mut self,
        source: AxiId,
        peer: SchemaNodeId,
        kind: NameKind,
        requested: Option<&str>,
    ) -> Result<(), GeneratorError> {
        let Some(requested) = requested else {
            return Ok(());
        };
        let Some(old) = self.model.name(peer).map(SmolStr::new) else {
            return Ok(());
        };
        if old == requested {
            return Ok(());
        }
        let users = self.users_of(peer, kind, &old);
        let name = find_unique_global_name(self.model, kind, requested);
        self.model.set_attr(peer, attr::NAME, Some(&name))?;
        if name != requested {
            tracing::debug!("[GENERATOR] global name {requested} is taken, using {name}");
            self.rename_quietly(source, &name);
        }
        let qualified = self.model.qualify(&name);
        for (node, attribute) in users {
            self.model.set_attr(node, attribute, Some(&qualified))?;
        }
        Ok(())
    }

    /// Nodes whose `ref`, `type` or `base` attribute resolves to `target`.
    fn users_of(&self, target: SchemaNodeId, kind: NameKind, name: &str) -> Vec<(SchemaNodeId, &'static str)> {
        if self.model.find_global(kind.schema_kind(), name) != Some(target) {
            return Vec::new();
        }
        let slots: &[(SchemaKind, &'static str)] = match kind {
            NameKind::Element => &[(SchemaKind::ElementReference, attr::REF)],
            NameKind::Attribute => &[(SchemaKind::AttributeReference, attr::REF)],
            NameKind::Group => &[(SchemaKind::GroupReference, attr::REF)],
            NameKind::AttributeGroup => &[(SchemaKind::AttributeGroupReference, attr::REF)],
            NameKind::ComplexType | NameKind::SimpleType => &[
                (SchemaKind::GlobalElement, attr::TYPE),
                (SchemaKind::LocalElement, attr::TYPE),
                (SchemaKind::GlobalAttribute, attr::TYPE),
                (SchemaKind::LocalAttribute, attr::TYPE),
                (SchemaKind::Extension, attr::BASE),
                (SchemaKind::Restriction, attr::BASE),
                (SchemaKind::SimpleRestriction, attr::BASE),
            ],
        };
        self.model
            .descendants(self.model.root())
            .into_iter()
            .filter_map(|node| {
                let kind = self.model.kind(node)?;
                let (_, attribute) = slots.iter().find(|(k, _)| *k == kind)?;
                let value = self.model.attr(node, attribute)?;
                (QName::parse(value).local == name && !self.model.is_builtin_type(value))
                    .then_some((node, *attribute))
            })
            .collect()
    }

    /// Swap a compositor's schema node for one of another kind, moving its
    /// content across.
    fn replace_compositor(&mut self, source: AxiId, old: SchemaNodeId, kind: SchemaKind) -> Result<(), GeneratorError> {
        if self.model.kind(old) == Some(kind) {
            return Ok(());
        }
        let Some(parent) = self.model.parent(old) else {
            return Ok(());
        };
        let index = self.model.index_in_parent(old).unwrap_or(0);
        let attributes: Vec<(SmolStr, SmolStr)> = self
            .model
            .node(old)
            .map(|n| {
                n.attributes()
                    .map(|(k, v)| (SmolStr::new(k), SmolStr::new(v)))
                    .collect()
            })
            .unwrap_or_default();
        let borrowed: Vec<(&str, &str)> = attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let replacement = self.model.create_with(kind, &borrowed);

        for child in self.model.children(old).to_vec() {
            self.model.detach(child)?;
            self.model.add_child(replacement, child, None)?;
        }
        self.model.remove(old)?;
        self.model.add_child(parent, replacement, Some(index))?;
        self.axi
            .set_peer_raw(source, Some(SchemaRef::new(self.schema, replacement)))?;
        Ok(())
    }
}

fn content_model_name_kind(kind: ContentModelKind) -> NameKind {
    match kind {
        ContentModelKind::ComplexType => NameKind::ComplexType,
        ContentModelKind::Group => NameKind::Group,
        ContentModelKind::AttributeGroup => NameKind::AttributeGroup,
    }
}
