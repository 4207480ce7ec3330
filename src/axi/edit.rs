//! User editing API.
//!
//! New nodes start without a peer; `flush` creates their schema
//! counterparts. Every recorded edit lands in the pending log as a
//! [`PropertyChange`]. Edits applied through a reference or proxy reach the
//! node that owns the property, and the wrapper gets a forced refresh so its
//! observers see the change too.

use smol_str::SmolStr;

use super::component::{
    AnyData, AttributeData, AttributeUse, AxiKind, AxiNode, AxiType, ComponentType, CompositorData,
    CompositorType, ContentModelData, ContentModelKind, ElementData, Form, KindFamily,
};
use super::datatype::Datatype;
use super::error::AxiError;
use super::events::{Property, PropertyChange, PropertyValue};
use super::model::AxiModel;
use crate::base::AxiId;
use crate::schema::SchemaSet;

impl AxiModel {
    // ── Constructors ────────────────────────────────────────────────

    fn alloc_user(&mut self, kind: AxiKind) -> AxiId {
        let mut node = AxiNode::new(kind, ComponentType::Original, None);
        node.children = Some(Vec::new());
        self.alloc(node)
    }

    pub fn new_element(&mut self, name: &str) -> AxiId {
        self.alloc_user(AxiKind::Element(ElementData::named(name)))
    }

    pub fn new_attribute(&mut self, name: &str) -> AxiId {
        self.alloc_user(AxiKind::Attribute(AttributeData {
            name: SmolStr::new(name),
            ..AttributeData::default()
        }))
    }

    pub fn new_compositor(&mut self, compositor: CompositorType) -> AxiId {
        self.alloc_user(AxiKind::Compositor(CompositorData::new(compositor)))
    }

    pub fn new_content_model(&mut self, name: &str, kind: ContentModelKind) -> AxiId {
        self.alloc_user(AxiKind::ContentModel(ContentModelData {
            name: SmolStr::new(name),
            kind,
        }))
    }

    pub fn new_any_element(&mut self) -> AxiId {
        self.alloc_user(AxiKind::AnyElement(AnyData::default()))
    }

    pub fn new_any_attribute(&mut self) -> AxiId {
        self.alloc_user(AxiKind::AnyAttribute(AnyData::default()))
    }

    /// A reference to the global element `referent`.
    pub fn new_element_ref(&mut self, referent: AxiId) -> Result<AxiId, AxiError> {
        self.new_reference(referent, KindFamily::Element)
    }

    /// A reference to the global attribute `referent`.
    pub fn new_attribute_ref(&mut self, referent: AxiId) -> Result<AxiId, AxiError> {
        self.new_reference(referent, KindFamily::Attribute)
    }

    fn new_reference(&mut self, referent: AxiId, family: KindFamily) -> Result<AxiId, AxiError> {
        let target = self
            .node(referent)
            .ok_or(AxiError::UnknownComponent(referent))?;
        if target.component_type() != ComponentType::Original
            || target.family() != family
            || !self.is_global(referent)
        {
            return Err(AxiError::InvalidReferent(referent));
        }
        let name = SmolStr::new(self.name(referent).unwrap_or_default());
        let kind = match family {
            KindFamily::Element => AxiKind::Element(ElementData::named(name)),
            _ => AxiKind::Attribute(AttributeData {
                name,
                ..AttributeData::default()
            }),
        };
        let mut node = AxiNode::new(kind, ComponentType::Reference, None);
        node.shared = Some(referent);
        let id = self.alloc(node);
        self.listen(referent, id);
        Ok(id)
    }

    // ── Structure ───────────────────────────────────────────────────

    /// Attach a parentless node under `parent`. `None` appends.
    ///
    /// Adding under a reference or proxy adds to the original it stands for.
    pub fn add_child(
        &mut self,
        schemas: &SchemaSet,
        parent: AxiId,
        child: AxiId,
        index: Option<usize>,
    ) -> Result<(), AxiError> {
        let parent_family = self.family(parent).ok_or(AxiError::UnknownComponent(parent))?;
        let child_family = self.family(child).ok_or(AxiError::UnknownComponent(child))?;
        if !self.is_alive(parent) {
            return Err(AxiError::Removed(parent));
        }
        if !self.is_alive(child) {
            return Err(AxiError::Removed(child));
        }
        if self.parent(child).is_some() || child == self.root() {
            return Err(AxiError::AlreadyAttached(child));
        }
        if !parent_family.accepts(child_family) {
            return Err(AxiError::InvalidChild { parent, child });
        }

        let owner = self.original(parent);
        self.ensure_children(schemas, owner);
        self.insert_child(owner, child, index, true)?;
        if owner != parent {
            self.force_fire(parent);
        }
        Ok(())
    }

    /// Remove `child` from `parent`.
    ///
    /// Removing a proxy is structural only: the shared node is untouched and
    /// nothing is recorded for `flush`.
    pub fn remove_child(&mut self, parent: AxiId, child: AxiId) -> Result<(), AxiError> {
        let is_child = self
            .children_initialized(parent)
            .is_some_and(|c| c.contains(&child));
        if !is_child {
            return Err(AxiError::NotAChild { parent, child });
        }
        let record = self.component_type(child) != Some(ComponentType::Proxy);
        self.detach_child(parent, child, record)
    }

    // ── Properties ──────────────────────────────────────────────────

    /// Write any scalar property. Use [`AxiModel::set_ref`] to retarget
    /// references.
    pub fn set_property(
        &mut self,
        schemas: &SchemaSet,
        id: AxiId,
        property: Property,
        value: Option<PropertyValue>,
    ) -> Result<(), AxiError> {
        if property == Property::Type {
            if let Some(PropertyValue::Type(ty)) = &value {
                if self.family(self.effective(id, property)) == Some(KindFamily::Element) {
                    return self.set_element_type(schemas, id, ty.clone());
                }
            }
        }
        self.write_property(id, property, value).map(drop)
    }

    fn write_property(
        &mut self,
        id: AxiId,
        property: Property,
        value: Option<PropertyValue>,
    ) -> Result<AxiId, AxiError> {
        if matches!(property, Property::Child | Property::Ref | Property::Refresh) {
            return Err(AxiError::InvalidProperty {
                property: property.name(),
            });
        }
        if !self.is_alive(id) {
            return Err(AxiError::Removed(id));
        }
        let target = self.effective(id, property);
        let old = self
            .kind(target)
            .ok_or(AxiError::UnknownComponent(target))?
            .get(property);
        if old == value {
            return Ok(target);
        }
        self.node_mut(target)?.kind.set(property, value.clone())?;
        self.fire(PropertyChange::new(target, property, old, value));
        if target != id {
            self.force_fire(id);
        }
        Ok(target)
    }

    /// Change an element's type. Populated children follow the new type:
    /// proxies of a content model, nothing for a datatype.
    pub fn set_element_type(&mut self, schemas: &SchemaSet, id: AxiId, ty: AxiType) -> Result<(), AxiError> {
        let before = self.element_type(self.effective(id, Property::Type)).cloned();
        let target = self.write_property(id, Property::Type, Some(PropertyValue::Type(ty.clone())))?;
        if before.as_ref() == Some(&ty) || self.children_initialized(target).is_none() {
            return Ok(());
        }

        match ty {
            AxiType::ContentModel(cm) => {
                self.clear_children(target)?;
                for proxy in self.proxies_of(schemas, cm) {
                    self.insert_child(target, proxy, None, false)?;
                }
                self.set_mirror_sources(target, vec![cm]);
            }
            AxiType::Datatype(_) => {
                self.clear_children(target)?;
                self.set_mirror_sources(target, Vec::new());
            }
            AxiType::Anonymous => {
                if matches!(before, Some(AxiType::ContentModel(_))) {
                    self.clear_children(target)?;
                    self.set_mirror_sources(target, Vec::new());
                }
            }
        }
        Ok(())
    }

    /// Drop every child without recording.
    fn clear_children(&mut self, id: AxiId) -> Result<(), AxiError> {
        for child in self.children_vec(id) {
            self.detach_child(id, child, false)?;
        }
        Ok(())
    }

    pub fn set_name(&mut self, id: AxiId, name: &str) -> Result<(), AxiError> {
        self.write_property(id, Property::Name, Some(PropertyValue::from(name)))
            .map(drop)
    }

    pub fn set_min_occurs(&mut self, id: AxiId, value: &str) -> Result<(), AxiError> {
        self.write_property(id, Property::MinOccurs, Some(PropertyValue::from(value)))
            .map(drop)
    }

    pub fn set_max_occurs(&mut self, id: AxiId, value: &str) -> Result<(), AxiError> {
        self.write_property(id, Property::MaxOccurs, Some(PropertyValue::from(value)))
            .map(drop)
    }

    pub fn set_fixed(&mut self, id: AxiId, value: Option<&str>) -> Result<(), AxiError> {
        self.write_property(id, Property::Fixed, value.map(PropertyValue::from))
            .map(drop)
    }

    pub fn set_default(&mut self, id: AxiId, value: Option<&str>) -> Result<(), AxiError> {
        self.write_property(id, Property::Default, value.map(PropertyValue::from))
            .map(drop)
    }

    pub fn set_nillable(&mut self, id: AxiId, nillable: bool) -> Result<(), AxiError> {
        self.write_property(id, Property::Nillable, Some(PropertyValue::Bool(nillable)))
            .map(drop)
    }

    pub fn set_abstract(&mut self, id: AxiId, is_abstract: bool) -> Result<(), AxiError> {
        self.write_property(id, Property::Abstract, Some(PropertyValue::Bool(is_abstract)))
            .map(drop)
    }

    pub fn set_form(&mut self, id: AxiId, form: Option<Form>) -> Result<(), AxiError> {
        self.write_property(id, Property::Form, form.map(PropertyValue::Form))
            .map(drop)
    }

    pub fn set_use(&mut self, id: AxiId, use_: AttributeUse) -> Result<(), AxiError> {
        self.write_property(id, Property::Use, Some(PropertyValue::Use(use_)))
            .map(drop)
    }

    pub fn set_attribute_type(&mut self, id: AxiId, datatype: Option<Datatype>) -> Result<(), AxiError> {
        let value = datatype.map(|dt| PropertyValue::Type(AxiType::Datatype(dt)));
        self.write_property(id, Property::Type, value).map(drop)
    }

    pub fn set_compositor_type(&mut self, id: AxiId, compositor: CompositorType) -> Result<(), AxiError> {
        self.write_property(id, Property::CompositorType, Some(PropertyValue::Compositor(compositor)))
            .map(drop)
    }

    pub fn set_target_namespace(&mut self, namespace: Option<&str>) -> Result<(), AxiError> {
        let root = self.root();
        self.write_property(root, Property::TargetNamespace, namespace.map(PropertyValue::from))
            .map(drop)
    }
}
