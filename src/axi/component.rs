//! Abstraction node kinds and their property records.

use smol_str::SmolStr;

use super::datatype::Datatype;
use super::error::AxiError;
use super::events::{Property, PropertyValue};
use crate::base::constants::OCCURS_ONE;
use crate::base::{AxiId, SchemaRef};
use crate::schema::SchemaKind;

// ============================================================================
// ENUMERATIONS
// ============================================================================

/// Identity kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// Owns its definition.
    Original,
    /// A schema-level reference (`ref="..."`) to a shared definition.
    Reference,
    /// A transient mirror of a shared definition under another parent.
    Proxy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Form {
    Qualified,
    #[default]
    Unqualified,
}

impl Form {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "qualified" => Some(Self::Qualified),
            "unqualified" => Some(Self::Unqualified),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qualified => "qualified",
            Self::Unqualified => "unqualified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeUse {
    #[default]
    Optional,
    Required,
    Prohibited,
}

impl AttributeUse {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "optional" => Some(Self::Optional),
            "required" => Some(Self::Required),
            "prohibited" => Some(Self::Prohibited),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Optional => "optional",
            Self::Required => "required",
            Self::Prohibited => "prohibited",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositorType {
    Sequence,
    Choice,
    All,
}

impl CompositorType {
    pub fn from_schema_kind(kind: SchemaKind) -> Option<Self> {
        match kind {
            SchemaKind::Sequence => Some(Self::Sequence),
            SchemaKind::Choice => Some(Self::Choice),
            SchemaKind::All => Some(Self::All),
            _ => None,
        }
    }

    pub fn schema_kind(self) -> SchemaKind {
        match self {
            Self::Sequence => SchemaKind::Sequence,
            Self::Choice => SchemaKind::Choice,
            Self::All => SchemaKind::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessContents {
    Strict,
    Lax,
    Skip,
}

impl ProcessContents {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "strict" => Some(Self::Strict),
            "lax" => Some(Self::Lax),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lax => "lax",
            Self::Skip => "skip",
        }
    }
}

/// What kind of global definition a content model stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentModelKind {
    ComplexType,
    Group,
    AttributeGroup,
}

impl ContentModelKind {
    pub fn schema_kind(self) -> SchemaKind {
        match self {
            Self::ComplexType => SchemaKind::GlobalComplexType,
            Self::Group => SchemaKind::GlobalGroup,
            Self::AttributeGroup => SchemaKind::GlobalAttributeGroup,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaReferenceKind {
    Import,
    Include,
    Redefine,
}

impl SchemaReferenceKind {
    pub fn schema_kind(self) -> SchemaKind {
        match self {
            Self::Import => SchemaKind::Import,
            Self::Include => SchemaKind::Include,
            Self::Redefine => SchemaKind::Redefine,
        }
    }
}

/// The type of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AxiType {
    Datatype(Datatype),
    /// A named global complex type.
    ContentModel(AxiId),
    /// An inline anonymous complex type.
    Anonymous,
}

// ============================================================================
// PROPERTY RECORDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentData {
    pub target_namespace: Option<SmolStr>,
    pub element_form_default: Form,
    pub attribute_form_default: Form,
    pub version: Option<SmolStr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub name: SmolStr,
    pub min_occurs: SmolStr,
    pub max_occurs: SmolStr,
    pub fixed: Option<SmolStr>,
    pub default: Option<SmolStr>,
    pub nillable: bool,
    pub is_abstract: bool,
    pub form: Option<Form>,
    pub ty: Option<AxiType>,
}

impl ElementData {
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for ElementData {
    fn default() -> Self {
        Self {
            name: SmolStr::default(),
            min_occurs: SmolStr::new_static(OCCURS_ONE),
            max_occurs: SmolStr::new_static(OCCURS_ONE),
            fixed: None,
            default: None,
            nillable: false,
            is_abstract: false,
            form: None,
            ty: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeData {
    pub name: SmolStr,
    pub use_: AttributeUse,
    pub fixed: Option<SmolStr>,
    pub default: Option<SmolStr>,
    pub form: Option<Form>,
    pub ty: Option<Datatype>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositorData {
    pub compositor: CompositorType,
    pub min_occurs: SmolStr,
    pub max_occurs: SmolStr,
}

impl CompositorData {
    pub fn new(compositor: CompositorType) -> Self {
        Self {
            compositor,
            min_occurs: SmolStr::new_static(OCCURS_ONE),
            max_occurs: SmolStr::new_static(OCCURS_ONE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentModelData {
    pub name: SmolStr,
    pub kind: ContentModelKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnyData {
    pub namespace: Option<SmolStr>,
    pub process_contents: Option<ProcessContents>,
    pub min_occurs: SmolStr,
    pub max_occurs: SmolStr,
}

impl Default for AnyData {
    fn default() -> Self {
        Self {
            namespace: None,
            process_contents: None,
            min_occurs: SmolStr::new_static(OCCURS_ONE),
            max_occurs: SmolStr::new_static(OCCURS_ONE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaReferenceData {
    pub kind: SchemaReferenceKind,
    pub namespace: Option<SmolStr>,
    pub location: Option<SmolStr>,
}

// ============================================================================
// KINDS
// ============================================================================

/// Kind family of an abstraction node, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindFamily {
    Document,
    Element,
    Attribute,
    Compositor,
    ContentModel,
    AnyElement,
    AnyAttribute,
    SchemaReference,
}

impl KindFamily {
    /// Scalar properties refreshed from the peer during sync.
    pub fn properties(self) -> &'static [Property] {
        match self {
            Self::Document => &[
                Property::TargetNamespace,
                Property::ElementFormDefault,
                Property::AttributeFormDefault,
                Property::Version,
            ],
            Self::Element => &[
                Property::Name,
                Property::MinOccurs,
                Property::MaxOccurs,
                Property::Fixed,
                Property::Default,
                Property::Nillable,
                Property::Abstract,
                Property::Form,
                Property::Type,
            ],
            Self::Attribute => &[
                Property::Name,
                Property::Use,
                Property::Fixed,
                Property::Default,
                Property::Form,
                Property::Type,
            ],
            Self::Compositor => &[
                Property::CompositorType,
                Property::MinOccurs,
                Property::MaxOccurs,
            ],
            Self::ContentModel => &[Property::Name],
            Self::AnyElement => &[
                Property::Namespace,
                Property::ProcessContents,
                Property::MinOccurs,
                Property::MaxOccurs,
            ],
            Self::AnyAttribute => &[Property::Namespace, Property::ProcessContents],
            Self::SchemaReference => &[Property::Namespace, Property::SchemaLocation],
        }
    }

    /// Properties a reference keeps for itself instead of delegating.
    pub fn reference_local(self) -> &'static [Property] {
        match self {
            Self::Element => &[Property::MinOccurs, Property::MaxOccurs],
            Self::Attribute => &[Property::Use],
            _ => &[],
        }
    }

    /// Whether a node of this family may hold a child of `child`'s family.
    pub fn accepts(self, child: KindFamily) -> bool {
        match self {
            Self::Document => matches!(
                child,
                Self::Element | Self::Attribute | Self::ContentModel | Self::SchemaReference
            ),
            Self::Element | Self::ContentModel => {
                matches!(child, Self::Compositor | Self::Attribute | Self::AnyAttribute)
            }
            Self::Compositor => matches!(child, Self::Element | Self::Compositor | Self::AnyElement),
            Self::Attribute | Self::AnyElement | Self::AnyAttribute | Self::SchemaReference => {
                false
            }
        }
    }
}

/// Closed sum over abstraction node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum AxiKind {
    Document(DocumentData),
    Element(ElementData),
    Attribute(AttributeData),
    Compositor(CompositorData),
    ContentModel(ContentModelData),
    AnyElement(AnyData),
    AnyAttribute(AnyData),
    SchemaReference(SchemaReferenceData),
}

fn text(value: &SmolStr) -> Option<PropertyValue> {
    Some(PropertyValue::Text(value.clone()))
}

fn opt_text(value: &Option<SmolStr>) -> Option<PropertyValue> {
    value.clone().map(PropertyValue::Text)
}

impl AxiKind {
    pub fn family(&self) -> KindFamily {
        match self {
            Self::Document(_) => KindFamily::Document,
            Self::Element(_) => KindFamily::Element,
            Self::Attribute(_) => KindFamily::Attribute,
            Self::Compositor(_) => KindFamily::Compositor,
            Self::ContentModel(_) => KindFamily::ContentModel,
            Self::AnyElement(_) => KindFamily::AnyElement,
            Self::AnyAttribute(_) => KindFamily::AnyAttribute,
            Self::SchemaReference(_) => KindFamily::SchemaReference,
        }
    }

    /// Read a property; `None` both for unset and for inapplicable properties.
    pub fn get(&self, property: Property) -> Option<PropertyValue> {
        use Property as P;
        match (self, property) {
            (Self::Document(d), P::TargetNamespace) => opt_text(&d.target_namespace),
            (Self::Document(d), P::ElementFormDefault) => {
                Some(PropertyValue::Form(d.element_form_default))
            }
            (Self::Document(d), P::AttributeFormDefault) => {
                Some(PropertyValue::Form(d.attribute_form_default))
            }
            (Self::Document(d), P::Version) => opt_text(&d.version),

            (Self::Element(e), P::Name) => text(&e.name),
            (Self::Element(e), P::MinOccurs) => text(&e.min_occurs),
            (Self::Element(e), P::MaxOccurs) => text(&e.max_occurs),
            (Self::Element(e), P::Fixed) => opt_text(&e.fixed),
            (Self::Element(e), P::Default) => opt_text(&e.default),
            (Self::Element(e), P::Nillable) => Some(PropertyValue::Bool(e.nillable)),
            (Self::Element(e), P::Abstract) => Some(PropertyValue::Bool(e.is_abstract)),
            (Self::Element(e), P::Form) => e.form.map(PropertyValue::Form),
            (Self::Element(e), P::Type) => e.ty.clone().map(PropertyValue::Type),

            (Self::Attribute(a), P::Name) => text(&a.name),
            (Self::Attribute(a), P::Use) => Some(PropertyValue::Use(a.use_)),
            (Self::Attribute(a), P::Fixed) => opt_text(&a.fixed),
            (Self::Attribute(a), P::Default) => opt_text(&a.default),
            (Self::Attribute(a), P::Form) => a.form.map(PropertyValue::Form),
            (Self::Attribute(a), P::Type) => a
                .ty
                .clone()
                .map(|dt| PropertyValue::Type(AxiType::Datatype(dt))),

            (Self::Compositor(c), P::CompositorType) => Some(PropertyValue::Compositor(c.compositor)),
            (Self::Compositor(c), P::MinOccurs) => text(&c.min_occurs),
            (Self::Compositor(c), P::MaxOccurs) => text(&c.max_occurs),

            (Self::ContentModel(c), P::Name) => text(&c.name),

            (Self::AnyElement(a) | Self::AnyAttribute(a), P::Namespace) => opt_text(&a.namespace),
            (Self::AnyElement(a) | Self::AnyAttribute(a), P::ProcessContents) => {
                a.process_contents.map(PropertyValue::ProcessContents)
            }
            (Self::AnyElement(a), P::MinOccurs) => text(&a.min_occurs),
            (Self::AnyElement(a), P::MaxOccurs) => text(&a.max_occurs),

            (Self::SchemaReference(s), P::Namespace) => opt_text(&s.namespace),
            (Self::SchemaReference(s), P::SchemaLocation) => opt_text(&s.location),

            _ => None,
        }
    }

    /// Write a property. Fails when the property does not apply to this kind
    /// or the value has the wrong shape.
    pub fn set(&mut self, property: Property, value: Option<PropertyValue>) -> Result<(), AxiError> {
        use Property as P;
        use PropertyValue as V;
        let mismatch = || AxiError::InvalidProperty {
            property: property.name(),
        };
        let occurs = |v: Option<PropertyValue>| -> Result<SmolStr, AxiError> {
            match v {
                Some(V::Text(t)) => Ok(t),
                None => Ok(SmolStr::new_static(OCCURS_ONE)),
                _ => Err(mismatch()),
            }
        };
        let opt = |v: Option<PropertyValue>| -> Result<Option<SmolStr>, AxiError> {
            match v {
                Some(V::Text(t)) => Ok(Some(t)),
                None => Ok(None),
                _ => Err(mismatch()),
            }
        };

        match (self, property) {
            (Self::Document(d), P::TargetNamespace) => d.target_namespace = opt(value)?,
            (Self::Document(d), P::ElementFormDefault) => match value {
                Some(V::Form(f)) => d.element_form_default = f,
                None => d.element_form_default = Form::default(),
                _ => return Err(mismatch()),
            },
            (Self::Document(d), P::AttributeFormDefault) => match value {
                Some(V::Form(f)) => d.attribute_form_default = f,
                None => d.attribute_form_default = Form::default(),
                _ => return Err(mismatch()),
            },
            (Self::Document(d), P::Version) => d.version = opt(value)?,

            (Self::Element(e), P::Name) => match value {
                Some(V::Text(t)) => e.name = t,
                _ => return Err(mismatch()),
            },
            (Self::Element(e), P::MinOccurs) => e.min_occurs = occurs(value)?,
            (Self::Element(e), P::MaxOccurs) => e.max_occurs = occurs(value)?,
            (Self::Element(e), P::Fixed) => e.fixed = opt(value)?,
            (Self::Element(e), P::Default) => e.default = opt(value)?,
            (Self::Element(e), P::Nillable) => match value {
                Some(V::Bool(b)) => e.nillable = b,
                None => e.nillable = false,
                _ => return Err(mismatch()),
            },
            (Self::Element(e), P::Abstract) => match value {
                Some(V::Bool(b)) => e.is_abstract = b,
                None => e.is_abstract = false,
                _ => return Err(mismatch()),
            },
            (Self::Element(e), P::Form) => match value {
                Some(V::Form(f)) => e.form = Some(f),
                None => e.form = None,
                _ => return Err(mismatch()),
            },
            (Self::Element(e), P::Type) => match value {
                Some(V::Type(t)) => e.ty = Some(t),
                None => e.ty = None,
                _ => return Err(mismatch()),
            },

            (Self::Attribute(a), P::Name) => match value {
                Some(V::Text(t)) => a.name = t,
                _ => return Err(mismatch()),
            },
            (Self::Attribute(a), P::Use) => match value {
                Some(V::Use(u)) => a.use_ = u,
                None => a.use_ = AttributeUse::default(),
                _ => return Err(mismatch()),
            },
            (Self::Attribute(a), P::Fixed) => a.fixed = opt(value)?,
            (Self::Attribute(a), P::Default) => a.default = opt(value)?,
            (Self::Attribute(a), P::Form) => match value {
                Some(V::Form(f)) => a.form = Some(f),
                None => a.form = None,
                _ => return Err(mismatch()),
            },
            (Self::Attribute(a), P::Type) => match value {
                Some(V::Type(AxiType::Datatype(dt))) => a.ty = Some(dt),
                None => a.ty = None,
                _ => return Err(mismatch()),
            },

            (Self::Compositor(c), P::CompositorType) => match value {
                Some(V::Compositor(t)) => c.compositor = t,
                _ => return Err(mismatch()),
            },
            (Self::Compositor(c), P::MinOccurs) => c.min_occurs = occurs(value)?,
            (Self::Compositor(c), P::MaxOccurs) => c.max_occurs = occurs(value)?,

            (Self::ContentModel(c), P::Name) => match value {
                Some(V::Text(t)) => c.name = t,
                _ => return Err(mismatch()),
            },

            (Self::AnyElement(a) | Self::AnyAttribute(a), P::Namespace) => a.namespace = opt(value)?,
            (Self::AnyElement(a) | Self::AnyAttribute(a), P::ProcessContents) => match value {
                Some(V::ProcessContents(p)) => a.process_contents = Some(p),
                None => a.process_contents = None,
                _ => return Err(mismatch()),
            },
            (Self::AnyElement(a), P::MinOccurs) => a.min_occurs = occurs(value)?,
            (Self::AnyElement(a), P::MaxOccurs) => a.max_occurs = occurs(value)?,

            (Self::SchemaReference(s), P::Namespace) => s.namespace = opt(value)?,
            (Self::SchemaReference(s), P::SchemaLocation) => s.location = opt(value)?,

            _ => return Err(mismatch()),
        }
        Ok(())
    }
}

// ============================================================================
// NODE
// ============================================================================

/// One slot of the abstraction arena.
#[derive(Debug, Clone)]
pub struct AxiNode {
    pub(crate) kind: AxiKind,
    pub(crate) component_type: ComponentType,
    /// Backing schema node. Proxies read their shared node's peer instead.
    pub(crate) peer: Option<SchemaRef>,
    pub(crate) parent: Option<AxiId>,
    /// `None` until first populated.
    pub(crate) children: Option<Vec<AxiId>>,
    /// Referent of a reference, or the mirrored node of a proxy.
    pub(crate) shared: Option<AxiId>,
    /// Nodes whose children this node's children mirror.
    pub(crate) mirror_sources: Vec<AxiId>,
    pub(crate) alive: bool,
}

impl AxiNode {
    pub(crate) fn new(kind: AxiKind, component_type: ComponentType, peer: Option<SchemaRef>) -> Self {
        Self {
            kind,
            component_type,
            peer,
            parent: None,
            children: None,
            shared: None,
            mirror_sources: Vec::new(),
            alive: true,
        }
    }

    pub fn kind(&self) -> &AxiKind {
        &self.kind
    }

    pub fn family(&self) -> KindFamily {
        self.kind.family()
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn parent(&self) -> Option<AxiId> {
        self.parent
    }

    pub fn shared(&self) -> Option<AxiId> {
        self.shared
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }
}
