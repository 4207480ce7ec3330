//! Closed enumeration of XML Schema constructs.

/// Constraining facets of a simple-type restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetKind {
    Length,
    MinLength,
    MaxLength,
    Pattern,
    Enumeration,
    WhiteSpace,
    MaxInclusive,
    MaxExclusive,
    MinInclusive,
    MinExclusive,
    TotalDigits,
    FractionDigits,
}

impl FacetKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::MinLength => "minLength",
            Self::MaxLength => "maxLength",
            Self::Pattern => "pattern",
            Self::Enumeration => "enumeration",
            Self::WhiteSpace => "whiteSpace",
            Self::MaxInclusive => "maxInclusive",
            Self::MaxExclusive => "maxExclusive",
            Self::MinInclusive => "minInclusive",
            Self::MinExclusive => "minExclusive",
            Self::TotalDigits => "totalDigits",
            Self::FractionDigits => "fractionDigits",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "length" => Self::Length,
            "minLength" => Self::MinLength,
            "maxLength" => Self::MaxLength,
            "pattern" => Self::Pattern,
            "enumeration" => Self::Enumeration,
            "whiteSpace" => Self::WhiteSpace,
            "maxInclusive" => Self::MaxInclusive,
            "maxExclusive" => Self::MaxExclusive,
            "minInclusive" => Self::MinInclusive,
            "minExclusive" => Self::MinExclusive,
            "totalDigits" => Self::TotalDigits,
            "fractionDigits" => Self::FractionDigits,
            _ => return None,
        })
    }
}

/// The concrete kind of a schema node.
///
/// Global and local variants of the same XML tag are distinct kinds, as are
/// the reference forms (`<element ref="..."/>`), because the abstraction
/// treats them differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Schema,
    Import,
    Include,
    Redefine,

    GlobalElement,
    LocalElement,
    ElementReference,

    GlobalAttribute,
    LocalAttribute,
    AttributeReference,

    GlobalComplexType,
    LocalComplexType,
    GlobalSimpleType,
    LocalSimpleType,

    GlobalGroup,
    GroupReference,
    GlobalAttributeGroup,
    AttributeGroupReference,

    Sequence,
    Choice,
    All,

    ComplexContent,
    SimpleContent,
    /// `<extension>` inside complex or simple content.
    Extension,
    /// `<restriction>` inside complex or simple content.
    Restriction,

    /// `<restriction>` inside a simple type.
    SimpleRestriction,
    List,
    Union,
    Facet(FacetKind),

    AnyElement,
    AnyAttribute,

    Annotation,
    Documentation,
    AppInfo,

    Key,
    KeyRef,
    Unique,
    Selector,
    Field,

    Notation,
}

impl SchemaKind {
    /// Local XML tag name of this construct.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Import => "import",
            Self::Include => "include",
            Self::Redefine => "redefine",
            Self::GlobalElement | Self::LocalElement | Self::ElementReference => "element",
            Self::GlobalAttribute | Self::LocalAttribute | Self::AttributeReference => "attribute",
            Self::GlobalComplexType | Self::LocalComplexType => "complexType",
            Self::GlobalSimpleType | Self::LocalSimpleType => "simpleType",
            Self::GlobalGroup | Self::GroupReference => "group",
            Self::GlobalAttributeGroup | Self::AttributeGroupReference => "attributeGroup",
            Self::Sequence => "sequence",
            Self::Choice => "choice",
            Self::All => "all",
            Self::ComplexContent => "complexContent",
            Self::SimpleContent => "simpleContent",
            Self::Extension => "extension",
            Self::Restriction | Self::SimpleRestriction => "restriction",
            Self::List => "list",
            Self::Union => "union",
            Self::Facet(facet) => facet.tag(),
            Self::AnyElement => "any",
            Self::AnyAttribute => "anyAttribute",
            Self::Annotation => "annotation",
            Self::Documentation => "documentation",
            Self::AppInfo => "appinfo",
            Self::Key => "key",
            Self::KeyRef => "keyref",
            Self::Unique => "unique",
            Self::Selector => "selector",
            Self::Field => "field",
            Self::Notation => "notation",
        }
    }

    /// Classify an XML tag given its parent's kind.
    ///
    /// `has_ref` tells whether the node carries a `ref` attribute, which
    /// turns elements, attributes and groups into their reference forms.
    pub fn from_tag(tag: &str, parent: Option<SchemaKind>, has_ref: bool) -> Option<Self> {
        let top_level = matches!(parent, Some(Self::Schema) | Some(Self::Redefine));
        Some(match tag {
            "schema" => Self::Schema,
            "import" => Self::Import,
            "include" => Self::Include,
            "redefine" => Self::Redefine,
            "element" if top_level => Self::GlobalElement,
            "element" if has_ref => Self::ElementReference,
            "element" => Self::LocalElement,
            "attribute" if top_level => Self::GlobalAttribute,
            "attribute" if has_ref => Self::AttributeReference,
            "attribute" => Self::LocalAttribute,
            "complexType" if top_level => Self::GlobalComplexType,
            "complexType" => Self::LocalComplexType,
            "simpleType" if top_level => Self::GlobalSimpleType,
            "simpleType" => Self::LocalSimpleType,
            "group" if top_level => Self::GlobalGroup,
            "group" => Self::GroupReference,
            "attributeGroup" if top_level => Self::GlobalAttributeGroup,
            "attributeGroup" => Self::AttributeGroupReference,
            "sequence" => Self::Sequence,
            "choice" => Self::Choice,
            "all" => Self::All,
            "complexContent" => Self::ComplexContent,
            "simpleContent" => Self::SimpleContent,
            "extension" => Self::Extension,
            "restriction" => match parent {
                Some(Self::GlobalSimpleType) | Some(Self::LocalSimpleType) => {
                    Self::SimpleRestriction
                }
                _ => Self::Restriction,
            },
            "list" => Self::List,
            "union" => Self::Union,
            "any" => Self::AnyElement,
            "anyAttribute" => Self::AnyAttribute,
            "annotation" => Self::Annotation,
            "documentation" => Self::Documentation,
            "appinfo" => Self::AppInfo,
            "key" => Self::Key,
            "keyref" => Self::KeyRef,
            "unique" => Self::Unique,
            "selector" => Self::Selector,
            "field" => Self::Field,
            "notation" => Self::Notation,
            other => Self::Facet(FacetKind::from_tag(other)?),
        })
    }

    // ── Classification ──────────────────────────────────────────────

    /// Top-level named definitions.
    pub fn is_global(self) -> bool {
        matches!(
            self,
            Self::GlobalElement
                | Self::GlobalAttribute
                | Self::GlobalComplexType
                | Self::GlobalSimpleType
                | Self::GlobalGroup
                | Self::GlobalAttributeGroup
                | Self::Notation
        )
    }

    pub fn is_element(self) -> bool {
        matches!(
            self,
            Self::GlobalElement | Self::LocalElement | Self::ElementReference
        )
    }

    pub fn is_attribute(self) -> bool {
        matches!(
            self,
            Self::GlobalAttribute | Self::LocalAttribute | Self::AttributeReference
        )
    }

    pub fn is_compositor(self) -> bool {
        matches!(self, Self::Sequence | Self::Choice | Self::All)
    }

    pub fn is_simple_type(self) -> bool {
        matches!(self, Self::GlobalSimpleType | Self::LocalSimpleType)
    }

    pub fn is_schema_reference(self) -> bool {
        matches!(self, Self::Import | Self::Include | Self::Redefine)
    }

    /// Structural wrappers between a definition and its content.
    pub fn is_wrapper(self) -> bool {
        matches!(
            self,
            Self::LocalComplexType
                | Self::ComplexContent
                | Self::SimpleContent
                | Self::Extension
                | Self::Restriction
                | Self::Sequence
                | Self::Choice
                | Self::All
        )
    }
}
