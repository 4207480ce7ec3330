//! Value-type descriptors derived from XML Schema simple types.
//!
//! A [`Datatype`] records the primitive a simple type ultimately derives from,
//! the facets accumulated along its restriction chain, and whether it is a
//! list or a union. Named restrictions flatten into the derived type, so two
//! structurally identical anonymous types compare equal.

use smol_str::SmolStr;

use crate::base::SchemaRef;
use crate::base::constants::attr;
use crate::schema::{FacetKind, SchemaKind, SchemaSet, TypeTarget};

/// Maximum restriction/list nesting followed before giving up.
const MAX_DERIVATION_DEPTH: usize = 32;

/// The nineteen XML Schema primitives plus `anySimpleType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Boolean,
    Decimal,
    Float,
    Double,
    Duration,
    DateTime,
    Time,
    Date,
    GYearMonth,
    GYear,
    GMonthDay,
    GDay,
    GMonth,
    HexBinary,
    Base64Binary,
    AnyUri,
    QName,
    Notation,
    AnySimpleType,
}

impl Primitive {
    /// Primitive behind a built-in type name, including derived built-ins.
    pub fn of_builtin(local: &str) -> Option<Self> {
        Some(match local {
            "string" | "normalizedString" | "token" | "language" | "Name" | "NCName"
            | "NMTOKEN" | "NMTOKENS" | "ID" | "IDREF" | "IDREFS" | "ENTITY" | "ENTITIES" => {
                Self::String
            }
            "boolean" => Self::Boolean,
            "decimal" | "integer" | "nonPositiveInteger" | "negativeInteger" | "long" | "int"
            | "short" | "byte" | "nonNegativeInteger" | "unsignedLong" | "unsignedInt"
            | "unsignedShort" | "unsignedByte" | "positiveInteger" => Self::Decimal,
            "float" => Self::Float,
            "double" => Self::Double,
            "duration" => Self::Duration,
            "dateTime" => Self::DateTime,
            "time" => Self::Time,
            "date" => Self::Date,
            "gYearMonth" => Self::GYearMonth,
            "gYear" => Self::GYear,
            "gMonthDay" => Self::GMonthDay,
            "gDay" => Self::GDay,
            "gMonth" => Self::GMonth,
            "hexBinary" => Self::HexBinary,
            "base64Binary" => Self::Base64Binary,
            "anyURI" => Self::AnyUri,
            "QName" => Self::QName,
            "NOTATION" => Self::Notation,
            "anySimpleType" | "anyType" => Self::AnySimpleType,
            _ => return None,
        })
    }
}

/// One constraining facet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Facet {
    pub kind: FacetKind,
    pub value: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Variety {
    Atomic,
    List(Box<Datatype>),
    Union(Vec<Datatype>),
}

/// A simple-type descriptor attached to elements and attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Datatype {
    name: Option<SmolStr>,
    base: SmolStr,
    primitive: Primitive,
    facets: Vec<Facet>,
    variety: Variety,
    builtin: bool,
}

impl Datatype {
    /// A built-in type by local name (`string`, `int`, ...).
    pub fn builtin(local: &str) -> Self {
        Self {
            name: Some(SmolStr::new(local)),
            base: SmolStr::new(local),
            primitive: Primitive::of_builtin(local).unwrap_or(Primitive::AnySimpleType),
            facets: Vec::new(),
            variety: Variety::Atomic,
            builtin: true,
        }
    }

    /// An anonymous restriction of a built-in type.
    pub fn restriction_of(base: &str) -> Self {
        Self {
            name: None,
            builtin: false,
            ..Self::builtin(base)
        }
    }

    pub fn with_facet(mut self, kind: FacetKind, value: impl Into<SmolStr>) -> Self {
        self.facets.push(Facet {
            kind,
            value: value.into(),
        });
        self
    }

    pub fn with_name(mut self, name: impl Into<SmolStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Type name: the built-in's local name or the global simple type's name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Built-in type this one restricts (itself for built-ins).
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    pub fn variety(&self) -> &Variety {
        &self.variety
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }

    /// The same type with its name dropped, used to compare structure.
    pub fn anonymized(&self) -> Self {
        Self {
            name: None,
            ..self.clone()
        }
    }
}

/// Builds [`Datatype`]s from simple-type nodes and type references.
pub struct DatatypeBuilder<'a> {
    schemas: &'a SchemaSet,
}

impl<'a> DatatypeBuilder<'a> {
    pub fn new(schemas: &'a SchemaSet) -> Self {
        Self { schemas }
    }

    /// Resolve a `type`/`base`/`itemType` value seen from `at`.
    ///
    /// Returns `None` for complex types and unresolved names.
    pub fn from_type_name(&self, at: SchemaRef, raw: &str) -> Option<Datatype> {
        self.from_type_name_at(at, raw, 0)
    }

    /// Describe a global or local simple-type node.
    pub fn from_simple_type(&self, simple_type: SchemaRef) -> Datatype {
        self.simple_type_at(simple_type, 0)
    }

    fn from_type_name_at(&self, at: SchemaRef, raw: &str, depth: usize) -> Option<Datatype> {
        match self.schemas.resolve_type(at, raw) {
            TypeTarget::Builtin(local) => Some(Datatype::builtin(&local)),
            TypeTarget::Simple(st) => Some(self.simple_type_at(st, depth + 1)),
            TypeTarget::Complex(_) | TypeTarget::Unresolved => None,
        }
    }

    fn inline_simple_type(&self, node: SchemaRef) -> Option<SchemaRef> {
        self.schemas
            .children(node)
            .into_iter()
            .find(|c| self.schemas.kind(*c) == Some(SchemaKind::LocalSimpleType))
    }

    fn simple_type_at(&self, simple_type: SchemaRef, depth: usize) -> Datatype {
        if depth > MAX_DERIVATION_DEPTH {
            tracing::warn!("[DATATYPE] derivation of {simple_type} exceeds depth limit");
            return Datatype::builtin("anySimpleType");
        }

        let name = match self.schemas.kind(simple_type) {
            Some(SchemaKind::GlobalSimpleType) => self.schemas.name(simple_type).map(SmolStr::new),
            _ => None,
        };

        let mut result = None;
        for child in self.schemas.children(simple_type) {
            match self.schemas.kind(child) {
                Some(SchemaKind::SimpleRestriction) => {
                    result = Some(self.restriction(child, depth));
                }
                Some(SchemaKind::List) => {
                    let item = self
                        .schemas
                        .attr(child, attr::ITEM_TYPE)
                        .and_then(|raw| self.from_type_name_at(child, raw, depth))
                        .or_else(|| {
                            self.inline_simple_type(child)
                                .map(|st| self.simple_type_at(st, depth + 1))
                        })
                        .unwrap_or_else(|| Datatype::builtin("anySimpleType"));
                    result = Some(Datatype {
                        variety: Variety::List(Box::new(item)),
                        ..Datatype::restriction_of("anySimpleType")
                    });
                }
                Some(SchemaKind::Union) => {
                    let mut members: Vec<Datatype> = self
                        .schemas
                        .attr(child, attr::MEMBER_TYPES)
                        .map(|raw| {
                            raw.split_whitespace()
                                .filter_map(|m| self.from_type_name_at(child, m, depth))
                                .collect()
                        })
                        .unwrap_or_default();
                    for inline in self.schemas.children(child) {
                        if self.schemas.kind(inline) == Some(SchemaKind::LocalSimpleType) {
                            members.push(self.simple_type_at(inline, depth + 1));
                        }
                    }
                    result = Some(Datatype {
                        variety: Variety::Union(members),
                        ..Datatype::restriction_of("anySimpleType")
                    });
                }
                _ => {}
            }
        }

        let mut datatype = result.unwrap_or_else(|| Datatype::restriction_of("anySimpleType"));
        datatype.name = name;
        datatype.builtin = false;
        datatype
    }

    fn restriction(&self, restriction: SchemaRef, depth: usize) -> Datatype {
        let base = self
            .schemas
            .attr(restriction, attr::BASE)
            .and_then(|raw| self.from_type_name_at(restriction, raw, depth))
            .or_else(|| {
                self.inline_simple_type(restriction)
                    .map(|st| self.simple_type_at(st, depth + 1))
            })
            .unwrap_or_else(|| Datatype::builtin("anySimpleType"));

        let mut derived = Datatype {
            name: None,
            builtin: false,
            ..base
        };
        for child in self.schemas.children(restriction) {
            if let Some(SchemaKind::Facet(kind)) = self.schemas.kind(child) {
                let value = self.schemas.attr(child, attr::VALUE).unwrap_or_default();
                derived.facets.push(Facet {
                    kind,
                    value: SmolStr::new(value),
                });
            }
        }
        derived
    }
}
