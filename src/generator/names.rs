//! Global name allocation.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::{SmolStr, format_smolstr};

use crate::schema::{SchemaKind, SchemaModel};

/// Symbol spaces of top-level definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    Element,
    ComplexType,
    SimpleType,
    Group,
    AttributeGroup,
    Attribute,
}

impl NameKind {
    pub fn schema_kind(self) -> SchemaKind {
        match self {
            Self::Element => SchemaKind::GlobalElement,
            Self::ComplexType => SchemaKind::GlobalComplexType,
            Self::SimpleType => SchemaKind::GlobalSimpleType,
            Self::Group => SchemaKind::GlobalGroup,
            Self::AttributeGroup => SchemaKind::GlobalAttributeGroup,
            Self::Attribute => SchemaKind::GlobalAttribute,
        }
    }

    /// Complex and simple types share one symbol space.
    fn space(self) -> Self {
        match self {
            Self::SimpleType => Self::ComplexType,
            other => other,
        }
    }
}

/// Names already taken in one generation run.
#[derive(Debug, Default, Clone)]
pub struct GlobalNameRegistry {
    used: FxHashMap<NameKind, FxHashSet<SmolStr>>,
}

impl GlobalNameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as taken. Returns `false` if it already was.
    pub fn reserve(&mut self, kind: NameKind, name: &str) -> bool {
        self.used
            .entry(kind.space())
            .or_default()
            .insert(SmolStr::new(name))
    }

    pub fn contains(&self, kind: NameKind, name: &str) -> bool {
        self.used
            .get(&kind.space())
            .is_some_and(|names| names.contains(name))
    }

    /// Take the first free name of `seed`, `seed1`, `seed2`, ...
    pub fn unique(&mut self, kind: NameKind, seed: &str) -> SmolStr {
        let mut candidate = SmolStr::new(seed);
        let mut count = 0usize;
        while self.contains(kind, &candidate) {
            count += 1;
            candidate = format_smolstr!("{seed}{count}");
        }
        self.reserve(kind, &candidate);
        candidate
    }
}

/// First free name for a new top-level definition of `kind` in `model`.
pub fn find_unique_global_name(model: &SchemaModel, kind: NameKind, seed: &str) -> SmolStr {
    let mut registry = GlobalNameRegistry::new();
    for node in model.globals_of(kind.schema_kind()) {
        if let Some(name) = model.name(node) {
            registry.reserve(kind, name);
        }
    }
    registry.unique(kind, seed)
}
