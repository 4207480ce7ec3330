//! Schema generation: writing the tree back into schema source.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 SchemaGenerator trait                     │
//! │  - update(axi, schemas, SchemaUpdate)   incremental       │
//! │  - transform(axi, schemas, config)      whole document    │
//! └──────────────────────────────────────────────────────────┘
//!        │                                   │
//!        ▼                                   ▼
//!   update::apply                     transform::run
//!   (one unit at a time,              (snapshot → emit detached
//!    one transaction)                  globals → swap → sync)
//! ```
//!
//! Incremental updates do not depend on the design pattern: an edit is
//! written where the tree puts it. The pattern only drives `transform`.

mod emit;
mod error;
pub mod names;
mod transform;
mod update;

pub use error::GeneratorError;
pub use names::{GlobalNameRegistry, NameKind, find_unique_global_name};
pub use update::{SchemaUpdate, UpdateKind, UpdateUnit};

use crate::axi::usage::{global_elements, master_global_elements};
use crate::axi::{AxiModel, AxiType, ContentModelKind, KindFamily};
use crate::schema::{SchemaSet, SchemaState};

/// Structural conventions for organising global and local constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Every element global, every complex content a named type.
    GardenOfEden,
    /// Root elements global with named types; everything below inline.
    VenetianBlind,
    /// Every element global; all types anonymous.
    SalamiSlice,
    /// Global roots only; everything else inline.
    ///
    /// A document with several unrelated roots keeps each of them global,
    /// since no root can be inlined into another. A single-root document
    /// ends up with exactly one global element.
    RussianDoll,
    /// Keep what was global global and what was named named.
    Mixed,
}

impl Pattern {
    pub const ALL: [Pattern; 5] = [
        Pattern::GardenOfEden,
        Pattern::VenetianBlind,
        Pattern::SalamiSlice,
        Pattern::RussianDoll,
        Pattern::Mixed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::GardenOfEden => "Garden of Eden",
            Self::VenetianBlind => "Venetian Blind",
            Self::SalamiSlice => "Salami Slice",
            Self::RussianDoll => "Russian Doll",
            Self::Mixed => "Mixed",
        }
    }
}

/// Advice returned before a transform is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformHint {
    Ok,
    SameDesignPattern,
    InvalidSchema,
    NoGlobalElements,
    NoChildElements,
    WillRemoveTypes,
    WillRemoveGlobalElements,
    WillRemoveGlobalElementsAndTypes,
}

/// Options for [`SchemaGenerator::transform`].
#[derive(Debug, Clone, Default)]
pub struct TransformConfig {
    /// Operations per transaction when swapping globals. `None` applies the
    /// whole swap in a single transaction.
    pub commit_range: Option<usize>,
}

impl TransformConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commit_range(mut self, commit_range: Option<usize>) -> Self {
        self.commit_range = commit_range;
        self
    }
}

/// A schema generator for one design pattern.
pub trait SchemaGenerator {
    /// Pattern applied by `transform`; `None` keeps the current shape.
    fn pattern(&self) -> Option<Pattern>;

    /// Replay recorded edits against the schema document.
    fn update(&self, axi: &mut AxiModel, schemas: &mut SchemaSet, update: SchemaUpdate) -> Result<(), GeneratorError> {
        update::apply(axi, schemas, update)
    }

    /// Regenerate every global definition of the document.
    fn transform(&self, axi: &mut AxiModel, schemas: &mut SchemaSet, config: &TransformConfig) -> Result<(), GeneratorError> {
        transform::run(axi, schemas, self.pattern().unwrap_or(Pattern::Mixed), config)
    }
}

macro_rules! generators {
    ($($(#[$meta:meta])* $name:ident => $pattern:expr;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $name;

            impl SchemaGenerator for $name {
                fn pattern(&self) -> Option<Pattern> {
                    $pattern
                }
            }
        )*
    };
}

generators! {
    /// Used when no pattern is configured.
    DefaultGenerator => None;
    GardenOfEdenGenerator => Some(Pattern::GardenOfEden);
    VenetianBlindGenerator => Some(Pattern::VenetianBlind);
    SalamiSliceGenerator => Some(Pattern::SalamiSlice);
    RussianDollGenerator => Some(Pattern::RussianDoll);
    MixedGenerator => Some(Pattern::Mixed);
}

/// Generator for a pattern.
pub fn generator_for(pattern: Option<Pattern>) -> Box<dyn SchemaGenerator> {
    match pattern {
        None => Box::new(DefaultGenerator),
        Some(Pattern::GardenOfEden) => Box::new(GardenOfEdenGenerator),
        Some(Pattern::VenetianBlind) => Box::new(VenetianBlindGenerator),
        Some(Pattern::SalamiSlice) => Box::new(SalamiSliceGenerator),
        Some(Pattern::RussianDoll) => Box::new(RussianDollGenerator),
        Some(Pattern::Mixed) => Box::new(MixedGenerator),
    }
}

/// Number of global complex types defined by this document.
fn global_complex_types(axi: &mut AxiModel, schemas: &SchemaSet) -> usize {
    let root = axi.root();
    axi.children(schemas, root)
        .into_iter()
        .filter(|c| {
            axi.family(*c) == Some(KindFamily::ContentModel)
                && axi.content_model_kind(*c) == Some(ContentModelKind::ComplexType)
                && !axi.is_foreign(*c)
        })
        .count()
}

/// Classify the document's current structure.
pub fn infer_design_pattern(axi: &mut AxiModel, schemas: &SchemaSet) -> Option<Pattern> {
    let elements = global_elements(axi, schemas);
    if global_complex_types(axi, schemas) > 0 {
        let typed_by_global = match elements.as_slice() {
            [only] => matches!(axi.element_type(*only), Some(AxiType::ContentModel(_))),
            _ => false,
        };
        return Some(if elements.len() > 1 || typed_by_global {
            Pattern::GardenOfEden
        } else {
            Pattern::VenetianBlind
        });
    }
    match elements.len() {
        0 => None,
        1 => Some(Pattern::RussianDoll),
        _ => Some(Pattern::SalamiSlice),
    }
}

/// Pre-flight advice for transforming from `current` to `target`.
pub fn can_transform_schema(
    axi: &mut AxiModel,
    schemas: &SchemaSet,
    current: Option<Pattern>,
    target: Pattern,
) -> TransformHint {
    let well_formed = schemas
        .get(axi.schema_id())
        .is_some_and(|m| m.state() != SchemaState::NotWellFormed);
    if !well_formed {
        return TransformHint::InvalidSchema;
    }
    if current == Some(target) {
        return TransformHint::SameDesignPattern;
    }
    let elements = global_elements(axi, schemas);
    if elements.is_empty() {
        return TransformHint::NoGlobalElements;
    }
    if elements.iter().all(|e| axi.children(schemas, *e).is_empty()) {
        return TransformHint::NoChildElements;
    }

    let loses_elements = master_global_elements(axi, schemas).len() < elements.len();
    let loses_types = global_complex_types(axi, schemas) > 0;
    match target {
        Pattern::RussianDoll if loses_elements && loses_types => TransformHint::WillRemoveGlobalElementsAndTypes,
        Pattern::RussianDoll if loses_types => TransformHint::WillRemoveTypes,
        Pattern::RussianDoll | Pattern::VenetianBlind if loses_elements => TransformHint::WillRemoveGlobalElements,
        Pattern::SalamiSlice if loses_types => TransformHint::WillRemoveTypes,
        _ => TransformHint::Ok,
    }
}
