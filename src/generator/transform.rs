//! Whole-document regeneration under a design pattern.
//!
//! A transform ignores edit history. It proceeds in three steps:
//!
//! 1. **Snapshot** - walk the tree from the master global elements and record
//!    the shape of every element and complex content it reaches.
//! 2. **Emit** - decide per pattern which elements are global and which
//!    complex contents become named types, then build the new globals as
//!    detached schema nodes.
//! 3. **Swap** - remove every previous global element, complex type, group
//!    and attribute group and append the new ones, in one transaction or in
//!    batches of `commit_range` operations.
//!
//! The tree is then re-synchronized against the regenerated document.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::{SmolStr, format_smolstr};

use super::emit::{set_flag, set_occurs, write_datatype};
use super::error::GeneratorError;
use super::names::{GlobalNameRegistry, NameKind};
use super::{Pattern, TransformConfig};
use crate::axi::usage::{global_elements, is_structurally_equal, master_global_elements};
use crate::axi::{
    AttributeUse, AxiError, AxiKind, AxiModel, AxiType, ComponentType, CompositorType, ContentModelKind,
    Datatype, Form, KindFamily, ProcessContents,
};
use crate::base::constants::{OCCURS_ONE, attr};
use crate::base::{AxiId, SchemaNodeId};
use crate::schema::{SchemaError, SchemaKind, SchemaModel, SchemaSet, SchemaState};
use crate::sync::ModelState;

/// Kinds of top-level definitions a transform replaces.
const REPLACED_GLOBALS: [SchemaKind; 4] = [
    SchemaKind::GlobalElement,
    SchemaKind::GlobalComplexType,
    SchemaKind::GlobalGroup,
    SchemaKind::GlobalAttributeGroup,
];

pub(crate) fn run(
    axi: &mut AxiModel,
    schemas: &mut SchemaSet,
    pattern: Pattern,
    config: &TransformConfig,
) -> Result<(), GeneratorError> {
    let schema = axi.schema_id();
    if schemas.model(schema)?.state() == SchemaState::NotWellFormed {
        return Err(SchemaError::invalid("schema", "document is not well formed").into());
    }

    let snapshot = Snapshot::collect(axi, schemas)?;
    tracing::debug!(
        "[GENERATOR] transform to {pattern:?}: {} elements, {} complex contents, {} roots",
        snapshot.elements.len(),
        snapshot.bodies.len(),
        snapshot.roots.len()
    );

    let model = schemas.model_mut(schema)?;
    let auto_sync = model.is_auto_sync();
    model.set_auto_sync(false);
    let result = Emitter::new(&snapshot, pattern, model)
        .emit()
        .and_then(|ops| apply_ops(model, &ops, config.commit_range));
    model.set_auto_sync(auto_sync);
    result?;

    // The regenerated document supersedes anything not yet flushed.
    axi.take_pending_changes();
    match axi.sync(schemas) {
        ModelState::Valid => Ok(()),
        state => {
            tracing::warn!("[GENERATOR] tree left {state:?} after transform");
            Err(GeneratorError::SyncFailed)
        }
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

#[derive(Debug, Clone)]
enum Content {
    Empty,
    Simple(Datatype),
    /// A type defined by another document, kept by its raw name.
    External(SmolStr),
    /// Complex content, by index into `Snapshot::bodies`.
    Complex(usize),
}

#[derive(Debug, Clone)]
struct ElementShape {
    name: SmolStr,
    was_global: bool,
    /// Reached again while its own content was being walked.
    forced_global: bool,
    fixed: Option<SmolStr>,
    default: Option<SmolStr>,
    nillable: bool,
    is_abstract: bool,
    form: Option<Form>,
    block: Option<SmolStr>,
    final_: Option<SmolStr>,
    /// Source annotations and identity constraints, copied verbatim.
    annotations: Vec<SchemaNodeId>,
    constraints: Vec<SchemaNodeId>,
    content: Content,
}

#[derive(Debug, Clone, Default)]
struct BodyShape {
    seed: SmolStr,
    from_named: bool,
    recursive: bool,
    owners: Vec<usize>,
    compositor: Option<CompositorShape>,
    attributes: Vec<AttributeShape>,
    any_attribute: Option<AnyShape>,
}

impl BodyShape {
    fn is_simple_structure(&self) -> bool {
        self.attributes.is_empty()
            && self.any_attribute.is_none()
            && self
                .compositor
                .as_ref()
                .is_none_or(|c| c.particles.len() <= 1)
    }
}

#[derive(Debug, Clone)]
struct CompositorShape {
    kind: CompositorType,
    min: SmolStr,
    max: SmolStr,
    particles: Vec<Particle>,
}

#[derive(Debug, Clone)]
enum Particle {
    Element { index: usize, min: SmolStr, max: SmolStr },
    External { raw: SmolStr, min: SmolStr, max: SmolStr },
    Compositor(CompositorShape),
    Any(AnyShape),
}

#[derive(Debug, Clone)]
struct AttributeShape {
    name: SmolStr,
    use_: AttributeUse,
    fixed: Option<SmolStr>,
    default: Option<SmolStr>,
    form: Option<Form>,
    ty: Option<Datatype>,
    /// Raw `ref` of an attribute reference; global attributes survive.
    reference: Option<SmolStr>,
}

#[derive(Debug, Clone)]
struct AnyShape {
    namespace: Option<SmolStr>,
    process_contents: Option<ProcessContents>,
    min: SmolStr,
    max: SmolStr,
}

#[derive(Debug, Default)]
struct Snapshot {
    elements: Vec<ElementShape>,
    bodies: Vec<BodyShape>,
    roots: Vec<usize>,
    unused_types: Vec<usize>,
}

impl Snapshot {
    fn collect(axi: &mut AxiModel, schemas: &SchemaSet) -> Result<Self, GeneratorError> {
        let masters = master_global_elements(axi, schemas);
        let globals = global_elements(axi, schemas);
        let root = axi.root();
        let definitions: Vec<AxiId> = axi
            .children(schemas, root)
            .into_iter()
            .filter(|c| {
                axi.family(*c) == Some(KindFamily::ContentModel)
                    && axi.content_model_kind(*c) == Some(ContentModelKind::ComplexType)
                    && !axi.is_foreign(*c)
            })
            .collect();

        let mut collector = Collector {
            axi,
            schemas,
            snapshot: Snapshot::default(),
            element_index: FxHashMap::default(),
            body_index: FxHashMap::default(),
            open_elements: FxHashSet::default(),
            open_bodies: FxHashSet::default(),
        };
        for element in masters.into_iter().chain(globals) {
            let original = collector.axi.original(element);
            if collector.element_index.contains_key(&original) {
                continue;
            }
            let index = collector.element(element)?;
            collector.snapshot.roots.push(index);
        }
        for definition in definitions {
            if collector.body_index.contains_key(&definition) {
                continue;
            }
            let seed = SmolStr::new(collector.axi.name(definition).unwrap_or_default());
            let body = collector.body(definition, None, seed, true)?;
            collector.snapshot.unused_types.push(body);
        }
        Ok(collector.snapshot)
    }
}

struct Collector<'a> {
    axi: &'a mut AxiModel,
    schemas: &'a SchemaSet,
    snapshot: Snapshot,
    element_index: FxHashMap<AxiId, usize>,
    body_index: FxHashMap<AxiId, usize>,
    open_elements: FxHashSet<usize>,
    open_bodies: FxHashSet<usize>,
}

impl Collector<'_> {
    fn element(&mut self, id: AxiId) -> Result<usize, GeneratorError> {
        let original = self.axi.original(id);
        if let Some(&index) = self.element_index.get(&original) {
            if self.open_elements.contains(&index) {
                self.snapshot.elements[index].forced_global = true;
            }
            return Ok(index);
        }
        let Some(AxiKind::Element(data)) = self.axi.kind(original).cloned() else {
            return Err(AxiError::UnknownComponent(original).into());
        };

        let peer = self
            .axi
            .peer(original)
            .filter(|p| p.model == self.axi.schema_id());
        let mut annotations = Vec::new();
        let mut constraints = Vec::new();
        for child in peer.map(|p| self.schemas.children(p)).unwrap_or_default() {
            match self.schemas.kind(child) {
                Some(SchemaKind::Annotation) => annotations.push(child.node),
                Some(SchemaKind::Key | SchemaKind::KeyRef | SchemaKind::Unique) => constraints.push(child.node),
                _ => {}
            }
        }
        let source_attr = |name: &str| peer.and_then(|p| self.schemas.attr(p, name)).map(SmolStr::new);

        let index = self.snapshot.elements.len();
        self.snapshot.elements.push(ElementShape {
            name: data.name.clone(),
            was_global: self.axi.is_global(original),
            forced_global: false,
            fixed: data.fixed.clone(),
            default: data.default.clone(),
            nillable: data.nillable,
            is_abstract: data.is_abstract,
            form: data.form,
            block: source_attr(attr::BLOCK),
            final_: source_attr(attr::FINAL),
            annotations,
            constraints,
            content: Content::Empty,
        });
        self.element_index.insert(original, index);
        self.open_elements.insert(index);

        let seed = format_smolstr!("{}Type", data.name);
        let content = match data.ty {
            Some(AxiType::Datatype(datatype)) => Content::Simple(datatype),
            Some(AxiType::ContentModel(cm)) if self.axi.is_foreign(cm) => {
                let raw = self
                    .axi
                    .peer(original)
                    .and_then(|p| self.schemas.attr(p, attr::TYPE))
                    .or_else(|| self.axi.name(cm))
                    .unwrap_or_default();
                Content::External(SmolStr::new(raw))
            }
            Some(AxiType::ContentModel(cm)) => {
                let seed = self.axi.name(cm).map(SmolStr::new).unwrap_or(seed);
                Content::Complex(self.body(cm, Some(index), seed, true)?)
            }
            Some(AxiType::Anonymous) => Content::Complex(self.body(original, Some(index), seed, false)?),
            None if self.axi.children(self.schemas, original).is_empty() => Content::Empty,
            None => Content::Complex(self.body(original, Some(index), seed, false)?),
        };
        self.snapshot.elements[index].content = content;
        self.open_elements.remove(&index);
        Ok(index)
    }

    /// Complex content owned by an element or a complex type.
    fn body(&mut self, owner: AxiId, element: Option<usize>, seed: SmolStr, from_named: bool) -> Result<usize, GeneratorError> {
        if let Some(&index) = self.body_index.get(&owner) {
            let body = &mut self.snapshot.bodies[index];
            if self.open_bodies.contains(&index) {
                body.recursive = true;
            }
            if let Some(element) = element.filter(|e| !body.owners.contains(e)) {
                body.owners.push(element);
            }
            return Ok(index);
        }

        let index = self.snapshot.bodies.len();
        self.snapshot.bodies.push(BodyShape {
            seed,
            from_named,
            owners: element.into_iter().collect(),
            ..BodyShape::default()
        });
        self.body_index.insert(owner, index);
        self.open_bodies.insert(index);

        let mut compositors = Vec::new();
        let mut attributes = Vec::new();
        let mut any_attribute = None;
        for child in self.axi.children(self.schemas, owner) {
            match self.axi.family(child) {
                Some(KindFamily::Compositor) => compositors.push(self.compositor(child)?),
                Some(KindFamily::Attribute) => attributes.push(self.attribute(child)),
                Some(KindFamily::AnyAttribute) => any_attribute = Some(self.any(child)),
                family => tracing::trace!("[GENERATOR] {family:?} {child} has no place in complex content"),
            }
        }
        let compositor = if compositors.len() > 1 {
            Some(CompositorShape {
                kind: CompositorType::Sequence,
                min: SmolStr::new(OCCURS_ONE),
                max: SmolStr::new(OCCURS_ONE),
                particles: compositors.into_iter().map(Particle::Compositor).collect(),
            })
        } else {
            compositors.pop()
        };

        let body = &mut self.snapshot.bodies[index];
        body.compositor = compositor;
        body.attributes = attributes;
        body.any_attribute = any_attribute;
        self.open_bodies.remove(&index);
        Ok(index)
    }

    fn occurs(&self, id: AxiId) -> (SmolStr, SmolStr) {
        (
            SmolStr::new(self.axi.min_occurs(id).unwrap_or(OCCURS_ONE)),
            SmolStr::new(self.axi.max_occurs(id).unwrap_or(OCCURS_ONE)),
        )
    }

    fn compositor(&mut self, id: AxiId) -> Result<CompositorShape, GeneratorError> {
        let kind = self
            .axi
            .compositor_type(id)
            .unwrap_or(CompositorType::Sequence);
        let (min, max) = self.occurs(id);
        let mut particles = Vec::new();
        for child in self.axi.children(self.schemas, id) {
            let particle = match self.axi.family(child) {
                Some(KindFamily::Element) if self.axi.is_foreign(child) && self.axi.is_global(child) => {
                    let (min, max) = self.occurs(child);
                    let raw = self
                        .axi
                        .peer(self.axi.unproxied(child))
                        .and_then(|p| self.schemas.attr(p, attr::REF))
                        .or_else(|| self.axi.name(child))
                        .unwrap_or_default();
                    Particle::External { raw: SmolStr::new(raw), min, max }
                }
                Some(KindFamily::Element) => {
                    let (min, max) = self.occurs(child);
                    let index = self.element(child)?;
                    Particle::Element { index, min, max }
                }
                Some(KindFamily::Compositor) => Particle::Compositor(self.compositor(child)?),
                Some(KindFamily::AnyElement) => Particle::Any(self.any(child)),
                _ => continue,
            };
            particles.push(particle);
        }
        Ok(CompositorShape { kind, min, max, particles })
    }

    fn attribute(&self, id: AxiId) -> AttributeShape {
        let target = self.axi.unproxied(id);
        let use_ = match self.axi.kind(target) {
            Some(AxiKind::Attribute(a)) => a.use_,
            _ => AttributeUse::default(),
        };
        let reference = (self.axi.component_type(target) == Some(ComponentType::Reference)).then(|| {
            let raw = self
                .axi
                .peer(target)
                .and_then(|p| self.schemas.attr(p, attr::REF))
                .or_else(|| self.axi.name(target))
                .unwrap_or_default();
            SmolStr::new(raw)
        });
        match self.axi.kind(self.axi.original(id)) {
            Some(AxiKind::Attribute(a)) => AttributeShape {
                name: a.name.clone(),
                use_,
                fixed: a.fixed.clone(),
                default: a.default.clone(),
                form: a.form,
                ty: a.ty.clone(),
                reference,
            },
            _ => AttributeShape {
                name: SmolStr::default(),
                use_,
                fixed: None,
                default: None,
                form: None,
                ty: None,
                reference,
            },
        }
    }

    fn any(&self, id: AxiId) -> AnyShape {
        match self.axi.kind(self.axi.original(id)) {
            Some(AxiKind::AnyElement(a) | AxiKind::AnyAttribute(a)) => AnyShape {
                namespace: a.namespace.clone(),
                process_contents: a.process_contents,
                min: a.min_occurs.clone(),
                max: a.max_occurs.clone(),
            },
            _ => AnyShape {
                namespace: None,
                process_contents: None,
                min: SmolStr::new(OCCURS_ONE),
                max: SmolStr::new(OCCURS_ONE),
            },
        }
    }
}

// ============================================================================
// EMISSION
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Op {
    Remove(SchemaNodeId),
    Append(SchemaNodeId),
}

struct Emitter<'a> {
    snapshot: &'a Snapshot,
    pattern: Pattern,
    model: &'a mut SchemaModel,
    registry: GlobalNameRegistry,
    global: Vec<bool>,
    element_names: Vec<Option<SmolStr>>,
    type_names: Vec<Option<SmolStr>>,
}

impl<'a> Emitter<'a> {
    fn new(snapshot: &'a Snapshot, pattern: Pattern, model: &'a mut SchemaModel) -> Self {
        let roots: FxHashSet<usize> = snapshot.roots.iter().copied().collect();
        let global = snapshot
            .elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                element.forced_global
                    || roots.contains(&index)
                    || match pattern {
                        Pattern::GardenOfEden | Pattern::SalamiSlice => true,
                        Pattern::VenetianBlind | Pattern::RussianDoll => false,
                        Pattern::Mixed => element.was_global,
                    }
            })
            .collect();

        let mut registry = GlobalNameRegistry::new();
        for simple_type in model.globals_of(SchemaKind::GlobalSimpleType) {
            if let Some(name) = model.name(simple_type) {
                registry.reserve(NameKind::SimpleType, name);
            }
        }

        Self {
            snapshot,
            pattern,
            model,
            registry,
            global,
            element_names: vec![None; snapshot.elements.len()],
            type_names: vec![None; snapshot.bodies.len()],
        }
    }

    fn is_named(&self, body: usize) -> bool {
        let shape = &self.snapshot.bodies[body];
        if shape.recursive {
            return true;
        }
        match self.pattern {
            Pattern::GardenOfEden => true,
            Pattern::VenetianBlind => shape.owners.iter().any(|o| self.global[*o]),
            Pattern::SalamiSlice | Pattern::RussianDoll => false,
            Pattern::Mixed => shape.from_named,
        }
    }

    fn emit(mut self) -> Result<Vec<Op>, GeneratorError> {
        let unused: FxHashSet<usize> = self.snapshot.unused_types.iter().copied().collect();
        let keeps_unused = matches!(self.pattern, Pattern::GardenOfEden | Pattern::Mixed);

        for (index, element) in self.snapshot.elements.iter().enumerate() {
            if self.global[index] {
                self.element_names[index] = Some(self.registry.unique(NameKind::Element, &element.name));
            }
        }
        for (index, body) in self.snapshot.bodies.iter().enumerate() {
            if (keeps_unused || !unused.contains(&index)) && self.is_named(index) {
                self.type_names[index] = Some(self.registry.unique(NameKind::ComplexType, &body.seed));
            }
        }

        let mut types = Vec::new();
        let mut reusable: Vec<(usize, SchemaNodeId)> = Vec::new();
        for index in 0..self.snapshot.bodies.len() {
            let Some(name) = self.type_names[index].clone() else {
                continue;
            };
            let node = self
                .model
                .create_with(SchemaKind::GlobalComplexType, &[(attr::NAME, name.as_str())]);
            self.write_body(node, index)?;

            let body = &self.snapshot.bodies[index];
            if self.pattern == Pattern::GardenOfEden && body.is_simple_structure() {
                let twin = reusable.iter().find(|(other, node_b)| {
                    self.snapshot.bodies[*other].seed == body.seed && same_content(self.model, node, *node_b)
                });
                if let Some(&(other, _)) = twin {
                    tracing::trace!("[GENERATOR] reusing type for {}", body.seed);
                    self.type_names[index] = self.type_names[other].clone();
                    self.model.remove(node)?;
                    continue;
                }
                reusable.push((index, node));
            }
            types.push(node);
        }

        let mut elements = Vec::new();
        for index in 0..self.snapshot.elements.len() {
            let Some(name) = self.element_names[index].clone() else {
                continue;
            };
            let element = &self.snapshot.elements[index];
            let node = self
                .model
                .create_with(SchemaKind::GlobalElement, &[(attr::NAME, name.as_str())]);
            set_flag(self.model, node, attr::ABSTRACT, element.is_abstract)?;
            self.model.set_attr(node, attr::FINAL, element.final_.as_deref())?;
            self.write_element(node, index)?;
            elements.push(node);
        }

        let root = self.model.root();
        let stale = self
            .model
            .children(root)
            .iter()
            .copied()
            .filter(|c| self.model.kind(*c).is_some_and(|k| REPLACED_GLOBALS.contains(&k)));
        Ok(stale
            .map(Op::Remove)
            .chain(elements.into_iter().chain(types).map(Op::Append))
            .collect())
    }

    /// Everything a global or local declaration shares: `block`, value
    /// constraints, content, and the copied annotations and identity
    /// constraints around it.
    fn write_element(&mut self, node: SchemaNodeId, element: usize) -> Result<(), SchemaError> {
        let snapshot = self.snapshot;
        let shape = &snapshot.elements[element];
        self.model.set_attr(node, attr::BLOCK, shape.block.as_deref())?;
        self.copy_children(node, &shape.annotations)?;
        self.write_value_constraints(node, element)?;
        self.write_content(node, element)?;
        self.copy_children(node, &shape.constraints)
    }

    fn copy_children(&mut self, node: SchemaNodeId, sources: &[SchemaNodeId]) -> Result<(), SchemaError> {
        for source in sources {
            let copy = self.model.deep_copy(*source)?;
            self.model.add_child(node, copy, None)?;
        }
        Ok(())
    }

    fn write_value_constraints(&mut self, node: SchemaNodeId, element: usize) -> Result<(), SchemaError> {
        let snapshot = self.snapshot;
        let shape = &snapshot.elements[element];
        self.model.set_attr(node, attr::FIXED, shape.fixed.as_deref())?;
        self.model.set_attr(node, attr::DEFAULT, shape.default.as_deref())?;
        set_flag(self.model, node, attr::NILLABLE, shape.nillable)
    }

    fn write_content(&mut self, node: SchemaNodeId, element: usize) -> Result<(), SchemaError> {
        let snapshot = self.snapshot;
        match &snapshot.elements[element].content {
            Content::Empty => Ok(()),
            Content::Simple(datatype) => write_datatype(self.model, node, datatype),
            Content::External(raw) => self.model.set_attr(node, attr::TYPE, Some(raw.as_str())),
            Content::Complex(body) => match self.type_names[*body].clone() {
                Some(name) => {
                    let qualified = self.model.qualify(&name);
                    self.model.set_attr(node, attr::TYPE, Some(&qualified))
                }
                None => {
                    let complex_type = self.model.create(SchemaKind::LocalComplexType);
                    self.write_body(complex_type, *body)?;
                    self.model.add_child(node, complex_type, None)
                }
            },
        }
    }

    fn write_body(&mut self, container: SchemaNodeId, body: usize) -> Result<(), SchemaError> {
        let snapshot = self.snapshot;
        let shape = &snapshot.bodies[body];
        if let Some(compositor) = &shape.compositor {
            let node = self.build_compositor(compositor)?;
            self.model.add_child(container, node, None)?;
        }
        for attribute in &shape.attributes {
            let node = self.build_attribute(attribute)?;
            self.model.add_child(container, node, None)?;
        }
        if let Some(any) = &shape.any_attribute {
            let node = self.build_any(SchemaKind::AnyAttribute, any)?;
            self.model.add_child(container, node, None)?;
        }
        Ok(())
    }

    fn build_compositor(&mut self, shape: &CompositorShape) -> Result<SchemaNodeId, SchemaError> {
        let node = self.model.create(shape.kind.schema_kind());
        set_occurs(self.model, node, attr::MIN_OCCURS, Some(shape.min.as_str()))?;
        set_occurs(self.model, node, attr::MAX_OCCURS, Some(shape.max.as_str()))?;
        for particle in &shape.particles {
            let child = match particle {
                Particle::Element { index, min, max } => self.build_particle(*index, min, max)?,
                Particle::External { raw, min, max } => {
                    let reference = self
                        .model
                        .create_with(SchemaKind::ElementReference, &[(attr::REF, raw.as_str())]);
                    set_occurs(self.model, reference, attr::MIN_OCCURS, Some(min.as_str()))?;
                    set_occurs(self.model, reference, attr::MAX_OCCURS, Some(max.as_str()))?;
                    reference
                }
                Particle::Compositor(nested) => self.build_compositor(nested)?,
                Particle::Any(any) => self.build_any(SchemaKind::AnyElement, any)?,
            };
            self.model.add_child(node, child, None)?;
        }
        Ok(node)
    }

    /// An element occurrence: a reference to a global, or an inline local.
    fn build_particle(&mut self, index: usize, min: &str, max: &str) -> Result<SchemaNodeId, SchemaError> {
        let node = match self.element_names[index].clone() {
            Some(name) => {
                let qualified = self.model.qualify(&name);
                self.model
                    .create_with(SchemaKind::ElementReference, &[(attr::REF, qualified.as_str())])
            }
            None => {
                let snapshot = self.snapshot;
                let shape = &snapshot.elements[index];
                let node = self
                    .model
                    .create_with(SchemaKind::LocalElement, &[(attr::NAME, shape.name.as_str())]);
                self.model.set_attr(node, attr::FORM, shape.form.map(Form::as_str))?;
                self.write_element(node, index)?;
                node
            }
        };
        set_occurs(self.model, node, attr::MIN_OCCURS, Some(min))?;
        set_occurs(self.model, node, attr::MAX_OCCURS, Some(max))?;
        Ok(node)
    }

    fn build_attribute(&mut self, shape: &AttributeShape) -> Result<SchemaNodeId, SchemaError> {
        let use_ = (shape.use_ != AttributeUse::Optional).then(|| shape.use_.as_str());
        if let Some(raw) = &shape.reference {
            let node = self
                .model
                .create_with(SchemaKind::AttributeReference, &[(attr::REF, raw.as_str())]);
            self.model.set_attr(node, attr::USE, use_)?;
            return Ok(node);
        }
        let node = self
            .model
            .create_with(SchemaKind::LocalAttribute, &[(attr::NAME, shape.name.as_str())]);
        self.model.set_attr(node, attr::USE, use_)?;
        self.model.set_attr(node, attr::FORM, shape.form.map(Form::as_str))?;
        self.model.set_attr(node, attr::FIXED, shape.fixed.as_deref())?;
        self.model.set_attr(node, attr::DEFAULT, shape.default.as_deref())?;
        if let Some(datatype) = &shape.ty {
            write_datatype(self.model, node, datatype)?;
        }
        Ok(node)
    }

    fn build_any(&mut self, kind: SchemaKind, shape: &AnyShape) -> Result<SchemaNodeId, SchemaError> {
        let node = self.model.create(kind);
        self.model.set_attr(node, attr::NAMESPACE, shape.namespace.as_deref())?;
        self.model
            .set_attr(node, attr::PROCESS_CONTENTS, shape.process_contents.map(ProcessContents::as_str))?;
        if kind == SchemaKind::AnyElement {
            set_occurs(self.model, node, attr::MIN_OCCURS, Some(shape.min.as_str()))?;
            set_occurs(self.model, node, attr::MAX_OCCURS, Some(shape.max.as_str()))?;
        }
        Ok(node)
    }
}

/// Two definitions with the same content, names aside.
fn same_content(model: &SchemaModel, a: SchemaNodeId, b: SchemaNodeId) -> bool {
    let (left, right) = (model.children(a), model.children(b));
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(x, y)| is_structurally_equal(model, *x, *y))
}

fn apply_ops(model: &mut SchemaModel, ops: &[Op], commit_range: Option<usize>) -> Result<(), GeneratorError> {
    let root = model.root();
    let batch = commit_range.unwrap_or(ops.len()).max(1);
    for (number, chunk) in ops.chunks(batch).enumerate() {
        model.transact(|m| {
            chunk.iter().try_for_each(|op| match *op {
                Op::Remove(node) => m.remove(node),
                Op::Append(node) => m.add_child(root, node, None),
            })
        })?;
        tracing::trace!("[GENERATOR] committed batch {number} ({} operations)", chunk.len());
    }
    Ok(())
}
