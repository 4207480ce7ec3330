//! Usage map and the generator's structural helpers.
//!
//! A [`UsageMap`] records, for each global element of the document, which
//! shared definitions its content uses (through references, named types,
//! groups and attribute groups), and the inverse. It is rebuilt per query.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use super::component::{AxiType, ComponentType, KindFamily};
use super::model::AxiModel;
use crate::base::constants::IDENTITY_ATTRIBUTES;
use crate::base::{AxiId, SchemaNodeId};
use crate::schema::{SchemaModel, SchemaSet};

/// Who uses which shared definition.
#[derive(Debug, Default, Clone)]
pub struct UsageMap {
    /// Shared definition → global elements whose content uses it.
    used_by: IndexMap<AxiId, Vec<AxiId>>,
    /// Global element → shared definitions its content uses.
    uses: IndexMap<AxiId, Vec<AxiId>>,
}

impl UsageMap {
    /// Walk the content of every global element of the document.
    pub fn build(model: &mut AxiModel, schemas: &SchemaSet) -> Self {
        let mut map = Self::default();
        for root in global_elements(model, schemas) {
            map.uses.entry(root).or_default();
            map.used_by.entry(root).or_default();
            let mut seen = FxHashSet::default();
            map.walk(model, schemas, root, root, &mut seen);
        }
        map
    }

    fn walk(
        &mut self,
        model: &mut AxiModel,
        schemas: &SchemaSet,
        root: AxiId,
        id: AxiId,
        seen: &mut FxHashSet<AxiId>,
    ) {
        let target = model.unproxied(id);
        if id != root && model.component_type(target) == Some(ComponentType::Reference) {
            if let Some(referent) = model.referent(target) {
                self.record(root, referent);
            }
            return;
        }
        if !seen.insert(model.original(id)) {
            return;
        }
        if let Some(AxiType::ContentModel(cm)) = model.element_type(id).cloned() {
            self.record(root, cm);
        }
        let children = model.children(schemas, id);
        let sources = model
            .node(id)
            .map(|n| n.mirror_sources.clone())
            .unwrap_or_default();
        for source in sources {
            if model.family(source) == Some(KindFamily::ContentModel) {
                self.record(root, source);
            }
        }
        for child in children {
            self.walk(model, schemas, root, child, seen);
        }
    }

    fn record(&mut self, user: AxiId, used: AxiId) {
        let users = self.used_by.entry(used).or_default();
        if !users.contains(&user) {
            users.push(user);
        }
        let uses = self.uses.entry(user).or_default();
        if !uses.contains(&used) {
            uses.push(used);
        }
    }

    /// Global elements whose content uses `shared`.
    pub fn users_of(&self, shared: AxiId) -> &[AxiId] {
        self.used_by.get(&shared).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Shared definitions used by the content of global element `root`.
    pub fn uses_of(&self, root: AxiId) -> &[AxiId] {
        self.uses.get(&root).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of other global elements that use `element`.
    pub fn referrer_count(&self, element: AxiId) -> usize {
        self.users_of(element).iter().filter(|u| **u != element).count()
    }
}

/// Global elements defined by this document, in document order.
pub fn global_elements(model: &mut AxiModel, schemas: &SchemaSet) -> Vec<AxiId> {
    let root = model.root();
    model
        .children(schemas, root)
        .into_iter()
        .filter(|c| {
            model.family(*c) == Some(KindFamily::Element)
                && model.component_type(*c) == Some(ComponentType::Original)
                && !model.is_foreign(*c)
        })
        .collect()
}

/// Least-referenced global elements: those no other global element uses,
/// or, when every one is used, those with the fewest referrers.
pub fn master_global_elements(model: &mut AxiModel, schemas: &SchemaSet) -> Vec<AxiId> {
    let elements = global_elements(model, schemas);
    let usage = UsageMap::build(model, schemas);
    let masters: Vec<AxiId> = elements
        .iter()
        .copied()
        .filter(|e| usage.referrer_count(*e) == 0)
        .collect();
    if !masters.is_empty() {
        return masters;
    }
    let Some(min) = elements.iter().map(|e| usage.referrer_count(*e)).min() else {
        return Vec::new();
    };
    elements
        .into_iter()
        .filter(|e| usage.referrer_count(*e) == min)
        .collect()
}

/// Element typed by a datatype, or untyped and without content.
pub fn is_simple_element(model: &mut AxiModel, schemas: &SchemaSet, element: AxiId) -> bool {
    match model.element_type(element) {
        Some(AxiType::Datatype(_)) => true,
        None => model.children(schemas, element).is_empty(),
        Some(_) => false,
    }
}

/// No attributes, at most one compositor, and that compositor holds at most
/// one particle.
pub fn is_simple_element_structure(model: &mut AxiModel, schemas: &SchemaSet, element: AxiId) -> bool {
    let children = model.children(schemas, element);
    let mut compositors = Vec::new();
    for child in children {
        match model.family(child) {
            Some(KindFamily::Attribute | KindFamily::AnyAttribute) => return false,
            Some(KindFamily::Compositor) => compositors.push(child),
            _ => {}
        }
    }
    match compositors.as_slice() {
        [] => true,
        [only] => model.children(schemas, *only).len() <= 1,
        _ => false,
    }
}

/// Same construct, same identity attributes, same shape all the way down.
pub fn is_structurally_equal(model: &SchemaModel, a: SchemaNodeId, b: SchemaNodeId) -> bool {
    let (Some(left), Some(right)) = (model.node(a), model.node(b)) else {
        return false;
    };
    if left.kind() != right.kind() || left.text() != right.text() {
        return false;
    }
    if IDENTITY_ATTRIBUTES
        .iter()
        .any(|name| left.attr(name) != right.attr(name))
    {
        return false;
    }
    let other_attrs_equal = left.attributes().count() == right.attributes().count()
        && left
            .attributes()
            .all(|(key, value)| right.attr(key) == Some(value));
    if !other_attrs_equal {
        return false;
    }
    left.children().len() == right.children().len()
        && left
            .children()
            .iter()
            .zip(right.children())
            .all(|(x, y)| is_structurally_equal(model, *x, *y))
}
