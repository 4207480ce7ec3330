//! Tree inspection and assertion helpers.

use std::fmt::Write;

use axi::base::{AxiId, ModelId, SchemaNodeId};
use axi::schema::{SchemaKind, SchemaSet};
use axi::{AxiModel, KindFamily};

/// Names of the document's top-level definitions of `kind`, in order.
pub fn global_names(set: &SchemaSet, id: ModelId, kind: SchemaKind) -> Vec<String> {
    let model = set.model(id).expect("document should exist");
    model
        .globals_of(kind)
        .filter_map(|node| model.name(node).map(str::to_string))
        .collect()
}

/// Schema nodes of `kind` anywhere below `from`.
pub fn descendants_of_kind(set: &SchemaSet, id: ModelId, from: SchemaNodeId, kind: SchemaKind) -> Vec<SchemaNodeId> {
    let model = set.model(id).expect("document should exist");
    model
        .descendants(from)
        .into_iter()
        .filter(|node| model.kind(*node) == Some(kind))
        .collect()
}

/// The global element called `name` in the tree.
pub fn global_element(axi: &mut AxiModel, set: &SchemaSet, name: &str) -> AxiId {
    let root = axi.root();
    axi.children(set, root)
        .into_iter()
        .find(|c| axi.family(*c) == Some(KindFamily::Element) && axi.name(*c) == Some(name))
        .unwrap_or_else(|| panic!("no global element named '{name}'"))
}

/// Element children of `parent`, looking through compositors.
pub fn element_particles(axi: &mut AxiModel, set: &SchemaSet, parent: AxiId) -> Vec<AxiId> {
    let mut found = Vec::new();
    for child in axi.children(set, parent) {
        match axi.family(child) {
            Some(KindFamily::Element) => found.push(child),
            Some(KindFamily::Compositor) => found.extend(element_particles(axi, set, child)),
            _ => {}
        }
    }
    found
}

/// One line per node: depth, handle, family, component type and name.
/// Populates every node it reaches.
pub fn tree_signature(axi: &mut AxiModel, set: &SchemaSet) -> String {
    let mut out = String::new();
    let root = axi.root();
    dump(axi, set, root, 0, &mut out);
    out
}

fn dump(axi: &mut AxiModel, set: &SchemaSet, id: AxiId, depth: usize, out: &mut String) {
    let _ = writeln!(
        out,
        "{}{} {:?} {:?} {}",
        "  ".repeat(depth),
        id,
        axi.family(id),
        axi.component_type(id),
        axi.name(id).unwrap_or("-")
    );
    for child in axi.children(set, id) {
        dump(axi, set, child, depth + 1, out);
    }
}

/// Assert `names` holds no duplicates.
pub fn assert_unique(names: &[String]) {
    let mut sorted = names.to_vec();
    sorted.sort();
    sorted.dedup();
    assert_eq!(
        sorted.len(),
        names.len(),
        "Expected unique names, got {names:?}"
    );
}
