//! Whole-document transforms between design patterns.

use axi::schema::SchemaKind;
use axi::{ComponentType, DocumentSession, Pattern, SessionConfig};

use crate::helpers::schema_fixtures::{
    annotated_root_schema, clashing_locals_schema, nested_refs_schema, order_item_schema,
    root_child_schema, session_over, typed_globals_schema, venetian_schema,
};
use crate::helpers::tree_assertions::{
    assert_unique, descendants_of_kind, element_particles, global_element, global_names,
};

fn names(session: &DocumentSession, kind: SchemaKind) -> Vec<String> {
    let schemas = session.schemas();
    let set = schemas.lock();
    global_names(&set, session.schema_id(), kind)
}

// ============================================================================
// SALAMI SLICE
// ============================================================================

#[test]
fn test_salami_slice_globalizes_every_element() {
    let mut session = session_over(root_child_schema());
    session.transform(Pattern::SalamiSlice).unwrap();

    assert_eq!(names(&session, SchemaKind::GlobalElement), vec!["root", "child"]);
    assert!(names(&session, SchemaKind::GlobalComplexType).is_empty());

    {
        let schemas = session.schemas();
        let set = schemas.lock();
        let id = session.schema_id();
        let document = set.model(id).unwrap();
        let root = document.find_global(SchemaKind::GlobalElement, "root").unwrap();
        let refs = descendants_of_kind(&set, id, root, SchemaKind::ElementReference);
        assert_eq!(refs.len(), 1);
        assert_eq!(document.attr(refs[0], "ref"), Some("child"));
    }

    session.with_model(|axi, set| {
        let root = global_element(axi, set, "root");
        let child = global_element(axi, set, "child");
        let particles = element_particles(axi, set, root);
        assert_eq!(particles.len(), 1);
        assert_eq!(axi.component_type(particles[0]), Some(ComponentType::Reference));
        assert_eq!(axi.referent(particles[0]), Some(child));
    });
    assert_eq!(session.config().pattern, Some(Pattern::SalamiSlice));
    assert_eq!(session.infer_design_pattern(), Some(Pattern::SalamiSlice));
}

#[test]
fn test_transform_keeps_annotations_constraints_and_blocking() {
    let mut session = session_over(annotated_root_schema());
    session.transform(Pattern::SalamiSlice).unwrap();

    let schemas = session.schemas();
    let set = schemas.lock();
    let id = session.schema_id();
    let document = set.model(id).unwrap();

    let root = document.find_global(SchemaKind::GlobalElement, "root").unwrap();
    let kinds: Vec<_> = document
        .children(root)
        .iter()
        .filter_map(|c| document.kind(*c))
        .collect();
    assert_eq!(
        kinds,
        vec![SchemaKind::Annotation, SchemaKind::LocalComplexType, SchemaKind::Key]
    );
    assert_eq!(document.attr(root, "block"), Some("extension"));
    assert_eq!(document.attr(root, "final"), Some("restriction"));

    let docs = descendants_of_kind(&set, id, root, SchemaKind::Documentation);
    assert_eq!(docs.len(), 1);
    assert_eq!(document.text(docs[0]), Some("The document root."));

    let key = document.children(root)[2];
    assert_eq!(document.name(key), Some("k"));
    assert_eq!(descendants_of_kind(&set, id, key, SchemaKind::Selector).len(), 1);
    assert_eq!(descendants_of_kind(&set, id, key, SchemaKind::Field).len(), 1);

    let child = document.find_global(SchemaKind::GlobalElement, "child").unwrap();
    assert_eq!(descendants_of_kind(&set, id, child, SchemaKind::Annotation).len(), 1);
    assert_eq!(document.attr(child, "final"), None);
}

#[test]
fn test_batched_swap_matches_single_transaction() {
    let (set, id) = root_child_schema();
    let config = SessionConfig::default().with_commit_range(Some(1));
    let mut session = DocumentSession::open(set, id, config).unwrap();
    session.transform(Pattern::SalamiSlice).unwrap();

    assert_eq!(names(&session, SchemaKind::GlobalElement), vec!["root", "child"]);
    let schemas = session.schemas();
    let set = schemas.lock();
    assert!(!set.model(id).unwrap().is_in_transaction());
}

// ============================================================================
// GARDEN OF EDEN
// ============================================================================

#[test]
fn test_garden_of_eden_suffixes_clashing_names() {
    let mut session = session_over(clashing_locals_schema());
    session.transform(Pattern::GardenOfEden).unwrap();

    let elements = names(&session, SchemaKind::GlobalElement);
    assert_eq!(elements, vec!["a", "Item", "b", "Item1"]);
    assert_unique(&elements);
    assert_eq!(names(&session, SchemaKind::GlobalComplexType), vec!["aType", "bType"]);

    let schemas = session.schemas();
    let set = schemas.lock();
    let document = set.model(session.schema_id()).unwrap();
    let item = document.find_global(SchemaKind::GlobalElement, "Item").unwrap();
    let item1 = document.find_global(SchemaKind::GlobalElement, "Item1").unwrap();
    assert_eq!(document.attr(item, "type"), Some("xs:string"));
    assert_eq!(document.attr(item1, "type"), Some("xs:int"));
}

#[test]
fn test_garden_of_eden_reuses_identical_types() {
    let mut session = session_over(nested_refs_schema("z", "z"));
    session.transform(Pattern::GardenOfEden).unwrap();

    assert_eq!(
        names(&session, SchemaKind::GlobalComplexType),
        vec!["aType", "xType", "bType"]
    );
    let schemas = session.schemas();
    let set = schemas.lock();
    let document = set.model(session.schema_id()).unwrap();
    for name in ["x", "x1"] {
        let element = document.find_global(SchemaKind::GlobalElement, name).unwrap();
        assert_eq!(document.attr(element, "type"), Some("xType"), "type of {name}");
    }
}

#[test]
fn test_garden_of_eden_keeps_types_that_differ_by_ref() {
    let mut session = session_over(nested_refs_schema("z", "w"));
    session.transform(Pattern::GardenOfEden).unwrap();

    assert_eq!(
        names(&session, SchemaKind::GlobalComplexType),
        vec!["aType", "xType", "bType", "xType1"]
    );
    let schemas = session.schemas();
    let set = schemas.lock();
    let document = set.model(session.schema_id()).unwrap();
    let x = document.find_global(SchemaKind::GlobalElement, "x").unwrap();
    let x1 = document.find_global(SchemaKind::GlobalElement, "x1").unwrap();
    assert_eq!(document.attr(x, "type"), Some("xType"));
    assert_eq!(document.attr(x1, "type"), Some("xType1"));
}

#[test]
fn test_garden_of_eden_round_trip_keeps_names() {
    let mut session = session_over(typed_globals_schema());
    assert_eq!(session.infer_design_pattern(), Some(Pattern::GardenOfEden));
    let elements = names(&session, SchemaKind::GlobalElement);
    let types = names(&session, SchemaKind::GlobalComplexType);

    session.transform(Pattern::VenetianBlind).unwrap();
    session.transform(Pattern::GardenOfEden).unwrap();

    assert_eq!(names(&session, SchemaKind::GlobalElement), elements);
    assert_eq!(names(&session, SchemaKind::GlobalComplexType), types);
    assert_eq!(session.infer_design_pattern(), Some(Pattern::GardenOfEden));
}

// ============================================================================
// RUSSIAN DOLL, VENETIAN BLIND, MIXED
// ============================================================================

#[test]
fn test_russian_doll_inlines_referenced_globals() {
    let mut session = session_over(order_item_schema());
    session.transform(Pattern::RussianDoll).unwrap();

    assert_eq!(names(&session, SchemaKind::GlobalElement), vec!["order"]);
    let schemas = session.schemas();
    let set = schemas.lock();
    let id = session.schema_id();
    let document = set.model(id).unwrap();
    let locals = descendants_of_kind(&set, id, document.root(), SchemaKind::LocalElement);
    assert_eq!(locals.len(), 1);
    assert_eq!(document.name(locals[0]), Some("item"));
    assert_eq!(document.attr(locals[0], "type"), Some("xs:string"));
    assert_eq!(document.attr(locals[0], "maxOccurs"), Some("unbounded"));
}

#[test]
fn test_russian_doll_keeps_unrelated_roots_global() {
    let mut session = session_over(typed_globals_schema());
    session.transform(Pattern::RussianDoll).unwrap();

    assert_eq!(
        names(&session, SchemaKind::GlobalElement),
        vec!["person", "address"]
    );
    assert!(names(&session, SchemaKind::GlobalComplexType).is_empty());
}

#[test]
fn test_venetian_blind_names_root_content_only() {
    let mut session = session_over(venetian_schema());
    session.transform(Pattern::VenetianBlind).unwrap();

    assert_eq!(names(&session, SchemaKind::GlobalElement), vec!["catalog"]);
    assert_eq!(names(&session, SchemaKind::GlobalComplexType), vec!["catalogType"]);
}

#[test]
fn test_mixed_keeps_current_shape() {
    let mut session = session_over(venetian_schema());
    session.transform(Pattern::Mixed).unwrap();

    assert_eq!(names(&session, SchemaKind::GlobalElement), vec!["catalog"]);
    assert_eq!(names(&session, SchemaKind::GlobalComplexType), vec!["Spare"]);
    session.with_model(|axi, set| {
        let catalog = global_element(axi, set, "catalog");
        let titles: Vec<_> = element_particles(axi, set, catalog)
            .into_iter()
            .map(|e| axi.name(e).unwrap_or_default().to_string())
            .collect();
        assert_eq!(titles, vec!["title".to_string()]);
    });
}
