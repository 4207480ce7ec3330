//! Tree → schema: replaying recorded edits with `flush`.

use axi::axi::CompositorType;
use axi::schema::SchemaKind;
use axi::{GeneratorError, ModelState};

use crate::helpers::schema_fixtures::{
    leaf_globals_schema, order_item_schema, root_child_schema, session_over,
};
use crate::helpers::tree_assertions::{
    descendants_of_kind, element_particles, global_element, global_names,
};

// ============================================================================
// ADDITIONS
// ============================================================================

#[test]
fn test_new_global_element_with_content_is_written() {
    let mut session = session_over(leaf_globals_schema());
    let memo = session.with_model(|axi, set| {
        let root = axi.root();
        let memo = axi.new_element("memo");
        axi.add_child(set, root, memo, None).unwrap();
        let seq = axi.new_compositor(CompositorType::Sequence);
        axi.add_child(set, memo, seq, None).unwrap();
        let to = axi.new_element("to");
        axi.add_child(set, seq, to, None).unwrap();
        memo
    });
    assert_eq!(session.model().pending_changes().len(), 3);

    session.flush().unwrap();
    assert!(!session.model().has_pending_changes());

    let schemas = session.schemas();
    let set = schemas.lock();
    let id = session.schema_id();
    assert_eq!(global_names(&set, id, SchemaKind::GlobalElement), vec!["note", "memo"]);

    let document = set.model(id).unwrap();
    let memo_node = document.find_global(SchemaKind::GlobalElement, "memo").unwrap();
    assert_eq!(session.model().peer(memo).map(|p| p.node), Some(memo_node));
    assert_eq!(descendants_of_kind(&set, id, memo_node, SchemaKind::LocalComplexType).len(), 1);
    let locals = descendants_of_kind(&set, id, memo_node, SchemaKind::LocalElement);
    assert_eq!(locals.len(), 1);
    assert_eq!(document.name(locals[0]), Some("to"));
}

#[test]
fn test_colliding_global_name_gets_suffix() {
    let mut session = session_over(leaf_globals_schema());
    let added = session.with_model(|axi, set| {
        let root = axi.root();
        let note = axi.new_element("note");
        axi.add_child(set, root, note, None).unwrap();
        note
    });
    session.flush().unwrap();

    assert_eq!(session.model().name(added), Some("note1"));
    let schemas = session.schemas();
    let set = schemas.lock();
    assert_eq!(
        global_names(&set, session.schema_id(), SchemaKind::GlobalElement),
        vec!["note", "note1"]
    );
}

#[test]
fn test_children_of_unattached_parent_are_rejected() {
    let mut session = session_over(leaf_globals_schema());
    session.with_model(|axi, set| {
        let orphan = axi.new_element("orphan");
        let seq = axi.new_compositor(CompositorType::Sequence);
        axi.add_child(set, orphan, seq, None).unwrap();
    });

    let err = session.flush().unwrap_err();
    assert!(
        matches!(&err, GeneratorError::MissingPeer(name) if name == "orphan"),
        "unexpected error: {err}"
    );
    let schemas = session.schemas();
    let set = schemas.lock();
    assert!(!set.model(session.schema_id()).unwrap().is_in_transaction());
}

// ============================================================================
// DELETIONS AND MODIFICATIONS
// ============================================================================

#[test]
fn test_removed_local_element_leaves_schema() {
    let mut session = session_over(root_child_schema());
    session.with_model(|axi, set| {
        let root = global_element(axi, set, "root");
        let seq = axi.children(set, root)[0];
        let child = axi.children(set, seq)[0];
        axi.remove_child(seq, child).unwrap();
    });
    session.flush().unwrap();

    let schemas = session.schemas();
    let set = schemas.lock();
    let id = session.schema_id();
    let root = set.model(id).unwrap().root();
    assert!(descendants_of_kind(&set, id, root, SchemaKind::LocalElement).is_empty());
    assert_eq!(descendants_of_kind(&set, id, root, SchemaKind::Sequence).len(), 1);
}

#[test]
fn test_cardinality_edit_is_written() {
    let mut session = session_over(root_child_schema());
    session.with_model(|axi, set| {
        let root = global_element(axi, set, "root");
        let child = element_particles(axi, set, root)[0];
        axi.set_min_occurs(child, "0").unwrap();
        axi.set_max_occurs(child, "unbounded").unwrap();
    });
    session.flush().unwrap();

    let schemas = session.schemas();
    let set = schemas.lock();
    let id = session.schema_id();
    let document = set.model(id).unwrap();
    let child = descendants_of_kind(&set, id, document.root(), SchemaKind::LocalElement)[0];
    assert_eq!(document.attr(child, "minOccurs"), Some("0"));
    assert_eq!(document.attr(child, "maxOccurs"), Some("unbounded"));
}

#[test]
fn test_global_rename_rewrites_references() {
    let mut session = session_over(order_item_schema());
    let reference = session.with_model(|axi, set| {
        let item = global_element(axi, set, "item");
        let order = global_element(axi, set, "order");
        let reference = element_particles(axi, set, order)[0];
        axi.set_name(item, "entry").unwrap();
        reference
    });
    session.flush().unwrap();
    assert_eq!(session.model().name(reference), Some("entry"));

    {
        let schemas = session.schemas();
        let set = schemas.lock();
        let id = session.schema_id();
        let document = set.model(id).unwrap();
        assert_eq!(global_names(&set, id, SchemaKind::GlobalElement), vec!["order", "entry"]);
        let refs = descendants_of_kind(&set, id, document.root(), SchemaKind::ElementReference);
        assert_eq!(document.attr(refs[0], "ref"), Some("entry"));
    }

    assert_eq!(session.sync(), ModelState::Valid);
    assert_eq!(session.model().name(reference), Some("entry"));
}
