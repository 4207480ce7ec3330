//! Schema → tree reconciliation.
//!
//! Each test builds a session over a programmatic schema, populates the
//! tree, edits the schema directly and checks what sync made of it.

use axi::schema::{SchemaKind, SchemaState};
use axi::{ComponentType, KindFamily, ModelState};

use crate::helpers::schema_fixtures::{order_item_schema, root_child_schema, session_over, shared_type_schema};
use crate::helpers::tree_assertions::{element_particles, global_element, tree_signature};

// ============================================================================
// INITIAL BUILD
// ============================================================================

#[test]
fn test_root_child_builds_original_elements() {
    let mut session = session_over(root_child_schema());
    session.with_model(|axi, set| {
        let root = global_element(axi, set, "root");
        assert_eq!(axi.component_type(root), Some(ComponentType::Original));
        assert!(axi.is_global(root));

        let children = axi.children(set, root);
        assert_eq!(children.len(), 1, "root holds its sequence");
        assert_eq!(axi.family(children[0]), Some(KindFamily::Compositor));

        let elements = element_particles(axi, set, root);
        assert_eq!(elements.len(), 1);
        let child = elements[0];
        assert_eq!(axi.name(child), Some("child"));
        assert_eq!(axi.component_type(child), Some(ComponentType::Original));
        assert_eq!(axi.min_occurs(child), Some("1"));
        assert_eq!(axi.max_occurs(child), Some("1"));
        assert!(!axi.is_global(child));
    });
}

#[test]
fn test_removing_schema_child_drops_it_from_tree() {
    let mut session = session_over(root_child_schema());
    let (root, child) = session.with_model(|axi, set| {
        let root = global_element(axi, set, "root");
        let child = element_particles(axi, set, root)[0];
        (root, child)
    });

    {
        let schemas = session.schemas();
        let mut set = schemas.lock();
        let document = set.model_mut(session.schema_id()).unwrap();
        let peer = session.model().peer(child).unwrap().node;
        document.transact(|m| m.remove(peer)).unwrap();
    }
    assert_eq!(session.schema_changed(), Some(ModelState::Valid));

    let model = session.model();
    assert!(model.is_alive(root), "root keeps its identity");
    assert!(!model.is_alive(child));
    let seq = model.children_initialized(root).unwrap()[0];
    assert!(model.children_initialized(seq).unwrap().is_empty());
}

// ============================================================================
// IDEMPOTENCE AND IDENTITY
// ============================================================================

#[test]
fn test_second_sync_changes_nothing() {
    let mut session = session_over(order_item_schema());
    let before = session.with_model(|axi, set| tree_signature(axi, set));

    assert_eq!(session.sync(), ModelState::Valid);
    let once = session.with_model(|axi, set| tree_signature(axi, set));
    assert_eq!(session.sync(), ModelState::Valid);
    let twice = session.with_model(|axi, set| tree_signature(axi, set));

    assert_eq!(before, once);
    assert_eq!(once, twice);
}

#[test]
fn test_sibling_insert_preserves_identity() {
    let mut session = session_over(root_child_schema());
    let (root, child) = session.with_model(|axi, set| {
        let root = global_element(axi, set, "root");
        let child = element_particles(axi, set, root)[0];
        (root, child)
    });

    {
        let schemas = session.schemas();
        let mut set = schemas.lock();
        let document = set.model_mut(session.schema_id()).unwrap();
        let schema_root = document.root();
        document
            .transact(|m| m.append(schema_root, SchemaKind::GlobalElement, &[("name", "extra")]))
            .unwrap();
    }
    assert_eq!(session.schema_changed(), Some(ModelState::Valid));

    session.with_model(|axi, set| {
        assert_eq!(global_element(axi, set, "root"), root);
        assert_eq!(element_particles(axi, set, root), vec![child]);
        let extra = global_element(axi, set, "extra");
        assert_eq!(axi.parent(extra), Some(axi.root()));
    });
}

#[test]
fn test_attribute_edits_refresh_properties() {
    let mut session = session_over(root_child_schema());
    let child = session.with_model(|axi, set| {
        let root = global_element(axi, set, "root");
        element_particles(axi, set, root)[0]
    });

    {
        let schemas = session.schemas();
        let mut set = schemas.lock();
        let document = set.model_mut(session.schema_id()).unwrap();
        let peer = session.model().peer(child).unwrap().node;
        document
            .transact(|m| m.set_attr(peer, "maxOccurs", Some("unbounded")))
            .unwrap();
    }
    assert_eq!(session.schema_changed(), Some(ModelState::Valid));
    assert_eq!(session.model().max_occurs(child), Some("unbounded"));
}

// ============================================================================
// SHARED CONTENT
// ============================================================================

#[test]
fn test_type_content_appears_as_proxies() {
    let mut session = session_over(shared_type_schema());
    session.with_model(|axi, set| {
        let person = global_element(axi, set, "person");
        let children = axi.children(set, person);
        assert_eq!(children.len(), 1);
        let proxy = children[0];
        assert_eq!(axi.component_type(proxy), Some(ComponentType::Proxy));

        let shared = axi.shared(proxy).unwrap();
        assert_eq!(axi.component_type(shared), Some(ComponentType::Original));
        assert_eq!(axi.peer(proxy), axi.peer(shared));

        let names: Vec<_> = element_particles(axi, set, person)
            .into_iter()
            .map(|e| axi.name(e).unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["name".to_string()]);
    });
}

#[test]
fn test_type_edit_reaches_every_user() {
    let mut session = session_over(shared_type_schema());
    let person = session.with_model(|axi, set| {
        let person = global_element(axi, set, "person");
        element_particles(axi, set, person);
        person
    });

    {
        let schemas = session.schemas();
        let mut set = schemas.lock();
        let document = set.model_mut(session.schema_id()).unwrap();
        let ct = document.find_global(SchemaKind::GlobalComplexType, "PersonType").unwrap();
        let seq = document.children(ct)[0];
        document
            .transact(|m| m.append(seq, SchemaKind::LocalElement, &[("name", "age")]))
            .unwrap();
    }
    assert_eq!(session.schema_changed(), Some(ModelState::Valid));

    session.with_model(|axi, set| {
        let names: Vec<_> = element_particles(axi, set, person)
            .into_iter()
            .map(|e| axi.name(e).unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["name".to_string(), "age".to_string()]);
    });
}

// ============================================================================
// DOCUMENT STATE
// ============================================================================

#[test]
fn test_broken_document_is_not_reconciled() {
    let mut session = session_over(root_child_schema());
    {
        let schemas = session.schemas();
        let mut set = schemas.lock();
        set.model_mut(session.schema_id())
            .unwrap()
            .set_state(SchemaState::NotWellFormed);
    }
    assert_eq!(session.sync(), ModelState::NotWellFormed);
}
