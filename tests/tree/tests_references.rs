//! References and proxies: retargeting, delegation and non-ownership.

use axi::schema::SchemaKind;
use axi::{ComponentType, ModelState, Property};

use crate::helpers::schema_fixtures::{
    retarget_schema, session_over, shared_type_schema, substitution_schema,
};
use crate::helpers::tree_assertions::{descendants_of_kind, element_particles, global_element};

// ============================================================================
// REFERENCES
// ============================================================================

#[test]
fn test_set_ref_retargets_children() {
    let mut session = session_over(retarget_schema());
    let (reference, a, b) = session.with_model(|axi, set| {
        let doc = global_element(axi, set, "doc");
        let a = global_element(axi, set, "A");
        let b = global_element(axi, set, "B");
        let reference = element_particles(axi, set, doc)[0];
        assert_eq!(axi.component_type(reference), Some(ComponentType::Reference));
        assert_eq!(axi.referent(reference), Some(a));

        let before = axi.children(set, reference);
        assert_eq!(before.len(), 1);
        assert_eq!(axi.shared(before[0]), Some(axi.children(set, a)[0]));

        axi.set_ref(set, reference, b).unwrap();

        let after = axi.children(set, reference);
        assert_eq!(after.len(), 1);
        assert_eq!(axi.component_type(after[0]), Some(ComponentType::Proxy));
        assert_eq!(axi.shared(after[0]), Some(axi.children(set, b)[0]));
        assert!(!axi.is_alive(before[0]));
        (reference, a, b)
    });

    let model = session.model();
    assert_eq!(model.name(reference), Some("B"));
    assert_eq!(model.referent(reference), Some(b));
    assert!(model.is_alive(a), "old referent is untouched");
    assert_eq!(model.name(a), Some("A"));
    assert!(!model.listeners_of(a).contains(&reference));
    assert!(model.listeners_of(b).contains(&reference));
    assert!(
        model
            .pending_changes()
            .iter()
            .any(|c| c.source == reference && c.property == Property::Ref)
    );
}

#[test]
fn test_retarget_is_flushed_and_survives_sync() {
    let mut session = session_over(retarget_schema());
    let reference = session.with_model(|axi, set| {
        let doc = global_element(axi, set, "doc");
        let b = global_element(axi, set, "B");
        let reference = element_particles(axi, set, doc)[0];
        axi.set_ref(set, reference, b).unwrap();
        reference
    });
    session.flush().unwrap();

    {
        let schemas = session.schemas();
        let set = schemas.lock();
        let id = session.schema_id();
        let document = set.model(id).unwrap();
        let refs = descendants_of_kind(&set, id, document.root(), SchemaKind::ElementReference);
        assert_eq!(document.attr(refs[0], "ref"), Some("B"));
    }

    assert_eq!(session.sync(), ModelState::Valid);
    assert_eq!(session.model().name(reference), Some("B"));
}

#[test]
fn test_reference_keeps_its_own_cardinality() {
    let mut session = session_over(retarget_schema());
    session.with_model(|axi, set| {
        let doc = global_element(axi, set, "doc");
        let a = global_element(axi, set, "A");
        let reference = element_particles(axi, set, doc)[0];
        axi.set_min_occurs(reference, "0").unwrap();

        assert_eq!(axi.min_occurs(reference), Some("0"));
        assert_eq!(axi.min_occurs(a), Some("1"));
    });
}

#[test]
fn test_new_reference_is_written_with_referent_name() {
    let mut session = session_over(retarget_schema());
    session.with_model(|axi, set| {
        let doc = global_element(axi, set, "doc");
        let b = global_element(axi, set, "B");
        let seq = axi.children(set, doc)[0];
        let reference = axi.new_element_ref(b).unwrap();
        axi.add_child(set, seq, reference, None).unwrap();
    });
    session.flush().unwrap();

    let schemas = session.schemas();
    let set = schemas.lock();
    let id = session.schema_id();
    let document = set.model(id).unwrap();
    let refs: Vec<_> = descendants_of_kind(&set, id, document.root(), SchemaKind::ElementReference)
        .into_iter()
        .filter_map(|r| document.attr(r, "ref"))
        .collect();
    assert_eq!(refs, vec!["A", "B"]);
}

// ============================================================================
// PROXIES
// ============================================================================

#[test]
fn test_removing_proxy_keeps_shared_node() {
    let mut session = session_over(shared_type_schema());
    let shared = session.with_model(|axi, set| {
        let person = global_element(axi, set, "person");
        let proxy = axi.children(set, person)[0];
        let shared = axi.shared(proxy).unwrap();
        axi.take_notifications();

        axi.remove_child(person, proxy).unwrap();

        assert!(!axi.is_alive(proxy));
        assert!(axi.is_alive(shared));
        assert!(!axi.listeners_of(shared).contains(&proxy));
        let notifications = axi.take_notifications();
        assert!(
            notifications.iter().all(|c| c.source != shared),
            "shared node must not report a change: {notifications:?}"
        );
        shared
    });

    assert!(!session.model().has_pending_changes());
    session.flush().unwrap();
    assert!(session.model().is_alive(shared));

    let schemas = session.schemas();
    let set = schemas.lock();
    let id = session.schema_id();
    let document = set.model(id).unwrap();
    let ct = document.find_global(SchemaKind::GlobalComplexType, "PersonType").unwrap();
    assert_eq!(descendants_of_kind(&set, id, ct, SchemaKind::LocalElement).len(), 1);
}

#[test]
fn test_edit_through_proxy_reaches_shared_node() {
    let mut session = session_over(shared_type_schema());
    session.with_model(|axi, set| {
        let person = global_element(axi, set, "person");
        let name = element_particles(axi, set, person)[0];
        assert_eq!(axi.component_type(name), Some(ComponentType::Proxy));
        axi.set_max_occurs(name, "5").unwrap();

        let original = axi.original(name);
        assert_ne!(original, name);
        assert_eq!(axi.max_occurs(original), Some("5"));
        assert!(
            axi.pending_changes()
                .iter()
                .all(|c| c.source == original)
        );
    });
    session.flush().unwrap();

    let schemas = session.schemas();
    let set = schemas.lock();
    let id = session.schema_id();
    let document = set.model(id).unwrap();
    let local = descendants_of_kind(&set, id, document.root(), SchemaKind::LocalElement)[0];
    assert_eq!(document.attr(local, "maxOccurs"), Some("5"));
}

#[test]
fn test_substitution_member_mirrors_head_content() {
    let mut session = session_over(substitution_schema());
    session.with_model(|axi, set| {
        let head = global_element(axi, set, "head");
        let member = global_element(axi, set, "member");

        let head_children = axi.children(set, head);
        let children = axi.children(set, member);
        assert_eq!(children.len(), 1);
        assert_eq!(axi.component_type(children[0]), Some(ComponentType::Proxy));
        assert_eq!(axi.shared(children[0]), Some(head_children[0]));

        let particles = element_particles(axi, set, member);
        assert_eq!(particles.len(), 1);
        assert_eq!(axi.name(particles[0]), Some("h1"));
        assert_eq!(axi.component_type(particles[0]), Some(ComponentType::Proxy));
    });

    assert_eq!(session.sync(), ModelState::Valid);
    session.with_model(|axi, set| {
        let member = global_element(axi, set, "member");
        let names: Vec<_> = element_particles(axi, set, member)
            .into_iter()
            .map(|e| axi.name(e).unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["h1".to_string()]);
    });
}
