//! Globals adopted from imported documents.

use axi::base::SchemaRef;
use axi::schema::SchemaKind;
use axi::{AxiId, AxiModel, ComponentType, ModelState, SchemaSet};

use crate::helpers::schema_fixtures::{imported_part_schema, session_over};
use crate::helpers::tree_assertions::{descendants_of_kind, element_particles, global_element};

fn child_names(axi: &mut AxiModel, set: &SchemaSet, parent: AxiId) -> Vec<String> {
    element_particles(axi, set, parent)
        .into_iter()
        .map(|e| axi.name(e).unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_imported_global_is_adopted_once() {
    let mut session = session_over(imported_part_schema());
    session.with_model(|axi, set| {
        let lib = set.by_location("lib.xsd").unwrap();
        let order = global_element(axi, set, "order");
        let refs = element_particles(axi, set, order);
        assert_eq!(refs.len(), 2);
        assert!(
            refs.iter()
                .all(|r| axi.component_type(*r) == Some(ComponentType::Reference))
        );

        let part = axi.referent(refs[0]).unwrap();
        assert_eq!(axi.referent(refs[1]), Some(part));
        assert_eq!(axi.foreign_originals(), &[part]);
        assert!(axi.is_foreign(part));
        assert_eq!(axi.name(part), Some("part"));
        assert_eq!(axi.min_occurs(refs[1]), Some("0"));

        let peer = axi.peer(part).unwrap();
        assert_eq!(peer.model, lib);
        assert_eq!(axi.lookup(peer), None);
        assert_eq!(axi.lookup_from_other_model(set, peer), Some(part));
        assert_eq!(axi.create_from_schema_node(set, peer), Some(part));
    });
}

#[test]
fn test_imported_global_follows_its_document() {
    let mut session = session_over(imported_part_schema());
    let part = session.with_model(|axi, set| {
        let order = global_element(axi, set, "order");
        let first = element_particles(axi, set, order)[0];
        let part = axi.referent(first).unwrap();
        assert_eq!(child_names(axi, set, part), vec!["sku".to_string()]);
        part
    });

    let lib = {
        let schemas = session.schemas();
        let mut set = schemas.lock();
        let lib = set.by_location("lib.xsd").unwrap();
        let document = set.model(lib).unwrap();
        let element = document.find_global(SchemaKind::GlobalElement, "part").unwrap();
        let seq = descendants_of_kind(&set, lib, element, SchemaKind::Sequence)[0];
        set.model_mut(lib)
            .unwrap()
            .transact(|m| {
                m.append(
                    seq,
                    SchemaKind::LocalElement,
                    &[("name", "qty"), ("type", "xs:int")],
                )
            })
            .unwrap();
        lib
    };

    assert_eq!(session.sync(), ModelState::Valid);
    session.with_model(|axi, set| {
        assert!(axi.is_alive(part));
        assert_eq!(
            child_names(axi, set, part),
            vec!["sku".to_string(), "qty".to_string()]
        );
    });

    {
        let schemas = session.schemas();
        let mut set = schemas.lock();
        let document = set.model(lib).unwrap();
        let element = document.find_global(SchemaKind::GlobalElement, "part").unwrap();
        set.model_mut(lib)
            .unwrap()
            .transact(|m| m.remove(element))
            .unwrap();
        assert!(!set.is_attached(SchemaRef::new(lib, element)));
    }

    assert_eq!(session.sync(), ModelState::Valid);
    session.with_model(|axi, set| {
        assert!(!axi.is_alive(part));
        assert!(axi.foreign_originals().is_empty());
        let order = global_element(axi, set, "order");
        assert!(element_particles(axi, set, order).is_empty());
    });
}
