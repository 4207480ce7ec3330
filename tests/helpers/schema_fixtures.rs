//! Schema documents built programmatically for integration tests.

use axi::base::{ModelId, SchemaNodeId};
use axi::schema::{SchemaError, SchemaKind, SchemaModel, SchemaSet};
use axi::{DocumentSession, SessionConfig};

/// Populate document `id`. `f` runs inside a transaction on the root.
pub fn build_document(
    set: &mut SchemaSet,
    id: ModelId,
    f: impl FnOnce(&mut SchemaModel, SchemaNodeId) -> Result<(), SchemaError>,
) {
    let model = set.model_mut(id).expect("document should exist");
    let root = model.root();
    model.transact(|m| f(m, root)).expect("fixture should build");
    model.take_changes();
}

/// Build a one-document set.
pub fn schema_with(
    location: &str,
    f: impl FnOnce(&mut SchemaModel, SchemaNodeId) -> Result<(), SchemaError>,
) -> (SchemaSet, ModelId) {
    let mut set = SchemaSet::new();
    let id = set.create(location);
    build_document(&mut set, id, f);
    (set, id)
}

/// Open a session with the default configuration.
pub fn session_over((set, id): (SchemaSet, ModelId)) -> DocumentSession {
    DocumentSession::open(set, id, SessionConfig::default()).expect("session should open")
}

pub fn empty_schema() -> (SchemaSet, ModelId) {
    schema_with("empty.xsd", |_, _| Ok(()))
}

/// `root` holding an inline sequence with one local element `child`.
pub fn root_child_schema() -> (SchemaSet, ModelId) {
    schema_with("root-child.xsd", |m, root| {
        let element = m.append(root, SchemaKind::GlobalElement, &[("name", "root")])?;
        let ct = m.append(element, SchemaKind::LocalComplexType, &[])?;
        let seq = m.append(ct, SchemaKind::Sequence, &[])?;
        m.append(seq, SchemaKind::LocalElement, &[("name", "child")])?;
        Ok(())
    })
}

/// `order` references the global `item` from its inline sequence.
pub fn order_item_schema() -> (SchemaSet, ModelId) {
    schema_with("order.xsd", |m, root| {
        let order = m.append(root, SchemaKind::GlobalElement, &[("name", "order")])?;
        let ct = m.append(order, SchemaKind::LocalComplexType, &[])?;
        let seq = m.append(ct, SchemaKind::Sequence, &[])?;
        m.append(
            seq,
            SchemaKind::ElementReference,
            &[("ref", "item"), ("maxOccurs", "unbounded")],
        )?;
        m.append(
            root,
            SchemaKind::GlobalElement,
            &[("name", "item"), ("type", "xs:string")],
        )?;
        Ok(())
    })
}

/// Two global elements, each typed by its own global complex type holding
/// one attribute.
pub fn typed_globals_schema() -> (SchemaSet, ModelId) {
    schema_with("typed.xsd", |m, root| {
        m.append(
            root,
            SchemaKind::GlobalElement,
            &[("name", "person"), ("type", "PersonType")],
        )?;
        m.append(
            root,
            SchemaKind::GlobalElement,
            &[("name", "address"), ("type", "AddressType")],
        )?;
        let person = m.append(root, SchemaKind::GlobalComplexType, &[("name", "PersonType")])?;
        m.append(
            person,
            SchemaKind::LocalAttribute,
            &[("name", "id"), ("type", "xs:string")],
        )?;
        let address = m.append(root, SchemaKind::GlobalComplexType, &[("name", "AddressType")])?;
        m.append(
            address,
            SchemaKind::LocalAttribute,
            &[("name", "zip"), ("type", "xs:string")],
        )?;
        Ok(())
    })
}

/// `order` typed by `OrderType`, whose sequence references the global `item`.
pub fn typed_reference_schema() -> (SchemaSet, ModelId) {
    schema_with("typed-ref.xsd", |m, root| {
        m.append(
            root,
            SchemaKind::GlobalElement,
            &[("name", "order"), ("type", "OrderType")],
        )?;
        m.append(
            root,
            SchemaKind::GlobalElement,
            &[("name", "item"), ("type", "xs:string")],
        )?;
        let ct = m.append(root, SchemaKind::GlobalComplexType, &[("name", "OrderType")])?;
        let seq = m.append(ct, SchemaKind::Sequence, &[])?;
        m.append(seq, SchemaKind::ElementReference, &[("ref", "item")])?;
        Ok(())
    })
}

/// `person` typed by `PersonType`, whose sequence holds a local `name`.
pub fn shared_type_schema() -> (SchemaSet, ModelId) {
    schema_with("shared.xsd", |m, root| {
        m.append(
            root,
            SchemaKind::GlobalElement,
            &[("name", "person"), ("type", "PersonType")],
        )?;
        let ct = m.append(root, SchemaKind::GlobalComplexType, &[("name", "PersonType")])?;
        let seq = m.append(ct, SchemaKind::Sequence, &[])?;
        m.append(
            seq,
            SchemaKind::LocalElement,
            &[("name", "name"), ("type", "xs:string")],
        )?;
        Ok(())
    })
}

/// Globals `a` and `b` each hold a local element called `Item`.
pub fn clashing_locals_schema() -> (SchemaSet, ModelId) {
    schema_with("clash.xsd", |m, root| {
        for (owner, ty) in [("a", "xs:string"), ("b", "xs:int")] {
            let element = m.append(root, SchemaKind::GlobalElement, &[("name", owner)])?;
            let ct = m.append(element, SchemaKind::LocalComplexType, &[])?;
            let seq = m.append(ct, SchemaKind::Sequence, &[])?;
            m.append(seq, SchemaKind::LocalElement, &[("name", "Item"), ("type", ty)])?;
        }
        Ok(())
    })
}

/// `doc` references `A`; `A` and `B` each hold one local element.
pub fn retarget_schema() -> (SchemaSet, ModelId) {
    schema_with("retarget.xsd", |m, root| {
        let doc = m.append(root, SchemaKind::GlobalElement, &[("name", "doc")])?;
        let ct = m.append(doc, SchemaKind::LocalComplexType, &[])?;
        let seq = m.append(ct, SchemaKind::Sequence, &[])?;
        m.append(seq, SchemaKind::ElementReference, &[("ref", "A")])?;
        for (name, local) in [("A", "a1"), ("B", "b1")] {
            let element = m.append(root, SchemaKind::GlobalElement, &[("name", name)])?;
            let ct = m.append(element, SchemaKind::LocalComplexType, &[])?;
            let seq = m.append(ct, SchemaKind::Sequence, &[])?;
            m.append(seq, SchemaKind::LocalElement, &[("name", local)])?;
        }
        Ok(())
    })
}

/// One global element with inline content plus an unused complex type.
pub fn venetian_schema() -> (SchemaSet, ModelId) {
    schema_with("venetian.xsd", |m, root| {
        let catalog = m.append(root, SchemaKind::GlobalElement, &[("name", "catalog")])?;
        let ct = m.append(catalog, SchemaKind::LocalComplexType, &[])?;
        let seq = m.append(ct, SchemaKind::Sequence, &[])?;
        m.append(
            seq,
            SchemaKind::LocalElement,
            &[("name", "title"), ("type", "xs:string")],
        )?;
        let unused = m.append(root, SchemaKind::GlobalComplexType, &[("name", "Spare")])?;
        let seq = m.append(unused, SchemaKind::Sequence, &[])?;
        m.append(seq, SchemaKind::LocalElement, &[("name", "x")])?;
        Ok(())
    })
}

/// Global elements with simple types only.
pub fn leaf_globals_schema() -> (SchemaSet, ModelId) {
    schema_with("leaves.xsd", |m, root| {
        m.append(
            root,
            SchemaKind::GlobalElement,
            &[("name", "note"), ("type", "xs:string")],
        )?;
        Ok(())
    })
}

/// `root` with `block`/`final`, an annotation, one local `child` that carries
/// its own annotation, and a key over its children.
pub fn annotated_root_schema() -> (SchemaSet, ModelId) {
    schema_with("annotated.xsd", |m, root| {
        let element = m.append(
            root,
            SchemaKind::GlobalElement,
            &[("name", "root"), ("block", "extension"), ("final", "restriction")],
        )?;
        let annotation = m.append(element, SchemaKind::Annotation, &[])?;
        let doc = m.append(annotation, SchemaKind::Documentation, &[])?;
        m.set_text(doc, Some("The document root."))?;
        let ct = m.append(element, SchemaKind::LocalComplexType, &[])?;
        let seq = m.append(ct, SchemaKind::Sequence, &[])?;
        let child = m.append(
            seq,
            SchemaKind::LocalElement,
            &[("name", "child"), ("type", "xs:string"), ("maxOccurs", "unbounded")],
        )?;
        m.append(child, SchemaKind::Annotation, &[])?;
        let key = m.append(element, SchemaKind::Key, &[("name", "k")])?;
        m.append(key, SchemaKind::Selector, &[("xpath", "child")])?;
        m.append(key, SchemaKind::Field, &[("xpath", ".")])?;
        Ok(())
    })
}

/// Globals `a` and `b` each hold a local `x` whose inline content references
/// `first` and `second` respectively; `z` and `w` are simple globals.
pub fn nested_refs_schema(first: &str, second: &str) -> (SchemaSet, ModelId) {
    schema_with("nested-refs.xsd", |m, root| {
        for (owner, target) in [("a", first), ("b", second)] {
            let element = m.append(root, SchemaKind::GlobalElement, &[("name", owner)])?;
            let ct = m.append(element, SchemaKind::LocalComplexType, &[])?;
            let seq = m.append(ct, SchemaKind::Sequence, &[])?;
            let x = m.append(seq, SchemaKind::LocalElement, &[("name", "x")])?;
            let ct = m.append(x, SchemaKind::LocalComplexType, &[])?;
            let seq = m.append(ct, SchemaKind::Sequence, &[])?;
            m.append(seq, SchemaKind::ElementReference, &[("ref", target)])?;
        }
        for name in ["z", "w"] {
            m.append(
                root,
                SchemaKind::GlobalElement,
                &[("name", name), ("type", "xs:string")],
            )?;
        }
        Ok(())
    })
}

/// `head` holds an inline sequence; `member` joins its substitution group.
pub fn substitution_schema() -> (SchemaSet, ModelId) {
    schema_with("substitution.xsd", |m, root| {
        let head = m.append(root, SchemaKind::GlobalElement, &[("name", "head")])?;
        let ct = m.append(head, SchemaKind::LocalComplexType, &[])?;
        let seq = m.append(ct, SchemaKind::Sequence, &[])?;
        m.append(
            seq,
            SchemaKind::LocalElement,
            &[("name", "h1"), ("type", "xs:string")],
        )?;
        m.append(
            root,
            SchemaKind::GlobalElement,
            &[("name", "member"), ("substitutionGroup", "head")],
        )?;
        Ok(())
    })
}

/// `main.xsd` imports `lib.xsd`, and `order` references `lib:part` twice.
/// `part` holds an inline sequence with local `sku`.
pub fn imported_part_schema() -> (SchemaSet, ModelId) {
    let mut set = SchemaSet::new();
    let main = set.create("main.xsd");
    let lib = set.create("lib.xsd");
    build_document(&mut set, lib, |m, root| {
        let part = m.append(root, SchemaKind::GlobalElement, &[("name", "part")])?;
        let ct = m.append(part, SchemaKind::LocalComplexType, &[])?;
        let seq = m.append(ct, SchemaKind::Sequence, &[])?;
        m.append(
            seq,
            SchemaKind::LocalElement,
            &[("name", "sku"), ("type", "xs:string")],
        )?;
        Ok(())
    });
    build_document(&mut set, main, |m, root| {
        m.append(
            root,
            SchemaKind::Import,
            &[("namespace", "urn:lib"), ("schemaLocation", "lib.xsd")],
        )?;
        let order = m.append(root, SchemaKind::GlobalElement, &[("name", "order")])?;
        let ct = m.append(order, SchemaKind::LocalComplexType, &[])?;
        let seq = m.append(ct, SchemaKind::Sequence, &[])?;
        m.append(seq, SchemaKind::ElementReference, &[("ref", "lib:part")])?;
        m.append(
            seq,
            SchemaKind::ElementReference,
            &[("ref", "lib:part"), ("minOccurs", "0")],
        )?;
        Ok(())
    });
    (set, main)
}
