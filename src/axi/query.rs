//! Relevance filter for schema change events.

use crate::base::SchemaNodeId;
use crate::schema::{ChangeKind, SchemaChange, SchemaKind, SchemaModel};

/// Whether a construct of this kind has any representation in the tree.
pub fn affects_model(kind: SchemaKind) -> bool {
    !matches!(
        kind,
        SchemaKind::Annotation
            | SchemaKind::Documentation
            | SchemaKind::AppInfo
            | SchemaKind::Key
            | SchemaKind::KeyRef
            | SchemaKind::Unique
            | SchemaKind::Selector
            | SchemaKind::Field
            | SchemaKind::Notation
    )
}

/// Whether a node is separately navigable: globals always, local constructs
/// only when the nearest non-wrapper ancestor is a global element or a global
/// complex type.
pub fn can_view(model: &SchemaModel, node: SchemaNodeId) -> bool {
    let Some(kind) = model.kind(node) else {
        return false;
    };
    if kind.is_global() {
        return true;
    }
    if kind == SchemaKind::Schema {
        return false;
    }
    let mut cursor = model.parent(node);
    while let Some(ancestor) = cursor {
        match model.kind(ancestor) {
            Some(k) if k.is_wrapper() => cursor = model.parent(ancestor),
            Some(k) => return matches!(k, SchemaKind::GlobalElement | SchemaKind::GlobalComplexType),
            None => return false,
        }
    }
    false
}

/// Whether a recorded change can alter the tree.
///
/// Changes inside annotations or identity constraints are dropped. A removed
/// subtree whose nodes are already gone counts as relevant.
pub fn is_relevant(model: &SchemaModel, change: &SchemaChange) -> bool {
    let subject = match change.kind {
        ChangeKind::ChildAdded(child) | ChangeKind::ChildRemoved(child) => child,
        ChangeKind::AttributeChanged(_) | ChangeKind::TextChanged => change.node,
    };
    let Some(kind) = model.kind(subject) else {
        return true;
    };
    if !affects_model(kind) {
        return false;
    }
    let mut cursor = model.parent(subject);
    while let Some(ancestor) = cursor {
        if model.kind(ancestor).is_some_and(|k| !affects_model(k)) {
            return false;
        }
        cursor = model.parent(ancestor);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::ModelId;

    #[test]
    fn nested_locals_are_not_viewable() {
        let mut model = SchemaModel::new(ModelId(0), "q.xsd");
        let root = model.root();
        let (outer, inner) = model
            .transact(|m| {
                let el = m.append(root, SchemaKind::GlobalElement, &[("name", "a")])?;
                let ct = m.append(el, SchemaKind::LocalComplexType, &[])?;
                let seq = m.append(ct, SchemaKind::Sequence, &[])?;
                let outer = m.append(seq, SchemaKind::LocalElement, &[("name", "b")])?;
                let ct = m.append(outer, SchemaKind::LocalComplexType, &[])?;
                let seq = m.append(ct, SchemaKind::Sequence, &[])?;
                let inner = m.append(seq, SchemaKind::LocalElement, &[("name", "c")])?;
                Ok((outer, inner))
            })
            .unwrap();
        assert!(can_view(&model, outer));
        assert!(!can_view(&model, inner));
        assert!(!can_view(&model, root));
    }

    #[test]
    fn annotation_changes_are_irrelevant() {
        let mut model = SchemaModel::new(ModelId(0), "q.xsd");
        let root = model.root();
        model
            .transact(|m| {
                let el = m.append(root, SchemaKind::GlobalElement, &[("name", "a")])?;
                let ann = m.append(el, SchemaKind::Annotation, &[])?;
                let doc = m.append(ann, SchemaKind::Documentation, &[])?;
                m.set_text(doc, Some("hello"))?;
                m.set_attr(el, "name", Some("b"))
            })
            .unwrap();
        let relevant: Vec<_> = model
            .take_changes()
            .into_iter()
            .filter(|c| is_relevant(&model, c))
            .collect();
        assert_eq!(relevant.len(), 2);
        assert!(affects_model(SchemaKind::GlobalElement));
        assert!(!affects_model(SchemaKind::KeyRef));
    }
}
