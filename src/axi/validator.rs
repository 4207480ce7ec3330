//! Peer validation: does a schema node fit an abstraction node's kind?

use super::component::{ComponentType, KindFamily};
use super::model::AxiModel;
use crate::base::AxiId;
use crate::schema::SchemaKind;

/// Whether a schema node of `kind` may back `id`.
///
/// Originals must back onto definitions, references onto reference
/// constructs. Proxies are judged by the node they mirror.
pub fn is_valid_peer(model: &AxiModel, id: AxiId, kind: SchemaKind) -> bool {
    let Some(node) = model.node(id) else {
        return false;
    };
    if node.component_type() == ComponentType::Proxy {
        return match node.shared() {
            Some(shared) if shared != id => is_valid_peer(model, shared, kind),
            _ => false,
        };
    }
    let reference = node.component_type() == ComponentType::Reference;

    match node.family() {
        KindFamily::Document => kind == SchemaKind::Schema,
        KindFamily::Element if reference => kind == SchemaKind::ElementReference,
        KindFamily::Element => matches!(kind, SchemaKind::GlobalElement | SchemaKind::LocalElement),
        KindFamily::Attribute if reference => kind == SchemaKind::AttributeReference,
        KindFamily::Attribute => {
            matches!(kind, SchemaKind::GlobalAttribute | SchemaKind::LocalAttribute)
        }
        KindFamily::Compositor => kind.is_compositor(),
        KindFamily::ContentModel => matches!(
            kind,
            SchemaKind::GlobalComplexType | SchemaKind::GlobalGroup | SchemaKind::GlobalAttributeGroup
        ),
        KindFamily::AnyElement => kind == SchemaKind::AnyElement,
        KindFamily::AnyAttribute => kind == SchemaKind::AnyAttribute,
        KindFamily::SchemaReference => kind.is_schema_reference(),
    }
}
