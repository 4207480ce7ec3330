//! Schema-writing helpers shared by the update and transform paths.

use crate::axi::{Datatype, Variety};
use crate::base::constants::{OCCURS_ONE, attr};
use crate::base::SchemaNodeId;
use crate::schema::{SchemaError, SchemaKind, SchemaModel};

/// Write `minOccurs`/`maxOccurs`; the default `1` is written as absence.
pub(crate) fn set_occurs(
    model: &mut SchemaModel,
    node: SchemaNodeId,
    name: &str,
    value: Option<&str>,
) -> Result<(), SchemaError> {
    let value = value.filter(|v| *v != OCCURS_ONE);
    model.set_attr(node, name, value)
}

/// Write a boolean attribute whose default is `false`.
pub(crate) fn set_flag(
    model: &mut SchemaModel,
    node: SchemaNodeId,
    name: &str,
    value: bool,
) -> Result<(), SchemaError> {
    model.set_attr(node, name, value.then_some("true"))
}

/// Index after the leading annotations of `parent`.
pub(crate) fn content_start(model: &SchemaModel, parent: SchemaNodeId) -> usize {
    model
        .children(parent)
        .iter()
        .take_while(|c| model.kind(**c) == Some(SchemaKind::Annotation))
        .count()
}

/// Name to put in a `type` attribute, or `None` for anonymous types.
pub(crate) fn type_name(model: &SchemaModel, datatype: &Datatype) -> Option<String> {
    let name = datatype.name()?;
    Some(if datatype.is_builtin() {
        model.builtin_type_name(name)
    } else {
        model.qualify(name)
    })
}

/// Drop inline simple or complex types of an element or attribute.
pub(crate) fn clear_inline_types(model: &mut SchemaModel, node: SchemaNodeId) -> Result<(), SchemaError> {
    let inline: Vec<SchemaNodeId> = model
        .children(node)
        .iter()
        .copied()
        .filter(|c| {
            matches!(
                model.kind(*c),
                Some(SchemaKind::LocalSimpleType | SchemaKind::LocalComplexType)
            )
        })
        .collect();
    for child in inline {
        model.remove(child)?;
    }
    Ok(())
}

/// Point `node` at `datatype`: a `type` attribute for named types, an inline
/// simple type otherwise.
pub(crate) fn write_datatype(
    model: &mut SchemaModel,
    node: SchemaNodeId,
    datatype: &Datatype,
) -> Result<(), SchemaError> {
    clear_inline_types(model, node)?;
    if let Some(name) = type_name(model, datatype) {
        return model.set_attr(node, attr::TYPE, Some(&name));
    }
    model.set_attr(node, attr::TYPE, None)?;
    let simple_type = build_simple_type(model, datatype)?;
    let at = content_start(model, node);
    model.add_child(node, simple_type, Some(at))
}

/// Build a detached anonymous simple type describing `datatype`.
pub(crate) fn build_simple_type(
    model: &mut SchemaModel,
    datatype: &Datatype,
) -> Result<SchemaNodeId, SchemaError> {
    let simple_type = model.create(SchemaKind::LocalSimpleType);
    let derivation = match datatype.variety() {
        Variety::Atomic => {
            let base = model.builtin_type_name(datatype.base());
            let restriction = model.create_with(SchemaKind::SimpleRestriction, &[(attr::BASE, &base)]);
            for facet in datatype.facets() {
                let node = model.create_with(SchemaKind::Facet(facet.kind), &[(attr::VALUE, &facet.value)]);
                model.add_child(restriction, node, None)?;
            }
            restriction
        }
        Variety::List(item) => {
            let list = model.create(SchemaKind::List);
            match type_name(model, item) {
                Some(name) => model.set_attr(list, attr::ITEM_TYPE, Some(&name))?,
                None => {
                    let inline = build_simple_type(model, item)?;
                    model.add_child(list, inline, None)?;
                }
            }
            list
        }
        Variety::Union(members) => {
            let union = model.create(SchemaKind::Union);
            let mut named = Vec::new();
            for member in members {
                match type_name(model, member) {
                    Some(name) => named.push(name),
                    None => {
                        let inline = build_simple_type(model, member)?;
                        model.add_child(union, inline, None)?;
                    }
                }
            }
            if !named.is_empty() {
                model.set_attr(union, attr::MEMBER_TYPES, Some(&named.join(" ")))?;
            }
            union
        }
    };
    model.add_child(simple_type, derivation, None)?;
    Ok(simple_type)
}
