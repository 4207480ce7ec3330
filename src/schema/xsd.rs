//! XML Schema text output for a [`SchemaModel`].
//!
//! Hosts persist the result of `flush` or `transform` with this writer.
//! Reading schema text is left to the host; the engine only consumes the
//! object model.

use std::io::Cursor;
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::SchemaError;
use super::model::SchemaModel;
use crate::base::SchemaNodeId;
use crate::base::constants::{XSD_NAMESPACE, XSD_PREFIX};

/// Serialise a document to indented XML Schema text.
pub fn write_xsd(model: &SchemaModel) -> Result<String, SchemaError> {
    let mut buffer = Cursor::new(Vec::new());
    let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| SchemaError::xml(format!("Write error: {e}")))?;

    let bound = model.prefix_for_namespace(XSD_NAMESPACE);
    let prefix = bound.unwrap_or(XSD_PREFIX);
    write_node(&mut writer, model, model.root(), prefix, bound.is_none())?;

    let mut output = buffer.into_inner();
    output.push(b'\n');
    String::from_utf8(output).map_err(|e| SchemaError::xml(format!("Invalid UTF-8: {e}")))
}

/// Serialise a document straight to a file.
pub fn write_xsd_to_path(model: &SchemaModel, path: &Path) -> Result<(), SchemaError> {
    let text = write_xsd(model)?;
    std::fs::write(path, text)?;
    Ok(())
}

fn write_node<W: std::io::Write>(
    writer: &mut Writer<W>,
    model: &SchemaModel,
    id: SchemaNodeId,
    prefix: &str,
    declare_prefix: bool,
) -> Result<(), SchemaError> {
    let Some(node) = model.node(id) else {
        return Ok(());
    };
    let tag = if prefix.is_empty() {
        node.kind().tag().to_string()
    } else {
        format!("{prefix}:{}", node.kind().tag())
    };

    let mut start = BytesStart::new(tag.as_str());
    if declare_prefix {
        let key = format!("xmlns:{prefix}");
        start.push_attribute((key.as_str(), XSD_NAMESPACE));
    }
    for (key, value) in node.attributes() {
        start.push_attribute((key, value));
    }

    if node.children().is_empty() && node.text().is_none() {
        return writer
            .write_event(Event::Empty(start))
            .map(|_| ())
            .map_err(|e| SchemaError::xml(format!("Write error: {e}")));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| SchemaError::xml(format!("Write error: {e}")))?;
    if let Some(text) = node.text() {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| SchemaError::xml(format!("Write error: {e}")))?;
    }
    for child in node.children() {
        write_node(writer, model, *child, prefix, false)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(tag.as_str())))
        .map_err(|e| SchemaError::xml(format!("Write error: {e}")))?;
    Ok(())
}
