//! A single node of the schema tree.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::kind::SchemaKind;
use crate::base::SchemaNodeId;
use crate::base::constants::attr;

/// One XML Schema construct with its attributes in document order.
#[derive(Clone, Debug)]
pub struct SchemaNode {
    pub(crate) kind: SchemaKind,
    pub(crate) parent: Option<SchemaNodeId>,
    pub(crate) children: Vec<SchemaNodeId>,
    pub(crate) attributes: IndexMap<SmolStr, SmolStr>,
    pub(crate) text: Option<SmolStr>,
}

impl SchemaNode {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: IndexMap::new(),
            text: None,
        }
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    pub fn parent(&self) -> Option<SchemaNodeId> {
        self.parent
    }

    pub fn children(&self) -> &[SchemaNodeId] {
        &self.children
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(SmolStr::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn name(&self) -> Option<&str> {
        self.attr(attr::NAME)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}
