//! Property-change events and the notification channel.
//!
//! Every mutation of an abstraction node produces a [`PropertyChange`].
//! Changes are published on the [`NotificationChannel`] for observers, and
//! user edits are additionally kept in the model's pending log until
//! `flush` turns them into update units.

use smol_str::SmolStr;

use super::component::{AttributeUse, AxiType, CompositorType, Form, ProcessContents};
use crate::base::AxiId;

/// Observable properties of abstraction nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Child list; old/new carry the removed/added component.
    Child,
    Name,
    MinOccurs,
    MaxOccurs,
    Fixed,
    Default,
    Nillable,
    Abstract,
    Form,
    Use,
    Type,
    /// Referent of a reference.
    Ref,
    CompositorType,
    ProcessContents,
    Namespace,
    SchemaLocation,
    TargetNamespace,
    ElementFormDefault,
    AttributeFormDefault,
    Version,
    /// Forced refresh of a delegating node whose shared node changed.
    Refresh,
}

impl Property {
    pub fn name(self) -> &'static str {
        match self {
            Self::Child => "child",
            Self::Name => "name",
            Self::MinOccurs => "minOccurs",
            Self::MaxOccurs => "maxOccurs",
            Self::Fixed => "fixed",
            Self::Default => "default",
            Self::Nillable => "nillable",
            Self::Abstract => "abstract",
            Self::Form => "form",
            Self::Use => "use",
            Self::Type => "type",
            Self::Ref => "ref",
            Self::CompositorType => "compositorType",
            Self::ProcessContents => "processContents",
            Self::Namespace => "namespace",
            Self::SchemaLocation => "schemaLocation",
            Self::TargetNamespace => "targetNamespace",
            Self::ElementFormDefault => "elementFormDefault",
            Self::AttributeFormDefault => "attributeFormDefault",
            Self::Version => "version",
            Self::Refresh => "refresh",
        }
    }
}

/// A property value carried by change events.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(SmolStr),
    Bool(bool),
    Form(Form),
    Use(AttributeUse),
    Compositor(CompositorType),
    ProcessContents(ProcessContents),
    /// An abstraction node (child events, reference targets).
    Component(AxiId),
    Type(AxiType),
}

impl PropertyValue {
    pub fn as_component(&self) -> Option<AxiId> {
        match self {
            Self::Component(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&AxiType> {
        match self {
            Self::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_component(&self) -> bool {
        matches!(self, Self::Component(_))
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(SmolStr::new(s))
    }
}

impl From<SmolStr> for PropertyValue {
    fn from(s: SmolStr) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Form> for PropertyValue {
    fn from(f: Form) -> Self {
        Self::Form(f)
    }
}

impl From<AttributeUse> for PropertyValue {
    fn from(u: AttributeUse) -> Self {
        Self::Use(u)
    }
}

impl From<CompositorType> for PropertyValue {
    fn from(c: CompositorType) -> Self {
        Self::Compositor(c)
    }
}

impl From<ProcessContents> for PropertyValue {
    fn from(p: ProcessContents) -> Self {
        Self::ProcessContents(p)
    }
}

impl From<AxiType> for PropertyValue {
    fn from(t: AxiType) -> Self {
        Self::Type(t)
    }
}

/// One observed change.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    pub source: AxiId,
    pub property: Property,
    pub old: Option<PropertyValue>,
    pub new: Option<PropertyValue>,
}

impl PropertyChange {
    pub fn new(
        source: AxiId,
        property: Property,
        old: Option<PropertyValue>,
        new: Option<PropertyValue>,
    ) -> Self {
        Self {
            source,
            property,
            old,
            new,
        }
    }

    pub fn refresh(source: AxiId) -> Self {
        Self::new(source, Property::Refresh, None, None)
    }
}

/// Queue of notifications waiting for observers.
#[derive(Clone, Debug, Default)]
pub struct NotificationChannel {
    queue: Vec<PropertyChange>,
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, change: PropertyChange) {
        self.queue.push(change);
    }

    /// Hand every queued notification to the caller.
    pub fn drain(&mut self) -> Vec<PropertyChange> {
        std::mem::take(&mut self.queue)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
