//! Domain constants shared across the crate.

/// Namespace URI of XML Schema itself.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Prefix bound to [`XSD_NAMESPACE`] when a document declares none.
pub const XSD_PREFIX: &str = "xs";

/// Default value of `minOccurs` and `maxOccurs`.
pub const OCCURS_ONE: &str = "1";

/// `maxOccurs` value for an unbounded particle.
pub const UNBOUNDED: &str = "unbounded";

/// Attribute names that carry identity when comparing generated types.
pub const IDENTITY_ATTRIBUTES: [&str; 3] = ["id", "name", "ref"];

// ============================================================================
// ATTRIBUTE NAMES
// ============================================================================

pub mod attr {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const REF: &str = "ref";
    pub const BASE: &str = "base";
    pub const MIN_OCCURS: &str = "minOccurs";
    pub const MAX_OCCURS: &str = "maxOccurs";
    pub const FIXED: &str = "fixed";
    pub const DEFAULT: &str = "default";
    pub const NILLABLE: &str = "nillable";
    pub const ABSTRACT: &str = "abstract";
    pub const BLOCK: &str = "block";
    pub const FINAL: &str = "final";
    pub const FORM: &str = "form";
    pub const USE: &str = "use";
    pub const VALUE: &str = "value";
    pub const NAMESPACE: &str = "namespace";
    pub const PROCESS_CONTENTS: &str = "processContents";
    pub const SCHEMA_LOCATION: &str = "schemaLocation";
    pub const SUBSTITUTION_GROUP: &str = "substitutionGroup";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const ELEMENT_FORM_DEFAULT: &str = "elementFormDefault";
    pub const ATTRIBUTE_FORM_DEFAULT: &str = "attributeFormDefault";
    pub const VERSION: &str = "version";
    pub const ITEM_TYPE: &str = "itemType";
    pub const MEMBER_TYPES: &str = "memberTypes";
    pub const MIXED: &str = "mixed";
}
