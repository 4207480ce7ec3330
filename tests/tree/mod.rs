//! Abstraction tree tests: references, proxies and imported globals.

pub mod tests_cross_document;
pub mod tests_references;
