//! Generator tests
//!
//! - Incremental `flush` of recorded tree edits
//! - Whole-document transforms between design patterns
//! - Pattern inference and pre-flight advice

pub mod tests_flush;
pub mod tests_patterns;
pub mod tests_transform;
