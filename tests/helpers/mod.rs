//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod schema_fixtures;
pub mod tree_assertions;
