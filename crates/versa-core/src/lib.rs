//! Core shared types for versa.
//!
//! This crate is intentionally small and dependency-free: it only models JVM
//! class names, which every other crate speaks in.

mod name;

pub use name::{PackageName, QualifiedName, ShortClassName};

/// Internal name of the root of every JVM class hierarchy.
pub const JAVA_LANG_OBJECT: &str = "java/lang/Object";
