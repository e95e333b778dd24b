//! Class hierarchy and method lookups over a set of classpath roots.
//!
//! Roots (class directories, jars, zips and jmods) are scanned eagerly when the
//! index is built. Classes of the host platform's standard library (`java.*`)
//! are not expected on the classpath; they are resolved on demand through a
//! [`HostPlatform`] and cached for the lifetime of the index.

mod entry;
mod index;
mod scan;

use std::path::PathBuf;

use thiserror::Error;
use versa_core::QualifiedName;

pub use entry::{ClassEntry, MethodEntry, MethodIdentifier};
pub use index::{ClasspathIndex, HostPlatform};

#[derive(Debug, Error)]
pub enum ClasspathError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("classfile error: {0}")]
    ClassFile(#[from] versa_classfile::Error),
    #[error("jdk error: {0}")]
    Jdk(#[from] versa_jdk::JdkIndexError),
    #[error("class `{name}` is not on the classpath")]
    UnresolvedClass { name: QualifiedName },
    #[error("classpath root `{}` is neither a directory nor a jar, zip or jmod archive", path.display())]
    UnsupportedRoot { path: PathBuf },
}
