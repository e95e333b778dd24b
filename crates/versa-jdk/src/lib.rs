//! Host-platform class lookup backed by a JDK installation.
//!
//! The JDK's standard library is read straight out of its class archives:
//! `jmods/*.jmod` on modular JDKs, `rt.jar` on Java 8 layouts. Archives are
//! listed lazily and parsed classes are memoized for the life of the index.

mod archive;
mod discovery;
mod index;
mod stub;

pub use discovery::{JdkDiscoveryError, JdkInstallation, JdkLayout};
pub use index::{JdkIndex, JdkIndexError};
pub use stub::{JdkClassStub, JdkMethodStub};
