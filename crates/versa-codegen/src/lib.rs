//! Generation of Java classes from a declarative class tree.
//!
//! A [`ClassInfo`] describes a class and carries callbacks that populate its
//! members and method bodies. [`describe_class`] runs those callbacks once,
//! synthesizes field initializers and rejects anything that cannot be
//! emitted. The resulting [`ClassDescription`] is consumed by one of two
//! backends: [`BytecodeGenerator`] writes class files, [`JavaSourceGenerator`]
//! writes Java source text. Both accept exactly the same trees.

mod builder;
mod bytecode;
mod describe;
mod ir;
mod java;
mod types;
mod typing;

use std::path::{Path, PathBuf};

use thiserror::Error;
use versa_classpath::ClasspathError;
use versa_core::PackageName;

pub use builder::{ClassBody, ClassBuilder, ClassInfo, MethodBody, MethodBuilder, MethodInfo, MethodModifiers};
pub use bytecode::BytecodeGenerator;
pub use describe::{
    describe_class, ClassDescription, FieldDescription, MethodDescription, MethodKind, CONSTRUCTOR_NAME,
    STATIC_INITIALIZER_NAME,
};
pub use ir::{BodyItem, Expression, Receiver, SelfConstructor, Statement};
pub use java::JavaSourceGenerator;
pub use types::{AnyJavaType, JavaAnnotation, JavaClassType, JavaReturnType, JavaType, Visibility};

#[derive(Debug, Error)]
pub enum CodegenError {
    /// The class tree asks for something that cannot be emitted.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("classpath error: {0}")]
    Classpath(#[from] ClasspathError),
    #[error("classfile error: {0}")]
    ClassFile(#[from] versa_classfile::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A backend writing generated classes below an output directory.
pub trait CodeGenerator {
    /// Lowers `info` and writes it, returning the files created.
    fn write_class(
        &self,
        info: ClassInfo,
        package: Option<&PackageName>,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, CodegenError> {
        let description = describe_class(info, package)?;
        self.write_description(&description, out_dir)
    }

    fn write_description(
        &self,
        description: &ClassDescription,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, CodegenError>;
}
