#![forbid(unsafe_code)]

//! JVM type encodings and class files: descriptor and generic-signature
//! parsing/printing, structural transforms over them, a class-file reader and
//! a class-file writer for straight-line method bodies.

pub mod access;
mod classfile;
mod code;
mod constant_pool;
mod descriptor;
mod error;
mod mutf8;
mod reader;
mod signature;
mod transform;
mod writer;

pub use crate::classfile::{ClassFile, ClassMember, CodeInfo, InnerClassInfo, CLASSFILE_MAGIC};
pub use crate::code::{max_stack, Conversion, FieldRef, Instruction, MethodRef, ValueKind};
pub use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};
pub use crate::descriptor::{BaseType, FieldType, MethodDescriptor, ReturnType};
pub use crate::error::{Error, Result};
pub use crate::signature::{
    parse_class_signature, parse_class_signature_in_scope, parse_field_signature,
    parse_field_signature_in_scope, parse_method_signature, parse_method_signature_in_scope,
    ClassGenericType, ClassSignature, GenericReturnType, GenericType, MethodSignature,
    SimpleClassGenericType, TypeArgument, TypeArgumentDeclaration, TypeVariable, WildcardBound,
};
pub use crate::transform::{Erase, MapTypeVariables, Remap};
pub use crate::writer::{
    ClassWriter, ConstantPoolBuilder, FieldSpec, InnerClassEntry, MethodCode, MethodSpec,
    MAJOR_VERSION,
};
