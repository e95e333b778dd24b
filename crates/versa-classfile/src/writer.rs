//! Class-file serialization (class-file version 52, Java 8).

use std::collections::HashMap;

use crate::classfile::CLASSFILE_MAGIC;
use crate::code::{max_stack, FieldRef, Instruction, MethodRef};
use crate::descriptor::{FieldType, MethodDescriptor};
use crate::error::{Error, Result};
use crate::mutf8;

pub const MAJOR_VERSION: u16 = 52;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PoolKey {
    Utf8(String),
    Class(String),
    NameAndType(String, String),
    Fieldref(String, String, String),
    Methodref(String, String, String),
    InterfaceMethodref(String, String, String),
}

/// Deduplicating constant-pool builder.
#[derive(Debug, Default)]
pub struct ConstantPoolBuilder {
    bytes: Vec<u8>,
    indices: HashMap<PoolKey, u16>,
    len: u16,
}

impl ConstantPoolBuilder {
    fn intern(&mut self, key: PoolKey, encode: impl FnOnce(&mut Self) -> Result<Vec<u8>>) -> Result<u16> {
        if let Some(&index) = self.indices.get(&key) {
            return Ok(index);
        }
        let encoded = encode(self)?;
        if self.len >= u16::MAX - 1 {
            return Err(Error::ConstantPoolOverflow);
        }
        self.len += 1;
        let index = self.len;
        self.bytes.extend_from_slice(&encoded);
        self.indices.insert(key, index);
        Ok(index)
    }

    pub fn utf8(&mut self, value: &str) -> Result<u16> {
        self.intern(PoolKey::Utf8(value.to_owned()), |_| {
            let data = mutf8::encode(value);
            let len = u16::try_from(data.len()).map_err(|_| Error::ConstantPoolOverflow)?;
            let mut out = vec![1];
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(&data);
            Ok(out)
        })
    }

    /// `CONSTANT_Class` for an internal name or an array descriptor.
    pub fn class(&mut self, name: &str) -> Result<u16> {
        self.intern(PoolKey::Class(name.to_owned()), |cp| {
            let name_index = cp.utf8(name)?;
            Ok(tagged(7, &[name_index]))
        })
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        self.intern(
            PoolKey::NameAndType(name.to_owned(), descriptor.to_owned()),
            |cp| {
                let name_index = cp.utf8(name)?;
                let descriptor_index = cp.utf8(descriptor)?;
                Ok(tagged(12, &[name_index, descriptor_index]))
            },
        )
    }

    pub fn field_ref(&mut self, field: &FieldRef) -> Result<u16> {
        let descriptor = field.field_type.to_string();
        let key = PoolKey::Fieldref(field.owner.clone(), field.name.clone(), descriptor.clone());
        self.intern(key, |cp| {
            let class_index = cp.class(&field.owner)?;
            let nat_index = cp.name_and_type(&field.name, &descriptor)?;
            Ok(tagged(9, &[class_index, nat_index]))
        })
    }

    pub fn method_ref(&mut self, method: &MethodRef, interface: bool) -> Result<u16> {
        let descriptor = method.descriptor.to_string();
        let parts = (method.owner.clone(), method.name.clone(), descriptor.clone());
        let (key, tag) = if interface {
            (PoolKey::InterfaceMethodref(parts.0, parts.1, parts.2), 11)
        } else {
            (PoolKey::Methodref(parts.0, parts.1, parts.2), 10)
        };
        self.intern(key, |cp| {
            let class_index = cp.class(&method.owner)?;
            let nat_index = cp.name_and_type(&method.name, &descriptor)?;
            Ok(tagged(tag, &[class_index, nat_index]))
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.len + 1).to_be_bytes());
        out.extend_from_slice(&self.bytes);
    }
}

fn tagged(tag: u8, operands: &[u16]) -> Vec<u8> {
    let mut out = vec![tag];
    for operand in operands {
        out.extend_from_slice(&operand.to_be_bytes());
    }
    out
}

/// Field declaration handed to [`ClassWriter::write_field`].
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: FieldType,
    pub signature: Option<String>,
    pub annotations: Vec<String>,
}

/// Method declaration handed to [`ClassWriter::write_method`]. Abstract
/// methods carry no `code`.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: MethodDescriptor,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
    pub annotations: Vec<String>,
    pub parameter_annotations: Vec<Vec<String>>,
    pub code: Option<MethodCode>,
}

#[derive(Debug, Clone)]
pub struct MethodCode {
    pub max_locals: u16,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassEntry {
    pub inner_class: String,
    pub outer_class: Option<String>,
    pub inner_name: Option<String>,
    pub access_flags: u16,
}

#[derive(Debug)]
pub struct ClassWriter {
    cp: ConstantPoolBuilder,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<u8>,
    field_count: u16,
    methods: Vec<u8>,
    method_count: u16,
    signature: Option<u16>,
    source_file: Option<u16>,
    annotations: Vec<String>,
    inner_classes: Vec<InnerClassEntry>,
}

impl ClassWriter {
    /// `super_class` is `None` only for `java/lang/Object` itself.
    pub fn new(
        access_flags: u16,
        name: &str,
        super_class: Option<&str>,
        interfaces: &[String],
    ) -> Result<Self> {
        let mut cp = ConstantPoolBuilder::default();
        let this_class = cp.class(name)?;
        let super_class = match super_class {
            Some(super_class) => cp.class(super_class)?,
            None => 0,
        };
        let interfaces = interfaces
            .iter()
            .map(|interface| cp.class(interface))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            cp,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields: Vec::new(),
            field_count: 0,
            methods: Vec::new(),
            method_count: 0,
            signature: None,
            source_file: None,
            annotations: Vec::new(),
            inner_classes: Vec::new(),
        })
    }

    pub fn set_signature(&mut self, signature: &str) -> Result<()> {
        self.signature = Some(self.cp.utf8(signature)?);
        Ok(())
    }

    pub fn set_source_file(&mut self, source_file: &str) -> Result<()> {
        self.source_file = Some(self.cp.utf8(source_file)?);
        Ok(())
    }

    /// Adds a runtime-visible, element-less annotation of the given type descriptor.
    pub fn add_annotation(&mut self, type_descriptor: impl Into<String>) {
        self.annotations.push(type_descriptor.into());
    }

    /// Registers a nesting relationship; repeated entries are written once.
    pub fn track_inner_class(&mut self, entry: InnerClassEntry) {
        if !self.inner_classes.contains(&entry) {
            self.inner_classes.push(entry);
        }
    }

    pub fn write_field(&mut self, field: &FieldSpec) -> Result<()> {
        let mut out = Vec::new();
        out.extend_from_slice(&field.access_flags.to_be_bytes());
        out.extend_from_slice(&self.cp.utf8(&field.name)?.to_be_bytes());
        out.extend_from_slice(&self.cp.utf8(&field.descriptor.to_string())?.to_be_bytes());

        let mut attributes = Vec::new();
        if let Some(signature) = &field.signature {
            attributes.push(self.signature_attribute(signature)?);
        }
        if !field.annotations.is_empty() {
            attributes.push(self.annotations_attribute(&field.annotations)?);
        }
        write_attributes(&mut out, &attributes)?;

        self.fields.extend_from_slice(&out);
        self.field_count = self
            .field_count
            .checked_add(1)
            .ok_or(Error::TableOverflow("field"))?;
        Ok(())
    }

    pub fn write_method(&mut self, method: &MethodSpec) -> Result<()> {
        let mut out = Vec::new();
        out.extend_from_slice(&method.access_flags.to_be_bytes());
        out.extend_from_slice(&self.cp.utf8(&method.name)?.to_be_bytes());
        out.extend_from_slice(&self.cp.utf8(&method.descriptor.to_string())?.to_be_bytes());

        let mut attributes = Vec::new();
        if let Some(code) = &method.code {
            attributes.push(self.code_attribute(&method.name, code)?);
        }
        if !method.exceptions.is_empty() {
            let mut data = Vec::new();
            data.extend_from_slice(&u16_len(method.exceptions.len(), "exception")?.to_be_bytes());
            for exception in &method.exceptions {
                data.extend_from_slice(&self.cp.class(exception)?.to_be_bytes());
            }
            attributes.push((self.cp.utf8("Exceptions")?, data));
        }
        if let Some(signature) = &method.signature {
            attributes.push(self.signature_attribute(signature)?);
        }
        if !method.annotations.is_empty() {
            attributes.push(self.annotations_attribute(&method.annotations)?);
        }
        if method.parameter_annotations.iter().any(|a| !a.is_empty()) {
            let parameters = u8::try_from(method.parameter_annotations.len())
                .map_err(|_| Error::TableOverflow("annotated parameter"))?;
            let mut data = vec![parameters];
            for annotations in &method.parameter_annotations {
                self.encode_annotations(&mut data, annotations)?;
            }
            attributes.push((self.cp.utf8("RuntimeVisibleParameterAnnotations")?, data));
        }
        write_attributes(&mut out, &attributes)?;

        self.methods.extend_from_slice(&out);
        self.method_count = self
            .method_count
            .checked_add(1)
            .ok_or(Error::TableOverflow("method"))?;
        Ok(())
    }

    fn code_attribute(&mut self, method: &str, code: &MethodCode) -> Result<(u16, Vec<u8>)> {
        let mut bytecode = Vec::new();
        for instruction in &code.instructions {
            instruction.encode(&mut self.cp, &mut bytecode)?;
        }
        if bytecode.len() > u16::MAX as usize {
            return Err(Error::CodeTooLarge {
                method: method.to_owned(),
                what: "bytecode",
            });
        }

        let mut data = Vec::new();
        data.extend_from_slice(&max_stack(&code.instructions).to_be_bytes());
        data.extend_from_slice(&code.max_locals.to_be_bytes());
        data.extend_from_slice(&(bytecode.len() as u32).to_be_bytes());
        data.extend_from_slice(&bytecode);
        // exception_table_length, attributes_count
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        Ok((self.cp.utf8("Code")?, data))
    }

    fn signature_attribute(&mut self, signature: &str) -> Result<(u16, Vec<u8>)> {
        let index = self.cp.utf8(signature)?;
        Ok((self.cp.utf8("Signature")?, index.to_be_bytes().to_vec()))
    }

    fn annotations_attribute(&mut self, annotations: &[String]) -> Result<(u16, Vec<u8>)> {
        let mut data = Vec::new();
        self.encode_annotations(&mut data, annotations)?;
        Ok((self.cp.utf8("RuntimeVisibleAnnotations")?, data))
    }

    fn encode_annotations(&mut self, out: &mut Vec<u8>, annotations: &[String]) -> Result<()> {
        out.extend_from_slice(&u16_len(annotations.len(), "annotation")?.to_be_bytes());
        for annotation in annotations {
            out.extend_from_slice(&self.cp.utf8(annotation)?.to_be_bytes());
            // num_element_value_pairs
            out.extend_from_slice(&0u16.to_be_bytes());
        }
        Ok(())
    }

    pub fn to_bytes(mut self) -> Result<Vec<u8>> {
        let mut attributes = Vec::new();
        if let Some(index) = self.source_file {
            attributes.push((self.cp.utf8("SourceFile")?, index.to_be_bytes().to_vec()));
        }
        if let Some(index) = self.signature {
            attributes.push((self.cp.utf8("Signature")?, index.to_be_bytes().to_vec()));
        }
        if !self.annotations.is_empty() {
            let annotations = std::mem::take(&mut self.annotations);
            attributes.push(self.annotations_attribute(&annotations)?);
        }
        if !self.inner_classes.is_empty() {
            let inner_classes = std::mem::take(&mut self.inner_classes);
            let mut data = Vec::new();
            data.extend_from_slice(&u16_len(inner_classes.len(), "inner class")?.to_be_bytes());
            for entry in &inner_classes {
                let inner = self.cp.class(&entry.inner_class)?;
                let outer = match &entry.outer_class {
                    Some(outer) => self.cp.class(outer)?,
                    None => 0,
                };
                let name = match &entry.inner_name {
                    Some(name) => self.cp.utf8(name)?,
                    None => 0,
                };
                for value in [inner, outer, name, entry.access_flags] {
                    data.extend_from_slice(&value.to_be_bytes());
                }
            }
            attributes.push((self.cp.utf8("InnerClasses")?, data));
        }

        let mut out = Vec::new();
        out.extend_from_slice(&CLASSFILE_MAGIC.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&MAJOR_VERSION.to_be_bytes());
        self.cp.write(&mut out);
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&u16_len(self.interfaces.len(), "interface")?.to_be_bytes());
        for interface in &self.interfaces {
            out.extend_from_slice(&interface.to_be_bytes());
        }
        out.extend_from_slice(&self.field_count.to_be_bytes());
        out.extend_from_slice(&self.fields);
        out.extend_from_slice(&self.method_count.to_be_bytes());
        out.extend_from_slice(&self.methods);
        write_attributes(&mut out, &attributes)?;
        Ok(out)
    }
}

fn u16_len(len: usize, what: &'static str) -> Result<u16> {
    u16::try_from(len).map_err(|_| Error::TableOverflow(what))
}

fn write_attributes(out: &mut Vec<u8>, attributes: &[(u16, Vec<u8>)]) -> Result<()> {
    out.extend_from_slice(&u16_len(attributes.len(), "attribute")?.to_be_bytes());
    for (name_index, data) in attributes {
        let len = u32::try_from(data.len()).map_err(|_| Error::TableOverflow("attribute byte"))?;
        out.extend_from_slice(&name_index.to_be_bytes());
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(data);
    }
    Ok(())
}
