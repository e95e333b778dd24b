use crate::access::{ACC_ABSTRACT, ACC_INTERFACE, ACC_STATIC};
use crate::constant_pool::ConstantPool;
use crate::error::{Error, Result};
use crate::reader::Reader;

pub const CLASSFILE_MAGIC: u32 = 0xCAFEBABE;

/// A parsed class file, reduced to the structure the rest of the workspace
/// inspects. Annotations are kept as their type descriptors only.
#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<ClassMember>,
    pub methods: Vec<ClassMember>,
    pub signature: Option<String>,
    pub source_file: Option<String>,
    pub runtime_visible_annotations: Vec<String>,
    pub inner_classes: Vec<InnerClassInfo>,
}

#[derive(Debug, Clone)]
pub struct ClassMember {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
    pub runtime_visible_annotations: Vec<String>,
    pub runtime_visible_parameter_annotations: Vec<Vec<String>>,
    pub code: Option<CodeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeInfo {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassInfo {
    pub inner_class: String,
    pub outer_class: Option<String>,
    pub inner_name: Option<String>,
    pub access_flags: u16,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != CLASSFILE_MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let cp = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u2()?;
        let this_class = cp.get_class_name(reader.read_u2()?)?;
        let super_class_idx = reader.read_u2()?;
        let super_class = if super_class_idx == 0 {
            None
        } else {
            Some(cp.get_class_name(super_class_idx)?)
        };

        let interfaces_count = reader.read_u2()? as usize;
        let mut interfaces = Vec::with_capacity(interfaces_count);
        for _ in 0..interfaces_count {
            interfaces.push(cp.get_class_name(reader.read_u2()?)?);
        }

        let fields_count = reader.read_u2()? as usize;
        let mut fields = Vec::with_capacity(fields_count);
        for _ in 0..fields_count {
            fields.push(parse_member(&mut reader, &cp)?);
        }

        let methods_count = reader.read_u2()? as usize;
        let mut methods = Vec::with_capacity(methods_count);
        for _ in 0..methods_count {
            methods.push(parse_member(&mut reader, &cp)?);
        }

        let class_attrs = parse_attributes(&mut reader, &cp)?;

        reader.ensure_empty()?;

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            signature: class_attrs.signature,
            source_file: class_attrs.source_file,
            runtime_visible_annotations: class_attrs.runtime_visible_annotations,
            inner_classes: class_attrs.inner_classes,
        })
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & ACC_INTERFACE != 0
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags & ACC_ABSTRACT != 0
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&ClassMember> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn field(&self, name: &str) -> Option<&ClassMember> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl ClassMember {
    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }
}

fn parse_member(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<ClassMember> {
    let access_flags = reader.read_u2()?;
    let name = cp.get_utf8(reader.read_u2()?)?.to_string();
    let descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();

    let attrs = parse_attributes(reader, cp)?;
    Ok(ClassMember {
        access_flags,
        name,
        descriptor,
        signature: attrs.signature,
        exceptions: attrs.exceptions,
        runtime_visible_annotations: attrs.runtime_visible_annotations,
        runtime_visible_parameter_annotations: attrs.runtime_visible_parameter_annotations,
        code: attrs.code,
    })
}

#[derive(Default)]
struct ParsedAttributes {
    signature: Option<String>,
    source_file: Option<String>,
    exceptions: Vec<String>,
    runtime_visible_annotations: Vec<String>,
    runtime_visible_parameter_annotations: Vec<Vec<String>>,
    inner_classes: Vec<InnerClassInfo>,
    code: Option<CodeInfo>,
}

fn parse_attributes(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<ParsedAttributes> {
    let attributes_count = reader.read_u2()? as usize;
    let mut parsed = ParsedAttributes::default();
    for _ in 0..attributes_count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        let info = reader.read_bytes(length)?;
        let name = cp.get_utf8(name_index)?;

        let mut sub = Reader::new(info);
        match name {
            "Signature" => {
                parsed.signature = Some(cp.get_utf8(sub.read_u2()?)?.to_string());
                sub.ensure_empty()?;
            }
            "SourceFile" => {
                parsed.source_file = Some(cp.get_utf8(sub.read_u2()?)?.to_string());
                sub.ensure_empty()?;
            }
            "Exceptions" => {
                let num = sub.read_u2()? as usize;
                for _ in 0..num {
                    parsed.exceptions.push(cp.get_class_name(sub.read_u2()?)?);
                }
                sub.ensure_empty()?;
            }
            "RuntimeVisibleAnnotations" => {
                parsed.runtime_visible_annotations = parse_annotations(&mut sub, cp)?;
                sub.ensure_empty()?;
            }
            "RuntimeVisibleParameterAnnotations" => {
                let num_parameters = sub.read_u1()? as usize;
                let mut parameters = Vec::with_capacity(num_parameters);
                for _ in 0..num_parameters {
                    parameters.push(parse_annotations(&mut sub, cp)?);
                }
                parsed.runtime_visible_parameter_annotations = parameters;
                sub.ensure_empty()?;
            }
            "InnerClasses" => {
                let num = sub.read_u2()? as usize;
                for _ in 0..num {
                    let inner_class_info_index = sub.read_u2()?;
                    let outer_class_info_index = sub.read_u2()?;
                    let inner_name_index = sub.read_u2()?;
                    let access_flags = sub.read_u2()?;

                    let inner_class = cp.get_class_name(inner_class_info_index)?;
                    let outer_class = if outer_class_info_index == 0 {
                        None
                    } else {
                        Some(cp.get_class_name(outer_class_info_index)?)
                    };
                    let inner_name = if inner_name_index == 0 {
                        None
                    } else {
                        Some(cp.get_utf8(inner_name_index)?.to_string())
                    };

                    parsed.inner_classes.push(InnerClassInfo {
                        inner_class,
                        outer_class,
                        inner_name,
                        access_flags,
                    });
                }
                sub.ensure_empty()?;
            }
            "Code" => {
                let max_stack = sub.read_u2()?;
                let max_locals = sub.read_u2()?;
                let code_length = sub.read_u4()? as usize;
                let code = sub.read_bytes(code_length)?.to_vec();
                let exception_table_length = sub.read_u2()? as usize;
                sub.read_bytes(exception_table_length * 8)?;
                // Nested attributes (LineNumberTable, StackMapTable, ...) are not needed.
                let nested = sub.read_u2()?;
                for _ in 0..nested {
                    sub.read_u2()?;
                    let len = sub.read_u4()? as usize;
                    sub.read_bytes(len)?;
                }
                sub.ensure_empty()
                    .map_err(|_| Error::MalformedAttribute("Code"))?;
                parsed.code = Some(CodeInfo {
                    max_stack,
                    max_locals,
                    code,
                });
            }
            _ => {
                // Unknown attribute: intentionally skipped.
            }
        }
    }

    Ok(parsed)
}

fn parse_annotations(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Vec<String>> {
    let num = reader.read_u2()? as usize;
    let mut out = Vec::with_capacity(num);
    for _ in 0..num {
        out.push(parse_annotation(reader, cp)?);
    }
    Ok(out)
}

fn parse_annotation(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<String> {
    let type_descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
    let pairs = reader.read_u2()?;
    for _ in 0..pairs {
        reader.read_u2()?;
        skip_element_value(reader, cp)?;
    }
    Ok(type_descriptor)
}

fn skip_element_value(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<()> {
    match reader.read_u1()? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' => {
            reader.read_u2()?;
        }
        b'e' => {
            reader.read_u2()?;
            reader.read_u2()?;
        }
        b'@' => {
            parse_annotation(reader, cp)?;
        }
        b'[' => {
            let len = reader.read_u2()?;
            for _ in 0..len {
                skip_element_value(reader, cp)?;
            }
        }
        _ => return Err(Error::MalformedAttribute("RuntimeVisibleAnnotations")),
    }
    Ok(())
}
