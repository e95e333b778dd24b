//! Erased JVM types (JVMS §4.3).
//!
//! Every type prints to its canonical descriptor encoding through `Display`,
//! and equality/hashing are defined on that encoding.

use std::fmt;
use std::hash::{Hash, Hasher};

use versa_core::QualifiedName;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    pub const ALL: [BaseType; 8] = [
        BaseType::Byte,
        BaseType::Char,
        BaseType::Double,
        BaseType::Float,
        BaseType::Int,
        BaseType::Long,
        BaseType::Short,
        BaseType::Boolean,
    ];

    pub fn descriptor_char(self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        }
    }

    pub fn from_descriptor_char(c: char) -> Option<Self> {
        Some(match c {
            'B' => BaseType::Byte,
            'C' => BaseType::Char,
            'D' => BaseType::Double,
            'F' => BaseType::Float,
            'I' => BaseType::Int,
            'J' => BaseType::Long,
            'S' => BaseType::Short,
            'Z' => BaseType::Boolean,
            _ => return None,
        })
    }

    pub fn java_name(self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
        }
    }

    /// `long` and `double` take two stack/local slots.
    pub fn is_wide(self) -> bool {
        matches!(self, BaseType::Long | BaseType::Double)
    }
}

#[derive(Debug, Clone)]
pub enum FieldType {
    Base(BaseType),
    Object(QualifiedName),
    Array(Box<FieldType>),
}

impl FieldType {
    /// Object type from an internal name (`java/lang/String`).
    pub fn object(internal_name: &str) -> Self {
        FieldType::Object(QualifiedName::from_slash_qualified(internal_name))
    }

    pub fn array(component: FieldType) -> Self {
        FieldType::Array(Box::new(component))
    }

    pub fn is_reference(&self) -> bool {
        !matches!(self, FieldType::Base(_))
    }

    /// Number of local-variable / operand-stack slots a value of this type uses.
    pub fn slot_size(&self) -> u16 {
        match self {
            FieldType::Base(base) if base.is_wide() => 2,
            _ => 1,
        }
    }

    /// The name a `CONSTANT_Class` entry uses for this type: the internal
    /// name for classes, the full descriptor for arrays.
    pub fn class_constant_name(&self) -> Option<String> {
        match self {
            FieldType::Base(_) => None,
            FieldType::Object(name) => Some(name.to_slash_qualified()),
            FieldType::Array(_) => Some(self.to_string()),
        }
    }

    /// Java-source-like rendering (`java.lang.String[]`), used in messages.
    pub fn java_name(&self) -> String {
        match self {
            FieldType::Base(base) => base.java_name().to_owned(),
            FieldType::Object(name) => name.to_source_name(),
            FieldType::Array(component) => format!("{}[]", component.java_name()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Base(base) => write!(f, "{}", base.descriptor_char()),
            FieldType::Object(name) => write!(f, "L{};", name.to_slash_qualified()),
            FieldType::Array(component) => write!(f, "[{component}"),
        }
    }
}

impl PartialEq for FieldType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldType::Base(a), FieldType::Base(b)) => a == b,
            (FieldType::Object(a), FieldType::Object(b)) => {
                a.to_slash_qualified() == b.to_slash_qualified()
            }
            (FieldType::Array(a), FieldType::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FieldType {}

impl Hash for FieldType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl From<BaseType> for FieldType {
    fn from(value: BaseType) -> Self {
        FieldType::Base(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Void,
    Type(FieldType),
}

impl ReturnType {
    pub fn slot_size(&self) -> u16 {
        match self {
            ReturnType::Void => 0,
            ReturnType::Type(ty) => ty.slot_size(),
        }
    }

    pub fn java_name(&self) -> String {
        match self {
            ReturnType::Void => "void".to_owned(),
            ReturnType::Type(ty) => ty.java_name(),
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Void => f.write_str("V"),
            ReturnType::Type(ty) => ty.fmt(f),
        }
    }
}

impl From<FieldType> for ReturnType {
    fn from(value: FieldType) -> Self {
        ReturnType::Type(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    pub return_type: ReturnType,
}

impl MethodDescriptor {
    pub fn new(params: Vec<FieldType>, return_type: ReturnType) -> Self {
        Self {
            params,
            return_type,
        }
    }

    /// Slots taken by the parameters (excluding any receiver).
    pub fn parameter_slots(&self) -> u16 {
        self.params.iter().map(FieldType::slot_size).sum()
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for param in &self.params {
            param.fmt(f)?;
        }
        f.write_str(")")?;
        self.return_type.fmt(f)
    }
}

pub fn parse_field_descriptor(desc: &str) -> Result<FieldType> {
    let mut chars = desc.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(base) = BaseType::from_descriptor_char(c) {
            return Ok(FieldType::Base(base));
        }
    }

    if let Some(component) = desc.strip_prefix('[') {
        let component = parse_field_descriptor(component)
            .map_err(|_| Error::InvalidDescriptor(desc.to_owned()))?;
        return Ok(FieldType::array(component));
    }

    let interior = desc
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
        .ok_or_else(|| Error::InvalidDescriptor(desc.to_owned()))?;
    if interior.is_empty() || interior.contains([';', '[', '.', '<', '>']) {
        return Err(Error::InvalidDescriptor(desc.to_owned()));
    }
    Ok(FieldType::object(interior))
}

pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor> {
    let malformed = || Error::InvalidDescriptor(desc.to_owned());
    if !desc.starts_with('(') {
        return Err(malformed());
    }

    let mut params = Vec::new();
    let mut param_start = 1usize;
    let mut end = None;
    let mut in_class_name = false;

    for (i, c) in desc.char_indices().skip(1) {
        let mut terminated = false;
        if in_class_name {
            if c == ';' {
                terminated = true;
                in_class_name = false;
            }
        } else if c == 'L' {
            in_class_name = true;
        } else if c == ')' {
            if param_start != i {
                return Err(malformed());
            }
            end = Some(i);
            break;
        } else if BaseType::from_descriptor_char(c).is_some() {
            terminated = true;
        }

        if terminated {
            params.push(parse_field_descriptor(&desc[param_start..=i])?);
            param_start = i + 1;
        }
    }

    let end = end.ok_or_else(malformed)?;
    let return_part = &desc[end + 1..];
    if return_part.is_empty() {
        return Err(malformed());
    }
    let return_type = if return_part == "V" {
        ReturnType::Void
    } else {
        ReturnType::Type(parse_field_descriptor(return_part)?)
    };

    Ok(MethodDescriptor {
        params,
        return_type,
    })
}
