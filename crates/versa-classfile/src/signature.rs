//! Generic signatures (JVMS §4.7.9.1).
//!
//! Type-variable references carry the declaration they resolve to. The parser
//! resolves a reference against the innermost enclosing type-parameter list
//! (method, then class, then any caller-provided scope); self, forward and
//! unknown references get an unbounded declaration of the same name.

use std::fmt;
use std::sync::Arc;

use versa_core::{PackageName, QualifiedName, ShortClassName};

use crate::descriptor::{BaseType, FieldType, ReturnType};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericType {
    Primitive(BaseType),
    Class(ClassGenericType),
    Array(Box<GenericType>),
    TypeVariable(TypeVariable),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericReturnType {
    Void,
    Type(GenericType),
}

/// A class reference: package plus one segment per nesting level, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassGenericType {
    pub package: Option<PackageName>,
    pub segments: Vec<SimpleClassGenericType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleClassGenericType {
    /// One nesting level. Identifiers after a `.` in a signature are kept
    /// whole, so this may contain `$`.
    pub name: String,
    pub type_arguments: Option<Vec<TypeArgument>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeArgument {
    /// `*`
    Any,
    Specific {
        ty: GenericType,
        wildcard: Option<WildcardBound>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    /// `? extends T`
    Extends,
    /// `? super T`
    Super,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVariable {
    pub name: String,
    pub declaration: Arc<TypeArgumentDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeArgumentDeclaration {
    pub name: String,
    pub class_bound: Option<GenericType>,
    pub interface_bounds: Vec<GenericType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassSignature {
    pub type_parameters: Vec<Arc<TypeArgumentDeclaration>>,
    pub super_class: ClassGenericType,
    pub super_interfaces: Vec<ClassGenericType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub type_parameters: Vec<Arc<TypeArgumentDeclaration>>,
    pub parameters: Vec<GenericType>,
    pub return_type: GenericReturnType,
    pub throws: Vec<GenericType>,
}

impl GenericType {
    /// Raw (argument-free) reference to `name`.
    pub fn class(name: &QualifiedName) -> Self {
        GenericType::Class(ClassGenericType::raw(name))
    }

    pub fn array(component: GenericType) -> Self {
        GenericType::Array(Box::new(component))
    }

    /// True when the type mentions a parameterized class or a type variable,
    /// i.e. when it cannot be expressed by a descriptor alone.
    pub fn is_parameterized(&self) -> bool {
        match self {
            GenericType::Primitive(_) => false,
            GenericType::Class(class) => class.is_parameterized(),
            GenericType::Array(component) => component.is_parameterized(),
            GenericType::TypeVariable(_) => true,
        }
    }

    /// Every class name mentioned anywhere in the type, type arguments and
    /// type-variable bounds included, in encounter order.
    pub fn contained_classes(&self) -> Vec<QualifiedName> {
        let mut out = Vec::new();
        self.collect_classes(&mut out);
        out
    }

    pub(crate) fn collect_classes(&self, out: &mut Vec<QualifiedName>) {
        match self {
            GenericType::Primitive(_) => {}
            GenericType::Class(class) => class.collect_classes(out),
            GenericType::Array(component) => component.collect_classes(out),
            GenericType::TypeVariable(var) => var.declaration.collect_classes(out),
        }
    }
}

impl GenericReturnType {
    pub fn is_parameterized(&self) -> bool {
        match self {
            GenericReturnType::Void => false,
            GenericReturnType::Type(ty) => ty.is_parameterized(),
        }
    }

    pub fn contained_classes(&self) -> Vec<QualifiedName> {
        match self {
            GenericReturnType::Void => Vec::new(),
            GenericReturnType::Type(ty) => ty.contained_classes(),
        }
    }
}

impl From<GenericType> for GenericReturnType {
    fn from(value: GenericType) -> Self {
        GenericReturnType::Type(value)
    }
}

impl ClassGenericType {
    pub fn raw(name: &QualifiedName) -> Self {
        Self::from_name_and_type_args(name, Vec::new())
    }

    /// Reference to `name` with `type_arguments` on the innermost segment.
    /// An empty argument list produces a raw reference.
    pub fn from_name_and_type_args(name: &QualifiedName, type_arguments: Vec<TypeArgument>) -> Self {
        let components = name.short_name().components();
        let last = components.len() - 1;
        let mut type_arguments = Some(type_arguments).filter(|args| !args.is_empty());
        let segments = components
            .iter()
            .enumerate()
            .map(|(i, component)| SimpleClassGenericType {
                name: component.clone(),
                type_arguments: if i == last { type_arguments.take() } else { None },
            })
            .collect();
        Self {
            package: name.package().cloned(),
            segments,
        }
    }

    /// The erased class name.
    pub fn name(&self) -> QualifiedName {
        let components = self
            .segments
            .iter()
            .flat_map(|s| s.name.split('$'))
            .map(str::to_owned)
            .collect();
        let short_name = ShortClassName::from_components(components)
            .unwrap_or_else(|| ShortClassName::new(String::new()));
        QualifiedName::new(self.package.clone(), short_name)
    }

    /// The enclosing class reference (with whatever arguments it carries), or
    /// `None` for a top-level class.
    pub fn outer_class(&self) -> Option<ClassGenericType> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            package: self.package.clone(),
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn is_parameterized(&self) -> bool {
        self.segments.iter().any(|segment| {
            segment
                .type_arguments
                .as_ref()
                .is_some_and(|args| !args.is_empty())
        })
    }

    pub fn contained_classes(&self) -> Vec<QualifiedName> {
        let mut out = Vec::new();
        self.collect_classes(&mut out);
        out
    }

    fn collect_classes(&self, out: &mut Vec<QualifiedName>) {
        out.push(self.name());
        for args in self.segments.iter().filter_map(|s| s.type_arguments.as_ref()) {
            for arg in args {
                if let TypeArgument::Specific { ty, .. } = arg {
                    ty.collect_classes(out);
                }
            }
        }
    }
}

impl TypeArgument {
    pub fn exact(ty: GenericType) -> Self {
        TypeArgument::Specific { ty, wildcard: None }
    }
}

impl TypeVariable {
    pub fn new(declaration: Arc<TypeArgumentDeclaration>) -> Self {
        Self {
            name: declaration.name.clone(),
            declaration,
        }
    }

    /// Reference to an undeclared variable; erases to `java/lang/Object`.
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self::new(Arc::new(TypeArgumentDeclaration::unbounded(name)))
    }
}

impl TypeArgumentDeclaration {
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_bound: None,
            interface_bounds: Vec::new(),
        }
    }

    /// All bounds in declaration order, class bound first.
    pub fn bounds(&self) -> impl Iterator<Item = &GenericType> {
        self.class_bound.iter().chain(&self.interface_bounds)
    }

    pub fn is_parameterized(&self) -> bool {
        self.bounds().any(GenericType::is_parameterized)
    }

    /// `<K, V>` declarations become the `<K, V>` use-site arguments referring
    /// to them.
    pub fn as_type_arguments(declarations: &[Arc<TypeArgumentDeclaration>]) -> Vec<TypeArgument> {
        declarations
            .iter()
            .map(|decl| TypeArgument::exact(GenericType::TypeVariable(TypeVariable::new(decl.clone()))))
            .collect()
    }

    fn collect_classes(&self, out: &mut Vec<QualifiedName>) {
        for bound in self.bounds() {
            bound.collect_classes(out);
        }
    }
}

impl ClassSignature {
    pub fn is_parameterized(&self) -> bool {
        !self.type_parameters.is_empty()
            || self.super_class.is_parameterized()
            || self.super_interfaces.iter().any(ClassGenericType::is_parameterized)
    }
}

impl MethodSignature {
    pub fn is_parameterized(&self) -> bool {
        !self.type_parameters.is_empty()
            || self.parameters.iter().any(GenericType::is_parameterized)
            || self.return_type.is_parameterized()
            || self.throws.iter().any(GenericType::is_parameterized)
    }
}

impl FieldType {
    /// The same type as an argument-free generic type.
    pub fn to_generic(&self) -> GenericType {
        match self {
            FieldType::Base(base) => GenericType::Primitive(*base),
            FieldType::Object(name) => GenericType::class(name),
            FieldType::Array(component) => GenericType::array(component.to_generic()),
        }
    }
}

impl ReturnType {
    pub fn to_generic(&self) -> GenericReturnType {
        match self {
            ReturnType::Void => GenericReturnType::Void,
            ReturnType::Type(ty) => GenericReturnType::Type(ty.to_generic()),
        }
    }
}

impl From<&QualifiedName> for ClassGenericType {
    fn from(value: &QualifiedName) -> Self {
        ClassGenericType::raw(value)
    }
}

// --- printing ---------------------------------------------------------------

impl fmt::Display for GenericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenericType::Primitive(base) => write!(f, "{}", base.descriptor_char()),
            GenericType::Class(class) => class.fmt(f),
            GenericType::Array(component) => write!(f, "[{component}"),
            GenericType::TypeVariable(var) => write!(f, "T{};", var.name),
        }
    }
}

impl fmt::Display for GenericReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenericReturnType::Void => f.write_str("V"),
            GenericReturnType::Type(ty) => ty.fmt(f),
        }
    }
}

impl fmt::Display for ClassGenericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("L")?;
        if let Some(package) = &self.package {
            write!(f, "{}/", package.to_slashed())?;
        }
        // javac switches from `$` to `.` once an enclosing segment is parameterized.
        let mut seen_arguments = false;
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(if seen_arguments { "." } else { "$" })?;
            }
            f.write_str(&segment.name)?;
            if let Some(args) = segment.type_arguments.as_ref().filter(|a| !a.is_empty()) {
                seen_arguments = true;
                f.write_str("<")?;
                for arg in args {
                    arg.fmt(f)?;
                }
                f.write_str(">")?;
            }
        }
        f.write_str(";")
    }
}

impl fmt::Display for TypeArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArgument::Any => f.write_str("*"),
            TypeArgument::Specific { ty, wildcard } => {
                match wildcard {
                    Some(WildcardBound::Extends) => f.write_str("+")?,
                    Some(WildcardBound::Super) => f.write_str("-")?,
                    None => {}
                }
                ty.fmt(f)
            }
        }
    }
}

impl fmt::Display for TypeArgumentDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.name)?;
        if let Some(bound) = &self.class_bound {
            bound.fmt(f)?;
        }
        for bound in &self.interface_bounds {
            write!(f, ":{bound}")?;
        }
        Ok(())
    }
}

fn fmt_type_parameters(
    f: &mut fmt::Formatter<'_>,
    params: &[Arc<TypeArgumentDeclaration>],
) -> fmt::Result {
    if params.is_empty() {
        return Ok(());
    }
    f.write_str("<")?;
    for param in params {
        write!(f, "{param}")?;
    }
    f.write_str(">")
}

impl fmt::Display for ClassSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_type_parameters(f, &self.type_parameters)?;
        self.super_class.fmt(f)?;
        for interface in &self.super_interfaces {
            interface.fmt(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_type_parameters(f, &self.type_parameters)?;
        f.write_str("(")?;
        for param in &self.parameters {
            param.fmt(f)?;
        }
        f.write_str(")")?;
        self.return_type.fmt(f)?;
        for thrown in &self.throws {
            write!(f, "^{thrown}")?;
        }
        Ok(())
    }
}

// --- parsing ----------------------------------------------------------------

pub fn parse_class_signature(sig: &str) -> Result<ClassSignature> {
    parse_class_signature_in_scope(sig, &[])
}

pub fn parse_class_signature_in_scope(
    sig: &str,
    scope: &[Arc<TypeArgumentDeclaration>],
) -> Result<ClassSignature> {
    let mut parser = Parser::new(sig, scope);
    let type_parameters = parser.type_parameters()?;
    let super_class = parser.class_type()?;
    let mut super_interfaces = Vec::new();
    while !parser.at_end() {
        super_interfaces.push(parser.class_type()?);
    }
    Ok(ClassSignature {
        type_parameters,
        super_class,
        super_interfaces,
    })
}

pub fn parse_method_signature(sig: &str) -> Result<MethodSignature> {
    parse_method_signature_in_scope(sig, &[])
}

/// `scope` holds the declarations of the enclosing class (outermost first).
pub fn parse_method_signature_in_scope(
    sig: &str,
    scope: &[Arc<TypeArgumentDeclaration>],
) -> Result<MethodSignature> {
    let mut parser = Parser::new(sig, scope);
    let type_parameters = parser.type_parameters()?;
    parser.expect(b'(')?;
    let mut parameters = Vec::new();
    while !parser.eat(b')') {
        parameters.push(parser.java_type()?);
    }
    let return_type = if parser.eat(b'V') {
        GenericReturnType::Void
    } else {
        GenericReturnType::Type(parser.java_type()?)
    };
    let mut throws = Vec::new();
    while parser.eat(b'^') {
        throws.push(parser.reference_type()?);
    }
    parser.finish()?;
    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
        throws,
    })
}

/// Parses a field signature. Primitive types are accepted as well so that
/// erased descriptors can be lifted through the same entry point.
pub fn parse_field_signature(sig: &str) -> Result<GenericType> {
    parse_field_signature_in_scope(sig, &[])
}

pub fn parse_field_signature_in_scope(
    sig: &str,
    scope: &[Arc<TypeArgumentDeclaration>],
) -> Result<GenericType> {
    let mut parser = Parser::new(sig, scope);
    let ty = parser.java_type()?;
    parser.finish()?;
    Ok(ty)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    scope: Vec<Arc<TypeArgumentDeclaration>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, scope: &[Arc<TypeArgumentDeclaration>]) -> Self {
        Self {
            input,
            pos: 0,
            scope: scope.to_vec(),
        }
    }

    fn error(&self) -> Error {
        Error::InvalidSignature(self.input.to_owned())
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn finish(&self) -> Result<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn identifier(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'.' | b';' | b'[' | b'/' | b'<' | b'>' | b':') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error());
        }
        Ok(self.input[start..self.pos].to_owned())
    }

    fn type_parameters(&mut self) -> Result<Vec<Arc<TypeArgumentDeclaration>>> {
        let mut declared = Vec::new();
        if !self.eat(b'<') {
            return Ok(declared);
        }
        loop {
            let name = self.identifier()?;
            self.expect(b':')?;
            let class_bound = match self.peek() {
                Some(b'L' | b'T' | b'[') => Some(self.reference_type()?),
                _ => None,
            };
            let mut interface_bounds = Vec::new();
            while self.eat(b':') {
                interface_bounds.push(self.reference_type()?);
            }
            let decl = Arc::new(TypeArgumentDeclaration {
                name,
                class_bound,
                interface_bounds,
            });
            self.scope.push(decl.clone());
            declared.push(decl);
            if self.eat(b'>') {
                return Ok(declared);
            }
        }
    }

    fn java_type(&mut self) -> Result<GenericType> {
        if let Some(base) = self.peek().and_then(|b| BaseType::from_descriptor_char(b as char)) {
            self.pos += 1;
            return Ok(GenericType::Primitive(base));
        }
        self.reference_type()
    }

    fn reference_type(&mut self) -> Result<GenericType> {
        match self.peek() {
            Some(b'L') => Ok(GenericType::Class(self.class_type()?)),
            Some(b'T') => {
                self.pos += 1;
                let name = self.identifier()?;
                self.expect(b';')?;
                Ok(GenericType::TypeVariable(self.resolve(name)))
            }
            Some(b'[') => {
                self.pos += 1;
                Ok(GenericType::array(self.java_type()?))
            }
            _ => Err(self.error()),
        }
    }

    fn resolve(&self, name: String) -> TypeVariable {
        match self.scope.iter().rev().find(|decl| decl.name == name) {
            Some(decl) => TypeVariable::new(decl.clone()),
            None => TypeVariable::unbounded(name),
        }
    }

    fn class_type(&mut self) -> Result<ClassGenericType> {
        self.expect(b'L')?;
        let mut package = Vec::new();
        let mut name = self.identifier()?;
        while self.eat(b'/') {
            package.push(name);
            name = self.identifier()?;
        }

        // Before the first `.` the binary name spells out the nesting with `$`;
        // each identifier after a `.` is a single class, `$` included.
        let type_arguments = self.type_arguments()?;
        let mut parts: Vec<&str> = name.split('$').collect();
        let innermost = parts.pop().unwrap_or_default();
        let mut segments: Vec<SimpleClassGenericType> = parts
            .into_iter()
            .map(|part| SimpleClassGenericType {
                name: part.to_owned(),
                type_arguments: None,
            })
            .collect();
        segments.push(SimpleClassGenericType {
            name: innermost.to_owned(),
            type_arguments,
        });
        while self.eat(b'.') {
            let name = self.identifier()?;
            segments.push(SimpleClassGenericType {
                name,
                type_arguments: self.type_arguments()?,
            });
        }
        self.expect(b';')?;

        Ok(ClassGenericType {
            package: PackageName::new(package),
            segments,
        })
    }

    fn type_arguments(&mut self) -> Result<Option<Vec<TypeArgument>>> {
        if !self.eat(b'<') {
            return Ok(None);
        }
        let mut args = Vec::new();
        while !self.eat(b'>') {
            let arg = match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    TypeArgument::Any
                }
                Some(b'+') => {
                    self.pos += 1;
                    TypeArgument::Specific {
                        ty: self.reference_type()?,
                        wildcard: Some(WildcardBound::Extends),
                    }
                }
                Some(b'-') => {
                    self.pos += 1;
                    TypeArgument::Specific {
                        ty: self.reference_type()?,
                        wildcard: Some(WildcardBound::Super),
                    }
                }
                _ => TypeArgument::exact(self.reference_type()?),
            };
            args.push(arg);
        }
        if args.is_empty() {
            return Err(self.error());
        }
        Ok(Some(args))
    }
}
