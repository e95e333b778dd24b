//! Java source backend.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use versa_classfile::{
    ClassGenericType, Erase, GenericReturnType, GenericType, TypeArgument, TypeArgumentDeclaration,
    WildcardBound,
};
use versa_core::{PackageName, QualifiedName, ShortClassName};

use crate::describe::{ClassDescription, MethodDescription, MethodKind};
use crate::ir::{BodyItem, Expression, Receiver, SelfConstructor, Statement};
use crate::types::{AnyJavaType, JavaAnnotation};
use crate::{CodeGenerator, CodegenError};

const INDENT: &str = "    ";

/// Renders one `.java` file per top-level class; nested classes are written
/// inside their outer class.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaSourceGenerator;

impl JavaSourceGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, description: &ClassDescription) -> String {
        let imports = Imports::collect(description);
        let mut out = String::new();
        if let Some(package) = description.name.package() {
            out.push_str(&format!("package {};\n\n", package.to_dotted()));
        }
        let import_lines = imports.import_lines();
        if !import_lines.is_empty() {
            for line in import_lines {
                out.push_str(&line);
                out.push('\n');
            }
            out.push('\n');
        }
        let printer = Printer {
            imports: &imports,
            depth: 0,
        };
        printer.class(description, false, &mut out);
        out
    }
}

impl CodeGenerator for JavaSourceGenerator {
    fn write_description(
        &self,
        description: &ClassDescription,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, CodegenError> {
        let path = out_dir.join(top_level(&description.name).to_path("java"));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.render(description))?;
        tracing::debug!(class = %description.name, path = %path.display(), "wrote java source");
        Ok(vec![path])
    }
}

fn top_level(name: &QualifiedName) -> QualifiedName {
    QualifiedName::new(
        name.package().cloned(),
        ShortClassName::new(name.short_name().outermost()),
    )
}

/// Decides which top-level classes print by their simple name.
///
/// A simple name is usable when exactly one referenced top-level class has it
/// and no class nested in the file shadows it. Usable names outside the
/// file's package and `java.lang` are imported.
#[derive(Debug)]
struct Imports {
    package: Option<PackageName>,
    simple: HashSet<QualifiedName>,
}

impl Imports {
    fn collect(description: &ClassDescription) -> Self {
        let file_class = top_level(&description.name);
        let mut referenced = Vec::new();
        for class in description.classes() {
            collect_class(class, &mut referenced);
        }

        let mut by_simple_name: BTreeMap<String, BTreeSet<QualifiedName>> = BTreeMap::new();
        for name in referenced.iter().map(top_level).chain([file_class.clone()]) {
            by_simple_name
                .entry(name.short_name().outermost().to_owned())
                .or_default()
                .insert(name);
        }
        let shadowed: HashSet<&str> = description
            .classes()
            .into_iter()
            .skip(1)
            .map(|class| class.name.short_name().innermost())
            .collect();

        let mut simple = HashSet::new();
        simple.insert(file_class.clone());
        for (simple_name, names) in by_simple_name {
            if names.len() == 1 && !shadowed.contains(simple_name.as_str()) {
                simple.extend(names);
            }
        }
        Imports {
            package: description.name.package().cloned(),
            simple,
        }
    }

    fn import_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .simple
            .iter()
            .filter(|name| match name.package() {
                None => false,
                Some(package) => {
                    Some(package) != self.package.as_ref() && package.segments() != ["java", "lang"]
                }
            })
            .map(|name| format!("import {};", name.to_source_name()))
            .collect();
        lines.sort();
        lines
    }

    /// Source prefix naming the top-level class of `name`.
    fn top_level_name(&self, name: &QualifiedName) -> String {
        let top = top_level(name);
        if self.simple.contains(&top) {
            top.short_name().outermost().to_owned()
        } else {
            top.to_source_name()
        }
    }
}

fn collect_class(class: &ClassDescription, out: &mut Vec<QualifiedName>) {
    collect_declarations(&class.type_parameters, out);
    if let Some(super_class) = &class.super_class {
        out.extend(super_class.ty.contained_classes());
    }
    for interface in &class.super_interfaces {
        out.extend(interface.ty.contained_classes());
    }
    collect_annotations(&class.annotations, out);
    for field in &class.fields {
        collect_type(&field.ty, out);
        if let Some(initializer) = &field.initializer {
            collect_expression(initializer, out);
        }
    }
    for method in &class.methods {
        collect_declarations(&method.type_parameters, out);
        for (_, ty) in &method.parameters {
            collect_type(ty, out);
        }
        out.extend(method.return_type.ty.contained_classes());
        collect_annotations(&method.return_type.annotations, out);
        for thrown in &method.throws {
            collect_type(thrown, out);
        }
        for statement in method.statements() {
            collect_statement(statement, out);
        }
    }
}

fn collect_declarations(declarations: &[Arc<TypeArgumentDeclaration>], out: &mut Vec<QualifiedName>) {
    for declaration in declarations {
        for bound in declaration.bounds() {
            out.extend(bound.contained_classes());
        }
    }
}

fn collect_annotations(annotations: &[JavaAnnotation], out: &mut Vec<QualifiedName>) {
    out.extend(annotations.iter().map(|annotation| annotation.type_name.clone()));
}

fn collect_type(ty: &AnyJavaType, out: &mut Vec<QualifiedName>) {
    out.extend(ty.ty.contained_classes());
    collect_annotations(&ty.annotations, out);
}

fn collect_statement(statement: &Statement, out: &mut Vec<QualifiedName>) {
    match statement {
        Statement::Return(value) | Statement::Expression(value) => collect_expression(value, out),
        Statement::Assignment { target, value } => {
            collect_expression(target, out);
            collect_expression(value, out);
        }
        Statement::ConstructorCall { arguments, .. } => {
            for argument in arguments {
                collect_expression(argument, out);
            }
        }
    }
}

fn collect_expression(expr: &Expression, out: &mut Vec<QualifiedName>) {
    match expr {
        Expression::Variable(_) | Expression::This => {}
        Expression::Cast { target, cast_to } => {
            collect_expression(target, out);
            collect_type(cast_to, out);
        }
        Expression::Field { receiver, .. } => collect_receiver(receiver, out),
        Expression::MethodCall {
            receiver, arguments, ..
        } => {
            if let Some(receiver) = receiver {
                collect_receiver(receiver, out);
            }
            for argument in arguments {
                collect_expression(argument, out);
            }
        }
        Expression::ConstructorCall {
            outer,
            constructing,
            arguments,
            ..
        } => {
            match outer {
                Some(outer) => collect_expression(outer, out),
                None => out.extend(constructing.ty.contained_classes()),
            }
            for argument in arguments {
                collect_expression(argument, out);
            }
        }
        Expression::ArrayConstructor { component, size } => {
            out.push(component.erase());
            collect_expression(size, out);
        }
    }
}

fn collect_receiver(receiver: &Receiver, out: &mut Vec<QualifiedName>) {
    match receiver {
        Receiver::Class(class) => out.push(class.erase()),
        Receiver::Super => {}
        Receiver::Expression(expr) => collect_expression(expr, out),
    }
}

struct Printer<'a> {
    imports: &'a Imports,
    depth: usize,
}

/// Where an expression is printed. Static fields of the current class are
/// assigned by simple name inside its static initializer.
struct BodyContext<'c> {
    class: &'c QualifiedName,
    static_initializer: bool,
}

impl Printer<'_> {
    fn nested(&self) -> Printer<'_> {
        Printer {
            imports: self.imports,
            depth: self.depth + 1,
        }
    }

    fn line(&self, out: &mut String, text: &str) {
        for _ in 0..self.depth {
            out.push_str(INDENT);
        }
        out.push_str(text);
        out.push('\n');
    }

    fn class(&self, class: &ClassDescription, in_interface: bool, out: &mut String) {
        for annotation in &class.annotations {
            self.line(out, &self.annotation(annotation));
        }
        let mut header = class.visibility.keyword().to_owned();
        if class.is_static && class.outer.is_some() && !in_interface && !class.is_interface {
            header.push_str("static ");
        }
        if class.is_abstract {
            header.push_str("abstract ");
        }
        header.push_str(if class.is_interface { "interface " } else { "class " });
        header.push_str(class.name.short_name().innermost());
        header.push_str(&self.type_parameters(&class.type_parameters));
        if let Some(super_class) = &class.super_class {
            header.push_str(" extends ");
            header.push_str(&self.class_type(&super_class.ty));
        }
        if !class.super_interfaces.is_empty() {
            header.push_str(if class.is_interface { " extends " } else { " implements " });
            let interfaces: Vec<String> = class
                .super_interfaces
                .iter()
                .map(|interface| self.class_type(&interface.ty))
                .collect();
            header.push_str(&interfaces.join(", "));
        }
        header.push_str(" {");
        self.line(out, &header);

        let inner = self.nested();
        let mut sections: Vec<String> = Vec::new();

        let mut fields = String::new();
        for field in &class.fields {
            let mut text = String::new();
            for annotation in &field.ty.annotations {
                text.push_str(&self.annotation(annotation));
                text.push(' ');
            }
            text.push_str(field.visibility.keyword());
            if field.is_static {
                text.push_str("static ");
            }
            if field.is_final {
                text.push_str("final ");
            }
            text.push_str(&self.generic_type(&field.ty.ty));
            text.push(' ');
            text.push_str(&field.name);
            if class.is_interface {
                if let Some(initializer) = &field.initializer {
                    let context = BodyContext {
                        class: &class.name,
                        static_initializer: true,
                    };
                    text.push_str(" = ");
                    text.push_str(&self.expression(initializer, &context));
                }
            }
            text.push(';');
            inner.line(&mut fields, &text);
        }
        if !fields.is_empty() {
            sections.push(fields);
        }

        for method in &class.methods {
            if method.kind == MethodKind::StaticInitializer && class.is_interface {
                continue;
            }
            let mut text = String::new();
            inner.method(class, method, &mut text);
            sections.push(text);
        }
        for nested in &class.inner_classes {
            let mut text = String::new();
            inner.class(nested, class.is_interface, &mut text);
            sections.push(text);
        }

        out.push_str(&sections.join("\n"));
        self.line(out, "}");
    }

    fn method(&self, class: &ClassDescription, method: &MethodDescription, out: &mut String) {
        let context = BodyContext {
            class: &class.name,
            static_initializer: method.kind == MethodKind::StaticInitializer,
        };
        if method.kind == MethodKind::StaticInitializer {
            self.line(out, "static {");
            self.body(method, &context, out);
            self.line(out, "}");
            return;
        }

        for annotation in &method.return_type.annotations {
            self.line(out, &self.annotation(annotation));
        }
        let mut header = method.visibility.keyword().to_owned();
        if method.modifiers.is_static {
            header.push_str("static ");
        }
        if method.modifiers.is_final {
            header.push_str("final ");
        }
        if method.modifiers.is_abstract && !class.is_interface {
            header.push_str("abstract ");
        }
        if class.is_interface && !method.modifiers.is_static && !method.modifiers.is_abstract {
            header.push_str("default ");
        }
        if !method.type_parameters.is_empty() {
            header.push_str(&self.type_parameters(&method.type_parameters));
            header.push(' ');
        }
        match method.kind {
            MethodKind::Constructor => header.push_str(class.name.short_name().innermost()),
            _ => {
                header.push_str(&self.return_type(&method.return_type.ty));
                header.push(' ');
                header.push_str(&method.name);
            }
        }
        let parameters: Vec<String> = method
            .parameters
            .iter()
            .map(|(name, ty)| format!("{} {name}", self.annotated(ty)))
            .collect();
        header.push_str(&format!("({})", parameters.join(", ")));
        if !method.throws.is_empty() {
            let throws: Vec<String> = method.throws.iter().map(|ty| self.generic_type(&ty.ty)).collect();
            header.push_str(" throws ");
            header.push_str(&throws.join(", "));
        }

        if method.body.is_none() {
            header.push(';');
            self.line(out, &header);
            return;
        }
        header.push_str(" {");
        self.line(out, &header);
        self.body(method, &context, out);
        self.line(out, "}");
    }

    fn body(&self, method: &MethodDescription, context: &BodyContext<'_>, out: &mut String) {
        let inner = self.nested();
        for item in method.body.iter().flatten() {
            match item {
                BodyItem::Comment(comment) => {
                    for line in comment.lines() {
                        inner.line(out, &format!("// {line}"));
                    }
                }
                BodyItem::Statement(statement) => inner.line(out, &self.statement(statement, context)),
            }
        }
    }

    fn statement(&self, statement: &Statement, context: &BodyContext<'_>) -> String {
        match statement {
            Statement::Return(value) => format!("return {};", self.expression(value, context)),
            Statement::Assignment { target, value } => format!(
                "{} = {};",
                self.expression(target, context),
                self.expression(value, context)
            ),
            Statement::ConstructorCall { kind, arguments, .. } => {
                let keyword = match kind {
                    SelfConstructor::This => "this",
                    SelfConstructor::Super => "super",
                };
                format!("{keyword}({});", self.arguments(arguments, context))
            }
            Statement::Expression(expr) => format!("{};", self.expression(expr, context)),
        }
    }

    fn expression(&self, expr: &Expression, context: &BodyContext<'_>) -> String {
        match expr {
            Expression::Variable(name) => name.clone(),
            Expression::This => "this".to_owned(),
            Expression::Cast { target, cast_to } => {
                format!("({}) {}", self.generic_type(&cast_to.ty), self.expression(target, context))
            }
            Expression::Field {
                receiver,
                name,
                owner,
                ..
            } => {
                if context.static_initializer
                    && owner == context.class
                    && matches!(receiver, Receiver::Class(class) if &class.erase() == context.class)
                {
                    return name.clone();
                }
                format!("{}.{name}", self.receiver(receiver, context))
            }
            Expression::MethodCall {
                receiver,
                name,
                arguments,
                ..
            } => {
                let arguments = self.arguments(arguments, context);
                match receiver {
                    Some(receiver) => format!("{}.{name}({arguments})", self.receiver(receiver, context)),
                    None => format!("{name}({arguments})"),
                }
            }
            Expression::ConstructorCall {
                outer,
                constructing,
                arguments,
                ..
            } => {
                let arguments = self.arguments(arguments, context);
                match outer {
                    Some(outer) => {
                        let receiver = self.receiver_expression(outer, context);
                        let inner = constructing.ty.segments.last().map(|segment| {
                            format!("{}{}", segment.name, self.type_arguments(segment.type_arguments.as_deref()))
                        });
                        format!("{receiver}.new {}({arguments})", inner.unwrap_or_default())
                    }
                    None => format!("new {}({arguments})", self.class_type(&constructing.ty)),
                }
            }
            Expression::ArrayConstructor { component, size } => format!(
                "new {}[{}]",
                self.class_name(&component.erase()),
                self.expression(size, context)
            ),
        }
    }

    fn receiver(&self, receiver: &Receiver, context: &BodyContext<'_>) -> String {
        match receiver {
            Receiver::Class(class) => self.class_name(&class.erase()),
            Receiver::Super => "super".to_owned(),
            Receiver::Expression(expr) => self.receiver_expression(expr, context),
        }
    }

    fn receiver_expression(&self, expr: &Expression, context: &BodyContext<'_>) -> String {
        let text = self.expression(expr, context);
        if text.starts_with('(') || text.starts_with("new") {
            format!("({text})")
        } else {
            text
        }
    }

    fn arguments(&self, arguments: &[Expression], context: &BodyContext<'_>) -> String {
        arguments
            .iter()
            .map(|argument| self.expression(argument, context))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn annotation(&self, annotation: &JavaAnnotation) -> String {
        format!("@{}", self.class_name(&annotation.type_name))
    }

    fn annotated(&self, ty: &AnyJavaType) -> String {
        let mut text = String::new();
        for annotation in &ty.annotations {
            text.push_str(&self.annotation(annotation));
            text.push(' ');
        }
        text.push_str(&self.generic_type(&ty.ty));
        text
    }

    fn class_name(&self, name: &QualifiedName) -> String {
        let mut text = self.imports.top_level_name(name);
        for inner in name.short_name().inner_classes() {
            text.push('.');
            text.push_str(inner);
        }
        text
    }

    fn class_type(&self, ty: &ClassGenericType) -> String {
        let mut text = self.imports.top_level_name(&ty.name());
        for (i, segment) in ty.segments.iter().enumerate() {
            if i > 0 {
                text.push('.');
                text.push_str(&segment.name);
            }
            text.push_str(&self.type_arguments(segment.type_arguments.as_deref()));
        }
        text
    }

    fn type_arguments(&self, arguments: Option<&[TypeArgument]>) -> String {
        match arguments {
            Some(arguments) if !arguments.is_empty() => {
                let arguments: Vec<String> = arguments
                    .iter()
                    .map(|argument| match argument {
                        TypeArgument::Any => "?".to_owned(),
                        TypeArgument::Specific { ty, wildcard: None } => self.generic_type(ty),
                        TypeArgument::Specific {
                            ty,
                            wildcard: Some(WildcardBound::Extends),
                        } => format!("? extends {}", self.generic_type(ty)),
                        TypeArgument::Specific {
                            ty,
                            wildcard: Some(WildcardBound::Super),
                        } => format!("? super {}", self.generic_type(ty)),
                    })
                    .collect();
                format!("<{}>", arguments.join(", "))
            }
            _ => String::new(),
        }
    }

    fn generic_type(&self, ty: &GenericType) -> String {
        match ty {
            GenericType::Primitive(base) => base.java_name().to_owned(),
            GenericType::Class(class) => self.class_type(class),
            GenericType::Array(component) => format!("{}[]", self.generic_type(component)),
            GenericType::TypeVariable(variable) => variable.name.clone(),
        }
    }

    fn return_type(&self, ty: &GenericReturnType) -> String {
        match ty {
            GenericReturnType::Void => "void".to_owned(),
            GenericReturnType::Type(ty) => self.generic_type(ty),
        }
    }

    fn type_parameters(&self, declarations: &[Arc<TypeArgumentDeclaration>]) -> String {
        if declarations.is_empty() {
            return String::new();
        }
        let declarations: Vec<String> = declarations
            .iter()
            .map(|declaration| {
                let bounds: Vec<&GenericType> = declaration.bounds().collect();
                // Only a lone `Object` bound is implicit: `Object & I` erases to `Object`.
                let implicit = match bounds.as_slice() {
                    [] => true,
                    [GenericType::Class(class)] => class.name().is_java_lang_object(),
                    _ => false,
                };
                if implicit {
                    declaration.name.clone()
                } else {
                    let bounds: Vec<String> =
                        bounds.into_iter().map(|bound| self.generic_type(bound)).collect();
                    format!("{} extends {}", declaration.name, bounds.join(" & "))
                }
            })
            .collect();
        format!("<{}>", declarations.join(", "))
    }
}
