//! Builder capabilities handed to class and method body callbacks.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use versa_classfile::TypeArgumentDeclaration;

use crate::ir::{BodyItem, Expression, Statement};
use crate::types::{AnyJavaType, JavaAnnotation, JavaClassType, JavaReturnType, Visibility};
use crate::CodegenError;

pub type ClassBody = Box<dyn FnOnce(&mut ClassBuilder) -> Result<(), CodegenError>>;
pub type MethodBody = Box<dyn FnOnce(&mut MethodBuilder) -> Result<(), CodegenError>>;

/// Declarative description of a class. `body` runs exactly once, when the
/// class is lowered.
pub struct ClassInfo {
    pub short_name: String,
    pub visibility: Visibility,
    /// Interfaces are not considered abstract.
    pub is_abstract: bool,
    pub is_interface: bool,
    pub type_arguments: Vec<Arc<TypeArgumentDeclaration>>,
    pub super_class: Option<JavaClassType>,
    pub super_interfaces: Vec<JavaClassType>,
    pub annotations: Vec<JavaAnnotation>,
    pub body: ClassBody,
}

impl ClassInfo {
    /// A concrete class with no supertypes beyond `java/lang/Object`.
    pub fn new(
        short_name: impl Into<String>,
        visibility: Visibility,
        body: impl FnOnce(&mut ClassBuilder) -> Result<(), CodegenError> + 'static,
    ) -> Self {
        Self {
            short_name: short_name.into(),
            visibility,
            is_abstract: false,
            is_interface: false,
            type_arguments: Vec::new(),
            super_class: None,
            super_interfaces: Vec::new(),
            annotations: Vec::new(),
            body: Box::new(body),
        }
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("short_name", &self.short_name)
            .field("visibility", &self.visibility)
            .field("is_abstract", &self.is_abstract)
            .field("is_interface", &self.is_interface)
            .finish_non_exhaustive()
    }
}

pub struct MethodInfo {
    pub visibility: Visibility,
    /// Parameter names to types, in declaration order.
    pub parameters: IndexMap<String, AnyJavaType>,
    pub throws: Vec<AnyJavaType>,
    pub body: MethodBody,
}

impl MethodInfo {
    pub fn new(
        visibility: Visibility,
        parameters: IndexMap<String, AnyJavaType>,
        body: impl FnOnce(&mut MethodBuilder) -> Result<(), CodegenError> + 'static,
    ) -> Self {
        Self {
            visibility,
            parameters,
            throws: Vec::new(),
            body: Box::new(body),
        }
    }

    /// A method whose body adds nothing.
    pub fn empty(visibility: Visibility, parameters: IndexMap<String, AnyJavaType>) -> Self {
        Self::new(visibility, parameters, |_| Ok(()))
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("visibility", &self.visibility)
            .field("parameters", &self.parameters)
            .field("throws", &self.throws)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodModifiers {
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
}

#[derive(Debug)]
pub(crate) struct MethodDecl {
    pub info: MethodInfo,
    pub modifiers: MethodModifiers,
    pub type_arguments: Vec<Arc<TypeArgumentDeclaration>>,
    pub name: String,
    pub return_type: JavaReturnType,
}

#[derive(Debug)]
pub(crate) struct FieldDecl {
    pub name: String,
    pub ty: AnyJavaType,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub initializer: Option<Expression>,
}

#[derive(Debug)]
pub(crate) enum Member {
    Method(MethodDecl),
    Constructor(MethodInfo),
    Field(FieldDecl),
    InnerClass { info: ClassInfo, is_static: bool },
}

/// Collects the members a class body declares.
#[derive(Debug)]
pub struct ClassBuilder {
    class_name: String,
    is_interface: bool,
    is_abstract: bool,
    pub(crate) members: Vec<Member>,
}

impl ClassBuilder {
    pub(crate) fn new(class_name: String, is_interface: bool, is_abstract: bool) -> Self {
        Self {
            class_name,
            is_interface,
            is_abstract,
            members: Vec::new(),
        }
    }

    pub fn add_method(
        &mut self,
        info: MethodInfo,
        modifiers: MethodModifiers,
        type_arguments: Vec<Arc<TypeArgumentDeclaration>>,
        name: impl Into<String>,
        return_type: JavaReturnType,
    ) -> Result<(), CodegenError> {
        let name = name.into();
        if modifiers.is_abstract && !(self.is_abstract || self.is_interface) {
            return Err(self.violation(format!("abstract method `{name}` in a concrete class")));
        }
        if modifiers.is_abstract && (modifiers.is_static || modifiers.is_final) {
            return Err(self.violation(format!(
                "abstract method `{name}` cannot be static or final"
            )));
        }
        if self.is_interface && (info.visibility != Visibility::Public || modifiers.is_final) {
            return Err(self.violation(format!(
                "interface method `{name}` must be public and not final"
            )));
        }
        self.members.push(Member::Method(MethodDecl {
            info,
            modifiers,
            type_arguments,
            name,
            return_type,
        }));
        Ok(())
    }

    pub fn add_constructor(&mut self, info: MethodInfo) -> Result<(), CodegenError> {
        if self.is_interface {
            return Err(self.violation("interfaces cannot declare constructors".to_owned()));
        }
        self.members.push(Member::Constructor(info));
        Ok(())
    }

    /// Declares a field. An `initializer` is not written at the declaration:
    /// it becomes an assignment at the start of every constructor, or in the
    /// static initializer for static fields.
    pub fn add_field(
        &mut self,
        name: impl Into<String>,
        ty: AnyJavaType,
        visibility: Visibility,
        is_static: bool,
        is_final: bool,
        initializer: Option<Expression>,
    ) -> Result<(), CodegenError> {
        let name = name.into();
        if self.is_interface
            && !(visibility == Visibility::Public && is_static && is_final && initializer.is_some())
        {
            return Err(self.violation(format!(
                "interface field `{name}` must be public, static, final and initialized"
            )));
        }
        self.members.push(Member::Field(FieldDecl {
            name,
            ty,
            visibility,
            is_static,
            is_final,
            initializer,
        }));
        Ok(())
    }

    /// Classes nested in an interface are implicitly `public static`, so they
    /// must be declared public.
    pub fn add_inner_class(&mut self, info: ClassInfo, is_static: bool) -> Result<(), CodegenError> {
        if self.is_interface && info.visibility != Visibility::Public {
            return Err(self.violation(format!(
                "interface member class `{}` must be public",
                info.short_name
            )));
        }
        self.members.push(Member::InnerClass { info, is_static });
        Ok(())
    }

    fn violation(&self, message: String) -> CodegenError {
        CodegenError::InvariantViolation(format!("{}: {message}", self.class_name))
    }
}

/// Collects the statements of one method body.
#[derive(Debug)]
pub struct MethodBuilder {
    method_name: String,
    is_abstract: bool,
    pub(crate) items: Vec<BodyItem>,
}

impl MethodBuilder {
    pub(crate) fn new(method_name: String, is_abstract: bool) -> Self {
        Self {
            method_name,
            is_abstract,
            items: Vec::new(),
        }
    }

    pub fn add_statement(&mut self, statement: Statement) -> Result<(), CodegenError> {
        self.ensure_concrete()?;
        self.items.push(BodyItem::Statement(statement));
        Ok(())
    }

    pub fn add_comment(&mut self, comment: impl Into<String>) -> Result<(), CodegenError> {
        self.ensure_concrete()?;
        self.items.push(BodyItem::Comment(comment.into()));
        Ok(())
    }

    fn ensure_concrete(&self) -> Result<(), CodegenError> {
        if self.is_abstract {
            return Err(CodegenError::InvariantViolation(format!(
                "abstract method `{}` cannot have a body",
                self.method_name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use versa_classfile::{BaseType, GenericType};

    use super::*;
    use crate::types::JavaType;

    fn abstract_method() -> MethodModifiers {
        MethodModifiers {
            is_abstract: true,
            ..MethodModifiers::default()
        }
    }

    #[test]
    fn interfaces_reject_constructors_and_hidden_members() {
        let mut builder = ClassBuilder::new("Api".to_owned(), true, false);
        assert!(builder
            .add_constructor(MethodInfo::empty(Visibility::Public, IndexMap::new()))
            .is_err());
        assert!(builder
            .add_method(
                MethodInfo::empty(Visibility::Private, IndexMap::new()),
                abstract_method(),
                vec![],
                "hidden",
                JavaReturnType::void(),
            )
            .is_err());
        let int = JavaType::new(GenericType::Primitive(BaseType::Int));
        assert!(builder
            .add_field("LIMIT", int, Visibility::Public, true, true, None)
            .is_err());
        assert!(builder
            .add_method(
                MethodInfo::empty(Visibility::Public, IndexMap::new()),
                abstract_method(),
                vec![],
                "visible",
                JavaReturnType::void(),
            )
            .is_ok());
        assert_eq!(builder.members.len(), 1);

        for visibility in [Visibility::Private, Visibility::Protected, Visibility::Package] {
            let err = builder
                .add_inner_class(ClassInfo::new("Impl", visibility, |_| Ok(())), true)
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "invariant violation: Api: interface member class `Impl` must be public"
            );
        }
        builder
            .add_inner_class(ClassInfo::new("Impl", Visibility::Public, |_| Ok(())), true)
            .unwrap();
        assert_eq!(builder.members.len(), 2);
    }

    #[test]
    fn abstract_methods_need_an_abstract_owner() {
        let mut concrete = ClassBuilder::new("Concrete".to_owned(), false, false);
        let err = concrete
            .add_method(
                MethodInfo::empty(Visibility::Public, IndexMap::new()),
                abstract_method(),
                vec![],
                "run",
                JavaReturnType::void(),
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invariant violation: Concrete: abstract method `run` in a concrete class"
        );

        let mut base = ClassBuilder::new("Base".to_owned(), false, true);
        let static_abstract = MethodModifiers {
            is_static: true,
            ..abstract_method()
        };
        assert!(base
            .add_method(
                MethodInfo::empty(Visibility::Public, IndexMap::new()),
                static_abstract,
                vec![],
                "run",
                JavaReturnType::void(),
            )
            .is_err());
    }

    #[test]
    fn abstract_bodies_stay_empty() {
        let mut body = MethodBuilder::new("run".to_owned(), true);
        assert!(body.add_comment("nothing to see").is_err());
        assert!(body
            .add_statement(Statement::Expression(Expression::This))
            .is_err());
        assert!(body.items.is_empty());

        let mut body = MethodBuilder::new("run".to_owned(), false);
        body.add_comment("delegates").unwrap();
        assert_eq!(body.items, vec![BodyItem::Comment("delegates".to_owned())]);
    }
}
