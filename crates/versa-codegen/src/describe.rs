//! Lowering of [`ClassInfo`] trees into validated, backend-neutral
//! descriptions. Both backends consume the result of [`describe_class`], so a
//! tree accepted here is accepted by either of them.

use std::sync::Arc;

use versa_classfile::access::{
    ACC_ABSTRACT, ACC_FINAL, ACC_INTERFACE, ACC_PUBLIC, ACC_STATIC, ACC_SUPER,
};
use versa_classfile::{
    ClassGenericType, ClassSignature, Erase, FieldType, GenericType, MethodDescriptor,
    MethodSignature, ReturnType, TypeArgumentDeclaration,
};
use versa_core::{PackageName, QualifiedName, ShortClassName};

use crate::builder::{ClassBuilder, ClassInfo, FieldDecl, Member, MethodBuilder, MethodInfo, MethodModifiers};
use crate::ir::{BodyItem, Expression, SelfConstructor, Statement};
use crate::types::{AnyJavaType, JavaAnnotation, JavaClassType, JavaReturnType, Visibility};
use crate::typing::Scope;
use crate::CodegenError;

pub const CONSTRUCTOR_NAME: &str = "<init>";
pub const STATIC_INITIALIZER_NAME: &str = "<clinit>";

#[derive(Debug, Clone)]
pub struct ClassDescription {
    pub name: QualifiedName,
    pub visibility: Visibility,
    pub is_abstract: bool,
    pub is_interface: bool,
    /// Set for static nested classes (and every class nested in an interface).
    pub is_static: bool,
    pub outer: Option<QualifiedName>,
    pub type_parameters: Vec<Arc<TypeArgumentDeclaration>>,
    pub super_class: Option<JavaClassType>,
    pub super_interfaces: Vec<JavaClassType>,
    pub annotations: Vec<JavaAnnotation>,
    /// Present only when generics are involved.
    pub signature: Option<ClassSignature>,
    pub fields: Vec<FieldDescription>,
    pub methods: Vec<MethodDescription>,
    pub inner_classes: Vec<ClassDescription>,
}

#[derive(Debug, Clone)]
pub struct FieldDescription {
    pub name: String,
    pub ty: AnyJavaType,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    /// Kept for reference; the assignment itself lives in the constructors or
    /// the static initializer.
    pub initializer: Option<Expression>,
    pub signature: Option<GenericType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Constructor,
    StaticInitializer,
}

#[derive(Debug, Clone)]
pub struct MethodDescription {
    pub kind: MethodKind,
    pub name: String,
    pub visibility: Visibility,
    pub modifiers: MethodModifiers,
    pub type_parameters: Vec<Arc<TypeArgumentDeclaration>>,
    pub parameters: Vec<(String, AnyJavaType)>,
    pub return_type: JavaReturnType,
    pub throws: Vec<AnyJavaType>,
    pub descriptor: MethodDescriptor,
    pub signature: Option<MethodSignature>,
    /// `None` for abstract methods.
    pub body: Option<Vec<BodyItem>>,
}

impl ClassDescription {
    /// Erased superclass; `java/lang/Object` when none is declared.
    pub fn super_class_name(&self) -> QualifiedName {
        self.super_class
            .as_ref()
            .map(Erase::erase)
            .unwrap_or_else(QualifiedName::java_lang_object)
    }

    /// Flags of the class-file header. Nested classes only distinguish
    /// public from package access there.
    pub fn access_flags(&self) -> u16 {
        let visibility = match self.visibility {
            Visibility::Public | Visibility::Protected => ACC_PUBLIC,
            Visibility::Package | Visibility::Private => 0,
        };
        visibility | self.kind_flags()
    }

    /// Flags of this class's `InnerClasses` entry.
    pub fn inner_class_flags(&self) -> u16 {
        let mut flags = self.visibility.access_flags() | (self.kind_flags() & !ACC_SUPER);
        if self.is_static {
            flags |= ACC_STATIC;
        }
        flags
    }

    fn kind_flags(&self) -> u16 {
        if self.is_interface {
            ACC_INTERFACE | ACC_ABSTRACT
        } else if self.is_abstract {
            ACC_SUPER | ACC_ABSTRACT
        } else {
            ACC_SUPER
        }
    }

    /// The enclosing instance every constructor of an inner class receives.
    pub fn outer_instance(&self) -> Option<QualifiedName> {
        self.outer.clone().filter(|_| !self.is_static)
    }

    /// This class followed by all nested classes, depth first.
    pub fn classes(&self) -> Vec<&ClassDescription> {
        let mut out = vec![self];
        for inner in &self.inner_classes {
            out.extend(inner.classes());
        }
        out
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescription> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescription> {
        self.methods.iter().find(|method| method.name == name)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodDescription> {
        self.methods
            .iter()
            .filter(|method| method.kind == MethodKind::Constructor)
    }
}

impl FieldDescription {
    pub fn access_flags(&self) -> u16 {
        let mut flags = self.visibility.access_flags();
        if self.is_static {
            flags |= ACC_STATIC;
        }
        if self.is_final {
            flags |= ACC_FINAL;
        }
        flags
    }

    pub fn descriptor(&self) -> FieldType {
        self.ty.erase()
    }
}

impl MethodDescription {
    pub fn access_flags(&self) -> u16 {
        let mut flags = self.visibility.access_flags();
        if self.modifiers.is_static || self.kind == MethodKind::StaticInitializer {
            flags |= ACC_STATIC;
        }
        if self.modifiers.is_final {
            flags |= ACC_FINAL;
        }
        if self.modifiers.is_abstract {
            flags |= ACC_ABSTRACT;
        }
        flags
    }

    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.body.iter().flatten().filter_map(|item| match item {
            BodyItem::Statement(statement) => Some(statement),
            BodyItem::Comment(_) => None,
        })
    }
}

/// Runs every body callback of `info` (and its nested classes), synthesizes
/// initializers and validates the result.
pub fn describe_class(
    info: ClassInfo,
    package: Option<&PackageName>,
) -> Result<ClassDescription, CodegenError> {
    if !matches!(info.visibility, Visibility::Public | Visibility::Package) {
        return Err(CodegenError::InvariantViolation(format!(
            "top-level class `{}` must be public or package-private",
            info.short_name
        )));
    }
    let name = QualifiedName::new(package.cloned(), ShortClassName::new(info.short_name.clone()));
    let description = describe(info, name, None, false)?;
    for class in description.classes() {
        validate(class)?;
    }
    tracing::debug!(class = %description.name, "described class");
    Ok(description)
}

fn describe(
    info: ClassInfo,
    name: QualifiedName,
    outer: Option<QualifiedName>,
    is_static: bool,
) -> Result<ClassDescription, CodegenError> {
    let ClassInfo {
        short_name: _,
        visibility,
        is_abstract,
        is_interface,
        type_arguments,
        super_class,
        super_interfaces,
        annotations,
        body,
    } = info;
    if is_interface && super_class.is_some() {
        return Err(CodegenError::InvariantViolation(format!(
            "{name}: interfaces cannot extend a class"
        )));
    }

    let mut builder = ClassBuilder::new(name.to_string(), is_interface, is_abstract);
    body(&mut builder)?;

    let generics_involved = !type_arguments.is_empty()
        || super_class.as_ref().is_some_and(|ty| ty.ty.is_parameterized())
        || super_interfaces.iter().any(|ty| ty.ty.is_parameterized());
    let signature = generics_involved.then(|| ClassSignature {
        type_parameters: type_arguments.clone(),
        super_class: super_class
            .as_ref()
            .map(|ty| ty.ty.clone())
            .unwrap_or_else(|| ClassGenericType::raw(&QualifiedName::java_lang_object())),
        super_interfaces: super_interfaces.iter().map(|ty| ty.ty.clone()).collect(),
    });

    let mut description = ClassDescription {
        name,
        visibility,
        is_abstract: is_abstract && !is_interface,
        is_interface,
        is_static,
        outer,
        type_parameters: type_arguments,
        super_class,
        super_interfaces,
        annotations,
        signature,
        fields: Vec::new(),
        methods: Vec::new(),
        inner_classes: Vec::new(),
    };

    let mut instance_initializers = Vec::new();
    let mut static_initializers = Vec::new();
    let mut constructors = Vec::new();
    let mut methods = Vec::new();
    for member in builder.members {
        match member {
            Member::Method(decl) => methods.push(describe_method(
                decl.info,
                MethodKind::Method,
                decl.name,
                decl.modifiers,
                decl.type_arguments,
                decl.return_type,
            )?),
            Member::Constructor(info) => constructors.push(info),
            Member::Field(decl) => {
                if let Some(initializer) = &decl.initializer {
                    let assignment = initializer_assignment(&description.name, &decl, initializer.clone());
                    if decl.is_static {
                        static_initializers.push(assignment);
                    } else {
                        instance_initializers.push(assignment);
                    }
                }
                description.fields.push(describe_field(decl));
            }
            Member::InnerClass { info, is_static } => {
                let inner_name = description.name.inner_class(info.short_name.clone());
                let is_static = is_static || is_interface || info.is_interface;
                description.inner_classes.push(describe(
                    info,
                    inner_name,
                    Some(description.name.clone()),
                    is_static,
                )?);
            }
        }
    }

    if !instance_initializers.is_empty() && constructors.is_empty() {
        return Err(CodegenError::InvariantViolation(format!(
            "{}: instance field initializers require at least one constructor",
            description.name
        )));
    }

    if !static_initializers.is_empty() {
        description.methods.push(MethodDescription {
            kind: MethodKind::StaticInitializer,
            name: STATIC_INITIALIZER_NAME.to_owned(),
            visibility: Visibility::Package,
            modifiers: MethodModifiers {
                is_static: true,
                ..MethodModifiers::default()
            },
            type_parameters: Vec::new(),
            parameters: Vec::new(),
            return_type: JavaReturnType::void(),
            throws: Vec::new(),
            descriptor: MethodDescriptor::new(Vec::new(), ReturnType::Void),
            signature: None,
            body: Some(static_initializers.into_iter().map(BodyItem::Statement).collect()),
        });
    }

    for info in constructors {
        let mut constructor = describe_method(
            info,
            MethodKind::Constructor,
            CONSTRUCTOR_NAME.to_owned(),
            MethodModifiers::default(),
            Vec::new(),
            JavaReturnType::void(),
        )?;
        if let Some(body) = constructor.body.as_mut() {
            prepend_initializers(body, &instance_initializers);
        }
        description.methods.push(constructor);
    }
    description.methods.extend(methods);

    Ok(description)
}

fn describe_method(
    info: MethodInfo,
    kind: MethodKind,
    name: String,
    modifiers: MethodModifiers,
    type_parameters: Vec<Arc<TypeArgumentDeclaration>>,
    return_type: JavaReturnType,
) -> Result<MethodDescription, CodegenError> {
    let MethodInfo {
        visibility,
        parameters,
        throws,
        body,
    } = info;

    let mut builder = MethodBuilder::new(name.clone(), modifiers.is_abstract);
    body(&mut builder)?;

    let parameters: Vec<(String, AnyJavaType)> = parameters.into_iter().collect();
    let descriptor = MethodDescriptor::new(
        parameters.iter().map(|(_, ty)| ty.erase()).collect(),
        return_type.erase(),
    );
    let generics_involved = !type_parameters.is_empty()
        || parameters.iter().any(|(_, ty)| ty.ty.is_parameterized())
        || return_type.ty.is_parameterized()
        || throws.iter().any(|ty| ty.ty.is_parameterized());
    let signature = generics_involved.then(|| MethodSignature {
        type_parameters: type_parameters.clone(),
        parameters: parameters.iter().map(|(_, ty)| ty.ty.clone()).collect(),
        return_type: return_type.ty.clone(),
        throws: throws.iter().map(|ty| ty.ty.clone()).collect(),
    });

    Ok(MethodDescription {
        kind,
        name,
        visibility,
        modifiers,
        type_parameters,
        parameters,
        return_type,
        throws,
        descriptor,
        signature,
        body: (!modifiers.is_abstract).then_some(builder.items),
    })
}

fn describe_field(decl: FieldDecl) -> FieldDescription {
    let signature = decl.ty.ty.is_parameterized().then(|| decl.ty.ty.clone());
    FieldDescription {
        name: decl.name,
        ty: decl.ty,
        visibility: decl.visibility,
        is_static: decl.is_static,
        is_final: decl.is_final,
        initializer: decl.initializer,
        signature,
    }
}

fn initializer_assignment(class: &QualifiedName, decl: &FieldDecl, value: Expression) -> Statement {
    let field_type = decl.ty.erase();
    let target = if decl.is_static {
        Expression::static_field(class, decl.name.clone(), field_type)
    } else {
        Expression::this_field(class, decl.name.clone(), field_type)
    };
    Statement::Assignment { target, value }
}

/// Instance initializers run right after the superclass constructor. A
/// constructor delegating to `this(...)` leaves them to its delegate.
fn prepend_initializers(body: &mut Vec<BodyItem>, initializers: &[Statement]) {
    let first_statement = body.iter().position(|item| matches!(item, BodyItem::Statement(_)));
    let at = match first_statement.map(|i| (i, &body[i])) {
        Some((
            _,
            BodyItem::Statement(Statement::ConstructorCall {
                kind: SelfConstructor::This,
                ..
            }),
        )) => return,
        Some((
            i,
            BodyItem::Statement(Statement::ConstructorCall {
                kind: SelfConstructor::Super,
                ..
            }),
        )) => i + 1,
        _ => 0,
    };
    let rest = body.split_off(at);
    body.extend(initializers.iter().cloned().map(BodyItem::Statement));
    body.extend(rest);
}

fn validate(class: &ClassDescription) -> Result<(), CodegenError> {
    for field in &class.fields {
        if let Some(initializer) = &field.initializer {
            let scope = Scope::for_initializer(class, field.is_static, &field.name);
            scope.check_assignable(&scope.value_type(initializer)?, &field.descriptor())?;
        }
    }
    for method in &class.methods {
        let scope = Scope::for_method(class, method);
        for thrown in &method.throws {
            if !matches!(thrown.erase(), FieldType::Object(_)) {
                return Err(scope.violation(format!("cannot throw {}", thrown.ty)));
            }
        }
        if method.body.is_some() {
            validate_body(&scope, method)?;
        }
    }
    Ok(())
}

fn validate_body(scope: &Scope<'_>, method: &MethodDescription) -> Result<(), CodegenError> {
    let statements: Vec<&Statement> = method.statements().collect();
    for (i, statement) in statements.iter().enumerate() {
        let is_last = i + 1 == statements.len();
        match statement {
            Statement::Return(value) => {
                let ReturnType::Type(expected) = &method.descriptor.return_type else {
                    return Err(scope.violation("cannot return a value from a void method"));
                };
                scope.check_assignable(&scope.value_type(value)?, expected)?;
                if !is_last {
                    return Err(scope.violation("unreachable statement after return"));
                }
            }
            Statement::Assignment { target, value } => {
                if !matches!(target, Expression::Variable(_) | Expression::Field { .. }) {
                    return Err(scope.violation("assignment target must be a variable or a field"));
                }
                scope.check_assignable(&scope.value_type(value)?, &scope.value_type(target)?)?;
            }
            Statement::ConstructorCall {
                parameter_types,
                arguments,
                kind,
            } => {
                if method.kind != MethodKind::Constructor {
                    return Err(scope.violation("explicit constructor call outside a constructor"));
                }
                if i != 0 {
                    return Err(scope.violation("explicit constructor call must come first"));
                }
                let callee = match kind {
                    SelfConstructor::This => "this",
                    SelfConstructor::Super => "super",
                };
                scope.check_arguments(callee, parameter_types, arguments)?;
            }
            Statement::Expression(expr) => {
                if !matches!(
                    expr,
                    Expression::MethodCall { .. } | Expression::ConstructorCall { .. }
                ) {
                    return Err(scope.violation("only calls can be used as statements"));
                }
                scope.type_of(expr)?;
            }
        }
    }

    if method.descriptor.return_type != ReturnType::Void
        && !matches!(statements.last(), Some(Statement::Return(_)))
    {
        return Err(scope.violation("missing return statement"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use versa_classfile::access::ACC_PRIVATE;
    use versa_classfile::BaseType;

    use super::*;
    use crate::types::JavaType;

    fn int() -> AnyJavaType {
        JavaType::new(GenericType::Primitive(BaseType::Int))
    }

    fn string() -> AnyJavaType {
        JavaType::new(GenericType::class(&QualifiedName::from_slash_qualified("java/lang/String")))
    }

    fn params(list: &[(&str, AnyJavaType)]) -> IndexMap<String, AnyJavaType> {
        list.iter().map(|(name, ty)| ((*name).to_owned(), ty.clone())).collect()
    }

    fn package() -> PackageName {
        PackageName::from_slashed("gen/test").unwrap()
    }

    #[test]
    fn instance_initializers_follow_the_super_call() {
        let info = ClassInfo::new("Holder", Visibility::Public, |class| {
            class.add_field("name", string(), Visibility::Private, false, true, None)?;
            class.add_field(
                "alias",
                string(),
                Visibility::Private,
                false,
                false,
                Some(Expression::cast(Expression::This, string())),
            )?;
            class.add_constructor(MethodInfo::new(
                Visibility::Public,
                params(&[("name", string())]),
                |body| {
                    body.add_statement(Statement::ConstructorCall {
                        kind: SelfConstructor::Super,
                        parameter_types: vec![],
                        arguments: vec![],
                    })?;
                    body.add_statement(Statement::Assignment {
                        target: Expression::this_field(
                            &QualifiedName::from_slash_qualified("gen/test/Holder"),
                            "name",
                            FieldType::object("java/lang/String"),
                        ),
                        value: Expression::variable("name"),
                    })
                },
            ))?;
            Ok(())
        });
        let description = describe_class(info, Some(&package())).unwrap();
        let constructor = description.constructors().next().unwrap();
        let statements: Vec<&Statement> = constructor.statements().collect();
        assert_eq!(statements.len(), 3);
        assert!(matches!(statements[0], Statement::ConstructorCall { kind: SelfConstructor::Super, .. }));
        assert!(matches!(
            statements[1],
            Statement::Assignment { target: Expression::Field { name, .. }, .. } if name == "alias"
        ));
        assert!(matches!(
            statements[2],
            Statement::Assignment { target: Expression::Field { name, .. }, .. } if name == "name"
        ));
    }

    #[test]
    fn delegating_constructors_skip_initializers() {
        let counter = QualifiedName::from_slash_qualified("Counter");
        let info = ClassInfo::new("Counter", Visibility::Public, move |class| {
            class.add_field(
                "self_ref",
                JavaType::new(GenericType::class(&counter)),
                Visibility::Private,
                false,
                false,
                Some(Expression::This),
            )?;
            class.add_constructor(MethodInfo::empty(Visibility::Public, IndexMap::new()))?;
            class.add_constructor(MethodInfo::new(
                Visibility::Public,
                params(&[("ignored", int())]),
                |body| {
                    body.add_statement(Statement::ConstructorCall {
                        kind: SelfConstructor::This,
                        parameter_types: vec![],
                        arguments: vec![],
                    })
                },
            ))?;
            Ok(())
        });
        let description = describe_class(info, None).unwrap();
        let counts: Vec<usize> = description
            .constructors()
            .map(|constructor| constructor.statements().count())
            .collect();
        assert_eq!(counts, vec![1, 1]);
    }

    #[test]
    fn instance_initializer_requires_a_constructor() {
        let info = ClassInfo::new("Lonely", Visibility::Public, |class| {
            class.add_field("me", JavaType::new(GenericType::class(&QualifiedName::java_lang_object())), Visibility::Private, false, false, Some(Expression::This))
        });
        let err = describe_class(info, None).unwrap_err();
        assert!(matches!(err, CodegenError::InvariantViolation(_)));
    }

    #[test]
    fn static_initializer_comes_first() {
        let info = ClassInfo::new("Constants", Visibility::Public, |class| {
            class.add_method(
                MethodInfo::empty(Visibility::Public, IndexMap::new()),
                MethodModifiers::default(),
                vec![],
                "noop",
                JavaReturnType::void(),
            )?;
            class.add_field(
                "EMPTY",
                JavaType::new(GenericType::array(string().ty)),
                Visibility::Public,
                true,
                true,
                Some(Expression::ArrayConstructor {
                    component: crate::types::JavaClassType::raw(&QualifiedName::from_slash_qualified("java/lang/String")),
                    size: Box::new(Expression::variable("n")),
                }),
            )
        });
        // No `n` in a static initializer.
        assert!(describe_class(info, None).is_err());

        let info = ClassInfo::new("Constants", Visibility::Public, |class| {
            class.add_method(
                MethodInfo::empty(Visibility::Public, IndexMap::new()),
                MethodModifiers::default(),
                vec![],
                "noop",
                JavaReturnType::void(),
            )?;
            class.add_field(
                "INSTANCE",
                JavaType::new(GenericType::class(&QualifiedName::java_lang_object())),
                Visibility::Public,
                true,
                true,
                Some(Expression::ConstructorCall {
                    outer: None,
                    constructing: crate::types::JavaClassType::raw(&QualifiedName::java_lang_object()),
                    parameter_types: vec![],
                    arguments: vec![],
                }),
            )
        });
        let description = describe_class(info, None).unwrap();
        let names: Vec<&str> = description.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec![STATIC_INITIALIZER_NAME, "noop"]);
        let clinit = &description.methods[0];
        assert_eq!(clinit.kind, MethodKind::StaticInitializer);
        assert!(clinit.access_flags() & ACC_STATIC != 0);
    }

    #[test]
    fn nested_class_flags() {
        let mut api = ClassInfo::new("Api", Visibility::Public, |class| {
            class.add_inner_class(ClassInfo::new("Impl", Visibility::Public, |_| Ok(())), false)
        });
        api.is_interface = true;
        let description = describe_class(api, None).unwrap();
        assert_eq!(description.access_flags(), ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT);

        let nested = &description.inner_classes[0];
        assert!(nested.is_static, "classes nested in interfaces are static");
        assert_eq!(nested.name.to_slash_qualified(), "Api$Impl");
        assert_eq!(nested.access_flags(), ACC_PUBLIC | ACC_SUPER);
        assert_eq!(nested.inner_class_flags(), ACC_PUBLIC | ACC_STATIC);
        assert_eq!(nested.outer_instance(), None);

        let hidden = ClassInfo::new("Holder", Visibility::Public, |class| {
            class.add_inner_class(ClassInfo::new("Impl", Visibility::Private, |_| Ok(())), true)
        });
        let nested = &describe_class(hidden, None).unwrap().inner_classes[0];
        assert_eq!(nested.access_flags(), ACC_SUPER);
        assert_eq!(nested.inner_class_flags(), ACC_PRIVATE | ACC_STATIC);

        let mut api = ClassInfo::new("Api", Visibility::Public, |class| {
            class.add_inner_class(ClassInfo::new("Impl", Visibility::Private, |_| Ok(())), true)
        });
        api.is_interface = true;
        assert!(matches!(
            describe_class(api, None),
            Err(CodegenError::InvariantViolation(_))
        ));
    }

    #[test]
    fn inner_class_constructor_sees_outer_instance_slot() {
        let info = ClassInfo::new("Outer", Visibility::Public, |class| {
            class.add_inner_class(
                ClassInfo::new("Inner", Visibility::Protected, |inner| {
                    inner.add_constructor(MethodInfo::empty(Visibility::Public, params(&[("value", int())])))
                }),
                false,
            )
        });
        let description = describe_class(info, None).unwrap();
        let inner = &description.inner_classes[0];
        assert_eq!(inner.access_flags(), ACC_PUBLIC | ACC_SUPER);
        assert_eq!(inner.outer_instance(), Some(QualifiedName::from_slash_qualified("Outer")));
        let constructor = inner.constructors().next().unwrap();
        let scope = Scope::for_method(inner, constructor);
        assert_eq!(scope.local("value").map(|local| local.slot), Some(2));
        assert_eq!(scope.max_locals(), 3);
    }

    #[test]
    fn top_level_classes_must_be_public_or_package() {
        let info = ClassInfo::new("Hidden", Visibility::Private, |_| Ok(()));
        assert!(describe_class(info, None).is_err());
    }

    #[test]
    fn body_shape_is_checked() {
        let info = ClassInfo::new("Shapes", Visibility::Public, |class| {
            class.add_method(
                MethodInfo::empty(Visibility::Public, IndexMap::new()),
                MethodModifiers::default(),
                vec![],
                "size",
                int().into(),
            )
        });
        let err = describe_class(info, None).unwrap_err();
        assert!(err.to_string().contains("missing return"), "{err}");

        let info = ClassInfo::new("Shapes", Visibility::Public, |class| {
            class.add_method(
                MethodInfo::new(Visibility::Public, params(&[("x", int())]), |body| {
                    body.add_statement(Statement::Return(Expression::variable("x")))
                }),
                MethodModifiers::default(),
                vec![],
                "run",
                JavaReturnType::void(),
            )
        });
        let err = describe_class(info, None).unwrap_err();
        assert!(err.to_string().contains("void method"), "{err}");

        let info = ClassInfo::new("Shapes", Visibility::Public, |class| {
            class.add_method(
                MethodInfo::new(Visibility::Public, params(&[("x", int())]), |body| {
                    body.add_statement(Statement::Expression(Expression::variable("x")))
                }),
                MethodModifiers::default(),
                vec![],
                "run",
                JavaReturnType::void(),
            )
        });
        let err = describe_class(info, None).unwrap_err();
        assert!(err.to_string().contains("only calls"), "{err}");
    }

    #[test]
    fn generic_members_carry_signatures() {
        let t = Arc::new(TypeArgumentDeclaration::unbounded("T"));
        let t_type: AnyJavaType =
            JavaType::new(GenericType::TypeVariable(versa_classfile::TypeVariable::new(t.clone())));
        let mut info = ClassInfo::new("Box", Visibility::Public, move |class| {
            class.add_field("value", t_type.clone(), Visibility::Private, false, false, None)?;
            class.add_method(
                MethodInfo::new(Visibility::Public, IndexMap::new(), |body| {
                    body.add_statement(Statement::Return(Expression::this_field(
                        &QualifiedName::from_slash_qualified("Box"),
                        "value",
                        FieldType::object("java/lang/Object"),
                    )))
                }),
                MethodModifiers::default(),
                vec![],
                "get",
                t_type.into(),
            )
        });
        info.type_arguments = vec![t];
        let description = describe_class(info, None).unwrap();
        assert_eq!(
            description.signature.as_ref().map(ToString::to_string).as_deref(),
            Some("<T:>Ljava/lang/Object;")
        );
        let field = description.field("value").unwrap();
        assert_eq!(field.descriptor(), FieldType::object("java/lang/Object"));
        assert_eq!(field.signature.as_ref().map(ToString::to_string).as_deref(), Some("TT;"));
        let get = description.method("get").unwrap();
        assert_eq!(get.descriptor.to_string(), "()Ljava/lang/Object;");
        assert_eq!(get.signature.as_ref().map(ToString::to_string).as_deref(), Some("()TT;"));
    }
}
