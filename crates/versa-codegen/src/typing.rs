//! Static typing of body expressions. Lowering uses it to reject trees that
//! either backend could not express; the bytecode backend reuses it to pick
//! opcodes.

use versa_classfile::{BaseType, Conversion, Erase, FieldType, ReturnType};
use versa_core::QualifiedName;

use crate::describe::{ClassDescription, MethodDescription, MethodKind};
use crate::ir::{Expression, Receiver};
use crate::CodegenError;

#[derive(Debug, Clone)]
pub(crate) struct Local {
    pub name: String,
    pub ty: FieldType,
    pub slot: u16,
}

/// What a method body can see: its class, `this` (unless static) and its
/// parameters with their local-variable slots.
#[derive(Debug)]
pub(crate) struct Scope<'a> {
    pub class: &'a QualifiedName,
    pub super_class: QualifiedName,
    /// Implicit leading constructor parameter of inner classes.
    pub outer_instance: Option<QualifiedName>,
    pub is_static: bool,
    context: String,
    locals: Vec<Local>,
    next_slot: u16,
}

impl<'a> Scope<'a> {
    pub fn for_method(class: &'a ClassDescription, method: &MethodDescription) -> Self {
        let is_static = method.modifiers.is_static || method.kind == MethodKind::StaticInitializer;
        let mut scope = Self::empty(class, is_static, format!("{}.{}", class.name, method.name));
        if method.kind == MethodKind::Constructor {
            scope.outer_instance = class.outer_instance();
            if scope.outer_instance.is_some() {
                scope.next_slot += 1;
            }
        }
        for (name, ty) in &method.parameters {
            let ty = ty.erase();
            let slot = scope.next_slot;
            scope.next_slot += ty.slot_size();
            scope.locals.push(Local {
                name: name.clone(),
                ty,
                slot,
            });
        }
        scope
    }

    /// The scope a field initializer is checked in: no parameters.
    pub fn for_initializer(class: &'a ClassDescription, is_static: bool, field: &str) -> Self {
        Self::empty(class, is_static, format!("{}.{field}", class.name))
    }

    fn empty(class: &'a ClassDescription, is_static: bool, context: String) -> Self {
        Self {
            class: &class.name,
            super_class: class.super_class_name(),
            outer_instance: None,
            is_static,
            context,
            locals: Vec::new(),
            next_slot: if is_static { 0 } else { 1 },
        }
    }

    pub fn local(&self, name: &str) -> Option<&Local> {
        self.locals.iter().find(|local| local.name == name)
    }

    /// `this`, the implicit outer instance and every parameter.
    pub fn max_locals(&self) -> u16 {
        self.next_slot
    }

    pub fn violation(&self, message: impl std::fmt::Display) -> CodegenError {
        CodegenError::InvariantViolation(format!("{}: {message}", self.context))
    }

    pub fn type_of(&self, expr: &Expression) -> Result<ReturnType, CodegenError> {
        let ty = match expr {
            Expression::Variable(name) => self
                .local(name)
                .map(|local| local.ty.clone())
                .ok_or_else(|| self.violation(format!("unknown variable `{name}`")))?,
            Expression::This => {
                self.require_instance("this")?;
                FieldType::Object(self.class.clone())
            }
            Expression::Cast { target, cast_to } => {
                let from = self.value_type(target)?;
                let to = cast_to.erase();
                match (&from, &to) {
                    (FieldType::Base(a), FieldType::Base(b)) => {
                        if Conversion::path(*a, *b).is_none() {
                            return Err(self.violation(format!(
                                "cannot cast {} to {}",
                                from.java_name(),
                                to.java_name()
                            )));
                        }
                    }
                    (FieldType::Base(_), _) | (_, FieldType::Base(_)) => {
                        return Err(self.violation(format!(
                            "cannot cast {} to {}",
                            from.java_name(),
                            to.java_name()
                        )));
                    }
                    _ => {}
                }
                to
            }
            Expression::Field {
                receiver,
                field_type,
                ..
            } => {
                self.check_receiver(receiver)?;
                field_type.clone()
            }
            Expression::MethodCall {
                receiver,
                name,
                descriptor,
                arguments,
                ..
            } => {
                match receiver {
                    Some(receiver) => self.check_receiver(receiver)?,
                    None => self.require_instance("an unqualified instance call")?,
                }
                self.check_arguments(name, &descriptor.params, arguments)?;
                return Ok(descriptor.return_type.clone());
            }
            Expression::ConstructorCall {
                outer,
                constructing,
                parameter_types,
                arguments,
            } => {
                if let Some(outer) = outer {
                    self.require_reference(outer, "outer instance")?;
                }
                let class = constructing.erase();
                self.check_arguments(&format!("new {class}"), parameter_types, arguments)?;
                FieldType::Object(class)
            }
            Expression::ArrayConstructor { component, size } => {
                if component.ty.is_parameterized() {
                    return Err(self.violation(format!("generic array creation of {}", component.ty)));
                }
                let size_type = self.value_type(size)?;
                let is_int = matches!(
                    size_type,
                    FieldType::Base(BaseType::Int | BaseType::Short | BaseType::Byte | BaseType::Char)
                );
                if !is_int {
                    return Err(self.violation(format!(
                        "array size must be an int, found {}",
                        size_type.java_name()
                    )));
                }
                FieldType::array(FieldType::Object(component.erase()))
            }
        };
        Ok(ReturnType::Type(ty))
    }

    /// Type of an expression used as a value; `void` calls are rejected.
    pub fn value_type(&self, expr: &Expression) -> Result<FieldType, CodegenError> {
        match self.type_of(expr)? {
            ReturnType::Type(ty) => Ok(ty),
            ReturnType::Void => Err(self.violation("a void call cannot be used as a value")),
        }
    }

    pub fn check_arguments(
        &self,
        callee: &str,
        parameters: &[FieldType],
        arguments: &[Expression],
    ) -> Result<(), CodegenError> {
        if parameters.len() != arguments.len() {
            return Err(self.violation(format!(
                "`{callee}` takes {} arguments but {} were supplied",
                parameters.len(),
                arguments.len()
            )));
        }
        for (parameter, argument) in parameters.iter().zip(arguments) {
            self.check_assignable(&self.value_type(argument)?, parameter)?;
        }
        Ok(())
    }

    /// Primitives must match exactly; references are not checked further.
    pub fn check_assignable(&self, from: &FieldType, to: &FieldType) -> Result<(), CodegenError> {
        let ok = match (from, to) {
            (FieldType::Base(a), FieldType::Base(b)) => a == b,
            (FieldType::Base(_), _) | (_, FieldType::Base(_)) => false,
            _ => true,
        };
        if ok {
            Ok(())
        } else {
            Err(self.violation(format!(
                "{} is not assignable to {}",
                from.java_name(),
                to.java_name()
            )))
        }
    }

    fn check_receiver(&self, receiver: &Receiver) -> Result<(), CodegenError> {
        match receiver {
            Receiver::Class(_) => Ok(()),
            Receiver::Super => self.require_instance("super"),
            Receiver::Expression(expr) => self.require_reference(expr, "receiver"),
        }
    }

    fn require_reference(&self, expr: &Expression, what: &str) -> Result<(), CodegenError> {
        let ty = self.value_type(expr)?;
        if ty.is_reference() {
            Ok(())
        } else {
            Err(self.violation(format!("{what} has primitive type {}", ty.java_name())))
        }
    }

    fn require_instance(&self, what: &str) -> Result<(), CodegenError> {
        if self.is_static {
            Err(self.violation(format!("{what} in a static context")))
        } else {
            Ok(())
        }
    }
}
