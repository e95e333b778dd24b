//! Class-file backend.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use versa_classfile::{
    ClassWriter, Conversion, Erase, FieldRef, FieldSpec, FieldType, InnerClassEntry, Instruction,
    MethodCode, MethodDescriptor, MethodRef, MethodSpec, ReturnType, ValueKind,
};
use versa_classpath::ClasspathIndex;
use versa_core::QualifiedName;

use crate::describe::{ClassDescription, MethodDescription, MethodKind, CONSTRUCTOR_NAME};
use crate::ir::{Expression, Receiver, SelfConstructor, Statement};
use crate::typing::Scope;
use crate::{CodeGenerator, CodegenError};

/// Emits one class file per class, nested classes included.
///
/// The index decides whether a call goes through `invokeinterface`; classes
/// of the tree being emitted are known without it.
#[derive(Debug, Clone, Copy)]
pub struct BytecodeGenerator<'a> {
    index: &'a ClasspathIndex,
}

impl<'a> BytecodeGenerator<'a> {
    pub fn new(index: &'a ClasspathIndex) -> Self {
        Self { index }
    }

    /// Class-file bytes of `description` and each of its nested classes.
    pub fn generate(
        &self,
        description: &ClassDescription,
    ) -> Result<Vec<(QualifiedName, Vec<u8>)>, CodegenError> {
        let classes = description.classes();
        let local_interfaces: HashMap<QualifiedName, bool> = classes
            .iter()
            .map(|class| (class.name.clone(), class.is_interface))
            .collect();
        classes
            .into_iter()
            .map(|class| Ok((class.name.clone(), self.class_bytes(class, &local_interfaces)?)))
            .collect()
    }

    fn class_bytes(
        &self,
        class: &ClassDescription,
        local_interfaces: &HashMap<QualifiedName, bool>,
    ) -> Result<Vec<u8>, CodegenError> {
        let interfaces: Vec<String> = class
            .super_interfaces
            .iter()
            .map(|ty| ty.erase().to_slash_qualified())
            .collect();
        let mut writer = ClassWriter::new(
            class.access_flags(),
            &class.name.to_slash_qualified(),
            Some(&class.super_class_name().to_slash_qualified()),
            &interfaces,
        )?;
        writer.set_source_file(&format!("{}.java", class.name.short_name().outermost()))?;
        if let Some(signature) = &class.signature {
            writer.set_signature(&signature.to_string())?;
        }
        for annotation in &class.annotations {
            writer.add_annotation(annotation.descriptor());
        }
        if class.outer.is_some() {
            writer.track_inner_class(inner_class_entry(class));
        }
        for inner in &class.inner_classes {
            writer.track_inner_class(inner_class_entry(inner));
        }

        for field in &class.fields {
            writer.write_field(&FieldSpec {
                access_flags: field.access_flags(),
                name: field.name.clone(),
                descriptor: field.descriptor(),
                signature: field.signature.as_ref().map(ToString::to_string),
                annotations: field.ty.annotations.iter().map(|a| a.descriptor()).collect(),
            })?;
        }

        for method in &class.methods {
            let scope = Scope::for_method(class, method);
            let code = match &method.body {
                Some(_) => Some(MethodCode {
                    max_locals: scope.max_locals(),
                    instructions: Emitter {
                        scope: &scope,
                        index: self.index,
                        local_interfaces,
                        code: Vec::new(),
                    }
                    .method_body(method)?,
                }),
                None => None,
            };
            let mut descriptor = method.descriptor.clone();
            if let Some(outer) = &scope.outer_instance {
                descriptor.params.insert(0, FieldType::Object(outer.clone()));
            }
            let parameter_annotations = if method.parameters.iter().any(|(_, ty)| !ty.annotations.is_empty()) {
                method
                    .parameters
                    .iter()
                    .map(|(_, ty)| ty.annotations.iter().map(|a| a.descriptor()).collect())
                    .collect()
            } else {
                Vec::new()
            };
            writer.write_method(&MethodSpec {
                access_flags: method.access_flags(),
                name: method.name.clone(),
                descriptor,
                signature: method.signature.as_ref().map(ToString::to_string),
                exceptions: method
                    .throws
                    .iter()
                    .filter_map(|ty| ty.erase().class_constant_name())
                    .collect(),
                annotations: method
                    .return_type
                    .annotations
                    .iter()
                    .map(|a| a.descriptor())
                    .collect(),
                parameter_annotations,
                code,
            })?;
        }

        tracing::trace!(class = %class.name, methods = class.methods.len(), "assembled class file");
        Ok(writer.to_bytes()?)
    }
}

impl CodeGenerator for BytecodeGenerator<'_> {
    fn write_description(
        &self,
        description: &ClassDescription,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, CodegenError> {
        let mut written = Vec::new();
        for (name, bytes) in self.generate(description)? {
            let path = out_dir.join(name.to_path("class"));
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, bytes)?;
            tracing::debug!(class = %name, path = %path.display(), "wrote class file");
            written.push(path);
        }
        Ok(written)
    }
}

fn inner_class_entry(class: &ClassDescription) -> InnerClassEntry {
    InnerClassEntry {
        inner_class: class.name.to_slash_qualified(),
        outer_class: class.outer.as_ref().map(QualifiedName::to_slash_qualified),
        inner_name: Some(class.name.short_name().innermost().to_owned()),
        access_flags: class.inner_class_flags(),
    }
}

struct Emitter<'s, 'a> {
    scope: &'s Scope<'s>,
    index: &'a ClasspathIndex,
    local_interfaces: &'s HashMap<QualifiedName, bool>,
    code: Vec<Instruction>,
}

impl Emitter<'_, '_> {
    fn method_body(mut self, method: &MethodDescription) -> Result<Vec<Instruction>, CodegenError> {
        let mut statements = method.statements().peekable();
        if method.kind == MethodKind::Constructor
            && !matches!(statements.peek(), Some(Statement::ConstructorCall { .. }))
        {
            // Implicit `super()`.
            self.code.push(Instruction::Load {
                kind: ValueKind::Reference,
                index: 0,
            });
            self.code.push(Instruction::InvokeSpecial {
                method: MethodRef {
                    owner: self.scope.super_class.to_slash_qualified(),
                    name: CONSTRUCTOR_NAME.to_owned(),
                    descriptor: MethodDescriptor::new(Vec::new(), ReturnType::Void),
                },
                interface: false,
            });
        }
        for statement in statements {
            self.statement(statement, method)?;
        }
        if method.descriptor.return_type == ReturnType::Void {
            self.code.push(Instruction::Return(None));
        }
        Ok(self.code)
    }

    fn statement(&mut self, statement: &Statement, method: &MethodDescription) -> Result<(), CodegenError> {
        match statement {
            Statement::Return(value) => {
                self.expression(value)?;
                self.code.push(Instruction::return_for(&method.descriptor.return_type));
            }
            Statement::Assignment { target, value } => match target {
                Expression::Variable(name) => {
                    let local = self
                        .scope
                        .local(name)
                        .ok_or_else(|| self.scope.violation(format!("unknown variable `{name}`")))?;
                    let (kind, index) = (ValueKind::of(&local.ty), local.slot);
                    self.expression(value)?;
                    self.code.push(Instruction::Store { kind, index });
                }
                Expression::Field {
                    receiver,
                    name,
                    owner,
                    field_type,
                } => {
                    let field = FieldRef {
                        owner: owner.to_slash_qualified(),
                        name: name.clone(),
                        field_type: field_type.clone(),
                    };
                    match receiver {
                        Receiver::Class(_) => {
                            self.expression(value)?;
                            self.code.push(Instruction::PutStatic(field));
                        }
                        Receiver::Super => {
                            self.load_this();
                            self.expression(value)?;
                            self.code.push(Instruction::PutField(field));
                        }
                        Receiver::Expression(object) => {
                            self.expression(object)?;
                            self.expression(value)?;
                            self.code.push(Instruction::PutField(field));
                        }
                    }
                }
                _ => return Err(self.scope.violation("assignment target must be a variable or a field")),
            },
            Statement::ConstructorCall {
                kind,
                parameter_types,
                arguments,
            } => {
                self.load_this();
                let mut params = Vec::new();
                let owner = match kind {
                    SelfConstructor::Super => self.scope.super_class.clone(),
                    SelfConstructor::This => {
                        if let Some(outer) = &self.scope.outer_instance {
                            params.push(FieldType::Object(outer.clone()));
                            self.code.push(Instruction::Load {
                                kind: ValueKind::Reference,
                                index: 1,
                            });
                        }
                        self.scope.class.clone()
                    }
                };
                params.extend(parameter_types.iter().cloned());
                self.arguments(arguments)?;
                self.code.push(Instruction::InvokeSpecial {
                    method: MethodRef {
                        owner: owner.to_slash_qualified(),
                        name: CONSTRUCTOR_NAME.to_owned(),
                        descriptor: MethodDescriptor::new(params, ReturnType::Void),
                    },
                    interface: false,
                });
            }
            Statement::Expression(expr) => {
                let ty = self.scope.type_of(expr)?;
                self.expression(expr)?;
                match ty {
                    ReturnType::Type(ty) if ty.slot_size() == 2 => self.code.push(Instruction::Pop2),
                    ReturnType::Type(_) => self.code.push(Instruction::Pop),
                    ReturnType::Void => {}
                }
            }
        }
        Ok(())
    }

    fn expression(&mut self, expr: &Expression) -> Result<(), CodegenError> {
        match expr {
            Expression::Variable(name) => {
                let local = self
                    .scope
                    .local(name)
                    .ok_or_else(|| self.scope.violation(format!("unknown variable `{name}`")))?;
                self.code.push(Instruction::Load {
                    kind: ValueKind::of(&local.ty),
                    index: local.slot,
                });
            }
            Expression::This => self.load_this(),
            Expression::Cast { target, cast_to } => {
                let from = self.scope.value_type(target)?;
                let to = cast_to.erase();
                self.expression(target)?;
                match (&from, &to) {
                    (FieldType::Base(a), FieldType::Base(b)) => {
                        let path = Conversion::path(*a, *b).ok_or_else(|| {
                            self.scope.violation(format!("cannot cast {} to {}", from.java_name(), to.java_name()))
                        })?;
                        self.code.extend(path.into_iter().map(Instruction::Convert));
                    }
                    _ if from == to => {}
                    _ => {
                        if let Some(class) = to.class_constant_name() {
                            self.code.push(Instruction::CheckCast(class));
                        }
                    }
                }
            }
            Expression::Field {
                receiver,
                name,
                owner,
                field_type,
            } => {
                let field = FieldRef {
                    owner: owner.to_slash_qualified(),
                    name: name.clone(),
                    field_type: field_type.clone(),
                };
                match receiver {
                    Receiver::Class(_) => self.code.push(Instruction::GetStatic(field)),
                    Receiver::Super => {
                        self.load_this();
                        self.code.push(Instruction::GetField(field));
                    }
                    Receiver::Expression(object) => {
                        self.expression(object)?;
                        self.code.push(Instruction::GetField(field));
                    }
                }
            }
            Expression::MethodCall {
                receiver,
                name,
                owner,
                descriptor,
                arguments,
            } => {
                let method = MethodRef {
                    owner: owner.to_slash_qualified(),
                    name: name.clone(),
                    descriptor: descriptor.clone(),
                };
                let interface = self.is_interface(owner)?;
                match receiver {
                    Some(Receiver::Class(_)) => {
                        self.arguments(arguments)?;
                        self.code.push(Instruction::InvokeStatic { method, interface });
                    }
                    Some(Receiver::Super) => {
                        self.load_this();
                        self.arguments(arguments)?;
                        self.code.push(Instruction::InvokeSpecial { method, interface });
                    }
                    Some(Receiver::Expression(object)) => {
                        self.expression(object)?;
                        self.arguments(arguments)?;
                        self.code.push(dynamic_call(method, interface));
                    }
                    None => {
                        self.load_this();
                        self.arguments(arguments)?;
                        self.code.push(dynamic_call(method, interface));
                    }
                }
            }
            Expression::ConstructorCall {
                outer,
                constructing,
                parameter_types,
                arguments,
            } => {
                let class = constructing.erase().to_slash_qualified();
                self.code.push(Instruction::New(class.clone()));
                self.code.push(Instruction::Dup);
                let mut params = Vec::new();
                if let Some(outer) = outer {
                    params.push(self.scope.value_type(outer)?);
                    self.expression(outer)?;
                }
                params.extend(parameter_types.iter().cloned());
                self.arguments(arguments)?;
                self.code.push(Instruction::InvokeSpecial {
                    method: MethodRef {
                        owner: class,
                        name: CONSTRUCTOR_NAME.to_owned(),
                        descriptor: MethodDescriptor::new(params, ReturnType::Void),
                    },
                    interface: false,
                });
            }
            Expression::ArrayConstructor { component, size } => {
                self.expression(size)?;
                self.code
                    .push(Instruction::ANewArray(component.erase().to_slash_qualified()));
            }
        }
        Ok(())
    }

    fn arguments(&mut self, arguments: &[Expression]) -> Result<(), CodegenError> {
        for argument in arguments {
            self.expression(argument)?;
        }
        Ok(())
    }

    fn load_this(&mut self) {
        self.code.push(Instruction::Load {
            kind: ValueKind::Reference,
            index: 0,
        });
    }

    fn is_interface(&self, owner: &QualifiedName) -> Result<bool, CodegenError> {
        match self.local_interfaces.get(owner) {
            Some(&is_interface) => Ok(is_interface),
            None => Ok(self.index.is_interface(owner)?),
        }
    }
}

fn dynamic_call(method: MethodRef, interface: bool) -> Instruction {
    if interface {
        Instruction::InvokeInterface(method)
    } else {
        Instruction::InvokeVirtual(method)
    }
}
