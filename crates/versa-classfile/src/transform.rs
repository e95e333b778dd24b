//! Structural transforms over descriptors and signatures: erasure, class-name
//! remapping and type-variable substitution.

use std::collections::HashMap;
use std::sync::Arc;

use versa_core::QualifiedName;

use crate::descriptor::{FieldType, MethodDescriptor, ReturnType};
use crate::signature::{
    ClassGenericType, ClassSignature, GenericReturnType, GenericType, MethodSignature,
    SimpleClassGenericType, TypeArgument, TypeArgumentDeclaration, TypeVariable,
};

/// Generic type → descriptor.
pub trait Erase {
    type Erased;

    fn erase(&self) -> Self::Erased;
}

impl Erase for GenericType {
    type Erased = FieldType;

    fn erase(&self) -> FieldType {
        match self {
            GenericType::Primitive(base) => FieldType::Base(*base),
            GenericType::Class(class) => FieldType::Object(class.erase()),
            GenericType::Array(component) => FieldType::array(component.erase()),
            GenericType::TypeVariable(var) => var.erase(),
        }
    }
}

impl Erase for TypeVariable {
    type Erased = FieldType;

    fn erase(&self) -> FieldType {
        match self.declaration.bounds().next() {
            Some(bound) => bound.erase(),
            None => FieldType::Object(QualifiedName::java_lang_object()),
        }
    }
}

impl Erase for ClassGenericType {
    type Erased = QualifiedName;

    fn erase(&self) -> QualifiedName {
        self.name()
    }
}

impl Erase for GenericReturnType {
    type Erased = ReturnType;

    fn erase(&self) -> ReturnType {
        match self {
            GenericReturnType::Void => ReturnType::Void,
            GenericReturnType::Type(ty) => ReturnType::Type(ty.erase()),
        }
    }
}

impl Erase for MethodSignature {
    type Erased = MethodDescriptor;

    fn erase(&self) -> MethodDescriptor {
        MethodDescriptor::new(
            self.parameters.iter().map(Erase::erase).collect(),
            self.return_type.erase(),
        )
    }
}

/// Rewrites every class name contained in a value. A mapping result of `None`
/// keeps the original name.
pub trait Remap: Sized {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>;
}

impl Remap for QualifiedName {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        f(self).unwrap_or_else(|| self.clone())
    }
}

impl Remap for FieldType {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        match self {
            FieldType::Base(base) => FieldType::Base(*base),
            FieldType::Object(name) => FieldType::Object(name.remap(f)),
            FieldType::Array(component) => FieldType::array(component.remap(f)),
        }
    }
}

impl Remap for ReturnType {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        match self {
            ReturnType::Void => ReturnType::Void,
            ReturnType::Type(ty) => ReturnType::Type(ty.remap(f)),
        }
    }
}

impl Remap for MethodDescriptor {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        MethodDescriptor::new(self.params.remap(f), self.return_type.remap(f))
    }
}

impl Remap for GenericType {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        match self {
            GenericType::Primitive(base) => GenericType::Primitive(*base),
            GenericType::Class(class) => GenericType::Class(class.remap(f)),
            GenericType::Array(component) => GenericType::array(component.remap(f)),
            GenericType::TypeVariable(var) => GenericType::TypeVariable(var.remap(f)),
        }
    }
}

impl Remap for GenericReturnType {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        match self {
            GenericReturnType::Void => GenericReturnType::Void,
            GenericReturnType::Type(ty) => GenericReturnType::Type(ty.remap(f)),
        }
    }
}

impl Remap for ClassGenericType {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        let remap_args = |segment: &SimpleClassGenericType| {
            segment.type_arguments.as_ref().map(|args| args.remap(f))
        };

        let Some(renamed) = f(&self.name()) else {
            return ClassGenericType {
                package: self.package.clone(),
                segments: self
                    .segments
                    .iter()
                    .map(|segment| SimpleClassGenericType {
                        name: segment.name.clone(),
                        type_arguments: remap_args(segment),
                    })
                    .collect(),
            };
        };

        // Arguments stay attached to the innermost segments when the nesting
        // depth changes.
        let (package, short_name) = renamed.into_parts();
        let components = short_name.components();
        let offset = self.segments.len() as isize - components.len() as isize;
        let segments = components
            .iter()
            .enumerate()
            .map(|(i, component)| {
                let source = i as isize + offset;
                let type_arguments = usize::try_from(source)
                    .ok()
                    .and_then(|source| self.segments.get(source))
                    .and_then(&remap_args);
                SimpleClassGenericType {
                    name: component.clone(),
                    type_arguments,
                }
            })
            .collect();
        ClassGenericType { package, segments }
    }
}

impl Remap for TypeArgument {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        match self {
            TypeArgument::Any => TypeArgument::Any,
            TypeArgument::Specific { ty, wildcard } => TypeArgument::Specific {
                ty: ty.remap(f),
                wildcard: *wildcard,
            },
        }
    }
}

impl Remap for TypeArgumentDeclaration {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        TypeArgumentDeclaration {
            name: self.name.clone(),
            class_bound: self.class_bound.remap(f),
            interface_bounds: self.interface_bounds.remap(f),
        }
    }
}

impl Remap for Arc<TypeArgumentDeclaration> {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        Arc::new(self.as_ref().remap(f))
    }
}

impl Remap for TypeVariable {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        TypeVariable {
            name: self.name.clone(),
            declaration: self.declaration.remap(f),
        }
    }
}

impl Remap for ClassSignature {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        ClassSignature {
            type_parameters: self.type_parameters.remap(f),
            super_class: self.super_class.remap(f),
            super_interfaces: self.super_interfaces.remap(f),
        }
    }
}

impl Remap for MethodSignature {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        MethodSignature {
            type_parameters: self.type_parameters.remap(f),
            parameters: self.parameters.remap(f),
            return_type: self.return_type.remap(f),
            throws: self.throws.remap(f),
        }
    }
}

impl<T: Remap> Remap for Vec<T> {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        self.iter().map(|item| item.remap(f)).collect()
    }
}

impl<T: Remap> Remap for Option<T> {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        self.as_ref().map(|item| item.remap(f))
    }
}

/// Replaces type-variable occurrences. Declarations are rewritten as well, so
/// bounds that mention a substituted variable follow along.
pub trait MapTypeVariables: Sized {
    fn map_type_variables<F>(&self, f: &F) -> Self
    where
        F: Fn(&TypeVariable) -> GenericType;

    /// Replaces every variable bound in `bindings` (by name), leaving others as is.
    fn substitute(&self, bindings: &HashMap<String, GenericType>) -> Self {
        self.map_type_variables(&|var: &TypeVariable| {
            bindings
                .get(&var.name)
                .cloned()
                .unwrap_or_else(|| GenericType::TypeVariable(var.clone()))
        })
    }
}

impl MapTypeVariables for GenericType {
    fn map_type_variables<F>(&self, f: &F) -> Self
    where
        F: Fn(&TypeVariable) -> GenericType,
    {
        match self {
            GenericType::Primitive(base) => GenericType::Primitive(*base),
            GenericType::Class(class) => GenericType::Class(class.map_type_variables(f)),
            GenericType::Array(component) => GenericType::array(component.map_type_variables(f)),
            GenericType::TypeVariable(var) => f(var),
        }
    }
}

impl MapTypeVariables for GenericReturnType {
    fn map_type_variables<F>(&self, f: &F) -> Self
    where
        F: Fn(&TypeVariable) -> GenericType,
    {
        match self {
            GenericReturnType::Void => GenericReturnType::Void,
            GenericReturnType::Type(ty) => GenericReturnType::Type(ty.map_type_variables(f)),
        }
    }
}

impl MapTypeVariables for ClassGenericType {
    fn map_type_variables<F>(&self, f: &F) -> Self
    where
        F: Fn(&TypeVariable) -> GenericType,
    {
        ClassGenericType {
            package: self.package.clone(),
            segments: self
                .segments
                .iter()
                .map(|segment| SimpleClassGenericType {
                    name: segment.name.clone(),
                    type_arguments: segment
                        .type_arguments
                        .as_ref()
                        .map(|args| args.map_type_variables(f)),
                })
                .collect(),
        }
    }
}

impl MapTypeVariables for TypeArgument {
    fn map_type_variables<F>(&self, f: &F) -> Self
    where
        F: Fn(&TypeVariable) -> GenericType,
    {
        match self {
            TypeArgument::Any => TypeArgument::Any,
            TypeArgument::Specific { ty, wildcard } => TypeArgument::Specific {
                ty: ty.map_type_variables(f),
                wildcard: *wildcard,
            },
        }
    }
}

impl MapTypeVariables for Arc<TypeArgumentDeclaration> {
    fn map_type_variables<F>(&self, f: &F) -> Self
    where
        F: Fn(&TypeVariable) -> GenericType,
    {
        Arc::new(TypeArgumentDeclaration {
            name: self.name.clone(),
            class_bound: self.class_bound.as_ref().map(|b| b.map_type_variables(f)),
            interface_bounds: self.interface_bounds.map_type_variables(f),
        })
    }
}

impl MapTypeVariables for MethodSignature {
    fn map_type_variables<F>(&self, f: &F) -> Self
    where
        F: Fn(&TypeVariable) -> GenericType,
    {
        MethodSignature {
            type_parameters: self.type_parameters.map_type_variables(f),
            parameters: self.parameters.map_type_variables(f),
            return_type: self.return_type.map_type_variables(f),
            throws: self.throws.map_type_variables(f),
        }
    }
}

impl<T: MapTypeVariables> MapTypeVariables for Vec<T> {
    fn map_type_variables<F>(&self, f: &F) -> Self
    where
        F: Fn(&TypeVariable) -> GenericType,
    {
        self.iter().map(|item| item.map_type_variables(f)).collect()
    }
}
