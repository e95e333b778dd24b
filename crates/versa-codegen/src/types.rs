use versa_classfile::{
    ClassGenericType, Erase, GenericReturnType, GenericType, Remap,
};
use versa_classfile::access::{ACC_PRIVATE, ACC_PROTECTED, ACC_PUBLIC};
use versa_core::QualifiedName;

/// A generic type together with the (element-less) annotations placed on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JavaType<T> {
    pub ty: T,
    pub annotations: Vec<JavaAnnotation>,
}

pub type AnyJavaType = JavaType<GenericType>;
pub type JavaClassType = JavaType<ClassGenericType>;
pub type JavaReturnType = JavaType<GenericReturnType>;

impl<T> JavaType<T> {
    pub fn new(ty: T) -> Self {
        Self {
            ty,
            annotations: Vec::new(),
        }
    }

    pub fn annotated(ty: T, annotations: Vec<JavaAnnotation>) -> Self {
        Self { ty, annotations }
    }
}

impl JavaClassType {
    /// Raw reference to `name`.
    pub fn raw(name: &QualifiedName) -> Self {
        Self::new(ClassGenericType::raw(name))
    }
}

impl JavaReturnType {
    pub fn void() -> Self {
        Self::new(GenericReturnType::Void)
    }
}

impl From<JavaClassType> for AnyJavaType {
    fn from(value: JavaClassType) -> Self {
        JavaType::annotated(GenericType::Class(value.ty), value.annotations)
    }
}

impl From<AnyJavaType> for JavaReturnType {
    fn from(value: AnyJavaType) -> Self {
        JavaType::annotated(GenericReturnType::Type(value.ty), value.annotations)
    }
}

impl<T: Erase> Erase for JavaType<T> {
    type Erased = T::Erased;

    fn erase(&self) -> T::Erased {
        self.ty.erase()
    }
}

impl<T: Remap> Remap for JavaType<T> {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        JavaType {
            ty: self.ty.remap(f),
            annotations: self.annotations.remap(f),
        }
    }
}

/// A runtime-visible marker annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JavaAnnotation {
    pub type_name: QualifiedName,
}

impl JavaAnnotation {
    pub fn new(type_name: QualifiedName) -> Self {
        Self { type_name }
    }

    /// Field descriptor of the annotation interface, as stored in class files.
    pub fn descriptor(&self) -> String {
        format!("L{};", self.type_name.to_slash_qualified())
    }
}

impl Remap for JavaAnnotation {
    fn remap<F>(&self, f: &F) -> Self
    where
        F: Fn(&QualifiedName) -> Option<QualifiedName>,
    {
        JavaAnnotation::new(self.type_name.remap(f))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Protected,
    Package,
    Private,
}

impl Visibility {
    pub fn access_flags(self) -> u16 {
        match self {
            Visibility::Public => ACC_PUBLIC,
            Visibility::Protected => ACC_PROTECTED,
            Visibility::Package => 0,
            Visibility::Private => ACC_PRIVATE,
        }
    }

    /// Source modifier including its trailing space; empty for package access.
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Public => "public ",
            Visibility::Protected => "protected ",
            Visibility::Package => "",
            Visibility::Private => "private ",
        }
    }
}
