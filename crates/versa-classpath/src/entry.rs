use std::collections::HashMap;

use versa_classfile::access::ACC_INTERFACE;
use versa_classfile::{parse_method_descriptor, ClassFile, MethodDescriptor};
use versa_core::QualifiedName;
use versa_jdk::JdkClassStub;

/// A method is identified by its name and raw descriptor string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodIdentifier {
    pub name: String,
    pub descriptor: String,
}

impl MethodIdentifier {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodEntry {
    pub id: MethodIdentifier,
    pub access: u16,
}

impl MethodEntry {
    pub fn descriptor(&self) -> versa_classfile::Result<MethodDescriptor> {
        parse_method_descriptor(&self.id.descriptor)
    }
}

/// Hierarchy and method metadata of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
    pub name: QualifiedName,
    pub access: u16,
    pub super_class: Option<QualifiedName>,
    pub super_interfaces: Vec<QualifiedName>,
    pub methods: HashMap<MethodIdentifier, MethodEntry>,
}

impl ClassEntry {
    pub fn new(
        name: QualifiedName,
        access: u16,
        super_class: Option<QualifiedName>,
        super_interfaces: Vec<QualifiedName>,
    ) -> Self {
        Self {
            name,
            access,
            super_class,
            super_interfaces,
            methods: HashMap::new(),
        }
    }

    pub fn with_method(mut self, name: &str, descriptor: &str, access: u16) -> Self {
        self.insert_method(name.to_owned(), descriptor.to_owned(), access);
        self
    }

    fn insert_method(&mut self, name: String, descriptor: String, access: u16) {
        let id = MethodIdentifier { name, descriptor };
        self.methods.insert(id.clone(), MethodEntry { id, access });
    }

    pub fn is_interface(&self) -> bool {
        self.access & ACC_INTERFACE != 0
    }

    /// Superinterfaces in declaration order, then the superclass.
    pub fn direct_super_types(&self) -> Vec<QualifiedName> {
        let mut out = self.super_interfaces.clone();
        out.extend(self.super_class.iter().cloned());
        out
    }
}

impl From<ClassFile> for ClassEntry {
    fn from(class_file: ClassFile) -> Self {
        let mut entry = ClassEntry::new(
            QualifiedName::from_slash_qualified(&class_file.this_class),
            class_file.access_flags,
            class_file
                .super_class
                .as_deref()
                .map(QualifiedName::from_slash_qualified),
            class_file
                .interfaces
                .iter()
                .map(|i| QualifiedName::from_slash_qualified(i))
                .collect(),
        );
        for method in class_file.methods {
            entry.insert_method(method.name, method.descriptor, method.access_flags);
        }
        entry
    }
}

impl From<&JdkClassStub> for ClassEntry {
    fn from(stub: &JdkClassStub) -> Self {
        let mut entry = ClassEntry::new(
            QualifiedName::from_slash_qualified(&stub.internal_name),
            stub.access_flags,
            stub.super_internal_name
                .as_deref()
                .map(QualifiedName::from_slash_qualified),
            stub.interfaces_internal_names
                .iter()
                .map(|i| QualifiedName::from_slash_qualified(i))
                .collect(),
        );
        for method in &stub.methods {
            entry.insert_method(method.name.clone(), method.descriptor.clone(), method.access_flags);
        }
        entry
    }
}
