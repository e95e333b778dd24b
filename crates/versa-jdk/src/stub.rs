use versa_classfile::ClassFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JdkMethodStub {
    pub access_flags: u16,
    pub name: String,
    /// JVM method descriptor, e.g. `(Ljava/lang/String;)V`.
    pub descriptor: String,
}

/// The declared shape of one JDK class. Only methods declared by the class
/// itself are listed; inherited members live on the supertypes' stubs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JdkClassStub {
    /// Internal name, e.g. `java/lang/String`.
    pub internal_name: String,
    pub access_flags: u16,
    pub super_internal_name: Option<String>,
    pub interfaces_internal_names: Vec<String>,
    pub methods: Vec<JdkMethodStub>,
}

impl From<ClassFile> for JdkClassStub {
    fn from(class_file: ClassFile) -> Self {
        JdkClassStub {
            internal_name: class_file.this_class,
            access_flags: class_file.access_flags,
            super_internal_name: class_file.super_class,
            interfaces_internal_names: class_file.interfaces,
            methods: class_file
                .methods
                .into_iter()
                .map(|m| JdkMethodStub {
                    access_flags: m.access_flags,
                    name: m.name,
                    descriptor: m.descriptor,
                })
                .collect(),
        }
    }
}
