use std::fs::File;
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use versa_abstractor::{Abstractor, AbstractorError, VersionPackage};
use versa_classfile::access::{ACC_ABSTRACT, ACC_INTERFACE, ACC_PUBLIC, ACC_SUPER};
use versa_classfile::{BaseType, ClassFile, ClassWriter, FieldType, GenericType, MethodDescriptor, ReturnType};
use versa_classpath::{ClassEntry, ClasspathIndex};
use versa_codegen::{
    ClassInfo, Expression, JavaClassType, JavaType, MethodInfo, MethodModifiers, Receiver, Statement, Visibility,
};
use versa_config::{OutputFormat, VersaConfig};
use versa_core::QualifiedName;

fn name(internal: &str) -> QualifiedName {
    QualifiedName::from_slash_qualified(internal)
}

fn write_jdk(root: &Path) {
    std::fs::create_dir_all(root.join("jmods")).unwrap();
    let mut zip = zip::ZipWriter::new(File::create(root.join("jmods/java.base.jmod")).unwrap());
    for (internal, access) in [
        ("java/lang/Object", ACC_PUBLIC | ACC_SUPER),
        ("java/util/List", ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT),
    ] {
        let super_class = (internal != "java/lang/Object").then_some("java/lang/Object");
        let bytes = ClassWriter::new(access, internal, super_class, &[]).unwrap().to_bytes().unwrap();
        zip.start_file(format!("classes/{internal}.class"), zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(&bytes).unwrap();
    }
    zip.finish().unwrap();
}

/// `BaseWorld` with `int count(List<?> items) { return items.size(); }`.
fn base_world(version: &VersionPackage) -> ClassInfo {
    let world = version.base_name(&name("net/minecraft/world/World"));
    let list = JavaClassType::raw(&name("java/util/List"));
    let mut info = ClassInfo::new(world.short_name().outermost(), Visibility::Public, move |class| {
        let mut parameters = IndexMap::new();
        parameters.insert("items".to_owned(), list.into());
        class.add_method(
            MethodInfo::new(Visibility::Public, parameters, |body| {
                body.add_statement(Statement::Return(Expression::MethodCall {
                    receiver: Some(Receiver::Expression(Box::new(Expression::variable("items")))),
                    name: "size".to_owned(),
                    owner: QualifiedName::from_slash_qualified("java/util/List"),
                    descriptor: MethodDescriptor::new(vec![], ReturnType::Type(FieldType::Base(BaseType::Int))),
                    arguments: vec![],
                }))
            }),
            MethodModifiers::default(),
            vec![],
            "count",
            JavaType::new(GenericType::Primitive(BaseType::Int)).into(),
        )
    });
    info.is_abstract = true;
    info
}

#[test]
fn bytecode_session_resolves_java_classes_through_the_jdk() {
    let tmp = tempdir().unwrap();
    let jdk = tmp.path().join("jdk");
    write_jdk(&jdk);
    let config = VersaConfig::load_from_str(&format!(
        "version_package = \"v1_16_5\"\n[jdk]\nhome = {:?}\n[output]\ndir = {:?}\n",
        jdk.display().to_string(),
        tmp.path().join("out").display().to_string(),
    ))
    .unwrap();

    let session = Abstractor::new(&config).unwrap();
    let world = session.version().base_name(&name("net/minecraft/world/World"));
    assert_eq!(world.to_slash_qualified(), "v1_16_5/net/minecraft/world/BaseWorld");

    let written = session
        .write_class(base_world(session.version()), world.package())
        .unwrap();
    assert_eq!(
        written,
        vec![tmp.path().join("out/v1_16_5/net/minecraft/world/BaseWorld.class")]
    );

    let class = ClassFile::parse(&std::fs::read(&written[0]).unwrap()).unwrap();
    assert_eq!(class.access_flags, ACC_PUBLIC | ACC_SUPER | ACC_ABSTRACT);
    let code = class.method("count", "(Ljava/util/List;)I").unwrap().code.as_ref().unwrap();
    // aload_1, invokeinterface java/util/List.size, ireturn
    assert_eq!(code.code[0], 0x2b);
    assert_eq!(code.code[1], 0xb9);
}

#[test]
fn java_session_writes_sources() {
    let tmp = tempdir().unwrap();
    let version = VersionPackage::new("v1_16_5").unwrap();
    let session = Abstractor::from_parts(
        version.clone(),
        ClasspathIndex::from_entries([ClassEntry::new(
            name("java/util/List"),
            ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT,
            Some(QualifiedName::java_lang_object()),
            vec![],
        )]),
        OutputFormat::Java,
        tmp.path().to_path_buf(),
    );
    let world = version.base_name(&name("net/minecraft/world/World"));
    let written = session.write_class(base_world(&version), world.package()).unwrap();
    assert_eq!(written, vec![tmp.path().join("v1_16_5/net/minecraft/world/BaseWorld.java")]);

    let source = std::fs::read_to_string(&written[0]).unwrap();
    assert!(source.starts_with("package v1_16_5.net.minecraft.world;\n\nimport java.util.List;\n"), "{source}");
    assert!(source.contains("public abstract class BaseWorld {"), "{source}");
    assert!(source.contains("        return items.size();"), "{source}");
}

#[test]
fn configuration_errors_surface() {
    let config = VersaConfig::default();
    assert!(matches!(
        Abstractor::new(&config),
        Err(AbstractorError::InvalidVersionPackage(_))
    ));

    let tmp = tempdir().unwrap();
    let config = VersaConfig {
        version_package: "v1".to_owned(),
        jdk: versa_config::JdkConfig {
            home: Some(tmp.path().join("no-jdk-here")),
        },
        ..VersaConfig::default()
    };
    assert!(matches!(Abstractor::new(&config), Err(AbstractorError::Jdk(_))));
}
