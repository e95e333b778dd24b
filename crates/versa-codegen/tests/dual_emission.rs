use std::collections::BTreeSet;
use std::path::PathBuf;

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use versa_classfile::access::{ACC_ABSTRACT, ACC_INTERFACE, ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC, ACC_SUPER};
use versa_classfile::{
    parse_class_signature, BaseType, ClassFile, ClassGenericType, FieldType, GenericType, MethodDescriptor,
    ReturnType, TypeArgument, TypeVariable,
};
use versa_classpath::{ClassEntry, ClasspathIndex};
use versa_codegen::{
    describe_class, AnyJavaType, BytecodeGenerator, ClassInfo, CodeGenerator, CodegenError, Expression,
    JavaClassType, JavaReturnType, JavaSourceGenerator, JavaType, MethodInfo, MethodModifiers, Receiver,
    SelfConstructor, Statement, Visibility,
};
use versa_core::{PackageName, QualifiedName};

fn name(internal: &str) -> QualifiedName {
    QualifiedName::from_slash_qualified(internal)
}

fn object() -> AnyJavaType {
    JavaType::new(GenericType::class(&QualifiedName::java_lang_object()))
}

fn string() -> AnyJavaType {
    JavaType::new(GenericType::class(&name("java/lang/String")))
}

fn list_of_strings() -> AnyJavaType {
    JavaType::new(GenericType::Class(ClassGenericType::from_name_and_type_args(
        &name("java/util/List"),
        vec![TypeArgument::exact(string().ty)],
    )))
}

fn int() -> AnyJavaType {
    JavaType::new(GenericType::Primitive(BaseType::Int))
}

fn params(list: Vec<(&str, AnyJavaType)>) -> IndexMap<String, AnyJavaType> {
    list.into_iter().map(|(name, ty)| (name.to_owned(), ty)).collect()
}

fn delegate() -> Expression {
    Expression::this_field(&name("gen/demo/Wrapper"), "delegate", FieldType::object("java/util/List"))
}

fn index() -> ClasspathIndex {
    ClasspathIndex::from_entries([
        ClassEntry::new(QualifiedName::java_lang_object(), ACC_PUBLIC | ACC_SUPER, None, vec![]),
        ClassEntry::new(
            name("java/lang/String"),
            ACC_PUBLIC | ACC_SUPER,
            Some(QualifiedName::java_lang_object()),
            vec![],
        ),
        ClassEntry::new(
            name("java/util/List"),
            ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT,
            Some(QualifiedName::java_lang_object()),
            vec![],
        ),
    ])
}

fn wrapper() -> ClassInfo {
    ClassInfo::new("Wrapper", Visibility::Public, |class| {
        class.add_field(
            "FALLBACK",
            object(),
            Visibility::Private,
            true,
            true,
            Some(Expression::ConstructorCall {
                outer: None,
                constructing: JavaClassType::raw(&QualifiedName::java_lang_object()),
                parameter_types: vec![],
                arguments: vec![],
            }),
        )?;
        class.add_field("delegate", list_of_strings(), Visibility::Private, false, true, None)?;
        class.add_field("selfRef", object(), Visibility::Private, false, false, Some(Expression::This))?;
        class.add_field(
            "label",
            string(),
            Visibility::Private,
            false,
            false,
            Some(Expression::MethodCall {
                receiver: Some(Receiver::Expression(Box::new(Expression::This))),
                name: "toString".to_owned(),
                owner: QualifiedName::java_lang_object(),
                descriptor: MethodDescriptor::new(vec![], ReturnType::Type(FieldType::object("java/lang/String"))),
                arguments: vec![],
            }),
        )?;

        class.add_constructor(MethodInfo::new(
            Visibility::Public,
            params(vec![("delegate", list_of_strings())]),
            |body| {
                body.add_statement(Statement::ConstructorCall {
                    kind: SelfConstructor::Super,
                    parameter_types: vec![],
                    arguments: vec![],
                })?;
                body.add_statement(Statement::Assignment {
                    target: delegate(),
                    value: Expression::variable("delegate"),
                })
            },
        ))?;

        class.add_method(
            MethodInfo::new(Visibility::Public, IndexMap::new(), |body| {
                body.add_statement(Statement::Return(Expression::MethodCall {
                    receiver: Some(Receiver::Expression(Box::new(delegate()))),
                    name: "size".to_owned(),
                    owner: name("java/util/List"),
                    descriptor: MethodDescriptor::new(vec![], ReturnType::Type(FieldType::Base(BaseType::Int))),
                    arguments: vec![],
                }))
            }),
            MethodModifiers::default(),
            vec![],
            "size",
            int().into(),
        )?;

        class.add_method(
            MethodInfo::new(Visibility::Public, params(vec![("index", int())]), |body| {
                body.add_comment("the list is raw in bytecode")?;
                body.add_statement(Statement::Return(Expression::cast(
                    Expression::MethodCall {
                        receiver: Some(Receiver::Expression(Box::new(delegate()))),
                        name: "get".to_owned(),
                        owner: name("java/util/List"),
                        descriptor: MethodDescriptor::new(
                            vec![FieldType::Base(BaseType::Int)],
                            ReturnType::Type(FieldType::object("java/lang/Object")),
                        ),
                        arguments: vec![Expression::variable("index")],
                    },
                    string(),
                )))
            }),
            MethodModifiers::default(),
            vec![],
            "at",
            string().into(),
        )?;

        class.add_method(
            MethodInfo::new(Visibility::Public, params(vec![("list", list_of_strings())]), |body| {
                body.add_statement(Statement::Return(Expression::ConstructorCall {
                    outer: None,
                    constructing: JavaClassType::raw(&name("gen/demo/Wrapper")),
                    parameter_types: vec![FieldType::object("java/util/List")],
                    arguments: vec![Expression::variable("list")],
                }))
            }),
            MethodModifiers {
                is_static: true,
                ..MethodModifiers::default()
            },
            vec![],
            "wrap",
            JavaType::new(GenericType::class(&name("gen/demo/Wrapper"))).into(),
        )?;

        class.add_inner_class(ClassInfo::new("Entry", Visibility::Package, |_| Ok(())), true)
    })
}

fn package() -> PackageName {
    PackageName::from_slashed("gen/demo").unwrap()
}

/// Opcodes of a straight-line code array, operands skipped.
fn opcodes(code: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut pc = 0;
    while pc < code.len() {
        let opcode = code[pc];
        out.push(opcode);
        pc += match opcode {
            0x15..=0x19 | 0x36..=0x3a => 2,
            0xb2..=0xb8 | 0xbb | 0xbd | 0xc0 => 3,
            0xb9 => 5,
            _ => 1,
        };
    }
    out
}

/// Two initialized instance fields, an empty constructor and one that
/// delegates with `this()`.
fn pair() -> ClassInfo {
    ClassInfo::new("Pair", Visibility::Public, |class| {
        class.add_field("origin", object(), Visibility::Private, false, false, Some(Expression::This))?;
        class.add_field(
            "seed",
            object(),
            Visibility::Private,
            false,
            true,
            Some(Expression::ConstructorCall {
                outer: None,
                constructing: JavaClassType::raw(&QualifiedName::java_lang_object()),
                parameter_types: vec![],
                arguments: vec![],
            }),
        )?;
        class.add_constructor(MethodInfo::empty(Visibility::Public, IndexMap::new()))?;
        class.add_constructor(MethodInfo::new(
            Visibility::Public,
            params(vec![("hint", object())]),
            |body| {
                body.add_statement(Statement::ConstructorCall {
                    kind: SelfConstructor::This,
                    parameter_types: vec![],
                    arguments: vec![],
                })
            },
        ))
    })
}

#[test]
fn java_source_output() {
    let description = describe_class(wrapper(), Some(&package())).unwrap();
    let source = JavaSourceGenerator::new().render(&description);
    let expected = "\
package gen.demo;

import java.util.List;

public class Wrapper {
    private static final Object FALLBACK;
    private final List<String> delegate;
    private Object selfRef;
    private String label;

    static {
        FALLBACK = new Object();
    }

    public Wrapper(List<String> delegate) {
        super();
        this.selfRef = this;
        this.label = this.toString();
        this.delegate = delegate;
    }

    public int size() {
        return this.delegate.size();
    }

    public String at(int index) {
        // the list is raw in bytecode
        return (String) this.delegate.get(index);
    }

    public static Wrapper wrap(List<String> list) {
        return new Wrapper(list);
    }

    static class Entry {
    }
}
";
    assert_eq!(source, expected);
}

#[test]
fn constructor_receives_initializers_once_in_order() {
    let description = describe_class(wrapper(), Some(&package())).unwrap();
    let constructors: Vec<_> = description.constructors().collect();
    assert_eq!(constructors.len(), 1);
    let assigned: Vec<&str> = constructors[0]
        .statements()
        .filter_map(|statement| match statement {
            Statement::Assignment {
                target: Expression::Field { name, .. },
                ..
            } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(assigned, vec!["selfRef", "label", "delegate"]);
}

#[test]
fn bytecode_matches_source_members() {
    let index = index();
    let out = tempdir().unwrap();
    let written = BytecodeGenerator::new(&index)
        .write_class(wrapper(), Some(&package()), out.path())
        .unwrap();
    let written: BTreeSet<_> = written
        .iter()
        .map(|path| path.strip_prefix(out.path()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        written,
        BTreeSet::from([
            PathBuf::from("gen/demo/Wrapper.class"),
            PathBuf::from("gen/demo/Wrapper$Entry.class"),
        ])
    );

    let class = ClassFile::parse(&std::fs::read(out.path().join("gen/demo/Wrapper.class")).unwrap()).unwrap();
    assert_eq!(class.this_class, "gen/demo/Wrapper");
    assert_eq!(class.super_class.as_deref(), Some("java/lang/Object"));
    assert_eq!(class.access_flags, ACC_PUBLIC | ACC_SUPER);
    assert_eq!(class.source_file.as_deref(), Some("Wrapper.java"));
    assert_eq!(class.signature, None);

    let fields: Vec<(&str, &str)> = class
        .fields
        .iter()
        .map(|field| (field.name.as_str(), field.descriptor.as_str()))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("FALLBACK", "Ljava/lang/Object;"),
            ("delegate", "Ljava/util/List;"),
            ("selfRef", "Ljava/lang/Object;"),
            ("label", "Ljava/lang/String;"),
        ]
    );
    assert_eq!(
        class.field("delegate").unwrap().signature.as_deref(),
        Some("Ljava/util/List<Ljava/lang/String;>;")
    );

    let methods: Vec<(&str, &str)> = class
        .methods
        .iter()
        .map(|method| (method.name.as_str(), method.descriptor.as_str()))
        .collect();
    assert_eq!(
        methods,
        vec![
            ("<clinit>", "()V"),
            ("<init>", "(Ljava/util/List;)V"),
            ("size", "()I"),
            ("at", "(I)Ljava/lang/String;"),
            ("wrap", "(Ljava/util/List;)Lgen/demo/Wrapper;"),
        ]
    );
    let wrap = class.method("wrap", "(Ljava/util/List;)Lgen/demo/Wrapper;").unwrap();
    assert_eq!(wrap.access_flags, ACC_PUBLIC | ACC_STATIC);
    assert_eq!(
        wrap.signature.as_deref(),
        Some("(Ljava/util/List<Ljava/lang/String;>;)Lgen/demo/Wrapper;")
    );

    // aload_0, getfield, invokeinterface List.size, ireturn
    let size = class.method("size", "()I").unwrap().code.as_ref().unwrap();
    assert_eq!(size.max_locals, 1);
    assert_eq!(size.code.len(), 10);
    assert_eq!(size.code[0], 0x2a);
    assert_eq!(size.code[1], 0xb4);
    assert_eq!(size.code[4], 0xb9);
    assert_eq!(&size.code[7..], &[1, 0, 0xac]);

    let at = class.method("at", "(I)Ljava/lang/String;").unwrap().code.as_ref().unwrap();
    assert_eq!(at.max_locals, 2);
    // ... checkcast String, areturn
    assert_eq!(at.code[at.code.len() - 4], 0xc0);
    assert_eq!(at.code.last(), Some(&0xb0));

    assert_eq!(class.inner_classes.len(), 1);
    let entry = &class.inner_classes[0];
    assert_eq!(entry.inner_class, "gen/demo/Wrapper$Entry");
    assert_eq!(entry.outer_class.as_deref(), Some("gen/demo/Wrapper"));
    assert_eq!(entry.inner_name.as_deref(), Some("Entry"));
    assert_eq!(entry.access_flags, ACC_STATIC);

    let nested =
        ClassFile::parse(&std::fs::read(out.path().join("gen/demo/Wrapper$Entry.class")).unwrap()).unwrap();
    assert_eq!(nested.access_flags, ACC_SUPER);
    assert_eq!(nested.source_file.as_deref(), Some("Wrapper.java"));
    assert_eq!(nested.inner_classes, class.inner_classes);
}

#[test]
fn java_files_are_written_per_top_level_class() {
    let out = tempdir().unwrap();
    let written = JavaSourceGenerator::new()
        .write_class(wrapper(), Some(&package()), out.path())
        .unwrap();
    assert_eq!(written, vec![out.path().join("gen/demo/Wrapper.java")]);
    let text = std::fs::read_to_string(&written[0]).unwrap();
    assert!(text.contains("static class Entry {"));
}

#[test]
fn inner_class_constructors_take_the_outer_instance() {
    let info = ClassInfo::new("Outer", Visibility::Public, |class| {
        class.add_method(
            MethodInfo::new(Visibility::Public, IndexMap::new(), |body| {
                body.add_statement(Statement::Return(Expression::ConstructorCall {
                    outer: Some(Box::new(Expression::This)),
                    constructing: JavaClassType::raw(&QualifiedName::from_slash_qualified("Outer$Inner")),
                    parameter_types: vec![],
                    arguments: vec![],
                }))
            }),
            MethodModifiers::default(),
            vec![],
            "inner",
            JavaType::new(GenericType::class(&QualifiedName::java_lang_object())).into(),
        )?;
        class.add_inner_class(
            ClassInfo::new("Inner", Visibility::Private, |inner| {
                inner.add_constructor(MethodInfo::empty(Visibility::Private, IndexMap::new()))
            }),
            false,
        )
    });
    let description = describe_class(info, None).unwrap();

    let source = JavaSourceGenerator::new().render(&description);
    assert!(source.contains("return this.new Inner();"), "{source}");
    assert!(source.contains("    private class Inner {"), "{source}");

    let index = index();
    let classes = BytecodeGenerator::new(&index).generate(&description).unwrap();
    assert_eq!(classes.len(), 2);
    let inner = ClassFile::parse(&classes[1].1).unwrap();
    assert_eq!(inner.this_class, "Outer$Inner");
    assert_eq!(inner.access_flags, ACC_SUPER);
    assert!(inner.method("<init>", "(LOuter;)V").is_some());
    let entry = inner.inner_classes.iter().find(|entry| entry.inner_class == "Outer$Inner").unwrap();
    assert_eq!(entry.access_flags, ACC_PRIVATE);

    let outer = ClassFile::parse(&classes[0].1).unwrap();
    let code = outer.method("inner", "()Ljava/lang/Object;").unwrap().code.as_ref().unwrap();
    // new, dup, aload_0, invokespecial, areturn
    assert_eq!(code.code.len(), 9);
    assert_eq!(code.code[0], 0xbb);
    assert_eq!(code.code[3], 0x59);
    assert_eq!(code.code[4], 0x2a);
    assert_eq!(code.code[5], 0xb7);
}

#[test]
fn rejected_trees_fail_before_either_backend() {
    let mut interface = ClassInfo::new("Api", Visibility::Public, |class| {
        class.add_constructor(MethodInfo::empty(Visibility::Public, IndexMap::new()))
    });
    interface.is_interface = true;
    assert!(matches!(
        describe_class(interface, None),
        Err(CodegenError::InvariantViolation(_))
    ));

    let mut base = ClassInfo::new("Base", Visibility::Public, |class| {
        class.add_method(
            MethodInfo::new(Visibility::Public, IndexMap::new(), |body| {
                body.add_statement(Statement::Expression(Expression::This))
            }),
            MethodModifiers {
                is_abstract: true,
                ..MethodModifiers::default()
            },
            vec![],
            "run",
            JavaReturnType::void(),
        )
    });
    base.is_abstract = true;
    assert!(describe_class(base, None).is_err());

    let unknown = ClassInfo::new("Echo", Visibility::Public, |class| {
        class.add_method(
            MethodInfo::new(Visibility::Public, IndexMap::new(), |body| {
                body.add_statement(Statement::Return(Expression::variable("missing")))
            }),
            MethodModifiers::default(),
            vec![],
            "echo",
            object().into(),
        )
    });
    let err = describe_class(unknown, None).unwrap_err();
    assert_eq!(err.to_string(), "invariant violation: Echo.echo: unknown variable `missing`");

    let index = index();
    let out = tempdir().unwrap();
    let no_constructor = ClassInfo::new("Lazy", Visibility::Public, |class| {
        class.add_field("me", object(), Visibility::Private, false, false, Some(Expression::This))
    });
    assert!(BytecodeGenerator::new(&index)
        .write_class(no_constructor, None, out.path())
        .is_err());
    assert!(std::fs::read_dir(out.path()).unwrap().next().is_none());
}

#[test]
fn empty_constructor_gets_exactly_the_field_initializers() {
    let description = describe_class(pair(), Some(&package())).unwrap();
    let source = JavaSourceGenerator::new().render(&description);
    let expected = "\
package gen.demo;

public class Pair {
    private Object origin;
    private final Object seed;

    public Pair() {
        this.origin = this;
        this.seed = new Object();
    }

    public Pair(Object hint) {
        this();
    }
}
";
    assert_eq!(source, expected);

    let index = index();
    let classes = BytecodeGenerator::new(&index).generate(&description).unwrap();
    assert_eq!(classes.len(), 1);
    let class = ClassFile::parse(&classes[0].1).unwrap();

    let empty = class.method("<init>", "()V").unwrap().code.as_ref().unwrap();
    assert_eq!(
        opcodes(&empty.code),
        vec![
            0x2a, 0xb7, // super()
            0x2a, 0x2a, 0xb5, // this.origin = this
            0x2a, 0xbb, 0x59, 0xb7, 0xb5, // this.seed = new Object()
            0xb1,
        ]
    );
    assert_eq!(empty.max_stack, 3);
    assert_eq!(empty.max_locals, 1);

    let delegating = class
        .method("<init>", "(Ljava/lang/Object;)V")
        .unwrap()
        .code
        .as_ref()
        .unwrap();
    assert_eq!(opcodes(&delegating.code), vec![0x2a, 0xb7, 0xb1]);
    assert_eq!(delegating.max_locals, 2);
}

#[test]
fn object_bound_before_interface_bounds_is_kept() {
    let declarations =
        parse_class_signature("<T:Ljava/lang/Object;:Ljava/lang/Comparable<TT;>;>Ljava/lang/Object;")
            .unwrap()
            .type_parameters;
    let sorter = ClassInfo::new("Sorter", Visibility::Public, move |class| {
        let value = JavaType::new(GenericType::TypeVariable(TypeVariable::new(declarations[0].clone())));
        class.add_method(
            MethodInfo::empty(Visibility::Public, params(vec![("value", value)])),
            MethodModifiers::default(),
            declarations,
            "sort",
            JavaReturnType::void(),
        )
    });
    let description = describe_class(sorter, Some(&package())).unwrap();

    let source = JavaSourceGenerator::new().render(&description);
    assert!(
        source.contains("    public <T extends Object & Comparable<T>> void sort(T value) {\n"),
        "{source}"
    );

    let index = index();
    let classes = BytecodeGenerator::new(&index).generate(&description).unwrap();
    let class = ClassFile::parse(&classes[0].1).unwrap();
    let sort = class.method("sort", "(Ljava/lang/Object;)V").unwrap();
    assert_eq!(
        sort.signature.as_deref(),
        Some("<T:Ljava/lang/Object;:Ljava/lang/Comparable<TT;>;>(TT;)V")
    );
}
