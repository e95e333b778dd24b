use proptest::prelude::*;
use versa_classfile::{
    parse_field_descriptor, parse_field_signature, parse_method_descriptor,
    parse_method_signature, Erase,
};

const PROPTEST_CASES: u32 = 256;

fn arb_class_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "java/lang/String",
        "foo/Bar",
        "IDJ",
        "Z",
        "net/minecraft/world/World$Builder",
        "a/b/c/D$1",
    ])
}

fn arb_primitive() -> impl Strategy<Value = char> {
    prop::sample::select(vec!['B', 'C', 'D', 'F', 'I', 'J', 'S', 'Z'])
}

fn arb_field_descriptor() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        arb_primitive().prop_map(|c| c.to_string()),
        arb_class_name().prop_map(|name| format!("L{name};")),
    ];
    (0usize..4, leaf).prop_map(|(dims, leaf)| format!("{}{leaf}", "[".repeat(dims)))
}

fn arb_method_descriptor() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(arb_field_descriptor(), 0..6),
        prop_oneof![Just("V".to_owned()), arb_field_descriptor()],
    )
        .prop_map(|(params, ret)| format!("({}){ret}", params.concat()))
}

/// `(signature, erased descriptor)` pairs. `T` is declared as `<T:Ljava/lang/Number;>`.
fn arb_reference_signature() -> impl Strategy<Value = (String, String)> {
    let leaf = prop_oneof![
        arb_class_name().prop_map(|name| (format!("L{name};"), format!("L{name};"))),
        Just(("TT;".to_owned(), "Ljava/lang/Number;".to_owned())),
    ];
    leaf.prop_recursive(4, 32, 3, |inner| {
        let arg = prop_oneof![
            Just("*".to_owned()),
            inner.clone().prop_map(|(sig, _)| sig),
            inner.clone().prop_map(|(sig, _)| format!("+{sig}")),
            inner.clone().prop_map(|(sig, _)| format!("-{sig}")),
        ];
        let args = prop::collection::vec(arg, 1..3).prop_map(|args| args.concat());
        prop_oneof![
            inner.clone().prop_map(|(sig, erased)| (format!("[{sig}"), format!("[{erased}"))),
            args.clone().prop_map(|args| (
                format!("Ljava/util/Map<{args}>;"),
                "Ljava/util/Map;".to_owned()
            )),
            (args, prop_oneof![Just("Inner"), Just("In$ner"), Just("Inner$1")]).prop_map(
                |(args, inner)| (
                    format!("Lfoo/Outer<{args}>.{inner};"),
                    format!("Lfoo/Outer${inner};")
                )
            ),
        ]
    })
}

fn arb_java_signature() -> impl Strategy<Value = (String, String)> {
    prop_oneof![
        arb_primitive().prop_map(|c| (c.to_string(), c.to_string())),
        arb_reference_signature(),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig { cases: PROPTEST_CASES, .. ProptestConfig::default() })]

    #[test]
    fn field_descriptor_round_trips(desc in arb_field_descriptor()) {
        let parsed = parse_field_descriptor(&desc).unwrap();
        prop_assert_eq!(parsed.to_string(), desc);
    }

    #[test]
    fn method_descriptor_round_trips(desc in arb_method_descriptor()) {
        let parsed = parse_method_descriptor(&desc).unwrap();
        prop_assert_eq!(parsed.to_string(), desc);
    }

    #[test]
    fn field_signature_round_trips((sig, _) in arb_reference_signature()) {
        let parsed = parse_field_signature(&sig).unwrap();
        prop_assert_eq!(parsed.to_string(), sig);
    }

    #[test]
    fn method_signature_erases_to_the_erased_descriptor(
        params in prop::collection::vec(arb_java_signature(), 0..4),
        ret in prop_oneof![Just(("V".to_owned(), "V".to_owned())), arb_java_signature()],
    ) {
        let sig = format!(
            "<T:Ljava/lang/Number;>({}){}",
            params.iter().map(|(s, _)| s.as_str()).collect::<String>(),
            ret.0
        );
        let erased = format!(
            "({}){}",
            params.iter().map(|(_, e)| e.as_str()).collect::<String>(),
            ret.1
        );

        let parsed = parse_method_signature(&sig).unwrap();
        prop_assert_eq!(parsed.to_string(), sig);
        prop_assert_eq!(parsed.erase(), parse_method_descriptor(&erased).unwrap());
    }
}
