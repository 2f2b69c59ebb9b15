use blockly::{Block, BlockType, ErrorKind, Node, ParseError, Parser, ParserConfig, Registry, RegistryError, ScalarKind};
use blockly::binder::Binder;
use pretty_assertions::assert_eq;
use rstest::rstest;

// ---------------------------------------------------------------------------
// Test domain
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Container {
    label: String,
    body: Vec<Box<dyn Block>>,
    input: Option<Box<dyn Block>>,
}

impl Block for Container {}

#[derive(Debug, Default, PartialEq)]
struct Leaf {
    count: i32,
    ratio: f32,
    weight: f64,
    enabled: bool,
    name: String,
}

impl Block for Leaf {}

#[derive(Debug, Default)]
struct Unregistered;

impl Block for Unregistered {}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(
            BlockType::<Container>::new("A")
                .field("LABEL", |b, v: String| b.label = v)
                .statement("S", |b, v| b.body = v)
                .value("IN", |b, v| b.input = Some(v)),
        )
        .unwrap();
    registry
        .register(
            BlockType::<Leaf>::new("B")
                .field("COUNT", |b, v: i32| b.count = v)
                .field("RATIO", |b, v: f32| b.ratio = v)
                .field("WEIGHT", |b, v: f64| b.weight = v)
                .field("ENABLED", |b, v: bool| b.enabled = v)
                .field("NAME", |b, v: String| b.name = v),
        )
        .unwrap();
    registry
        .register(BlockType::<Leaf>::with_factory("C", || Leaf {
            name: "from factory".to_string(),
            ..Leaf::default()
        }))
        .unwrap();
    registry
}

fn parse(source: &str) -> Box<dyn Block> {
    Parser::new(&registry()).parse(source).expect("parse failed")
}

fn parse_err(source: &str) -> ParseError {
    Parser::new(&registry())
        .parse(source)
        .expect_err("expected parse to fail")
}

fn leaf(block: &dyn Block) -> &Leaf {
    block.downcast_ref::<Leaf>().expect("not a Leaf")
}

fn container(block: &dyn Block) -> &Container {
    block.downcast_ref::<Container>().expect("not a Container")
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn duplicate_tag_keeps_first_registration() {
    let mut registry = registry();
    let err = registry
        .register(BlockType::<Unregistered>::new("B"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateTag { ref tag, .. } if tag == "B"));

    let descriptor = registry.lookup("B").unwrap();
    assert!(descriptor.type_name().ends_with("Leaf"));
    assert_eq!(registry.len(), 3);
}

#[test]
fn empty_tag_is_rejected() {
    let err = Registry::new()
        .register(BlockType::<Unregistered>::new(""))
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidTag { .. }));
}

#[test]
fn member_declared_twice_is_rejected() {
    let mut registry = Registry::new();
    let err = registry
        .register(
            BlockType::<Container>::new("A")
                .field("X", |b, v: String| b.label = v)
                .statement("X", |b, v| b.body = v),
        )
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::InvalidField {
            tag: "A".to_string(),
            member: "X".to_string(),
            reason: "is declared more than once",
        }
    );
    assert!(registry.is_empty());
}

#[test]
fn empty_member_name_is_rejected() {
    let err = Registry::new()
        .register(BlockType::<Container>::new("A").value("", |b, v| b.input = Some(v)))
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidField { ref member, .. } if member.is_empty()));
}

#[test]
fn lookup_describes_members() {
    let registry = registry();
    assert!(registry.lookup("Nonexistent").is_none());
    assert_eq!(registry.tags(), vec!["A", "B", "C"]);

    let a = registry.lookup("A").unwrap();
    assert_eq!(a.tag(), "A");
    assert_eq!(a.fields(), vec![("LABEL", ScalarKind::String)]);
    assert_eq!(a.values(), vec!["IN"]);
    assert_eq!(a.statements(), vec!["S"]);

    let b = registry.lookup("B").unwrap();
    assert_eq!(
        b.fields(),
        vec![
            ("COUNT", ScalarKind::Integer),
            ("ENABLED", ScalarKind::Boolean),
            ("NAME", ScalarKind::String),
            ("RATIO", ScalarKind::Float),
            ("WEIGHT", ScalarKind::Double),
        ]
    );
}

#[test]
fn instantiate_uses_factory() {
    let registry = registry();
    let block = registry.lookup("C").unwrap().instantiate();
    assert_eq!(leaf(block.as_ref()).name, "from factory");
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

#[test]
fn next_chain_flattens_into_statement() {
    let root = parse(
        r#"<block type="A"><statement name="S"><block type="B"/><next><block type="C"/></next></statement></block>"#,
    );
    let body = &container(root.as_ref()).body;
    assert_eq!(body.len(), 2);
    assert_eq!(leaf(body[0].as_ref()).name, "");
    assert_eq!(leaf(body[1].as_ref()).name, "from factory");
}

#[test]
fn native_next_nesting_flattens_into_statement() {
    let root = parse(concat!(
        r#"<xml xmlns="https://developers.google.com/blockly/xml">"#,
        r#"<block type="A" id="root" x="10" y="20"><statement name="S">"#,
        r#"<block type="B"><field name="COUNT">1</field><next>"#,
        r#"<block type="B"><field name="COUNT">2</field><next>"#,
        r#"<block type="B"><field name="COUNT">3</field></block>"#,
        r#"</next></block></next></block>"#,
        r#"</statement></block></xml>"#,
    ));
    let counts: Vec<i32> = container(root.as_ref())
        .body
        .iter()
        .map(|b| leaf(b.as_ref()).count)
        .collect();
    assert_eq!(counts, vec![1, 2, 3]);
}

#[test]
fn fields_are_coerced_to_declared_kinds() {
    let root = parse(concat!(
        r#"<block type="B">"#,
        r#"<field name="COUNT">42</field>"#,
        r#"<field name="RATIO">0.5</field>"#,
        r#"<field name="WEIGHT"> 2.25 </field>"#,
        r#"<field name="ENABLED">TRUE</field>"#,
        r#"<field name="NAME">  spaced name </field>"#,
        r#"</block>"#,
    ));
    assert_eq!(
        leaf(root.as_ref()),
        &Leaf {
            count: 42,
            ratio: 0.5,
            weight: 2.25,
            enabled: true,
            name: "  spaced name ".to_string(),
        }
    );
}

#[rstest]
#[case("true", true)]
#[case("True", true)]
#[case("false", false)]
#[case("notabool", false)]
#[case("", false)]
fn boolean_coercion_is_permissive(#[case] text: &str, #[case] expected: bool) {
    let source = format!(r#"<block type="B"><field name="ENABLED">{}</field></block>"#, text);
    assert_eq!(leaf(parse(&source).as_ref()).enabled, expected);
}

#[rstest]
#[case("COUNT", "4.5")]
#[case("COUNT", "forty")]
#[case("COUNT", "")]
#[case("WEIGHT", "heavy")]
#[case("RATIO", "1,5")]
fn non_numeric_text_fails_coercion(#[case] field: &str, #[case] text: &str) {
    let source = format!(r#"<block type="B"><field name="{}">{}</field></block>"#, field, text);
    let err = parse_err(&source);
    assert_eq!(err.kind, ErrorKind::ValueCoercion);
    assert_eq!(&source[err.span.clone()], format!(r#"<field name="{}">"#, field));
}

#[test]
fn empty_field_sets_empty_string() {
    let root = parse(r#"<block type="A"><field name="LABEL"></field></block>"#);
    assert_eq!(container(root.as_ref()).label, "");
}

#[test]
fn value_binds_nested_block() {
    let root = parse(
        r#"<block type="A"><value name="IN"><block type="B"><field name="COUNT">7</field></block></value></block>"#,
    );
    let input = container(root.as_ref()).input.as_ref().unwrap();
    assert_eq!(leaf(input.as_ref()).count, 7);
}

#[test]
fn value_prefers_block_over_shadow() {
    let root = parse(concat!(
        r#"<block type="A"><value name="IN">"#,
        r#"<shadow type="B"><field name="COUNT">1</field></shadow>"#,
        r#"<block type="B"><field name="COUNT">2</field></block>"#,
        r#"</value></block>"#,
    ));
    let input = container(root.as_ref()).input.as_ref().unwrap();
    assert_eq!(leaf(input.as_ref()).count, 2);
}

#[test]
fn value_falls_back_to_shadow() {
    let source = r#"<block type="A"><value name="IN"><shadow type="B"><field name="COUNT">1</field></shadow></value></block>"#;
    let root = parse(source);
    let input = container(root.as_ref()).input.as_ref().unwrap();
    assert_eq!(leaf(input.as_ref()).count, 1);

    let config = ParserConfig {
        bind_shadows: false,
        ..ParserConfig::default()
    };
    let registry = registry();
    let err = Parser::with_config(&registry, config).parse(source).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingNestedBlock);
}

#[test]
fn value_uses_first_of_several_blocks() {
    let root = parse(concat!(
        r#"<block type="A"><value name="IN">"#,
        r#"<block type="B"><field name="COUNT">1</field></block>"#,
        r#"<block type="B"><field name="COUNT">2</field></block>"#,
        r#"</value></block>"#,
    ));
    let input = container(root.as_ref()).input.as_ref().unwrap();
    assert_eq!(leaf(input.as_ref()).count, 1);
}

#[test]
fn empty_value_is_missing_nested_block() {
    let source = r#"<block type="A"><value name="IN"></value></block>"#;
    let err = parse_err(source);
    assert_eq!(err.kind, ErrorKind::MissingNestedBlock);
    assert_eq!(&source[err.span.clone()], r#"<value name="IN">"#);
}

#[test]
fn empty_statement_binds_empty_sequence() {
    let root = parse(
        r#"<block type="A"><statement name="S"></statement><field name="LABEL">x</field></block>"#,
    );
    let a = container(root.as_ref());
    assert!(a.body.is_empty());
    assert_eq!(a.label, "x");
}

#[test]
fn unrelated_children_are_ignored() {
    let root = parse(concat!(
        r#"<block type="A"><mutation items="2"></mutation>"#,
        r#"<comment pinned="false">note</comment>"#,
        r#"<field name="LABEL">kept</field></block>"#,
    ));
    assert_eq!(container(root.as_ref()).label, "kept");
}

#[test]
fn unknown_block_type_fails_whole_parse() {
    let source = concat!(
        r#"<block type="A"><statement name="S"><block type="B"/>"#,
        r#"<block type="Nonexistent"></block></statement></block>"#,
    );
    let err = parse_err(source);
    assert_eq!(err.kind, ErrorKind::UnknownBlockType);
    assert!(err.message.contains("Nonexistent"));
    assert_eq!(&source[err.span.clone()], r#"<block type="Nonexistent">"#);
}

#[test]
fn block_without_type_is_unknown() {
    assert_eq!(parse_err("<block></block>").kind, ErrorKind::UnknownBlockType);
}

#[test]
fn unknown_member_names_fail() {
    for source in [
        r#"<block type="B"><field name="MISSING">1</field></block>"#,
        r#"<block type="A"><value name="S"><block type="B"/></value></block>"#,
        r#"<block type="A"><statement name="IN"></statement></block>"#,
        r#"<block type="A"><field>1</field></block>"#,
    ] {
        assert_eq!(parse_err(source).kind, ErrorKind::UnknownField, "{}", source);
    }
}

#[test]
fn input_without_block_is_malformed() {
    assert_eq!(parse_err("<xml></xml>").kind, ErrorKind::MalformedInput);
    assert_eq!(parse_err("no tags at all").kind, ErrorKind::MalformedInput);
}

#[test]
fn parse_as_downcasts_root() {
    let registry = registry();
    let parser = Parser::new(&registry);
    let root = parser
        .parse_as::<Leaf>(r#"<block type="B"><field name="COUNT">3</field></block>"#)
        .unwrap();
    assert_eq!(root.count, 3);

    let err = parser
        .parse_as::<Container>(r#"<block type="B"></block>"#)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedRootType);
}

#[test]
fn parse_all_returns_every_top_level_block() {
    let registry = registry();
    let blocks = Parser::new(&registry)
        .parse_all(concat!(
            r#"<xml><block type="B"><field name="COUNT">1</field></block>"#,
            r#"<block type="B"><field name="COUNT">2</field><next><block type="C"></block></next></block></xml>"#,
        ))
        .unwrap();
    let names: Vec<(i32, &str)> = blocks
        .iter()
        .map(|b| (leaf(b.as_ref()).count, leaf(b.as_ref()).name.as_str()))
        .collect();
    assert_eq!(names, vec![(1, ""), (2, ""), (0, "from factory")]);
}

#[test]
fn binding_depth_is_limited() {
    let config = ParserConfig {
        max_depth: 4,
        ..ParserConfig::default()
    };
    let registry = registry();
    let mut node = Node::new("block").with_attribute("type", "B");
    for _ in 0..4 {
        node = Node::new("block")
            .with_attribute("type", "A")
            .with_child(Node::new("value").with_attribute("name", "IN").with_child(node));
    }
    let err = Binder::new(&registry, &config).bind(&node).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DepthLimitExceeded);
}

#[test]
fn hand_built_tree_binds_with_same_shape() {
    let registry = registry();
    let config = ParserConfig::default();
    let node = Node::new("block")
        .with_attribute("type", "A")
        .with_child(Node::new("field").with_attribute("name", "LABEL").with_text("outer"))
        .with_child(
            Node::new("statement")
                .with_attribute("name", "S")
                .with_child(
                    Node::new("block")
                        .with_attribute("type", "A")
                        .with_child(Node::new("field").with_attribute("name", "LABEL").with_text("inner"))
                        .with_child(
                            Node::new("statement").with_attribute("name", "S").with_child(
                                Node::new("block")
                                    .with_attribute("type", "B")
                                    .with_child(Node::new("field").with_attribute("name", "COUNT").with_text("9")),
                            ),
                        ),
                )
                .with_child(Node::new("block").with_attribute("type", "C")),
        );

    let root = Binder::new(&registry, &config).bind(&node).unwrap();
    let outer = container(root.as_ref());
    assert_eq!(outer.label, "outer");
    assert_eq!(outer.body.len(), 2);

    let inner = container(outer.body[0].as_ref());
    assert_eq!(inner.label, "inner");
    assert_eq!(inner.body.len(), 1);
    assert_eq!(leaf(inner.body[0].as_ref()).count, 9);
    assert_eq!(leaf(outer.body[1].as_ref()).name, "from factory");
}

#[test]
fn errors_render_as_diagnostics() {
    let err = parse_err(r#"<block type="Nonexistent"></block>"#);
    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.code.as_deref(), Some("UnknownBlockType"));
    assert_eq!(diagnostic.labels[0].range, 0..26);
    assert_eq!(diagnostic.notes, vec!["3 block type(s) registered".to_string()]);
}
