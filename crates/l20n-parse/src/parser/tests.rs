use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::ast::{BinaryOperator, LogicalOperator, Segment, UnaryOperator};

fn parse(source: &str) -> Resource {
    Parser::new().parse(source).unwrap()
}

fn entity(source: &str) -> Entity {
    let resource = parse(source);
    match resource.body.into_iter().next() {
        Some(Entry::Entity(entity)) => entity,
        other => panic!("expected entity for {source:?}, got {other:?}"),
    }
}

/// First index expression of the first entity.
fn index(source: &str) -> Expression {
    entity(source).index.into_iter().next().unwrap()
}

fn junk(source: &str) -> JunkEntry {
    let resource = parse(source);
    match resource.body.into_iter().next() {
        Some(Entry::Junk(junk)) => junk,
        other => panic!("expected junk for {source:?}, got {other:?}"),
    }
}

fn strict_error(source: &str) -> ParseError {
    Parser::strict().parse(source).unwrap_err()
}

fn boxed(expr: &Expression) -> (&Expression, &Expression) {
    match expr {
        Expression::Logical { left, right, .. } | Expression::Binary { left, right, .. } => {
            (&**left, &**right)
        }
        other => panic!("expected binary node, got {other:?}"),
    }
}

#[test]
fn test_empty_resource() {
    assert!(parse("").body.is_empty());
    assert!(parse(" \n\t ").body.is_empty());
}

#[test]
fn test_string_entity() {
    let entity = entity("<id 'string'>");
    assert_eq!(entity.id.name, "id");
    assert_eq!(entity.id.span, Span::new(1, 3));
    assert_eq!(entity.value.as_ref().and_then(Value::as_str), Some("string"));
    assert_eq!(entity.span, Span::new(0, 13));
    assert!(entity.attrs.is_empty());
    assert!(!entity.is_macro());
}

#[test]
fn test_triple_quoted_strings() {
    let single = entity("<id '''it's'''>");
    assert_eq!(single.value.unwrap().as_str(), Some("it's"));

    let double = entity(r#"<id """say "hi" now""">"#);
    assert_eq!(double.value.unwrap().as_str(), Some("say \"hi\" now"));
}

#[test]
fn test_escaped_quotes() {
    let escaped = entity(r#"<id "str\"ing">"#);
    assert_eq!(escaped.value.unwrap().as_str(), Some("str\"ing"));

    let backslash = entity(r"<id 'test \a more'>");
    assert_eq!(backslash.value.unwrap().as_str(), Some(r"test \a more"));
}

#[test]
fn test_string_span_includes_delimiters() {
    let entity = entity("<id '''abc'''>");
    assert_eq!(entity.value.unwrap().span(), Span::new(4, 13));
}

#[test]
fn test_complex_value() {
    let entity = entity("<hello 'Hello, {{ name }}!'>");
    let value = entity.value.unwrap();
    let string = value.as_string().unwrap();
    assert!(string.is_complex());
    assert_eq!(string.references().collect::<Vec<_>>(), vec!["name"]);
    let segments = string.segments.as_deref().unwrap();
    assert_eq!(segments[0], Segment::Text("Hello, ".to_string()));
    match &segments[1] {
        Segment::Reference(id) => assert_eq!(id.span, Span::new(18, 22)),
        other => panic!("expected reference, got {other:?}"),
    }
}

#[test]
fn test_attributes() {
    let entity = entity("<id 'value' attr1: 'foo' *attr2: 'foo2'  >");
    assert_eq!(entity.value.as_ref().unwrap().as_str(), Some("value"));
    assert_eq!(entity.attrs.len(), 2);
    assert_eq!(entity.attrs[0].key.name, "attr1");
    assert!(!entity.attrs[0].default);
    assert!(entity.attrs[1].default);
    assert_eq!(entity.attr("attr2").unwrap().value.as_str(), Some("foo2"));
    assert_eq!(entity.attrs[1].span, Span::new(25, 39));
}

#[test]
fn test_attributes_without_value() {
    let entity = entity("<id attr1: 'foo' attr2 : 'foo2'>");
    assert!(entity.value.is_none());
    assert_eq!(entity.attrs.len(), 2);
    assert_eq!(entity.attrs[1].key.name, "attr2");
}

#[test]
fn test_attribute_index() {
    let entity = entity("<id attr[2, 3]: 'foo'>");
    let attr = &entity.attrs[0];
    assert_eq!(attr.index.len(), 2);
    assert_eq!(attr.index[0].number(), Some(2));
    assert_eq!(attr.index[1].number(), Some(3));
}

#[test]
fn test_hash_value() {
    let entity = entity("<id {a: 'b', a2: 'c', *d: 'd' }>");
    let value = entity.value.unwrap();
    let hash = value.as_hash().unwrap();
    assert_eq!(hash.content.len(), 3);
    assert_eq!(hash.get("a2").unwrap().value.as_str(), Some("c"));
    assert_eq!(hash.default_item().unwrap().key.name, "d");
    assert_eq!(hash.span, Span::new(4, 31));
}

#[test]
fn test_nested_hash() {
    let entity = entity("<id {a: {}, b: { c: 'x' }}>");
    let value = entity.value.unwrap();
    let hash = value.as_hash().unwrap();
    assert!(hash.get("a").unwrap().value.as_hash().unwrap().content.is_empty());
    let inner = hash.get("b").unwrap().value.as_hash().unwrap();
    assert_eq!(inner.get("c").unwrap().value.as_str(), Some("x"));
}

#[test]
fn test_second_default_rejected() {
    let err = strict_error(r#"<id {*a: "v", *b: "c"}>"#);
    assert_eq!(err.kind, ParseErrorKind::SingleDefault);
    assert_eq!(err.span, Span::new(14, 15));
}

#[test]
fn test_second_default_recovers_after_item() {
    let resource = parse("<id {*a: 'x', *b: 'c<d'}> <ok 'v'>");
    assert_eq!(resource.body.len(), 2);
    let Entry::Junk(junk) = &resource.body[0] else {
        panic!("expected junk, got {:?}", resource.body[0]);
    };
    assert_eq!(junk.raw_text, "<id {*a: 'x', *b: 'c<d'}> ");
    assert_eq!(junk.error.kind, ParseErrorKind::SingleDefault);
    assert_eq!(junk.error.offset(), 14);
    assert_eq!(resource.body[1].as_entity().unwrap().id.name, "ok");
}

fn nested_parens(levels: usize) -> String {
    format!("<id[{}1{}] 'x'>", "(".repeat(levels), ")".repeat(levels))
}

#[test]
fn test_nesting_limit() {
    // The index expression is the first level
    let entity = entity(&nested_parens(MAX_NESTING - 1));
    assert!(matches!(entity.index[0], Expression::Parenthesized { .. }));

    let junk = junk(&nested_parens(MAX_NESTING));
    assert_eq!(junk.error.kind, ParseErrorKind::NestingTooDeep);
    // Inside the innermost parenthesis
    assert_eq!(junk.error.offset(), 4 + MAX_NESTING as u32);
}

#[test]
fn test_deep_nesting_becomes_junk() {
    let levels = 20_000;
    let sources = [
        nested_parens(levels),
        format!("<id {}'x'{}>", "{a:".repeat(levels), "}".repeat(levels)),
        format!("<id[{}a] 'x'>", "!".repeat(levels)),
        format!("<id[a{}] 'x'>", ".b".repeat(levels)),
        format!("<id[1{}] 'x'>", " + 1".repeat(levels)),
        format!("<id[a{}] 'x'>", "()".repeat(levels)),
    ];
    for source in sources {
        let resource = parse(&format!("{source} <ok 'v'>"));
        assert_eq!(resource.body.len(), 2, "{}", &source[..20]);
        let Entry::Junk(junk) = &resource.body[0] else {
            panic!("expected junk for {}", &source[..20]);
        };
        assert_eq!(junk.error.kind, ParseErrorKind::NestingTooDeep);
        assert_eq!(resource.body[1].as_entity().unwrap().id.name, "ok");
        assert_eq!(
            Parser::strict().parse(&source).unwrap_err().kind,
            ParseErrorKind::NestingTooDeep
        );
    }
}

#[test]
fn test_nesting_resets_between_entries() {
    let shallow = nested_parens(MAX_NESTING - 1);
    let source = format!("{shallow} {shallow} {shallow}");
    assert_eq!(Parser::strict().parse(&source).unwrap().body.len(), 3);
}

#[test]
fn test_entity_index() {
    let entity = entity("<id[2, 'foo', 3] 'foo2'>");
    assert_eq!(entity.index.len(), 3);
    assert_eq!(entity.index[0].number(), Some(2));
    assert_eq!(entity.index[1].as_str(), Some("foo"));
    assert_eq!(entity.index[2].number(), Some(3));
    assert_eq!(entity.value.unwrap().as_str(), Some("foo2"));
}

#[test]
fn test_macro() {
    let entity = entity("<id( $n, $m, $a ) {2}  >");
    assert!(entity.is_macro());
    let names: Vec<_> = entity.args.iter().map(|arg| arg.name.as_str()).collect();
    assert_eq!(names, vec!["n", "m", "a"]);
    assert_eq!(entity.args[0].span, Span::new(6, 7));
    assert_eq!(entity.expression.unwrap().number(), Some(2));
    assert!(entity.value.is_none());
}

#[test]
fn test_macro_with_attributes() {
    let entity = entity("<plural($n) { $n == 1 ? 'one' : 'many' } doc: 'count'>");
    assert!(matches!(
        entity.expression,
        Some(Expression::Conditional { .. })
    ));
    assert_eq!(entity.attrs[0].key.name, "doc");
}

#[test]
fn test_underscore_macro_id() {
    let entity = entity("<_id($n) {2}>");
    assert_eq!(entity.id.name, "_id");
}

#[test]
fn test_logical_precedence() {
    let expr = index("<id[0 || 1 && 2 || 3] 'foo'>");
    assert_eq!(expr.operator(), Some("||"));
    let (left, right) = boxed(&expr);
    assert_eq!(right.number(), Some(3));
    assert_eq!(left.operator(), Some("||"));
    let (_, and) = boxed(left);
    assert!(matches!(
        and,
        Expression::Logical {
            operator: LogicalOperator::And,
            ..
        }
    ));
}

#[test]
fn test_binary_precedence() {
    let expr = index("<id[0 == 1 != 2 > 3 < 4 >= 5 <= 6 + 7 - 8 * 9 / 10 % 11] 'foo'>");
    assert_eq!(expr.operator(), Some("!="));
    let (left, right) = boxed(&expr);
    assert_eq!(left.operator(), Some("=="));
    assert_eq!(right.operator(), Some("<="));

    let expr = index("<id[6 + 7 - 8 * 9 / 10 % 11] 'foo'>");
    assert!(matches!(
        expr,
        Expression::Binary {
            operator: BinaryOperator::Sub,
            ..
        }
    ));
    let (left, right) = boxed(&expr);
    assert_eq!(left.operator(), Some("+"));
    assert_eq!(right.operator(), Some("%"));
}

#[test]
fn test_unary_chain() {
    let expr = index("<id[! + - 1] 'foo'>");
    let Expression::Unary { operator, argument } = expr else {
        panic!("expected unary");
    };
    assert_eq!(operator, UnaryOperator::Not);
    let Expression::Unary { operator, argument } = *argument else {
        panic!("expected unary");
    };
    assert_eq!(operator, UnaryOperator::Plus);
    assert_eq!(argument.operator(), Some("-"));
}

#[test]
fn test_conditional() {
    let entity = entity("<id attr[2+3?'foo':'foo2']: 'foo'>");
    let Expression::Conditional {
        test,
        consequent,
        alternate,
    } = &entity.attrs[0].index[0]
    else {
        panic!("expected conditional");
    };
    let (left, right) = boxed(test);
    assert_eq!(left.number(), Some(2));
    assert_eq!(right.number(), Some(3));
    assert_eq!(consequent.as_str(), Some("foo"));
    assert_eq!(alternate.as_str(), Some("foo2"));
}

#[test]
fn test_calls() {
    let Expression::Call { callee, arguments } = index("<id[foo()] 'foo'>") else {
        panic!("expected call");
    };
    assert_eq!(callee.name(), Some("foo"));
    assert!(arguments.is_empty());

    let Expression::Call { arguments, .. } = index("<id[foo(d, e, f, g)] 'foo'>") else {
        panic!("expected call");
    };
    let names: Vec<_> = arguments.iter().filter_map(Expression::name).collect();
    assert_eq!(names, vec!["d", "e", "f", "g"]);
}

#[test]
fn test_member_access() {
    let Expression::Member {
        expression,
        property,
        computed,
    } = index("<id[x['d']] 'foo'>")
    else {
        panic!("expected member");
    };
    assert_eq!(expression.name(), Some("x"));
    assert_eq!(property.as_str(), Some("d"));
    assert!(computed);

    let Expression::Member {
        property, computed, ..
    } = index("<id[x.d] 'foo'>")
    else {
        panic!("expected member");
    };
    assert_eq!(property.name(), Some("d"));
    assert!(!computed);
}

#[test]
fn test_attribute_access() {
    let Expression::AttributeAccess {
        expression,
        attribute,
        computed,
    } = index("<id[x::['d']] 'foo'>")
    else {
        panic!("expected attribute access");
    };
    assert_eq!(expression.name(), Some("x"));
    assert_eq!(attribute.as_str(), Some("d"));
    assert!(computed);

    let Expression::AttributeAccess { attribute, .. } = index("<id[x::d] 'foo'>") else {
        panic!("expected attribute access");
    };
    assert_eq!(attribute.name(), Some("d"));
}

#[test]
fn test_call_after_attribute_access() {
    let Expression::Call { callee, .. } = index("<id[x::d()] 'foo'>") else {
        panic!("expected call");
    };
    assert!(matches!(*callee, Expression::AttributeAccess { .. }));
}

#[test]
fn test_attribute_access_legality() {
    for (source, kind) in [
        ("<id[x.y::z] 'foo'>", ParseErrorKind::AttributeAccessBase),
        ("<id[x::y::z] 'foo'>", ParseErrorKind::AttributeAccessBase),
        ("<id[x()::attr1] 'foo'>", ParseErrorKind::AttributeAccessBase),
        ("<id[x::y.z] 'foo'>", ParseErrorKind::AttributeAccessEnd),
        ("<id[x::y['z']] 'foo'>", ParseErrorKind::AttributeAccessEnd),
    ] {
        assert_eq!(junk(source).error.kind, kind, "{source}");
    }
}

#[test]
fn test_parenthesized() {
    let expr = index("<id[(a||b).c] 'foo'>");
    let Expression::Member {
        expression,
        property,
        ..
    } = expr
    else {
        panic!("expected member");
    };
    assert_eq!(property.name(), Some("c"));
    let Expression::Parenthesized { expression } = *expression else {
        panic!("expected parenthesized");
    };
    assert_eq!(expression.operator(), Some("||"));

    let Expression::Member { expression, .. } = index("<id[a().c] 'foo'>") else {
        panic!("expected member");
    };
    assert!(matches!(*expression, Expression::Call { .. }));
}

#[test]
fn test_primaries() {
    assert!(matches!(index("<id[$foo] 'foo'>"), Expression::Variable(id) if id.name == "foo"));
    assert!(matches!(index("<id[@foo] 'foo'>"), Expression::Global(id) if id.name == "foo"));
    assert_eq!(index("<id[~] 'foo'>"), Expression::This);
    assert_eq!(index("<id[012] 'foo'>").number(), Some(12));

    let Expression::Value(Value::Hash(hash)) = index("<id[{a: 'foo', b: 'foo2'}] 'foo'>") else {
        panic!("expected hash literal");
    };
    assert_eq!(hash.content[1].value.as_str(), Some("foo2"));
}

#[test]
fn test_number_out_of_range() {
    let err = junk("<id[99999999999999999999999] 'foo'>").error;
    assert_eq!(err.kind, ParseErrorKind::NumberInRange);
    assert_eq!(err.offset(), 4);
}

#[test]
fn test_postfix_requires_adjacency() {
    let err = junk("<id[x .d] 'foo'>").error;
    assert_eq!(err.kind, ParseErrorKind::Token(TokenKind::RBracket));
}

#[test]
fn test_comment() {
    let resource = parse("/* test */");
    let Entry::Comment(comment) = &resource.body[0] else {
        panic!("expected comment");
    };
    assert_eq!(comment.content, " test ");
    assert_eq!(comment.span, Span::new(0, 10));
}

#[test]
fn test_unterminated_comment() {
    let err = junk("/* foo ").error;
    assert_eq!(err.kind, ParseErrorKind::CommentEnd);
    assert_eq!(err.offset(), 7);
}

#[test]
fn test_import() {
    let resource = parse("import('./foo.lol')");
    let Entry::Import(import) = &resource.body[0] else {
        panic!("expected import");
    };
    assert_eq!(import.uri.content, "./foo.lol");
    assert_eq!(import.span, Span::new(0, 19));
}

#[test]
fn test_import_rejects_interpolation() {
    let err = junk("import('{{ a }}.lol')").error;
    assert_eq!(err.kind, ParseErrorKind::PlainString);
}

#[test]
fn test_mixed_entries() {
    let resource = parse("/* c */\nimport('a.lol')\n<a 'b'>\n<c {d: 'e'}>");
    let types: Vec<_> = resource.body.iter().map(Entry::type_name).collect();
    assert_eq!(types, vec!["Comment", "ImportStatement", "Entity", "Entity"]);
}

#[test]
fn test_junk_then_recovery() {
    let resource = parse("<id 2> <ok 'v'>");
    assert_eq!(resource.body.len(), 2);
    let Entry::Junk(junk) = &resource.body[0] else {
        panic!("expected junk");
    };
    assert_eq!(junk.raw_text, "<id 2> ");
    assert_eq!(junk.span, Span::new(0, 7));
    assert_eq!(junk.error.kind, ParseErrorKind::Identifier);
    assert_eq!(resource.body[1].as_entity().unwrap().id.name, "ok");
}

#[test]
fn test_junk_without_following_entry() {
    let junk = junk("foo */");
    assert_eq!(junk.raw_text, "foo */");
    assert_eq!(junk.error.kind, ParseErrorKind::Entry);
}

#[test]
fn test_empty_entity_is_junk() {
    assert_eq!(junk("<id>").error.kind, ParseErrorKind::WhiteSpace);
    assert_eq!(junk("<id >").error.kind, ParseErrorKind::Value);
    assert_eq!(parse("<id >").body.len(), 1);
}

#[test]
fn test_whitespace_errors() {
    insta::assert_snapshot!(strict_error("<id<"), @r#"Expected white space at pos 3: "<id<""#);
    insta::assert_snapshot!(
        strict_error("<id 'a''b'>"),
        @r#"Expected white space at pos 7: "<id 'a''b'>""#
    );
    insta::assert_snapshot!(
        strict_error("<id a:'foo'b:'foo'>"),
        @r#"Expected white space at pos 11: "<id a:'foo'b:'foo'>""#
    );
}

#[test]
fn test_error_messages() {
    insta::assert_snapshot!(strict_error("<id 'v'"), @r#"Expected ">" at pos 7: "<id 'v'""#);
    insta::assert_snapshot!(strict_error("id>"), @r#"Expected entry at pos 0: "id>""#);
    insta::assert_snapshot!(
        strict_error("<a 'b'> <c[1 ? 2 3] 'd'>"),
        @r#"Expected ":" at pos 17: "<c[1 ? 2 3] 'd'>""#
    );
    insta::assert_snapshot!(
        strict_error("<id($n) 2}>"),
        @r#"Expected "{" at pos 8: "<id($n) 2}>""#
    );
}

#[test]
fn test_strict_success() {
    let resource = Parser::strict()
        .parse("<id 'value'> <id2 'value2'>")
        .unwrap();
    assert_eq!(resource.body.len(), 2);
    assert_eq!(resource.get("id2").unwrap().value.as_ref().unwrap().as_str(), Some("value2"));
}

#[test]
fn test_parse_string_method() {
    let parser = Parser::strict();
    let string = parser.parse_string("a {{ b }}").unwrap();
    assert!(string.is_complex());
    assert!(parser.parse_string("test {{ var ").is_err());
}

#[test]
fn test_listeners() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut parser = Parser::new();

    let log = seen.clone();
    parser
        .add_event_listener("error", move |event| {
            if let Event::Error(error) = event {
                log.borrow_mut().push(error.offset());
            }
        })
        .unwrap();
    let log = seen.clone();
    let change = parser
        .add_event_listener("change", move |event| {
            if let Event::Change(resource) = event {
                log.borrow_mut().push(resource.body.len() as u32 + 100);
            }
        })
        .unwrap();

    parser.parse("<a 2> <b 'c'> <d>").unwrap();
    assert_eq!(*seen.borrow(), vec![3, 16, 103]);

    parser.remove_event_listener("change", change).unwrap();
    parser.parse("<e 'f'>").unwrap();
    assert_eq!(seen.borrow().len(), 3);
}

#[test]
fn test_strict_has_no_emitter() {
    let mut parser = Parser::strict();
    let err = parser.add_event_listener("change", |_| {}).unwrap_err();
    assert_eq!(err.to_string(), "Emitter not available");

    let mut other = Parser::new();
    let id = other.add_event_listener("change", |_| {}).unwrap();
    assert_eq!(parser.remove_event_listener("change", id), Err(EmitterUnavailable));
    assert_eq!(other.remove_event_listener("change", id), Ok(()));
}
