// Tests for the Pratt parser peer.

use exprkit::pratt::{
    precedence, InfixParselet, Parselets, PrattExpr, PrattParser, PrattTokenType, PrefixParselet,
};
use exprkit::{ErrorType, ExprError};

fn print(text: &str) -> String {
    PrattParser::default().parse(text).unwrap().to_string()
}

#[test]
fn standard_table() {
    assert_eq!(print("a"), "a");
    assert_eq!(print("a + b - c"), "( ( a + b ) - c )");
    assert_eq!(print("a * b + c / d"), "( ( a * b ) + ( c / d ) )");
    assert_eq!(print("!a * ~b"), "( ! a * ~ b )");
    assert_eq!(print("{a + b} * (c)"), "( ( a + b ) * c )");
}

#[test]
fn literals_keep_their_values() {
    let expr = PrattParser::default().parse(r#""hi" + 2.5"#).unwrap();
    match expr {
        PrattExpr::Operator { left, op, right } => {
            assert_eq!(*left, PrattExpr::Str { value: "hi".into() });
            assert_eq!(op, PrattTokenType::Plus);
            assert_eq!(
                *right,
                PrattExpr::Number {
                    value: 2.5,
                    raw: "2.5".into()
                }
            );
        }
        other => panic!("expected an operator expression, got {:?}", other),
    }
}

#[test]
fn custom_registry_changes_associativity() {
    let mut parselets = Parselets::standard();
    let previous = parselets.register_infix(PrattTokenType::Minus, InfixParselet::right(precedence::SUM));
    assert_eq!(previous, Some(InfixParselet::left(precedence::SUM)));

    let parser = PrattParser::new(parselets);
    assert_eq!(parser.parse("a - b - c").unwrap().to_string(), "( a - ( b - c ) )");
}

#[test]
fn missing_prefix_parselet_is_reported() {
    let mut parselets = Parselets::new();
    parselets.register_prefix(PrattTokenType::Name, PrefixParselet::Name);
    let err = PrattParser::new(parselets).parse("-a").unwrap_err();
    assert!(err.to_string().contains("could not parse `-`"), "{}", err);
}

#[test]
fn unsupported_punctuator_is_an_explicit_error() {
    let err = PrattParser::default().parse("a ; b").unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Pratt);
    assert_eq!(err.position(), Some((1, 3)));
}

#[test]
fn unclosed_group_reports_end_of_input() {
    let err = PrattParser::default().parse("(a + b").unwrap_err();
    match err {
        ExprError::Pratt { message, column, .. } => {
            assert_eq!(message, "expected `)` but found end of input");
            assert_eq!(column, 7);
        }
        other => panic!("expected a Pratt error, got {:?}", other),
    }
}

#[test]
fn mismatched_closer_is_rejected() {
    let err = PrattParser::default().parse("{a)").unwrap_err();
    assert!(err.to_string().contains("expected `}`"), "{}", err);
}

#[test]
fn ten_thousand_nested_groups_fail_cleanly() {
    let text = format!("{}a{}", "(".repeat(10_000), ")".repeat(10_000));
    let err = PrattParser::default().parse(&text).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Pratt);
    assert!(err.to_string().contains("nesting too deep"), "{}", err);
}
