// End-to-end tests for the expression grammar.

use exprkit::ast::{BinaryOperator, Expr, LiteralValue, Span};
use exprkit::config::Strategy;
use exprkit::lexer::{Token, TokenKind};
use exprkit::{ErrorType, ExprError, Grammar, GrammarOptions};
use miette::Diagnostic;

fn grammar() -> Grammar {
    Grammar::new(GrammarOptions::default()).unwrap()
}

fn extended() -> Grammar {
    Grammar::new(GrammarOptions::extended()).unwrap()
}

fn printed(grammar: &Grammar, text: &str) -> String {
    grammar
        .parse(text)
        .unwrap_or_else(|e| panic!("`{}` failed to parse: {}", text, e))
        .to_string()
}

// ============================================================================
// SHAPE
// ============================================================================

#[test]
fn x_and_y_end_to_end() {
    let expr = exprkit::parse("x AND y").unwrap();
    let json = serde_json::to_value(&expr).unwrap();
    assert_eq!(json["type"], "BinaryExpression");
    assert_eq!(json["operator"], "AND");
    assert_eq!(json["left"]["type"], "Identifier");
    assert_eq!(json["left"]["name"], "x");
    assert_eq!(json["right"]["name"], "y");
}

#[test]
fn binary_levels_fold_left() {
    let g = grammar();
    assert_eq!(printed(&g, "a - b - c"), "((a - b) - c)");
    assert_eq!(printed(&g, "a AND b AND c"), "((a AND b) AND c)");
}

#[test]
fn unary_chains_fold_right() {
    assert_eq!(printed(&grammar(), "NOT NOT a"), "(NOT (NOT a))");
    assert_eq!(printed(&extended(), "!-~x"), "(! (- (~ x)))");
}

#[test]
fn tighter_levels_bind_first() {
    let g = grammar();
    assert_eq!(printed(&g, "a + b AND c"), "((a + b) AND c)");
    assert_eq!(printed(&g, "a AND b ANY c"), "((a AND b) ANY c)");
    assert_eq!(printed(&g, "a ANY b AND c"), "(a ANY (b AND c))");
    assert_eq!(printed(&g, "NOT a AND b"), "((NOT a) AND b)");
}

#[test]
fn conditional_is_right_associative() {
    let g = grammar();
    assert_eq!(printed(&g, "a ? b : c"), "(a ? b : c)");
    assert_eq!(printed(&g, "a ? b : c ? d : e"), "(a ? b : (c ? d : e))");
    assert_eq!(printed(&g, "a AND b ? c + d : e"), "((a AND b) ? (c + d) : e)");
}

#[test]
fn compound_collects_leaves_and_holes() {
    let g = grammar();
    assert_eq!(printed(&g, "a, b + c"), "(a, (b + c))");
    match g.parse("a,,b").unwrap() {
        Expr::CompoundExpression { leaves } => {
            assert_eq!(leaves.len(), 3);
            assert_eq!(leaves[1], Expr::EmptyElement);
        }
        other => panic!("expected a compound, got {:?}", other),
    }
}

#[test]
fn assignments_in_compound_position() {
    let g = grammar();
    assert_eq!(printed(&g, "x = a + 1, y"), "((x = (a + 1)), y)");
    assert_eq!(printed(&g, "(x = NOT y)"), "(x = (NOT y))");

    let options = GrammarOptions {
        assignments: false,
        ..GrammarOptions::default()
    };
    let err = Grammar::new(options).unwrap().parse("x = 1").unwrap_err();
    assert!(matches!(err, ExprError::TrailingTokens { token_index: 1, .. }));
}

#[test]
fn literals_keep_raw_text() {
    let g = grammar();
    match g.parse("0x10").unwrap() {
        Expr::Literal { value, raw, span } => {
            assert_eq!(value, LiteralValue::Number(16.0));
            assert_eq!(raw, "0x10");
            assert_eq!(span, Span::new(0, 4));
        }
        other => panic!("expected a literal, got {:?}", other),
    }
    assert_eq!(printed(&g, "'a' + \"b\""), "('a' + \"b\")");
    assert_eq!(printed(&g, "/a+/i ANY null"), "(/a+/i ANY null)");
}

#[test]
fn extended_table_orders_javascript_operators() {
    let g = extended();
    assert_eq!(printed(&g, "a * b + c"), "((a * b) + c)");
    assert_eq!(printed(&g, "a + b << 2 < c"), "(((a + b) << 2) < c)");
    assert_eq!(printed(&g, "a || b && c"), "(a || (b && c))");
    assert_eq!(printed(&g, "a == b & c | d"), "(((a == b) & c) | d)");
    assert_eq!(printed(&g, "typeof x === 'y'"), "((typeof x) === 'y')");
    assert_eq!(printed(&g, "k in o AND a / b"), "((k in o) AND (a / b))");
}

#[test]
fn precedence_table_from_yaml() {
    let options = GrammarOptions::from_yaml("precedence:\n  - [ANY]\n  - [AND]\n").unwrap();
    let g = Grammar::new(options).unwrap();
    assert_eq!(printed(&g, "a AND b ANY c"), "(a AND (b ANY c))");
    assert!(g.parse("a + b").is_err());
}

// ============================================================================
// ROUND TRIP AND IDEMPOTENCE
// ============================================================================

#[test]
fn printed_form_parses_back_to_the_same_tree() {
    let g = grammar();
    let inputs = [
        "a",
        "a + b - c",
        "NOT a AND NOT NOT b",
        "x ? y ANY z : 'w'",
        "x = 1, , y",
        "(a, b) AND c",
        "true ANY null ANY 0x1f ANY 2.5e3",
    ];
    for input in inputs {
        let once = printed(&g, input);
        let twice = printed(&g, &once);
        assert_eq!(once, twice, "{}", input);
    }
}

#[test]
fn whitespace_and_comments_do_not_change_the_tree() {
    let g = grammar();
    let compact = printed(&g, "a+b AND(c ANY d)");
    let airy = printed(&g, "  a +\n  b   // first half\n AND ( c ANY d ) // done");
    assert_eq!(compact, airy);
}

#[test]
fn strategies_produce_identical_trees() {
    for options in [GrammarOptions::default(), GrammarOptions::extended()] {
        let backtracking = Grammar::with_strategy(options.clone(), Strategy::Backtracking).unwrap();
        let packrat = Grammar::with_strategy(options, Strategy::Packrat).unwrap();
        for input in ["a + b AND c", "NOT a ? (b, c) : d", "x = a ANY b,, c"] {
            assert_eq!(backtracking.parse(input).unwrap(), packrat.parse(input).unwrap());
        }
    }
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn unbalanced_parenthesis_is_a_syntax_error() {
    let err = grammar().parse("(a +").unwrap_err();
    match &err {
        ExprError::Syntax {
            found,
            expected,
            line,
            column,
            ..
        } => {
            assert_eq!(found, "end of input");
            assert!(expected.contains("identifier"), "{}", expected);
            assert_eq!((*line, *column), (1, 5));
        }
        other => panic!("expected a syntax error, got {:?}", other),
    }
    assert_eq!(err.code().map(|c| c.to_string()).as_deref(), Some("exprkit::syntax"));
    assert_eq!(err.span(), Some(Span::new(4, 4)));
}

#[test]
fn missing_operand_points_at_the_stray_token() {
    let err = grammar().parse("a AND AND b").unwrap_err();
    match err {
        ExprError::Syntax { found, token_index, .. } => {
            assert_eq!(found, "`AND`");
            assert_eq!(token_index, 2);
        }
        other => panic!("expected a syntax error, got {:?}", other),
    }
}

#[test]
fn huge_number_is_a_type_error() {
    let err = grammar().parse("1e400").unwrap_err();
    assert_eq!(err.error_type(), ErrorType::NumericRange);
}

#[test]
fn hand_built_non_finite_number_is_rejected_by_the_reducer() {
    let tokens = vec![Token::new(TokenKind::Number, "1e400", Span::new(0, 5), 1, 1)];
    let err = grammar().parse_tokens(&tokens).unwrap_err();
    assert!(matches!(err, ExprError::Syntax { token_index: 0, .. }));
}

#[test]
fn empty_input_is_a_syntax_error() {
    let err = grammar().parse("   ").unwrap_err();
    assert!(matches!(err, ExprError::Syntax { ref found, .. } if found == "end of input"));
}

#[test]
fn invalid_options_fail_at_build_time() {
    let options = GrammarOptions {
        precedence: vec![vec![BinaryOperator::Add], vec![]],
        ..GrammarOptions::default()
    };
    let err = Grammar::new(options).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Config);
}

#[test]
fn ten_thousand_nested_parentheses_fail_cleanly() {
    let text = format!("{}a{}", "(".repeat(10_000), ")".repeat(10_000));
    for strategy in [Strategy::Backtracking, Strategy::Packrat] {
        let grammar = Grammar::new(GrammarOptions::extended().with_strategy(strategy)).unwrap();
        let err = grammar.parse(&text).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Syntax, "{:?}", strategy);
        assert!(err.to_string().contains("levels of nesting"), "{}", err);
    }
}

#[test]
fn division_with_regex_literals_is_rejected() {
    let options = GrammarOptions {
        precedence: vec![vec![BinaryOperator::Divide]],
        ..GrammarOptions::default()
    };
    assert_eq!(Grammar::new(options.clone()).unwrap_err().error_type(), ErrorType::Config);

    let options = GrammarOptions {
        regex_literals: false,
        ..options
    };
    let grammar = Grammar::new(options).unwrap();
    assert_eq!(printed(&grammar, "a / b / c"), "((a / b) / c)");
}
