// Tests for the combinator algebra through both strategies.

use exprkit::ast::Span;
use exprkit::combinators::{Backtracking, Capture, Combinators, Packrat, ParseState, Rule};
use exprkit::lexer::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
enum Tree {
    Leaf(String),
    List(Vec<Tree>),
}

impl Capture for Tree {
    fn from_token(token: &Token) -> Self {
        Tree::Leaf(token.text.clone())
    }
}

/// `List = '[' Item* ']'`, `Item = word | List`
fn list_grammar<C: Combinators<Value = Tree>>(c: &mut C) -> Rule<Tree> {
    c.fixed_point(|c, list| {
        c.token(r"\s+", TokenKind::Ignore)?;
        c.token(r"[\[\]]", TokenKind::Verbatim)?;
        let word = c.token(r"[a-z]+", TokenKind::Identifier)?;
        let item = c.any(vec![word, list]);
        let items = c.star(item);
        let open = c.verbatim("[");
        let close = c.verbatim("]");
        let body = c.all(vec![open, items, close]);
        Ok(c.node(body, |children, _| Some(Tree::List(children))))
    })
    .unwrap()
}

fn parse_with<C: Combinators<Value = Tree>>(mut c: C, text: &str, memo: bool) -> Option<Tree> {
    let rule = list_grammar(&mut c);
    let tokens = c.into_classifier().tokenize(text).unwrap();
    let mut state = if memo {
        ParseState::with_memo(&tokens)
    } else {
        ParseState::new(&tokens)
    };
    let mut found = rule.apply(&mut state)?;
    if state.has_next() {
        return None;
    }
    found.pop()
}

#[test]
fn fixed_point_builds_nested_structures() {
    let tree = parse_with(Backtracking::new(), "[a [b c] []]", false).unwrap();
    assert_eq!(
        tree,
        Tree::List(vec![
            Tree::Leaf("a".into()),
            Tree::List(vec![Tree::Leaf("b".into()), Tree::Leaf("c".into())]),
            Tree::List(vec![]),
        ])
    );
}

#[test]
fn strategies_agree() {
    for text in ["[]", "[a]", "[a [b [c d] e] f]"] {
        assert_eq!(
            parse_with(Backtracking::new(), text, false),
            parse_with(Packrat::new(), text, true),
            "{}",
            text
        );
    }
}

#[test]
fn unbalanced_input_fails_at_the_furthest_token() {
    let mut c = Backtracking::<Tree>::new();
    let rule = list_grammar(&mut c);
    let tokens = c.into_classifier().tokenize("[a [b").unwrap();
    let mut state = ParseState::new(&tokens);
    assert_eq!(rule.apply(&mut state), None);
    assert_eq!(state.position(), 0);
    assert_eq!(state.furthest_failure(), 4);
    assert!(state.expected().contains(&"`]`".to_string()));
}

#[test]
fn optional_never_fails_and_star_accepts_nothing() {
    let mut c = Backtracking::<Tree>::new();
    let word = c.kind(TokenKind::Identifier);
    let maybe = c.optional(word.clone());
    let many = c.star(word);
    let tokens = vec![Token::new(TokenKind::Verbatim, "+", Span::new(0, 1), 1, 1)];

    let mut state = ParseState::new(&tokens);
    assert_eq!(maybe.apply(&mut state), Some(vec![]));
    assert_eq!(many.apply(&mut state), Some(vec![]));
    assert_eq!(state.position(), 0);
}

#[test]
fn dropped_rule_graph_leaves_deferred_references_inert() {
    let mut c = Backtracking::<Tree>::new();
    let mut inner = None;
    let outer = c
        .fixed_point(|c, deferred| {
            inner = Some(deferred.clone());
            Ok(c.kind(TokenKind::Identifier))
        })
        .unwrap();
    let tokens = vec![Token::new(TokenKind::Identifier, "a", Span::new(0, 1), 1, 1)];

    let inner = inner.unwrap();
    assert!(inner.apply(&mut ParseState::new(&tokens)).is_some());
    drop(outer);
    assert_eq!(inner.apply(&mut ParseState::new(&tokens)), None);
}
