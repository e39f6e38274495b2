//! Parser-combinator engine.
//!
//! A [`Rule`] is a shareable parsing function over a token slice. Given the
//! [`ParseState`], it either succeeds, returning its captured sub-results and
//! leaving the cursor after the consumed tokens, or fails with `None` and
//! leaves the cursor where it found it. No partial consumption on failure is
//! what lets [`Combinators::any`] backtrack.
//!
//! The primitives are exposed through the [`Combinators`] trait so a grammar
//! written once against the trait can run on different strategies; see
//! [`Backtracking`] and [`Packrat`].

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;

use crate::ast::Span;
use crate::errors::ExprError;
use crate::lexer::{Token, TokenClassifier, TokenKind};

mod state;
mod strategy;

pub use state::{ParseState, MAX_NESTING_DEPTH};
pub use strategy::{Backtracking, Packrat};

// ============================================================================
// RULES
// ============================================================================

/// Identity of a rule object, used as the packrat key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(usize);

static NEXT_RULE_ID: AtomicUsize = AtomicUsize::new(0);

type RuleFn<V> = dyn Fn(&mut ParseState<'_, V>) -> Option<Vec<V>> + Send + Sync;

/// A composable parsing function.
pub struct Rule<V> {
    id: RuleId,
    run: Arc<RuleFn<V>>,
}

impl<V> Clone for Rule<V> {
    fn clone(&self) -> Self {
        Rule {
            id: self.id,
            run: Arc::clone(&self.run),
        }
    }
}

impl<V> fmt::Debug for Rule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule#{}", self.id.0)
    }
}

impl<V> Rule<V> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut ParseState<'_, V>) -> Option<Vec<V>> + Send + Sync + 'static,
    {
        Rule {
            id: RuleId(NEXT_RULE_ID.fetch_add(1, Ordering::Relaxed)),
            run: Arc::new(f),
        }
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    /// Runs the rule at the current cursor.
    pub fn apply(&self, state: &mut ParseState<'_, V>) -> Option<Vec<V>> {
        (self.run)(state)
    }
}

/// A value a rule can capture. Token rules capture through `from_token`;
/// everything else is produced by node reducers.
pub trait Capture: Clone + 'static {
    fn from_token(token: &Token) -> Self;
}

/// What a node reducer can see of the match it is reducing.
#[derive(Debug, Clone, Copy)]
pub struct NodeContext<'a> {
    tokens: &'a [Token],
    start: usize,
    end: usize,
}

impl<'a> NodeContext<'a> {
    pub fn new(tokens: &'a [Token], start: usize, end: usize) -> Self {
        Self { tokens, start, end }
    }

    pub fn tokens(&self) -> &'a [Token] {
        self.tokens
    }

    /// Index of the first matched token.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Index one past the last matched token.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn matched(&self) -> &'a [Token] {
        &self.tokens[self.start..self.end]
    }

    /// The token the match starts at.
    pub fn first_token(&self) -> Option<&'a Token> {
        self.matched().first()
    }

    /// Byte span covered by the matched tokens.
    pub fn span(&self) -> Option<Span> {
        let first = self.matched().first()?;
        let last = self.matched().last()?;
        Some(first.span.merge(last.span))
    }
}

// ============================================================================
// THE PRIMITIVE ALGEBRA
// ============================================================================

/// The primitive builders a grammar is written against.
///
/// Every method has a default built on the plain backtracking primitives;
/// a strategy overrides the ones it changes.
pub trait Combinators {
    type Value: Capture;

    fn classifier(&self) -> &TokenClassifier;

    fn classifier_mut(&mut self) -> &mut TokenClassifier;

    /// Gives up the builder, keeping the token classifier the grammar filled in.
    fn into_classifier(self) -> TokenClassifier
    where
        Self: Sized;

    /// Registers `pattern` with the token classifier under `kind` and returns
    /// a rule matching one token of that kind. All patterns of one kind yield
    /// interchangeable rules.
    fn token(&mut self, pattern: &str, kind: TokenKind) -> Result<Rule<Self::Value>, ExprError> {
        self.classifier_mut().register(pattern, kind)?;
        Ok(self.kind(kind))
    }

    /// Matches one token of `kind` without registering a pattern.
    fn kind(&mut self, kind: TokenKind) -> Rule<Self::Value> {
        token_of_kind(kind)
    }

    /// Matches one verbatim token with exactly this text; captures nothing.
    fn verbatim(&mut self, text: &str) -> Rule<Self::Value> {
        verbatim(text)
    }

    fn all(&mut self, rules: Vec<Rule<Self::Value>>) -> Rule<Self::Value> {
        all(rules)
    }

    fn any(&mut self, rules: Vec<Rule<Self::Value>>) -> Rule<Self::Value> {
        any(rules)
    }

    fn plus(&mut self, rule: Rule<Self::Value>) -> Rule<Self::Value> {
        plus(rule)
    }

    fn optional(&mut self, rule: Rule<Self::Value>) -> Rule<Self::Value> {
        optional(rule)
    }

    /// Zero or more: `optional(plus(rule))`.
    fn star(&mut self, rule: Rule<Self::Value>) -> Rule<Self::Value> {
        let repeated = self.plus(rule);
        self.optional(repeated)
    }

    /// Reduces the captures of `rule` into a single value. A reducer returning
    /// `None` rejects the match.
    fn node<F>(&mut self, rule: Rule<Self::Value>, reducer: F) -> Rule<Self::Value>
    where
        F: Fn(Vec<Self::Value>, &NodeContext<'_>) -> Option<Self::Value> + Send + Sync + 'static,
    {
        node(rule, reducer)
    }

    /// Builds a self-referential rule. `build` receives a deferred rule that
    /// stands for the result and resolves to it only when invoked.
    fn fixed_point<F>(&mut self, build: F) -> Result<Rule<Self::Value>, ExprError>
    where
        Self: Sized,
        F: FnOnce(&mut Self, Rule<Self::Value>) -> Result<Rule<Self::Value>, ExprError>,
    {
        fixed_point(self, build)
    }
}

// ============================================================================
// PRIMITIVE IMPLEMENTATIONS
// ============================================================================

pub fn token_of_kind<V: Capture>(kind: TokenKind) -> Rule<V> {
    Rule::new(move |state: &mut ParseState<'_, V>| match state.peek() {
        Some(token) if token.kind == kind => {
            state.advance();
            Some(vec![V::from_token(token)])
        }
        _ => {
            state.record_failure(|| kind.as_str().to_string());
            None
        }
    })
}

pub fn verbatim<V: Capture>(text: &str) -> Rule<V> {
    let text = text.to_string();
    Rule::new(move |state: &mut ParseState<'_, V>| match state.peek() {
        Some(token) if token.kind == TokenKind::Verbatim && token.text == text => {
            state.advance();
            Some(Vec::new())
        }
        _ => {
            state.record_failure(|| format!("`{}`", text));
            None
        }
    })
}

/// Sequence: every rule in turn, captures concatenated.
pub fn all<V: Capture>(rules: Vec<Rule<V>>) -> Rule<V> {
    Rule::new(move |state: &mut ParseState<'_, V>| {
        let start = state.position();
        let mut captures = Vec::new();
        for rule in &rules {
            match rule.apply(state) {
                Some(found) => captures.extend(found),
                None => {
                    state.restore(start);
                    return None;
                }
            }
        }
        Some(captures)
    })
}

/// Ordered choice: the first rule that succeeds.
pub fn any<V: Capture>(rules: Vec<Rule<V>>) -> Rule<V> {
    Rule::new(move |state: &mut ParseState<'_, V>| {
        let start = state.position();
        for rule in &rules {
            if let Some(found) = rule.apply(state) {
                return Some(found);
            }
            state.restore(start);
        }
        None
    })
}

/// One or more, greedy. An iteration that consumes nothing ends the loop.
pub fn plus<V: Capture>(rule: Rule<V>) -> Rule<V> {
    Rule::new(move |state: &mut ParseState<'_, V>| {
        let mut captures = rule.apply(state)?;
        loop {
            let pos = state.position();
            match rule.apply(state) {
                Some(found) if state.position() > pos => captures.extend(found),
                _ => {
                    state.restore(pos);
                    break;
                }
            }
        }
        Some(captures)
    })
}

/// Zero or one. Never fails.
pub fn optional<V: Capture>(rule: Rule<V>) -> Rule<V> {
    Rule::new(move |state: &mut ParseState<'_, V>| {
        let pos = state.position();
        match rule.apply(state) {
            Some(found) => Some(found),
            None => {
                state.restore(pos);
                Some(Vec::new())
            }
        }
    })
}

pub fn node<V, F>(rule: Rule<V>, reducer: F) -> Rule<V>
where
    V: Capture,
    F: Fn(Vec<V>, &NodeContext<'_>) -> Option<V> + Send + Sync + 'static,
{
    let id = rule.id();
    Rule::new(move |state: &mut ParseState<'_, V>| {
        let start = state.position();
        let captures = rule.apply(state)?;
        let ctx = NodeContext::new(state.tokens(), start, state.position());
        match reducer(captures, &ctx) {
            Some(value) => {
                tracing::trace!(rule = id.0, start, end = ctx.end(), "reduced node");
                Some(vec![value])
            }
            None => {
                state.restore(start);
                None
            }
        }
    })
}

/// Caches the outcome of `rule` per start position when the parse state
/// carries a packrat table.
pub fn memoize<V: Capture>(rule: Rule<V>) -> Rule<V> {
    let id = rule.id();
    Rule::new(move |state: &mut ParseState<'_, V>| {
        if !state.is_memoizing() {
            return rule.apply(state);
        }
        let start = state.position();
        if let Some(cached) = state.memo_lookup(id) {
            return cached.map(|(captures, end)| {
                state.restore(end);
                captures
            });
        }
        let result = rule.apply(state);
        let entry = result
            .as_ref()
            .map(|captures| (captures.clone(), state.position()));
        state.memo_store(id, start, entry);
        result
    })
}

/// The deferred slot behind [`Combinators::fixed_point`].
///
/// References handed to `build` hold the slot weakly; the returned rule owns
/// it. Dropping the returned rule frees the whole rule graph. Each pass
/// through a deferred reference counts as one nesting level of the parse.
pub fn fixed_point<C, F>(combinators: &mut C, build: F) -> Result<Rule<C::Value>, ExprError>
where
    C: Combinators,
    F: FnOnce(&mut C, Rule<C::Value>) -> Result<Rule<C::Value>, ExprError>,
{
    let slot: Arc<OnceCell<Rule<C::Value>>> = Arc::new(OnceCell::new());

    let weak: Weak<OnceCell<Rule<C::Value>>> = Arc::downgrade(&slot);
    let deferred = Rule::new(move |state: &mut ParseState<'_, C::Value>| {
        let slot = weak.upgrade()?;
        let Some(rule) = slot.get() else {
            tracing::warn!("deferred rule invoked before its fixed point was closed");
            return None;
        };
        if !state.enter_nested() {
            return None;
        }
        let result = rule.apply(state);
        state.exit_nested();
        result
    });

    let rule = build(combinators, deferred)?;
    // the cell is fresh, so this is its only write
    let _ = slot.set(rule);

    Ok(Rule::new(move |state: &mut ParseState<'_, C::Value>| {
        slot.get().and_then(|rule| rule.apply(state))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Text(String);

    impl Capture for Text {
        fn from_token(token: &Token) -> Self {
            Text(token.text.clone())
        }
    }

    fn tokens(texts: &[&str]) -> Vec<Token> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let kind = if text.chars().all(char::is_alphanumeric) {
                    TokenKind::Identifier
                } else {
                    TokenKind::Verbatim
                };
                Token::new(kind, *text, Span::new(i, i + 1), 1, i + 1)
            })
            .collect()
    }

    #[test]
    fn all_restores_cursor_on_failure() {
        let input = tokens(&["a", "+", "+"]);
        let mut state = ParseState::new(&input);
        let ident = token_of_kind::<Text>(TokenKind::Identifier);
        let rule = all(vec![ident.clone(), verbatim("+"), ident]);
        assert_eq!(rule.apply(&mut state), None);
        assert_eq!(state.position(), 0);
    }

    #[test]
    fn any_takes_the_first_success() {
        let input = tokens(&["a"]);
        let mut state = ParseState::new(&input);
        let first = node(token_of_kind::<Text>(TokenKind::Identifier), |_, _| {
            Some(Text("first".into()))
        });
        let second = token_of_kind::<Text>(TokenKind::Identifier);
        let rule = any(vec![first, second]);
        assert_eq!(rule.apply(&mut state), Some(vec![Text("first".into())]));
    }

    #[test]
    fn plus_is_greedy() {
        let input = tokens(&["a", "b", "c", "+"]);
        let mut state = ParseState::new(&input);
        let rule = plus(token_of_kind::<Text>(TokenKind::Identifier));
        assert_eq!(rule.apply(&mut state).map(|c| c.len()), Some(3));
        assert_eq!(state.position(), 3);
    }

    #[test]
    fn rejecting_reducer_fails_without_consuming() {
        let input = tokens(&["a"]);
        let mut state = ParseState::new(&input);
        let rule = node(token_of_kind::<Text>(TokenKind::Identifier), |_, _| None);
        assert_eq!(rule.apply(&mut state), None);
        assert_eq!(state.position(), 0);
    }

    #[test]
    fn node_context_spans_the_match() {
        let input = tokens(&["(", "a", ")"]);
        let mut state = ParseState::new(&input);
        let rule = node(
            all(vec![verbatim("("), token_of_kind::<Text>(TokenKind::Identifier), verbatim(")")]),
            |_, ctx| {
                let span = ctx.span()?;
                Some(Text(format!("{}..{}", span.start, span.end)))
            },
        );
        assert_eq!(rule.apply(&mut state), Some(vec![Text("0..3".into())]));
    }
}
