//! The configurable expression grammar.
//!
//! [`expression_grammar`] writes the grammar once against the
//! [`Combinators`](crate::combinators::Combinators) algebra. [`Grammar`]
//! picks a strategy from the [`GrammarOptions`], builds the rules and the
//! token classifier together, and turns the outermost parse failure into an
//! [`ExprError`].

use once_cell::sync::OnceCell;

use crate::ast::{Expr, Span};
use crate::combinators::{Backtracking, Combinators, Packrat, ParseState, Rule, MAX_NESTING_DEPTH};
use crate::config::{GrammarOptions, Strategy};
use crate::errors::{ErrorContext, ExprError};
use crate::lexer::{Token, TokenClassifier};

pub mod expression;
pub mod value;

pub use expression::{compound_rule, expression_grammar, program_rule};
pub use value::Value;

/// A built expression grammar: its rules plus the token classifier they
/// registered.
#[derive(Debug)]
pub struct Grammar {
    options: GrammarOptions,
    classifier: TokenClassifier,
    expression: Rule<Value>,
    program: Rule<Value>,
}

impl Grammar {
    pub fn new(options: GrammarOptions) -> Result<Self, ExprError> {
        tracing::debug!(
            strategy = ?options.strategy,
            levels = options.precedence.len(),
            "building expression grammar"
        );
        match options.strategy {
            Strategy::Backtracking => Self::build(Backtracking::new(), options),
            Strategy::Packrat => Self::build(Packrat::new(), options),
        }
    }

    pub fn with_strategy(options: GrammarOptions, strategy: Strategy) -> Result<Self, ExprError> {
        Self::new(options.with_strategy(strategy))
    }

    fn build<C>(mut combinators: C, options: GrammarOptions) -> Result<Self, ExprError>
    where
        C: Combinators<Value = Value>,
    {
        let expression = expression_grammar(&mut combinators, &options)?;
        let program = program_rule(&mut combinators, expression.clone(), &options);
        Ok(Self {
            classifier: combinators.into_classifier(),
            options,
            expression,
            program,
        })
    }

    pub fn options(&self) -> &GrammarOptions {
        &self.options
    }

    pub fn classifier(&self) -> &TokenClassifier {
        &self.classifier
    }

    /// The closed `Expression` rule, without the compound top level.
    pub fn expression(&self) -> &Rule<Value> {
        &self.expression
    }

    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>, ExprError> {
        self.classifier.tokenize(text)
    }

    /// Tokenizes and parses `text`; the whole input must be consumed.
    pub fn parse(&self, text: &str) -> Result<Expr, ExprError> {
        let tokens = self.tokenize(text)?;
        self.parse_tokens(&tokens)
    }

    pub fn parse_tokens(&self, tokens: &[Token]) -> Result<Expr, ExprError> {
        let mut state = match self.options.strategy {
            Strategy::Backtracking => ParseState::new(tokens),
            Strategy::Packrat => ParseState::with_memo(tokens),
        };

        let matched = self.program.apply(&mut state);
        if let Some(index) = state.nesting_overflow() {
            return Err(nesting_too_deep(tokens, index));
        }
        match matched {
            // a rule that got further than the match explains the leftover better
            Some(_) if state.has_next() && state.furthest_failure() > state.position() => {
                Err(syntax_error(tokens, &state))
            }
            Some(_) if state.has_next() => Err(trailing_tokens(tokens, state.position())),
            Some(values) => values
                .into_iter()
                .next()
                .and_then(Value::into_expr)
                .ok_or_else(|| syntax_error(tokens, &state)),
            None => Err(syntax_error(tokens, &state)),
        }
    }
}

static DEFAULT_GRAMMAR: OnceCell<Grammar> = OnceCell::new();

/// Parses `text` with the default grammar.
pub fn parse(text: &str) -> Result<Expr, ExprError> {
    DEFAULT_GRAMMAR
        .get_or_try_init(|| Grammar::new(GrammarOptions::default()))?
        .parse(text)
}

// ============================================================================
// ERROR CONSTRUCTION
// ============================================================================

struct Location {
    found: String,
    line: usize,
    column: usize,
    span: Span,
}

fn locate(tokens: &[Token], index: usize) -> Location {
    if let Some(token) = tokens.get(index) {
        return Location {
            found: token.describe(),
            line: token.line,
            column: token.column,
            span: token.span,
        };
    }
    match tokens.last() {
        Some(last) => Location {
            found: "end of input".to_string(),
            line: last.line,
            column: last.column + last.text.chars().count(),
            span: Span::new(last.span.end, last.span.end),
        },
        None => Location {
            found: "end of input".to_string(),
            line: 1,
            column: 1,
            span: Span::new(0, 0),
        },
    }
}

fn syntax_error(tokens: &[Token], state: &ParseState<'_, Value>) -> ExprError {
    let index = state.furthest_failure();
    let location = locate(tokens, index);
    let expected = join_alternatives(state.expected());
    tracing::debug!(index, %expected, found = %location.found, "parse failed");
    ExprError::Syntax {
        expected,
        found: location.found,
        line: location.line,
        column: location.column,
        token_index: index,
        ctx: ErrorContext::with_span(location.span),
    }
}

fn nesting_too_deep(tokens: &[Token], index: usize) -> ExprError {
    let location = locate(tokens, index);
    tracing::debug!(index, found = %location.found, "nesting too deep");
    ExprError::Syntax {
        expected: format!("at most {} levels of nesting", MAX_NESTING_DEPTH),
        found: location.found,
        line: location.line,
        column: location.column,
        token_index: index,
        ctx: ErrorContext::with_span_and_help(location.span, "nesting too deep"),
    }
}

fn trailing_tokens(tokens: &[Token], index: usize) -> ExprError {
    let location = locate(tokens, index);
    ExprError::TrailingTokens {
        found: location.found,
        line: location.line,
        column: location.column,
        token_index: index,
        ctx: ErrorContext::with_span_and_help(
            location.span,
            "separate expressions with `,` or remove the extra input",
        ),
    }
}

fn join_alternatives(expected: &[String]) -> String {
    match expected {
        [] => "an expression".to_string(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}
