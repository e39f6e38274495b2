//! The expression grammar, written once against the [`Combinators`] algebra.
//!
//! ```text
//! Expression   = Conditional                          (fixed point)
//! Conditional  = Level_n ( '?' Expression ':' Expression )?
//! Level_k      = Level_k-1 ( op_k Level_k-1 )*        folded left
//! Level_0      = Unary
//! Unary        = UnaryOperator* Primary               folded right
//! Primary      = Identifier | Literal | '(' Compound ')'
//! Compound     = Assignable ( Elision Assignable )*
//! Elision      = ',' EmptyElement*
//! Assignable   = Identifier '=' Expression | Expression
//! ```

use crate::ast::{BinaryOperator, Expr, LiteralValue, UnaryOperator};
use crate::combinators::{Combinators, Rule};
use crate::config::GrammarOptions;
use crate::errors::ExprError;
use crate::lexer::classifier::numeric_value;
use crate::lexer::{Token, TokenKind};

use super::value::Value;

// ============================================================================
// TOKEN PATTERNS
// ============================================================================

pub const WHITESPACE: &str = r"\s+";
pub const LINE_COMMENT: &str = r"//[^\n]*";
pub const SINGLE_QUOTED: &str = r"'([^'\\]*(?:\\.[^'\\]*)*)'";
pub const DOUBLE_QUOTED: &str = r#""([^"\\]*(?:\\.[^"\\]*)*)""#;
pub const DECIMAL: &str = r"\b((?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][-+]?[0-9]+)?)\b";
pub const HEXADECIMAL: &str = r"\b(0[xX][0-9a-fA-F]+)\b";
pub const NULL: &str = r"\b(null)\b";
pub const BOOLEAN: &str = r"\b(true|false)\b";
pub const REGEX: &str = r"/([^/]+)/([gimuy]*\b)?";
// Registered after the literal patterns so they get the first chance to match.
pub const VERBATIM: &str = concat!(
    r"(=>|\.\.\.|\|\||&&|>>>|>>|<<|<=|>=|\btypeof\b|\binstanceof\b|\bin\b",
    r"|===|!==|!=|==|\+\+|--|\bNOT\b|\bANY\b|\bAND\b|\bnew\b",
    r"|[{}\[\]().?:|&=,^%*/<>+\-~!])",
);
pub const IDENTIFIER: &str = r"([a-zA-Z_$][a-zA-Z0-9_$]*)";

// ============================================================================
// GRAMMAR FACTORY
// ============================================================================

/// Builds the closed `Expression` rule, registering its token patterns with
/// the builder's classifier.
pub fn expression_grammar<C>(c: &mut C, options: &GrammarOptions) -> Result<Rule<Value>, ExprError>
where
    C: Combinators<Value = Value>,
{
    options.validate()?;

    c.fixed_point(|c, expression| {
        c.token(WHITESPACE, TokenKind::Ignore)?;
        c.token(LINE_COMMENT, TokenKind::Ignore)?;

        c.token(SINGLE_QUOTED, TokenKind::String)?;
        let string_token = c.token(DOUBLE_QUOTED, TokenKind::String)?;
        c.token(DECIMAL, TokenKind::Number)?;
        let numeric_token = c.token(HEXADECIMAL, TokenKind::Number)?;
        let null_token = c.token(NULL, TokenKind::Null)?;
        let boolean_token = c.token(BOOLEAN, TokenKind::Boolean)?;
        let regex_token = if options.regex_literals {
            Some(c.token(REGEX, TokenKind::Regex)?)
        } else {
            None
        };
        c.token(VERBATIM, TokenKind::Verbatim)?;
        let identifier_token = c.token(IDENTIFIER, TokenKind::Identifier)?;

        let identifier = identifier_node(c, identifier_token);

        let string_literal = c.node(string_token, |parts, _| {
            let token = single_token(parts)?;
            let value = LiteralValue::String(unescape(token.text_value()));
            Some(Value::Expr(Expr::literal(value, token.text, token.span)))
        });
        let numeric_literal = c.node(numeric_token, |parts, _| {
            let token = single_token(parts)?;
            let value = token
                .number()
                .or_else(|| numeric_value(token.text_value()))
                .filter(|n| n.is_finite())?;
            Some(Value::Expr(Expr::literal(
                LiteralValue::Number(value),
                token.text,
                token.span,
            )))
        });
        let null_literal = c.node(null_token, |parts, _| {
            let token = single_token(parts)?;
            Some(Value::Expr(Expr::literal(LiteralValue::Null, token.text, token.span)))
        });
        let boolean_literal = c.node(boolean_token, |parts, _| {
            let token = single_token(parts)?;
            let value = LiteralValue::Boolean(token.text_value() == "true");
            Some(Value::Expr(Expr::literal(value, token.text, token.span)))
        });

        let mut literals = vec![string_literal, numeric_literal, null_literal, boolean_literal];
        if let Some(regex_token) = regex_token {
            literals.push(c.node(regex_token, |parts, _| {
                let token = single_token(parts)?;
                let pattern = token.capture(0)?.to_string();
                let flags = token.capture(1).unwrap_or_default().to_string();
                let raw = format!("/{}/{}", pattern, flags);
                Some(Value::Expr(Expr::literal(
                    LiteralValue::Regex { pattern, flags },
                    raw,
                    token.span,
                )))
            }));
        }
        let literal = c.any(literals);

        let open = c.verbatim("(");
        let close = c.verbatim(")");
        let compound = compound_rule(c, expression.clone(), options);
        let group = c.all(vec![open, compound, close]);
        let primary = c.any(vec![identifier, literal, group]);

        let unary = unary_expression(c, primary, &options.unary_operators);
        let loosest = options
            .precedence
            .iter()
            .fold(unary, |operand, level| binary_level(c, operand, level));

        Ok(conditional(c, loosest, expression))
    })
}

/// The top-level rule: a compound expression over the closed `expression`.
pub fn program_rule<C>(c: &mut C, expression: Rule<Value>, options: &GrammarOptions) -> Rule<Value>
where
    C: Combinators<Value = Value>,
{
    compound_rule(c, expression, options)
}

/// Comma-separated expressions; collapses to the single child when there is
/// only one.
pub fn compound_rule<C>(c: &mut C, expression: Rule<Value>, options: &GrammarOptions) -> Rule<Value>
where
    C: Combinators<Value = Value>,
{
    let hole = c.verbatim(",");
    let empty_element = c.node(hole, |_, _| Some(Value::Expr(Expr::EmptyElement)));
    let comma = c.verbatim(",");
    let holes = c.star(empty_element);
    let elision = c.all(vec![comma, holes]);

    let assignable = if options.assignments {
        let identifier_token = c.kind(TokenKind::Identifier);
        let target = identifier_node(c, identifier_token);
        let equals = c.verbatim("=");
        let sequence = c.all(vec![target, equals, expression.clone()]);
        let assignment = c.node(sequence, |parts, _| {
            let [target, value] = take_exprs::<2>(parts)?;
            Some(Value::Expr(Expr::assignment(target, value)))
        });
        c.any(vec![assignment, expression])
    } else {
        expression
    };

    let tail = c.all(vec![elision, assignable.clone()]);
    let tails = c.star(tail);
    let sequence = c.all(vec![assignable, tails]);
    c.node(sequence, |parts, _| {
        let mut leaves = exprs(parts)?;
        if leaves.len() == 1 {
            leaves.pop().map(Value::Expr)
        } else {
            Some(Value::Expr(Expr::CompoundExpression { leaves }))
        }
    })
}

// ============================================================================
// PRODUCTIONS
// ============================================================================

fn identifier_node<C>(c: &mut C, identifier_token: Rule<Value>) -> Rule<Value>
where
    C: Combinators<Value = Value>,
{
    c.node(identifier_token, |parts, _| {
        let token = single_token(parts)?;
        Some(Value::Expr(Expr::identifier(token.text_value(), token.span)))
    })
}

fn unary_operator<C>(c: &mut C, operators: &[UnaryOperator]) -> Rule<Value>
where
    C: Combinators<Value = Value>,
{
    let alternatives = operators.iter().map(|op| c.verbatim(op.symbol())).collect();
    let choice = c.any(alternatives);
    c.node(choice, |_, ctx| {
        let op = ctx.first_token()?.text.parse::<UnaryOperator>().ok()?;
        Some(Value::Unary(op))
    })
}

fn binary_operator<C>(c: &mut C, operators: &[BinaryOperator]) -> Rule<Value>
where
    C: Combinators<Value = Value>,
{
    let alternatives = operators.iter().map(|op| c.verbatim(op.symbol())).collect();
    let choice = c.any(alternatives);
    c.node(choice, |_, ctx| {
        let op = ctx.first_token()?.text.parse::<BinaryOperator>().ok()?;
        Some(Value::Binary(op))
    })
}

/// `UnaryOperator* Primary`, folded from the right: the operator closest to
/// the operand ends up innermost.
fn unary_expression<C>(c: &mut C, primary: Rule<Value>, operators: &[UnaryOperator]) -> Rule<Value>
where
    C: Combinators<Value = Value>,
{
    let operator = unary_operator(c, operators);
    let prefixes = c.star(operator);
    let sequence = c.all(vec![prefixes, primary]);
    c.node(sequence, |mut parts, _| {
        let argument = parts.pop()?.into_expr()?;
        parts
            .into_iter()
            .rev()
            .try_fold(argument, |argument, part| match part {
                Value::Unary(op) => Some(Expr::unary(op, argument)),
                _ => None,
            })
            .map(Value::Expr)
    })
}

/// One precedence level: `operand (op operand)*`, folded from the left.
fn binary_level<C>(c: &mut C, operand: Rule<Value>, operators: &[BinaryOperator]) -> Rule<Value>
where
    C: Combinators<Value = Value>,
{
    let operator = binary_operator(c, operators);
    let pair = c.all(vec![operator, operand.clone()]);
    let apply = c.node(pair, |parts, _| {
        let [operator, right] = <[Value; 2]>::try_from(parts).ok()?;
        match (operator, right) {
            (Value::Binary(op), Value::Expr(right)) => Some(Value::Operand(op, right)),
            _ => None,
        }
    });
    let applications = c.star(apply);
    let sequence = c.all(vec![operand, applications]);
    c.node(sequence, |parts, _| {
        let mut parts = parts.into_iter();
        let first = parts.next()?.into_expr()?;
        parts
            .try_fold(first, |left, part| match part {
                Value::Operand(op, right) => Some(Expr::binary(op, left, right)),
                _ => None,
            })
            .map(Value::Expr)
    })
}

/// `test ('?' Expression ':' Expression)?`; both branches recurse into the
/// full expression, which makes the conditional right-associative.
fn conditional<C>(c: &mut C, test: Rule<Value>, expression: Rule<Value>) -> Rule<Value>
where
    C: Combinators<Value = Value>,
{
    let question = c.verbatim("?");
    let colon = c.verbatim(":");
    let branches = c.all(vec![question, expression.clone(), colon, expression]);
    let branches = c.optional(branches);
    let sequence = c.all(vec![test, branches]);
    c.node(sequence, |parts, _| {
        let mut exprs = exprs(parts)?;
        match exprs.len() {
            1 => exprs.pop().map(Value::Expr),
            3 => {
                let alternate = exprs.pop()?;
                let consequent = exprs.pop()?;
                let test = exprs.pop()?;
                Some(Value::Expr(Expr::conditional(test, consequent, alternate)))
            }
            _ => None,
        }
    })
}

// ============================================================================
// REDUCER HELPERS
// ============================================================================

fn single_token(parts: Vec<Value>) -> Option<Token> {
    let [part] = <[Value; 1]>::try_from(parts).ok()?;
    part.into_token()
}

fn exprs(parts: Vec<Value>) -> Option<Vec<Expr>> {
    parts.into_iter().map(Value::into_expr).collect()
}

fn take_exprs<const N: usize>(parts: Vec<Value>) -> Option<[Expr; N]> {
    exprs(parts)?.try_into().ok()
}

/// Decodes the escape sequences of a quoted string's body.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                let code = match hex.len() {
                    4 if hex.chars().all(|c| c.is_ascii_hexdigit()) => {
                        u32::from_str_radix(&hex, 16).ok()
                    }
                    _ => None,
                };
                match code {
                    Some(code) => {
                        chars.nth(3);
                        out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                    }
                    None => out.push(char::REPLACEMENT_CHARACTER),
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
