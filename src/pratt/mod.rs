//! Pratt parser over the line scanner's tokens.
//!
//! Every token is classified into a closed [`PrattTokenType`]; parsing looks
//! the type up in a [`Parselets`] registry. A prefix parselet starts an
//! expression, and while the next token has an infix parselet that binds
//! tighter than the current level, that parselet extends the left operand.
//! All cursor state lives in the [`PrattContext`] of one parse.

use std::fmt;

use serde::Serialize;

use crate::ast::Span;
use crate::errors::{ErrorContext, ExprError};
use crate::lexer::{tokenize, Token, TokenKind};

pub mod parselets;

pub use parselets::{precedence, InfixParselet, Parselets, PrefixParselet};

// ============================================================================
// TOKEN TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrattTokenType {
    Name,
    Number,
    String,
    Plus,
    Minus,
    Tilde,
    Bang,
    Star,
    Slash,
    LeftParen,
    RightParen,
    LeftCurly,
    RightCurly,
}

impl PrattTokenType {
    /// Classifies a scanner token. Punctuators outside the closed set are an
    /// error.
    pub fn classify(token: &Token) -> Result<Self, ExprError> {
        use PrattTokenType::*;
        match token.kind {
            TokenKind::Name | TokenKind::Identifier => return Ok(Name),
            TokenKind::Number => return Ok(Number),
            TokenKind::String => return Ok(String),
            _ => {}
        }
        let token_type = match token.text.as_str() {
            "+" => Plus,
            "-" => Minus,
            "~" => Tilde,
            "!" => Bang,
            "*" => Star,
            "/" => Slash,
            "(" => LeftParen,
            ")" => RightParen,
            "{" => LeftCurly,
            "}" => RightCurly,
            _ => {
                return Err(pratt_error(
                    format!("unsupported token {}", token.describe()),
                    token,
                ))
            }
        };
        Ok(token_type)
    }

    /// The punctuator text, for operator types.
    pub fn symbol(self) -> Option<&'static str> {
        use PrattTokenType::*;
        Some(match self {
            Plus => "+",
            Minus => "-",
            Tilde => "~",
            Bang => "!",
            Star => "*",
            Slash => "/",
            LeftParen => "(",
            RightParen => ")",
            LeftCurly => "{",
            RightCurly => "}",
            Name | Number | String => return None,
        })
    }
}

impl fmt::Display for PrattTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol() {
            Some(symbol) => write!(f, "`{}`", symbol),
            None => f.write_str(match self {
                PrattTokenType::Name => "name",
                PrattTokenType::Number => "number",
                _ => "string",
            }),
        }
    }
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PrattExpr {
    #[serde(rename = "NameExpression")]
    Name { name: String },
    #[serde(rename = "NumberExpression")]
    Number { value: f64, raw: String },
    #[serde(rename = "StringExpression")]
    Str { value: String },
    #[serde(rename = "PrefixExpression")]
    Prefix {
        op: PrattTokenType,
        operand: Box<PrattExpr>,
    },
    #[serde(rename = "OperatorExpression")]
    Operator {
        left: Box<PrattExpr>,
        op: PrattTokenType,
        right: Box<PrattExpr>,
    },
}

impl fmt::Display for PrattExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrattExpr::Name { name } => f.write_str(name),
            PrattExpr::Number { raw, .. } => f.write_str(raw),
            PrattExpr::Str { value } => write!(f, "{:?}", value),
            PrattExpr::Prefix { op, operand } => {
                write!(f, "{} {}", op.symbol().unwrap_or("?"), operand)
            }
            PrattExpr::Operator { left, op, right } => {
                write!(f, "( {} {} {} )", left, op.symbol().unwrap_or("?"), right)
            }
        }
    }
}

// ============================================================================
// PARSE CONTEXT
// ============================================================================

/// How deeply [`PrattParser::parse_expression`] may recurse.
pub const MAX_PRATT_DEPTH: usize = 256;

/// Cursor over the classified tokens of one parse.
#[derive(Debug)]
pub struct PrattContext<'t> {
    tokens: &'t [Token],
    types: Vec<PrattTokenType>,
    cursor: usize,
    depth: usize,
}

impl<'t> PrattContext<'t> {
    pub fn new(tokens: &'t [Token]) -> Result<Self, ExprError> {
        let types = tokens
            .iter()
            .map(PrattTokenType::classify)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            tokens,
            types,
            cursor: 0,
            depth: 0,
        })
    }

    pub fn peek(&self) -> Option<(&'t Token, PrattTokenType)> {
        let token = self.tokens.get(self.cursor)?;
        Some((token, self.types[self.cursor]))
    }

    pub fn consume(&mut self) -> Option<(&'t Token, PrattTokenType)> {
        let next = self.peek()?;
        self.cursor += 1;
        Some(next)
    }

    /// Consumes the next token if it has type `expected`.
    pub fn expect(&mut self, expected: PrattTokenType) -> Result<&'t Token, ExprError> {
        match self.peek() {
            Some((token, token_type)) if token_type == expected => {
                self.cursor += 1;
                Ok(token)
            }
            Some((token, _)) => Err(pratt_error(
                format!("expected {} but found {}", expected, token.describe()),
                token,
            )),
            None => Err(self.end_of_input(format!("expected {} but found end of input", expected))),
        }
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    fn enter_nested(&mut self) -> Result<(), ExprError> {
        if self.depth < MAX_PRATT_DEPTH {
            self.depth += 1;
            return Ok(());
        }
        let message = format!("nesting too deep: more than {} levels", MAX_PRATT_DEPTH);
        match self.tokens.get(self.cursor) {
            Some(token) => Err(pratt_error(message, token)),
            None => Err(self.end_of_input(message)),
        }
    }

    fn exit_nested(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn end_of_input(&self, message: String) -> ExprError {
        let (line, column, span) = match self.tokens.last() {
            Some(last) => (
                last.line,
                last.column + last.text.chars().count(),
                Span::new(last.span.end, last.span.end),
            ),
            None => (1, 1, Span::new(0, 0)),
        };
        ExprError::Pratt {
            message,
            line,
            column,
            ctx: ErrorContext::with_span(span),
        }
    }
}

fn pratt_error(message: String, token: &Token) -> ExprError {
    ExprError::Pratt {
        message,
        line: token.line,
        column: token.column,
        ctx: ErrorContext::with_span(token.span),
    }
}

// ============================================================================
// PARSER
// ============================================================================

/// A Pratt parser over an immutable parselet registry.
#[derive(Debug, Clone)]
pub struct PrattParser {
    parselets: Parselets,
}

impl Default for PrattParser {
    fn default() -> Self {
        Self::new(Parselets::standard())
    }
}

impl PrattParser {
    pub fn new(parselets: Parselets) -> Self {
        Self { parselets }
    }

    pub fn parselets(&self) -> &Parselets {
        &self.parselets
    }

    /// Scans and parses `text`; the whole input must form one expression.
    pub fn parse(&self, text: &str) -> Result<PrattExpr, ExprError> {
        let tokens = tokenize(text)?;
        self.parse_tokens(&tokens)
    }

    pub fn parse_tokens(&self, tokens: &[Token]) -> Result<PrattExpr, ExprError> {
        let mut ctx = PrattContext::new(tokens)?;
        let expr = self.parse_expression(&mut ctx, 0)?;
        match ctx.peek() {
            Some((token, _)) => Err(pratt_error(
                format!("unexpected {} after a complete expression", token.describe()),
                token,
            )),
            None => Ok(expr),
        }
    }

    /// Parses one expression whose infix operators all bind tighter than
    /// `precedence`.
    pub fn parse_expression(
        &self,
        ctx: &mut PrattContext<'_>,
        precedence: u8,
    ) -> Result<PrattExpr, ExprError> {
        ctx.enter_nested()?;
        let result = self.parse_binding(ctx, precedence);
        ctx.exit_nested();
        result
    }

    fn parse_binding(
        &self,
        ctx: &mut PrattContext<'_>,
        precedence: u8,
    ) -> Result<PrattExpr, ExprError> {
        let (token, token_type) = match ctx.consume() {
            Some(next) => next,
            None => return Err(ctx.end_of_input("expected an expression but found end of input".into())),
        };
        let prefix = self.parselets.prefix(token_type).ok_or_else(|| {
            pratt_error(format!("could not parse {}", token.describe()), token)
        })?;
        let mut left = prefix.parse(self, ctx, token, token_type)?;

        while let Some((_, token_type)) = ctx.peek() {
            let Some(infix) = self.parselets.infix(token_type) else {
                break;
            };
            if infix.precedence() <= precedence {
                break;
            }
            ctx.consume();
            left = infix.parse(self, ctx, left, token_type)?;
        }
        Ok(left)
    }
}
