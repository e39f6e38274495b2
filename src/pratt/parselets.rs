//! Prefix and infix parselets and the registry that binds them to token types.

use std::collections::HashMap;

use crate::errors::ExprError;
use crate::lexer::{Token, TokenValue};

use super::{PrattContext, PrattExpr, PrattParser, PrattTokenType};

/// Binding precedences of the standard parselets. Higher binds tighter.
pub mod precedence {
    pub const SUM: u8 = 3;
    pub const PRODUCT: u8 = 4;
    /// Operand precedence of prefix operators.
    pub const PREFIX: u8 = 6;
}

/// Produces an expression from the token that starts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixParselet {
    Name,
    /// Number or string.
    Literal,
    /// A prefix operator applied to the following expression.
    Operator,
    /// A parenthesized expression that must end with `close`.
    Group { close: PrattTokenType },
}

impl PrefixParselet {
    pub fn parse(
        self,
        parser: &PrattParser,
        ctx: &mut PrattContext<'_>,
        token: &Token,
        token_type: PrattTokenType,
    ) -> Result<PrattExpr, ExprError> {
        match self {
            PrefixParselet::Name => Ok(PrattExpr::Name {
                name: token.text.clone(),
            }),
            PrefixParselet::Literal => Ok(match &token.value {
                TokenValue::Number(value) => PrattExpr::Number {
                    value: *value,
                    raw: token.text.clone(),
                },
                TokenValue::Text(value) => PrattExpr::Str {
                    value: value.clone(),
                },
            }),
            PrefixParselet::Operator => {
                let operand = parser.parse_expression(ctx, precedence::PREFIX)?;
                Ok(PrattExpr::Prefix {
                    op: token_type,
                    operand: Box::new(operand),
                })
            }
            PrefixParselet::Group { close } => {
                let inner = parser.parse_expression(ctx, 0)?;
                ctx.expect(close)?;
                Ok(inner)
            }
        }
    }
}

/// Extends an already parsed left operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixParselet {
    Binary {
        precedence: u8,
        right_associative: bool,
    },
}

impl InfixParselet {
    pub fn left(precedence: u8) -> Self {
        InfixParselet::Binary {
            precedence,
            right_associative: false,
        }
    }

    pub fn right(precedence: u8) -> Self {
        InfixParselet::Binary {
            precedence,
            right_associative: true,
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            InfixParselet::Binary { precedence, .. } => precedence,
        }
    }

    pub fn parse(
        self,
        parser: &PrattParser,
        ctx: &mut PrattContext<'_>,
        left: PrattExpr,
        token_type: PrattTokenType,
    ) -> Result<PrattExpr, ExprError> {
        match self {
            InfixParselet::Binary {
                precedence,
                right_associative,
            } => {
                let operand_precedence = if right_associative {
                    precedence.saturating_sub(1)
                } else {
                    precedence
                };
                let right = parser.parse_expression(ctx, operand_precedence)?;
                Ok(PrattExpr::Operator {
                    left: Box::new(left),
                    op: token_type,
                    right: Box::new(right),
                })
            }
        }
    }
}

/// Token type to parselet tables; at most one prefix and one infix handler
/// per token type.
#[derive(Debug, Clone, Default)]
pub struct Parselets {
    prefix: HashMap<PrattTokenType, PrefixParselet>,
    infix: HashMap<PrattTokenType, InfixParselet>,
}

impl Parselets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names, literals, prefix `+ - ~ !`, `( )` and `{ }` groups, and the
    /// binary `+ -` and `* /` levels.
    pub fn standard() -> Self {
        use PrattTokenType::*;

        let mut parselets = Self::new();
        parselets.register_prefix(Name, PrefixParselet::Name);
        parselets.register_prefix(Number, PrefixParselet::Literal);
        parselets.register_prefix(String, PrefixParselet::Literal);
        for op in [Plus, Minus, Tilde, Bang] {
            parselets.register_prefix(op, PrefixParselet::Operator);
        }
        parselets.register_prefix(LeftParen, PrefixParselet::Group { close: RightParen });
        parselets.register_prefix(LeftCurly, PrefixParselet::Group { close: RightCurly });

        parselets.register_infix(Plus, InfixParselet::left(precedence::SUM));
        parselets.register_infix(Minus, InfixParselet::left(precedence::SUM));
        parselets.register_infix(Star, InfixParselet::left(precedence::PRODUCT));
        parselets.register_infix(Slash, InfixParselet::left(precedence::PRODUCT));
        parselets
    }

    /// Binds `parselet` to `token_type`, returning the handler it replaces.
    pub fn register_prefix(
        &mut self,
        token_type: PrattTokenType,
        parselet: PrefixParselet,
    ) -> Option<PrefixParselet> {
        self.prefix.insert(token_type, parselet)
    }

    pub fn register_infix(
        &mut self,
        token_type: PrattTokenType,
        parselet: InfixParselet,
    ) -> Option<InfixParselet> {
        self.infix.insert(token_type, parselet)
    }

    pub fn prefix(&self, token_type: PrattTokenType) -> Option<PrefixParselet> {
        self.prefix.get(&token_type).copied()
    }

    pub fn infix(&self, token_type: PrattTokenType) -> Option<InfixParselet> {
        self.infix.get(&token_type).copied()
    }
}
