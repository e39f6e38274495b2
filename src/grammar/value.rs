use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::combinators::Capture;
use crate::lexer::Token;

/// What the expression grammar's rules capture.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A raw token, captured by a token rule.
    Token(Token),
    Expr(Expr),
    Unary(UnaryOperator),
    Binary(BinaryOperator),
    /// An operator and the operand to its right, waiting for the left fold.
    Operand(BinaryOperator, Expr),
}

impl Value {
    pub fn into_expr(self) -> Option<Expr> {
        match self {
            Value::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn into_token(self) -> Option<Token> {
        match self {
            Value::Token(token) => Some(token),
            _ => None,
        }
    }
}

impl Capture for Value {
    fn from_token(token: &Token) -> Self {
        Value::Token(token.clone())
    }
}
