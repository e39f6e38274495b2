//! AST module for exprkit expressions
//!
//! This module provides the typed expression tree produced by the grammar,
//! together with the operator vocabularies the precedence table is written in.
//! Nodes are immutable values built bottom-up; a parent owns its children.

// ============================================================================
// IMPORTS
// ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod printer;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Represents a byte span in the source text.
///
/// # Examples
///
/// ```rust
/// use exprkit::ast::Span;
/// let span = Span::new(0, 5);
/// assert_eq!(span.len(), 5);
/// assert_eq!(span.merge(Span::new(8, 9)), Span::new(0, 9));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The value carried by a `Literal` node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiteralValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Regex { pattern: String, flags: String },
}

/// The expression tree.
///
/// Serialized with a `type` tag, in the shape of an ESTree node.
///
/// # Examples
///
/// ```rust
/// use exprkit::ast::{Expr, Span};
/// let expr = Expr::identifier("x", Span::new(0, 1));
/// assert_eq!(expr.to_string(), "x");
/// assert_eq!(expr.span(), Some(Span::new(0, 1)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Expr {
    Identifier {
        name: String,
        span: Span,
    },
    Literal {
        value: LiteralValue,
        raw: String,
        span: Span,
    },
    UnaryExpression {
        operator: UnaryOperator,
        argument: Box<Expr>,
    },
    BinaryExpression {
        operator: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    ConditionalExpression {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    CompoundExpression {
        leaves: Vec<Expr>,
    },
    Assignment {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// A hole left by consecutive commas in a compound expression.
    EmptyElement,
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Expr {
    pub fn identifier(name: impl Into<String>, span: Span) -> Self {
        Expr::Identifier {
            name: name.into(),
            span,
        }
    }

    pub fn literal(value: LiteralValue, raw: impl Into<String>, span: Span) -> Self {
        Expr::Literal {
            value,
            raw: raw.into(),
            span,
        }
    }

    pub fn unary(operator: UnaryOperator, argument: Expr) -> Self {
        Expr::UnaryExpression {
            operator,
            argument: Box::new(argument),
        }
    }

    pub fn binary(operator: BinaryOperator, left: Expr, right: Expr) -> Self {
        Expr::BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn conditional(test: Expr, consequent: Expr, alternate: Expr) -> Self {
        Expr::ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }
    }

    pub fn assignment(target: Expr, value: Expr) -> Self {
        Expr::Assignment {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    /// Returns the `type` tag this node serializes with.
    pub fn type_name(&self) -> &'static str {
        match self {
            Expr::Identifier { .. } => "Identifier",
            Expr::Literal { .. } => "Literal",
            Expr::UnaryExpression { .. } => "UnaryExpression",
            Expr::BinaryExpression { .. } => "BinaryExpression",
            Expr::ConditionalExpression { .. } => "ConditionalExpression",
            Expr::CompoundExpression { .. } => "CompoundExpression",
            Expr::Assignment { .. } => "Assignment",
            Expr::EmptyElement => "EmptyElement",
        }
    }

    /// Source span covered by this node, derived from its anchored leaves.
    ///
    /// Returns `None` for nodes without any anchored leaf (`EmptyElement`).
    pub fn span(&self) -> Option<Span> {
        match self {
            Expr::Identifier { span, .. } | Expr::Literal { span, .. } => Some(*span),
            Expr::UnaryExpression { argument, .. } => argument.span(),
            Expr::BinaryExpression { left, right, .. } => merge_spans([left.span(), right.span()]),
            Expr::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => merge_spans([test.span(), consequent.span(), alternate.span()]),
            Expr::CompoundExpression { leaves } => merge_spans(leaves.iter().map(Expr::span)),
            Expr::Assignment { target, value } => merge_spans([target.span(), value.span()]),
            Expr::EmptyElement => None,
        }
    }
}

fn merge_spans(spans: impl IntoIterator<Item = Option<Span>>) -> Option<Span> {
    spans
        .into_iter()
        .flatten()
        .reduce(|acc, span| acc.merge(span))
}

// ============================================================================
// OPERATORS
// ============================================================================

/// Error returned when a string names no known operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operator `{}`", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

macro_rules! operator_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $symbol:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $symbol)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The surface text of the operator, as produced by the lexer.
            pub fn symbol(self) -> &'static str {
                match self {
                    $($name::$variant => $symbol,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownOperator;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($symbol => Ok($name::$variant),)+
                    other => Err(UnknownOperator(other.to_string())),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.symbol())
            }
        }
    };
}

operator_enum! {
    /// Binary operators a precedence table may list.
    BinaryOperator {
        Multiply => "*",
        Divide => "/",
        Remainder => "%",
        Add => "+",
        Subtract => "-",
        ShiftLeft => "<<",
        ShiftRight => ">>",
        UnsignedShiftRight => ">>>",
        Less => "<",
        Greater => ">",
        LessEqual => "<=",
        GreaterEqual => ">=",
        InstanceOf => "instanceof",
        In => "in",
        Equal => "==",
        NotEqual => "!=",
        StrictEqual => "===",
        StrictNotEqual => "!==",
        BitAnd => "&",
        BitXor => "^",
        BitOr => "|",
        LogicalAnd => "&&",
        LogicalOr => "||",
        And => "AND",
        Any => "ANY",
    }
}

operator_enum! {
    /// Prefix operators accepted in front of a primary expression.
    UnaryOperator {
        Not => "NOT",
        LogicalNot => "!",
        BitNot => "~",
        Minus => "-",
        Plus => "+",
        TypeOf => "typeof",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_round_trip_through_symbols() {
        for op in BinaryOperator::ALL {
            assert_eq!(op.symbol().parse::<BinaryOperator>(), Ok(*op));
        }
        for op in UnaryOperator::ALL {
            assert_eq!(op.symbol().parse::<UnaryOperator>(), Ok(*op));
        }
        assert!("**".parse::<BinaryOperator>().is_err());
    }

    #[test]
    fn binary_span_covers_both_operands() {
        let expr = Expr::binary(
            BinaryOperator::And,
            Expr::identifier("x", Span::new(0, 1)),
            Expr::identifier("y", Span::new(6, 7)),
        );
        assert_eq!(expr.span(), Some(Span::new(0, 7)));
        assert_eq!(Expr::EmptyElement.span(), None);
    }

    #[test]
    fn serializes_with_type_tag() {
        let expr = Expr::binary(
            BinaryOperator::And,
            Expr::identifier("x", Span::new(0, 1)),
            Expr::identifier("y", Span::new(6, 7)),
        );
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(json["type"], "BinaryExpression");
        assert_eq!(json["operator"], "AND");
        assert_eq!(json["left"]["type"], "Identifier");
        assert_eq!(json["right"]["name"], "y");
    }
}
