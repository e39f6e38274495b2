//! Normalized expression printer.
//!
//! Every operator application is printed fully parenthesized, so the printed
//! text parses back to the same tree regardless of the precedence table in use.

use std::fmt::{self, Display, Formatter};

use super::Expr;

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier { name, .. } => f.write_str(name),
            Expr::Literal { raw, .. } => f.write_str(raw),
            Expr::UnaryExpression { operator, argument } => {
                // `- -x` must not print as `--x`, which lexes as a single token
                write!(f, "({} {})", operator, argument)
            }
            Expr::BinaryExpression {
                operator,
                left,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expr::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => write!(f, "({} ? {} : {})", test, consequent, alternate),
            Expr::CompoundExpression { leaves } => {
                f.write_str("(")?;
                for (i, leaf) in leaves.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                        if !matches!(leaf, Expr::EmptyElement) {
                            f.write_str(" ")?;
                        }
                    }
                    write!(f, "{}", leaf)?;
                }
                f.write_str(")")
            }
            Expr::Assignment { target, value } => write!(f, "({} = {})", target, value),
            Expr::EmptyElement => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{BinaryOperator, Expr, LiteralValue, Span, UnaryOperator};

    fn ident(name: &str) -> Expr {
        Expr::identifier(name, Span::default())
    }

    #[test]
    fn prints_nested_binary_fully_parenthesized() {
        let expr = Expr::binary(
            BinaryOperator::Subtract,
            Expr::binary(BinaryOperator::Subtract, ident("a"), ident("b")),
            ident("c"),
        );
        assert_eq!(expr.to_string(), "((a - b) - c)");
    }

    #[test]
    fn prints_unary_chain_with_spaces() {
        let expr = Expr::unary(UnaryOperator::Not, Expr::unary(UnaryOperator::Not, ident("x")));
        assert_eq!(expr.to_string(), "(NOT (NOT x))");
    }

    #[test]
    fn prints_compound_with_holes() {
        let expr = Expr::CompoundExpression {
            leaves: vec![ident("a"), Expr::EmptyElement, ident("b")],
        };
        assert_eq!(expr.to_string(), "(a,, b)");
    }

    #[test]
    fn prints_literal_raw_text() {
        let expr = Expr::literal(LiteralValue::Number(255.0), "0xff", Span::new(0, 4));
        assert_eq!(expr.to_string(), "0xff");
    }
}
