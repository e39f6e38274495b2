//! User-facing output for the CLI: token listings and expression trees.

use std::io;

use termcolor::{Color, ColorSpec, WriteColor};

use crate::ast::{Expr, LiteralValue};
use crate::lexer::{Token, TokenKind};

/// Writes one line per token: position, kind and text.
pub fn print_tokens<W: WriteColor>(out: &mut W, tokens: &[Token]) -> io::Result<()> {
    if tokens.is_empty() {
        writeln!(out, "(no tokens)")?;
        return Ok(());
    }
    for token in tokens {
        write!(out, "{:>4}:{:<4} ", token.line, token.column)?;
        out.set_color(ColorSpec::new().set_fg(Some(kind_color(token.kind))).set_bold(true))?;
        write!(out, "{:<11}", token.kind.as_str())?;
        out.reset()?;
        writeln!(out, "{}", token.text)?;
    }
    Ok(())
}

/// Writes `expr` as an indented tree, one node per line.
pub fn print_tree<W: WriteColor>(out: &mut W, expr: &Expr) -> io::Result<()> {
    write_node(out, expr, 0)
}

fn write_node<W: WriteColor>(out: &mut W, expr: &Expr, depth: usize) -> io::Result<()> {
    write!(out, "{:indent$}", "", indent = depth * 2)?;
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
    write!(out, "{}", expr.type_name())?;
    out.reset()?;

    match expr {
        Expr::Identifier { name, .. } => writeln!(out, " {}", name),
        Expr::Literal { value, raw, .. } => writeln!(out, " {} ({})", raw, literal_kind(value)),
        Expr::EmptyElement => writeln!(out),
        Expr::UnaryExpression { operator, argument } => {
            writeln!(out, " {}", operator)?;
            write_node(out, argument, depth + 1)
        }
        Expr::BinaryExpression {
            operator,
            left,
            right,
        } => {
            writeln!(out, " {}", operator)?;
            write_node(out, left, depth + 1)?;
            write_node(out, right, depth + 1)
        }
        Expr::ConditionalExpression {
            test,
            consequent,
            alternate,
        } => {
            writeln!(out)?;
            for child in [test, consequent, alternate] {
                write_node(out, child, depth + 1)?;
            }
            Ok(())
        }
        Expr::CompoundExpression { leaves } => {
            writeln!(out, " [{}]", leaves.len())?;
            for leaf in leaves {
                write_node(out, leaf, depth + 1)?;
            }
            Ok(())
        }
        Expr::Assignment { target, value } => {
            writeln!(out)?;
            write_node(out, target, depth + 1)?;
            write_node(out, value, depth + 1)
        }
    }
}

fn literal_kind(value: &LiteralValue) -> &'static str {
    match value {
        LiteralValue::String(_) => "string",
        LiteralValue::Number(_) => "number",
        LiteralValue::Boolean(_) => "boolean",
        LiteralValue::Null => "null",
        LiteralValue::Regex { .. } => "regex",
    }
}

fn kind_color(kind: TokenKind) -> Color {
    match kind {
        TokenKind::Name | TokenKind::Identifier => Color::White,
        TokenKind::Number => Color::Magenta,
        TokenKind::String | TokenKind::Regex => Color::Green,
        TokenKind::Boolean | TokenKind::Null => Color::Blue,
        TokenKind::Punctuator | TokenKind::Verbatim => Color::Yellow,
        TokenKind::Ignore => Color::Black,
    }
}
