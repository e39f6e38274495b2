//! Fixed line scanner.
//!
//! Splits the source into lines and scans each line with a single sticky
//! token pattern. Produces `Name`, `Number`, `String` and `Punctuator`
//! tokens; runs of spaces and `//` comments are recognised and dropped.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Source, Token, TokenKind, TokenValue};
use crate::ast::Span;
use crate::errors::{ErrorContext, ExprError};

// Capture groups:
// [1] spaces  [2] comment  [3] name  [4] number  [5] string  [6] punctuator
static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(\x20+)",
        r"|(//.*)",
        r"|([a-zA-Z][a-zA-Z_0-9]*)",
        r"|(\d+(?:\.\d+)?(?:[eE][+\-]?\d+)?)",
        r#"|("(?:[^"\\]|\\(?:[nr"\\]|u[0-9a-fA-F]{4}))*")"#,
        r"|([(){}\[\]?.,:;~*/]|&&?|\|\|?|[+\-<>]=?|[!=](?:==)?)",
    ))
    .expect("scanner token pattern is valid")
});

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n|\r\n?").expect("line break pattern is valid"));

/// Tokenizes a string or a list of lines.
///
/// Lines are numbered from 1. For a list of lines, byte offsets are computed
/// as if the lines were joined with `\n`.
///
/// # Examples
///
/// ```rust
/// use exprkit::lexer::{tokenize, TokenKind};
/// let tokens = tokenize("a + 1 // sum").unwrap();
/// let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(kinds, [TokenKind::Name, TokenKind::Punctuator, TokenKind::Number]);
/// ```
pub fn tokenize<'a>(source: impl Into<Source<'a>>) -> Result<Vec<Token>, ExprError> {
    let lines = match source.into() {
        Source::Text(text) => split_lines(text),
        Source::Lines(lines) => {
            let mut offset = 0;
            lines
                .into_iter()
                .map(|line| {
                    let start = offset;
                    offset += line.len() + 1;
                    (start, line)
                })
                .collect()
        }
    };

    let mut result = Vec::new();
    for (line_nr, (line_start, line)) in lines.into_iter().enumerate() {
        scan_line(line, line_nr + 1, line_start, &mut result)?;
    }
    tracing::trace!(count = result.len(), "scanned tokens");
    Ok(result)
}

fn split_lines(text: &str) -> Vec<(usize, &str)> {
    let mut lines = Vec::new();
    let mut start = 0;
    for brk in LINE_BREAK.find_iter(text) {
        lines.push((start, &text[start..brk.start()]));
        start = brk.end();
    }
    lines.push((start, &text[start..]));
    lines
}

fn scan_line(
    line: &str,
    line_nr: usize,
    line_start: usize,
    result: &mut Vec<Token>,
) -> Result<(), ExprError> {
    let mut pos = 0;
    while pos < line.len() {
        let column = line[..pos].chars().count() + 1;
        let captives = match TOKEN_PATTERN.captures_at(line, pos) {
            Some(caps) if caps.get(0).map(|m| m.start()) == Some(pos) => caps,
            _ => {
                let snippet: String = line[pos..].chars().take(12).collect();
                let width = line[pos..].chars().next().map_or(0, char::len_utf8);
                return Err(ExprError::Lexical {
                    line: line_nr,
                    column,
                    snippet,
                    ctx: ErrorContext::with_span(Span::new(
                        line_start + pos,
                        line_start + pos + width,
                    )),
                });
            }
        };
        let whole = captives.get(0).map_or(pos..pos, |m| m.range());
        let span = Span::new(line_start + whole.start, line_start + whole.end);
        let text = &line[whole.clone()];

        let make = |kind: TokenKind, value: TokenValue| Token {
            kind,
            text: text.to_string(),
            value,
            captures: Vec::new(),
            span,
            line: line_nr,
            column,
        };

        if captives.get(1).is_some() || captives.get(2).is_some() {
            // spaces and comments produce nothing
        } else if let Some(name) = captives.get(3) {
            result.push(make(TokenKind::Name, TokenValue::Text(name.as_str().to_string())));
        } else if let Some(number) = captives.get(4) {
            let value = number.as_str().parse::<f64>().ok().filter(|n| n.is_finite());
            match value {
                Some(n) => result.push(make(TokenKind::Number, TokenValue::Number(n))),
                None => {
                    return Err(ExprError::NonFiniteNumber {
                        text: number.as_str().to_string(),
                        line: line_nr,
                        column,
                        ctx: ErrorContext::with_span(span),
                    })
                }
            }
        } else if let Some(string) = captives.get(5) {
            let decoded = serde_json::from_str::<String>(string.as_str()).map_err(|_| {
                ExprError::Lexical {
                    line: line_nr,
                    column,
                    snippet: string.as_str().to_string(),
                    ctx: ErrorContext::with_span_and_help(span, "invalid escape sequence in string"),
                }
            })?;
            result.push(make(TokenKind::String, TokenValue::Text(decoded)));
        } else if let Some(punctuator) = captives.get(6) {
            result.push(make(
                TokenKind::Punctuator,
                TokenValue::Text(punctuator.as_str().to_string()),
            ));
        }
        pos = whole.end;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_carry_their_value() {
        let tokens = tokenize("12.5e1").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].number(), Some(125.0));
    }

    #[test]
    fn lines_are_numbered_from_one() {
        let tokens = tokenize(vec!["a", "  b"]).unwrap();
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
        assert_eq!(tokens[1].span, Span::new(4, 5));
    }

    #[test]
    fn crlf_counts_as_one_break() {
        let tokens = tokenize("a\r\nb").unwrap();
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[1].span, Span::new(3, 4));
    }
}
