//! Pattern-driven token classifier.
//!
//! Patterns are registered together with the [`TokenKind`] they produce. At
//! each position the patterns are tried in registration order with an anchored
//! search; the first non-empty match wins. Several patterns may share a kind,
//! and keyword patterns must be registered before the generic identifier
//! pattern, or the identifier pattern shadows them.

use regex_automata::meta::Regex;
use regex_automata::util::captures::Captures;
use regex_automata::{Anchored, Input};

use super::{LineIndex, Token, TokenKind, TokenValue};
use crate::ast::Span;
use crate::errors::{ErrorContext, ExprError};

#[derive(Debug, Clone)]
struct TokenPattern {
    kind: TokenKind,
    source: String,
    regex: Regex,
}

/// Ordered registry of token patterns.
#[derive(Debug, Clone, Default)]
pub struct TokenClassifier {
    patterns: Vec<TokenPattern>,
}

impl TokenClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `pattern` under `kind`. Registering the same pattern for the
    /// same kind twice is a no-op.
    pub fn register(&mut self, pattern: &str, kind: TokenKind) -> Result<(), ExprError> {
        if self
            .patterns
            .iter()
            .any(|p| p.kind == kind && p.source == pattern)
        {
            return Ok(());
        }
        let regex = Regex::new(pattern).map_err(|e| ExprError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(%kind, pattern, "registered token pattern");
        self.patterns.push(TokenPattern {
            kind,
            source: pattern.to_string(),
            regex,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Registered `(kind, pattern)` pairs in trial order.
    pub fn patterns(&self) -> impl Iterator<Item = (TokenKind, &str)> {
        self.patterns.iter().map(|p| (p.kind, p.source.as_str()))
    }

    /// Splits `text` into tokens, dropping `Ignore` matches.
    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>, ExprError> {
        let index = LineIndex::new(text);
        let mut tokens = Vec::new();
        let mut pos = 0;

        'scan: while pos < text.len() {
            for pattern in &self.patterns {
                let input = Input::new(text).range(pos..).anchored(Anchored::Yes);
                let mut caps = pattern.regex.create_captures();
                pattern.regex.search_captures(&input, &mut caps);
                let end = match caps.get_match() {
                    Some(m) if m.end() > pos => m.end(),
                    _ => continue,
                };
                if pattern.kind != TokenKind::Ignore {
                    let (line, column) = index.line_col(text, pos);
                    tokens.push(build_token(text, pattern.kind, &caps, pos..end, line, column)?);
                }
                pos = end;
                continue 'scan;
            }

            let (line, column) = index.line_col(text, pos);
            let width = text[pos..].chars().next().map_or(1, char::len_utf8);
            return Err(ExprError::Lexical {
                line,
                column,
                snippet: text[pos..].chars().take(12).collect(),
                ctx: ErrorContext::with_span(Span::new(pos, pos + width)),
            });
        }

        Ok(tokens)
    }
}

fn build_token(
    text: &str,
    kind: TokenKind,
    caps: &Captures,
    range: std::ops::Range<usize>,
    line: usize,
    column: usize,
) -> Result<Token, ExprError> {
    let matched = &text[range.clone()];
    let span = Span::new(range.start, range.end);
    let captures: Vec<Option<String>> = (1..caps.group_len())
        .map(|i| caps.get_group(i).map(|s| text[s.range()].to_string()))
        .collect();
    let primary = captures
        .iter()
        .flatten()
        .next()
        .cloned()
        .unwrap_or_else(|| matched.to_string());

    let value = if kind == TokenKind::Number {
        match numeric_value(&primary) {
            Some(n) => TokenValue::Number(n),
            None => {
                return Err(ExprError::NonFiniteNumber {
                    text: primary,
                    line,
                    column,
                    ctx: ErrorContext::with_span(span),
                })
            }
        }
    } else {
        TokenValue::Text(primary)
    };

    Ok(Token {
        kind,
        text: matched.to_string(),
        value,
        captures,
        span,
        line,
        column,
    })
}

/// Converts decimal or `0x` hexadecimal literal text to a finite number.
pub(crate) fn numeric_value(raw: &str) -> Option<f64> {
    let value = match raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
    {
        Some(hex) if !hex.is_empty() => hex.chars().try_fold(0f64, |acc, c| {
            c.to_digit(16).map(|d| acc * 16.0 + f64::from(d))
        })?,
        Some(_) => return None,
        None => raw.parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}
