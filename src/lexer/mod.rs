//! Token data model and the two tokenizers.
//!
//! - [`scanner`] is the fixed line scanner: names, numbers, strings and
//!   punctuators, with runs of spaces and `//` comments dropped.
//! - [`classifier`] is the pattern-driven tokenizer the combinator grammar
//!   fills in through its `token(pattern, kind)` calls.

use serde::{Deserialize, Serialize};

use crate::ast::Span;

pub mod classifier;
pub mod scanner;

pub use classifier::TokenClassifier;
pub use scanner::tokenize;

/// Closed set of token kinds produced by both tokenizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Name,
    Number,
    String,
    Punctuator,
    Identifier,
    Verbatim,
    Regex,
    Boolean,
    Null,
    /// Matched and dropped (whitespace, comments).
    Ignore,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Name => "name",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Punctuator => "punctuator",
            TokenKind::Identifier => "identifier",
            TokenKind::Verbatim => "verbatim",
            TokenKind::Regex => "regex",
            TokenKind::Boolean => "boolean",
            TokenKind::Null => "null",
            TokenKind::Ignore => "ignore",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded value of a token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenValue {
    Number(f64),
    Text(String),
}

/// A lexed token. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// The full matched text.
    pub text: String,
    pub value: TokenValue,
    /// Capture groups of the matching pattern, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub captures: Vec<Option<String>>,
    pub span: Span,
    /// 1-based line of the first character.
    pub line: usize,
    /// 1-based column (in characters) of the first character.
    pub column: usize,
}

impl Token {
    /// A text token with no captures, mostly useful for building token
    /// streams by hand.
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span, line: usize, column: usize) -> Self {
        let text = text.into();
        Self {
            kind,
            value: TokenValue::Text(text.clone()),
            text,
            captures: Vec::new(),
            span,
            line,
            column,
        }
    }

    /// The textual value: the decoded text, or the raw text for numbers.
    pub fn text_value(&self) -> &str {
        match &self.value {
            TokenValue::Text(text) => text,
            TokenValue::Number(_) => &self.text,
        }
    }

    pub fn number(&self) -> Option<f64> {
        match self.value {
            TokenValue::Number(n) => Some(n),
            TokenValue::Text(_) => None,
        }
    }

    /// The `index`-th capture group (0 is the first group, not the whole match).
    pub fn capture(&self, index: usize) -> Option<&str> {
        self.captures.get(index).and_then(|c| c.as_deref())
    }

    /// Returns a human-readable description of the token
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Verbatim | TokenKind::Punctuator => format!("`{}`", self.text),
            kind => format!("{} `{}`", kind, self.text),
        }
    }
}

/// Input accepted by [`tokenize`]: one string, or text already split into lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source<'a> {
    Text(&'a str),
    Lines(Vec<&'a str>),
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(text: &'a str) -> Self {
        Source::Text(text)
    }
}

impl<'a> From<&'a String> for Source<'a> {
    fn from(text: &'a String) -> Self {
        Source::Text(text.as_str())
    }
}

impl<'a> From<Vec<&'a str>> for Source<'a> {
    fn from(lines: Vec<&'a str>) -> Self {
        Source::Lines(lines)
    }
}

impl<'a> From<&[&'a str]> for Source<'a> {
    fn from(lines: &[&'a str]) -> Self {
        Source::Lines(lines.to_vec())
    }
}

/// Maps byte offsets of a text to 1-based line and column numbers.
#[derive(Debug, Clone)]
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut starts = vec![0];
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => starts.push(i + 1),
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    starts.push(i + 2);
                    i += 1;
                }
                b'\r' => starts.push(i + 1),
                _ => {}
            }
            i += 1;
        }
        Self { starts }
    }

    pub(crate) fn line_col(&self, text: &str, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let start = self.starts[line];
        let column = text
            .get(start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - start);
        (line + 1, column + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_index_handles_mixed_line_breaks() {
        let text = "a\nb\r\nc\rd";
        let index = LineIndex::new(text);
        assert_eq!(index.line_col(text, 0), (1, 1));
        assert_eq!(index.line_col(text, 2), (2, 1));
        assert_eq!(index.line_col(text, 5), (3, 1));
        assert_eq!(index.line_col(text, 7), (4, 1));
    }

    #[test]
    fn describe_quotes_operators() {
        let token = Token::new(TokenKind::Verbatim, "AND", Span::new(2, 5), 1, 3);
        assert_eq!(token.describe(), "`AND`");
        let token = Token::new(TokenKind::Identifier, "x", Span::new(0, 1), 1, 1);
        assert_eq!(token.describe(), "identifier `x`");
    }
}
