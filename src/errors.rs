//! exprkit Error Handling
//!
//! Every user-visible failure of the toolkit is an [`ExprError`]. Errors are
//! `thiserror` enums that also implement `miette::Diagnostic`, so the CLI can
//! render them with a labelled source snippet once a source is attached with
//! [`ExprError::with_source`].
//!
//! Rule failures inside the combinator engine are not errors: they are plain
//! `None` values consumed by `any`/`optional`. Only the outermost failure of a
//! parse is turned into an `ExprError`.

use std::path::PathBuf;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::ast::Span;

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

pub type SourceArc = Arc<NamedSource<String>>;

/// Type-safe error classification, one per diagnostic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    Lexical,
    NumericRange,
    Syntax,
    Pattern,
    Config,
    Io,
    Pratt,
}

impl ErrorType {
    /// The miette diagnostic code of this error type.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorType::Lexical => "exprkit::lex",
            ErrorType::NumericRange => "exprkit::lex::number",
            ErrorType::Syntax => "exprkit::syntax",
            ErrorType::Pattern => "exprkit::grammar",
            ErrorType::Config => "exprkit::config",
            ErrorType::Io => "exprkit::io",
            ErrorType::Pratt => "exprkit::pratt",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Source, span and help text attached to a diagnostic.
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    pub source: Option<SourceArc>,
    pub span: Option<Span>,
    pub help: Option<String>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_span(span: Span) -> Self {
        Self {
            span: Some(span),
            ..Self::default()
        }
    }

    pub fn with_span_and_help(span: Span, help: impl Into<String>) -> Self {
        Self {
            span: Some(span),
            help: Some(help.into()),
            ..Self::default()
        }
    }
}

// ============================================================================
// ERROR TYPE
// ============================================================================

/// Unified error type for lexing, parsing and configuration failures.
#[derive(Debug, Error)]
pub enum ExprError {
    #[error("Lexical error at line {line}, column {column}: no token matches `{snippet}`")]
    Lexical {
        line: usize,
        column: usize,
        snippet: String,
        ctx: ErrorContext,
    },
    #[error("Type error at line {line}, column {column}: numeric literal `{text}` is not a finite number")]
    NonFiniteNumber {
        text: String,
        line: usize,
        column: usize,
        ctx: ErrorContext,
    },
    #[error("Syntax error at line {line}, column {column}: expected {expected}, found {found}")]
    Syntax {
        expected: String,
        found: String,
        line: usize,
        column: usize,
        token_index: usize,
        ctx: ErrorContext,
    },
    #[error("Syntax error at line {line}, column {column}: unexpected trailing {found}")]
    TrailingTokens {
        found: String,
        line: usize,
        column: usize,
        token_index: usize,
        ctx: ErrorContext,
    },
    #[error("Invalid token pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Could not read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Pratt parse error at line {line}, column {column}: {message}")]
    Pratt {
        message: String,
        line: usize,
        column: usize,
        ctx: ErrorContext,
    },
}

impl ExprError {
    /// Returns the type-safe classification of this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            ExprError::Lexical { .. } => ErrorType::Lexical,
            ExprError::NonFiniteNumber { .. } => ErrorType::NumericRange,
            ExprError::Syntax { .. } | ExprError::TrailingTokens { .. } => ErrorType::Syntax,
            ExprError::Pattern { .. } => ErrorType::Pattern,
            ExprError::Config { .. } => ErrorType::Config,
            ExprError::Io { .. } => ErrorType::Io,
            ExprError::Pratt { .. } => ErrorType::Pratt,
        }
    }

    /// Line and column (1-based) the error points at, when it has one.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            ExprError::Lexical { line, column, .. }
            | ExprError::NonFiniteNumber { line, column, .. }
            | ExprError::Syntax { line, column, .. }
            | ExprError::TrailingTokens { line, column, .. }
            | ExprError::Pratt { line, column, .. } => Some((*line, *column)),
            ExprError::Pattern { .. } | ExprError::Config { .. } | ExprError::Io { .. } => None,
        }
    }

    /// Byte span in the parsed text, when the error has one.
    pub fn span(&self) -> Option<Span> {
        self.ctx().and_then(|ctx| ctx.span)
    }

    /// Attaches the parsed text so the diagnostic can render a snippet.
    pub fn with_source(mut self, name: impl AsRef<str>, text: impl Into<String>) -> Self {
        if let Some(ctx) = self.ctx_mut() {
            ctx.source = Some(Arc::new(NamedSource::new(name, text.into())));
        }
        self
    }

    pub fn config(message: impl Into<String>) -> Self {
        ExprError::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ExprError::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    fn ctx(&self) -> Option<&ErrorContext> {
        match self {
            ExprError::Lexical { ctx, .. }
            | ExprError::NonFiniteNumber { ctx, .. }
            | ExprError::Syntax { ctx, .. }
            | ExprError::TrailingTokens { ctx, .. }
            | ExprError::Pratt { ctx, .. } => Some(ctx),
            ExprError::Pattern { .. } | ExprError::Config { .. } | ExprError::Io { .. } => None,
        }
    }

    fn ctx_mut(&mut self) -> Option<&mut ErrorContext> {
        match self {
            ExprError::Lexical { ctx, .. }
            | ExprError::NonFiniteNumber { ctx, .. }
            | ExprError::Syntax { ctx, .. }
            | ExprError::TrailingTokens { ctx, .. }
            | ExprError::Pratt { ctx, .. } => Some(ctx),
            ExprError::Pattern { .. } | ExprError::Config { .. } | ExprError::Io { .. } => None,
        }
    }

    fn label(&self) -> String {
        match self {
            ExprError::Lexical { .. } => "no token pattern matches here".into(),
            ExprError::NonFiniteNumber { .. } => "not a finite number".into(),
            ExprError::Syntax { expected, .. } => format!("expected {}", expected),
            ExprError::TrailingTokens { .. } => "unexpected token after a complete expression".into(),
            ExprError::Pratt { message, .. } => message.clone(),
            ExprError::Pattern { .. } | ExprError::Config { .. } | ExprError::Io { .. } => {
                String::new()
            }
        }
    }
}

impl Diagnostic for ExprError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(self.error_type().code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.ctx()
            .and_then(|ctx| ctx.help.as_ref())
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.ctx()
            .and_then(|ctx| ctx.source.as_ref())
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span()?;
        let label = LabeledSpan::new(Some(self.label()), span.start, span.len());
        Some(Box::new(std::iter::once(label)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax_error() -> ExprError {
        ExprError::Syntax {
            expected: "`)`".into(),
            found: "end of input".into(),
            line: 1,
            column: 5,
            token_index: 3,
            ctx: ErrorContext::with_span(Span::new(4, 4)),
        }
    }

    #[test]
    fn display_names_expected_and_found() {
        let message = syntax_error().to_string();
        assert_eq!(
            message,
            "Syntax error at line 1, column 5: expected `)`, found end of input"
        );
    }

    #[test]
    fn diagnostic_carries_code_and_label() {
        let err = syntax_error().with_source("input", "(a +");
        assert_eq!(err.code().map(|c| c.to_string()), Some("exprkit::syntax".into()));
        assert!(err.source_code().is_some());
        let labels: Vec<_> = err.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 4);
        assert_eq!(labels[0].len(), 0);
    }

    #[test]
    fn config_errors_have_no_position() {
        let err = ExprError::config("empty precedence level");
        assert_eq!(err.error_type(), ErrorType::Config);
        assert_eq!(err.position(), None);
        assert!(err.labels().is_none());
    }
}
