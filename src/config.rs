//! Grammar configuration.
//!
//! [`GrammarOptions`] decides which operators the expression grammar accepts
//! and how tightly they bind. Options can be built in code, taken from one of
//! the presets, or loaded from a YAML or JSON file:
//!
//! ```yaml
//! precedence:
//!   - ["+", "-"]
//!   - ["AND"]
//!   - ["ANY"]
//! unary_operators: ["NOT"]
//! regex_literals: true
//! strategy: packrat
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ast::{BinaryOperator, UnaryOperator};
use crate::errors::ExprError;

/// Which combinator strategy a grammar is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Backtracking,
    Packrat,
}

/// Options for building the expression grammar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrammarOptions {
    /// Binary operator levels, tightest binding first.
    pub precedence: Vec<Vec<BinaryOperator>>,
    /// Prefix operators accepted before a primary expression.
    pub unary_operators: Vec<UnaryOperator>,
    /// Whether `/pattern/flags` is lexed as a regex literal.
    pub regex_literals: bool,
    /// Whether `name = expression` is accepted in compound position.
    pub assignments: bool,
    pub strategy: Strategy,
}

impl Default for GrammarOptions {
    fn default() -> Self {
        use BinaryOperator::*;
        Self {
            precedence: vec![vec![Add, Subtract], vec![And], vec![Any]],
            unary_operators: vec![UnaryOperator::Not],
            regex_literals: true,
            assignments: true,
            strategy: Strategy::default(),
        }
    }
}

impl GrammarOptions {
    /// A JavaScript-like operator table topped with the `AND`/`ANY` levels.
    /// Regex literals are off, since `/` is division here.
    pub fn extended() -> Self {
        use BinaryOperator::*;
        Self {
            precedence: vec![
                vec![Multiply, Divide, Remainder],
                vec![Add, Subtract],
                vec![ShiftLeft, ShiftRight, UnsignedShiftRight],
                vec![Less, Greater, LessEqual, GreaterEqual, InstanceOf, In],
                vec![Equal, NotEqual, StrictEqual, StrictNotEqual],
                vec![BitAnd],
                vec![BitXor],
                vec![BitOr],
                vec![LogicalAnd],
                vec![LogicalOr],
                vec![And],
                vec![Any],
            ],
            unary_operators: vec![
                UnaryOperator::Not,
                UnaryOperator::LogicalNot,
                UnaryOperator::BitNot,
                UnaryOperator::Minus,
                UnaryOperator::Plus,
                UnaryOperator::TypeOf,
            ],
            regex_literals: false,
            assignments: true,
            strategy: Strategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Loads options from a `.yaml`/`.yml` or `.json` file. Other extensions
    /// are read as YAML, which also accepts JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ExprError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ExprError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let options = if is_json {
            Self::from_json(&content)?
        } else {
            Self::from_yaml(&content)?
        };
        tracing::debug!(path = %path.display(), levels = options.precedence.len(), "loaded grammar options");
        Ok(options)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ExprError> {
        let options: Self = serde_yaml::from_str(text)
            .map_err(|e| ExprError::config_with_source("invalid YAML grammar options", e))?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json(text: &str) -> Result<Self, ExprError> {
        let options: Self = serde_json::from_str(text)
            .map_err(|e| ExprError::config_with_source("invalid JSON grammar options", e))?;
        options.validate()?;
        Ok(options)
    }

    /// Checks the precedence table: at least one level, no empty level and
    /// no operator on two levels. `/` as an operator needs `regex_literals`
    /// off, or `/ b /` would lex as a regex.
    pub fn validate(&self) -> Result<(), ExprError> {
        if self.precedence.is_empty() {
            return Err(ExprError::config("precedence table has no levels"));
        }
        let mut seen = HashSet::new();
        for (i, level) in self.precedence.iter().enumerate() {
            if level.is_empty() {
                return Err(ExprError::config(format!("precedence level {} is empty", i + 1)));
            }
            for op in level {
                if *op == BinaryOperator::Divide && self.regex_literals {
                    return Err(ExprError::config(
                        "operator `/` needs `regex_literals: false`",
                    ));
                }
                if !seen.insert(*op) {
                    return Err(ExprError::config(format!(
                        "operator `{}` appears on more than one precedence level",
                        op
                    )));
                }
            }
        }
        Ok(())
    }
}
