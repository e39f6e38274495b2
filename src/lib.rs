pub use crate::config::{GrammarOptions, Strategy};
pub use crate::errors::{ErrorContext, ErrorType, ExprError};
pub use crate::grammar::{parse, Grammar};

pub mod ast;
pub mod cli;
pub mod combinators;
pub mod config;
pub mod errors;
pub mod grammar;
pub mod lexer;
pub mod pratt;
