//! Command-line arguments and subcommands for the exprkit CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Strategy;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "exprkit",
    version,
    about = "Tokenize and parse expressions with a combinator grammar or a Pratt parser."
)]
pub struct ExprkitArgs {
    /// Log grammar construction and parse failures (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the tokens of an expression.
    Tokens {
        #[command(flatten)]
        input: InputArgs,
        /// Which tokenizer to run.
        #[arg(long, value_enum, default_value_t = Scanner::Classifier)]
        scanner: Scanner,
        #[command(flatten)]
        grammar: GrammarArgs,
    },
    /// Parse an expression with the combinator grammar and print its tree.
    Parse {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        grammar: GrammarArgs,
        /// Combinator strategy; overrides the one in --config.
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Parse an expression with the Pratt parser.
    Pratt {
        #[command(flatten)]
        input: InputArgs,
        /// Print the tree as JSON instead of the parenthesized form.
        #[arg(long)]
        json: bool,
    },
}

/// An expression given inline or read from a file.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// The expression text.
    pub expr: Option<String>,
    /// Read the expression from this file instead.
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct GrammarArgs {
    /// Grammar options file (.yaml, .yml or .json).
    #[arg(long, conflicts_with = "extended")]
    pub config: Option<PathBuf>,
    /// Use the JavaScript-like operator table.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scanner {
    /// The grammar's pattern classifier.
    Classifier,
    /// The fixed line scanner used by the Pratt parser.
    Lines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// ESTree-style JSON.
    Json,
    /// Fully parenthesized expression.
    Pretty,
    /// Indented node tree.
    Tree,
}
