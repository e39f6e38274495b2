//! The exprkit command-line interface.
//!
//! Reads the expression, dispatches to the lexer, the combinator grammar or
//! the Pratt parser, and prints the result. Errors are returned with the input
//! attached as their source so `main` can render them as miette reports.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{GrammarOptions, Strategy};
use crate::errors::ExprError;
use crate::grammar::Grammar;
use crate::lexer::{self, Token};
use crate::pratt::PrattParser;

pub mod args;
pub mod output;

use args::{Command, ExprkitArgs, Format, GrammarArgs, InputArgs, Scanner};

/// Initialize logging on stderr. `RUST_LOG` overrides the default filter,
/// which is `warn`, or `debug` for this crate when `verbose` is set.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "warn,exprkit=debug" } else { "warn" })
    });

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// The main entry point for the CLI.
pub fn run() -> Result<(), ExprError> {
    let args = ExprkitArgs::parse();
    init_logging(args.verbose);
    execute(args.command)
}

pub fn execute(command: Command) -> Result<(), ExprError> {
    let choice = if io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);

    match command {
        Command::Tokens {
            input,
            scanner,
            grammar,
        } => {
            let (name, text) = read_input(&input)?;
            let tokens = scan(&text, scanner, &grammar).map_err(|e| e.with_source(&name, text.clone()))?;
            output::print_tokens(&mut stdout, &tokens).map_err(stdout_error)
        }

        Command::Parse {
            input,
            grammar,
            strategy,
            format,
        } => {
            let (name, text) = read_input(&input)?;
            let mut options = grammar_options(&grammar)?;
            if let Some(strategy) = strategy {
                options = options.with_strategy(strategy);
            }
            let grammar = Grammar::new(options)?;
            let expr = grammar
                .parse(&text)
                .map_err(|e| e.with_source(&name, text.clone()))?;

            match format {
                Format::Json => {
                    let json = serde_json::to_string_pretty(&expr)
                        .map_err(|e| stdout_error(io::Error::other(e)))?;
                    writeln!(stdout, "{}", json).map_err(stdout_error)
                }
                Format::Pretty => writeln!(stdout, "{}", expr).map_err(stdout_error),
                Format::Tree => output::print_tree(&mut stdout, &expr).map_err(stdout_error),
            }
        }

        Command::Pratt { input, json } => {
            let (name, text) = read_input(&input)?;
            let expr = PrattParser::default()
                .parse(&text)
                .map_err(|e| e.with_source(&name, text.clone()))?;
            if json {
                let json = serde_json::to_string_pretty(&expr)
                    .map_err(|e| stdout_error(io::Error::other(e)))?;
                writeln!(stdout, "{}", json).map_err(stdout_error)
            } else {
                writeln!(stdout, "{}", expr).map_err(stdout_error)
            }
        }
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Returns the source name used in diagnostics and the expression text.
fn read_input(input: &InputArgs) -> Result<(String, String), ExprError> {
    match (&input.expr, &input.file) {
        (_, Some(path)) => Ok((path.display().to_string(), read_file(path)?)),
        (Some(expr), None) => Ok(("<expr>".to_string(), expr.clone())),
        (None, None) => Err(ExprError::config("no expression given")),
    }
}

fn read_file(path: &Path) -> Result<String, ExprError> {
    fs::read_to_string(path).map_err(|source| ExprError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn grammar_options(args: &GrammarArgs) -> Result<GrammarOptions, ExprError> {
    match (&args.config, args.extended) {
        (Some(path), _) => GrammarOptions::from_path(path),
        (None, true) => Ok(GrammarOptions::extended()),
        (None, false) => Ok(GrammarOptions::default()),
    }
}

fn scan(text: &str, scanner: Scanner, grammar: &GrammarArgs) -> Result<Vec<Token>, ExprError> {
    match scanner {
        Scanner::Lines => lexer::tokenize(text),
        Scanner::Classifier => {
            let options = grammar_options(grammar)?.with_strategy(Strategy::Backtracking);
            Grammar::new(options)?.tokenize(text)
        }
    }
}

fn stdout_error(source: io::Error) -> ExprError {
    ExprError::Io {
        path: PathBuf::from("<stdout>"),
        source,
    }
}
