//! Command-line argument parsing
//!
//! Supports:
//! - Lexing a file (or stdin with `-`) and printing its spans
//! - Composed runs (block spans with inline overlays painted on top)
//! - JSON output
//! - Printing the resolved style table

use clap::Parser;
use std::path::PathBuf;

/// Incremental reStructuredText lexer
#[derive(Parser, Debug)]
#[command(
    name = "rstlex",
    version,
    about = "Tokenize reStructuredText the way an editor highlighter does"
)]
pub struct CliArgs {
    /// File to lex, or `-` for stdin
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Print JSON instead of text lines
    #[arg(long)]
    pub json: bool,

    /// Print composed runs instead of block spans
    #[arg(long)]
    pub runs: bool,

    /// Print the resolved style table
    #[arg(long)]
    pub styles: bool,

    /// Comma separated directive names (replaces the configured set)
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub directives: Option<Vec<String>>,

    /// YAML property file with style overrides
    #[arg(long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// What to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Block spans from the cache
    Spans,
    /// Non-overlapping runs with overlays applied
    Runs,
}

/// Options derived from CLI arguments
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Input file; None means stdin
    pub input: Option<PathBuf>,
    /// None when only the style table was requested
    pub mode: Option<OutputMode>,
    pub json: bool,
    pub styles: bool,
    pub directives: Option<Vec<String>>,
    pub theme: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// Convert parsed CLI args into run options
    pub fn into_options(self) -> Result<RunOptions, String> {
        let (input, mode) = match self.file {
            Some(path) => {
                let input = (path.as_os_str() != "-").then_some(path);
                let mode = if self.runs {
                    OutputMode::Runs
                } else {
                    OutputMode::Spans
                };
                (input, Some(mode))
            }
            None if self.styles => (None, None),
            None => return Err("No input file given (use `-` for stdin)".to_string()),
        };

        let directives = self.directives.map(|names| {
            names
                .into_iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect()
        });

        Ok(RunOptions {
            input,
            mode,
            json: self.json,
            styles: self.styles,
            directives,
            theme: self.theme,
            config: self.config,
        })
    }
}
