//! Shared shell of the `pdf2xlsx` and `pdf2docx` binaries.
//!
//! Both tools take the same two positionals and speak the same status
//! protocol (see [`crate::report`]); only the conversion differs. Both
//! positionals are optional to clap so that a short command line ends in
//! `ERROR: Missing arguments` and exit 1 instead of a usage error. Any
//! other parse failure (an unknown flag, a path clap reads as one) is
//! reported the same way; only `--help` and `--version` keep clap's output.

use crate::output::ConversionStats;
use crate::pipeline::input::ConversionRequest;
use crate::report::StatusReporter;
use clap::error::ErrorKind;
use clap::{Command, CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Name and one-line description of a binary.
#[derive(Debug, Clone, Copy)]
pub struct Tool {
    pub name: &'static str,
    pub about: &'static str,
}

#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// PDF file to convert.
    pub input: Option<PathBuf>,

    /// Output file; an existing file is replaced.
    pub output: Option<PathBuf>,

    #[arg(hide = true, num_args = 0.., allow_hyphen_values = true)]
    pub extra: Vec<String>,
}

impl Args {
    fn positionals(self) -> impl Iterator<Item = PathBuf> {
        [self.input, self.output].into_iter().flatten()
    }
}

const AFTER_HELP: &str = "\
ENVIRONMENT:
  RUST_LOG         Diagnostic log filter, printed to stderr (default: warn)
  PDFIUM_LIB_PATH  Path to libpdfium or the directory holding it";

fn command(tool: Tool) -> Command {
    Args::command()
        .name(tool.name)
        .about(tool.about)
        .after_help(AFTER_HELP)
}

fn parse<I, T>(tool: Tool, argv: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command(tool).try_get_matches_from(argv)?;
    Args::from_arg_matches(&matches)
}

/// First line of a clap error without its `error: ` prefix.
fn parse_error_message(err: &clap::Error) -> String {
    let text = err.to_string();
    let first = text.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).trim().to_string()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .try_init();
}

/// Parse the command line, run `convert` and report the outcome on stdout.
pub fn run<F>(tool: Tool, convert: F) -> ExitCode
where
    F: FnOnce(&ConversionRequest) -> anyhow::Result<ConversionStats>,
{
    let mut reporter = StatusReporter::new(io::stdout().lock());
    let args = match parse(tool, std::env::args_os()) {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            drop(reporter);
            e.exit()
        }
        Err(e) => return ExitCode::from(reporter.error(parse_error_message(&e))),
    };
    init_tracing();

    let request = match ConversionRequest::from_args(args.positionals()) {
        Ok(r) => r,
        Err(e) => return ExitCode::from(reporter.error(e)),
    };

    reporter.processing(&request.input_path);
    let outcome = convert(&request).inspect(|stats| {
        info!(
            "{}: {} pages, {} tables, {} text pages -> {}",
            tool.name,
            stats.pages,
            stats.tables,
            stats.text_pages,
            stats.output_path.display()
        );
        debug!(
            "Stats: {}",
            serde_json::to_string(stats).unwrap_or_default()
        );
    });
    reporter.finish(outcome)
}
