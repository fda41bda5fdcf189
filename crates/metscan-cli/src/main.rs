use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use log::{LevelFilter, debug, info, warn};
use metscan_core::SummaryOptions;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "metscan")]
#[command(version)]
#[command(
    about = "Decoder for MET meteor-radar detection files.",
    long_about = None,
    after_help = "Examples:\n  metscan inspect 20190715_123456.met -o summary.json\n  metscan inspect 20190715_123456.met --stdout --pretty\n  metscan check 'spool/*.met' --strict"
)]
struct Cli {
    /// Log decoding progress (debug level; RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode one MET file and write a JSON summary.
    #[command(
        after_help = "Examples:\n  metscan inspect 20190715_123456.met -o summary.json\n  metscan inspect 'spool/*123456.met' --stdout --correlation"
    )]
    Inspect {
        /// Path to a MET file (a glob matching exactly one file is accepted)
        input: PathBuf,

        /// Output summary path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON summary to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Include the correlation amplitude and phase arrays
        #[arg(long)]
        correlation: bool,

        /// Include raw channel samples as [re, im] pairs
        #[arg(long)]
        samples: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
    /// Decode every input and report OK/FAIL per file.
    #[command(after_help = "Examples:\n  metscan check a.met b.met\n  metscan check 'spool/*.met' --strict")]
    Check {
        /// MET files or glob patterns
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Exit with a non-zero code if any file fails to decode
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let quiet = matches!(cli.command, Commands::Inspect { quiet: true, .. });
    init_logging(cli.verbose, quiet);

    let result = match cli.command {
        Commands::Inspect {
            input,
            report,
            stdout,
            pretty,
            compact,
            correlation,
            samples,
            quiet,
        } => cmd_inspect(
            input,
            report,
            stdout,
            pretty,
            compact,
            SummaryOptions {
                correlation_arrays: correlation,
                samples,
            },
            quiet,
        ),
        Commands::Check { inputs, strict } => cmd_check(&inputs, strict),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the decode error behind the context message.
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_inspect(
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    options: SummaryOptions,
    quiet: bool,
) -> Result<(), CliError> {
    let style = JsonStyle::from_flags(pretty, compact)?;
    let resolved_input = resolve_single_input(&input)?;
    validate_input_file(&resolved_input)?;
    let report = if stdout {
        None
    } else {
        Some(report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };
    if let Some(report_path) = report.as_ref() {
        ensure_distinct_output(&resolved_input, report_path)?;
    }

    debug!("decoding {}", resolved_input.display());
    let summary = metscan_core::summarize_file(&resolved_input, options)
        .with_context(|| format!("MET decoding failed: {}", resolved_input.display()))?;
    info!(
        "decoded {} ({} samples per channel)",
        resolved_input.display(),
        summary.record_length
    );
    let json = to_json(&summary, style)?;

    let Some(report) = report else {
        print!("{}", json);
        return Ok(());
    };

    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(&report, json)
        .with_context(|| format!("Failed to write summary: {}", report.display()))?;

    if !quiet {
        eprintln!("OK: summary written -> {}", report.display());
    }
    Ok(())
}

fn cmd_check(inputs: &[PathBuf], strict: bool) -> Result<(), CliError> {
    let mut files = Vec::new();
    for input in inputs {
        files.extend(expand_input(input)?);
    }

    let mut failed = 0usize;
    for path in &files {
        match metscan_core::parse_file(path) {
            Ok(record) => {
                info!("decoded {}", path.display());
                println!("OK {} ({} pts)", path.display(), record.record_length());
            }
            Err(err) => {
                warn!("decoding {} failed: {}", path.display(), err);
                println!("FAIL {}: {}", path.display(), err);
                failed += 1;
            }
        }
    }
    debug!("checked {} files, {} failed", files.len(), failed);

    if strict && failed > 0 {
        return Err(CliError::new(
            format!("{failed} of {} files failed to decode", files.len()),
            Some("rerun `metscan inspect` on a failing file for details".to_string()),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsonStyle {
    Pretty,
    Compact,
}

impl JsonStyle {
    fn from_flags(pretty: bool, compact: bool) -> Result<Self, CliError> {
        match (pretty, compact) {
            (true, true) => Err(CliError::new(
                "cannot use --pretty and --compact together",
                Some("choose one output format".to_string()),
            )),
            (true, false) => Ok(JsonStyle::Pretty),
            (false, _) => Ok(JsonStyle::Compact),
        }
    }
}

fn to_json<T: Serialize>(value: &T, style: JsonStyle) -> Result<String, CliError> {
    let json = match style {
        JsonStyle::Pretty => serde_json::to_string_pretty(value),
        JsonStyle::Compact => serde_json::to_string(value),
    };
    json.context("JSON serialization failed").map_err(Into::into)
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass the path of a .met file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass the path of a .met file, or use `metscan check` on a glob".to_string()),
        ));
    }
    Ok(())
}

/// Refuse to overwrite the input with its own summary.
fn ensure_distinct_output(input: &Path, report_path: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let report_dir = match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::canonicalize(parent),
        _ => fs::canonicalize("."),
    };
    // A missing output directory is created later, so it cannot hold the input.
    let Ok(report_dir) = report_dir else {
        return Ok(());
    };
    let file_name = report_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path: {}", report_path.display()))?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn resolve_single_input(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = glob_files(&pattern)?;
    if matches.is_empty() {
        return Err(no_match(&pattern));
    }
    if matches.len() > 1 {
        let hint = "pass a single MET file, or use `metscan check` for batches".to_string();
        let mut message = format!(
            "multiple files match pattern '{}' ({} matches)",
            pattern,
            matches.len()
        );
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>();
        message.push_str("; matches: ");
        message.push_str(&listed.join(", "));
        if matches.len() > 3 {
            message.push_str(", ...");
        }
        return Err(CliError::new(message, Some(hint)));
    }

    Ok(matches.remove(0))
}

/// Plain paths pass through unchanged so a missing file is reported as a
/// decode failure; patterns must match at least one file.
fn expand_input(input: &Path) -> Result<Vec<PathBuf>, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(vec![input.to_path_buf()]);
    }
    let matches = glob_files(&pattern)?;
    if matches.is_empty() {
        return Err(no_match(&pattern));
    }
    Ok(matches)
}

fn glob_files(pattern: &str) -> Result<Vec<PathBuf>, CliError> {
    let paths = glob(pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }
    Ok(matches)
}

fn no_match(pattern: &str) -> CliError {
    CliError::new(
        format!("no files match pattern '{}'", pattern),
        Some("check the path or quote the pattern".to_string()),
    )
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
