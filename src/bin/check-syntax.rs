//! `check-syntax` command-line host.
//!
//! Walks a build output directory, checks every emitted script and HTML page
//! against the configured ECMAScript version and prints the report to stdout.

use anyhow::{Context, Result};
use check_syntax_native::logging::{init_logging, LogConfig};
use check_syntax_native::{
    check_output_dir, CheckSyntaxOptions, EcmaVersion, ErrorField, Verbosity,
};
use clap::Parser;
use clap_verbosity_flag::WarnLevel;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(
    name = "check-syntax",
    version,
    about = "Check build output for syntax newer than the target ECMAScript version"
)]
struct Cli {
    /// Build output directory to scan.
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Project root used to resolve and display source paths (default: cwd).
    #[arg(long = "root", value_name = "DIR")]
    root: Option<PathBuf>,

    /// JSON options file; flags given on the command line override it.
    #[arg(long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Highest allowed version, e.g. es2017, 2017, 8 or latest.
    #[arg(long = "ecma-version", value_name = "VERSION")]
    ecma_version: Option<EcmaVersion>,

    /// Browserslist-style query, e.g. "chrome >= 61". Repeatable.
    #[arg(long = "target", value_name = "QUERY")]
    targets: Vec<String>,

    /// Ignore errors whose source path matches the pattern. Repeatable.
    #[arg(long = "exclude", value_name = "REGEX")]
    exclude: Vec<String>,

    /// Skip emitted files whose path matches the pattern. Repeatable.
    #[arg(long = "exclude-output", value_name = "REGEX")]
    exclude_output: Vec<String>,

    /// Ignore errors whose message matches the pattern. Repeatable.
    #[arg(long = "exclude-message", value_name = "REGEX")]
    exclude_message: Vec<String>,

    /// Hide a report field: source, output, reason or code. Repeatable.
    #[arg(long = "exclude-log", value_name = "FIELD")]
    exclude_log: Vec<ErrorField>,

    /// Disable ANSI colors in the report.
    #[arg(long = "no-color")]
    no_color: bool,

    /// -v also prints the checked file count, -q hides the success line.
    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<WarnLevel>,
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        use_env_filter: !cli.verbosity.is_present(),
        with_ansi: !cli.no_color && io::stderr().is_terminal(),
    };
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("{error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<()> {
    let options = options_from_cli(&cli)?;
    let checker = check_output_dir(options, &cli.output_dir)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = checker.print_report(&mut out);
    out.flush().context("failed to flush report")?;
    result?;
    Ok(())
}

/// Config file first, then command-line flags on top.
fn options_from_cli(cli: &Cli) -> Result<CheckSyntaxOptions> {
    let mut options = match &cli.config {
        Some(path) => CheckSyntaxOptions::from_json_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => CheckSyntaxOptions::default(),
    };

    if cli.ecma_version.is_some() {
        options.ecma_version = cli.ecma_version;
    }
    if !cli.targets.is_empty() {
        options.targets = Some(cli.targets.clone());
    }
    if cli.root.is_some() {
        options.root_path = cli.root.clone();
    }
    options.exclude.extend(cli.exclude.iter().cloned());
    options.exclude_output.extend(cli.exclude_output.iter().cloned());
    options
        .exclude_error_message
        .extend(cli.exclude_message.iter().cloned());
    options.exclude_error_logs.extend(cli.exclude_log.iter().copied());

    options.color = !cli.no_color && (options.color || io::stdout().is_terminal());
    let level = cli.verbosity.tracing_level_filter();
    options.verbosity = if level < LevelFilter::WARN {
        Verbosity::Quiet
    } else if level > LevelFilter::WARN {
        Verbosity::Verbose
    } else {
        options.verbosity
    };

    Ok(options)
}
