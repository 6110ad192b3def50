//! Human-readable report of the retained errors.

use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::diagnostic::CompatibilityError;
use crate::error::{CheckError, Result};
use crate::excerpt::colors::{self, paint};
use crate::version::EcmaVersion;

const PREFIX: &str = "[check-syntax]";

/// A labelled line of one error block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorField {
    Source,
    Output,
    Reason,
    Code,
}

impl ErrorField {
    pub const ALL: [ErrorField; 4] = [
        ErrorField::Source,
        ErrorField::Output,
        ErrorField::Reason,
        ErrorField::Code,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ErrorField::Source => "source",
            ErrorField::Output => "output",
            ErrorField::Reason => "reason",
            ErrorField::Code => "code",
        }
    }
}

impl std::str::FromStr for ErrorField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ErrorField::ALL
            .into_iter()
            .find(|f| f.key() == s)
            .ok_or_else(|| format!("unknown error field `{}`", s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// No success line.
    Quiet,
    #[default]
    Normal,
    /// Also prints how many files were checked.
    Verbose,
}

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub exclude_fields: Vec<ErrorField>,
    pub verbosity: Verbosity,
    pub color: bool,
    pub files_checked: usize,
}

/// Print `errors` to `out`. Returns the aggregate failure when any error was
/// retained.
pub fn print_errors<W: Write>(
    out: &mut W,
    errors: &[CompatibilityError],
    version: EcmaVersion,
    options: &ReportOptions,
) -> Result<()> {
    write_report(out, errors, version, options).map_err(CheckError::Report)?;

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CheckError::IncompatibleSyntax {
            version,
            count: errors.len(),
        })
    }
}

fn write_report<W: Write>(
    out: &mut W,
    errors: &[CompatibilityError],
    version: EcmaVersion,
    options: &ReportOptions,
) -> std::io::Result<()> {
    let color = options.color;

    if errors.is_empty() {
        if options.verbosity != Verbosity::Quiet {
            writeln!(
                out,
                "{} {} Syntax check passed.",
                paint("ready", colors::GREEN, color),
                PREFIX
            )?;
        }
        return write_files_checked(out, options);
    }

    // Shared by every block so columns line up across the whole report.
    let longest = ErrorField::ALL
        .iter()
        .map(|f| f.key().len())
        .max()
        .unwrap_or(0);

    let expected = paint(&format!("ecmaVersion <= {}", version), colors::YELLOW, color);
    writeln!(
        out,
        "{} {} Find some syntax that does not match \"{}\":\n",
        paint("error", colors::RED, color),
        PREFIX,
        expected
    )?;

    for (index, error) in errors.iter().enumerate() {
        let title = format!("  ERROR {}", index + 1);
        let title = if color {
            format!("{}{}{}", colors::BOLD, paint(&title, colors::RED, true), colors::RESET)
        } else {
            title
        };
        writeln!(out, "{}", title)?;
        write_block(out, error, longest, options)?;
    }

    write_files_checked(out, options)
}

fn write_block<W: Write>(
    out: &mut W,
    error: &CompatibilityError,
    longest: usize,
    options: &ReportOptions,
) -> std::io::Result<()> {
    for field in ErrorField::ALL {
        if options.exclude_fields.contains(&field) {
            continue;
        }
        let content = match field {
            ErrorField::Source => Some(error.source.location().to_string()),
            ErrorField::Output => error.output.as_ref().map(|o| o.to_string()),
            ErrorField::Reason => Some(error.message.clone()),
            ErrorField::Code => Some(error.source.code.clone()),
        };
        let Some(content) = content.filter(|c| !c.is_empty()) else {
            continue;
        };
        let label = format!("{:<width$}", format!("{}:", field.key()), width = longest + 1);
        writeln!(
            out,
            "  {}  {}",
            paint(&label, colors::MAGENTA, options.color),
            content
        )?;
    }
    writeln!(out)
}

fn write_files_checked<W: Write>(out: &mut W, options: &ReportOptions) -> std::io::Result<()> {
    if options.verbosity == Verbosity::Verbose {
        writeln!(out, "{} checked {} file(s)", PREFIX, options.files_checked)?;
    }
    Ok(())
}
