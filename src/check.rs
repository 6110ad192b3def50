//! Checking session.
//!
//! One `CheckSyntax` lives for one build run. Files may be checked from many
//! threads; each file's errors are appended to the shared list in one piece.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::diagnostic::CompatibilityError;
use crate::error::{CheckError, Result};
use crate::exclude::{deserialize_patterns, Exclude};
use crate::html::extract_inline_scripts;
use crate::parse::{try_parse, SourceKind};
use crate::report::{print_errors, ErrorField, ReportOptions, Verbosity};
use crate::synthesize::{synthesize, SynthesizeContext};
use crate::targets::resolve_targets;
use crate::version::EcmaVersion;

lazy_static! {
    pub static ref HTML_RE: Regex = Regex::new(r"\.html$").unwrap();
    pub static ref JS_RE: Regex = Regex::new(r"\.(?:js|mjs|cjs|jsx)$").unwrap();
}

/// User-facing options, as read from JSON (camelCase keys).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckSyntaxOptions {
    /// Browserslist-style queries.
    pub targets: Option<Vec<String>>,
    /// Wins over `targets` when both are given.
    pub ecma_version: Option<EcmaVersion>,
    /// Patterns matched against the resolved source path.
    #[serde(deserialize_with = "deserialize_patterns")]
    pub exclude: Vec<String>,
    /// Patterns matched against emitted file paths before checking.
    #[serde(deserialize_with = "deserialize_patterns")]
    pub exclude_output: Vec<String>,
    /// Patterns matched against error messages.
    #[serde(deserialize_with = "deserialize_patterns")]
    pub exclude_error_message: Vec<String>,
    pub exclude_error_logs: Vec<ErrorField>,
    pub root_path: Option<PathBuf>,
    pub verbosity: Verbosity,
    pub color: bool,
}

impl CheckSyntaxOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| CheckError::io(path, e))?;
        Self::from_json_str(&json)
    }
}

pub struct CheckSyntax {
    ecma_version: EcmaVersion,
    root_path: PathBuf,
    exclude: Exclude,
    exclude_output: Exclude,
    exclude_message: Exclude,
    exclude_error_logs: Vec<ErrorField>,
    verbosity: Verbosity,
    color: bool,
    errors: Mutex<Vec<CompatibilityError>>,
    files_checked: AtomicUsize,
}

impl CheckSyntax {
    /// Fails immediately when neither `ecmaVersion` nor `targets` is usable.
    pub fn new(options: CheckSyntaxOptions) -> Result<Self> {
        let ecma_version = match (options.ecma_version, options.targets.as_deref()) {
            (Some(version), _) => version,
            (None, Some(targets)) if !targets.is_empty() => resolve_targets(targets)?,
            _ => return Err(CheckError::MissingTarget),
        };

        let root_path = match options.root_path {
            Some(root) => root,
            None => std::env::current_dir().map_err(|e| CheckError::io(".", e))?,
        };

        tracing::debug!("checking syntax against {}", ecma_version);

        Ok(Self {
            ecma_version,
            root_path,
            exclude: Exclude::from_patterns(&options.exclude)?,
            exclude_output: Exclude::from_patterns(&options.exclude_output)?,
            exclude_message: Exclude::from_patterns(&options.exclude_error_message)?,
            exclude_error_logs: options.exclude_error_logs,
            verbosity: options.verbosity,
            color: options.color,
            errors: Mutex::new(Vec::new()),
            files_checked: AtomicUsize::new(0),
        })
    }

    /// Extra source-path conditions (prefixes, predicates) beyond the JSON patterns.
    pub fn with_exclude(mut self, exclude: Exclude) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_exclude_output(mut self, exclude: Exclude) -> Self {
        self.exclude_output = exclude;
        self
    }

    pub fn with_exclude_message(mut self, exclude: Exclude) -> Self {
        self.exclude_message = exclude;
        self
    }

    pub fn ecma_version(&self) -> EcmaVersion {
        self.ecma_version
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn exclude_output(&self) -> &Exclude {
        &self.exclude_output
    }

    pub fn files_checked(&self) -> usize {
        self.files_checked.load(Ordering::Relaxed)
    }

    /// Check one emitted file. `inline_code` skips reading and classification.
    /// Unknown extensions are ignored.
    pub fn check(&self, path: &Path, inline_code: Option<&str>) -> Result<()> {
        let found = match inline_code {
            Some(code) => self.parse_fragment(path, code).into_iter().collect(),
            None => self.check_file(path)?,
        };

        if !found.is_empty() {
            tracing::debug!("{}: {} error(s)", path.display(), found.len());
            self.lock_errors().extend(found);
        }
        Ok(())
    }

    fn check_file(&self, path: &Path) -> Result<Vec<CompatibilityError>> {
        let name = path.to_string_lossy();

        if HTML_RE.is_match(&name) {
            self.files_checked.fetch_add(1, Ordering::Relaxed);
            let html = fs::read_to_string(path).map_err(|e| CheckError::io(path, e))?;
            if self.exclude.matches(&name) {
                return Ok(Vec::new());
            }
            return Ok(extract_inline_scripts(&html)
                .iter()
                .filter_map(|script| self.parse_fragment(path, script))
                .collect());
        }

        if JS_RE.is_match(&name) {
            self.files_checked.fetch_add(1, Ordering::Relaxed);
            let code = fs::read_to_string(path).map_err(|e| CheckError::io(path, e))?;
            return Ok(self.parse_fragment(path, &code).into_iter().collect());
        }

        tracing::debug!("skipping {}", path.display());
        Ok(Vec::new())
    }

    fn parse_fragment(&self, path: &Path, code: &str) -> Option<CompatibilityError> {
        let failure = try_parse(code, self.ecma_version, SourceKind::from_path(path)).err()?;
        let ctx = SynthesizeContext {
            root: &self.root_path,
            exclude_source: Some(&self.exclude),
            exclude_message: Some(&self.exclude_message),
            color: self.color,
        };
        synthesize(&failure, code, path, &ctx)
    }

    fn lock_errors(&self) -> MutexGuard<'_, Vec<CompatibilityError>> {
        self.errors.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the retained errors in discovery order.
    pub fn errors(&self) -> Vec<CompatibilityError> {
        self.lock_errors().clone()
    }

    /// Drain the retained errors, leaving the session empty.
    pub fn take_errors(&self) -> Vec<CompatibilityError> {
        std::mem::take(&mut *self.lock_errors())
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            exclude_fields: self.exclude_error_logs.clone(),
            verbosity: self.verbosity,
            color: self.color,
            files_checked: self.files_checked(),
        }
    }

    /// Print the report for everything retained so far.
    pub fn print_report<W: Write>(&self, out: &mut W) -> Result<()> {
        let errors = self.errors();
        print_errors(out, &errors, self.ecma_version, &self.report_options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_version_or_targets() {
        assert!(matches!(
            CheckSyntax::new(CheckSyntaxOptions::default()),
            Err(CheckError::MissingTarget)
        ));
        let options = CheckSyntaxOptions {
            targets: Some(vec![]),
            ..CheckSyntaxOptions::default()
        };
        assert!(matches!(
            CheckSyntax::new(options),
            Err(CheckError::MissingTarget)
        ));
    }

    #[test]
    fn test_ecma_version_wins_over_targets() {
        let options = CheckSyntaxOptions {
            ecma_version: Some(EcmaVersion::Es2022),
            targets: Some(vec!["ie 11".into()]),
            root_path: Some(PathBuf::from("/project")),
            ..CheckSyntaxOptions::default()
        };
        let checker = CheckSyntax::new(options).unwrap();
        assert_eq!(checker.ecma_version(), EcmaVersion::Es2022);
    }

    #[test]
    fn test_targets_resolve_to_version() {
        let options = CheckSyntaxOptions {
            targets: Some(vec!["chrome >= 53".into()]),
            root_path: Some(PathBuf::from("/project")),
            ..CheckSyntaxOptions::default()
        };
        let checker = CheckSyntax::new(options).unwrap();
        assert!(checker.ecma_version() < EcmaVersion::Es2020);
    }

    #[test]
    fn test_invalid_pattern_fails_construction() {
        let options = CheckSyntaxOptions {
            ecma_version: Some(EcmaVersion::Es2015),
            exclude: vec!["(".into()],
            root_path: Some(PathBuf::from("/project")),
            ..CheckSyntaxOptions::default()
        };
        assert!(matches!(
            CheckSyntax::new(options),
            Err(CheckError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_options_from_json() {
        let options = CheckSyntaxOptions::from_json_str(
            r#"{
                "ecmaVersion": 2018,
                "exclude": "node_modules",
                "excludeOutput": ["\\.map$", "legacy"],
                "excludeErrorLogs": ["code", "output"],
                "rootPath": "/project",
                "verbosity": "quiet"
            }"#,
        )
        .unwrap();
        assert_eq!(options.ecma_version, Some(EcmaVersion::Es2018));
        assert_eq!(options.exclude, vec!["node_modules"]);
        assert_eq!(options.exclude_output.len(), 2);
        assert_eq!(
            options.exclude_error_logs,
            vec![ErrorField::Code, ErrorField::Output]
        );
        assert_eq!(options.verbosity, Verbosity::Quiet);
        assert!(options.exclude_error_message.is_empty());
    }

    #[test]
    fn test_inline_code_and_unknown_extension() {
        let options = CheckSyntaxOptions {
            ecma_version: Some(EcmaVersion::Es5),
            root_path: Some(PathBuf::from("/project")),
            ..CheckSyntaxOptions::default()
        };
        let checker = CheckSyntax::new(options).unwrap();
        checker
            .check(Path::new("/project/dist/a.js"), Some("let a = 1;"))
            .unwrap();
        checker.check(Path::new("/project/dist/a.css"), None).unwrap();
        let errors = checker.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].source.path, "dist/a.js");
        assert_eq!(checker.take_errors().len(), 1);
        assert!(checker.errors().is_empty());
    }
}
