//! Build-host integration.
//!
//! After assets are emitted the host hands over the output directory and the
//! emitted asset names. Output exclusions are applied here, before any file is
//! opened.

#[cfg(feature = "napi")]
use napi_derive::napi;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::check::{CheckSyntax, CheckSyntaxOptions, HTML_RE, JS_RE};
use crate::diagnostic::CompatibilityError;
use crate::error::Result;

// ═══════════════════════════════════════════════════════════════════════════════
// AFTER-EMIT HOOK
// ═══════════════════════════════════════════════════════════════════════════════

/// Check every emitted asset and return the errors retained by `checker`.
///
/// Asset names may carry a `?query` suffix; it is dropped before the name is
/// joined onto `output_dir`. Per-file failures are logged and skipped.
pub fn run_after_emit(
    checker: &CheckSyntax,
    output_dir: &Path,
    emitted: &[PathBuf],
) -> Vec<CompatibilityError> {
    let files: Vec<PathBuf> = emitted
        .iter()
        .map(|asset| output_dir.join(strip_query(asset)))
        .filter(|file| {
            let name = file.to_string_lossy();
            if checker.exclude_output().matches(&name) {
                tracing::debug!("excluded output: {}", name);
                return false;
            }
            HTML_RE.is_match(&name) || JS_RE.is_match(&name)
        })
        .collect();

    tracing::debug!("checking {} emitted file(s)", files.len());

    files.par_iter().for_each(|file| {
        if let Err(e) = checker.check(file, None) {
            tracing::warn!("{}", e);
        }
    });

    checker.errors()
}

fn strip_query(asset: &Path) -> PathBuf {
    let name = asset.to_string_lossy();
    match name.split_once('?') {
        Some((path, _)) => PathBuf::from(path),
        None => asset.to_path_buf(),
    }
}

/// Every regular file under `output_dir`, relative to it, in walk order.
pub fn collect_emitted(output_dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(output_dir).follow_links(true).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let path = entry.path();
                let relative = path.strip_prefix(output_dir).unwrap_or(path);
                files.push(relative.to_path_buf());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("skipping unreadable entry: {}", e),
        }
    }

    files
}

/// Options plus a directory scan in one call. Returns the session so the
/// caller can print the report.
pub fn check_output_dir(options: CheckSyntaxOptions, output_dir: &Path) -> Result<CheckSyntax> {
    let checker = CheckSyntax::new(options)?;
    let emitted = collect_emitted(output_dir);
    run_after_emit(&checker, output_dir, &emitted);
    Ok(checker)
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI BRIDGE
// ═══════════════════════════════════════════════════════════════════════════════

/// Check `files` (asset names relative to `output_dir`) with JSON options.
/// Returns the retained errors as a JSON array.
#[cfg(feature = "napi")]
#[napi]
pub fn check_syntax_native(
    options_json: String,
    output_dir: String,
    files: Vec<String>,
) -> napi::Result<String> {
    let options = CheckSyntaxOptions::from_json_str(&options_json)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let checker =
        CheckSyntax::new(options).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let emitted: Vec<PathBuf> = files.into_iter().map(PathBuf::from).collect();
    let errors = run_after_emit(&checker, Path::new(&output_dir), &emitted);
    serde_json::to_string(&errors)
        .map_err(|e| napi::Error::from_reason(format!("Serialize error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_strip_query() {
        assert_eq!(
            strip_query(Path::new("static/js/a.js?v=3")),
            PathBuf::from("static/js/a.js")
        );
        assert_eq!(strip_query(Path::new("index.html")), PathBuf::from("index.html"));
    }

    #[test]
    fn test_collect_emitted_is_relative() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("static/js")).unwrap();
        fs::write(dir.path().join("index.html"), "").unwrap();
        fs::write(dir.path().join("static/js/a.js"), "").unwrap();

        let files = collect_emitted(dir.path());
        assert_eq!(
            files,
            vec![PathBuf::from("index.html"), PathBuf::from("static/js/a.js")]
        );
    }
}
