//! Companion source map resolution.
//!
//! An artifact `X` may ship `X.map`. When it does, an output position is
//! traced back to the authored file, and the authored text (if embedded) is
//! used for the excerpt.

use lazy_static::lazy_static;
use regex::Regex;
use sourcemap::{DecodedMap, SourceMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::diagnostic::{ParseFailure, SourceLocation};
use crate::error::{CheckError, Result};
use crate::excerpt::{code_frame, code_pointer, split_lines};

lazy_static! {
    /// `<scheme>://<rest>` as written by bundlers (`webpack://`, `rspack://`, …).
    static ref SCHEME_RE: Regex = Regex::new(r"^([a-zA-Z][a-zA-Z0-9+.-]*)://(.*)$").unwrap();
}

/// How a `sources` entry should be turned into a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceReference {
    /// Bundler virtual URL; holds the resource path, relative to the project root.
    Synthetic(String),
    /// Already absolute, used verbatim.
    Absolute(PathBuf),
    /// Relative to the directory holding the map.
    Relative(String),
}

/// Classify a `sources` entry.
///
/// Synthetic grammar: `scheme://[namespace]/resource[?query]`.
/// - `scheme://` is stripped (`file://` is treated as an absolute path instead);
/// - after it, a leading `/` means an empty namespace;
/// - otherwise the first segment is the namespace, unless it is `.` or `..`
///   or there is no further `/`;
/// - leading `./` segments and any `?query` are dropped from the resource.
///
/// Anything else is an opaque absolute or relative path.
pub fn normalize_source_reference(reference: &str) -> SourceReference {
    let Some(caps) = SCHEME_RE.captures(reference) else {
        return if Path::new(reference).is_absolute() {
            SourceReference::Absolute(PathBuf::from(reference))
        } else {
            SourceReference::Relative(reference.to_string())
        };
    };

    let scheme = caps.get(1).map_or("", |m| m.as_str());
    let rest = caps.get(2).map_or("", |m| m.as_str());

    if scheme.eq_ignore_ascii_case("file") {
        return SourceReference::Absolute(PathBuf::from(rest));
    }

    let rest = rest.split('?').next().unwrap_or("");
    let resource = if let Some(stripped) = rest.strip_prefix('/') {
        stripped
    } else {
        match rest.split_once('/') {
            Some((namespace, tail)) if namespace != "." && namespace != ".." => tail,
            _ => rest,
        }
    };

    let mut resource = resource;
    while let Some(stripped) = resource.strip_prefix("./") {
        resource = stripped;
    }
    SourceReference::Synthetic(resource.to_string())
}

/// Best-effort absolute path for a `sources` entry.
pub fn resolve_source_path(reference: &str, map_dir: &Path, root: &Path) -> PathBuf {
    match normalize_source_reference(reference) {
        SourceReference::Synthetic(resource) => clean_path(&root.join(resource)),
        SourceReference::Absolute(path) => path,
        SourceReference::Relative(relative) => clean_path(&map_dir.join(relative)),
    }
}

/// `path` relative to `root` with `/` separators, or the full path when it lies
/// outside the root.
pub fn display_path(path: &Path, root: &Path) -> String {
    let shown = path.strip_prefix(root).unwrap_or(path);
    shown.to_string_lossy().replace('\\', "/")
}

/// Lexically remove `.` and `..` segments.
fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Trace `failure` through `<output_path>.map`.
///
/// `Ok(None)` covers a missing map, an undecodable map and a position without
/// an original mapping. Only unexpected I/O failures are errors.
pub fn resolve(
    output_path: &Path,
    failure: &ParseFailure,
    output_code: &str,
    root: &Path,
    color: bool,
) -> Result<Option<SourceLocation>> {
    let mut map_path = output_path.as_os_str().to_owned();
    map_path.push(".map");
    let map_path = PathBuf::from(map_path);

    let raw = match fs::read(&map_path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CheckError::io(map_path, e)),
    };

    let Some(map) = decode(&raw, &map_path) else {
        return Ok(None);
    };

    let line = failure.position.line.saturating_sub(1);
    let Some(token) = map.lookup_token(line, failure.position.column) else {
        return Ok(None);
    };
    // Only mappings on the same generated line count.
    if token.get_dst_line() != line {
        return Ok(None);
    }
    let Some(source) = token.get_source() else {
        return Ok(None);
    };

    let map_dir = map_path.parent().unwrap_or_else(|| Path::new(""));
    let absolute = resolve_source_path(source, map_dir, root);
    let src_line = token.get_src_line();

    let code = match map.get_source_contents(token.get_src_id()) {
        Some(contents) => code_frame(&split_lines(contents), src_line as usize, color),
        None => code_pointer(output_code, failure.byte_offset, color),
    };

    tracing::debug!(
        "mapped {}:{}:{} to {}:{}:{}",
        output_path.display(),
        failure.position.line,
        failure.position.column,
        absolute.display(),
        src_line + 1,
        token.get_src_col()
    );

    Ok(Some(SourceLocation {
        path: display_path(&absolute, root),
        line: src_line + 1,
        column: token.get_src_col(),
        absolute_path: absolute.to_string_lossy().to_string(),
        code,
    }))
}

fn decode(raw: &[u8], map_path: &Path) -> Option<SourceMap> {
    match sourcemap::decode_slice(raw) {
        Ok(DecodedMap::Regular(map)) => Some(map),
        Ok(DecodedMap::Index(index)) => match index.flatten() {
            Ok(map) => Some(map),
            Err(e) => {
                tracing::debug!("cannot flatten {}: {}", map_path.display(), e);
                None
            }
        },
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("cannot decode {}: {}", map_path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Position;

    #[test]
    fn test_normalize_webpack_namespace() {
        assert_eq!(
            normalize_source_reference("webpack://tmp/./src/test.js"),
            SourceReference::Synthetic("src/test.js".into())
        );
        assert_eq!(
            normalize_source_reference("webpack:///./src/test.js"),
            SourceReference::Synthetic("src/test.js".into())
        );
        assert_eq!(
            normalize_source_reference("rspack://my-app/src/index.js?loader=swc"),
            SourceReference::Synthetic("src/index.js".into())
        );
        assert_eq!(
            normalize_source_reference("webpack://./src/a.js"),
            SourceReference::Synthetic("src/a.js".into())
        );
    }

    #[test]
    fn test_normalize_plain_paths() {
        assert_eq!(
            normalize_source_reference("/abs/src/a.js"),
            SourceReference::Absolute(PathBuf::from("/abs/src/a.js"))
        );
        assert_eq!(
            normalize_source_reference("file:///abs/src/a.js"),
            SourceReference::Absolute(PathBuf::from("/abs/src/a.js"))
        );
        assert_eq!(
            normalize_source_reference("../../src/a.js"),
            SourceReference::Relative("../../src/a.js".into())
        );
    }

    #[test]
    fn test_resolve_source_path() {
        let root = Path::new("/project");
        let map_dir = Path::new("/project/dist/static/js");
        assert_eq!(
            resolve_source_path("webpack://tmp/./src/test.js", map_dir, root),
            PathBuf::from("/project/src/test.js")
        );
        assert_eq!(
            resolve_source_path("../../../src/test.js", map_dir, root),
            PathBuf::from("/project/src/test.js")
        );
        assert_eq!(
            resolve_source_path("/elsewhere/x.js", map_dir, root),
            PathBuf::from("/elsewhere/x.js")
        );
    }

    #[test]
    fn test_display_path() {
        let root = Path::new("/project");
        assert_eq!(display_path(Path::new("/project/src/a.js"), root), "src/a.js");
        assert_eq!(display_path(Path::new("/other/a.js"), root), "/other/a.js");
    }

    fn failure(line: u32, column: u32, byte_offset: usize) -> ParseFailure {
        ParseFailure {
            message: "Unexpected token".into(),
            byte_offset,
            position: Position::new(line, column),
        }
    }

    #[test]
    fn test_missing_map_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a.js");
        fs::write(&out, "a?.b").unwrap();
        let resolved = resolve(&out, &failure(1, 1, 1), "a?.b", dir.path(), false).unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_malformed_map_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a.js");
        fs::write(&out, "a?.b").unwrap();
        fs::write(dir.path().join("a.js.map"), "{ not json").unwrap();
        let resolved = resolve(&out, &failure(1, 1, 1), "a?.b", dir.path(), false).unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_unmapped_position_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a.js");
        fs::write(&out, "x;\na?.b").unwrap();
        // Only generated line 1 carries a mapping.
        let map = r#"{"version":3,"sources":["src/a.js"],"names":[],"mappings":"AAAA"}"#;
        fs::write(dir.path().join("a.js.map"), map).unwrap();
        let resolved = resolve(&out, &failure(2, 1, 4), "x;\na?.b", dir.path(), false).unwrap();
        assert!(resolved.is_none());
    }
}
