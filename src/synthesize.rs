//! Turns a raw parse failure into a reportable error.

use std::path::Path;

use crate::diagnostic::{CompatibilityError, FileLocation, ParseFailure, SourceLocation};
use crate::exclude::Exclude;
use crate::excerpt::code_pointer;
use crate::source_map::{self, display_path};

/// Inputs that stay fixed across one checking session.
#[derive(Debug, Clone, Copy)]
pub struct SynthesizeContext<'a> {
    pub root: &'a Path,
    pub exclude_source: Option<&'a Exclude>,
    pub exclude_message: Option<&'a Exclude>,
    pub color: bool,
}

/// Build the error for `failure` found in `output_path`, or `None` when an
/// exclusion suppresses it.
pub fn synthesize(
    failure: &ParseFailure,
    output_code: &str,
    output_path: &Path,
    ctx: &SynthesizeContext<'_>,
) -> Option<CompatibilityError> {
    let output_display = display_path(output_path, ctx.root);

    let mapped = match source_map::resolve(output_path, failure, output_code, ctx.root, ctx.color)
    {
        Ok(mapped) => mapped,
        Err(e) => {
            tracing::warn!("{}; reporting the output location instead", e);
            None
        }
    };

    let (source, output) = match mapped {
        Some(source) => (
            source,
            Some(FileLocation::new(output_display, failure.position)),
        ),
        None => (
            SourceLocation {
                path: output_display,
                line: failure.position.line,
                column: failure.position.column,
                absolute_path: output_path.to_string_lossy().to_string(),
                code: code_pointer(output_code, failure.byte_offset, ctx.color),
            },
            None,
        ),
    };

    if ctx
        .exclude_source
        .is_some_and(|e| e.matches(&source.absolute_path))
    {
        tracing::debug!("excluded by source path: {}", source.absolute_path);
        return None;
    }
    if ctx
        .exclude_message
        .is_some_and(|e| e.matches(&failure.message))
    {
        tracing::debug!("excluded by message: {}", failure.message);
        return None;
    }

    Some(CompatibilityError {
        message: failure.message.clone(),
        source,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Position;
    use crate::exclude::ExcludeCondition;
    use std::fs;

    fn failure() -> ParseFailure {
        ParseFailure {
            message: "Unexpected token: optional chaining `?.` requires es2020".into(),
            byte_offset: 1,
            position: Position::new(1, 1),
        }
    }

    fn ctx<'a>(
        root: &'a Path,
        exclude_source: Option<&'a Exclude>,
        exclude_message: Option<&'a Exclude>,
    ) -> SynthesizeContext<'a> {
        SynthesizeContext {
            root,
            exclude_source,
            exclude_message,
            color: false,
        }
    }

    #[test]
    fn test_without_map_points_at_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dist/index.js");
        fs::create_dir_all(out.parent().unwrap()).unwrap();
        fs::write(&out, "a?.b").unwrap();

        let error = synthesize(&failure(), "a?.b", &out, &ctx(dir.path(), None, None)).unwrap();
        assert_eq!(error.source.path, "dist/index.js");
        assert_eq!(error.source.absolute_path, out.to_string_lossy());
        assert_eq!((error.source.line, error.source.column), (1, 1));
        assert!(error.output.is_none());
        assert!(error.source.code.starts_with("a?.b\n"));
    }

    #[test]
    fn test_source_exclusion_matches_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dist/vendor.js");
        let exclude = Exclude::from_patterns(&["dist/vendor"]).unwrap();
        let result = synthesize(
            &failure(),
            "a?.b",
            &out,
            &ctx(dir.path(), Some(&exclude), None),
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_message_exclusion() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dist/index.js");
        let exclude = Exclude::from(ExcludeCondition::pattern("optional chaining").unwrap());
        let result = synthesize(
            &failure(),
            "a?.b",
            &out,
            &ctx(dir.path(), None, Some(&exclude)),
        );
        assert!(result.is_none());

        let other = Exclude::from_patterns(&["BigInt"]).unwrap();
        let result = synthesize(&failure(), "a?.b", &out, &ctx(dir.path(), None, Some(&other)));
        assert!(result.is_some());
    }
}
