//! Parse Module
//!
//! Version-gated parsing of JavaScript text. oxc supplies the grammar, the
//! syntax level classifier supplies the edition gate.

use oxc_allocator::Allocator;
use oxc_diagnostics::OxcDiagnostic;
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::path::Path;

use crate::diagnostic::{floor_char_boundary, ParseFailure, Position};
use crate::syntax_level::first_violation;
use crate::version::EcmaVersion;

/// How the text should be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    Module,
    Script,
    /// Module iff the text contains `import`/`export` declarations.
    #[default]
    Unambiguous,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("mjs") => SourceKind::Module,
            Some("cjs") => SourceKind::Script,
            _ => SourceKind::Unambiguous,
        }
    }

    fn source_type(self) -> SourceType {
        let source_type = SourceType::default();
        match self {
            SourceKind::Module => source_type.with_module(true),
            SourceKind::Script => source_type.with_script(true),
            SourceKind::Unambiguous => source_type.with_unambiguous(true),
        }
    }
}

/// Parse `code` under `version`. `Ok(())` means every construct is allowed.
pub fn try_parse(code: &str, version: EcmaVersion, kind: SourceKind) -> Result<(), ParseFailure> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, kind.source_type()).parse();

    if let Some(diagnostic) = ret.errors.first() {
        return Err(failure_from_diagnostic(code, diagnostic));
    }
    if ret.panicked {
        return Err(failure_at(code, 0, "Unexpected token".to_string()));
    }

    match first_violation(&ret.program, code, version) {
        Some(violation) => Err(failure_at(code, violation.offset as usize, violation.message())),
        None => Ok(()),
    }
}

fn failure_from_diagnostic(code: &str, diagnostic: &OxcDiagnostic) -> ParseFailure {
    let offset = diagnostic
        .labels
        .as_ref()
        .and_then(|labels| labels.first())
        .map(|label| label.offset())
        .unwrap_or(0);
    failure_at(code, offset, diagnostic.message.to_string())
}

fn failure_at(code: &str, offset: usize, message: String) -> ParseFailure {
    let byte_offset = floor_char_boundary(code, offset);
    ParseFailure {
        message,
        byte_offset,
        position: Position::from_offset(code, byte_offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIONAL_CHAINING: &str = "const arr=[1]; console.log(arr, arr?.flat());";

    #[test]
    fn test_accepts_at_supporting_version() {
        assert!(try_parse(OPTIONAL_CHAINING, EcmaVersion::Es2020, SourceKind::Script).is_ok());
        assert!(try_parse(OPTIONAL_CHAINING, EcmaVersion::Latest, SourceKind::Script).is_ok());
    }

    #[test]
    fn test_rejects_one_version_below() {
        let failure =
            try_parse(OPTIONAL_CHAINING, EcmaVersion::Es2019, SourceKind::Script).unwrap_err();
        assert!(failure.message.contains("Unexpected token"));
        assert_eq!(failure.byte_offset, OPTIONAL_CHAINING.find("?.").unwrap());
        assert_eq!(failure.position, Position::new(1, 35));
    }

    #[test]
    fn test_grammar_errors_pass_through() {
        let code = "var a = ;\n";
        let failure = try_parse(code, EcmaVersion::Latest, SourceKind::Script).unwrap_err();
        assert!(!failure.message.is_empty());
        assert_eq!(failure.position.line, 1);
    }

    #[test]
    fn test_position_on_later_line() {
        let code = "var a = 1;\nvar b = 2;\nvar c = a ?? b;\n";
        let failure = try_parse(code, EcmaVersion::Es2015, SourceKind::Script).unwrap_err();
        assert_eq!(failure.position, Position::new(3, 10));
    }

    #[test]
    fn test_source_kind_from_extension() {
        assert_eq!(SourceKind::from_path(Path::new("a.mjs")), SourceKind::Module);
        assert_eq!(SourceKind::from_path(Path::new("a.cjs")), SourceKind::Script);
        assert_eq!(SourceKind::from_path(Path::new("a.js")), SourceKind::Unambiguous);
    }

    #[test]
    fn test_module_syntax_in_unambiguous_source() {
        let code = "import a from './a.js';\nexport default a;\n";
        assert!(try_parse(code, EcmaVersion::Es2015, SourceKind::Unambiguous).is_ok());
        assert!(try_parse(code, EcmaVersion::Es5, SourceKind::Unambiguous).is_err());
    }
}
