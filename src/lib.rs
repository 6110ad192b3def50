//! # check-syntax
//!
//! Post-build ECMAScript compatibility check.
//!
//! Every emitted `.js`/`.mjs`/`.cjs`/`.jsx` artifact and every inline script of
//! an emitted `.html` page is parsed against a configured ECMAScript version.
//! Code that needs a newer edition becomes a [`CompatibilityError`], traced
//! back to the authored file through a companion `.map` when one exists.
//!
//! ## Flow
//!
//! 1. [`run_after_emit`] filters emitted assets through the output exclusion.
//! 2. [`CheckSyntax::check`] parses each file (or each inline script).
//! 3. A failure is synthesized into an error: source map lookup, excerpt,
//!    then source-path and message exclusions.
//! 4. [`CheckSyntax::print_report`] renders the retained errors and returns
//!    [`CheckError::IncompatibleSyntax`] when there are any.

mod check;
mod diagnostic;
mod error;
mod excerpt;
mod exclude;
mod host;
mod html;
pub mod logging;
mod parse;
mod report;
mod source_map;
mod synthesize;
mod syntax_level;
mod targets;
mod version;


pub use check::{CheckSyntax, CheckSyntaxOptions};
pub use diagnostic::{CompatibilityError, FileLocation, ParseFailure, Position, SourceLocation};
pub use error::{CheckError, Result};
pub use excerpt::{code_frame, code_pointer};
pub use exclude::{matches, Exclude, ExcludeCondition, Predicate};
pub use host::{check_output_dir, collect_emitted, run_after_emit};
pub use html::extract_inline_scripts;
pub use parse::{try_parse, SourceKind};
pub use report::{print_errors, ErrorField, ReportOptions, Verbosity};
pub use source_map::{
    display_path, normalize_source_reference, resolve_source_path, SourceReference,
};
pub use synthesize::{synthesize, SynthesizeContext};
pub use targets::resolve_targets;
pub use version::EcmaVersion;

#[cfg(feature = "napi")]
pub use host::check_syntax_native;
