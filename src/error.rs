use std::path::PathBuf;

use thiserror::Error;

use crate::version::EcmaVersion;

pub type Result<T, E = CheckError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("[check-syntax] `targets` or `ecmaVersion` option is required")]
    MissingTarget,

    #[error("[check-syntax] unsupported target query `{0}`")]
    UnknownTarget(String),

    #[error("[check-syntax] invalid ecmaVersion `{0}`")]
    InvalidVersion(String),

    #[error("[check-syntax] invalid exclude pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("[check-syntax] invalid options: {0}")]
    Config(#[from] serde_json::Error),

    #[error("[check-syntax] failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[check-syntax] failed to write report: {0}")]
    Report(#[source] std::io::Error),

    #[error(
        "[check-syntax] The current build fails due to {count} incompatible syntax error(s) for ecmaVersion <= {version}, which can be fixed in the following ways:\n\n  \
         - If you want to downgrade the syntax, you can compile the specified module through the `source.include` config.\n  \
         - If you don't want to downgrade the syntax, you can adjust the project's browserslist to match the syntax, or set the `ecmaVersion` option.\n  \
         - If you don't want to check the syntax of specified files, you can use the `exclude` option to exclude the files to be checked.\n"
    )]
    IncompatibleSyntax { version: EcmaVersion, count: usize },
}

impl CheckError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CheckError::Io {
            path: path.into(),
            source,
        }
    }
}
