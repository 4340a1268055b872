use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a script run.
///
/// Everything not listed here (unknown statements, unknown directives, bad
/// rating input, a malformed ghost table) is reported to the output sink and
/// the run carries on with the next line.
#[derive(Debug, Error)]
pub enum RunError {
    /// The script file does not exist.
    #[error("File {} not found", .path.display())]
    SourceNotFound { path: PathBuf },

    /// A function body was opened but never closed before end of script.
    #[error("Unterminated function body '{name}' opened at line {line}")]
    UnterminatedFunction { name: String, line: usize },

    /// The script exists but could not be read, e.g. it is not valid UTF-8.
    #[error("File {} could not be read: {source}", .path.display())]
    SourceUnreadable { path: PathBuf, source: io::Error },

    /// A top-level `call` named a function that is not in the table.
    #[error("Function '{name}' not defined at line {line}")]
    UndefinedFunction { name: String, line: usize },

    /// Writing to the output sink failed.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

impl RunError {
    /// Whether the error happened before any statement of the script ran.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, RunError::UnterminatedFunction { .. })
    }
}
