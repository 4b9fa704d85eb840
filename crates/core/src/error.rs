//! Pipeline errors.

use std::io;
use std::path::PathBuf;

use crate::validator::ValidationReport;

/// Why a generation run stopped.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Filesystem access failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The declaration corpus could not be read.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A template failed to render.
    #[error("Template error: {0}")]
    Template(String),

    /// The configuration or manual templates are invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Writing the output directory failed.
    #[error("Output error: {0}")]
    Output(String),

    /// Validation found missing APIs, unsupported types or broken files.
    /// Nothing was written.
    #[error("Validation failed with {} error(s)", .0.result.errors.len())]
    Validation(Box<ValidationReport>),
}
