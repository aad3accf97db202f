//! Error types for header conversion.

use crate::strmanip::StrError;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors that abort a conversion run.
#[derive(Error, Debug, Diagnostic)]
pub enum ConvertError {
    /// The input header could not be opened.
    #[error("Input file not found: {}", path.display())]
    #[diagnostic(code(flathdr::input_not_found))]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output header could not be created.
    #[error("Output file not writable: {}", path.display())]
    #[diagnostic(code(flathdr::output_not_writable))]
    OutputNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line split into more tokens than the tokenizer accepts.
    #[error("Line {line} has more than {limit} tokens")]
    #[diagnostic(
        code(flathdr::too_many_tokens),
        help("raise `conversion.max_tokens` or set `conversion.token_overflow = \"skip\"`")
    )]
    TooManyTokens { line: usize, limit: usize },

    /// One of the fixed classification patterns failed to compile.
    #[error("Failed to compile the {name} pattern")]
    #[diagnostic(code(flathdr::pattern_compile))]
    PatternCompile {
        name: &'static str,
        #[source]
        source: regex::Error,
    },

    /// A bounded string operation ran out of room.
    #[error(transparent)]
    #[diagnostic(code(flathdr::buffer_capacity))]
    BufferCapacity(#[from] StrError),

    /// Reading the input or writing the output failed mid-run.
    #[error("I/O error: {0}")]
    #[diagnostic(code(flathdr::io))]
    Io(#[from] std::io::Error),
}
