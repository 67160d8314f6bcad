//! Error types for format parsing.

use std::{error, fmt, io, path::PathBuf};

use fret_document::SourceFormat;

/// Errors that can occur when decoding a source as a claimed format.
///
/// A parser returns an error only when the whole input cannot be decoded as
/// its format; per-unit problems become
/// [`ParseWarning`](crate::ParseWarning)s instead. Callers tally a decode
/// error as one failed source and continue the run.
#[derive(Debug)]
pub enum FormatError {
    /// The input is not a valid instance of the claimed format.
    ///
    /// Renders as `failed to decode {source} as {format}: {reason}`.
    Decode {
        /// Source identifier (file path or URL).
        source: String,
        /// The format the input claimed to be.
        format: SourceFormat,
        /// What went wrong.
        reason: String,
    },

    /// A text format received bytes that are not valid UTF-8.
    ///
    /// Renders as `{source} is not valid UTF-8`.
    NotUtf8 {
        /// Source identifier.
        source: String,
    },

    /// Failed to read a file.
    ///
    /// Renders as `failed to read file {path}: {source}`.
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// No parser recognizes the input.
    ///
    /// Renders as `cannot determine format of {source}`.
    UnknownFormat {
        /// Source identifier.
        source: String,
    },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode {
                source,
                format,
                reason,
            } => {
                write!(f, "failed to decode {source} as {format}: {reason}")
            }
            Self::NotUtf8 { source } => write!(f, "{source} is not valid UTF-8"),
            Self::ReadFile { path, source } => {
                write!(f, "failed to read file {}: {source}", path.display())
            }
            Self::UnknownFormat { source } => {
                write!(f, "cannot determine format of {source}")
            }
        }
    }
}

impl error::Error for FormatError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::Decode { .. } | Self::NotUtf8 { .. } | Self::UnknownFormat { .. } => None,
        }
    }
}

impl FormatError {
    /// Creates a `Decode` error for the given source and format.
    pub(crate) fn decode(source: &str, format: SourceFormat, reason: impl Into<String>) -> Self {
        Self::Decode {
            source: source.to_string(),
            format,
            reason: reason.into(),
        }
    }
}
