//! Format parsers for fret.
//!
//! Each input grammar — structured tab-file containers, MIDI, ASCII tab/chord
//! text, and alpha notation — has one [`FormatParser`] implementation that
//! converts raw bytes into the uniform [`Document`](fret_document::Document)
//! model. Parsers never fail on a single malformed element: they record a
//! [`ParseWarning`] and keep going. A parser returns an error only when the
//! input cannot be decoded as the claimed format at all.

#![warn(missing_docs)]

mod alpha;
mod ascii;
mod chord;
mod detect;
mod error;
mod midi;
mod tabfile;

use std::{fmt, path::Path, str};

use fret_document::{Document, SourceFormat};

pub use alpha::AlphaParser;
pub use ascii::AsciiParser;
pub use chord::{is_chord_line, is_chord_symbol, is_tab_line};
pub use detect::{detect_format, parse_bytes, parse_file, parser_for};
pub use error::FormatError;
pub use midi::MidiParser;
pub use tabfile::TabFileParser;

/// Raw input handed to a parser: a provenance label plus the bytes.
///
/// The core never resolves paths or lists directories; the filesystem
/// collaborator (or [`parse_file`]) reads the bytes and labels them.
#[derive(Debug, Clone, Copy)]
pub struct ParseInput<'a> {
    /// Source identifier used in warnings, errors, and chunk provenance.
    pub source: &'a str,
    /// The raw bytes of the source.
    pub data: &'a [u8],
}

impl<'a> ParseInput<'a> {
    /// Creates an input from a source label and raw bytes.
    pub fn new(source: &'a str, data: &'a [u8]) -> Self {
        Self { source, data }
    }

    /// Interprets the bytes as UTF-8 text.
    pub fn text(&self) -> Result<&'a str, FormatError> {
        str::from_utf8(self.data).map_err(|_| FormatError::NotUtf8 {
            source: self.source.to_string(),
        })
    }

    /// The source label without directories or extension, for default titles.
    pub fn source_stem(&self) -> &'a str {
        let name = self
            .source
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.source);
        name.split_once('.').map_or(name, |(stem, _)| stem)
    }
}

/// A recoverable problem with a single unit of the input.
///
/// Warnings mean the parser skipped or partially kept one element and
/// continued; they never abort the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// Which element was affected (line number, measure, event).
    pub unit: String,
    /// Why it was skipped or degraded.
    pub reason: String,
}

impl ParseWarning {
    /// Creates a warning for the given unit.
    pub fn new(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.unit, self.reason)
    }
}

/// The result of parsing one source: documents plus accumulated warnings.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    /// Documents extracted from the source, in source order.
    pub documents: Vec<Document>,
    /// Recoverable problems encountered along the way.
    pub warnings: Vec<ParseWarning>,
}

/// A parser for one input grammar.
///
/// Implementations convert raw bytes into documents, degrading gracefully:
/// malformed units become warnings, and only an input that is not the claimed
/// format at all produces an error.
pub trait FormatParser {
    /// The format this parser produces documents for.
    fn format(&self) -> SourceFormat;

    /// Checks if this parser handles the given file path, by extension.
    fn can_parse(&self, path: &Path) -> bool;

    /// Parses the input into documents and warnings.
    fn parse(&self, input: &ParseInput<'_>) -> Result<ParseOutcome, FormatError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_stem_strips_directories_and_extension() {
        let input = ParseInput::new("tabs/songs/wonderwall.tab.json", b"{}");
        assert_eq!(input.source_stem(), "wonderwall");

        let input = ParseInput::new("riff.mid", b"");
        assert_eq!(input.source_stem(), "riff");

        let input = ParseInput::new("https://example.com/lesson", b"");
        assert_eq!(input.source_stem(), "lesson");
    }

    #[test]
    fn text_rejects_invalid_utf8() {
        let input = ParseInput::new("bad.txt", &[0xff, 0xfe, 0x00]);
        assert!(matches!(input.text(), Err(FormatError::NotUtf8 { .. })));
    }

    #[test]
    fn warning_display() {
        let warning = ParseWarning::new("line 4", "unrecognized token 'q.3'");
        assert_eq!(warning.to_string(), "line 4: unrecognized token 'q.3'");
    }
}
