//! Format detection and file-level parsing entry points.
//!
//! Detection tries the file extension first, then sniffs content: MIDI magic
//! bytes, the tab-file JSON header, alpha-notation directives, and finally
//! plain UTF-8 text. An explicit format hint from the caller always wins.

use std::{fs, path::Path, str};

use fret_document::SourceFormat;
use tracing::debug;

use crate::{
    AlphaParser, AsciiParser, FormatError, FormatParser, MidiParser, ParseInput, ParseOutcome,
    TabFileParser,
};

/// Standard MIDI file magic bytes.
const MIDI_MAGIC: &[u8] = b"MThd";

/// Returns the parser for a format, or `None` for formats with no byte-level
/// parser.
///
/// `ChordChart` is an output classification of the ASCII parser, so both it
/// and `AsciiTab` map to [`AsciiParser`]. `WebText` never arrives as raw
/// bytes; scraped pages enter the pipeline through their own adapter.
pub fn parser_for(format: SourceFormat) -> Option<Box<dyn FormatParser>> {
    match format {
        SourceFormat::TabFile => Some(Box::new(TabFileParser::new())),
        SourceFormat::Midi => Some(Box::new(MidiParser::new())),
        SourceFormat::AsciiTab | SourceFormat::ChordChart => Some(Box::new(AsciiParser::new())),
        SourceFormat::AlphaNotation => Some(Box::new(AlphaParser::new())),
        SourceFormat::WebText => None,
    }
}

/// Detects the format of a source from its path and bytes.
///
/// Extension mapping is authoritative when it matches; otherwise the content
/// is sniffed. Returns `None` when nothing matches (binary data with no
/// recognized magic).
pub fn detect_format(path: &Path, data: &[u8]) -> Option<SourceFormat> {
    for parser in all_parsers() {
        if parser.can_parse(path) {
            return Some(parser.format());
        }
    }
    sniff(data)
}

/// Content-based detection for sources with unhelpful extensions.
fn sniff(data: &[u8]) -> Option<SourceFormat> {
    if data.starts_with(MIDI_MAGIC) {
        return Some(SourceFormat::Midi);
    }

    let text = str::from_utf8(data).ok()?;
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') && trimmed.contains("\"tabfile\"") {
        return Some(SourceFormat::TabFile);
    }
    if text
        .lines()
        .map(str::trim)
        .any(|l| l.starts_with("\\title") || l.starts_with("\\tempo"))
    {
        return Some(SourceFormat::AlphaNotation);
    }
    if !text.trim().is_empty() {
        return Some(SourceFormat::AsciiTab);
    }
    None
}

/// Parses raw bytes, detecting the format unless a hint is given.
pub fn parse_bytes(
    source: &str,
    data: &[u8],
    hint: Option<SourceFormat>,
) -> Result<ParseOutcome, FormatError> {
    let format = match hint {
        Some(format) => format,
        None => {
            detect_format(Path::new(source), data).ok_or_else(|| FormatError::UnknownFormat {
                source: source.to_string(),
            })?
        }
    };
    debug!(source, format = format.as_str(), "parsing source");

    let parser = parser_for(format).ok_or_else(|| FormatError::UnknownFormat {
        source: source.to_string(),
    })?;
    parser.parse(&ParseInput::new(source, data))
}

/// Reads a file and parses it, detecting the format unless a hint is given.
pub fn parse_file(path: &Path, hint: Option<SourceFormat>) -> Result<ParseOutcome, FormatError> {
    let data = fs::read(path).map_err(|source| FormatError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bytes(&path.to_string_lossy(), &data, hint)
}

/// All byte-level parsers, in detection precedence order.
fn all_parsers() -> [Box<dyn FormatParser>; 4] {
    [
        Box::new(TabFileParser::new()),
        Box::new(MidiParser::new()),
        Box::new(AlphaParser::new()),
        Box::new(AsciiParser::new()),
    ]
}
