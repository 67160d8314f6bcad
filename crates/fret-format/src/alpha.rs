//! Alpha-notation parser.
//!
//! Alpha notation is a simplified textual tablature format, line-oriented:
//!
//! ```text
//! \title Stairway
//! \tempo 120
//! [Intro @ guitar]
//! 3.5 4.7 Em
//! # comment lines and blank lines are ignored
//! 3.5 4.7 4.5
//! ```
//!
//! Directives (`\title`, `\artist`, `\album`, `\tempo`) populate the document
//! metadata. `[name]` or `[name @ instrument]` lines open a new section. Each
//! content line inside a section becomes one measure; `<string>.<fret>` tokens
//! become notes and chord symbols become chord annotations. Malformed tokens
//! are skipped with a warning, never aborting the line or the file.

use std::{path::Path, sync::LazyLock};

use fret_document::{Document, Note, Section, SourceFormat, Unit};
use regex::Regex;

use crate::{FormatError, FormatParser, ParseInput, ParseOutcome, ParseWarning, chord};

/// Comment marker: lines starting with this are ignored.
const COMMENT_MARKER: char = '#';

/// `<string>.<fret>` fret-pair token.
static FRET_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\.(\d{1,2})$").expect("fret token pattern is valid"));

/// Highest string number accepted (covers extended-range instruments).
const MAX_STRING: u8 = 12;
/// Highest fret number accepted.
const MAX_FRET: u8 = 30;

/// Line-oriented state of the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before any section marker; only directives and comments are expected.
    ExpectDirectiveOrSection,
    /// Inside a section; content lines become measures.
    InSection,
}

/// Parser for alpha-notation files.
#[derive(Debug, Default)]
pub struct AlphaParser;

impl AlphaParser {
    /// Creates a new alpha-notation parser.
    pub fn new() -> Self {
        Self
    }
}

impl FormatParser for AlphaParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::AlphaNotation
    }

    fn can_parse(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("tab") || ext.eq_ignore_ascii_case("alpha"))
    }

    fn parse(&self, input: &ParseInput<'_>) -> Result<ParseOutcome, FormatError> {
        let text = input.text()?;

        let mut doc = Document::new(input.source_stem(), SourceFormat::AlphaNotation);
        let mut warnings = Vec::new();
        let mut state = State::ExpectDirectiveOrSection;
        let mut current: Option<Section> = None;
        let mut measure_counter = 0u32;

        for (line_no, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            let label = format!("line {}", line_no + 1);

            if line.is_empty() || line.starts_with(COMMENT_MARKER) {
                continue;
            }

            if let Some(directive) = line.strip_prefix('\\') {
                apply_directive(&mut doc, directive, &label, &mut warnings);
                continue;
            }

            if let Some((name, instrument)) = section_marker(line) {
                if let Some(section) = current.take() {
                    doc.sections.push(section);
                }
                let mut section = Section::new(name);
                section.instrument = instrument;
                current = Some(section);
                measure_counter = 0;
                state = State::InSection;
                continue;
            }

            match state {
                State::ExpectDirectiveOrSection => {
                    warnings.push(ParseWarning::new(
                        label,
                        "content before any section marker, skipped",
                    ));
                }
                State::InSection => {
                    measure_counter += 1;
                    let unit = parse_measure_line(line, measure_counter, &label, &mut warnings);
                    if let Some(section) = current.as_mut() {
                        section.units.push(unit);
                    }
                }
            }
        }

        // End of input closes any open section.
        if let Some(section) = current.take() {
            doc.sections.push(section);
        }

        if let Some(title) = doc.metadata.get("title") {
            doc.title = title.clone();
        }

        Ok(ParseOutcome {
            documents: vec![doc],
            warnings,
        })
    }
}

/// Applies a `\key value` directive to the document metadata.
fn apply_directive(
    doc: &mut Document,
    directive: &str,
    label: &str,
    warnings: &mut Vec<ParseWarning>,
) {
    let (key, value) = match directive.split_once(char::is_whitespace) {
        Some((key, value)) => (key, value.trim()),
        None => (directive, ""),
    };

    match key {
        "title" | "artist" | "album" => {
            if value.is_empty() {
                warnings.push(ParseWarning::new(label, format!("\\{key} with no value")));
            } else {
                doc.metadata.insert(key.to_string(), value.to_string());
            }
        }
        "tempo" => match value.parse::<u32>() {
            Ok(tempo) => {
                doc.metadata.insert("tempo".to_string(), tempo.to_string());
            }
            Err(_) => warnings.push(ParseWarning::new(
                label,
                format!("\\tempo value '{value}' is not an integer"),
            )),
        },
        other => warnings.push(ParseWarning::new(
            label,
            format!("unknown directive '\\{other}'"),
        )),
    }
}

/// Recognizes `[name]` / `[name @ instrument]` section markers.
fn section_marker(line: &str) -> Option<(String, Option<String>)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?.trim();
    if inner.is_empty() {
        return None;
    }
    match inner.split_once('@') {
        Some((name, instrument)) => Some((
            name.trim().to_string(),
            Some(instrument.trim().to_string()).filter(|s| !s.is_empty()),
        )),
        None => Some((inner.to_string(), None)),
    }
}

/// Parses one content line into a measure unit.
///
/// Tokens that are neither fret pairs nor chord symbols are skipped with a
/// warning; the rest of the line still contributes.
fn parse_measure_line(
    line: &str,
    number: u32,
    label: &str,
    warnings: &mut Vec<ParseWarning>,
) -> Unit {
    let mut notes = Vec::new();
    let mut chords = Vec::new();

    for token in line.split_whitespace() {
        if let Some(caps) = FRET_TOKEN.captures(token) {
            // Both groups are 1-2 digits, so parsing cannot overflow u8.
            let string: u8 = caps[1].parse().unwrap_or(0);
            let fret: u8 = caps[2].parse().unwrap_or(0);
            if string == 0 || string > MAX_STRING {
                warnings.push(ParseWarning::new(
                    label.to_string(),
                    format!("string {string} out of range in '{token}'"),
                ));
            } else if fret > MAX_FRET {
                warnings.push(ParseWarning::new(
                    label.to_string(),
                    format!("fret {fret} out of range in '{token}'"),
                ));
            } else {
                notes.push(Note { string, fret });
            }
        } else if chord::is_chord_symbol(token) {
            chords.push(token.to_string());
        } else {
            warnings.push(ParseWarning::new(
                label.to_string(),
                format!("unrecognized token '{token}'"),
            ));
        }
    }

    Unit::Measure {
        number,
        notes,
        chords,
    }
}
