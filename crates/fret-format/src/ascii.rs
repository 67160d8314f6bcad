//! ASCII tab and chord-chart parser.
//!
//! Line-oriented: each line is classified as a section header, a chord-symbol
//! line, a tab-fret line, or prose. Contiguous tab lines form one block unit,
//! chord lines become measure units carrying the symbols, and prose collects
//! into paragraph units. Recognized headers (Verse, Chorus, Bridge, ...) open
//! new sections, matching how the original tab archives segment songs.
//!
//! The emitted document's format is `chord-chart` when the source has chord
//! lines but no tab lines, otherwise `ascii-tab`.

use std::path::Path;

use fret_document::{Document, Section, SourceFormat, Unit};

use crate::{
    FormatError, FormatParser, ParseInput, ParseOutcome,
    chord::{is_chord_line, is_tab_line, section_header},
};

/// How one line was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    /// Blank line: flushes the pending block.
    Blank,
    /// Section header (Verse, Chorus, ...).
    Header,
    /// Line of chord symbols only.
    Chords,
    /// Tab-fret line.
    Tab,
    /// Anything else.
    Prose,
}

/// Classifies a single line.
fn classify(line: &str) -> LineKind {
    if line.trim().is_empty() {
        LineKind::Blank
    } else if section_header(line).is_some() {
        LineKind::Header
    } else if is_tab_line(line) {
        LineKind::Tab
    } else if is_chord_line(line) {
        LineKind::Chords
    } else {
        LineKind::Prose
    }
}

/// Parser for plain-text guitar tabs and chord charts.
#[derive(Debug, Default)]
pub struct AsciiParser;

impl AsciiParser {
    /// Creates a new ASCII tab/chord parser.
    pub fn new() -> Self {
        Self
    }
}

impl FormatParser for AsciiParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::AsciiTab
    }

    fn can_parse(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("crd"))
    }

    fn parse(&self, input: &ParseInput<'_>) -> Result<ParseOutcome, FormatError> {
        let text = input.text()?;

        let mut sections: Vec<Section> = Vec::new();
        let mut current = Section::new("body");
        let mut block: Vec<&str> = Vec::new();
        let mut block_kind = LineKind::Blank;
        let mut measure_counter = 0u32;
        let mut chord_lines = 0usize;
        let mut tab_lines = 0usize;

        for line in text.lines() {
            let kind = classify(line);

            // A change of line kind ends the pending tab/prose block.
            if kind != block_kind {
                flush_block(&mut current, &mut block, block_kind);
            }

            match kind {
                LineKind::Blank => {}
                LineKind::Header => {
                    if !current.units.is_empty() {
                        sections.push(current);
                    }
                    // Header text is guaranteed by the classification above.
                    let name = section_header(line).unwrap_or_else(|| "body".to_string());
                    current = Section::new(name);
                    measure_counter = 0;
                }
                LineKind::Chords => {
                    chord_lines += 1;
                    measure_counter += 1;
                    current.units.push(Unit::Measure {
                        number: measure_counter,
                        notes: vec![],
                        chords: line.split_whitespace().map(str::to_string).collect(),
                    });
                }
                LineKind::Tab => {
                    tab_lines += 1;
                    block.push(line.trim_end());
                }
                LineKind::Prose => block.push(line.trim()),
            }

            block_kind = kind;
        }

        flush_block(&mut current, &mut block, block_kind);
        if !current.units.is_empty() {
            sections.push(current);
        }

        let format = if chord_lines > 0 && tab_lines == 0 {
            SourceFormat::ChordChart
        } else {
            SourceFormat::AsciiTab
        };

        let mut doc = Document::new(input.source_stem(), format);
        doc.sections = sections;

        Ok(ParseOutcome {
            documents: vec![doc],
            warnings: Vec::new(),
        })
    }
}

/// Turns a pending tab or prose block into a paragraph unit.
fn flush_block(section: &mut Section, block: &mut Vec<&str>, kind: LineKind) {
    if block.is_empty() {
        return;
    }
    debug_assert!(matches!(kind, LineKind::Tab | LineKind::Prose));
    section.units.push(Unit::Paragraph(block.join("\n")));
    block.clear();
}
