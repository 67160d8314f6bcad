//! Budget-bounded chunking of parsed documents.
//!
//! Splits a [`Document`](crate::Document) into ordered chunk candidates:
//! - Units are grouped until the rendered text would exceed the character budget
//! - A single unit is never split across two chunks, even when it exceeds the
//!   budget by itself
//! - Sections never share a chunk; empty sections produce nothing

use std::mem;

use crate::{Document, Section, Unit};

/// An ordered chunk candidate produced by [`chunk_document`].
///
/// Candidates carry no identity or tags yet; the identifier registry and the
/// metadata enricher finalize them into [`Chunk`](crate::Chunk)s.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChunk {
    /// Rendered text of the grouped units, newline-joined.
    pub text: String,
    /// Zero-based position within the document, gap-free in source order.
    pub position: usize,
    /// Index of the owning section within the document.
    pub section_index: usize,
    /// Name of the owning section.
    pub section_name: String,
    /// Instrument of the owning section, when declared.
    pub instrument: Option<String>,
    /// The units grouped into this chunk, in source order.
    pub units: Vec<Unit>,
}

/// Splits a document into chunk candidates bounded by `budget` characters.
///
/// Positions are assigned 0..n across the whole document, so chunks can be
/// reassembled in source order. Units that render to empty text are skipped
/// and consume no position.
pub fn chunk_document(doc: &Document, budget: usize) -> Vec<RawChunk> {
    let mut chunks = Vec::new();
    let mut position = 0usize;

    for (section_index, section) in doc.sections.iter().enumerate() {
        let mut pending_text = String::new();
        let mut pending_units: Vec<Unit> = Vec::new();

        for unit in &section.units {
            let rendered = unit.render();
            if rendered.trim().is_empty() {
                continue;
            }

            // +1 for the joining newline
            let would_be = if pending_text.is_empty() {
                rendered.len()
            } else {
                pending_text.len() + 1 + rendered.len()
            };

            if !pending_units.is_empty() && would_be > budget {
                chunks.push(flush(
                    &mut pending_text,
                    &mut pending_units,
                    &mut position,
                    section_index,
                    section,
                ));
            }

            if !pending_text.is_empty() {
                pending_text.push('\n');
            }
            pending_text.push_str(&rendered);
            pending_units.push(unit.clone());
        }

        if !pending_units.is_empty() {
            chunks.push(flush(
                &mut pending_text,
                &mut pending_units,
                &mut position,
                section_index,
                section,
            ));
        }
    }

    chunks
}

/// Drains the pending units into a chunk candidate and advances the position.
fn flush(
    text: &mut String,
    units: &mut Vec<Unit>,
    position: &mut usize,
    section_index: usize,
    section: &Section,
) -> RawChunk {
    let chunk = RawChunk {
        text: mem::take(text),
        position: *position,
        section_index,
        section_name: section.name.clone(),
        instrument: section.instrument.clone(),
        units: mem::take(units),
    };
    *position += 1;
    chunk
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Note, Section, SourceFormat};

    fn doc_with_sections(sections: Vec<Section>) -> Document {
        let mut doc = Document::new("Test", SourceFormat::AlphaNotation);
        doc.sections = sections;
        doc
    }

    fn measure(number: u32, frets: &[(u8, u8)]) -> Unit {
        Unit::Measure {
            number,
            notes: frets
                .iter()
                .map(|&(string, fret)| Note { string, fret })
                .collect(),
            chords: vec![],
        }
    }

    #[test]
    fn small_section_is_one_chunk() {
        let mut section = Section::new("Intro");
        section.units.push(measure(1, &[(3, 5)]));
        section.units.push(measure(2, &[(4, 7)]));
        let doc = doc_with_sections(vec![section]);

        let chunks = chunk_document(&doc, 1000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].position, 0);
        assert_eq!(chunks[0].text, "m1: 3.5\nm2: 4.7");
        assert_eq!(chunks[0].units.len(), 2);
    }

    #[test]
    fn large_section_splits_at_unit_boundaries() {
        let mut section = Section::new("Verse");
        for n in 1..=4 {
            section.units.push(measure(n, &[(3, 5), (4, 7), (5, 9)]));
        }
        let doc = doc_with_sections(vec![section]);

        // Each measure renders to ~16 chars; a 20-char budget forces one per chunk.
        let chunks = chunk_document(&doc, 20);
        assert_eq!(chunks.len(), 4);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.position, i);
            assert_eq!(chunk.units.len(), 1);
        }
    }

    #[test]
    fn oversized_unit_is_never_split() {
        let long_text = "x".repeat(500);
        let mut section = Section::new("Notes");
        section.units.push(Unit::Paragraph(long_text.clone()));
        let doc = doc_with_sections(vec![section]);

        let chunks = chunk_document(&doc, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, long_text);
    }

    #[test]
    fn empty_section_produces_no_chunks() {
        let doc = doc_with_sections(vec![Section::new("Empty")]);
        assert!(chunk_document(&doc, 100).is_empty());
    }

    #[test]
    fn empty_units_are_skipped() {
        let mut section = Section::new("Sparse");
        section.units.push(measure(1, &[]));
        section.units.push(Unit::Paragraph("  ".into()));
        section.units.push(measure(2, &[(1, 0)]));
        let doc = doc_with_sections(vec![section]);

        let chunks = chunk_document(&doc, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "m2: 1.0");
        assert_eq!(chunks[0].units.len(), 1);
    }

    #[test]
    fn sections_never_share_a_chunk() {
        let mut first = Section::new("A");
        first.units.push(measure(1, &[(3, 5)]));
        let mut second = Section::new("B");
        second.units.push(measure(1, &[(3, 5)]));
        let doc = doc_with_sections(vec![first, second]);

        let chunks = chunk_document(&doc, 10_000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].section_name, "A");
        assert_eq!(chunks[1].section_name, "B");
        assert_eq!(chunks[1].position, 1);
    }

    #[test]
    fn positions_are_gap_free_across_sections() {
        let mut sections = Vec::new();
        for name in ["A", "B", "C"] {
            let mut section = Section::new(name);
            for n in 1..=3 {
                section.units.push(measure(n, &[(3, 5), (4, 7)]));
            }
            sections.push(section);
        }
        // An empty section in the middle must not create a gap.
        sections.insert(1, Section::new("empty"));
        let doc = doc_with_sections(sections);

        let chunks = chunk_document(&doc, 12);
        let positions: Vec<usize> = chunks.iter().map(|c| c.position).collect();
        let expected: Vec<usize> = (0..chunks.len()).collect();
        assert_eq!(positions, expected);
    }

    #[test]
    fn instrument_propagates_to_candidates() {
        let mut section = Section::new("Lead");
        section.instrument = Some("guitar".into());
        section.units.push(measure(1, &[(3, 5)]));
        let doc = doc_with_sections(vec![section]);

        let chunks = chunk_document(&doc, 100);
        assert_eq!(chunks[0].instrument.as_deref(), Some("guitar"));
    }
}
