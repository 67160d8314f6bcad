//! Document model and chunking for fret.
//!
//! This crate defines the intermediate document model that every format parser
//! produces, the chunker that splits documents into bounded-size candidates,
//! and the per-run identifier registry that guarantees chunk id uniqueness.
//! It supports:
//! - One uniform `Document` → `Section` → `Unit` shape across all input grammars
//! - Character-budget chunking that never splits a unit
//! - Content-derived chunk ids with collision disambiguation

#![warn(missing_docs)]

mod chunker;
mod id;

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

pub use chunker::{RawChunk, chunk_document};
pub use id::IdRegistry;

/// The input grammar a document was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    /// Structured tablature container file.
    TabFile,
    /// Standard MIDI file.
    Midi,
    /// Plain ASCII guitar tab text.
    AsciiTab,
    /// Chord-symbol chart text (chords without tab lines).
    ChordChart,
    /// Simplified textual tablature notation with backslash directives.
    AlphaNotation,
    /// Extracted text from a scraped web page.
    WebText,
}

impl SourceFormat {
    /// Stable lowercase name used in chunk metadata.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TabFile => "tab-file",
            Self::Midi => "midi",
            Self::AsciiTab => "ascii-tab",
            Self::ChordChart => "chord-chart",
            Self::AlphaNotation => "alpha-notation",
            Self::WebText => "web-text",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed representation of one input source.
///
/// Documents are ephemeral: a parser creates one per source, the chunker
/// consumes it, and only the emitted [`Chunk`]s outlive the pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document title (from the source's own metadata, or the source name).
    pub title: String,
    /// The input grammar this document was parsed from.
    pub format: SourceFormat,
    /// Ordered subdivisions (tracks, verses, measure windows, paragraphs).
    pub sections: Vec<Section>,
    /// Free-form source metadata (tempo, artist, album, url, ...).
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    /// Creates an empty document with the given title and format.
    pub fn new(title: impl Into<String>, format: SourceFormat) -> Self {
        Self {
            title: title.into(),
            format,
            sections: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Returns true if no section contains a unit with renderable content.
    pub fn is_empty(&self) -> bool {
        self.sections
            .iter()
            .all(|s| s.units.iter().all(|u| u.render().trim().is_empty()))
    }
}

/// A named subdivision of a document: a track, a verse, or a measure window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section name (track name, "Verse", "measure 3", ...).
    pub name: String,
    /// Instrument, when the source declares one.
    pub instrument: Option<String>,
    /// Ordered units within this section.
    pub units: Vec<Unit>,
}

impl Section {
    /// Creates an empty section with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instrument: None,
            units: Vec::new(),
        }
    }
}

/// A string/fret pair within a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// String number, 1 = highest-pitched string.
    pub string: u8,
    /// Fret number, 0 = open string.
    pub fret: u8,
}

/// The smallest structural element before chunking.
///
/// The variant depends on the source format: structured tab files and alpha
/// notation produce measures, MIDI produces note events, text formats produce
/// paragraphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Unit {
    /// A measure with fretted notes and detected chord symbols.
    Measure {
        /// 1-based measure number within the section's source.
        number: u32,
        /// String/fret pairs sounded in this measure.
        notes: Vec<Note>,
        /// Chord symbols annotated on this measure.
        chords: Vec<String>,
    },
    /// A single MIDI note event.
    NoteEvent {
        /// MIDI pitch (0-127).
        pitch: u8,
        /// Start time in seconds from the beginning of the file.
        start: f64,
        /// Duration in seconds.
        duration: f64,
        /// Note-on velocity (1-127).
        velocity: u8,
    },
    /// A block of plain text.
    Paragraph(String),
}

impl Unit {
    /// Renders the unit as embeddable text.
    ///
    /// A unit with no content (a measure with neither notes nor chords, an
    /// empty paragraph) renders to an empty string and is dropped by the
    /// chunker.
    pub fn render(&self) -> String {
        match self {
            Self::Measure {
                number,
                notes,
                chords,
            } => {
                if notes.is_empty() && chords.is_empty() {
                    return String::new();
                }
                let mut out = format!("m{number}:");
                for note in notes {
                    out.push_str(&format!(" {}.{}", note.string, note.fret));
                }
                if !chords.is_empty() {
                    out.push_str(&format!(" [{}]", chords.join(" ")));
                }
                out
            }
            Self::NoteEvent {
                pitch,
                start,
                duration,
                velocity,
            } => format!("p{pitch} @{start:.2} d{duration:.2} v{velocity}"),
            Self::Paragraph(text) => text.trim().to_string(),
        }
    }

    /// Returns true for structured (non-prose) units carried in `raw_units`.
    pub fn is_structured(&self) -> bool {
        !matches!(self, Self::Paragraph(_))
    }
}

/// Best-effort topic and difficulty tags carried on every chunk.
///
/// Absent values use the [`UNKNOWN`] sentinel, never an empty string.
pub const UNKNOWN: &str = "unknown";

/// Metadata attached to every finalized chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source identifier (file path or URL).
    pub source: String,
    /// Source format name (see [`SourceFormat::as_str`]).
    pub format: String,
    /// Difficulty tag, or [`UNKNOWN`].
    pub difficulty: String,
    /// Topic tag, or [`UNKNOWN`].
    pub topic: String,
    /// Zero-based position of this chunk within its source, in source order.
    pub position: usize,
    /// Name of the section this chunk came from.
    pub section: String,
    /// Instrument, when the owning section declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    /// Tempo in BPM, when the source declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tempo: Option<u32>,
}

/// The terminal, persisted record of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Globally unique identifier within the run.
    pub id: String,
    /// Non-empty text content for embedding.
    pub text: String,
    /// Provenance and tagging metadata.
    pub metadata: ChunkMetadata,
    /// Structured payload for non-text formats; absent for prose chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_units: Option<Vec<Unit>>,
}
