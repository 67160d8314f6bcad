//! Structured tab-file container parser.
//!
//! Tab files are versioned JSON containers (`.tab.json`) describing tracks,
//! measures, string/fret beats, and chord annotations:
//!
//! ```json
//! {
//!   "tabfile": 1,
//!   "title": "Yellow",
//!   "tempo": 120,
//!   "tracks": [
//!     {
//!       "name": "Guitar",
//!       "instrument": "guitar",
//!       "measures": [
//!         { "notes": [{ "string": 3, "fret": 5 }], "chords": ["Em"] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! A missing or unsupported `tabfile` header (or undecodable JSON) is the
//! container-level equivalent of wrong magic bytes: a decode error, tallied as
//! one failed source. Out-of-range notes inside a measure are warnings; the
//! rest of the measure is kept.

use std::path::Path;

use fret_document::{Document, Note, Section, SourceFormat, Unit};
use serde::Deserialize;

use crate::{FormatError, FormatParser, ParseInput, ParseOutcome, ParseWarning};

/// Container versions this parser understands.
const SUPPORTED_VERSION: u32 = 1;

/// Highest string number accepted.
const MAX_STRING: u8 = 12;
/// Highest fret number accepted.
const MAX_FRET: u8 = 30;

/// Top-level container schema.
#[derive(Debug, Deserialize)]
struct Container {
    /// Container format version; required, acts as the magic header.
    tabfile: u32,
    /// Song title.
    title: Option<String>,
    /// Tempo in BPM.
    tempo: Option<u32>,
    /// Artist name.
    artist: Option<String>,
    /// Tracks, one section each.
    #[serde(default)]
    tracks: Vec<Track>,
}

/// One instrument track.
#[derive(Debug, Deserialize)]
struct Track {
    /// Track name.
    name: Option<String>,
    /// Instrument label.
    instrument: Option<String>,
    /// Percussion tracks carry no fret data and are skipped.
    #[serde(default)]
    percussion: bool,
    /// Measures in playback order.
    #[serde(default)]
    measures: Vec<Measure>,
}

/// One measure of one track.
#[derive(Debug, Deserialize)]
struct Measure {
    /// String/fret pairs sounded in this measure.
    #[serde(default)]
    notes: Vec<MeasureNote>,
    /// Chord symbols annotated on this measure.
    #[serde(default)]
    chords: Vec<String>,
}

/// A string/fret pair as stored in the container.
#[derive(Debug, Deserialize)]
struct MeasureNote {
    /// String number, 1-based.
    string: u8,
    /// Fret number, 0 = open.
    fret: u8,
}

/// Parser for structured tab-file containers.
#[derive(Debug, Default)]
pub struct TabFileParser;

impl TabFileParser {
    /// Creates a new tab-file parser.
    pub fn new() -> Self {
        Self
    }
}

impl FormatParser for TabFileParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::TabFile
    }

    fn can_parse(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.to_ascii_lowercase().ends_with(".tab.json"))
    }

    fn parse(&self, input: &ParseInput<'_>) -> Result<ParseOutcome, FormatError> {
        let container: Container = serde_json::from_slice(input.data)
            .map_err(|e| FormatError::decode(input.source, SourceFormat::TabFile, e.to_string()))?;

        if container.tabfile != SUPPORTED_VERSION {
            return Err(FormatError::decode(
                input.source,
                SourceFormat::TabFile,
                format!("unsupported container version {}", container.tabfile),
            ));
        }

        let title = container
            .title
            .clone()
            .unwrap_or_else(|| input.source_stem().to_string());
        let mut doc = Document::new(title, SourceFormat::TabFile);
        if let Some(tempo) = container.tempo {
            doc.metadata.insert("tempo".to_string(), tempo.to_string());
        }
        if let Some(artist) = &container.artist {
            doc.metadata.insert("artist".to_string(), artist.clone());
        }

        let mut warnings = Vec::new();

        for (track_index, track) in container.tracks.iter().enumerate() {
            if track.percussion {
                continue;
            }

            let name = track
                .name
                .clone()
                .unwrap_or_else(|| format!("track {}", track_index + 1));
            let mut section = Section::new(name.clone());
            section.instrument = track.instrument.clone();

            for (measure_index, measure) in track.measures.iter().enumerate() {
                let number = (measure_index + 1) as u32;
                let mut notes = Vec::new();
                for note in &measure.notes {
                    if note.string == 0 || note.string > MAX_STRING {
                        warnings.push(ParseWarning::new(
                            format!("{name} measure {number}"),
                            format!("string {} out of range, note skipped", note.string),
                        ));
                    } else if note.fret > MAX_FRET {
                        warnings.push(ParseWarning::new(
                            format!("{name} measure {number}"),
                            format!("fret {} out of range, note skipped", note.fret),
                        ));
                    } else {
                        notes.push(Note {
                            string: note.string,
                            fret: note.fret,
                        });
                    }
                }
                section.units.push(Unit::Measure {
                    number,
                    notes,
                    chords: measure.chords.clone(),
                });
            }

            doc.sections.push(section);
        }

        Ok(ParseOutcome {
            documents: vec![doc],
            warnings,
        })
    }
}
