//! MIDI parser.
//!
//! Decodes standard MIDI files with `midly`, pairs note-on/note-off events
//! into [`Unit::NoteEvent`]s with wall-clock timing, and groups them into
//! measure-like sections using the file's declared time signature and tempo.
//! Files without a metrical timebase (SMPTE timecode) or without a time
//! signature fall back to fixed-size time windows. Percussion (channel 9) is
//! skipped. Malformed bytes are a decode error; unterminated notes are
//! warnings.

use std::{cmp::Ordering, collections::HashMap, path::Path};

use fret_document::{Document, Section, SourceFormat, Unit};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use tracing::debug;

use crate::{FormatError, FormatParser, ParseInput, ParseOutcome, ParseWarning};

/// Microseconds per quarter note when the file declares no tempo (120 BPM).
const DEFAULT_TEMPO_US: u32 = 500_000;

/// Window length when no measure length can be derived.
const FALLBACK_WINDOW_SECS: f64 = 2.0;

/// The GM percussion channel.
const PERCUSSION_CHANNEL: u8 = 9;

/// Parser for standard MIDI files.
#[derive(Debug, Default)]
pub struct MidiParser;

impl MidiParser {
    /// Creates a new MIDI parser.
    pub fn new() -> Self {
        Self
    }
}

impl FormatParser for MidiParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Midi
    }

    fn can_parse(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mid") || ext.eq_ignore_ascii_case("midi"))
    }

    fn parse(&self, input: &ParseInput<'_>) -> Result<ParseOutcome, FormatError> {
        let smf = Smf::parse(input.data)
            .map_err(|e| FormatError::decode(input.source, SourceFormat::Midi, e.to_string()))?;

        let mut warnings = Vec::new();
        let declared = scan_declarations(&smf);

        // Seconds per tick from the timebase. Tempo changes mid-file are
        // collapsed to the first declared tempo.
        let seconds_per_tick = match smf.header.timing {
            Timing::Metrical(ppq) => {
                declared.tempo_us as f64 / 1_000_000.0 / f64::from(ppq.as_int())
            }
            Timing::Timecode(fps, subframe) => {
                1.0 / (f64::from(fps.as_f32()) * f64::from(subframe))
            }
        };

        let (window_secs, windowed_by_measure) = window_length(&smf.header.timing, &declared);

        let mut events = extract_note_events(&smf, seconds_per_tick, &mut warnings);
        events.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        debug!(
            source = input.source,
            events = events.len(),
            window_secs,
            "midi events extracted"
        );

        let title = declared
            .track_name
            .clone()
            .unwrap_or_else(|| input.source_stem().to_string());
        let mut doc = Document::new(title, SourceFormat::Midi);
        doc.metadata.insert(
            "tempo".to_string(),
            (60_000_000 / declared.tempo_us.max(1)).to_string(),
        );
        if let Some((num, den)) = declared.time_signature {
            doc.metadata
                .insert("time_signature".to_string(), format!("{num}/{den}"));
        }

        // Group contiguous events into measure-like sections.
        let prefix = if windowed_by_measure {
            "measure"
        } else {
            "window"
        };
        let mut sections: Vec<(usize, Section)> = Vec::new();
        for (start, pitch, duration, velocity) in events {
            let index = (start / window_secs).floor() as usize;
            let section = match sections.last_mut() {
                Some((last_index, section)) if *last_index == index => section,
                _ => {
                    sections.push((index, Section::new(format!("{prefix} {}", index + 1))));
                    &mut sections.last_mut().expect("just pushed").1
                }
            };
            section.units.push(Unit::NoteEvent {
                pitch,
                start,
                duration,
                velocity,
            });
        }
        doc.sections = sections.into_iter().map(|(_, s)| s).collect();

        Ok(ParseOutcome {
            documents: vec![doc],
            warnings,
        })
    }
}

/// Declarations scanned from meta events before note extraction.
struct Declarations {
    /// First declared tempo, microseconds per quarter note.
    tempo_us: u32,
    /// First declared time signature (numerator, denominator).
    time_signature: Option<(u8, u16)>,
    /// First non-empty track name.
    track_name: Option<String>,
}

/// Scans all tracks for the first tempo, time signature, and track name.
fn scan_declarations(smf: &Smf<'_>) -> Declarations {
    let mut declared = Declarations {
        tempo_us: DEFAULT_TEMPO_US,
        time_signature: None,
        track_name: None,
    };
    let mut tempo_seen = false;

    for track in &smf.tracks {
        for event in track {
            if let TrackEventKind::Meta(meta) = &event.kind {
                match meta {
                    MetaMessage::Tempo(us) if !tempo_seen => {
                        declared.tempo_us = us.as_int();
                        tempo_seen = true;
                    }
                    MetaMessage::TimeSignature(num, den_pow, _, _)
                        if declared.time_signature.is_none() =>
                    {
                        // Denominator is a power of two; clamp the exponent so
                        // a garbage byte cannot overflow the shift.
                        declared.time_signature = Some((*num, 1u16 << (*den_pow).min(8)));
                    }
                    MetaMessage::TrackName(name) if declared.track_name.is_none() => {
                        let name = String::from_utf8_lossy(name).trim().to_string();
                        if !name.is_empty() {
                            declared.track_name = Some(name);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    declared
}

/// Derives the section window length in seconds.
///
/// With a metrical timebase and a declared time signature, the window is one
/// measure; otherwise a fixed window is used.
fn window_length(timing: &Timing, declared: &Declarations) -> (f64, bool) {
    if let (Timing::Metrical(_), Some((num, den))) = (timing, declared.time_signature) {
        let quarter_secs = f64::from(declared.tempo_us) / 1_000_000.0;
        let measure = quarter_secs * f64::from(num) * 4.0 / f64::from(den);
        if measure > f64::EPSILON {
            return (measure, true);
        }
    }
    (FALLBACK_WINDOW_SECS, false)
}

/// Pairs note-on/note-off events into `(start, pitch, duration, velocity)`.
fn extract_note_events(
    smf: &Smf<'_>,
    seconds_per_tick: f64,
    warnings: &mut Vec<ParseWarning>,
) -> Vec<(f64, u8, f64, u8)> {
    let mut events = Vec::new();

    for (track_index, track) in smf.tracks.iter().enumerate() {
        let mut ticks = 0u64;
        // Active notes keyed by (channel, pitch).
        let mut active: HashMap<(u8, u8), (f64, u8)> = HashMap::new();

        for event in track {
            ticks += u64::from(event.delta.as_int());
            let now = ticks as f64 * seconds_per_tick;

            let TrackEventKind::Midi { channel, message } = &event.kind else {
                continue;
            };
            let channel = channel.as_int();
            if channel == PERCUSSION_CHANNEL {
                continue;
            }

            match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                    active.insert((channel, key.as_int()), (now, vel.as_int()));
                }
                MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                    if let Some((start, velocity)) = active.remove(&(channel, key.as_int())) {
                        events.push((start, key.as_int(), (now - start).max(0.0), velocity));
                    }
                }
                _ => {}
            }
        }

        if !active.is_empty() {
            warnings.push(ParseWarning::new(
                format!("track {}", track_index + 1),
                format!("{} unterminated note(s) dropped", active.len()),
            ));
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a minimal single-track SMF with the given track event bytes.
    fn smf_bytes(track_events: &[u8]) -> Vec<u8> {
        let mut track = track_events.to_vec();
        track.extend_from_slice(&[0x00, 0xff, 0x2f, 0x00]); // end of track
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"MThd");
        bytes.extend_from_slice(&6u32.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes()); // format 0
        bytes.extend_from_slice(&1u16.to_be_bytes()); // one track
        bytes.extend_from_slice(&480u16.to_be_bytes()); // ppq
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&track);
        bytes
    }

    fn parse(data: &[u8]) -> Result<ParseOutcome, FormatError> {
        MidiParser::new().parse(&ParseInput::new("riff.mid", data))
    }

    #[test]
    fn malformed_bytes_are_a_decode_error() {
        assert!(matches!(
            parse(b"definitely not midi"),
            Err(FormatError::Decode { .. })
        ));
        assert!(matches!(parse(b""), Err(FormatError::Decode { .. })));
    }

    #[test]
    fn note_pairs_become_events() {
        // note-on C4 vel 90, then note-off one beat (480 ticks) later
        let track = [
            0x00, 0x90, 60, 90, // delta 0, note on ch0
            0x83, 0x60, 0x80, 60, 0, // delta 480, note off
        ];
        let outcome = parse(&smf_bytes(&track)).unwrap();
        let doc = &outcome.documents[0];
        assert_eq!(doc.format, SourceFormat::Midi);
        assert_eq!(doc.sections.len(), 1);

        match &doc.sections[0].units[0] {
            Unit::NoteEvent {
                pitch,
                start,
                duration,
                velocity,
            } => {
                assert_eq!(*pitch, 60);
                assert_eq!(*velocity, 90);
                assert!(*start < 1e-9);
                // 480 ticks at 480 ppq and default 120 BPM = 0.5s
                assert!((duration - 0.5).abs() < 1e-9);
            }
            other => panic!("expected note event, got {other:?}"),
        }
    }

    #[test]
    fn note_on_with_zero_velocity_closes_the_note() {
        let track = [
            0x00, 0x90, 64, 80, // note on
            0x83, 0x60, 0x90, 64, 0, // note on vel 0 == note off
        ];
        let outcome = parse(&smf_bytes(&track)).unwrap();
        assert_eq!(outcome.documents[0].sections[0].units.len(), 1);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn unterminated_note_is_a_warning_not_an_error() {
        let track = [0x00, 0x90, 60, 90]; // note on, never released
        let outcome = parse(&smf_bytes(&track)).unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].reason.contains("unterminated"));
        assert!(outcome.documents[0].sections.is_empty());
    }

    #[test]
    fn percussion_channel_is_skipped() {
        let track = [
            0x00, 0x99, 36, 100, // note on ch9 (percussion)
            0x83, 0x60, 0x89, 36, 0, // note off ch9
        ];
        let outcome = parse(&smf_bytes(&track)).unwrap();
        assert!(outcome.documents[0].sections.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn time_signature_creates_measure_sections() {
        // 1/4 time => one measure per beat (0.5s at default tempo), so two
        // notes a beat apart land in different measures.
        let track = [
            0x00, 0xff, 0x58, 0x04, 1, 2, 24, 8, // time signature 1/4
            0x00, 0x90, 60, 90, //
            0x60, 0x80, 60, 0, // off after 96 ticks
            0x8A, 0x20, 0x90, 62, 90, // on at tick 1408 (measure 3)
            0x60, 0x80, 62, 0, //
        ];
        let outcome = parse(&smf_bytes(&track)).unwrap();
        let doc = &outcome.documents[0];
        assert_eq!(
            doc.metadata.get("time_signature").map(String::as_str),
            Some("1/4")
        );
        assert_eq!(doc.sections.len(), 2);
        assert!(doc.sections[0].name.starts_with("measure "));
        assert_ne!(doc.sections[0].name, doc.sections[1].name);
    }

    #[test]
    fn no_time_signature_falls_back_to_fixed_windows() {
        let track = [
            0x00, 0x90, 60, 90, //
            0x83, 0x60, 0x80, 60, 0, //
        ];
        let outcome = parse(&smf_bytes(&track)).unwrap();
        assert!(outcome.documents[0].sections[0].name.starts_with("window "));
    }

    #[test]
    fn tempo_lands_in_metadata() {
        // tempo meta: 0x07a120 = 500000 us/qn = 120 BPM
        let track = [
            0x00, 0xff, 0x51, 0x03, 0x07, 0xa1, 0x20, //
            0x00, 0x90, 60, 90, //
            0x60, 0x80, 60, 0, //
        ];
        let outcome = parse(&smf_bytes(&track)).unwrap();
        assert_eq!(
            outcome.documents[0].metadata.get("tempo").map(String::as_str),
            Some("120")
        );
    }

    #[test]
    fn can_parse_by_extension() {
        let parser = MidiParser::new();
        assert!(parser.can_parse(Path::new("song.mid")));
        assert!(parser.can_parse(Path::new("song.MIDI")));
        assert!(!parser.can_parse(Path::new("song.tab")));
    }
}
