//! Topic and difficulty tagging for fret chunks.
//!
//! Turns chunk candidates into finalized [`ChunkMetadata`]: provenance from
//! the owning document and section, plus best-effort `topic` and `difficulty`
//! tags from an injectable [`Tagger`]. The default [`KeywordTagger`] matches
//! fixed keyword vocabularies against the chunk text. Tagging only applies to
//! prose-bearing chunks; purely structural chunks (measures, note events)
//! carry the `"unknown"` sentinel, since their terse renderings have no
//! vocabulary to match.

#![warn(missing_docs)]

use fret_document::{ChunkMetadata, Document, RawChunk, UNKNOWN};

/// Topic and difficulty produced by a [`Tagger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tags {
    /// Topic tag (`chords`, `scales`, ..., or a fallback).
    pub topic: String,
    /// Difficulty tag (`beginner`, `intermediate`, `advanced`, or a fallback).
    pub difficulty: String,
}

/// A tagging strategy for chunk text.
///
/// Injectable so a trained classifier can replace the keyword heuristic
/// without changing the pipeline contract.
pub trait Tagger {
    /// Tags one chunk's text with a topic and a difficulty.
    fn tag(&self, text: &str) -> Tags;
}

/// Ordered topic vocabulary: first matching topic wins.
const TOPICS: &[(&str, &[&str])] = &[
    ("chords", &["chord", "progression", "harmony"]),
    ("scales", &["scale", "mode", "key"]),
    ("rhythm", &["rhythm", "tempo", "beat"]),
    ("technique", &["technique", "fingering", "exercise"]),
    ("theory", &["theory", "interval", "note"]),
];

/// Keywords that mark beginner content.
const BEGINNER: &[&str] = &["beginner", "basic", "introduction", "start"];
/// Keywords that mark advanced content.
const ADVANCED: &[&str] = &["advanced", "expert", "complex"];

/// Keyword-vocabulary tagger.
///
/// Topics are checked in order against the lowercased text; the first
/// vocabulary with a hit wins, falling back to `general`. Difficulty falls
/// back to `intermediate`.
#[derive(Debug, Clone)]
pub struct KeywordTagger {
    /// Ordered `(topic, keywords)` vocabulary.
    topics: Vec<(String, Vec<String>)>,
}

impl KeywordTagger {
    /// Creates a tagger with the default vocabularies.
    pub fn new() -> Self {
        Self {
            topics: TOPICS
                .iter()
                .map(|(topic, words)| {
                    (
                        (*topic).to_string(),
                        words.iter().map(|w| (*w).to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Creates a tagger with a custom ordered topic vocabulary.
    pub fn with_topics(topics: Vec<(String, Vec<String>)>) -> Self {
        Self { topics }
    }
}

impl Default for KeywordTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl Tagger for KeywordTagger {
    fn tag(&self, text: &str) -> Tags {
        let lower = text.to_lowercase();

        let topic = self
            .topics
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w.as_str())))
            .map_or_else(|| "general".to_string(), |(topic, _)| topic.clone());

        let difficulty = if BEGINNER.iter().any(|w| lower.contains(w)) {
            "beginner"
        } else if ADVANCED.iter().any(|w| lower.contains(w)) {
            "advanced"
        } else {
            "intermediate"
        };

        Tags {
            topic,
            difficulty: difficulty.to_string(),
        }
    }
}

/// Builds the finalized metadata for one chunk candidate.
///
/// Provenance (`source`, `format`, `position`, `section`, `instrument`,
/// `tempo`) comes from the document and the candidate. Tags come from the
/// tagger for prose-bearing chunks; purely structural chunks get the
/// [`UNKNOWN`] sentinel for both.
pub fn enrich(
    source: &str,
    doc: &Document,
    chunk: &RawChunk,
    tagger: &dyn Tagger,
) -> ChunkMetadata {
    let has_prose = chunk.units.iter().any(|u| !u.is_structured());
    let tags = if has_prose {
        tagger.tag(&chunk.text)
    } else {
        Tags {
            topic: UNKNOWN.to_string(),
            difficulty: UNKNOWN.to_string(),
        }
    };

    ChunkMetadata {
        source: source.to_string(),
        format: doc.format.as_str().to_string(),
        difficulty: tags.difficulty,
        topic: tags.topic,
        position: chunk.position,
        section: chunk.section_name.clone(),
        instrument: chunk.instrument.clone(),
        tempo: doc
            .metadata
            .get("tempo")
            .and_then(|t| t.parse::<u32>().ok()),
    }
}
