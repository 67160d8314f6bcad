//! The ingestion aggregator.
//!
//! Applies parse → chunk → identify → enrich per source, accumulating chunks
//! in source order plus a per-source tally. Failures are isolated: a source
//! that cannot be decoded, or that yields no usable content, gets a failed
//! tally entry and the run continues.

use std::{collections::BTreeMap, path::Path, slice};

use fret_document::{Chunk, Document, IdRegistry, SourceFormat, Unit, chunk_document};
use fret_enrich::{Tagger, enrich};
use fret_format::{FormatError, ParseOutcome, parse_bytes, parse_file};
use serde::Serialize;
use tracing::{info, warn};

use crate::{PipelineConfig, ScrapedPage};

/// Per-source ingestion counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceTally {
    /// Sources attempted under this key.
    pub attempted: u64,
    /// Sources that produced at least one chunk.
    pub succeeded: u64,
    /// Sources that failed to decode or produced nothing.
    pub failed: u64,
    /// Chunks emitted for this key.
    pub chunks_produced: u64,
}

/// The result of a pipeline run, ready for the persistence collaborator.
#[derive(Debug, Serialize)]
pub struct IngestOutput {
    /// All emitted chunks, in ingestion order.
    pub chunks: Vec<Chunk>,
    /// Per-source tallies, keyed by source identifier.
    pub tallies: BTreeMap<String, SourceTally>,
    /// Identifier collisions that were disambiguated.
    pub collisions: u64,
    /// Chunk candidates discarded for having no usable content.
    pub empty_discarded: u64,
}

/// Accumulates chunks and tallies across an ingestion run.
pub struct Aggregator {
    /// Chunk budget in characters.
    budget: usize,
    /// Minimum length for prose chunk text.
    min_content_len: usize,
    /// Tagging strategy for prose chunks.
    tagger: Box<dyn Tagger>,
    /// Per-run identifier registry.
    registry: IdRegistry,
    /// Emitted chunks, in ingestion order.
    chunks: Vec<Chunk>,
    /// Per-source tallies.
    tallies: BTreeMap<String, SourceTally>,
    /// Candidates discarded for having no usable content.
    empty_discarded: u64,
}

impl Aggregator {
    /// Creates an aggregator with an explicit budget, length floor, and
    /// tagging strategy.
    pub fn new(budget: usize, min_content_len: usize, tagger: Box<dyn Tagger>) -> Self {
        Self {
            budget,
            min_content_len,
            tagger,
            registry: IdRegistry::new(),
            chunks: Vec::new(),
            tallies: BTreeMap::new(),
            empty_discarded: 0,
        }
    }

    /// Creates an aggregator from a pipeline configuration, with the keyword
    /// tagger the configuration describes.
    pub fn with_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.chunk_budget,
            config.min_content_len,
            Box::new(config.tagger()),
        )
    }

    /// Ingests one file, detecting its format unless a hint is given.
    pub fn ingest_file(&mut self, path: &Path, hint: Option<SourceFormat>) {
        let source = path.to_string_lossy().into_owned();
        let result = parse_file(path, hint);
        self.ingest_result(&source, result);
    }

    /// Ingests raw bytes under the given source identifier.
    pub fn ingest_bytes(&mut self, source: &str, data: &[u8], hint: Option<SourceFormat>) {
        let result = parse_bytes(source, data, hint);
        self.ingest_result(source, result);
    }

    /// Ingests scraped pages, one source per page URL.
    pub fn ingest_scraped(&mut self, pages: Vec<ScrapedPage>) {
        for page in pages {
            let source = page.url.clone();
            let doc = page.into_document();
            let tally = self.tallies.entry(source.clone()).or_default();
            tally.attempted += 1;

            if doc.is_empty() {
                warn!(source, "scraped page has no extracted content");
                self.tallies.entry(source).or_default().failed += 1;
                continue;
            }

            let produced = self.emit_documents(&source, slice::from_ref(&doc));
            self.record_produced(&source, produced);
        }
    }

    /// Consumes the aggregator and returns the run's output.
    pub fn finish(self) -> IngestOutput {
        IngestOutput {
            chunks: self.chunks,
            tallies: self.tallies,
            collisions: self.registry.collisions(),
            empty_discarded: self.empty_discarded,
        }
    }

    /// Tallies one parse result and emits its chunks.
    fn ingest_result(&mut self, source: &str, result: Result<ParseOutcome, FormatError>) {
        self.tallies.entry(source.to_string()).or_default().attempted += 1;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(source, %error, "source failed to parse");
                self.tallies.entry(source.to_string()).or_default().failed += 1;
                return;
            }
        };

        for warning in &outcome.warnings {
            warn!(source, %warning, "parse warning");
        }

        let produced = self.emit_documents(source, &outcome.documents);
        self.record_produced(source, produced);
    }

    /// Chunks, identifies, and enriches the documents of one source.
    ///
    /// Emitted positions are renumbered 0..n per source across all of its
    /// documents, so discarded candidates never leave gaps.
    fn emit_documents(&mut self, source: &str, documents: &[Document]) -> u64 {
        let mut emitted = 0u64;

        for doc in documents {
            for mut raw in chunk_document(doc, self.budget) {
                let prose_only = raw.units.iter().all(|u| !u.is_structured());
                let too_short = raw.text.trim().len() < self.min_content_len;
                if raw.text.trim().is_empty() || (prose_only && too_short) {
                    self.empty_discarded += 1;
                    continue;
                }

                raw.position = emitted as usize;
                let id = self.registry.assign(source, raw.position, &raw.text);
                let metadata = enrich(source, doc, &raw, self.tagger.as_ref());
                let raw_units = raw
                    .units
                    .iter()
                    .any(Unit::is_structured)
                    .then_some(raw.units);

                self.chunks.push(Chunk {
                    id,
                    text: raw.text,
                    metadata,
                    raw_units,
                });
                emitted += 1;
            }
        }

        emitted
    }

    /// Records success or failure for one source after emission.
    fn record_produced(&mut self, source: &str, produced: u64) {
        let tally = self.tallies.entry(source.to_string()).or_default();
        tally.chunks_produced += produced;
        if produced == 0 {
            warn!(source, "source produced no chunks");
            tally.failed += 1;
        } else {
            info!(source, chunks = produced, "source ingested");
            tally.succeeded += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fret_enrich::KeywordTagger;

    fn aggregator() -> Aggregator {
        Aggregator::new(800, 10, Box::new(KeywordTagger::new()))
    }

    #[test]
    fn alpha_source_produces_tagged_chunks() {
        let mut agg = aggregator();
        agg.ingest_bytes("song.tab", b"\\tempo 120\n[Intro @ guitar]\n3.5 4.7 Em\n", None);
        let output = agg.finish();

        assert_eq!(output.chunks.len(), 1);
        let chunk = &output.chunks[0];
        assert_eq!(chunk.metadata.format, "alpha-notation");
        assert_eq!(chunk.metadata.section, "Intro");
        assert_eq!(chunk.metadata.instrument.as_deref(), Some("guitar"));
        assert_eq!(chunk.metadata.tempo, Some(120));
        assert!(chunk.raw_units.is_some());

        let tally = &output.tallies["song.tab"];
        assert_eq!(tally.attempted, 1);
        assert_eq!(tally.succeeded, 1);
        assert_eq!(tally.chunks_produced, 1);
    }

    #[test]
    fn malformed_midi_is_a_failed_tally_not_a_panic() {
        let mut agg = aggregator();
        agg.ingest_bytes("broken.mid", b"MThd but not really", None);
        let output = agg.finish();

        assert!(output.chunks.is_empty());
        let tally = &output.tallies["broken.mid"];
        assert_eq!(tally.attempted, 1);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.succeeded, 0);
    }

    #[test]
    fn one_bad_source_does_not_stop_the_run() {
        let mut agg = aggregator();
        agg.ingest_bytes("broken.mid", b"MThd junk", None);
        agg.ingest_bytes("song.tab", b"[A]\n3.5 4.7\n", None);
        let output = agg.finish();

        assert_eq!(output.chunks.len(), 1);
        assert_eq!(output.tallies["broken.mid"].failed, 1);
        assert_eq!(output.tallies["song.tab"].succeeded, 1);
    }

    #[test]
    fn short_prose_is_discarded_and_counted() {
        let mut agg = Aggregator::new(800, 50, Box::new(KeywordTagger::new()));
        agg.ingest_scraped(vec![ScrapedPage {
            url: "https://example.com/a".to_string(),
            extracted_text: "Too short.".to_string(),
            site_metadata: BTreeMap::new(),
        }]);
        let output = agg.finish();

        assert!(output.chunks.is_empty());
        assert_eq!(output.empty_discarded, 1);
        assert_eq!(output.tallies["https://example.com/a"].failed, 1);
    }

    #[test]
    fn scraped_pages_become_web_text_chunks() {
        let mut agg = Aggregator::new(800, 10, Box::new(KeywordTagger::new()));
        agg.ingest_scraped(vec![ScrapedPage {
            url: "https://example.com/lesson".to_string(),
            extracted_text: "A beginner lesson on chord progressions and voicings.".to_string(),
            site_metadata: BTreeMap::new(),
        }]);
        let output = agg.finish();

        assert_eq!(output.chunks.len(), 1);
        let chunk = &output.chunks[0];
        assert_eq!(chunk.metadata.format, "web-text");
        assert_eq!(chunk.metadata.topic, "chords");
        assert_eq!(chunk.metadata.difficulty, "beginner");
        assert!(chunk.raw_units.is_none());
    }

    #[test]
    fn empty_scraped_page_is_a_failed_tally() {
        let mut agg = aggregator();
        agg.ingest_scraped(vec![ScrapedPage {
            url: "https://example.com/blank".to_string(),
            extracted_text: "   \n\n".to_string(),
            site_metadata: BTreeMap::new(),
        }]);
        let output = agg.finish();
        assert_eq!(output.tallies["https://example.com/blank"].failed, 1);
    }

    #[test]
    fn positions_are_gap_free_per_source() {
        let mut agg = Aggregator::new(16, 1, Box::new(KeywordTagger::new()));
        agg.ingest_bytes("song.tab", b"[A]\n3.5 4.7 5.9\n1.1 2.2 3.3\n[B]\n4.4 5.5 6.6\n", None);
        let output = agg.finish();

        let positions: Vec<usize> = output.chunks.iter().map(|c| c.metadata.position).collect();
        let expected: Vec<usize> = (0..output.chunks.len()).collect();
        assert_eq!(positions, expected);
        assert!(output.chunks.len() > 1);
    }
}
