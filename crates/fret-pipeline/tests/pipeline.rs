//! End-to-end pipeline tests across parsing, chunking, identity, and tagging.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::collections::{BTreeMap, HashSet};

use fret_enrich::KeywordTagger;
use fret_pipeline::{Aggregator, IngestOutput, PipelineConfig, ScrapedPage};

/// Builds an aggregator with a small prose floor so short fixtures survive.
fn aggregator() -> Aggregator {
    Aggregator::new(800, 10, Box::new(KeywordTagger::new()))
}

fn run_fixtures() -> IngestOutput {
    let mut agg = aggregator();
    agg.ingest_bytes(
        "stairway.tab",
        b"\\title Stairway\n\\tempo 82\n[Intro @ guitar]\n3.5 4.7 Am\n3.5 4.7\n[Verse]\n1.0 2.1\n",
        None,
    );
    agg.ingest_bytes(
        "wonderwall.txt",
        b"[Verse]\nEm7 G Dsus4 A7sus4\n\n[Chorus]\nC D Em\n",
        None,
    );
    agg.ingest_scraped(vec![ScrapedPage {
        url: "https://example.com/lesson".to_string(),
        extracted_text: "A beginner guide to chord progressions.\n\nStart with open voicings."
            .to_string(),
        site_metadata: BTreeMap::new(),
    }]);
    agg.finish()
}

#[test]
fn ids_are_unique_across_the_run() {
    let output = run_fixtures();
    assert!(!output.chunks.is_empty());

    let ids: HashSet<&str> = output.chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids.len(), output.chunks.len());
}

#[test]
fn reruns_are_deterministic() {
    let first = run_fixtures();
    let second = run_fixtures();

    assert_eq!(first.chunks.len(), second.chunks.len());
    for (a, b) in first.chunks.iter().zip(&second.chunks) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.text, b.text);
        assert_eq!(a.metadata, b.metadata);
    }
}

#[test]
fn identical_sections_get_distinct_ids() {
    let mut agg = aggregator();
    // Two byte-identical sections in one source.
    agg.ingest_bytes("repeat.tab", b"[A]\n3.5 4.7\n[B]\n3.5 4.7\n", None);
    let output = agg.finish();

    assert_eq!(output.chunks.len(), 2);
    assert_eq!(output.chunks[0].text, output.chunks[1].text);
    assert_ne!(output.chunks[0].id, output.chunks[1].id);
}

#[test]
fn malformed_midi_yields_failed_tally_and_no_chunks() {
    let mut agg = aggregator();
    agg.ingest_bytes("broken.mid", &[0x4d, 0x54, 0x68, 0x64, 0xff, 0xff], None);
    let output = agg.finish();

    assert!(output.chunks.is_empty());
    let tally = &output.tallies["broken.mid"];
    assert_eq!(tally.attempted, 1);
    assert_eq!(tally.failed, 1);
}

#[test]
fn positions_are_monotone_and_gap_free_per_source() {
    let output = run_fixtures();

    let mut by_source: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for chunk in &output.chunks {
        by_source
            .entry(chunk.metadata.source.as_str())
            .or_default()
            .push(chunk.metadata.position);
    }

    for (source, positions) in by_source {
        let expected: Vec<usize> = (0..positions.len()).collect();
        assert_eq!(positions, expected, "positions for {source}");
    }
}

#[test]
fn chunks_carry_provenance_and_tags() {
    let output = run_fixtures();

    let alpha: Vec<_> = output
        .chunks
        .iter()
        .filter(|c| c.metadata.source == "stairway.tab")
        .collect();
    assert!(!alpha.is_empty());
    assert_eq!(alpha[0].metadata.format, "alpha-notation");
    assert_eq!(alpha[0].metadata.tempo, Some(82));
    assert_eq!(alpha[0].metadata.section, "Intro");
    assert_eq!(alpha[0].metadata.instrument.as_deref(), Some("guitar"));
    // Structural chunks carry the sentinel, not a guessed tag.
    assert_eq!(alpha[0].metadata.topic, "unknown");

    let web: Vec<_> = output
        .chunks
        .iter()
        .filter(|c| c.metadata.source == "https://example.com/lesson")
        .collect();
    assert!(!web.is_empty());
    assert_eq!(web[0].metadata.format, "web-text");
    assert_eq!(web[0].metadata.topic, "chords");
    assert_eq!(web[0].metadata.difficulty, "beginner");
}

#[test]
fn chord_chart_is_classified_from_content() {
    let output = run_fixtures();
    let chart: Vec<_> = output
        .chunks
        .iter()
        .filter(|c| c.metadata.source == "wonderwall.txt")
        .collect();
    assert!(!chart.is_empty());
    assert!(chart.iter().all(|c| c.metadata.format == "chord-chart"));
}

#[test]
fn output_serializes_for_the_persistence_handoff() {
    let output = run_fixtures();
    let json = serde_json::to_string(&output).unwrap();
    assert!(json.contains("\"chunks\""));
    assert!(json.contains("\"tallies\""));
    assert!(json.contains("\"collisions\""));
}

#[test]
fn config_driven_aggregator_uses_overridden_vocabulary() {
    let config: PipelineConfig = toml::from_str(
        "min_content_len = 10\n[[topics]]\ntopic = \"gear\"\nkeywords = [\"amplifier\"]\n",
    )
    .unwrap();
    let mut agg = Aggregator::with_config(&config);
    agg.ingest_scraped(vec![ScrapedPage {
        url: "https://example.com/amps".to_string(),
        extracted_text: "Choosing your first amplifier for practice.".to_string(),
        site_metadata: BTreeMap::new(),
    }]);
    let output = agg.finish();

    assert_eq!(output.chunks.len(), 1);
    assert_eq!(output.chunks[0].metadata.topic, "gear");
}
