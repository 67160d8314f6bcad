//! Ingestion pipeline for fret.
//!
//! Wires the format parsers, the chunker, the identifier registry, and the
//! metadata enricher into one sequential run: sources go in (files or
//! scraped-page records), ordered deduplicated chunks and per-source tallies
//! come out. No source can abort the run; decode failures and empty content
//! are tallied and the pipeline moves on.

#![warn(missing_docs)]

mod aggregator;
mod config;
mod error;
mod scrape;

pub use aggregator::{Aggregator, IngestOutput, SourceTally};
pub use config::{DEFAULT_CHUNK_BUDGET, DEFAULT_MIN_CONTENT_LEN, PipelineConfig, TopicRule};
pub use error::PipelineError;
pub use scrape::{ScrapedPage, read_scraped_file};
