//! Adapter for the scraping collaborator's output.
//!
//! The pipeline performs no network I/O; scraped pages arrive as plain data
//! (a JSON array of records) and are wrapped into single-section `WebText`
//! documents, paragraph units split on blank lines.

use std::{collections::BTreeMap, fs, mem, path::Path};

use fret_document::{Document, Section, SourceFormat, Unit};
use serde::Deserialize;

use crate::PipelineError;

/// One record from the scraping collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapedPage {
    /// The page URL; becomes the chunk source identifier.
    pub url: String,
    /// Text extracted from the page.
    pub extracted_text: String,
    /// Site-level metadata (site name, page title, ...).
    #[serde(default)]
    pub site_metadata: BTreeMap<String, String>,
}

impl ScrapedPage {
    /// Wraps the page into a `WebText` document.
    ///
    /// The extracted text is split into paragraph units on blank lines, in a
    /// single `"body"` section. The page title, when present in the site
    /// metadata, becomes the document title; all site metadata is carried on
    /// the document.
    pub fn into_document(self) -> Document {
        let title = self
            .site_metadata
            .get("title")
            .cloned()
            .unwrap_or_else(|| self.url.clone());

        let mut doc = Document::new(title, SourceFormat::WebText);
        doc.metadata = self.site_metadata;
        doc.metadata.insert("url".to_string(), self.url);

        let mut section = Section::new("body");
        for paragraph in split_paragraphs(&self.extracted_text) {
            section.units.push(Unit::Paragraph(paragraph));
        }
        doc.sections.push(section);
        doc
    }
}

/// Splits text into paragraphs on blank lines, dropping empty ones.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.trim().is_empty() {
                paragraphs.push(mem::take(&mut current));
            }
            current.clear();
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line.trim_end());
        }
    }
    if !current.trim().is_empty() {
        paragraphs.push(current);
    }

    paragraphs
}

/// Reads a JSON array of scraped records from a file.
pub fn read_scraped_file(path: &Path) -> Result<Vec<ScrapedPage>, PipelineError> {
    let data = fs::read(path).map_err(|source| PipelineError::ReadScraped {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| PipelineError::ParseScraped {
        path: path.to_path_buf(),
        source,
    })
}
