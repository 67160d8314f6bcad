//! Pipeline configuration.
//!
//! Configuration is a single TOML file; every field is optional and falls
//! back to a default:
//!
//! ```toml
//! chunk_budget = 800
//! min_content_len = 50
//!
//! [[topics]]
//! topic = "percussion"
//! keywords = ["drum", "rudiment"]
//! ```

use std::{fs, path::Path};

use fret_enrich::KeywordTagger;
use serde::Deserialize;

use crate::PipelineError;

/// Default chunk budget in characters.
pub const DEFAULT_CHUNK_BUDGET: usize = 800;

/// Default minimum length for prose chunk text.
pub const DEFAULT_MIN_CONTENT_LEN: usize = 50;

/// A topic vocabulary override entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicRule {
    /// The topic tag to assign.
    pub topic: String,
    /// Keywords that select this topic.
    pub keywords: Vec<String>,
}

/// Resolved pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum chunk text size in characters.
    pub chunk_budget: usize,
    /// Minimum length for prose chunk text; shorter prose chunks are
    /// discarded and counted.
    pub min_content_len: usize,
    /// Ordered topic vocabulary override; replaces the default vocabulary
    /// when present.
    pub topics: Option<Vec<TopicRule>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_budget: DEFAULT_CHUNK_BUDGET,
            min_content_len: DEFAULT_MIN_CONTENT_LEN,
            topics: None,
        }
    }
}

impl PipelineConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = fs::read_to_string(path).map_err(|source| PipelineError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| PipelineError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the keyword tagger this configuration describes.
    pub fn tagger(&self) -> KeywordTagger {
        match &self.topics {
            Some(rules) => KeywordTagger::with_topics(
                rules
                    .iter()
                    .map(|rule| (rule.topic.clone(), rule.keywords.clone()))
                    .collect(),
            ),
            None => KeywordTagger::new(),
        }
    }
}
