//! Per-run chunk identifier registry.
//!
//! Chunk ids are derived from content: a SipHash-2-4 over the source
//! identifier, the chunk's position, and its text, formatted as 16 hex digits.
//! The registry tracks every id issued during the run; a computed duplicate is
//! disambiguated with an incrementing `-N` suffix rather than dropped or
//! overwritten. Construct one registry per run and pass it by reference — ids
//! are deterministic across runs only when the registry starts fresh.

use std::{
    collections::HashSet,
    hash::{Hash, Hasher},
};

use siphasher::sip::SipHasher24;
use tracing::warn;

/// Issues unique chunk identifiers for one pipeline run.
#[derive(Debug, Default)]
pub struct IdRegistry {
    /// Every id issued so far this run.
    issued: HashSet<String>,
    /// Number of computed-id collisions disambiguated this run.
    collisions: u64,
}

impl IdRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes and registers a unique id for a chunk.
    ///
    /// The base id is a stable hash of `source + position + text`. If the base
    /// id was already issued this run, a `-1`, `-2`, ... suffix is appended
    /// until the id is unique. The returned id is guaranteed unique within the
    /// run's full output set.
    pub fn assign(&mut self, source: &str, position: usize, text: &str) -> String {
        let base = Self::content_hash(source, position, text);

        if self.issued.insert(base.clone()) {
            return base;
        }

        let mut suffix = 1u64;
        loop {
            let candidate = format!("{base}-{suffix}");
            if self.issued.insert(candidate.clone()) {
                self.collisions += 1;
                warn!(
                    source,
                    position,
                    id = %candidate,
                    total_collisions = self.collisions,
                    "chunk id collision disambiguated"
                );
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Number of collisions disambiguated so far.
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    /// Number of ids issued so far.
    pub fn issued(&self) -> usize {
        self.issued.len()
    }

    /// Computes the content-derived base id as 16 hex digits.
    fn content_hash(source: &str, position: usize, text: &str) -> String {
        let mut hasher = SipHasher24::new();
        source.hash(&mut hasher);
        position.hash(&mut hasher);
        text.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}
