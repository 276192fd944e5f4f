//! File-backed static string dictionaries and key/value maps.
//!
//! A [`DictionaryBuilder`] collects byte strings and writes a trie artifact;
//! an [`Index`] opens it and answers exact, longest-prefix, common-prefix and
//! predictive queries. [`MapBuilder`] and [`Map`] pair two dictionaries with
//! an id array to associate every key with a (deduplicated) value.
//!
//! Readers have an explicit unopened state: [`Index::new`] and [`Map::new`]
//! start unopened, and every query on an unopened reader returns an empty
//! result instead of failing.
//!
//! # Architecture
//!
//! - [`artifact`] -- Artifact file naming and raw file I/O
//! - [`diagnostics`] -- Human-readable result and error logs
//! - [`builder`] -- Dictionary builder
//! - [`index`] -- Dictionary reader, scanning and replacement
//! - [`map_builder`] -- Key/value map builder
//! - [`map`] -- Key/value map reader

use std::path::PathBuf;

use tx_trie::TrieError;

pub mod artifact;
pub mod builder;
pub mod diagnostics;
pub mod index;
pub mod map;
pub mod map_builder;

pub use builder::{BuildSummary, DictionaryBuilder};
pub use diagnostics::Diagnostics;
pub use index::Index;
pub use map::Map;
pub use map_builder::{MapBuilder, MapSummary};
pub use tx_core::{KeyId, MapScanMatch, PrefixMatch, ScanMatch};

/// Error type for building and opening dictionary and map artifacts.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    /// An artifact could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A dictionary artifact exists but is not a valid trie.
    #[error("invalid dictionary {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: TrieError,
    },

    /// The trie build rejected the key set.
    #[error("failed to build dictionary: {0}")]
    Build(#[from] TrieError),

    /// A `.map` artifact does not match its dictionaries.
    #[error("corrupt map {}: {reason}", path.display())]
    CorruptMap { path: PathBuf, reason: String },
}

impl DictError {
    /// Whether the error is a routine "artifact does not exist" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DictError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
