//! Succinct trie store for static string dictionaries.
//!
//! A [`Trie`] is built once from a set of byte strings, assigns every distinct
//! string a dense [`KeyId`](tx_core::KeyId), and answers exact, longest-prefix,
//! common-prefix and predictive queries. The tree is encoded as a LOUDS bit
//! sequence (level-order unary degree sequence) with one label byte per node,
//! so a dictionary of `n` trie nodes costs roughly `n` bytes plus `3n` bits.
//!
//! # Architecture
//!
//! - [`bits`] -- Rank/select bit vector
//! - [`format`] -- Artifact header and section layout
//! - [`build`] -- Breadth-first construction from a sorted key set
//! - [`trie`] -- The loaded trie, navigation and serialization
//! - [`walk`] -- Query walks (common-prefix and predictive iterators)

pub mod bits;
pub mod build;
pub mod format;
pub mod trie;
pub mod walk;

pub use trie::{PrefixHit, Trie};
pub use walk::{CommonPrefixes, Expansions};

/// Error type for building and loading tries.
#[derive(Debug, thiserror::Error)]
pub enum TrieError {
    #[error("invalid magic number in dictionary header")]
    InvalidMagic,
    #[error("unsupported dictionary format version {0}")]
    UnsupportedVersion(u8),
    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("corrupt dictionary: {0}")]
    Corrupt(String),
    #[error("cannot build a dictionary from an empty key set")]
    EmptyKeySet,
    #[error("too many keys: {0} exceeds the key id range")]
    TooManyKeys(usize),
    #[error("too many trie nodes: {0} exceeds the node index range")]
    TooManyNodes(usize),
}
