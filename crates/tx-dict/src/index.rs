// Dictionary reader: open a trie artifact and answer queries against it

use std::path::Path;

use tx_core::{KeyId, PrefixMatch, ScanMatch, effective_limit};
use tx_trie::Trie;

use crate::DictError;
use crate::artifact;
use crate::diagnostics::Diagnostics;

/// A read-only dictionary opened from an artifact file.
///
/// A freshly created index is unopened: every query returns an empty result
/// (`None`, `false`, `0` or an empty list). Opening replaces whatever was
/// loaded before; a failed open leaves the index unopened.
///
/// Queries take `&self` and keep their traversal state on the stack, so one
/// opened index can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct Index {
    trie: Option<Trie>,
    diagnostics: Diagnostics,
}

impl Index {
    /// An unopened index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the artifact at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DictError> {
        let mut index = Self::new();
        index.try_open(path.as_ref())?;
        Ok(index)
    }

    /// Wrap an already built trie.
    pub fn from_trie(trie: Trie) -> Self {
        Self {
            trie: Some(trie),
            diagnostics: Diagnostics::new(),
        }
    }

    /// (Re)open from `path`. Returns `false` and leaves the index unopened if
    /// the file is missing or invalid; the reason is in [`error_log`](Self::error_log).
    pub fn open(&mut self, path: impl AsRef<Path>) -> bool {
        self.try_open(path.as_ref()).is_ok()
    }

    fn try_open(&mut self, path: &Path) -> Result<(), DictError> {
        self.trie = None;
        self.diagnostics.clear();

        match artifact::read_trie(path) {
            Ok(trie) => {
                tracing::debug!(
                    path = %path.display(),
                    keys = trie.num_keys(),
                    nodes = trie.num_nodes(),
                    "Dictionary opened"
                );
                self.diagnostics.note(format_args!(
                    "opened {}: {} keys",
                    path.display(),
                    trie.num_keys()
                ));
                self.trie = Some(trie);
                Ok(())
            }
            Err(err) => {
                if err.is_not_found() {
                    tracing::debug!(path = %path.display(), "Dictionary not found");
                } else {
                    tracing::warn!(path = %path.display(), error = %err, "Dictionary open failed");
                }
                self.diagnostics.error(&err);
                Err(err)
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.trie.is_some()
    }

    /// The underlying trie, if opened.
    pub fn trie(&self) -> Option<&Trie> {
        self.trie.as_ref()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Length of the longest prefix of `query` accepted under `mode`.
    ///
    /// With [`PrefixMatch::Key`] only whole keys count; with
    /// [`PrefixMatch::Path`] any prefix of any key does.
    pub fn longest_prefix(&self, query: impl AsRef<[u8]>, mode: PrefixMatch) -> Option<usize> {
        self.trie
            .as_ref()?
            .prefix_search(query, mode)
            .map(|hit| hit.len)
    }

    /// Whether `query` is itself a key.
    pub fn include(&self, query: impl AsRef<[u8]>) -> bool {
        self.lookup_id(query).is_some()
    }

    /// Id of `query` if it is a key.
    pub fn lookup_id(&self, query: impl AsRef<[u8]>) -> Option<KeyId> {
        self.trie.as_ref()?.lookup(query)
    }

    /// Id and length of the longest key that is a prefix of `query`.
    pub fn prefix_search(&self, query: impl AsRef<[u8]>) -> Option<(KeyId, usize)> {
        let hit = self
            .trie
            .as_ref()?
            .prefix_search(query, PrefixMatch::Key)?;
        Some((hit.id?, hit.len))
    }

    /// Keys that are prefixes of `query`, shortest first, at most `limit`
    /// of them (`0` for no limit).
    pub fn search_prefixes(&self, query: impl AsRef<[u8]>, limit: usize) -> Vec<Vec<u8>> {
        let query = query.as_ref();
        let Some(trie) = &self.trie else {
            return Vec::new();
        };
        trie.common_prefixes(query)
            .take(effective_limit(limit))
            .map(|(_, len)| query[..len].to_vec())
            .collect()
    }

    /// Keys that start with `query`, in byte-lexicographic order, at most
    /// `limit` of them (`0` for no limit).
    pub fn search_expansions(&self, query: impl AsRef<[u8]>, limit: usize) -> Vec<Vec<u8>> {
        let Some(trie) = &self.trie else {
            return Vec::new();
        };
        trie.expansions(query)
            .take(effective_limit(limit))
            .map(|(_, key)| key)
            .collect()
    }

    pub fn num_keys(&self) -> usize {
        self.trie.as_ref().map_or(0, Trie::num_keys)
    }

    /// The key with id `id`, or `None` if unopened or out of range.
    pub fn reverse_lookup(&self, id: KeyId) -> Option<Vec<u8>> {
        self.trie.as_ref()?.key(id)
    }

    /// Every key in byte-lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.trie.iter().flat_map(Trie::keys).map(|(_, key)| key)
    }

    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.iter().collect()
    }

    // =========================================================================
    // Text scanning
    // =========================================================================

    /// Longest-key matches found scanning `text` left to right.
    ///
    /// At each position the longest key starting there is taken and the scan
    /// resumes after it; where nothing matches the scan moves one byte. The
    /// empty key never matches here.
    pub fn scan(&self, text: impl AsRef<[u8]>) -> Vec<ScanMatch> {
        let text = text.as_ref();
        let mut matches = Vec::new();
        let Some(trie) = &self.trie else {
            return matches;
        };

        let mut pos = 0;
        while pos < text.len() {
            match trie.prefix_search(&text[pos..], PrefixMatch::Key) {
                Some(hit) if hit.len > 0 => {
                    matches.push(ScanMatch::new(&text[pos..pos + hit.len], pos));
                    pos += hit.len;
                }
                _ => pos += 1,
            }
        }
        matches
    }

    /// Copy of `text` with every [`scan`](Self::scan) match replaced by
    /// `replace(match)`. Bytes between matches are kept as they are.
    pub fn replace_all<F, R>(&self, text: impl AsRef<[u8]>, mut replace: F) -> Vec<u8>
    where
        F: FnMut(&ScanMatch) -> R,
        R: AsRef<[u8]>,
    {
        let text = text.as_ref();
        let mut out = Vec::with_capacity(text.len());
        let mut copied = 0;
        for m in self.scan(text) {
            out.extend_from_slice(&text[copied..m.pos]);
            out.extend_from_slice(replace(&m).as_ref());
            copied = m.end();
        }
        out.extend_from_slice(&text[copied..]);
        out
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Log of the last open's completed steps.
    pub fn result_log(&self) -> &str {
        self.diagnostics.result_log()
    }

    /// Log of the last open's failure, empty after a success.
    pub fn error_log(&self) -> &str {
        self.diagnostics.error_log()
    }
}
