// Dictionary builder: accumulate byte strings, write one trie artifact

use std::path::Path;

use tx_trie::Trie;

use crate::DictError;
use crate::artifact;
use crate::diagnostics::Diagnostics;

/// Statistics of a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    /// Distinct keys written.
    pub num_keys: usize,
    /// Trie nodes, including the root.
    pub num_nodes: usize,
    /// Artifact size in bytes.
    pub bytes: usize,
}

/// Accumulates keys and writes them as a dictionary artifact.
///
/// Duplicates are allowed and collapse into one key. A successful
/// [`build`](Self::build) empties the accumulator; a failed one keeps it so
/// the build can be retried against another path.
#[derive(Debug, Default)]
pub struct DictionaryBuilder {
    words: Vec<Vec<u8>>,
    diagnostics: Diagnostics,
}

impl DictionaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one key. Any byte sequence is accepted, including the empty one.
    pub fn add(&mut self, word: impl AsRef<[u8]>) {
        self.words.push(word.as_ref().to_vec());
    }

    /// Queue every key of `words`.
    pub fn add_all<I, K>(&mut self, words: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.words.extend(words.into_iter().map(|w| w.as_ref().to_vec()));
    }

    /// Keys queued since the last successful build, duplicates included.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Build the queued keys into a trie and write it to `path`, replacing
    /// any existing file.
    pub fn build(&mut self, path: impl AsRef<Path>) -> Result<BuildSummary, DictError> {
        let path = path.as_ref();
        self.diagnostics.clear();

        match self.write(path) {
            Ok(summary) => {
                tracing::debug!(
                    path = %path.display(),
                    keys = summary.num_keys,
                    nodes = summary.num_nodes,
                    bytes = summary.bytes,
                    "Dictionary built"
                );
                self.diagnostics.note(format_args!(
                    "built {} keys ({} nodes) into {}",
                    summary.num_keys,
                    summary.num_nodes,
                    path.display()
                ));
                self.diagnostics
                    .note(format_args!("wrote {} bytes", summary.bytes));
                self.words.clear();
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Dictionary build failed");
                self.diagnostics.error(&err);
                Err(err)
            }
        }
    }

    fn write(&self, path: &Path) -> Result<BuildSummary, DictError> {
        let trie = Trie::build(&self.words)?;
        let bytes = trie.to_bytes();
        artifact::write_file(path, &bytes)?;
        Ok(BuildSummary {
            num_keys: trie.num_keys(),
            num_nodes: trie.num_nodes(),
            bytes: bytes.len(),
        })
    }

    /// Log of the last build's completed steps.
    pub fn result_log(&self) -> &str {
        self.diagnostics.result_log()
    }

    /// Log of the last build's failure, empty after a success.
    pub fn error_log(&self) -> &str {
        self.diagnostics.error_log()
    }
}
