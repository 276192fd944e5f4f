// Key/value map builder: two dictionaries plus a key-id -> value-id array

use std::path::Path;

use hashbrown::HashMap;
use tx_core::KeyId;

use crate::DictError;
use crate::artifact::{self, MapPaths};
use crate::builder::DictionaryBuilder;
use crate::diagnostics::Diagnostics;

/// Statistics of a successful map build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSummary {
    /// Distinct keys.
    pub num_keys: usize,
    /// Distinct values; equal values are stored once.
    pub num_values: usize,
}

/// Accumulates key/value pairs and writes them as a map artifact.
///
/// Adding a key again replaces its value. A build writes three files next to
/// the given prefix: `<prefix>.key` (key dictionary), `<prefix>.val` (value
/// dictionary) and `<prefix>.map` (one native-endian `u32` value id per key
/// id).
#[derive(Debug, Default)]
pub struct MapBuilder {
    pairs: HashMap<Vec<u8>, Vec<u8>>,
    diagnostics: Diagnostics,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `value` with `key`; the last value added for a key wins.
    pub fn add(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) {
        self.pairs
            .insert(key.as_ref().to_vec(), value.as_ref().to_vec());
    }

    /// Add pairs from a flat `[k0, v0, k1, v1, ...]` sequence. A trailing
    /// unpaired element is ignored.
    pub fn add_all<I, T>(&mut self, flat: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut items = flat.into_iter();
        while let (Some(key), Some(value)) = (items.next(), items.next()) {
            self.add(key, value);
        }
    }

    /// Distinct keys pending.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Write the map artifact for `prefix`, replacing existing files.
    ///
    /// The pending pairs are kept if the build fails.
    pub fn build(&mut self, prefix: impl AsRef<Path>) -> Result<MapSummary, DictError> {
        let prefix = prefix.as_ref();
        let _span =
            tracing::debug_span!("map_build", prefix = %prefix.display(), pairs = self.pairs.len())
                .entered();
        self.diagnostics.clear();

        match self.write(prefix) {
            Ok(summary) => {
                tracing::debug!(
                    keys = summary.num_keys,
                    values = summary.num_values,
                    "Map built"
                );
                self.diagnostics.note(format_args!(
                    "built map {}: {} keys, {} distinct values",
                    prefix.display(),
                    summary.num_keys,
                    summary.num_values
                ));
                self.pairs.clear();
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Map build failed");
                self.diagnostics.error(&err);
                Err(err)
            }
        }
    }

    fn write(&self, prefix: &Path) -> Result<MapSummary, DictError> {
        let paths = MapPaths::new(prefix);

        let mut keys = DictionaryBuilder::new();
        keys.add_all(self.pairs.keys());
        keys.build(&paths.key)?;

        // The dictionary build collapses equal values into one id.
        let mut values = DictionaryBuilder::new();
        values.add_all(self.pairs.values());
        values.build(&paths.value)?;

        // Read both back so the ids are exactly those a reader will see.
        let key_trie = artifact::read_trie(&paths.key)?;
        let value_trie = artifact::read_trie(&paths.value)?;

        let mut id_map: Vec<KeyId> = Vec::with_capacity(key_trie.num_keys());
        let mut key = Vec::new();
        for key_id in 0..key_trie.num_keys() as KeyId {
            key_trie.reverse_lookup_into(key_id, &mut key);
            let value = self
                .pairs
                .get(key.as_slice())
                .unwrap_or_else(|| panic!("key {key:?} missing from the pending pairs"));
            let value_id = value_trie
                .lookup(value)
                .unwrap_or_else(|| panic!("value {value:?} missing from the value dictionary"));
            id_map.push(value_id);
        }

        artifact::write_file(&paths.map, bytemuck::cast_slice::<KeyId, u8>(&id_map))?;
        tracing::debug!(path = %paths.map.display(), entries = id_map.len(), "Wrote id map");

        Ok(MapSummary {
            num_keys: key_trie.num_keys(),
            num_values: value_trie.num_keys(),
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
