// Key/value map reader

use std::path::Path;

use tx_core::{KeyId, MapScanMatch};

use crate::DictError;
use crate::artifact::{self, MapPaths};
use crate::diagnostics::Diagnostics;
use crate::index::Index;

/// A read-only key/value map opened from a map artifact.
///
/// Like [`Index`], a new map is unopened and answers every query with an
/// empty result. Opening is all or nothing: if any of the three files is
/// missing or inconsistent the map stays unopened.
#[derive(Debug, Clone, Default)]
pub struct Map {
    keys: Index,
    values: Index,
    /// Value id of every key id.
    id_map: Vec<KeyId>,
    diagnostics: Diagnostics,
}

impl Map {
    /// An unopened map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the map artifact at `prefix`.
    pub fn load(prefix: impl AsRef<Path>) -> Result<Self, DictError> {
        let mut map = Self::new();
        map.try_open(prefix.as_ref())?;
        Ok(map)
    }

    /// (Re)open from `prefix`. Returns `false` and leaves the map unopened on
    /// failure; the reason is in [`error_log`](Self::error_log).
    pub fn open(&mut self, prefix: impl AsRef<Path>) -> bool {
        self.try_open(prefix.as_ref()).is_ok()
    }

    fn try_open(&mut self, prefix: &Path) -> Result<(), DictError> {
        *self = Self::new();

        match read_map(prefix) {
            Ok((keys, values, id_map)) => {
                tracing::debug!(
                    prefix = %prefix.display(),
                    keys = keys.num_keys(),
                    values = values.num_keys(),
                    "Map opened"
                );
                self.diagnostics.note(format_args!(
                    "opened map {}: {} keys, {} distinct values",
                    prefix.display(),
                    keys.num_keys(),
                    values.num_keys()
                ));
                self.keys = keys;
                self.values = values;
                self.id_map = id_map;
                Ok(())
            }
            Err(err) => {
                if err.is_not_found() {
                    tracing::debug!(prefix = %prefix.display(), "Map not found");
                } else {
                    tracing::warn!(prefix = %prefix.display(), error = %err, "Map open failed");
                }
                self.diagnostics.error(&err);
                Err(err)
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.keys.is_open()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether `key` is in the map.
    pub fn has_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.keys.include(key)
    }

    /// The value for `key`, or `None` if absent.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<Vec<u8>> {
        let key_id = self.keys.lookup_id(key)?;
        self.value_of(key_id)
    }

    /// The value for `key`, or an empty string if absent.
    ///
    /// An empty result is ambiguous when a key maps to the empty value; use
    /// [`get`](Self::get) or [`has_key`](Self::has_key) to tell them apart.
    pub fn lookup(&self, key: impl AsRef<[u8]>) -> Vec<u8> {
        self.get(key).unwrap_or_default()
    }

    fn value_of(&self, key_id: KeyId) -> Option<Vec<u8>> {
        let value_id = *self.id_map.get(key_id as usize)?;
        self.values.reverse_lookup(value_id)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.num_keys()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every key in byte-lexicographic order.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.keys.keys()
    }

    /// The value of every key, in key order.
    pub fn values(&self) -> Vec<Vec<u8>> {
        self.iter().map(|(_, value)| value).collect()
    }

    /// Every `(key, value)` pair in key order.
    pub fn iter(&self) -> impl Iterator<Item = (Vec<u8>, Vec<u8>)> + '_ {
        self.keys
            .trie()
            .into_iter()
            .flat_map(|trie| trie.keys())
            .map(|(key_id, key)| {
                let value = self.value_of(key_id).unwrap_or_default();
                (key, value)
            })
    }

    /// Longest-key matches in `text` (see [`Index::scan`]) with their values.
    pub fn scan(&self, text: impl AsRef<[u8]>) -> Vec<MapScanMatch> {
        self.keys
            .scan(text)
            .into_iter()
            .map(|m| {
                let value = self.lookup(&m.key);
                MapScanMatch::new(m.key, m.pos, value)
            })
            .collect()
    }

    /// The key dictionary.
    pub fn key_index(&self) -> &Index {
        &self.keys
    }

    /// The value dictionary.
    pub fn value_index(&self) -> &Index {
        &self.values
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

fn read_map(prefix: &Path) -> Result<(Index, Index, Vec<KeyId>), DictError> {
    let paths = MapPaths::new(prefix);
    let keys = Index::load(&paths.key)?;
    let values = Index::load(&paths.value)?;
    let id_map = read_id_map(&paths.map, keys.num_keys(), values.num_keys())?;
    Ok((keys, values, id_map))
}

/// Read a `.map` file: exactly one in-range value id per key.
fn read_id_map(path: &Path, num_keys: usize, num_values: usize) -> Result<Vec<KeyId>, DictError> {
    let corrupt = |reason: String| DictError::CorruptMap {
        path: path.to_path_buf(),
        reason,
    };

    let data = artifact::read_file(path)?;
    let width = size_of::<KeyId>();
    if data.len() % width != 0 {
        return Err(corrupt(format!(
            "{} bytes is not a whole number of {width}-byte ids",
            data.len()
        )));
    }
    if data.len() / width != num_keys {
        return Err(corrupt(format!(
            "{} entries for {num_keys} keys",
            data.len() / width
        )));
    }

    // Copy into an aligned buffer; file bytes carry no alignment guarantee.
    let mut id_map: Vec<KeyId> = vec![0; num_keys];
    bytemuck::cast_slice_mut::<KeyId, u8>(&mut id_map).copy_from_slice(&data);

    if let Some((key_id, &value_id)) = id_map
        .iter()
        .enumerate()
        .find(|&(_, &v)| v as usize >= num_values)
    {
        return Err(corrupt(format!(
            "key {key_id} maps to value {value_id}, but there are {num_values} values"
        )));
    }
    Ok(id_map)
}
