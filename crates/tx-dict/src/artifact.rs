// Artifact file naming and raw file I/O

use std::fs;
use std::path::{Path, PathBuf};

use tx_trie::Trie;

use crate::DictError;

/// Suffix of a map's key dictionary.
pub const KEY_SUFFIX: &str = ".key";
/// Suffix of a map's value dictionary.
pub const VALUE_SUFFIX: &str = ".val";
/// Suffix of a map's key-id to value-id array.
pub const MAP_SUFFIX: &str = ".map";

/// The three files making up a map artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapPaths {
    pub key: PathBuf,
    pub value: PathBuf,
    pub map: PathBuf,
}

impl MapPaths {
    /// Paths for `prefix`: `<prefix>.key`, `<prefix>.val`, `<prefix>.map`.
    pub fn new(prefix: &Path) -> Self {
        Self {
            key: with_suffix(prefix, KEY_SUFFIX),
            value: with_suffix(prefix, VALUE_SUFFIX),
            map: with_suffix(prefix, MAP_SUFFIX),
        }
    }
}

/// Appends `suffix` to the last path component (`a/b` -> `a/b.key`), keeping
/// any extension already present.
fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, DictError> {
    fs::read(path).map_err(|source| DictError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_file(path: &Path, data: &[u8]) -> Result<(), DictError> {
    fs::write(path, data).map_err(|source| DictError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and validates a dictionary artifact.
pub(crate) fn read_trie(path: &Path) -> Result<Trie, DictError> {
    let data = read_file(path)?;
    Trie::from_bytes(&data).map_err(|source| DictError::Format {
        path: path.to_path_buf(),
        source,
    })
}
