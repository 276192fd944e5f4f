// Key identifiers and scan match records

/// Numeric identifier assigned to every key when a dictionary is built.
///
/// Identifiers are dense: a dictionary of `n` keys uses exactly `0..n`.
/// The `.map` artifact stores identifiers of this width.
pub type KeyId = u32;

/// A dictionary key found while scanning a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMatch {
    /// The matched key bytes.
    pub key: Vec<u8>,
    /// Byte offset of the match within the scanned text.
    pub pos: usize,
}

impl ScanMatch {
    pub fn new(key: impl Into<Vec<u8>>, pos: usize) -> Self {
        Self {
            key: key.into(),
            pos,
        }
    }

    /// Byte offset just past the match.
    #[inline]
    pub fn end(&self) -> usize {
        self.pos + self.key.len()
    }
}

/// A map key found while scanning a text, together with its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapScanMatch {
    pub key: Vec<u8>,
    pub pos: usize,
    pub value: Vec<u8>,
}

impl MapScanMatch {
    pub fn new(key: impl Into<Vec<u8>>, pos: usize, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            pos,
            value: value.into(),
        }
    }
}
