// Loaded trie: LOUDS navigation, exact and prefix queries, serialization

use std::io::{self, Write};

use tx_core::{KeyId, PrefixMatch};

use crate::TrieError;
use crate::bits::BitVector;
use crate::build;
use crate::format::{self, COUNTS_SIZE, HEADER_SIZE, SectionLayout};
use crate::walk::{CommonPrefixes, Expansions};

/// Node index of the root.
pub(crate) const ROOT: usize = 0;

/// Result of a longest-prefix search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixHit {
    /// Number of query bytes matched.
    pub len: usize,
    /// Id of the key ending at the match, if the match ends on a key.
    ///
    /// Always `Some` under [`PrefixMatch::Key`].
    pub id: Option<KeyId>,
}

/// Immutable LOUDS-encoded trie over a set of byte strings.
///
/// Nodes are numbered in breadth-first order, the root being node 0.
///
/// - `louds`: `10` for the super root, then `1^degree 0` for every node.
///   Node `k`'s child list starts right after its `k`-th zero.
/// - `labels[k]`: the byte on the edge into node `k` (0 for the root).
/// - `terminals[k]`: set when node `k` ends a key; the key id is the rank of
///   that bit.
///
/// The structure is read-only after construction, so a `&Trie` can be
/// queried from several threads at once.
#[derive(Clone, PartialEq, Eq)]
pub struct Trie {
    labels: Vec<u8>,
    louds: BitVector,
    terminals: BitVector,
}

impl std::fmt::Debug for Trie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trie")
            .field("node_count", &self.num_nodes())
            .field("key_count", &self.num_keys())
            .field("heap_size", &self.heap_size())
            .finish()
    }
}

impl Trie {
    /// Build a trie from a collection of keys. See [`build::build_trie`].
    pub fn build<I, K>(keys: I) -> Result<Self, TrieError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        build::build_trie(keys)
    }

    pub(crate) fn from_parts(labels: Vec<u8>, louds: BitVector, terminals: BitVector) -> Self {
        debug_assert_eq!(louds.len(), 2 * labels.len() + 1);
        debug_assert_eq!(terminals.len(), labels.len());
        Self {
            labels,
            louds,
            terminals,
        }
    }

    /// Number of distinct keys.
    #[inline]
    pub fn num_keys(&self) -> usize {
        self.terminals.count_ones()
    }

    /// Number of trie nodes, including the root.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.labels.len()
    }

    /// Approximate heap footprint in bytes.
    pub fn heap_size(&self) -> usize {
        self.labels.len() + self.louds.heap_size() + self.terminals.heap_size()
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// First child and number of children of `node`.
    #[inline]
    pub(crate) fn children(&self, node: usize) -> (usize, usize) {
        let start = self.louds.select0(node) + 1;
        let end = self.louds.select0(node + 1);
        // Ones before `start` are the super root plus every earlier child.
        (start - node - 1, end - start)
    }

    /// Child of `node` reached through `label`.
    #[inline]
    pub(crate) fn child(&self, node: usize, label: u8) -> Option<usize> {
        let (first, degree) = self.children(node);
        self.labels[first..first + degree]
            .binary_search(&label)
            .ok()
            .map(|i| first + i)
    }

    /// Parent of a non-root node.
    #[inline]
    pub(crate) fn parent(&self, node: usize) -> usize {
        debug_assert!(node != ROOT);
        self.louds.select1(node) - node - 1
    }

    #[inline]
    pub(crate) fn label(&self, node: usize) -> u8 {
        self.labels[node]
    }

    /// Key id of `node` if a key ends there.
    #[inline]
    pub(crate) fn key_id(&self, node: usize) -> Option<KeyId> {
        if self.terminals.get(node) {
            Some(self.terminals.rank1(node) as KeyId)
        } else {
            None
        }
    }

    /// Follow `query` from the root; the node reached, if the whole query is
    /// a path in the trie.
    pub(crate) fn walk(&self, query: &[u8]) -> Option<usize> {
        query
            .iter()
            .try_fold(ROOT, |node, &label| self.child(node, label))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Id of `query` if it is exactly a key.
    pub fn lookup(&self, query: impl AsRef<[u8]>) -> Option<KeyId> {
        self.walk(query.as_ref()).and_then(|node| self.key_id(node))
    }

    /// Longest match of `query` against the trie.
    ///
    /// With [`PrefixMatch::Key`] the match is the longest key that is a prefix
    /// of `query` (`None` if there is none, not even the empty key). With
    /// [`PrefixMatch::Path`] every node counts, so the match is the longest
    /// prefix `query` shares with any key and is never `None`.
    pub fn prefix_search(&self, query: impl AsRef<[u8]>, mode: PrefixMatch) -> Option<PrefixHit> {
        let query = query.as_ref();
        let mut node = ROOT;
        let mut depth = 0;
        let mut best = self.key_id(ROOT).map(|id| PrefixHit { len: 0, id: Some(id) });

        for &label in query {
            match self.child(node, label) {
                Some(next) => {
                    node = next;
                    depth += 1;
                }
                None => break,
            }
            if let Some(id) = self.key_id(node) {
                best = Some(PrefixHit { len: depth, id: Some(id) });
            }
        }

        match mode {
            PrefixMatch::Key => best,
            PrefixMatch::Path => Some(PrefixHit {
                len: depth,
                id: self.key_id(node),
            }),
        }
    }

    /// Keys that are prefixes of `query`, shortest first, as `(id, length)`.
    pub fn common_prefixes<'a>(&'a self, query: &'a [u8]) -> CommonPrefixes<'a> {
        CommonPrefixes::new(self, query)
    }

    /// Keys that start with `query`, in byte-lexicographic order.
    pub fn expansions(&self, query: impl AsRef<[u8]>) -> Expansions<'_> {
        Expansions::new(self, query.as_ref())
    }

    /// Every key, in byte-lexicographic order.
    pub fn keys(&self) -> Expansions<'_> {
        Expansions::new(self, &[])
    }

    /// The key with id `id`, or `None` if the id is out of range.
    pub fn key(&self, id: KeyId) -> Option<Vec<u8>> {
        if (id as usize) < self.num_keys() {
            Some(self.reverse_lookup(id))
        } else {
            None
        }
    }

    /// The key with id `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id >= num_keys()`. Valid ids only come from this trie.
    pub fn reverse_lookup(&self, id: KeyId) -> Vec<u8> {
        let mut key = Vec::new();
        self.reverse_lookup_into(id, &mut key);
        key
    }

    /// Like [`reverse_lookup`](Self::reverse_lookup), writing into `key`.
    pub fn reverse_lookup_into(&self, id: KeyId, key: &mut Vec<u8>) {
        assert!(
            (id as usize) < self.num_keys(),
            "key id {id} out of range ({} keys)",
            self.num_keys()
        );
        key.clear();
        let mut node = self.terminals.select1(id as usize);
        while node != ROOT {
            key.push(self.labels[node]);
            node = self.parent(node);
        }
        key.reverse();
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Serialize into the artifact format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let node_count = self.num_nodes();
        // Sizes were validated at build or load time.
        let total = SectionLayout::for_nodes(node_count).map_or(0, |l| l.total_len());
        let mut out = Vec::with_capacity(total);

        format::write_header(&mut out);
        out.extend_from_slice(&(node_count as u64).to_ne_bytes());
        out.extend_from_slice(&(self.num_keys() as u64).to_ne_bytes());
        out.extend_from_slice(&self.labels);
        format::pad_to_section(&mut out);
        out.extend_from_slice(bytemuck::cast_slice::<u64, u8>(self.louds.words()));
        out.extend_from_slice(bytemuck::cast_slice::<u64, u8>(self.terminals.words()));

        debug_assert_eq!(out.len(), total);
        out
    }

    /// Serialize into `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// Load a trie from artifact bytes, validating its structure.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TrieError> {
        format::parse_header(data)?;

        if data.len() < HEADER_SIZE + COUNTS_SIZE {
            return Err(TrieError::TooShort {
                expected: HEADER_SIZE + COUNTS_SIZE,
                actual: data.len(),
            });
        }
        let node_count = usize::try_from(format::read_u64(data, HEADER_SIZE))
            .map_err(|_| TrieError::Corrupt("node count exceeds address space".to_string()))?;
        let key_count = usize::try_from(format::read_u64(data, HEADER_SIZE + 8))
            .map_err(|_| TrieError::Corrupt("key count exceeds address space".to_string()))?;

        if node_count == 0 {
            return Err(TrieError::Corrupt("trie has no root node".to_string()));
        }
        if key_count == 0 || key_count > node_count {
            return Err(TrieError::Corrupt(format!(
                "key count {key_count} invalid for {node_count} nodes"
            )));
        }

        let layout = SectionLayout::for_nodes(node_count)
            .ok_or_else(|| TrieError::Corrupt("section sizes overflow".to_string()))?;
        if data.len() != layout.total_len() {
            return Err(TrieError::LengthMismatch {
                expected: layout.total_len(),
                actual: data.len(),
            });
        }

        let labels = data[layout.labels.0..layout.labels.1].to_vec();
        let louds = read_bits(data, layout.louds, 2 * node_count + 1);
        let terminals = read_bits(data, layout.terminals, node_count);

        if !(louds.get(0) && !louds.get(1)) {
            return Err(TrieError::Corrupt("missing super root".to_string()));
        }
        if louds.count_ones() != node_count {
            return Err(TrieError::Corrupt(format!(
                "LOUDS holds {} nodes, header says {node_count}",
                louds.count_ones()
            )));
        }
        if terminals.count_ones() != key_count {
            return Err(TrieError::Corrupt(format!(
                "{} terminal nodes, header says {key_count} keys",
                terminals.count_ones()
            )));
        }

        let trie = Self::from_parts(labels, louds, terminals);
        trie.check_shape()?;
        Ok(trie)
    }

    /// Children must come after their parent in level order, and sibling
    /// labels must be strictly increasing for binary search.
    fn check_shape(&self) -> Result<(), TrieError> {
        let mut first = 1;
        for node in 0..self.num_nodes() {
            let end = self.louds.select0(node + 1);
            let degree = end - (self.louds.select0(node) + 1);
            if degree > 0 && first <= node {
                return Err(TrieError::Corrupt(format!(
                    "node {node} is not in level order"
                )));
            }
            let siblings = &self.labels[first..first + degree];
            if siblings.windows(2).any(|w| w[0] >= w[1]) {
                return Err(TrieError::Corrupt(format!(
                    "children of node {node} are not ordered"
                )));
            }
            first += degree;
        }
        Ok(())
    }
}

/// Copy a bit vector section into an aligned word buffer.
///
/// The source slice may not be 8-byte aligned, so the words are copied
/// rather than cast in place.
fn read_bits(data: &[u8], (start, end): (usize, usize), len: usize) -> BitVector {
    let mut words = vec![0u64; (end - start) / size_of::<u64>()];
    bytemuck::cast_slice_mut::<u64, u8>(&mut words).copy_from_slice(&data[start..end]);
    BitVector::from_words(words, len)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOGE: [&str; 6] = ["foo", "ho", "hog", "hoga", "hoge", "hogeshi"];

    fn hoge() -> Trie {
        Trie::build(HOGE).unwrap()
    }

    #[test]
    fn lookup_exact_keys() {
        let trie = hoge();
        for word in HOGE {
            assert!(trie.lookup(word).is_some(), "{word}");
        }
        assert_eq!(trie.lookup("h"), None);
        assert_eq!(trie.lookup("hogera"), None);
        assert_eq!(trie.lookup(""), None);
    }

    #[test]
    fn reverse_lookup_inverts_lookup() {
        let trie = hoge();
        for word in HOGE {
            let id = trie.lookup(word).unwrap();
            assert_eq!(trie.reverse_lookup(id), word.as_bytes());
        }
    }

    #[test]
    fn ids_are_dense() {
        let trie = hoge();
        let mut ids: Vec<KeyId> = HOGE.iter().map(|w| trie.lookup(w).unwrap()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn key_out_of_range_is_none() {
        assert_eq!(hoge().key(6), None);
        assert_eq!(hoge().key(0), Some(b"ho".to_vec()));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn reverse_lookup_out_of_range_panics() {
        hoge().reverse_lookup(100);
    }

    #[test]
    fn prefix_search_key_mode() {
        let trie = hoge();
        let hit = trie.prefix_search("hogeshaa", PrefixMatch::Key).unwrap();
        assert_eq!(hit.len, 4);
        assert_eq!(hit.id, trie.lookup("hoge"));
        assert_eq!(trie.prefix_search("h", PrefixMatch::Key), None);
        assert_eq!(trie.prefix_search("", PrefixMatch::Key), None);
    }

    #[test]
    fn prefix_search_path_mode() {
        let trie = hoge();
        let hit = trie.prefix_search("hogeshaa", PrefixMatch::Path).unwrap();
        assert_eq!(hit.len, 6);
        assert_eq!(hit.id, None);
        let hit = trie.prefix_search("xyz", PrefixMatch::Path).unwrap();
        assert_eq!(hit.len, 0);
        let hit = trie.prefix_search("hoge", PrefixMatch::Path).unwrap();
        assert_eq!(hit.len, 4);
        assert_eq!(hit.id, trie.lookup("hoge"));
    }

    #[test]
    fn empty_key_matches_everything() {
        let trie = Trie::build(["", "a"]).unwrap();
        let hit = trie.prefix_search("xyz", PrefixMatch::Key).unwrap();
        assert_eq!(hit.len, 0);
        assert_eq!(hit.id, trie.lookup(""));
    }

    #[test]
    fn navigation_on_small_trie() {
        let trie = Trie::build(["a", "ab", "ac"]).unwrap();
        // root -> a -> {b, c}
        assert_eq!(trie.children(ROOT), (1, 1));
        assert_eq!(trie.child(ROOT, b'a'), Some(1));
        assert_eq!(trie.children(1), (2, 2));
        assert_eq!(trie.child(1, b'c'), Some(3));
        assert_eq!(trie.child(1, b'd'), None);
        assert_eq!(trie.parent(3), 1);
        assert_eq!(trie.parent(1), ROOT);
        assert_eq!(trie.label(2), b'b');
    }

    #[test]
    fn serialization_round_trip() {
        let trie = hoge();
        let bytes = trie.to_bytes();
        let loaded = Trie::from_bytes(&bytes).unwrap();
        assert_eq!(trie, loaded);
        for word in HOGE {
            assert_eq!(trie.lookup(word), loaded.lookup(word));
        }
    }

    #[test]
    fn write_to_matches_to_bytes() {
        let trie = hoge();
        let mut buf = Vec::new();
        trie.write_to(&mut buf).unwrap();
        assert_eq!(buf, trie.to_bytes());
    }

    #[test]
    fn from_bytes_unaligned() {
        let trie = hoge();
        let mut shifted = vec![0u8];
        shifted.extend_from_slice(&trie.to_bytes());
        assert_eq!(Trie::from_bytes(&shifted[1..]).unwrap(), trie);
    }

    #[test]
    fn reject_truncated() {
        let bytes = hoge().to_bytes();
        let err = Trie::from_bytes(&bytes[..bytes.len() - 8]).unwrap_err();
        assert!(matches!(err, TrieError::LengthMismatch { .. }));
        let err = Trie::from_bytes(&bytes[..20]).unwrap_err();
        assert!(matches!(err, TrieError::TooShort { .. }));
    }

    #[test]
    fn reject_wrong_key_count() {
        let mut bytes = hoge().to_bytes();
        bytes[HEADER_SIZE + 8..HEADER_SIZE + 16].copy_from_slice(&5u64.to_ne_bytes());
        let err = Trie::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, TrieError::Corrupt(_)));
    }

    #[test]
    fn reject_zero_nodes() {
        let mut bytes = hoge().to_bytes();
        bytes[HEADER_SIZE..HEADER_SIZE + 8].copy_from_slice(&0u64.to_ne_bytes());
        let err = Trie::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, TrieError::Corrupt(_)));
    }

    #[test]
    fn reject_unordered_siblings() {
        let trie = Trie::build(["a", "b"]).unwrap();
        let mut bytes = trie.to_bytes();
        // Labels start after header and counts: root, 'a', 'b'.
        let labels = HEADER_SIZE + COUNTS_SIZE;
        bytes.swap(labels + 1, labels + 2);
        let err = Trie::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, TrieError::Corrupt(_)));
    }

    #[test]
    fn reject_node_that_is_its_own_child() {
        // Root without children, node 1 listing itself as a child.
        let mut bytes = Vec::new();
        format::write_header(&mut bytes);
        bytes.extend_from_slice(&2u64.to_ne_bytes());
        bytes.extend_from_slice(&1u64.to_ne_bytes());
        bytes.extend_from_slice(&[0, b'a']);
        format::pad_to_section(&mut bytes);
        bytes.extend_from_slice(&0b1_0_0_1u64.to_ne_bytes());
        bytes.extend_from_slice(&0b10u64.to_ne_bytes());
        let err = Trie::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, TrieError::Corrupt(_)));
    }

    #[test]
    fn reject_garbage() {
        let err = Trie::from_bytes(b"not a dictionary at all, sorry").unwrap_err();
        assert!(matches!(err, TrieError::InvalidMagic));
    }
}
