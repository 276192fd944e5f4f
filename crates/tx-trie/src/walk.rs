// Query walks: common-prefix and predictive enumeration
//
// Each walk owns its traversal state (the current node, the explicit DFS
// stack and the key buffer), so concurrent walks over one shared `Trie`
// never touch shared mutable state.

use tx_core::KeyId;

use crate::trie::{ROOT, Trie};

/// Iterator over the keys that are prefixes of a query, shortest first.
///
/// Yields `(id, length)`: the key is `query[..length]`.
pub struct CommonPrefixes<'a> {
    trie: &'a Trie,
    query: &'a [u8],
    /// Node for `query[..depth]`, or `None` once the path leaves the trie.
    node: Option<usize>,
    depth: usize,
}

impl<'a> CommonPrefixes<'a> {
    pub(crate) fn new(trie: &'a Trie, query: &'a [u8]) -> Self {
        Self {
            trie,
            query,
            node: Some(ROOT),
            depth: 0,
        }
    }
}

impl Iterator for CommonPrefixes<'_> {
    type Item = (KeyId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.node?;
            let depth = self.depth;

            // Advance before yielding so the next call resumes below `node`.
            self.node = match self.query.get(depth) {
                Some(&label) => self.trie.child(node, label),
                None => None,
            };
            self.depth += 1;

            if let Some(id) = self.trie.key_id(node) {
                return Some((id, depth));
            }
        }
    }
}

/// Iterator over the keys that start with a query, in pre-order.
///
/// Children are visited in label order, so keys come out in
/// byte-lexicographic order. Yields `(id, key)`.
pub struct Expansions<'a> {
    trie: &'a Trie,
    /// Pending `(node, key length at that node)` pairs.
    stack: Vec<(usize, usize)>,
    /// Bytes of the most recently visited node's key.
    key: Vec<u8>,
    /// Length of the query; the start node is the only entry this short.
    base_len: usize,
}

impl<'a> Expansions<'a> {
    pub(crate) fn new(trie: &'a Trie, query: &[u8]) -> Self {
        let stack = match trie.walk(query) {
            Some(node) => vec![(node, query.len())],
            None => Vec::new(),
        };
        Self {
            trie,
            stack,
            key: query.to_vec(),
            base_len: query.len(),
        }
    }
}

impl Iterator for Expansions<'_> {
    type Item = (KeyId, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, len)) = self.stack.pop() {
            if len > self.base_len {
                // The parent's key is still a prefix of the buffer: every
                // popped node is a child of a node on the current path.
                self.key.truncate(len - 1);
                self.key.push(self.trie.label(node));
            }

            let (first, degree) = self.trie.children(node);
            for child in (first..first + degree).rev() {
                self.stack.push((child, len + 1));
            }

            if let Some(id) = self.trie.key_id(node) {
                return Some((id, self.key.clone()));
            }
        }
        None
    }
}
