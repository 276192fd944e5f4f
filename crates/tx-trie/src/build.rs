// Breadth-first trie construction from a sorted, deduplicated key set

use std::collections::VecDeque;
use std::ops::Range;

use tx_core::KeyId;

use crate::TrieError;
use crate::bits::BitVectorBuilder;
use crate::trie::Trie;

/// Largest node count the 32-bit rank directory can address.
const MAX_NODES: usize = u32::MAX as usize;

/// Build a trie from an arbitrary collection of keys.
///
/// Keys are sorted and deduplicated first, so the result (and every key id)
/// depends only on the set of distinct keys, never on insertion order.
///
/// Nodes are laid out level by level with siblings ordered by label byte.
/// Key ids number the terminal nodes in that order, which sorts keys by
/// length first and bytes second.
pub fn build_trie<I, K>(keys: I) -> Result<Trie, TrieError>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    let mut keys: Vec<Vec<u8>> = keys.into_iter().map(|k| k.as_ref().to_vec()).collect();
    keys.sort_unstable();
    keys.dedup();
    build_sorted(&keys)
}

/// Build from keys that are already strictly increasing.
pub fn build_sorted(keys: &[Vec<u8>]) -> Result<Trie, TrieError> {
    debug_assert!(keys.windows(2).all(|w| w[0] < w[1]), "keys must be sorted and unique");

    if keys.is_empty() {
        return Err(TrieError::EmptyKeySet);
    }
    if keys.len() > KeyId::MAX as usize {
        return Err(TrieError::TooManyKeys(keys.len()));
    }

    // Upper bound on node count: one per key byte plus the root.
    let node_hint = keys.iter().map(Vec::len).sum::<usize>().saturating_add(1);

    // Super root: a single child (the root) followed by its terminator.
    let mut louds = BitVectorBuilder::with_capacity(2 * node_hint.min(1 << 24) + 1);
    louds.push(true);
    louds.push(false);
    let mut terminals = BitVectorBuilder::with_capacity(node_hint.min(1 << 24));
    let mut labels: Vec<u8> = vec![0];

    // Each queued node owns the range of keys passing through it; all keys
    // in the range share their first `depth` bytes.
    let mut queue: VecDeque<(Range<usize>, usize)> = VecDeque::new();
    queue.push_back((0..keys.len(), 0));

    while let Some((range, depth)) = queue.pop_front() {
        let mut lo = range.start;

        // Sorted order puts the key that ends here (if any) first.
        let terminal = keys[lo].len() == depth;
        terminals.push(terminal);
        if terminal {
            lo += 1;
        }

        while lo < range.end {
            let label = keys[lo][depth];
            let mut hi = lo + 1;
            while hi < range.end && keys[hi][depth] == label {
                hi += 1;
            }
            louds.push(true);
            labels.push(label);
            queue.push_back((lo..hi, depth + 1));
            lo = hi;
        }
        louds.push(false);

        if labels.len() > MAX_NODES {
            return Err(TrieError::TooManyNodes(labels.len()));
        }
    }

    Ok(Trie::from_parts(labels, louds.finish(), terminals.finish()))
}
