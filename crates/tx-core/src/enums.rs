// Shared enums and limit constants

/// Which trie positions count as the end of a prefix match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PrefixMatch {
    /// Only positions where a stored key ends. The match length is the length
    /// of the longest key that is a prefix of the query.
    #[default]
    Key,
    /// Any position on the trie path. The match length is the length of the
    /// longest prefix the query shares with some stored key.
    Path,
}

/// Result limit meaning "no limit" when passed to the search operations.
pub const UNLIMITED: usize = 0;

/// Normalize a caller-supplied result limit: `0` means unbounded.
#[inline]
pub fn effective_limit(limit: usize) -> usize {
    if limit == UNLIMITED { usize::MAX } else { limit }
}
