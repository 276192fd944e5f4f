// Rank/select bit vector backing the LOUDS tree and the terminal flags.

/// Number of 64-bit words covered by one rank directory entry (512 bits).
const BLOCK_WORDS: usize = 8;

/// Bits per storage word.
const WORD_BITS: usize = 64;

/// Append-only builder for a [`BitVector`].
#[derive(Debug, Default, Clone)]
pub struct BitVectorBuilder {
    words: Vec<u64>,
    len: usize,
}

impl BitVectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: Vec::with_capacity(bits.div_ceil(WORD_BITS)),
            len: 0,
        }
    }

    /// Append one bit.
    #[inline]
    pub fn push(&mut self, bit: bool) {
        let bit_index = self.len % WORD_BITS;
        if bit_index == 0 {
            self.words.push(0);
        }
        if bit {
            // The word was pushed above when bit_index == 0.
            let last = self.words.len() - 1;
            self.words[last] |= 1u64 << bit_index;
        }
        self.len += 1;
    }

    /// Number of bits pushed so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Freeze the bits and compute the rank directory.
    pub fn finish(self) -> BitVector {
        BitVector::from_words(self.words, self.len)
    }
}

/// Immutable bit sequence supporting constant-time `rank` and
/// logarithmic-time `select`.
///
/// Bits are stored little-end first in `u64` words. Bits past `len` in the
/// last word are always zero. The rank directory holds the number of ones
/// preceding every block of [`BLOCK_WORDS`] words, plus a trailing entry
/// with the total when the word count is a multiple of the block size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitVector {
    words: Vec<u64>,
    len: usize,
    ones: usize,
    ranks: Vec<u32>,
}

impl BitVector {
    /// Wrap raw words, computing the rank directory.
    ///
    /// The caller guarantees `words.len() == len.div_ceil(64)`; stray bits
    /// beyond `len` are cleared.
    pub fn from_words(mut words: Vec<u64>, len: usize) -> Self {
        debug_assert_eq!(words.len(), len.div_ceil(WORD_BITS));
        let tail = len % WORD_BITS;
        if tail != 0 {
            if let Some(last) = words.last_mut() {
                *last &= (1u64 << tail) - 1;
            }
        }

        let block_count = words.len() / BLOCK_WORDS + 1;
        let mut ranks = Vec::with_capacity(block_count);
        let mut ones: u32 = 0;
        for (i, w) in words.iter().enumerate() {
            if i % BLOCK_WORDS == 0 {
                ranks.push(ones);
            }
            ones += w.count_ones();
        }
        // Trailing entry so `rank1(len)` never indexes past the directory.
        while ranks.len() < block_count {
            ranks.push(ones);
        }

        Self {
            words,
            len,
            ones: ones as usize,
            ranks,
        }
    }

    /// Number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw storage words (used by the serializer).
    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Total number of set bits.
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.ones
    }

    /// Total number of clear bits.
    #[inline]
    pub fn count_zeros(&self) -> usize {
        self.len - self.count_ones()
    }

    /// Value of the bit at `pos`. Panics if `pos >= len`.
    #[inline]
    pub fn get(&self, pos: usize) -> bool {
        assert!(pos < self.len, "bit index {pos} out of range ({})", self.len);
        (self.words[pos / WORD_BITS] >> (pos % WORD_BITS)) & 1 == 1
    }

    /// Number of set bits in `[0, pos)`. `pos` may equal `len`.
    #[inline]
    pub fn rank1(&self, pos: usize) -> usize {
        debug_assert!(pos <= self.len);
        let word = pos / WORD_BITS;
        let block = word / BLOCK_WORDS;
        let mut rank = self.ranks[block] as usize;
        for w in &self.words[block * BLOCK_WORDS..word] {
            rank += w.count_ones() as usize;
        }
        let bit = pos % WORD_BITS;
        if bit != 0 {
            rank += (self.words[word] & ((1u64 << bit) - 1)).count_ones() as usize;
        }
        rank
    }

    /// Number of clear bits in `[0, pos)`.
    #[inline]
    pub fn rank0(&self, pos: usize) -> usize {
        pos - self.rank1(pos)
    }

    /// Position of the `k`-th set bit (0-based). Panics if `k >= count_ones()`.
    pub fn select1(&self, k: usize) -> usize {
        assert!(k < self.count_ones(), "select1({k}) out of range");
        // Last block whose preceding count is <= k.
        let block = self.ranks.partition_point(|&r| r as usize <= k) - 1;
        let mut remaining = k - self.ranks[block] as usize;
        for (i, &w) in self.words[block * BLOCK_WORDS..].iter().enumerate() {
            let ones = w.count_ones() as usize;
            if remaining < ones {
                return (block * BLOCK_WORDS + i) * WORD_BITS + select_in_word(w, remaining);
            }
            remaining -= ones;
        }
        unreachable!("rank directory inconsistent with words")
    }

    /// Position of the `k`-th clear bit (0-based). Panics if `k >= count_zeros()`.
    pub fn select0(&self, k: usize) -> usize {
        assert!(k < self.count_zeros(), "select0({k}) out of range");
        let zeros_before = |block: usize| -> usize {
            (block * BLOCK_WORDS * WORD_BITS).min(self.len) - self.ranks[block] as usize
        };
        // Binary search over blocks on the zero counts.
        let (mut lo, mut hi) = (0usize, self.ranks.len());
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if zeros_before(mid) <= k {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let mut remaining = k - zeros_before(lo);
        for (i, &w) in self.words[lo * BLOCK_WORDS..].iter().enumerate() {
            // Padding past `len` reads as zero here, but the k-th real zero
            // always comes first.
            let zeros = (!w).count_ones() as usize;
            if remaining < zeros {
                return (lo * BLOCK_WORDS + i) * WORD_BITS + select_in_word(!w, remaining);
            }
            remaining -= zeros;
        }
        unreachable!("rank directory inconsistent with words")
    }

    /// Approximate heap footprint in bytes.
    pub fn heap_size(&self) -> usize {
        self.words.len() * size_of::<u64>() + self.ranks.len() * size_of::<u32>()
    }
}

/// Position of the `k`-th set bit inside a single word.
#[inline]
fn select_in_word(mut word: u64, k: usize) -> usize {
    for _ in 0..k {
        word &= word - 1;
    }
    word.trailing_zeros() as usize
}
