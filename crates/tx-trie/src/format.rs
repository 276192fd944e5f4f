// Dictionary artifact layout: header parsing, validation and section framing

use crate::TrieError;

/// Header magic constants, stored in native byte order.
const COOKIE1: u32 = 0x5478_4C31;
const COOKIE2: u32 = 0x0002_D1C7;

/// Current artifact format version.
pub const FORMAT_VERSION: u8 = 1;

/// Size of the artifact header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Size of the count block (node count + key count) following the header.
pub const COUNTS_SIZE: usize = 16;

/// Alignment of the bit vector sections.
pub const SECTION_ALIGN: usize = 8;

/// Parsed artifact header.
///
/// The header occupies the first 16 bytes of a dictionary file:
/// - bytes 0..4: cookie1 (magic number)
/// - bytes 4..8: cookie2 (magic number)
/// - byte 8: format version
/// - bytes 9..16: reserved (zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieHeader {
    pub version: u8,
}

/// Parses and validates the 16-byte artifact header.
///
/// Cookies are compared in native byte order, so an artifact written on a
/// machine of the opposite endianness fails with [`TrieError::InvalidMagic`].
pub fn parse_header(data: &[u8]) -> Result<TrieHeader, TrieError> {
    if data.len() < HEADER_SIZE {
        return Err(TrieError::TooShort {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }

    let cookie1 = u32::from_ne_bytes([data[0], data[1], data[2], data[3]]);
    let cookie2 = u32::from_ne_bytes([data[4], data[5], data[6], data[7]]);

    if cookie1 != COOKIE1 || cookie2 != COOKIE2 {
        return Err(TrieError::InvalidMagic);
    }

    let version = data[8];
    if version != FORMAT_VERSION {
        return Err(TrieError::UnsupportedVersion(version));
    }

    Ok(TrieHeader { version })
}

/// Encodes the header for the current format version.
pub fn write_header(out: &mut Vec<u8>) {
    out.extend_from_slice(&COOKIE1.to_ne_bytes());
    out.extend_from_slice(&COOKIE2.to_ne_bytes());
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&[0u8; HEADER_SIZE - 9]);
}

/// Byte ranges of the sections of an artifact holding `node_count` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLayout {
    pub labels: (usize, usize),
    pub louds: (usize, usize),
    pub terminals: (usize, usize),
}

impl SectionLayout {
    /// Computes the layout, or `None` if the sizes overflow `usize`.
    pub fn for_nodes(node_count: usize) -> Option<Self> {
        let labels_start = HEADER_SIZE + COUNTS_SIZE;
        let labels_end = labels_start.checked_add(node_count)?;
        let louds_start = align_up(labels_end)?;
        let louds_bits = node_count.checked_mul(2)?.checked_add(1)?;
        let louds_end = louds_start.checked_add(words_for(louds_bits).checked_mul(8)?)?;
        let terminals_end = louds_end.checked_add(words_for(node_count).checked_mul(8)?)?;
        Some(Self {
            labels: (labels_start, labels_end),
            louds: (louds_start, louds_end),
            terminals: (louds_end, terminals_end),
        })
    }

    /// Total artifact size in bytes.
    #[inline]
    pub fn total_len(&self) -> usize {
        self.terminals.1
    }
}

/// Number of `u64` words needed to hold `bits` bits.
#[inline]
pub fn words_for(bits: usize) -> usize {
    bits.div_ceil(64)
}

#[inline]
fn align_up(offset: usize) -> Option<usize> {
    let partial = offset % SECTION_ALIGN;
    if partial > 0 {
        offset.checked_add(SECTION_ALIGN - partial)
    } else {
        Some(offset)
    }
}

/// Pads `out` with zero bytes up to the next section boundary.
pub fn pad_to_section(out: &mut Vec<u8>) {
    let partial = out.len() % SECTION_ALIGN;
    if partial > 0 {
        out.extend(std::iter::repeat_n(0u8, SECTION_ALIGN - partial));
    }
}

/// Reads a native-endian `u64` at `offset`. The caller checks bounds.
#[inline]
pub fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[offset..offset + 8]);
    u64::from_ne_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_header() -> Vec<u8> {
        let mut buf = Vec::new();
        write_header(&mut buf);
        buf
    }

    #[test]
    fn header_is_sixteen_bytes() {
        assert_eq!(make_header().len(), HEADER_SIZE);
    }

    #[test]
    fn parse_written_header() {
        let header = parse_header(&make_header()).unwrap();
        assert_eq!(header.version, FORMAT_VERSION);
    }

    #[test]
    fn reject_too_short() {
        let data = [0u8; 8];
        let err = parse_header(&data).unwrap_err();
        assert!(matches!(
            err,
            TrieError::TooShort {
                expected: 16,
                actual: 8
            }
        ));
    }

    #[test]
    fn reject_invalid_magic() {
        let mut data = make_header();
        data[0] ^= 0xFF;
        let err = parse_header(&data).unwrap_err();
        assert!(matches!(err, TrieError::InvalidMagic));
    }

    #[test]
    fn reject_swapped_byte_order() {
        let mut data = vec![0u8; HEADER_SIZE];
        data[..4].copy_from_slice(&COOKIE1.swap_bytes().to_ne_bytes());
        data[4..8].copy_from_slice(&COOKIE2.swap_bytes().to_ne_bytes());
        data[8] = FORMAT_VERSION;
        let err = parse_header(&data).unwrap_err();
        assert!(matches!(err, TrieError::InvalidMagic));
    }

    #[test]
    fn reject_future_version() {
        let mut data = make_header();
        data[8] = FORMAT_VERSION + 1;
        let err = parse_header(&data).unwrap_err();
        assert!(matches!(err, TrieError::UnsupportedVersion(v) if v == FORMAT_VERSION + 1));
    }

    #[test]
    fn layout_single_node() {
        // Root only: 1 label byte, 3 LOUDS bits, 1 terminal bit.
        let layout = SectionLayout::for_nodes(1).unwrap();
        assert_eq!(layout.labels, (32, 33));
        assert_eq!(layout.louds, (40, 48));
        assert_eq!(layout.terminals, (48, 56));
        assert_eq!(layout.total_len(), 56);
    }

    #[test]
    fn layout_aligns_labels() {
        let layout = SectionLayout::for_nodes(8).unwrap();
        assert_eq!(layout.labels, (32, 40));
        assert_eq!(layout.louds.0, 40);
        // 17 LOUDS bits fit in one word.
        assert_eq!(layout.louds.1, 48);
    }

    #[test]
    fn layout_overflow_is_none() {
        assert!(SectionLayout::for_nodes(usize::MAX).is_none());
    }

    #[test]
    fn padding() {
        let mut buf = vec![1u8; 33];
        pad_to_section(&mut buf);
        assert_eq!(buf.len(), 40);
        assert!(buf[33..].iter().all(|&b| b == 0));
        pad_to_section(&mut buf);
        assert_eq!(buf.len(), 40);
    }
}
