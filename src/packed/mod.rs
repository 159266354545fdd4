//! Bit-packed integer sequences.
//!
//! Three layers, each used by the doc-values codec:
//! - [`PackedWriter`] / [`PackedReader`]: a flat array of `n` values at a
//!   fixed bit width, in one of two [`Format`]s.
//! - [`BlockPackedWriter`] / [`BlockPackedReader`]: fixed-size blocks, each
//!   storing its own minimum plus bit-packed deltas at the block's own width.
//! - [`MonotonicBlockPackedWriter`] / [`MonotonicBlockPackedReader`]: blocks of
//!   non-decreasing values stored as residuals from a per-block linear fit.

mod block;
mod ints;
mod monotonic;

pub use block::{BlockPackedReader, BlockPackedWriter};
pub use ints::{PackedReader, PackedWriter};
pub use monotonic::{MonotonicBlockPackedReader, MonotonicBlockPackedWriter};

use crate::core::DocValuesError;

/// No memory overhead at all, but the slowest decoding.
pub const COMPACT: f32 = 0.0;
/// Up to 25% wider than necessary.
pub const DEFAULT: f32 = 0.25;
/// Up to 50% wider than necessary.
pub const FAST: f32 = 0.5;
/// Up to 700% wider: always pick a byte-aligned width when one exists.
pub const FASTEST: f32 = 7.0;

/// Byte count rounded up to whole 64-bit words.
pub const VERSION_START: i32 = 0;
/// Byte count rounded up to whole bytes.
pub const VERSION_BYTE_ALIGNED: i32 = 1;
pub const VERSION_CURRENT: i32 = VERSION_BYTE_ALIGNED;

pub const MIN_BLOCK_SIZE: u32 = 64;
pub const MAX_BLOCK_SIZE: u32 = 1 << 27;

const PACKED_THREE_BLOCKS_MAX_SIZE: usize = i32::MAX as usize / 3;

/// Bits needed to store every value in `0..=max_value`. Never less than 1.
pub fn bits_required(max_value: i64) -> u32 {
    debug_assert!(max_value >= 0, "max_value must be non-negative");
    unsigned_bits_required(max_value)
}

/// Like [`bits_required`] but treats `bits` as an unsigned 64-bit value.
pub fn unsigned_bits_required(bits: i64) -> u32 {
    (64 - (bits as u64).leading_zeros()).max(1)
}

/// Largest value representable in `bits_per_value` bits, capped at `i64::MAX`.
pub fn max_value(bits_per_value: u32) -> i64 {
    if bits_per_value >= 64 {
        i64::MAX
    } else {
        !(!0i64 << bits_per_value)
    }
}

pub(crate) fn mask(bits_per_value: u32) -> u64 {
    if bits_per_value >= 64 {
        u64::MAX
    } else {
        (1u64 << bits_per_value) - 1
    }
}

#[inline]
pub fn zigzag_encode(v: i64) -> i64 {
    (v >> 63) ^ (v << 1)
}

#[inline]
pub fn zigzag_decode(v: i64) -> i64 {
    ((v as u64 >> 1) as i64) ^ -(v & 1)
}

/// Validate a block size and return its base-two logarithm.
pub fn check_block_size(block_size: u32) -> Result<u32, DocValuesError> {
    if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size) {
        return Err(DocValuesError::InvalidArgument(format!(
            "block size must be >= {MIN_BLOCK_SIZE} and <= {MAX_BLOCK_SIZE}, got {block_size}"
        )));
    }
    if !block_size.is_power_of_two() {
        return Err(DocValuesError::InvalidArgument(format!(
            "block size must be a power of two, got {block_size}"
        )));
    }
    Ok(block_size.trailing_zeros())
}

/// Same check on the read side, where a bad value means a damaged file.
pub(crate) fn check_stored_block_size(block_size: i32) -> Result<u32, DocValuesError> {
    u32::try_from(block_size)
        .map_err(|_| format!("negative block size {block_size}"))
        .and_then(|b| check_block_size(b).map_err(|e| e.to_string()))
        .map_err(DocValuesError::CorruptIndex)
}

pub(crate) fn check_packed_version(version: i32) -> Result<i32, DocValuesError> {
    if !(VERSION_START..=VERSION_CURRENT).contains(&version) {
        return Err(DocValuesError::CorruptIndex(format!(
            "unsupported packed ints version {version}"
        )));
    }
    Ok(version)
}

/// On-disk layout of a [`PackedReader`]'s values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Values laid end to end, most significant bit first.
    Packed,
    /// Whole values per 64-bit word, low bits first; the spare bits of each
    /// word are wasted.
    PackedSingleBlock,
}

impl Format {
    pub fn by_id(id: i32) -> Result<Self, DocValuesError> {
        match id {
            0 => Ok(Format::Packed),
            1 => Ok(Format::PackedSingleBlock),
            _ => Err(DocValuesError::CorruptIndex(format!(
                "unknown packed format id: {id}"
            ))),
        }
    }

    pub fn id(self) -> i32 {
        match self {
            Format::Packed => 0,
            Format::PackedSingleBlock => 1,
        }
    }

    pub fn is_supported(self, bits_per_value: u32) -> bool {
        match self {
            Format::Packed => (1..=64).contains(&bits_per_value),
            Format::PackedSingleBlock => matches!(
                bits_per_value,
                1 | 2 | 3 | 4 | 5 | 6 | 7 | 8 | 9 | 10 | 12 | 16 | 21 | 32
            ),
        }
    }

    /// Wasted bits per value.
    pub fn overhead_per_value(self, bits_per_value: u32) -> f32 {
        match self {
            Format::Packed => 0.0,
            Format::PackedSingleBlock => {
                let values_per_block = 64 / bits_per_value;
                let overhead = 64 % bits_per_value;
                overhead as f32 / values_per_block as f32
            }
        }
    }

    pub fn byte_count(self, version: i32, value_count: usize, bits_per_value: u32) -> usize {
        match self {
            Format::Packed => {
                let bits = value_count as u64 * bits_per_value as u64;
                if version < VERSION_BYTE_ALIGNED {
                    (bits.div_ceil(64) * 8) as usize
                } else {
                    bits.div_ceil(8) as usize
                }
            }
            Format::PackedSingleBlock => {
                let values_per_block = (64 / bits_per_value) as usize;
                value_count.div_ceil(values_per_block) * 8
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatAndBits {
    pub format: Format,
    pub bits_per_value: u32,
}

/// Pick the format and width that decode fastest for `bits_per_value`-bit
/// values while staying within `acceptable_overhead_ratio` extra bits.
pub fn fastest_format_and_bits(
    value_count: usize,
    bits_per_value: u32,
    acceptable_overhead_ratio: f32,
) -> FormatAndBits {
    let ratio = acceptable_overhead_ratio.clamp(COMPACT, FASTEST);
    let acceptable_overhead_per_value = ratio * bits_per_value as f32;
    let max_bits_per_value = bits_per_value + acceptable_overhead_per_value as u32;

    let packed = |bits| FormatAndBits {
        format: Format::Packed,
        bits_per_value: bits,
    };

    if bits_per_value <= 8 && max_bits_per_value >= 8 {
        return packed(8);
    }
    if bits_per_value <= 16 && max_bits_per_value >= 16 {
        return packed(16);
    }
    if bits_per_value <= 32 && max_bits_per_value >= 32 {
        return packed(32);
    }
    if bits_per_value <= 64 && max_bits_per_value >= 64 {
        return packed(64);
    }
    if value_count <= PACKED_THREE_BLOCKS_MAX_SIZE
        && bits_per_value <= 24
        && max_bits_per_value >= 24
    {
        return packed(24);
    }
    if value_count <= PACKED_THREE_BLOCKS_MAX_SIZE
        && bits_per_value <= 48
        && max_bits_per_value >= 48
    {
        return packed(48);
    }
    for bpv in bits_per_value..=max_bits_per_value {
        if Format::PackedSingleBlock.is_supported(bpv) {
            let overhead = Format::PackedSingleBlock.overhead_per_value(bpv);
            let acceptable = acceptable_overhead_per_value + bits_per_value as f32 - bpv as f32;
            if overhead <= acceptable {
                return FormatAndBits {
                    format: Format::PackedSingleBlock,
                    bits_per_value: bpv,
                };
            }
        }
    }
    packed(bits_per_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_required() {
        assert_eq!(bits_required(0), 1);
        assert_eq!(bits_required(1), 1);
        assert_eq!(bits_required(2), 2);
        assert_eq!(bits_required(255), 8);
        assert_eq!(bits_required(256), 9);
        assert_eq!(bits_required(i64::MAX), 63);
        assert_eq!(unsigned_bits_required(-1), 64);
    }

    #[test]
    fn test_max_value() {
        assert_eq!(max_value(1), 1);
        assert_eq!(max_value(8), 255);
        assert_eq!(max_value(63), i64::MAX);
        assert_eq!(max_value(64), i64::MAX);
    }

    #[test]
    fn test_zigzag() {
        for v in [0i64, 1, -1, 2, -2, i64::MAX, i64::MIN, 12345, -98765] {
            assert_eq!(zigzag_decode(zigzag_encode(v)), v);
        }
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(i64::MIN), -1);
    }

    #[test]
    fn test_check_block_size() {
        assert_eq!(check_block_size(4096).unwrap(), 12);
        assert_eq!(check_block_size(64).unwrap(), 6);
        assert!(check_block_size(32).is_err());
        assert!(check_block_size(1000).is_err());
        assert!(check_block_size(1 << 28).is_err());
        assert!(check_stored_block_size(-4096).unwrap_err().is_corruption());
    }

    #[test]
    fn test_byte_count() {
        assert_eq!(Format::Packed.byte_count(VERSION_BYTE_ALIGNED, 10, 3), 4);
        assert_eq!(Format::Packed.byte_count(VERSION_START, 10, 3), 8);
        assert_eq!(Format::PackedSingleBlock.byte_count(VERSION_CURRENT, 22, 3), 16);
        assert_eq!(Format::PackedSingleBlock.byte_count(VERSION_CURRENT, 21, 3), 8);
    }

    #[test]
    fn test_fastest_format_and_bits() {
        // 7 bits may grow by one bit at the default ratio: byte aligned wins
        assert_eq!(
            fastest_format_and_bits(100, 7, DEFAULT),
            FormatAndBits {
                format: Format::Packed,
                bits_per_value: 8
            }
        );
        // 6 + 1 < 8, so a single-block width is the best we can do
        assert_eq!(
            fastest_format_and_bits(100, 6, DEFAULT),
            FormatAndBits {
                format: Format::PackedSingleBlock,
                bits_per_value: 6
            }
        );
        // nothing fits at zero overhead except the exact width
        assert_eq!(
            fastest_format_and_bits(100, 11, COMPACT),
            FormatAndBits {
                format: Format::Packed,
                bits_per_value: 11
            }
        );
        assert_eq!(fastest_format_and_bits(100, 1, FASTEST).bits_per_value, 8);
        assert_eq!(fastest_format_and_bits(100, 20, DEFAULT).bits_per_value, 24);
    }

    #[test]
    fn test_unknown_format_id() {
        assert!(Format::by_id(2).unwrap_err().is_corruption());
        assert_eq!(Format::by_id(1).unwrap(), Format::PackedSingleBlock);
    }
}
