//! Per-segment doc-values codec.
//!
//! A segment's doc values live in two files: `<segment>.dvm` holds one small
//! entry per field and is read eagerly at open, `<segment>.dvd` holds the
//! payloads and is decoded lazily, field by field.

mod bits;
mod cache;
mod classifier;
mod copy;
mod meta;
mod reader;
mod values;
mod writer;

pub use bits::DocsWithField;
pub use classifier::{NumericStrategy, classify};
pub use copy::copy_fields;
pub use meta::FieldSummary;
pub use reader::DocValuesReader;
pub use values::{
    BinaryDocValues, NumericDocValues, SortedDocValues, SortedSetDocValues, SortedSetOrds,
};
pub use writer::DocValuesWriter;

use std::fmt;

use crate::core::DocValuesError;

pub const DATA_CODEC: &str = "DocValuesData";
pub const DATA_EXTENSION: &str = "dvd";
pub const META_CODEC: &str = "DocValuesMetadata";
pub const META_EXTENSION: &str = "dvm";

pub const VERSION_START: i32 = 0;
pub const VERSION_GCD_COMPRESSION: i32 = 1;
pub const VERSION_CHECKSUM: i32 = 2;
pub const VERSION_CURRENT: i32 = VERSION_CHECKSUM;

/// Default values per block for block-packed streams.
pub const BLOCK_SIZE: u32 = 4096;

/// Longest value a binary field may hold.
pub const MAX_BINARY_FIELD_LENGTH: usize = (1 << 15) - 2;

/// Returned by [`SortedSetDocValues::next_ord`] once a document's ordinals
/// are exhausted.
pub const NO_MORE_ORDS: i64 = -1;

/// Distinct values a lookup table may hold.
pub(crate) const MAX_TABLE_SIZE: usize = 256;

/// Meta entry discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Numeric,
    Binary,
    Dictionary,
}

impl FieldShape {
    pub fn tag(self) -> u8 {
        match self {
            FieldShape::Numeric => 0,
            FieldShape::Binary => 1,
            FieldShape::Dictionary => 2,
        }
    }
}

impl TryFrom<u8> for FieldShape {
    type Error = DocValuesError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(FieldShape::Numeric),
            1 => Ok(FieldShape::Binary),
            2 => Ok(FieldShape::Dictionary),
            _ => Err(DocValuesError::CorruptIndex(format!(
                "invalid entry type: {tag}"
            ))),
        }
    }
}

/// How a numeric field's payload is laid out in the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericFormat {
    Delta,
    Table,
    Uncompressed,
    Gcd,
}

impl NumericFormat {
    pub fn tag(self) -> u8 {
        match self {
            NumericFormat::Delta => 0,
            NumericFormat::Table => 1,
            NumericFormat::Uncompressed => 2,
            NumericFormat::Gcd => 3,
        }
    }
}

impl TryFrom<u8> for NumericFormat {
    type Error = DocValuesError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(NumericFormat::Delta),
            1 => Ok(NumericFormat::Table),
            2 => Ok(NumericFormat::Uncompressed),
            3 => Ok(NumericFormat::Gcd),
            _ => Err(DocValuesError::CorruptIndex(format!(
                "unknown numeric format: {tag}"
            ))),
        }
    }
}

impl fmt::Display for NumericFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumericFormat::Delta => "delta",
            NumericFormat::Table => "table",
            NumericFormat::Uncompressed => "uncompressed",
            NumericFormat::Gcd => "gcd",
        };
        f.write_str(name)
    }
}

/// What a field holds, as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocValuesType {
    Numeric,
    Binary,
    Sorted,
    SortedSet,
}

impl fmt::Display for DocValuesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocValuesType::Numeric => "numeric",
            DocValuesType::Binary => "binary",
            DocValuesType::Sorted => "sorted",
            DocValuesType::SortedSet => "sorted_set",
        };
        f.write_str(name)
    }
}
