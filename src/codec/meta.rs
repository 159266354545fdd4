use std::collections::BTreeMap;
use std::fmt;

use ahash::AHashMap;

use super::{DocValuesType, FieldShape, NumericFormat, VERSION_GCD_COMPRESSION};
use crate::core::DocValuesError;
use crate::packed::check_packed_version;
use crate::store::IndexInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NumericEntry {
    pub offset: u64,
    pub format: NumericFormat,
    pub packed_version: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BinaryEntry {
    pub offset: u64,
    pub num_bytes: u64,
    pub min_len: u32,
    pub max_len: u32,
    pub packed_version: i32,
    pub block_size: i32,
}

impl BinaryEntry {
    pub fn is_fixed(&self) -> bool {
        self.min_len == self.max_len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DictionaryEntry {
    pub offset: u64,
    pub value_count: u64,
}

/// Everything the metadata file says about a segment's fields.
#[derive(Debug, Default)]
pub(crate) struct FieldEntries {
    pub numerics: AHashMap<u32, NumericEntry>,
    pub binaries: AHashMap<u32, BinaryEntry>,
    pub dictionaries: AHashMap<u32, DictionaryEntry>,
    pub kinds: BTreeMap<u32, DocValuesType>,
}

/// One line of [`DocValuesReader::fields`](super::DocValuesReader::fields).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSummary {
    pub field: u32,
    pub kind: DocValuesType,
    /// Storage layout, e.g. `gcd`, `variable 0..=17` or `delta, 12 terms`.
    pub encoding: String,
}

impl fmt::Display for FieldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field {} {} ({})", self.field, self.kind, self.encoding)
    }
}

fn corrupt(input: &IndexInput, msg: String) -> DocValuesError {
    DocValuesError::CorruptIndex(format!("{msg} (resource: {})", input.name()))
}

fn read_offset(meta: &mut IndexInput, what: &str) -> Result<u64, DocValuesError> {
    let v = meta.read_long()?;
    u64::try_from(v).map_err(|_| corrupt(meta, format!("negative {what}: {v}")))
}

impl FieldEntries {
    /// Parse entries up to the `-1` terminator.
    pub fn read(meta: &mut IndexInput, version: i32) -> Result<Self, DocValuesError> {
        let mut entries = FieldEntries::default();
        loop {
            let field_number = meta.read_vint()?;
            if field_number == -1 {
                break;
            }
            let field = u32::try_from(field_number)
                .map_err(|_| corrupt(meta, format!("invalid field number: {field_number}")))?;
            let shape = FieldShape::try_from(meta.read_byte()?)?;
            let duplicate = match shape {
                FieldShape::Numeric => {
                    let entry = Self::read_numeric(meta, field, version)?;
                    entries.numerics.insert(field, entry).is_some()
                }
                FieldShape::Binary => {
                    let entry = Self::read_binary(meta, field)?;
                    entries.binaries.insert(field, entry).is_some()
                }
                FieldShape::Dictionary => {
                    let offset = read_offset(meta, "dictionary offset")?;
                    let count = meta.read_vlong()?;
                    let value_count = u64::try_from(count)
                        .map_err(|_| corrupt(meta, format!("field {field}: negative value count {count}")))?;
                    entries.dictionaries.insert(
                        field,
                        DictionaryEntry {
                            offset,
                            value_count,
                        },
                    )
                    .is_some()
                }
            };
            if duplicate {
                return Err(corrupt(
                    meta,
                    format!("duplicate {shape:?} entry for field {field}"),
                ));
            }
        }
        entries.resolve_kinds(meta)?;
        Ok(entries)
    }

    fn read_numeric(
        meta: &mut IndexInput,
        field: u32,
        version: i32,
    ) -> Result<NumericEntry, DocValuesError> {
        let offset = read_offset(meta, "data offset")?;
        let format = NumericFormat::try_from(meta.read_byte()?)?;
        if format == NumericFormat::Gcd && version < VERSION_GCD_COMPRESSION {
            return Err(corrupt(
                meta,
                format!("field {field}: gcd compression in format version {version}"),
            ));
        }
        let packed_version = if format == NumericFormat::Uncompressed {
            0
        } else {
            check_packed_version(meta.read_vint()?)?
        };
        Ok(NumericEntry {
            offset,
            format,
            packed_version,
        })
    }

    fn read_binary(meta: &mut IndexInput, field: u32) -> Result<BinaryEntry, DocValuesError> {
        let offset = read_offset(meta, "data offset")?;
        let num_bytes = read_offset(meta, "byte count")?;
        let min = meta.read_vint()?;
        let max = meta.read_vint()?;
        if min < 0 || min > max {
            return Err(corrupt(
                meta,
                format!("field {field}: invalid length range {min}..={max}"),
            ));
        }
        let (packed_version, block_size) = if min == max {
            (0, 0)
        } else {
            (check_packed_version(meta.read_vint()?)?, meta.read_vint()?)
        };
        Ok(BinaryEntry {
            offset,
            num_bytes,
            min_len: min as u32,
            max_len: max as u32,
            packed_version,
            block_size,
        })
    }

    /// A dictionary pairs with either an ordinal stream (sorted) or an
    /// ordinal-list stream (sorted set), never both and never neither.
    fn resolve_kinds(&mut self, meta: &IndexInput) -> Result<(), DocValuesError> {
        let mut fields: Vec<u32> = self
            .numerics
            .keys()
            .chain(self.binaries.keys())
            .chain(self.dictionaries.keys())
            .copied()
            .collect();
        fields.sort_unstable();
        fields.dedup();
        for field in fields {
            let kind = match (
                self.numerics.contains_key(&field),
                self.binaries.contains_key(&field),
                self.dictionaries.contains_key(&field),
            ) {
                (true, false, false) => DocValuesType::Numeric,
                (false, true, false) => DocValuesType::Binary,
                (true, false, true) => DocValuesType::Sorted,
                (false, true, true) => DocValuesType::SortedSet,
                _ => {
                    return Err(corrupt(
                        meta,
                        format!("field {field}: inconsistent combination of entries"),
                    ));
                }
            };
            self.kinds.insert(field, kind);
        }
        Ok(())
    }

    pub fn summary(&self, field: u32, kind: DocValuesType) -> FieldSummary {
        let numeric = |f: u32| self.numerics.get(&f).map(|e| e.format.to_string());
        let binary = |f: u32| {
            self.binaries.get(&f).map(|e| {
                if e.is_fixed() {
                    format!("fixed {}", e.min_len)
                } else {
                    format!("variable {}..={}", e.min_len, e.max_len)
                }
            })
        };
        let terms = |f: u32| {
            self.dictionaries
                .get(&f)
                .map_or(0, |d| d.value_count)
        };
        let encoding = match kind {
            DocValuesType::Numeric => numeric(field).unwrap_or_default(),
            DocValuesType::Binary => binary(field).unwrap_or_default(),
            DocValuesType::Sorted => {
                format!("{}, {} terms", numeric(field).unwrap_or_default(), terms(field))
            }
            DocValuesType::SortedSet => {
                format!("{}, {} terms", binary(field).unwrap_or_default(), terms(field))
            }
        };
        FieldSummary {
            field,
            kind,
            encoding,
        }
    }
}
