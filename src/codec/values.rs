//! Per-field accessors. All of them are immutable once loaded and may be
//! shared freely between threads.

use bytes::Bytes;

use super::meta::{BinaryEntry, NumericEntry};
use super::{MAX_TABLE_SIZE, NO_MORE_ORDS, NumericFormat};
use crate::core::DocValuesError;
use crate::dictionary::{TermDictionary, TermsEnum};
use crate::packed::{BlockPackedReader, Format, MonotonicBlockPackedReader, PackedReader};
use crate::store::{IndexInput, decode_vlong};

fn corrupt(input: &IndexInput, msg: String) -> DocValuesError {
    DocValuesError::CorruptIndex(format!("{msg} (resource: {})", input.name()))
}

/// Random access to a numeric field, one variant per storage layout.
#[derive(Debug)]
pub enum NumericDocValues {
    Delta(BlockPackedReader),
    Table {
        table: Box<[i64]>,
        ords: PackedReader,
    },
    Uncompressed(Bytes),
    Gcd {
        min: i64,
        gcd: i64,
        quotients: BlockPackedReader,
    },
}

impl NumericDocValues {
    pub(crate) fn load(
        input: &mut IndexInput,
        entry: &NumericEntry,
        max_doc: u32,
    ) -> Result<Self, DocValuesError> {
        input.seek(entry.offset)?;
        let max_doc = max_doc as usize;
        match entry.format {
            NumericFormat::Table => {
                let size = input.read_vint()?;
                if !(0..=MAX_TABLE_SIZE as i32).contains(&size) {
                    return Err(corrupt(
                        input,
                        format!("table cannot have more than {MAX_TABLE_SIZE} distinct values, got {size}"),
                    ));
                }
                let table = (0..size)
                    .map(|_| input.read_long())
                    .collect::<Result<Box<[i64]>, _>>()?;
                let format = Format::by_id(input.read_vint()?)?;
                let bits = input.read_vint()?;
                if !(1..=64).contains(&bits) {
                    return Err(corrupt(input, format!("invalid bits per value: {bits}")));
                }
                let ords =
                    PackedReader::read(input, format, entry.packed_version, max_doc, bits as u32)?;
                if let Some(doc) = (0..max_doc).find(|&doc| ords.get(doc) as u64 >= table.len() as u64) {
                    return Err(corrupt(
                        input,
                        format!("doc {doc}: table index {} out of {}", ords.get(doc), table.len()),
                    ));
                }
                Ok(NumericDocValues::Table { table, ords })
            }
            NumericFormat::Delta => {
                let block_size = input.read_vint()?;
                Ok(NumericDocValues::Delta(BlockPackedReader::read(
                    input,
                    entry.packed_version,
                    block_size,
                    max_doc,
                )?))
            }
            NumericFormat::Uncompressed => {
                Ok(NumericDocValues::Uncompressed(input.read_bytes(max_doc)?))
            }
            NumericFormat::Gcd => {
                let min = input.read_long()?;
                let gcd = input.read_long()?;
                let block_size = input.read_vint()?;
                let quotients =
                    BlockPackedReader::read(input, entry.packed_version, block_size, max_doc)?;
                Ok(NumericDocValues::Gcd {
                    min,
                    gcd,
                    quotients,
                })
            }
        }
    }

    /// Value of `doc`. Panics if `doc` is not below the segment's `max_doc`.
    #[inline]
    pub fn get(&self, doc: u32) -> i64 {
        let doc = doc as usize;
        match self {
            NumericDocValues::Delta(reader) => reader.get(doc),
            NumericDocValues::Table { table, ords } => table[ords.get(doc) as usize],
            NumericDocValues::Uncompressed(bytes) => bytemuck::cast_slice::<u8, i8>(bytes)[doc] as i64,
            NumericDocValues::Gcd {
                min,
                gcd,
                quotients,
            } => min.wrapping_add(gcd.wrapping_mul(quotients.get(doc))),
        }
    }

    pub fn format(&self) -> NumericFormat {
        match self {
            NumericDocValues::Delta(_) => NumericFormat::Delta,
            NumericDocValues::Table { .. } => NumericFormat::Table,
            NumericDocValues::Uncompressed(_) => NumericFormat::Uncompressed,
            NumericDocValues::Gcd { .. } => NumericFormat::Gcd,
        }
    }

    pub fn ram_bytes_used(&self) -> usize {
        std::mem::size_of::<Self>()
            + match self {
                NumericDocValues::Delta(reader) => reader.ram_bytes_used(),
                NumericDocValues::Table { table, ords } => table.len() * 8 + ords.ram_bytes_used(),
                NumericDocValues::Uncompressed(bytes) => bytes.len(),
                NumericDocValues::Gcd { quotients, .. } => quotients.ram_bytes_used(),
            }
    }
}

/// Random access to a binary field. Values are slices of the data file.
#[derive(Debug)]
pub enum BinaryDocValues {
    Fixed {
        bytes: Bytes,
        len: usize,
    },
    Variable {
        bytes: Bytes,
        addresses: MonotonicBlockPackedReader,
    },
}

impl BinaryDocValues {
    pub(crate) fn load(
        input: &mut IndexInput,
        entry: &BinaryEntry,
        max_doc: u32,
    ) -> Result<Self, DocValuesError> {
        input.seek(entry.offset)?;
        let num_bytes = usize::try_from(entry.num_bytes)
            .map_err(|_| corrupt(input, format!("byte count {} too large", entry.num_bytes)))?;
        let bytes = input.read_bytes(num_bytes)?;
        if entry.is_fixed() {
            let len = entry.min_len as usize;
            if len as u64 * max_doc as u64 != entry.num_bytes {
                return Err(corrupt(
                    input,
                    format!(
                        "fixed binary field of {max_doc} docs x {len} bytes stores {num_bytes} bytes"
                    ),
                ));
            }
            return Ok(BinaryDocValues::Fixed { bytes, len });
        }

        let addresses = MonotonicBlockPackedReader::read(
            input,
            entry.packed_version,
            entry.block_size,
            max_doc as usize,
        )?;
        let mut previous = 0i64;
        for doc in 0..max_doc as usize {
            let end = addresses.get(doc);
            if end < previous || end as u64 > entry.num_bytes {
                return Err(corrupt(
                    input,
                    format!("doc {doc}: address {end} outside {previous}..={num_bytes}"),
                ));
            }
            previous = end;
        }
        Ok(BinaryDocValues::Variable { bytes, addresses })
    }

    /// Value of `doc`. Panics if `doc` is not below the segment's `max_doc`.
    #[inline]
    pub fn get(&self, doc: u32) -> &[u8] {
        let range = self.range(doc);
        match self {
            BinaryDocValues::Fixed { bytes, .. } | BinaryDocValues::Variable { bytes, .. } => {
                &bytes[range]
            }
        }
    }

    /// Like [`get`](Self::get) but returns an owned, reference-counted slice.
    pub fn get_bytes(&self, doc: u32) -> Bytes {
        let range = self.range(doc);
        match self {
            BinaryDocValues::Fixed { bytes, .. } | BinaryDocValues::Variable { bytes, .. } => {
                bytes.slice(range)
            }
        }
    }

    fn range(&self, doc: u32) -> std::ops::Range<usize> {
        let doc = doc as usize;
        match self {
            BinaryDocValues::Fixed { len, .. } => doc * len..(doc + 1) * len,
            BinaryDocValues::Variable { addresses, .. } => {
                let start = if doc == 0 {
                    0
                } else {
                    addresses.get(doc - 1) as usize
                };
                start..addresses.get(doc) as usize
            }
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, BinaryDocValues::Fixed { .. })
    }

    pub fn ram_bytes_used(&self) -> usize {
        std::mem::size_of::<Self>()
            + match self {
                BinaryDocValues::Fixed { bytes, .. } => bytes.len(),
                BinaryDocValues::Variable { bytes, addresses } => {
                    bytes.len() + addresses.ram_bytes_used()
                }
            }
    }
}

/// Single-valued, dictionary-encoded string field.
#[derive(Debug)]
pub struct SortedDocValues {
    ords: NumericDocValues,
    dictionary: TermDictionary,
}

impl SortedDocValues {
    pub(crate) fn new(
        ords: NumericDocValues,
        dictionary: TermDictionary,
        max_doc: u32,
    ) -> Result<Self, DocValuesError> {
        let value_count = dictionary.len() as i64;
        if let Some(doc) = (0..max_doc).find(|&doc| {
            let ord = ords.get(doc);
            ord < -1 || ord >= value_count
        }) {
            return Err(DocValuesError::CorruptIndex(format!(
                "doc {doc}: ordinal {} outside -1..{value_count}",
                ords.get(doc)
            )));
        }
        Ok(Self { ords, dictionary })
    }

    /// Ordinal of `doc`'s value, `-1` if it has none.
    #[inline]
    pub fn ord(&self, doc: u32) -> i32 {
        self.ords.get(doc) as i32
    }

    /// The term `doc` holds, if any.
    pub fn get(&self, doc: u32) -> Option<&[u8]> {
        self.lookup_ord(self.ord(doc))
    }

    pub fn lookup_ord(&self, ord: i32) -> Option<&[u8]> {
        u64::try_from(ord)
            .ok()
            .and_then(|ord| self.dictionary.by_ord(ord))
    }

    /// Ordinal of `term`, or `-insertion_point - 1` when it is absent.
    pub fn lookup_term(&self, term: &[u8]) -> i64 {
        match self.dictionary.by_term(term) {
            Ok(ord) => ord as i64,
            Err(ip) => -(ip as i64) - 1,
        }
    }

    pub fn value_count(&self) -> u64 {
        self.dictionary.len()
    }

    pub fn terms(&self) -> TermsEnum<'_> {
        self.dictionary.terms()
    }

    pub fn ram_bytes_used(&self) -> usize {
        self.ords.ram_bytes_used() + self.dictionary.ram_bytes_used()
    }
}

/// Multi-valued, dictionary-encoded string field.
///
/// Each document's ordinals are stored as vlong deltas inside a binary
/// value. Use [`ords`](Self::ords) for one document or a reusable
/// [`cursor`](Self::cursor).
#[derive(Debug)]
pub struct SortedSetDocValues {
    ords: Option<BinaryDocValues>,
    dictionary: TermDictionary,
}

impl SortedSetDocValues {
    pub(crate) fn new(ords: BinaryDocValues, dictionary: TermDictionary) -> Self {
        Self {
            ords: Some(ords),
            dictionary,
        }
    }

    /// A field with no terms at all.
    pub fn empty() -> Self {
        Self {
            ords: None,
            dictionary: TermDictionary::default(),
        }
    }

    /// Cursor positioned on `doc`.
    pub fn ords(&self, doc: u32) -> SortedSetOrds<'_> {
        let mut cursor = self.cursor();
        cursor.set_document(doc);
        cursor
    }

    /// Unpositioned cursor; call [`SortedSetOrds::set_document`] first.
    pub fn cursor(&self) -> SortedSetOrds<'_> {
        SortedSetOrds {
            values: self,
            bytes: &[],
            pos: 0,
            current: 0,
        }
    }

    pub(crate) fn has_ords(&self, doc: u32) -> bool {
        self.ords.as_ref().is_some_and(|o| !o.get(doc).is_empty())
    }

    pub fn lookup_ord(&self, ord: i64) -> Option<&[u8]> {
        u64::try_from(ord)
            .ok()
            .and_then(|ord| self.dictionary.by_ord(ord))
    }

    /// Ordinal of `term`, or `-insertion_point - 1` when it is absent.
    pub fn lookup_term(&self, term: &[u8]) -> i64 {
        match self.dictionary.by_term(term) {
            Ok(ord) => ord as i64,
            Err(ip) => -(ip as i64) - 1,
        }
    }

    pub fn value_count(&self) -> u64 {
        self.dictionary.len()
    }

    pub fn terms(&self) -> TermsEnum<'_> {
        self.dictionary.terms()
    }

    pub fn ram_bytes_used(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.ords.as_ref().map_or(0, BinaryDocValues::ram_bytes_used)
            + self.dictionary.ram_bytes_used()
    }
}

/// Decoding cursor over one document's ordinals at a time.
#[derive(Debug, Clone)]
pub struct SortedSetOrds<'a> {
    values: &'a SortedSetDocValues,
    bytes: &'a [u8],
    pos: usize,
    current: i64,
}

impl<'a> SortedSetOrds<'a> {
    pub fn set_document(&mut self, doc: u32) {
        self.bytes = match &self.values.ords {
            Some(ords) => ords.get(doc),
            None => &[],
        };
        self.pos = 0;
        self.current = 0;
    }

    /// Next ordinal of the current document in ascending order, or
    /// [`NO_MORE_ORDS`] once they are exhausted.
    pub fn next_ord(&mut self) -> i64 {
        if self.pos >= self.bytes.len() {
            return NO_MORE_ORDS;
        }
        match decode_vlong(self.bytes, &mut self.pos) {
            Ok(delta) => {
                self.current = self.current.wrapping_add(delta);
                self.current
            }
            Err(_) => {
                self.pos = self.bytes.len();
                NO_MORE_ORDS
            }
        }
    }
}

impl Iterator for SortedSetOrds<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let ord = self.next_ord();
        (ord != NO_MORE_ORDS).then_some(ord as u64)
    }
}
