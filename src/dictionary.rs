//! Ordinal dictionary: a sorted set of unique byte strings where the `n`th
//! smallest term has ordinal `n`.
//!
//! Terms are serialized front-coded (`vint shared_prefix, vint suffix_len,
//! suffix`). At load they are expanded into one buffer with an offset table
//! for ord -> term, and indexed by an FST map for term -> ord.

use std::fmt;

use fst::{IntoStreamer, Map, MapBuilder, Streamer};

use crate::core::DocValuesError;
use crate::store::{DataOutput, IndexInput};

/// Validates and serializes the dictionary for one field.
#[derive(Debug)]
pub struct DictionaryWriter<'a> {
    terms: Vec<&'a [u8]>,
}

impl<'a> DictionaryWriter<'a> {
    /// Terms must be strictly ascending in unsigned byte order.
    pub fn build<T: AsRef<[u8]>>(values: &'a [T]) -> Result<Self, DocValuesError> {
        let terms: Vec<&[u8]> = values.iter().map(AsRef::as_ref).collect();
        if let Some(i) = terms.windows(2).position(|w| w[0] >= w[1]) {
            return Err(DocValuesError::InvalidArgument(format!(
                "dictionary values must be strictly ascending: term {} is not greater than term {}",
                i + 1,
                i
            )));
        }
        Ok(Self { terms })
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Ordinal assigned to `term`, if present.
    pub fn ord(&self, term: &[u8]) -> Option<u64> {
        self.terms
            .binary_search_by(|t| (*t).cmp(term))
            .ok().map(|i| i as u64)
    }

    pub fn write<O: DataOutput + ?Sized>(&self, out: &mut O) -> Result<(), DocValuesError> {
        let mut last: &[u8] = &[];
        for term in &self.terms {
            let shared = last
                .iter()
                .zip(term.iter())
                .take_while(|(a, b)| a == b)
                .count();
            let suffix = &term[shared..];
            out.write_vint(shared as i32)?;
            out.write_vint(suffix.len() as i32)?;
            out.write_bytes(suffix)?;
            last = term;
        }
        Ok(())
    }
}

/// Read-only dictionary loaded from a data file.
#[derive(Clone, Default)]
pub struct TermDictionary {
    data: Vec<u8>,
    offsets: Vec<(u32, u32)>,
    // None for an empty dictionary
    index: Option<Map<Vec<u8>>>,
}

impl fmt::Debug for TermDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermDictionary")
            .field("terms", &self.offsets.len())
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl TermDictionary {
    pub fn load(input: &mut IndexInput, value_count: u64) -> Result<Self, DocValuesError> {
        // every serialized term takes at least two bytes
        if value_count > input.remaining() as u64 / 2 {
            return Err(DocValuesError::CorruptIndex(format!(
                "dictionary claims {value_count} terms but only {} bytes remain (resource={})",
                input.remaining(),
                input.name()
            )));
        }
        let mut data: Vec<u8> = Vec::new();
        let mut offsets = Vec::with_capacity(value_count as usize);
        let mut last = (0usize, 0usize);
        for ord in 0..value_count {
            let shared = input.read_vint()?;
            let suffix_len = input.read_vint()?;
            if shared < 0 || suffix_len < 0 || shared as usize > last.1 {
                return Err(DocValuesError::CorruptIndex(format!(
                    "term {ord}: invalid prefix {shared} / suffix {suffix_len} (resource={})",
                    input.name()
                )));
            }
            let start = data.len();
            data.extend_from_within(last.0..last.0 + shared as usize);
            data.extend_from_slice(input.read_slice(suffix_len as usize)?);
            let len = data.len() - start;
            if data.len() > u32::MAX as usize {
                return Err(DocValuesError::CorruptIndex(format!(
                    "dictionary larger than 4GiB (resource={})",
                    input.name()
                )));
            }
            offsets.push((start as u32, len as u32));
            last = (start, len);
        }

        let index = if offsets.is_empty() {
            None
        } else {
            let corrupt = |e: fst::Error| {
                DocValuesError::CorruptIndex(format!(
                    "dictionary terms out of order: {e} (resource={})",
                    input.name()
                ))
            };
            let mut builder = MapBuilder::memory();
            for (ord, &(off, len)) in offsets.iter().enumerate() {
                builder
                    .insert(&data[off as usize..(off + len) as usize], ord as u64)
                    .map_err(corrupt)?;
            }
            let bytes = builder.into_inner().map_err(corrupt)?;
            Some(Map::new(bytes).map_err(corrupt)?)
        };
        Ok(Self {
            data,
            offsets,
            index,
        })
    }

    #[inline]
    fn term_at(&self, idx: usize) -> &[u8] {
        let (off, len) = self.offsets[idx];
        &self.data[off as usize..(off + len) as usize]
    }

    pub fn by_ord(&self, ord: u64) -> Option<&[u8]> {
        usize::try_from(ord)
            .ok()
            .filter(|&i| i < self.offsets.len())
            .map(|i| self.term_at(i))
    }

    /// `Ok(ord)` when present, otherwise `Err(insertion_point)`.
    pub fn by_term(&self, term: &[u8]) -> Result<u64, u64> {
        let Some(index) = &self.index else {
            return Err(0);
        };
        if let Some(ord) = index.get(term) {
            return Ok(ord);
        }
        let mut ceil = index.range().gt(term).into_stream();
        match ceil.next() {
            Some((_, ord)) => Err(ord),
            None => Err(self.len()),
        }
    }

    pub fn len(&self) -> u64 {
        self.offsets.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.offsets.len()).map(|i| self.term_at(i))
    }

    pub fn terms(&self) -> TermsEnum<'_> {
        TermsEnum::new(self)
    }

    pub fn ram_bytes_used(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.data.capacity()
            + self.offsets.capacity() * 8
            + self.index.as_ref().map_or(0, |m| m.as_fst().as_bytes().len())
    }
}

/// Outcome of [`TermsEnum::seek_ceil`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekStatus {
    /// Positioned on the requested term.
    Found,
    /// Positioned on the smallest term greater than the requested one.
    NotFound,
    /// Every term is smaller; the enum is exhausted.
    End,
}

/// Cursor over a [`TermDictionary`] in ordinal order.
#[derive(Debug, Clone)]
pub struct TermsEnum<'a> {
    dict: &'a TermDictionary,
    // None before the first call to next/seek
    pos: Option<u64>,
}

impl<'a> TermsEnum<'a> {
    pub fn new(dict: &'a TermDictionary) -> Self {
        Self { dict, pos: None }
    }

    pub fn seek_ceil(&mut self, term: &[u8]) -> SeekStatus {
        match self.dict.by_term(term) {
            Ok(ord) => {
                self.pos = Some(ord);
                SeekStatus::Found
            }
            Err(ip) => {
                self.pos = Some(ip);
                if ip == self.dict.len() {
                    SeekStatus::End
                } else {
                    SeekStatus::NotFound
                }
            }
        }
    }

    pub fn seek_exact(&mut self, term: &[u8]) -> bool {
        self.seek_ceil(term) == SeekStatus::Found
    }

    pub fn seek_exact_ord(&mut self, ord: u64) -> Result<(), DocValuesError> {
        if ord >= self.dict.len() {
            return Err(DocValuesError::InvalidArgument(format!(
                "ord {ord} out of range, dictionary has {} terms",
                self.dict.len()
            )));
        }
        self.pos = Some(ord);
        Ok(())
    }

    /// Current term, `None` when unpositioned or exhausted.
    pub fn term(&self) -> Option<&'a [u8]> {
        self.pos.and_then(|p| self.dict.by_ord(p))
    }

    pub fn ord(&self) -> Option<u64> {
        self.pos.filter(|&p| p < self.dict.len())
    }
}

impl<'a> Iterator for TermsEnum<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.pos.map_or(0, |p| (p + 1).min(self.dict.len()));
        self.pos = Some(next);
        self.dict.by_ord(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let next = self.pos.map_or(0, |p| (p + 1).min(self.dict.len()));
        let remaining = (self.dict.len() - next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TermsEnum<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn dictionary(terms: &[&str]) -> TermDictionary {
        let writer = DictionaryWriter::build(terms).unwrap();
        let mut buf = Vec::new();
        writer.write(&mut buf).unwrap();
        let mut input = IndexInput::new("dict", Bytes::from(buf));
        let dict = TermDictionary::load(&mut input, terms.len() as u64).unwrap();
        assert_eq!(input.remaining(), 0);
        dict
    }

    #[test]
    fn test_lookups_both_directions() {
        let terms = ["apple", "applesauce", "apply", "banana", "band", "zebra"];
        let dict = dictionary(&terms);
        assert_eq!(dict.len(), 6);
        for (ord, term) in terms.iter().enumerate() {
            assert_eq!(dict.by_ord(ord as u64), Some(term.as_bytes()));
            assert_eq!(dict.by_term(term.as_bytes()), Ok(ord as u64));
        }
        assert_eq!(dict.by_ord(6), None);
        assert_eq!(dict.by_term(b"aardvark"), Err(0));
        assert_eq!(dict.by_term(b"bananas"), Err(4));
        assert_eq!(dict.by_term(b"zzz"), Err(6));
        let all: Vec<&[u8]> = dict.iter().collect();
        assert_eq!(all, terms.iter().map(|t| t.as_bytes()).collect::<Vec<_>>());
    }

    #[test]
    fn test_prefix_sharing() {
        let writer = DictionaryWriter::build(&["abcdef", "abcdeg"]).unwrap();
        let mut buf = Vec::new();
        writer.write(&mut buf).unwrap();
        // second term: shared 5, suffix 1, "g"
        assert_eq!(&buf[buf.len() - 3..], &[5, 1, b'g']);
        assert_eq!(writer.ord(b"abcdeg"), Some(1));
        assert_eq!(writer.ord(b"abc"), None);
    }

    #[test]
    fn test_empty_term_first() {
        let dict = dictionary(&["", "a"]);
        assert_eq!(dict.by_ord(0), Some(&b""[..]));
        assert_eq!(dict.by_term(b""), Ok(0));
    }

    #[test]
    fn test_unsorted_rejected() {
        assert!(matches!(
            DictionaryWriter::build(&["b", "a"]),
            Err(DocValuesError::InvalidArgument(_))
        ));
        assert!(DictionaryWriter::build(&["a", "a"]).is_err());
        // unsigned byte order: 0xff sorts after ascii
        assert!(DictionaryWriter::build(&[b"z".to_vec(), vec![0xff]]).is_ok());
    }

    #[test]
    fn test_corrupt_prefix() {
        let mut buf = Vec::new();
        buf.write_vint(3).unwrap();
        buf.write_vint(1).unwrap();
        buf.write_bytes(b"x").unwrap();
        let mut input = IndexInput::new("bad", Bytes::from(buf));
        assert!(TermDictionary::load(&mut input, 1).unwrap_err().is_corruption());
    }

    #[test]
    fn test_out_of_order_terms_are_corrupt() {
        let mut buf = Vec::new();
        for term in [b"b", b"a"] {
            buf.write_vint(0).unwrap();
            buf.write_vint(1).unwrap();
            buf.write_bytes(term).unwrap();
        }
        let mut input = IndexInput::new("unsorted", Bytes::from(buf));
        let err = TermDictionary::load(&mut input, 2).unwrap_err();
        assert!(err.to_string().contains("out of order"), "{err}");
    }

    #[test]
    fn test_terms_enum_exact_size() {
        let dict = dictionary(&["b", "d", "f"]);
        let mut terms = dict.terms();
        assert_eq!(terms.len(), 3);
        terms.next();
        assert_eq!(terms.size_hint(), (2, Some(2)));
        terms.seek_ceil(b"e");
        assert_eq!(terms.len(), 0);
        terms.seek_ceil(b"zz");
        assert_eq!(terms.len(), 0);
        assert_eq!(terms.next(), None);
        assert_eq!(TermDictionary::default().terms().len(), 0);
    }

    #[test]
    fn test_count_larger_than_data() {
        let mut input = IndexInput::new("bad", Bytes::from_static(&[0, 1, b'a']));
        assert!(TermDictionary::load(&mut input, 5).unwrap_err().is_corruption());
    }

    #[test]
    fn test_terms_enum() {
        let dict = dictionary(&["b", "d", "f"]);
        let mut terms = dict.terms();
        assert_eq!(terms.term(), None);
        assert_eq!(terms.next(), Some(&b"b"[..]));
        assert_eq!(terms.ord(), Some(0));

        assert_eq!(terms.seek_ceil(b"c"), SeekStatus::NotFound);
        assert_eq!(terms.term(), Some(&b"d"[..]));
        assert_eq!(terms.next(), Some(&b"f"[..]));
        assert_eq!(terms.next(), None);
        assert_eq!(terms.next(), None);
        assert_eq!(terms.ord(), None);

        assert_eq!(terms.seek_ceil(b"g"), SeekStatus::End);
        assert_eq!(terms.term(), None);
        assert!(terms.seek_exact(b"f"));
        assert!(!terms.seek_exact(b"e"));

        terms.seek_exact_ord(0).unwrap();
        assert_eq!(terms.term(), Some(&b"b"[..]));
        assert!(terms.seek_exact_ord(3).is_err());

        let collected: Vec<&[u8]> = dict.terms().collect();
        assert_eq!(collected.len(), 3);
    }
}
