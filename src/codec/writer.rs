use ahash::AHashSet;
use log::{debug, info, warn};

use super::classifier::{NumericStrategy, classify};
use super::{
    DATA_CODEC, DATA_EXTENSION, FieldShape, MAX_BINARY_FIELD_LENGTH, META_CODEC, META_EXTENSION,
    VERSION_CHECKSUM, VERSION_CURRENT, VERSION_GCD_COMPRESSION, VERSION_START,
};
use crate::conf::CodecConfig;
use crate::core::DocValuesError;
use crate::dictionary::DictionaryWriter;
use crate::packed::{self, BlockPackedWriter, MonotonicBlockPackedWriter, PackedWriter};
use crate::store::codec_util::{write_footer, write_header};
use crate::store::{DataOutput, Directory, IndexOutput, segment_file_name};

/// Writes the doc values of one segment.
///
/// Fields are added one at a time, each exactly once; [`finish`] seals
/// both files. Every per-document slice must hold exactly `max_doc` entries.
///
/// [`finish`]: DocValuesWriter::finish
pub struct DocValuesWriter {
    segment: String,
    meta: Box<dyn IndexOutput>,
    data: Box<dyn IndexOutput>,
    max_doc: u32,
    config: CodecConfig,
    version: i32,
    written: AHashSet<u32>,
    // set once a field write fails partway; the files are then unusable
    aborted: bool,
    // per-document ordinal deltas for sorted-set fields
    scratch: Vec<u8>,
}

/// Length statistics and cumulative end addresses of a binary payload.
struct BinaryLayout {
    start: u64,
    min_len: usize,
    max_len: usize,
    addresses: Vec<i64>,
}

impl BinaryLayout {
    fn new(start: u64, max_doc: u32) -> Self {
        Self {
            start,
            min_len: usize::MAX,
            max_len: 0,
            addresses: Vec::with_capacity(max_doc as usize),
        }
    }

    fn record(&mut self, len: usize) {
        self.min_len = self.min_len.min(len);
        self.max_len = self.max_len.max(len);
        let end = self.addresses.last().copied().unwrap_or(0) + len as i64;
        self.addresses.push(end);
    }
}

impl DocValuesWriter {
    pub fn new(
        dir: &dyn Directory,
        segment: &str,
        max_doc: u32,
        config: CodecConfig,
    ) -> Result<Self, DocValuesError> {
        Self::with_version(dir, segment, max_doc, config, VERSION_CURRENT)
    }

    /// Write an older format version. Only used to produce fixtures for
    /// backwards-compatibility tests.
    pub(crate) fn with_version(
        dir: &dyn Directory,
        segment: &str,
        max_doc: u32,
        config: CodecConfig,
        version: i32,
    ) -> Result<Self, DocValuesError> {
        config.validate()?;
        if !(VERSION_START..=VERSION_CURRENT).contains(&version) {
            return Err(DocValuesError::InvalidArgument(format!(
                "cannot write format version {version}"
            )));
        }
        if max_doc > i32::MAX as u32 {
            return Err(DocValuesError::InvalidArgument(format!(
                "max_doc {max_doc} exceeds {}",
                i32::MAX
            )));
        }

        let mut data = dir.create_output(&segment_file_name(segment, DATA_EXTENSION))?;
        write_header(data.as_mut(), DATA_CODEC, version)?;
        let mut meta = dir.create_output(&segment_file_name(segment, META_EXTENSION))?;
        write_header(meta.as_mut(), META_CODEC, version)?;

        Ok(Self {
            segment: segment.to_string(),
            meta,
            data,
            max_doc,
            config,
            version,
            written: AHashSet::new(),
            aborted: false,
            scratch: Vec::new(),
        })
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn max_doc(&self) -> u32 {
        self.max_doc
    }

    pub fn add_numeric_field(&mut self, field: u32, values: &[i64]) -> Result<(), DocValuesError> {
        self.check_field(field)?;
        self.check_doc_count("numeric values", values.len())?;
        self.write_field(field, |w| w.write_numeric(field, values, true))
    }

    pub fn add_binary_field<T: AsRef<[u8]>>(
        &mut self,
        field: u32,
        values: &[T],
    ) -> Result<(), DocValuesError> {
        self.check_field(field)?;
        self.check_doc_count("binary values", values.len())?;
        for (doc, v) in values.iter().enumerate() {
            let len = v.as_ref().len();
            if len > MAX_BINARY_FIELD_LENGTH {
                return Err(DocValuesError::InvalidArgument(format!(
                    "doc {doc}: binary value of {len} bytes exceeds {MAX_BINARY_FIELD_LENGTH}"
                )));
            }
        }

        self.write_field(field, |w| {
            let mut layout = BinaryLayout::new(w.data.file_pointer(), w.max_doc);
            for v in values {
                let bytes = v.as_ref();
                w.data.write_bytes(bytes)?;
                layout.record(bytes.len());
            }
            w.write_binary_entry(field, layout)
        })
    }

    /// A single-valued string field: per-document ordinals into the sorted,
    /// de-duplicated `dictionary_values`, `-1` meaning no value.
    pub fn add_sorted_field<T: AsRef<[u8]>>(
        &mut self,
        field: u32,
        dictionary_values: &[T],
        doc_to_ord: &[i32],
    ) -> Result<(), DocValuesError> {
        self.check_field(field)?;
        let dictionary = DictionaryWriter::build(dictionary_values)?;
        self.check_doc_count("ordinals", doc_to_ord.len())?;
        let value_count = dictionary.len() as i64;
        if let Some((doc, ord)) = doc_to_ord
            .iter()
            .enumerate()
            .find(|&(_, &ord)| ord < -1 || ord as i64 >= value_count)
        {
            return Err(DocValuesError::InvalidArgument(format!(
                "doc {doc}: ordinal {ord} outside -1..{value_count}"
            )));
        }

        let ords: Vec<i64> = doc_to_ord.iter().map(|&o| o as i64).collect();
        self.write_field(field, |w| {
            w.write_numeric(field, &ords, false)?;
            w.write_dictionary(field, &dictionary)
        })
    }

    /// A multi-valued string field. `doc_to_ord_count[doc]` ordinals per
    /// document are taken in order from `ords`; each document's ordinals
    /// must be strictly ascending.
    pub fn add_sorted_set_field<T: AsRef<[u8]>>(
        &mut self,
        field: u32,
        dictionary_values: &[T],
        doc_to_ord_count: &[u32],
        ords: &[i64],
    ) -> Result<(), DocValuesError> {
        self.check_field(field)?;
        let dictionary = DictionaryWriter::build(dictionary_values)?;
        self.check_doc_count("ordinal counts", doc_to_ord_count.len())?;
        let total: u64 = doc_to_ord_count.iter().map(|&c| c as u64).sum();
        if total != ords.len() as u64 {
            return Err(DocValuesError::InvalidArgument(format!(
                "ordinal counts add up to {total} but {} ordinals were given",
                ords.len()
            )));
        }
        let value_count = dictionary.len() as i64;
        let mut cursor = 0usize;
        for (doc, &count) in doc_to_ord_count.iter().enumerate() {
            let doc_ords = &ords[cursor..cursor + count as usize];
            cursor += count as usize;
            if let Some(&ord) = doc_ords.iter().find(|&&o| !(0..value_count).contains(&o)) {
                return Err(DocValuesError::InvalidArgument(format!(
                    "doc {doc}: ordinal {ord} outside 0..{value_count}"
                )));
            }
            if doc_ords.windows(2).any(|w| w[0] >= w[1]) {
                return Err(DocValuesError::InvalidArgument(format!(
                    "doc {doc}: ordinals must be strictly ascending"
                )));
            }
        }

        self.write_field(field, |w| {
            let mut layout = BinaryLayout::new(w.data.file_pointer(), w.max_doc);
            let mut cursor = 0usize;
            for &count in doc_to_ord_count {
                w.scratch.clear();
                let mut last = 0i64;
                for &ord in &ords[cursor..cursor + count as usize] {
                    w.scratch.write_vlong(ord - last)?;
                    last = ord;
                }
                cursor += count as usize;
                w.data.write_bytes(&w.scratch)?;
                layout.record(w.scratch.len());
            }
            w.write_binary_entry(field, layout)?;
            w.write_dictionary(field, &dictionary)
        })
    }

    /// Write the end-of-fields marker and both footers, then close the files.
    ///
    /// Fails without sealing anything if an earlier field write failed.
    pub fn finish(mut self) -> Result<(), DocValuesError> {
        if self.aborted {
            return Err(DocValuesError::WriterAborted);
        }
        self.meta.write_vint(-1)?;
        if self.version >= VERSION_CHECKSUM {
            write_footer(self.meta.as_mut())?;
            write_footer(self.data.as_mut())?;
        }
        let meta_name = self.meta.name().to_string();
        let data_len = self.data.file_pointer();
        self.meta.close()?;
        self.data.close()?;
        info!(
            "wrote doc values for {} fields ({meta_name}, {data_len} data bytes)",
            self.written.len()
        );
        Ok(())
    }

    /// Run the writing half of an `add_*` call. Argument errors are caught
    /// before this point; anything failing here leaves partial bytes behind.
    fn write_field(
        &mut self,
        field: u32,
        write: impl FnOnce(&mut Self) -> Result<(), DocValuesError>,
    ) -> Result<(), DocValuesError> {
        match write(self) {
            Ok(()) => {
                self.written.insert(field);
                Ok(())
            }
            Err(e) => {
                warn!("field {field}: write failed, aborting segment {}: {e}", self.segment);
                self.aborted = true;
                Err(e)
            }
        }
    }

    fn check_field(&self, field: u32) -> Result<(), DocValuesError> {
        if self.aborted {
            return Err(DocValuesError::WriterAborted);
        }
        if field > i32::MAX as u32 {
            return Err(DocValuesError::InvalidArgument(format!(
                "field number {field} exceeds {}",
                i32::MAX
            )));
        }
        if self.written.contains(&field) {
            return Err(DocValuesError::InvalidArgument(format!(
                "field {field} was already written"
            )));
        }
        Ok(())
    }

    fn check_doc_count(&self, what: &str, len: usize) -> Result<(), DocValuesError> {
        if len != self.max_doc as usize {
            return Err(DocValuesError::InvalidArgument(format!(
                "expected {} {what}, one per document, got {len}",
                self.max_doc
            )));
        }
        Ok(())
    }

    fn write_numeric(
        &mut self,
        field: u32,
        values: &[i64],
        optimize_storage: bool,
    ) -> Result<(), DocValuesError> {
        let mut strategy = if optimize_storage {
            classify(values, self.max_doc, self.config.acceptable_overhead_ratio)
        } else {
            NumericStrategy::Delta
        };
        if self.version < VERSION_GCD_COMPRESSION && matches!(strategy, NumericStrategy::Gcd { .. })
        {
            strategy = NumericStrategy::Delta;
        }
        debug!("field {field}: numeric {}", strategy.format());

        self.meta.write_vint(field as i32)?;
        self.meta.write_byte(FieldShape::Numeric.tag())?;
        self.meta.write_long(self.data.file_pointer() as i64)?;
        self.meta.write_byte(strategy.format().tag())?;
        if strategy != NumericStrategy::Uncompressed {
            self.meta.write_vint(packed::VERSION_CURRENT)?;
        }

        let block_size = self.config.block_size;
        let data = self.data.as_mut();
        match strategy {
            NumericStrategy::Uncompressed => {
                for &v in values {
                    data.write_byte(v as i8 as u8)?;
                }
            }
            NumericStrategy::Table {
                table,
                format_and_bits,
            } => {
                data.write_vint(table.len() as i32)?;
                for &v in &table {
                    data.write_long(v)?;
                }
                data.write_vint(format_and_bits.format.id())?;
                data.write_vint(format_and_bits.bits_per_value as i32)?;
                let mut writer = PackedWriter::new(
                    data,
                    format_and_bits.format,
                    values.len(),
                    format_and_bits.bits_per_value,
                )?;
                for v in values {
                    // table holds every distinct value
                    let idx = table.binary_search(v).map_err(|_| {
                        DocValuesError::InvalidArgument(format!("value {v} missing from table"))
                    })?;
                    writer.add(idx as i64)?;
                }
                writer.finish()?;
            }
            NumericStrategy::Gcd { min, gcd } => {
                data.write_long(min)?;
                data.write_long(gcd)?;
                data.write_vint(block_size as i32)?;
                let mut writer = BlockPackedWriter::new(data, block_size)?;
                for &v in values {
                    writer.add((v - min) / gcd)?;
                }
                writer.finish()?;
            }
            NumericStrategy::Delta => {
                data.write_vint(block_size as i32)?;
                let mut writer = BlockPackedWriter::new(data, block_size)?;
                for &v in values {
                    writer.add(v)?;
                }
                writer.finish()?;
            }
        }
        Ok(())
    }

    fn write_binary_entry(&mut self, field: u32, layout: BinaryLayout) -> Result<(), DocValuesError> {
        let (min_len, max_len) = if layout.addresses.is_empty() {
            (0, 0)
        } else {
            (layout.min_len, layout.max_len)
        };
        debug!(
            "field {field}: binary {} lengths {min_len}..={max_len}",
            if min_len == max_len { "fixed" } else { "variable" }
        );

        self.meta.write_vint(field as i32)?;
        self.meta.write_byte(FieldShape::Binary.tag())?;
        self.meta.write_long(layout.start as i64)?;
        self.meta
            .write_long((self.data.file_pointer() - layout.start) as i64)?;
        self.meta.write_vint(min_len as i32)?;
        self.meta.write_vint(max_len as i32)?;
        if min_len != max_len {
            self.meta.write_vint(packed::VERSION_CURRENT)?;
            self.meta.write_vint(self.config.block_size as i32)?;
            let mut writer =
                MonotonicBlockPackedWriter::new(self.data.as_mut(), self.config.block_size)?;
            for &address in &layout.addresses {
                writer.add(address)?;
            }
            writer.finish()?;
        }
        Ok(())
    }

    fn write_dictionary(
        &mut self,
        field: u32,
        dictionary: &DictionaryWriter<'_>,
    ) -> Result<(), DocValuesError> {
        debug!("field {field}: dictionary of {} terms", dictionary.len());
        self.meta.write_vint(field as i32)?;
        self.meta.write_byte(FieldShape::Dictionary.tag())?;
        self.meta.write_long(self.data.file_pointer() as i64)?;
        self.meta.write_vlong(dictionary.len() as i64)?;
        if !dictionary.is_empty() {
            dictionary.write(self.data.as_mut())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::IndexInput;

    /// Outputs that refuse to grow past `limit` bytes.
    struct FullDisk {
        limit: u64,
    }

    struct CappedOutput {
        name: String,
        written: u64,
        limit: u64,
    }

    impl DataOutput for CappedOutput {
        fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), DocValuesError> {
            if self.written + bytes.len() as u64 > self.limit {
                return Err(DocValuesError::IoError(format!("{}: no space left", self.name)));
            }
            self.written += bytes.len() as u64;
            Ok(())
        }
    }

    impl IndexOutput for CappedOutput {
        fn name(&self) -> &str {
            &self.name
        }

        fn file_pointer(&self) -> u64 {
            self.written
        }

        fn checksum(&self) -> u64 {
            0
        }

        fn close(self: Box<Self>) -> Result<(), DocValuesError> {
            Ok(())
        }
    }

    impl Directory for FullDisk {
        fn create_output(&self, name: &str) -> Result<Box<dyn IndexOutput>, DocValuesError> {
            Ok(Box::new(CappedOutput {
                name: name.to_string(),
                written: 0,
                limit: self.limit,
            }))
        }

        fn open_input(&self, name: &str) -> Result<IndexInput, DocValuesError> {
            Err(DocValuesError::IoError(format!("file not found: {name}")))
        }

        fn list(&self) -> Result<Vec<String>, DocValuesError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_failed_write_aborts_writer() {
        let dir = FullDisk { limit: 64 };
        let mut writer = DocValuesWriter::new(&dir, "_0", 100, CodecConfig::default()).unwrap();
        let values: Vec<i64> = (0..100).map(|i| i * i * 1_000_003).collect();
        assert!(matches!(
            writer.add_numeric_field(0, &values),
            Err(DocValuesError::IoError(_))
        ));
        assert_eq!(
            writer.add_numeric_field(1, &[7; 100]),
            Err(DocValuesError::WriterAborted)
        );
        assert_eq!(writer.finish(), Err(DocValuesError::WriterAborted));
    }

    #[test]
    fn test_rejected_arguments_do_not_abort() {
        let dir = crate::store::HeapDirectory::new();
        let mut writer = DocValuesWriter::new(&dir, "_0", 2, CodecConfig::default()).unwrap();
        assert!(matches!(
            writer.add_numeric_field(0, &[1]),
            Err(DocValuesError::InvalidArgument(_))
        ));
        writer.add_numeric_field(0, &[1, 2]).unwrap();
        assert_eq!(writer.segment(), "_0");
        writer.finish().unwrap();
    }
}
