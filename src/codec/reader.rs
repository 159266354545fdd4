use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, info};

use super::bits::DocsWithField;
use super::cache::FieldCache;
use super::meta::{FieldEntries, FieldSummary};
use super::values::{BinaryDocValues, NumericDocValues, SortedDocValues, SortedSetDocValues};
use super::{
    DATA_CODEC, DATA_EXTENSION, DocValuesType, META_CODEC, META_EXTENSION, VERSION_CHECKSUM,
    VERSION_CURRENT, VERSION_START,
};
use crate::core::DocValuesError;
use crate::dictionary::TermDictionary;
use crate::store::codec_util::{
    check_eof, check_footer, check_header, checksum_entire_file, retrieve_checksum,
};
use crate::store::{Directory, IndexInput, segment_file_name};

/// Read side of one segment's doc values.
///
/// Opening reads the whole metadata file and validates both headers; field
/// payloads are decoded on first access and cached for the reader's lifetime.
/// The reader is `Send + Sync`; accessors are handed out as `Arc`s.
pub struct DocValuesReader {
    segment: String,
    max_doc: u32,
    version: i32,
    data: IndexInput,
    entries: FieldEntries,
    numerics: FieldCache<NumericDocValues>,
    binaries: FieldCache<BinaryDocValues>,
    sorted: FieldCache<SortedDocValues>,
    sorted_sets: FieldCache<SortedSetDocValues>,
    ram_bytes_used: AtomicUsize,
}

impl DocValuesReader {
    pub fn open(dir: &dyn Directory, segment: &str, max_doc: u32) -> Result<Self, DocValuesError> {
        let mut meta = dir.open_input(&segment_file_name(segment, META_EXTENSION))?;
        let version = check_header(&mut meta, META_CODEC, VERSION_START, VERSION_CURRENT)?;
        let entries = FieldEntries::read(&mut meta, version)?;
        if version >= VERSION_CHECKSUM {
            check_footer(&mut meta)?;
        } else {
            check_eof(&meta)?;
        }

        let mut data = dir.open_input(&segment_file_name(segment, DATA_EXTENSION))?;
        let data_version = check_header(&mut data, DATA_CODEC, VERSION_START, VERSION_CURRENT)?;
        if data_version != version {
            return Err(DocValuesError::CorruptIndex(format!(
                "format versions mismatch: meta={version} data={data_version} (resource: {})",
                data.name()
            )));
        }
        if version >= VERSION_CHECKSUM {
            // structure only; hashing the whole file is verify_checksum's job
            retrieve_checksum(&data)?;
        }

        info!(
            "opened doc values for segment {segment}: {} fields, {max_doc} docs, version {version}",
            entries.kinds.len()
        );

        Ok(Self {
            segment: segment.to_string(),
            max_doc,
            version,
            data,
            entries,
            numerics: FieldCache::default(),
            binaries: FieldCache::default(),
            sorted: FieldCache::default(),
            sorted_sets: FieldCache::default(),
            ram_bytes_used: AtomicUsize::new(std::mem::size_of::<Self>()),
        })
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn max_doc(&self) -> u32 {
        self.max_doc
    }

    /// Format version both files were written with.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Every field in the segment, ordered by field number.
    pub fn fields(&self) -> Vec<FieldSummary> {
        self.entries
            .kinds
            .iter()
            .map(|(&field, &kind)| self.entries.summary(field, kind))
            .collect()
    }

    pub fn field_type(&self, field: u32) -> Option<DocValuesType> {
        self.entries.kinds.get(&field).copied()
    }

    fn expect_kind(&self, field: u32, kind: DocValuesType) -> Result<(), DocValuesError> {
        if self.field_type(field) != Some(kind) {
            return Err(DocValuesError::FieldNotFound {
                field,
                kind: match kind {
                    DocValuesType::Numeric => "numeric",
                    DocValuesType::Binary => "binary",
                    DocValuesType::Sorted => "sorted",
                    DocValuesType::SortedSet => "sorted_set",
                },
            });
        }
        Ok(())
    }

    fn account(&self, field: u32, kind: DocValuesType, bytes: usize) {
        self.ram_bytes_used.fetch_add(bytes, Ordering::Relaxed);
        debug!(
            "segment {}: materialized {kind} field {field} ({bytes} bytes)",
            self.segment
        );
    }

    fn load_numeric(&self, field: u32) -> Result<NumericDocValues, DocValuesError> {
        let entry = self.entries.numerics.get(&field).ok_or(DocValuesError::FieldNotFound {
            field,
            kind: "numeric",
        })?;
        NumericDocValues::load(&mut self.data.clone(), entry, self.max_doc)
    }

    fn load_binary(&self, field: u32) -> Result<BinaryDocValues, DocValuesError> {
        let entry = self.entries.binaries.get(&field).ok_or(DocValuesError::FieldNotFound {
            field,
            kind: "binary",
        })?;
        BinaryDocValues::load(&mut self.data.clone(), entry, self.max_doc)
    }

    fn load_dictionary(&self, field: u32) -> Result<TermDictionary, DocValuesError> {
        let entry = self
            .entries
            .dictionaries
            .get(&field)
            .ok_or(DocValuesError::FieldNotFound {
                field,
                kind: "sorted",
            })?;
        if entry.value_count == 0 {
            return Ok(TermDictionary::default());
        }
        let mut input = self.data.clone();
        input.seek(entry.offset)?;
        TermDictionary::load(&mut input, entry.value_count)
    }

    pub fn numeric(&self, field: u32) -> Result<Arc<NumericDocValues>, DocValuesError> {
        self.expect_kind(field, DocValuesType::Numeric)?;
        let (values, loaded) = self
            .numerics
            .get_or_load(field, || self.load_numeric(field))?;
        if loaded {
            self.account(field, DocValuesType::Numeric, values.ram_bytes_used());
        }
        Ok(values)
    }

    pub fn binary(&self, field: u32) -> Result<Arc<BinaryDocValues>, DocValuesError> {
        self.expect_kind(field, DocValuesType::Binary)?;
        let (values, loaded) = self
            .binaries
            .get_or_load(field, || self.load_binary(field))?;
        if loaded {
            self.account(field, DocValuesType::Binary, values.ram_bytes_used());
        }
        Ok(values)
    }

    pub fn sorted(&self, field: u32) -> Result<Arc<SortedDocValues>, DocValuesError> {
        self.expect_kind(field, DocValuesType::Sorted)?;
        let (values, loaded) = self.sorted.get_or_load(field, || {
            let ords = self.load_numeric(field)?;
            let dictionary = self.load_dictionary(field)?;
            SortedDocValues::new(ords, dictionary, self.max_doc)
        })?;
        if loaded {
            self.account(field, DocValuesType::Sorted, values.ram_bytes_used());
        }
        Ok(values)
    }

    pub fn sorted_set(&self, field: u32) -> Result<Arc<SortedSetDocValues>, DocValuesError> {
        self.expect_kind(field, DocValuesType::SortedSet)?;
        let (values, loaded) = self.sorted_sets.get_or_load(field, || {
            let value_count = self
                .entries
                .dictionaries
                .get(&field)
                .map_or(0, |d| d.value_count);
            if value_count == 0 {
                return Ok(SortedSetDocValues::empty());
            }
            let ords = self.load_binary(field)?;
            let dictionary = self.load_dictionary(field)?;
            Ok(SortedSetDocValues::new(ords, dictionary))
        })?;
        if loaded {
            self.account(field, DocValuesType::SortedSet, values.ram_bytes_used());
        }
        Ok(values)
    }

    /// Documents that hold a value. Numeric and binary fields have one for
    /// every document.
    pub fn docs_with_field(&self, field: u32) -> Result<DocsWithField, DocValuesError> {
        let kind = self.field_type(field).ok_or(DocValuesError::FieldNotFound {
            field,
            kind: "any",
        })?;
        Ok(match kind {
            DocValuesType::Numeric | DocValuesType::Binary => DocsWithField::all(self.max_doc),
            DocValuesType::Sorted => {
                let sorted = self.sorted(field)?;
                DocsWithField::from_fn(self.max_doc, |doc| sorted.ord(doc) != -1)
            }
            DocValuesType::SortedSet => {
                let sorted_set = self.sorted_set(field)?;
                DocsWithField::from_fn(self.max_doc, |doc| sorted_set.has_ords(doc))
            }
        })
    }

    /// Hash the whole data file and compare with its footer. Files written
    /// before checksums existed always pass.
    pub fn verify_checksum(&self) -> Result<(), DocValuesError> {
        if self.version >= VERSION_CHECKSUM {
            checksum_entire_file(&self.data)?;
        }
        Ok(())
    }

    /// Approximate heap held by materialized accessors.
    pub fn ram_bytes_used(&self) -> usize {
        self.ram_bytes_used.load(Ordering::Relaxed)
    }

    /// Number of accessors materialized so far.
    pub fn loaded_fields(&self) -> usize {
        self.numerics.loaded()
            + self.binaries.loaded()
            + self.sorted.loaded()
            + self.sorted_sets.loaded()
    }
}

impl std::fmt::Debug for DocValuesReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocValuesReader")
            .field("segment", &self.segment)
            .field("max_doc", &self.max_doc)
            .field("version", &self.version)
            .field("fields", &self.entries.kinds)
            .finish()
    }
}
