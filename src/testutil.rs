//! Test and benchmark utilities.
//!
//! This module is only available when the `testutil` feature is enabled.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

use crate::codec::DocValuesWriter;
use crate::conf::CodecConfig;
use crate::core::DocValuesError;
use crate::store::{Directory, LocalDirectory};

pub const NUMERIC_FIELD: u32 = 0;
pub const BINARY_FIELD: u32 = 1;
pub const SORTED_FIELD: u32 = 2;
pub const SORTED_SET_FIELD: u32 = 3;

/// Dictionary plus per-document ordinals of a single-valued string field.
#[derive(Debug, Clone)]
pub struct SortedField {
    pub terms: Vec<Vec<u8>>,
    pub ords: Vec<i32>,
}

/// Dictionary plus per-document ordinal lists of a multi-valued field.
#[derive(Debug, Clone)]
pub struct SortedSetField {
    pub terms: Vec<Vec<u8>>,
    pub counts: Vec<u32>,
    pub ords: Vec<i64>,
}

impl SortedSetField {
    /// Ordinals of `doc`, sliced out of the flat `ords` list.
    pub fn doc_ords(&self, doc: u32) -> &[i64] {
        let start: usize = self.counts[..doc as usize]
            .iter()
            .map(|&c| c as usize)
            .sum();
        &self.ords[start..start + self.counts[doc as usize] as usize]
    }
}

/// Sorted, de-duplicated random lowercase terms.
pub fn random_terms(rng: &mut StdRng, count: usize, max_len: usize) -> Vec<Vec<u8>> {
    let mut terms = BTreeSet::new();
    while terms.len() < count {
        let len = rng.gen_range(1..=max_len.max(1));
        let term: Vec<u8> = (0..len).map(|_| rng.gen_range(b'a'..=b'z')).collect();
        terms.insert(term);
    }
    terms.into_iter().collect()
}

/// Values drawn from `distinct` random longs, or fully random when `None`.
pub fn random_numeric(seed: u64, max_doc: u32, distinct: Option<usize>) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    match distinct {
        Some(n) => {
            let pool: Vec<i64> = (0..n.max(1)).map(|_| rng.r#gen()).collect();
            (0..max_doc)
                .map(|_| pool[rng.gen_range(0..pool.len())])
                .collect()
        }
        None => (0..max_doc).map(|_| rng.r#gen()).collect(),
    }
}

pub fn random_binary(seed: u64, max_doc: u32, max_len: usize) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..max_doc)
        .map(|_| {
            let len = rng.gen_range(0..=max_len);
            (0..len).map(|_| rng.r#gen()).collect()
        })
        .collect()
}

/// About one document in ten has no value.
pub fn random_sorted(seed: u64, max_doc: u32, value_count: usize) -> SortedField {
    let mut rng = StdRng::seed_from_u64(seed);
    let terms = random_terms(&mut rng, value_count, 12);
    let ords = (0..max_doc)
        .map(|_| {
            if terms.is_empty() || rng.gen_bool(0.1) {
                -1
            } else {
                rng.gen_range(0..terms.len()) as i32
            }
        })
        .collect();
    SortedField { terms, ords }
}

pub fn random_sorted_set(
    seed: u64,
    max_doc: u32,
    value_count: usize,
    max_per_doc: usize,
) -> SortedSetField {
    let mut rng = StdRng::seed_from_u64(seed);
    let terms = random_terms(&mut rng, value_count, 12);
    let mut counts = Vec::with_capacity(max_doc as usize);
    let mut ords = Vec::new();
    for _ in 0..max_doc {
        let wanted = rng.gen_range(0..=max_per_doc.min(terms.len()));
        let mut doc_ords = BTreeSet::new();
        while doc_ords.len() < wanted {
            doc_ords.insert(rng.gen_range(0..terms.len()) as i64);
        }
        counts.push(doc_ords.len() as u32);
        ords.extend(doc_ords);
    }
    SortedSetField {
        terms,
        counts,
        ords,
    }
}

/// One field of every kind over the same documents.
#[derive(Debug, Clone)]
pub struct FixtureSegment {
    pub max_doc: u32,
    pub numeric: Vec<i64>,
    pub binary: Vec<Vec<u8>>,
    pub sorted: SortedField,
    pub sorted_set: SortedSetField,
}

impl FixtureSegment {
    pub fn generate(seed: u64, max_doc: u32) -> Self {
        Self {
            max_doc,
            numeric: random_numeric(seed, max_doc, None),
            binary: random_binary(seed + 1, max_doc, 24),
            sorted: random_sorted(seed + 2, max_doc, 50),
            sorted_set: random_sorted_set(seed + 3, max_doc, 40, 4),
        }
    }

    pub fn write(
        &self,
        dir: &dyn Directory,
        segment: &str,
        config: CodecConfig,
    ) -> Result<(), DocValuesError> {
        let mut writer = DocValuesWriter::new(dir, segment, self.max_doc, config)?;
        writer.add_numeric_field(NUMERIC_FIELD, &self.numeric)?;
        writer.add_binary_field(BINARY_FIELD, &self.binary)?;
        writer.add_sorted_field(SORTED_FIELD, &self.sorted.terms, &self.sorted.ords)?;
        writer.add_sorted_set_field(
            SORTED_SET_FIELD,
            &self.sorted_set.terms,
            &self.sorted_set.counts,
            &self.sorted_set.ords,
        )?;
        writer.finish()
    }
}

/// A fresh on-disk directory; keep the [`TempDir`] alive while using it.
pub fn temp_directory() -> Result<(TempDir, LocalDirectory), DocValuesError> {
    let tmp = TempDir::new()?;
    let dir = LocalDirectory::open(tmp.path())?;
    Ok((tmp, dir))
}
