use std::collections::BTreeSet;

use super::{MAX_TABLE_SIZE, NumericFormat};
use crate::packed::{FormatAndBits, bits_required, fastest_format_and_bits};

/// Encoding picked for a numeric field after one pass over its values.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericStrategy {
    /// Every value fits a signed byte and packing would use 8 bits anyway.
    Uncompressed,
    /// At most 256 distinct values: store the ascending table and per-document
    /// indexes into it.
    Table {
        table: Vec<i64>,
        format_and_bits: FormatAndBits,
    },
    /// Every value is `min + k * gcd`; store the quotients.
    Gcd { min: i64, gcd: i64 },
    /// Block-packed deltas.
    Delta,
}

impl NumericStrategy {
    pub fn format(&self) -> NumericFormat {
        match self {
            NumericStrategy::Uncompressed => NumericFormat::Uncompressed,
            NumericStrategy::Table { .. } => NumericFormat::Table,
            NumericStrategy::Gcd { .. } => NumericFormat::Gcd,
            NumericStrategy::Delta => NumericFormat::Delta,
        }
    }
}

/// Choose the storage strategy for `values`.
///
/// GCD tracking gives up (gcd = 1) as soon as a value falls outside
/// `[i64::MIN / 2, i64::MAX / 2]`, so `v - min` never overflows.
pub fn classify(values: &[i64], max_doc: u32, acceptable_overhead_ratio: f32) -> NumericStrategy {
    let mut min = i64::MAX;
    let mut max = i64::MIN;
    let mut gcd = 0i64;
    let mut unique: Option<BTreeSet<i64>> = Some(BTreeSet::new());

    for (count, &v) in values.iter().enumerate() {
        if gcd != 1 {
            if !(i64::MIN / 2..=i64::MAX / 2).contains(&v) {
                gcd = 1;
            } else if count != 0 {
                gcd = gcd_of(gcd, v - min);
            }
        }
        min = min.min(v);
        max = max.max(v);

        if let Some(set) = unique.as_mut() {
            set.insert(v);
            if set.len() > MAX_TABLE_SIZE {
                unique = None;
            }
        }
    }

    if let Some(set) = unique {
        let bits = bits_required((set.len() as i64 - 1).max(0));
        let format_and_bits =
            fastest_format_and_bits(max_doc as usize, bits, acceptable_overhead_ratio);
        if format_and_bits.bits_per_value == 8 && min >= i8::MIN as i64 && max <= i8::MAX as i64 {
            NumericStrategy::Uncompressed
        } else {
            NumericStrategy::Table {
                table: set.into_iter().collect(),
                format_and_bits,
            }
        }
    } else if gcd != 0 && gcd != 1 {
        NumericStrategy::Gcd { min, gcd }
    } else {
        NumericStrategy::Delta
    }
}

/// Non-negative greatest common divisor. Arguments stay within the
/// half-range band, so `unsigned_abs` cannot wrap back to a negative.
fn gcd_of(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a as i64
}
