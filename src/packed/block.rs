use super::{
    Format, PackedReader, PackedWriter, check_block_size, check_stored_block_size,
    max_value, unsigned_bits_required, zigzag_decode, zigzag_encode,
};
use crate::core::DocValuesError;
use crate::store::{DataOutput, IndexInput};

/// Variable-length long where the ninth byte carries a full 8 bits, so any
/// `u64` fits in at most 9 bytes.
pub(crate) fn write_block_vlong<O: DataOutput + ?Sized>(
    out: &mut O,
    mut v: u64,
) -> Result<(), DocValuesError> {
    let mut k = 0;
    while v & !0x7F != 0 && k < 8 {
        out.write_byte(((v & 0x7F) | 0x80) as u8)?;
        v >>= 7;
        k += 1;
    }
    out.write_byte(v as u8)
}

pub(crate) fn read_block_vlong(input: &mut IndexInput) -> Result<u64, DocValuesError> {
    let mut v = 0u64;
    for shift in (0..56).step_by(7) {
        let b = input.read_byte()?;
        v |= ((b & 0x7F) as u64) << shift;
        if b & 0x80 == 0 {
            return Ok(v);
        }
    }
    Ok(v | (input.read_byte()? as u64) << 56)
}

/// Writes values in blocks of `block_size`, each block encoded as its
/// minimum plus the deltas from it at the narrowest width that holds them.
///
/// Unlike [`PackedWriter`], the caller does not need to know the value count
/// up front; the reader does.
pub struct BlockPackedWriter<'a, O: DataOutput + ?Sized> {
    out: &'a mut O,
    values: Vec<i64>,
    off: usize,
    ord: u64,
    finished: bool,
}

impl<'a, O: DataOutput + ?Sized> BlockPackedWriter<'a, O> {
    pub fn new(out: &'a mut O, block_size: u32) -> Result<Self, DocValuesError> {
        check_block_size(block_size)?;
        Ok(Self {
            out,
            values: vec![0; block_size as usize],
            off: 0,
            ord: 0,
            finished: false,
        })
    }

    pub fn add(&mut self, value: i64) -> Result<(), DocValuesError> {
        if self.finished {
            return Err(DocValuesError::AlreadyFinished);
        }
        if self.off == self.values.len() {
            self.flush()?;
        }
        self.values[self.off] = value;
        self.off += 1;
        self.ord += 1;
        Ok(())
    }

    /// Number of values added so far.
    pub fn ord(&self) -> u64 {
        self.ord
    }

    pub fn finish(&mut self) -> Result<(), DocValuesError> {
        if self.finished {
            return Err(DocValuesError::AlreadyFinished);
        }
        if self.off > 0 {
            self.flush()?;
        }
        self.finished = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DocValuesError> {
        let block = &self.values[..self.off];
        let (mut min, max) = block
            .iter()
            .fold((i64::MAX, i64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        let delta = max.wrapping_sub(min);
        let bits = if delta == 0 {
            0
        } else {
            unsigned_bits_required(delta)
        };
        if bits == 64 {
            min = 0;
        } else if min > 0 {
            // a zero minimum saves the header bytes when the deltas allow it
            min = (max - max_value(bits)).max(0);
        }

        let token = ((bits as u8) << 1) | u8::from(min == 0);
        self.out.write_byte(token)?;
        if min != 0 {
            write_block_vlong(&mut *self.out, (zigzag_encode(min) as u64).wrapping_sub(1))?;
        }
        if bits > 0 {
            let mut packed =
                PackedWriter::new(&mut *self.out, Format::Packed, block.len(), bits)?;
            for v in block.iter() {
                packed.add(v.wrapping_sub(min))?;
            }
            packed.finish()?;
        }
        self.off = 0;
        Ok(())
    }
}

/// Random access over a sequence written by [`BlockPackedWriter`].
#[derive(Debug, Clone)]
pub struct BlockPackedReader {
    block_shift: u32,
    block_mask: usize,
    value_count: usize,
    min_values: Option<Box<[i64]>>,
    sub_readers: Box<[Option<PackedReader>]>,
}

impl BlockPackedReader {
    pub fn read(
        input: &mut IndexInput,
        packed_version: i32,
        block_size: i32,
        value_count: usize,
    ) -> Result<Self, DocValuesError> {
        let block_shift = check_stored_block_size(block_size)?;
        let block_size = 1usize << block_shift;
        let num_blocks = value_count.div_ceil(block_size);

        let mut min_values: Option<Vec<i64>> = None;
        let mut sub_readers = Vec::with_capacity(num_blocks);
        for i in 0..num_blocks {
            let token = input.read_byte()?;
            let bits = (token >> 1) as u32;
            if bits > 64 {
                return Err(DocValuesError::CorruptIndex(format!(
                    "block {i} claims {bits} bits per value (resource={})",
                    input.name()
                )));
            }
            if token & 1 == 0 {
                let min = zigzag_decode(read_block_vlong(input)?.wrapping_add(1) as i64);
                min_values.get_or_insert_with(|| vec![0; num_blocks])[i] = min;
            }
            if bits > 0 {
                let size = block_size.min(value_count - i * block_size);
                sub_readers.push(Some(PackedReader::read(
                    input,
                    Format::Packed,
                    packed_version,
                    size,
                    bits,
                )?));
            } else {
                sub_readers.push(None);
            }
        }

        Ok(Self {
            block_shift,
            block_mask: block_size - 1,
            value_count,
            min_values: min_values.map(Vec::into_boxed_slice),
            sub_readers: sub_readers.into_boxed_slice(),
        })
    }

    pub fn get(&self, index: usize) -> i64 {
        debug_assert!(index < self.value_count);
        let block = index >> self.block_shift;
        let idx = index & self.block_mask;
        let min = self.min_values.as_ref().map_or(0, |m| m[block]);
        let delta = self.sub_readers[block].as_ref().map_or(0, |r| r.get(idx));
        min.wrapping_add(delta)
    }

    pub fn size(&self) -> usize {
        self.value_count
    }

    pub fn ram_bytes_used(&self) -> usize {
        let mins = self.min_values.as_ref().map_or(0, |m| m.len() * 8);
        let subs: usize = self
            .sub_readers
            .iter()
            .map(|r| r.as_ref().map_or(0, PackedReader::ram_bytes_used))
            .sum();
        std::mem::size_of::<Self>() + mins + subs
    }
}
