use super::{
    Format, PackedReader, PackedWriter, check_block_size, check_stored_block_size,
    unsigned_bits_required, zigzag_decode, zigzag_encode,
};
use crate::core::DocValuesError;
use crate::store::{DataOutput, IndexInput};

/// Block writer for non-negative, non-decreasing sequences such as file
/// addresses. Each block stores its first value, the average slope as an
/// `f32`, and zigzag residuals from that line.
pub struct MonotonicBlockPackedWriter<'a, O: DataOutput + ?Sized> {
    out: &'a mut O,
    values: Vec<i64>,
    off: usize,
    ord: u64,
    finished: bool,
}

impl<'a, O: DataOutput + ?Sized> MonotonicBlockPackedWriter<'a, O> {
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
        if value < 0 {
            return Err(DocValuesError::InvalidArgument(format!(
                "monotonic values must be non-negative, got {value}"
            )));
        }
        if self.off == self.values.len() {
            self.flush()?;
        }
        self.values[self.off] = value;
        self.off += 1;
        self.ord += 1;
        Ok(())
    }

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
        let block = &mut self.values[..self.off];
        let min = block[0];
        let avg = if block.len() == 1 {
            0.0f32
        } else {
            (block[block.len() - 1] - min) as f32 / (block.len() - 1) as f32
        };

        let mut max_residual = 0u64;
        for (i, v) in block.iter_mut().enumerate() {
            *v = zigzag_encode(v.wrapping_sub(min).wrapping_sub((avg * i as f32) as i64));
            max_residual = max_residual.max(*v as u64);
        }

        self.out.write_vlong(min)?;
        self.out.write_int(avg.to_bits() as i32)?;
        if max_residual == 0 {
            self.out.write_vint(0)?;
        } else {
            let bits = unsigned_bits_required(max_residual as i64);
            self.out.write_vint(bits as i32)?;
            let mut packed = PackedWriter::new(&mut *self.out, Format::Packed, block.len(), bits)?;
            for &v in block.iter() {
                packed.add(v)?;
            }
            packed.finish()?;
        }
        self.off = 0;
        Ok(())
    }
}

/// Random access over a sequence written by [`MonotonicBlockPackedWriter`].
#[derive(Debug, Clone)]
pub struct MonotonicBlockPackedReader {
    block_shift: u32,
    block_mask: usize,
    value_count: usize,
    min_values: Box<[i64]>,
    averages: Box<[f32]>,
    sub_readers: Box<[Option<PackedReader>]>,
}

impl MonotonicBlockPackedReader {
    pub fn read(
        input: &mut IndexInput,
        packed_version: i32,
        block_size: i32,
        value_count: usize,
    ) -> Result<Self, DocValuesError> {
        let block_shift = check_stored_block_size(block_size)?;
        let block_size = 1usize << block_shift;
        let num_blocks = value_count.div_ceil(block_size);

        let mut min_values = Vec::with_capacity(num_blocks);
        let mut averages = Vec::with_capacity(num_blocks);
        let mut sub_readers = Vec::with_capacity(num_blocks);
        for i in 0..num_blocks {
            min_values.push(input.read_vlong()?);
            averages.push(f32::from_bits(input.read_int()? as u32));
            let bits = input.read_vint()?;
            if !(0..=64).contains(&bits) {
                return Err(DocValuesError::CorruptIndex(format!(
                    "block {i} claims {bits} bits per value (resource={})",
                    input.name()
                )));
            }
            if bits == 0 {
                sub_readers.push(None);
            } else {
                let size = block_size.min(value_count - i * block_size);
                sub_readers.push(Some(PackedReader::read(
                    input,
                    Format::Packed,
                    packed_version,
                    size,
                    bits as u32,
                )?));
            }
        }

        Ok(Self {
            block_shift,
            block_mask: block_size - 1,
            value_count,
            min_values: min_values.into_boxed_slice(),
            averages: averages.into_boxed_slice(),
            sub_readers: sub_readers.into_boxed_slice(),
        })
    }

    pub fn get(&self, index: usize) -> i64 {
        debug_assert!(index < self.value_count);
        let block = index >> self.block_shift;
        let idx = index & self.block_mask;
        let residual = self.sub_readers[block]
            .as_ref()
            .map_or(0, |r| zigzag_decode(r.get(idx)));
        self.min_values[block]
            .wrapping_add((self.averages[block] * idx as f32) as i64)
            .wrapping_add(residual)
    }

    pub fn size(&self) -> usize {
        self.value_count
    }

    pub fn ram_bytes_used(&self) -> usize {
        let subs: usize = self
            .sub_readers
            .iter()
            .map(|r| r.as_ref().map_or(0, PackedReader::ram_bytes_used))
            .sum();
        std::mem::size_of::<Self>() + self.min_values.len() * 8 + self.averages.len() * 4 + subs
    }
}
