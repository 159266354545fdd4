use super::{Format, VERSION_CURRENT, check_packed_version, mask};
use crate::core::DocValuesError;
use crate::store::{DataOutput, IndexInput};

/// Streams `value_count` unsigned values of `bits_per_value` bits each.
///
/// No header is written: the reader must be told the format, version,
/// count and width. Output always uses [`VERSION_CURRENT`].
pub struct PackedWriter<'a, O: DataOutput + ?Sized> {
    out: &'a mut O,
    format: Format,
    value_count: usize,
    bits_per_value: u32,
    written: usize,
    current: u64,
    filled: u32,
}

impl<'a, O: DataOutput + ?Sized> PackedWriter<'a, O> {
    pub fn new(
        out: &'a mut O,
        format: Format,
        value_count: usize,
        bits_per_value: u32,
    ) -> Result<Self, DocValuesError> {
        if !format.is_supported(bits_per_value) {
            return Err(DocValuesError::InvalidArgument(format!(
                "{format:?} does not support {bits_per_value} bits per value"
            )));
        }
        Ok(Self {
            out,
            format,
            value_count,
            bits_per_value,
            written: 0,
            current: 0,
            filled: 0,
        })
    }

    pub fn add(&mut self, value: i64) -> Result<(), DocValuesError> {
        let v = value as u64;
        if v & !mask(self.bits_per_value) != 0 {
            return Err(DocValuesError::InvalidArgument(format!(
                "value {value} does not fit in {} bits",
                self.bits_per_value
            )));
        }
        if self.written == self.value_count {
            return Err(DocValuesError::InvalidArgument(format!(
                "writer already holds {} values",
                self.value_count
            )));
        }
        match self.format {
            Format::Packed => self.push_bits(v)?,
            Format::PackedSingleBlock => {
                self.current |= v << self.filled;
                self.filled += self.bits_per_value;
                if self.filled + self.bits_per_value > 64 {
                    self.flush_word()?;
                }
            }
        }
        self.written += 1;
        Ok(())
    }

    fn push_bits(&mut self, v: u64) -> Result<(), DocValuesError> {
        let mut remaining = self.bits_per_value;
        while remaining > 0 {
            let space = 64 - self.filled;
            let take = space.min(remaining);
            let chunk = (v >> (remaining - take)) & mask(take);
            self.current |= chunk << (space - take);
            self.filled += take;
            remaining -= take;
            if self.filled == 64 {
                self.flush_word()?;
            }
        }
        Ok(())
    }

    fn flush_word(&mut self) -> Result<(), DocValuesError> {
        self.out.write_long(self.current as i64)?;
        self.current = 0;
        self.filled = 0;
        Ok(())
    }

    /// Pad missing values with zeros and write the trailing partial word.
    pub fn finish(mut self) -> Result<(), DocValuesError> {
        while self.written < self.value_count {
            self.add(0)?;
        }
        if self.filled == 0 {
            return Ok(());
        }
        match self.format {
            Format::Packed => {
                let bytes = self.current.to_be_bytes();
                self.out.write_bytes(&bytes[..self.filled.div_ceil(8) as usize])?;
                self.current = 0;
                self.filled = 0;
                Ok(())
            }
            Format::PackedSingleBlock => self.flush_word(),
        }
    }
}

/// Random access over values written by a [`PackedWriter`].
#[derive(Debug, Clone)]
pub struct PackedReader {
    format: Format,
    bits_per_value: u32,
    value_count: usize,
    blocks: Box<[u64]>,
}

impl PackedReader {
    pub fn read(
        input: &mut IndexInput,
        format: Format,
        version: i32,
        value_count: usize,
        bits_per_value: u32,
    ) -> Result<Self, DocValuesError> {
        let version = check_packed_version(version)?;
        if !format.is_supported(bits_per_value) {
            return Err(DocValuesError::CorruptIndex(format!(
                "{format:?} does not support {bits_per_value} bits per value (resource={})",
                input.name()
            )));
        }
        let byte_count = format.byte_count(version, value_count, bits_per_value);
        let raw = input.read_slice(byte_count)?;
        let blocks = raw
            .chunks(8)
            .map(|chunk| {
                let mut word = [0u8; 8];
                word[..chunk.len()].copy_from_slice(chunk);
                u64::from_be_bytes(word)
            })
            .collect();
        Ok(Self {
            format,
            bits_per_value,
            value_count,
            blocks,
        })
    }

    pub fn get(&self, index: usize) -> i64 {
        debug_assert!(index < self.value_count);
        let bpv = self.bits_per_value;
        match self.format {
            Format::Packed => {
                let major = index as u64 * bpv as u64;
                let element = (major >> 6) as usize;
                let offset = (major & 63) as u32;
                let end_bits = offset + bpv;
                if end_bits <= 64 {
                    ((self.blocks[element] >> (64 - end_bits)) & mask(bpv)) as i64
                } else {
                    let spill = end_bits - 64;
                    let high = (self.blocks[element] << spill) & mask(bpv);
                    let low = self.blocks[element + 1] >> (64 - spill);
                    (high | low) as i64
                }
            }
            Format::PackedSingleBlock => {
                let values_per_block = (64 / bpv) as usize;
                let block = index / values_per_block;
                let shift = (index % values_per_block) as u32 * bpv;
                ((self.blocks[block] >> shift) & mask(bpv)) as i64
            }
        }
    }

    pub fn size(&self) -> usize {
        self.value_count
    }

    pub fn bits_per_value(&self) -> u32 {
        self.bits_per_value
    }

    pub fn ram_bytes_used(&self) -> usize {
        std::mem::size_of::<Self>() + self.blocks.len() * 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packed::{VERSION_START, max_value};
    use bytes::Bytes;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn write(format: Format, bpv: u32, values: &[i64]) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut writer = PackedWriter::new(&mut buf, format, values.len(), bpv).unwrap();
        for &v in values {
            writer.add(v).unwrap();
        }
        writer.finish().unwrap();
        buf
    }

    fn read(buf: Vec<u8>, format: Format, version: i32, count: usize, bpv: u32) -> PackedReader {
        let mut input = IndexInput::new("packed", Bytes::from(buf));
        let reader = PackedReader::read(&mut input, format, version, count, bpv).unwrap();
        assert_eq!(input.remaining(), 0);
        reader
    }

    #[test]
    fn test_every_width_both_formats() {
        let mut rng = StdRng::seed_from_u64(42);
        for format in [Format::Packed, Format::PackedSingleBlock] {
            for bpv in (1..=64).filter(|&b| format.is_supported(b)) {
                let count = rng.gen_range(1..300);
                let values: Vec<i64> = (0..count)
                    .map(|_| (rng.r#gen::<u64>() & mask(bpv)) as i64)
                    .collect();
                let buf = write(format, bpv, &values);
                assert_eq!(buf.len(), format.byte_count(VERSION_CURRENT, count, bpv));
                let reader = read(buf, format, VERSION_CURRENT, count, bpv);
                for (i, &v) in values.iter().enumerate() {
                    assert_eq!(reader.get(i), v, "{format:?} bpv={bpv} index={i}");
                }
            }
        }
    }

    #[test]
    fn test_msb_first_layout() {
        let buf = write(Format::Packed, 4, &[0x1, 0x2, 0x3]);
        assert_eq!(buf, vec![0x12, 0x30]);
    }

    #[test]
    fn test_long_aligned_version() {
        let values = [3i64, 1, 2, 0, 3];
        let mut buf = write(Format::Packed, 2, &values);
        buf.resize(Format::Packed.byte_count(VERSION_START, values.len(), 2), 0);
        assert_eq!(buf.len(), 8);
        let reader = read(buf, Format::Packed, VERSION_START, values.len(), 2);
        let decoded: Vec<i64> = (0..values.len()).map(|i| reader.get(i)).collect();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_missing_values_are_zero() {
        let mut buf = Vec::new();
        let mut writer = PackedWriter::new(&mut buf, Format::Packed, 4, 7).unwrap();
        writer.add(max_value(7)).unwrap();
        writer.finish().unwrap();
        let reader = read(buf, Format::Packed, VERSION_CURRENT, 4, 7);
        assert_eq!(reader.get(0), 127);
        assert_eq!(reader.get(3), 0);
    }

    #[test]
    fn test_value_too_wide() {
        let mut buf = Vec::new();
        let mut writer = PackedWriter::new(&mut buf, Format::Packed, 1, 3).unwrap();
        assert!(matches!(
            writer.add(8),
            Err(DocValuesError::InvalidArgument(_))
        ));
        assert!(PackedWriter::new(&mut buf, Format::PackedSingleBlock, 1, 11).is_err());
    }

    #[test]
    fn test_truncated_input() {
        let buf = write(Format::Packed, 13, &[1, 2, 3, 4, 5]);
        let mut input = IndexInput::new("short", Bytes::from(buf[..buf.len() - 1].to_vec()));
        let err = PackedReader::read(&mut input, Format::Packed, VERSION_CURRENT, 5, 13).unwrap_err();
        assert!(err.is_corruption());
    }
}
