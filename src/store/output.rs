use byteorder::{BigEndian, ByteOrder};

use crate::core::DocValuesError;

/// Sink for the primitive encodings shared by every doc-values file:
/// big-endian fixed-width integers and 7-bit variable-length integers.
pub trait DataOutput {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), DocValuesError>;

    fn write_byte(&mut self, b: u8) -> Result<(), DocValuesError> {
        self.write_bytes(&[b])
    }

    fn write_int(&mut self, v: i32) -> Result<(), DocValuesError> {
        let mut buf = [0u8; 4];
        BigEndian::write_i32(&mut buf, v);
        self.write_bytes(&buf)
    }

    fn write_long(&mut self, v: i64) -> Result<(), DocValuesError> {
        let mut buf = [0u8; 8];
        BigEndian::write_i64(&mut buf, v);
        self.write_bytes(&buf)
    }

    /// Negative values are legal but always take five bytes.
    fn write_vint(&mut self, v: i32) -> Result<(), DocValuesError> {
        let mut i = v as u32;
        let mut buf = [0u8; 5];
        let mut n = 0;
        while i & !0x7F != 0 {
            buf[n] = ((i & 0x7F) | 0x80) as u8;
            i >>= 7;
            n += 1;
        }
        buf[n] = i as u8;
        self.write_bytes(&buf[..=n])
    }

    fn write_vlong(&mut self, v: i64) -> Result<(), DocValuesError> {
        if v < 0 {
            return Err(DocValuesError::InvalidArgument(format!(
                "cannot write negative vLong: {v}"
            )));
        }
        let mut i = v as u64;
        let mut buf = [0u8; 9];
        let mut n = 0;
        while i & !0x7F != 0 {
            buf[n] = ((i & 0x7F) | 0x80) as u8;
            i >>= 7;
            n += 1;
        }
        buf[n] = i as u8;
        self.write_bytes(&buf[..=n])
    }

    fn write_string(&mut self, s: &str) -> Result<(), DocValuesError> {
        self.write_vint(s.len() as i32)?;
        self.write_bytes(s.as_bytes())
    }
}

impl DataOutput for Vec<u8> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), DocValuesError> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// An append-only file being written inside a [`super::Directory`].
pub trait IndexOutput: DataOutput + Send {
    fn name(&self) -> &str;

    /// Number of bytes written so far.
    fn file_pointer(&self) -> u64;

    /// CRC32 of every byte written so far.
    fn checksum(&self) -> u64;

    /// Flush and publish the file.
    fn close(self: Box<Self>) -> Result<(), DocValuesError>;
}
