use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;

use crate::core::DocValuesError;

/// Random-access read cursor over an immutable file image.
///
/// Cloning is cheap (the backing [`Bytes`] is reference counted), so each
/// field load works on its own clone and no seek position is ever shared
/// between threads.
#[derive(Clone)]
pub struct IndexInput {
    name: Arc<str>,
    data: Bytes,
    pos: usize,
}

impl std::fmt::Debug for IndexInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexInput")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .field("pos", &self.pos)
            .finish()
    }
}

impl IndexInput {
    pub fn new(name: impl Into<Arc<str>>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            data,
            pos: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// The whole file image, independent of the cursor.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn seek(&mut self, pos: u64) -> Result<(), DocValuesError> {
        if pos > self.data.len() as u64 {
            return Err(DocValuesError::CorruptIndex(format!(
                "seek past EOF: {} (pos {pos}, length {})",
                self.name,
                self.data.len()
            )));
        }
        self.pos = pos as usize;
        Ok(())
    }

    fn eof(&self, wanted: usize) -> DocValuesError {
        DocValuesError::CorruptIndex(format!(
            "read past EOF: {} (pos {}, wanted {wanted}, length {})",
            self.name,
            self.pos,
            self.data.len()
        ))
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn read_slice(&mut self, n: usize) -> Result<&[u8], DocValuesError> {
        if n > self.remaining() {
            return Err(self.eof(n));
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..start + n])
    }

    /// Zero-copy handle to the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes, DocValuesError> {
        if n > self.remaining() {
            return Err(self.eof(n));
        }
        let start = self.pos;
        self.pos += n;
        Ok(self.data.slice(start..start + n))
    }

    pub fn read_byte(&mut self) -> Result<u8, DocValuesError> {
        Ok(self.read_slice(1)?[0])
    }

    pub fn read_int(&mut self) -> Result<i32, DocValuesError> {
        Ok(BigEndian::read_i32(self.read_slice(4)?))
    }

    pub fn read_long(&mut self) -> Result<i64, DocValuesError> {
        Ok(BigEndian::read_i64(self.read_slice(8)?))
    }

    pub fn read_vint(&mut self) -> Result<i32, DocValuesError> {
        let mut result = 0u32;
        for shift in (0..=28).step_by(7) {
            let b = self.read_byte()?;
            if shift == 28 && b & 0xF0 != 0 {
                return Err(DocValuesError::CorruptIndex(format!(
                    "invalid vInt detected (too many bits): {}",
                    self.name
                )));
            }
            result |= ((b & 0x7F) as u32) << shift;
            if b & 0x80 == 0 {
                return Ok(result as i32);
            }
        }
        unreachable!("the fifth byte either terminates or is rejected")
    }

    pub fn read_vlong(&mut self) -> Result<i64, DocValuesError> {
        let mut pos = self.pos;
        match decode_vlong(&self.data, &mut pos) {
            Ok(v) => {
                self.pos = pos;
                Ok(v)
            }
            Err(VLongError::Truncated) => Err(self.eof(pos - self.pos + 1)),
            Err(VLongError::TooLong) => Err(DocValuesError::CorruptIndex(format!(
                "invalid vLong detected (negative values disallowed): {}",
                self.name
            ))),
        }
    }

    pub fn read_string(&mut self) -> Result<String, DocValuesError> {
        let len = self.read_vint()?;
        if len < 0 {
            return Err(DocValuesError::CorruptIndex(format!(
                "negative string length {len}: {}",
                self.name
            )));
        }
        let raw = self.read_slice(len as usize)?;
        String::from_utf8(raw.to_vec())
            .map_err(|e| DocValuesError::CorruptIndex(format!("invalid string: {e}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VLongError {
    /// The bytes ran out mid-value.
    Truncated,
    /// A ninth byte still had its continuation bit set.
    TooLong,
}

/// Decode a non-negative vlong (at most nine bytes) from `bytes` at `pos`,
/// advancing `pos` past the bytes consumed.
pub(crate) fn decode_vlong(bytes: &[u8], pos: &mut usize) -> Result<i64, VLongError> {
    let mut result = 0u64;
    for shift in (0..63).step_by(7) {
        let Some(&b) = bytes.get(*pos) else {
            return Err(VLongError::Truncated);
        };
        *pos += 1;
        result |= ((b & 0x7F) as u64) << shift;
        if b & 0x80 == 0 {
            return Ok(result as i64);
        }
    }
    Err(VLongError::TooLong)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DataOutput;

    fn input(data: Vec<u8>) -> IndexInput {
        IndexInput::new("test", Bytes::from(data))
    }

    #[test]
    fn test_primitives_round_trip() {
        let mut buf = Vec::new();
        buf.write_byte(7).unwrap();
        buf.write_int(-123456).unwrap();
        buf.write_long(i64::MIN).unwrap();
        buf.write_vint(300).unwrap();
        buf.write_vint(-1).unwrap();
        buf.write_vlong(i64::MAX).unwrap();
        buf.write_string("codec").unwrap();

        let mut inp = input(buf);
        assert_eq!(inp.read_byte().unwrap(), 7);
        assert_eq!(inp.read_int().unwrap(), -123456);
        assert_eq!(inp.read_long().unwrap(), i64::MIN);
        assert_eq!(inp.read_vint().unwrap(), 300);
        assert_eq!(inp.read_vint().unwrap(), -1);
        assert_eq!(inp.read_vlong().unwrap(), i64::MAX);
        assert_eq!(inp.read_string().unwrap(), "codec");
        assert_eq!(inp.remaining(), 0);
    }

    #[test]
    fn test_short_read_is_corruption() {
        let mut inp = input(vec![1, 2, 3]);
        let err = inp.read_int().unwrap_err();
        assert!(err.is_corruption());
        assert!(err.to_string().contains("read past EOF"));
        // cursor untouched by the failed read
        assert_eq!(inp.position(), 0);
    }

    #[test]
    fn test_vint_with_too_many_bits() {
        let mut inp = input(vec![0xFF, 0xFF, 0xFF, 0xFF, 0x7F]);
        assert!(inp.read_vint().unwrap_err().to_string().contains("too many bits"));
    }

    #[test]
    fn test_overlong_vlong() {
        let mut inp = input(vec![0xFF; 10]);
        assert!(inp.read_vlong().unwrap_err().is_corruption());
    }

    #[test]
    fn test_seek_and_zero_copy_slice() {
        let mut inp = input(vec![10, 11, 12, 13, 14]);
        inp.seek(2).unwrap();
        let b = inp.read_bytes(2).unwrap();
        assert_eq!(&b[..], &[12, 13]);
        assert_eq!(inp.position(), 4);
        assert!(inp.seek(6).is_err());
        assert!(inp.seek(5).is_ok());
    }

    #[test]
    fn test_clones_have_independent_cursors() {
        let mut a = input(vec![1, 2, 3]);
        let mut b = a.clone();
        a.read_byte().unwrap();
        assert_eq!(b.read_byte().unwrap(), 1);
        assert_eq!(a.read_byte().unwrap(), 2);
    }

    #[test]
    fn test_decode_vlong_from_slice() {
        let mut buf = Vec::new();
        for v in [0i64, 1, 127, 128, 300, i64::MAX] {
            buf.write_vlong(v).unwrap();
        }
        let mut pos = 0;
        for v in [0i64, 1, 127, 128, 300, i64::MAX] {
            assert_eq!(decode_vlong(&buf, &mut pos), Ok(v));
        }
        assert_eq!(pos, buf.len());
        assert_eq!(decode_vlong(&[0x80], &mut 0), Err(VLongError::Truncated));
        assert_eq!(decode_vlong(&[0xFF; 10], &mut 0), Err(VLongError::TooLong));
    }

    #[test]
    fn test_truncated_vlong_leaves_position() {
        let mut inp = input(vec![0x05, 0x80, 0x80]);
        assert_eq!(inp.read_vlong().unwrap(), 5);
        assert!(inp.read_vlong().unwrap_err().is_corruption());
        assert_eq!(inp.position(), 1);
    }
}
