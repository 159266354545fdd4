//! Header and footer framing shared by the metadata and data files.
//!
//! ```text
//! header: [CODEC_MAGIC i32][codec name: vint len + utf8][version i32]
//! footer: [FOOTER_MAGIC i32][algorithm id i32 = 0][crc32 i64]
//! ```
//!
//! The footer checksum covers every byte of the file before the checksum
//! itself, including the footer magic and algorithm id.

use crate::core::DocValuesError;

use super::input::IndexInput;
use super::output::{DataOutput, IndexOutput};

pub const CODEC_MAGIC: i32 = 0x3fd7_6c17;
pub const FOOTER_MAGIC: i32 = !CODEC_MAGIC;
pub const FOOTER_LENGTH: usize = 16;

const CRC32_ALGORITHM: i32 = 0;

pub fn write_header<O: DataOutput + ?Sized>(
    out: &mut O,
    codec: &str,
    version: i32,
) -> Result<(), DocValuesError> {
    if codec.len() >= 128 || !codec.is_ascii() {
        return Err(DocValuesError::InvalidArgument(format!(
            "codec name must be simple ASCII, less than 128 characters: {codec}"
        )));
    }
    out.write_int(CODEC_MAGIC)?;
    out.write_string(codec)?;
    out.write_int(version)
}

pub fn header_length(codec: &str) -> usize {
    9 + codec.len()
}

/// Validate the header at the cursor and return the file's format version.
pub fn check_header(
    input: &mut IndexInput,
    codec: &str,
    min_version: i32,
    max_version: i32,
) -> Result<i32, DocValuesError> {
    let magic = input.read_int()?;
    if magic != CODEC_MAGIC {
        return Err(DocValuesError::CorruptIndex(format!(
            "codec header mismatch: actual header={magic:#x} vs expected header={CODEC_MAGIC:#x} (resource: {})",
            input.name()
        )));
    }
    let actual = input.read_string()?;
    if actual != codec {
        return Err(DocValuesError::CorruptIndex(format!(
            "codec mismatch: actual codec={actual} vs expected codec={codec} (resource: {})",
            input.name()
        )));
    }
    let version = input.read_int()?;
    if version < min_version {
        return Err(DocValuesError::FormatTooOld {
            version,
            min: min_version,
        });
    }
    if version > max_version {
        return Err(DocValuesError::FormatTooNew {
            version,
            max: max_version,
        });
    }
    Ok(version)
}

pub fn write_footer(out: &mut dyn IndexOutput) -> Result<(), DocValuesError> {
    out.write_int(FOOTER_MAGIC)?;
    out.write_int(CRC32_ALGORITHM)?;
    let checksum = out.checksum();
    out.write_long(checksum as i64)
}

fn validate_footer(input: &mut IndexInput) -> Result<(), DocValuesError> {
    let magic = input.read_int()?;
    if magic != FOOTER_MAGIC {
        return Err(DocValuesError::CorruptIndex(format!(
            "codec footer mismatch: actual footer={magic:#x} vs expected footer={FOOTER_MAGIC:#x} (resource: {})",
            input.name()
        )));
    }
    let algorithm = input.read_int()?;
    if algorithm != CRC32_ALGORITHM {
        return Err(DocValuesError::CorruptIndex(format!(
            "unknown checksum algorithm id: {algorithm} (resource: {})",
            input.name()
        )));
    }
    Ok(())
}

fn read_crc(input: &mut IndexInput) -> Result<i64, DocValuesError> {
    let value = input.read_long()?;
    if value as u64 & 0xFFFF_FFFF_0000_0000 != 0 {
        return Err(DocValuesError::CorruptIndex(format!(
            "illegal CRC-32 checksum: {value} (resource: {})",
            input.name()
        )));
    }
    Ok(value)
}

/// Check the footer at the cursor, which must be exactly at the footer start,
/// and verify the checksum of everything before it.
pub fn check_footer(input: &mut IndexInput) -> Result<i64, DocValuesError> {
    let remaining = input.remaining();
    if remaining != FOOTER_LENGTH {
        return Err(DocValuesError::CorruptIndex(format!(
            "expected footer of {FOOTER_LENGTH} bytes at position {}, found {remaining} remaining (resource: {})",
            input.position(),
            input.name()
        )));
    }
    validate_footer(input)?;
    let covered = input.len() - 8;
    let actual = crc32fast::hash(&input.bytes()[..covered]) as i64;
    let expected = read_crc(input)?;
    if actual != expected {
        return Err(DocValuesError::CorruptIndex(format!(
            "checksum failed (hardware problem?): expected={expected:#x} actual={actual:#x} (resource: {})",
            input.name()
        )));
    }
    Ok(actual)
}

/// Pre-checksum files must end exactly where their content ends.
pub fn check_eof(input: &IndexInput) -> Result<(), DocValuesError> {
    if input.remaining() != 0 {
        return Err(DocValuesError::CorruptIndex(format!(
            "did not read all bytes from file: read {} vs size {} (resource: {})",
            input.position(),
            input.len(),
            input.name()
        )));
    }
    Ok(())
}

/// Validate footer structure and return the stored checksum, without hashing
/// the file.
pub fn retrieve_checksum(input: &IndexInput) -> Result<i64, DocValuesError> {
    let mut footer = input.clone();
    if footer.len() < FOOTER_LENGTH {
        return Err(DocValuesError::CorruptIndex(format!(
            "misplaced codec footer (file truncated?): length={} but footer length={FOOTER_LENGTH} (resource: {})",
            footer.len(),
            footer.name()
        )));
    }
    footer.seek((footer.len() - FOOTER_LENGTH) as u64)?;
    validate_footer(&mut footer)?;
    read_crc(&mut footer)
}

/// Hash the entire file and compare against its footer.
pub fn checksum_entire_file(input: &IndexInput) -> Result<i64, DocValuesError> {
    let mut footer = input.clone();
    if footer.len() < FOOTER_LENGTH {
        return Err(DocValuesError::CorruptIndex(format!(
            "misplaced codec footer (file truncated?): length={} but footer length={FOOTER_LENGTH} (resource: {})",
            footer.len(),
            footer.name()
        )));
    }
    footer.seek((footer.len() - FOOTER_LENGTH) as u64)?;
    check_footer(&mut footer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Directory, HeapDirectory};

    fn framed(dir: &HeapDirectory, name: &str, body: &[u8]) -> IndexInput {
        let mut out = dir.create_output(name).unwrap();
        write_header(out.as_mut(), "TestCodec", 2).unwrap();
        out.write_bytes(body).unwrap();
        write_footer(out.as_mut()).unwrap();
        out.close().unwrap();
        dir.open_input(name).unwrap()
    }

    #[test]
    fn test_header_layout() {
        let mut buf = Vec::new();
        write_header(&mut buf, "TestCodec", 2).unwrap();
        assert_eq!(buf.len(), header_length("TestCodec"));
        assert_eq!(&buf[..4], &[0x3f, 0xd7, 0x6c, 0x17]);
    }

    #[test]
    fn test_header_and_footer_round_trip() {
        let dir = HeapDirectory::new();
        let mut inp = framed(&dir, "f", b"payload");
        assert_eq!(check_header(&mut inp, "TestCodec", 0, 2).unwrap(), 2);
        assert_eq!(inp.read_slice(7).unwrap(), b"payload");
        let crc = check_footer(&mut inp).unwrap();
        assert_eq!(retrieve_checksum(&inp).unwrap(), crc);
        assert_eq!(checksum_entire_file(&inp).unwrap(), crc);
    }

    #[test]
    fn test_wrong_codec_name() {
        let dir = HeapDirectory::new();
        let mut inp = framed(&dir, "f", b"");
        let err = check_header(&mut inp, "Other", 0, 2).unwrap_err();
        assert!(err.to_string().contains("codec mismatch"));
    }

    #[test]
    fn test_version_bounds() {
        let dir = HeapDirectory::new();
        let mut inp = framed(&dir, "f", b"");
        assert_eq!(
            check_header(&mut inp.clone(), "TestCodec", 0, 1),
            Err(DocValuesError::FormatTooNew { version: 2, max: 1 })
        );
        assert_eq!(
            check_header(&mut inp, "TestCodec", 3, 4),
            Err(DocValuesError::FormatTooOld { version: 2, min: 3 })
        );
    }

    #[test]
    fn test_flipped_byte_fails_checksum() {
        let dir = HeapDirectory::new();
        let inp = framed(&dir, "f", b"payload");
        let mut raw = inp.bytes().to_vec();
        raw[header_length("TestCodec") + 1] ^= 0xFF;
        dir.put_file("f", raw);

        let inp = dir.open_input("f").unwrap();
        // structure still intact, only the hash disagrees
        assert!(retrieve_checksum(&inp).is_ok());
        let err = checksum_entire_file(&inp).unwrap_err();
        assert!(err.to_string().contains("checksum failed"));
    }

    #[test]
    fn test_truncated_footer() {
        let dir = HeapDirectory::new();
        let inp = framed(&dir, "f", b"payload");
        let mut raw = inp.bytes().to_vec();
        raw.pop();
        dir.put_file("f", raw);

        let inp = dir.open_input("f").unwrap();
        assert!(retrieve_checksum(&inp).unwrap_err().is_corruption());
        assert!(checksum_entire_file(&inp).unwrap_err().is_corruption());
    }

    #[test]
    fn test_check_eof() {
        let mut inp = IndexInput::new("f", bytes::Bytes::from_static(&[1, 2]));
        assert!(check_eof(&inp).is_err());
        inp.read_slice(2).unwrap();
        assert!(check_eof(&inp).is_ok());
    }
}
