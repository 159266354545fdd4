use log::info;

use super::{DocValuesReader, DocValuesType, DocValuesWriter};
use crate::core::DocValuesError;

/// Re-encode every field of `reader` into `writer`, letting the writer's
/// settings pick fresh encodings. Returns the number of fields copied.
///
/// The target must be a different segment: the source files stay mapped
/// while they are copied.
pub fn copy_fields(
    reader: &DocValuesReader,
    writer: &mut DocValuesWriter,
) -> Result<usize, DocValuesError> {
    if reader.segment() == writer.segment() {
        return Err(DocValuesError::InvalidArgument(format!(
            "cannot rewrite segment {} onto itself",
            reader.segment()
        )));
    }
    if reader.max_doc() != writer.max_doc() {
        return Err(DocValuesError::InvalidArgument(format!(
            "source has {} docs but target expects {}",
            reader.max_doc(),
            writer.max_doc()
        )));
    }
    let max_doc = reader.max_doc();
    let fields = reader.fields();
    for summary in &fields {
        let field = summary.field;
        match summary.kind {
            DocValuesType::Numeric => {
                let values = reader.numeric(field)?;
                let all: Vec<i64> = (0..max_doc).map(|doc| values.get(doc)).collect();
                writer.add_numeric_field(field, &all)?;
            }
            DocValuesType::Binary => {
                let values = reader.binary(field)?;
                let all: Vec<&[u8]> = (0..max_doc).map(|doc| values.get(doc)).collect();
                writer.add_binary_field(field, &all)?;
            }
            DocValuesType::Sorted => {
                let values = reader.sorted(field)?;
                let terms: Vec<&[u8]> = values.terms().collect();
                let ords: Vec<i32> = (0..max_doc).map(|doc| values.ord(doc)).collect();
                writer.add_sorted_field(field, &terms, &ords)?;
            }
            DocValuesType::SortedSet => {
                let values = reader.sorted_set(field)?;
                let terms: Vec<&[u8]> = values.terms().collect();
                let mut counts = Vec::with_capacity(max_doc as usize);
                let mut ords = Vec::new();
                let mut cursor = values.cursor();
                for doc in 0..max_doc {
                    cursor.set_document(doc);
                    let before = ords.len();
                    ords.extend(cursor.by_ref().map(|ord| ord as i64));
                    counts.push((ords.len() - before) as u32);
                }
                writer.add_sorted_set_field(field, &terms, &counts, &ords)?;
            }
        }
    }
    info!(
        "copied {} fields from segment {}",
        fields.len(),
        reader.segment()
    );
    Ok(fields.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::NumericFormat;
    use crate::conf::CodecConfig;
    use crate::store::HeapDirectory;

    #[test]
    fn test_copy_with_norms_settings() {
        let dir = HeapDirectory::new();
        let mut writer = DocValuesWriter::new(&dir, "_a", 4, CodecConfig::default()).unwrap();
        writer.add_numeric_field(0, &[1, -2, 3, -4]).unwrap();
        writer.add_binary_field(1, &["w", "", "xyz", "q"]).unwrap();
        writer.add_sorted_field(2, &["m", "n"], &[0, 1, -1, 0]).unwrap();
        writer
            .add_sorted_set_field(3, &["s", "t"], &[2, 0, 1, 1], &[0, 1, 1, 0])
            .unwrap();
        writer.finish().unwrap();
        let source = DocValuesReader::open(&dir, "_a", 4).unwrap();
        assert_eq!(source.numeric(0).unwrap().format(), NumericFormat::Table);

        let mut writer = DocValuesWriter::new(&dir, "_b", 4, CodecConfig::norms()).unwrap();
        assert_eq!(copy_fields(&source, &mut writer).unwrap(), 4);
        writer.finish().unwrap();
        let copy = DocValuesReader::open(&dir, "_b", 4).unwrap();

        let numeric = copy.numeric(0).unwrap();
        assert_eq!(numeric.format(), NumericFormat::Uncompressed);
        assert_eq!(numeric.get(3), -4);
        assert_eq!(copy.binary(1).unwrap().get(2), b"xyz");
        assert_eq!(copy.sorted(2).unwrap().ord(2), -1);
        let ords: Vec<u64> = copy.sorted_set(3).unwrap().ords(0).collect();
        assert_eq!(ords, vec![0, 1]);
        let mut expected = source.fields();
        expected[0].encoding = "uncompressed".to_string();
        assert_eq!(copy.fields(), expected);
    }

    #[test]
    fn test_rewrite_onto_source_segment_rejected() {
        let source_dir = HeapDirectory::new();
        let mut writer =
            DocValuesWriter::new(&source_dir, "_0", 2, CodecConfig::default()).unwrap();
        writer.add_numeric_field(0, &[5, 6]).unwrap();
        writer.finish().unwrap();
        let source = DocValuesReader::open(&source_dir, "_0", 2).unwrap();

        // the source directory refuses to recreate live files
        assert!(DocValuesWriter::new(&source_dir, "_0", 2, CodecConfig::default()).is_err());

        let other_dir = HeapDirectory::new();
        let mut target = DocValuesWriter::new(&other_dir, "_0", 2, CodecConfig::default()).unwrap();
        assert!(matches!(
            copy_fields(&source, &mut target),
            Err(DocValuesError::InvalidArgument(_))
        ));
        assert_eq!(source.numeric(0).unwrap().get(1), 6);
    }

    #[test]
    fn test_doc_count_mismatch() {
        let dir = HeapDirectory::new();
        let writer = DocValuesWriter::new(&dir, "_a", 2, CodecConfig::default()).unwrap();
        writer.finish().unwrap();
        let source = DocValuesReader::open(&dir, "_a", 2).unwrap();
        let mut target = DocValuesWriter::new(&dir, "_b", 3, CodecConfig::default()).unwrap();
        assert!(copy_fields(&source, &mut target).is_err());
    }
}
