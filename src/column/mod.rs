//! Arrow views over doc-values fields.

mod binary;
mod numeric;
mod sorted;

pub use binary::BinaryColumn;
pub use numeric::NumericColumn;
pub use sorted::{SortedColumn, SortedSetColumn};

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::codec::{DocValuesReader, DocValuesType};
use crate::core::DocValuesError;

pub trait Column: Send + Sync {
    fn field(&self) -> u32;

    /// Arrow type of the arrays this column produces.
    fn data_type(&self) -> DataType;

    /// Pull the values of `docs`, in order, as one Arrow array.
    fn get_indexes(&self, docs: &[u32]) -> Result<ArrayRef, DocValuesError>;

    /// Every document's value.
    fn get_all(&self) -> Result<ArrayRef, DocValuesError> {
        let docs: Vec<u32> = (0..self.size()).collect();
        self.get_indexes(&docs)
    }

    /// Number of documents.
    fn size(&self) -> u32;
}

pub(crate) fn check_doc(doc: u32, size: u32) -> Result<(), DocValuesError> {
    if doc >= size {
        return Err(DocValuesError::InvalidArgument(format!(
            "doc {doc} out of range (segment has {size} docs)"
        )));
    }
    Ok(())
}

/// Open the column for `field`, whatever its type.
pub fn open_column(
    reader: &DocValuesReader,
    field: u32,
) -> Result<Box<dyn Column>, DocValuesError> {
    let max_doc = reader.max_doc();
    let kind = reader
        .field_type(field)
        .ok_or(DocValuesError::FieldNotFound { field, kind: "any" })?;
    let column: Box<dyn Column> = match kind {
        DocValuesType::Numeric => {
            Box::new(NumericColumn::new(field, reader.numeric(field)?, max_doc))
        }
        DocValuesType::Binary => Box::new(BinaryColumn::new(field, reader.binary(field)?, max_doc)),
        DocValuesType::Sorted => Box::new(SortedColumn::new(field, reader.sorted(field)?, max_doc)),
        DocValuesType::SortedSet => Box::new(SortedSetColumn::new(
            field,
            reader.sorted_set(field)?,
            max_doc,
        )),
    };
    Ok(column)
}

/// Name a field gets in a [`RecordBatch`].
pub fn column_name(field: u32) -> String {
    format!("field_{field}")
}

/// Read `fields` for `docs` (all documents when `None`) into one batch.
pub fn read_batch(
    reader: &DocValuesReader,
    fields: &[u32],
    docs: Option<&[u32]>,
) -> Result<RecordBatch, DocValuesError> {
    let mut schema_fields = Vec::with_capacity(fields.len());
    let mut arrays = Vec::with_capacity(fields.len());
    for &field in fields {
        let column = open_column(reader, field)?;
        let array = match docs {
            Some(docs) => column.get_indexes(docs)?,
            None => column.get_all()?,
        };
        schema_fields.push(Field::new(column_name(field), column.data_type(), true));
        arrays.push(array);
    }
    let schema = Arc::new(Schema::new(schema_fields));
    Ok(RecordBatch::try_new(schema, arrays)?)
}
