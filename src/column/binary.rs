use std::sync::Arc;

use arrow::array::{ArrayRef, BinaryBuilder};
use arrow::datatypes::DataType;

use super::{Column, check_doc};
use crate::codec::BinaryDocValues;
use crate::core::DocValuesError;

pub struct BinaryColumn {
    field: u32,
    values: Arc<BinaryDocValues>,
    max_doc: u32,
}

impl BinaryColumn {
    pub fn new(field: u32, values: Arc<BinaryDocValues>, max_doc: u32) -> Self {
        Self {
            field,
            values,
            max_doc,
        }
    }
}

impl Column for BinaryColumn {
    fn field(&self) -> u32 {
        self.field
    }

    fn data_type(&self) -> DataType {
        DataType::Binary
    }

    fn get_indexes(&self, docs: &[u32]) -> Result<ArrayRef, DocValuesError> {
        let mut builder = BinaryBuilder::with_capacity(docs.len(), 0);
        for &doc in docs {
            check_doc(doc, self.max_doc)?;
            builder.append_value(self.values.get(doc));
        }
        Ok(Arc::new(builder.finish()))
    }

    fn size(&self) -> u32 {
        self.max_doc
    }
}
