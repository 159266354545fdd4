use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array};
use arrow::datatypes::DataType;

use super::{Column, check_doc};
use crate::codec::NumericDocValues;
use crate::core::DocValuesError;

pub struct NumericColumn {
    field: u32,
    values: Arc<NumericDocValues>,
    max_doc: u32,
}

impl NumericColumn {
    pub fn new(field: u32, values: Arc<NumericDocValues>, max_doc: u32) -> Self {
        Self {
            field,
            values,
            max_doc,
        }
    }
}

impl Column for NumericColumn {
    fn field(&self) -> u32 {
        self.field
    }

    fn data_type(&self) -> DataType {
        DataType::Int64
    }

    fn get_indexes(&self, docs: &[u32]) -> Result<ArrayRef, DocValuesError> {
        let mut out = Vec::with_capacity(docs.len());
        for &doc in docs {
            check_doc(doc, self.max_doc)?;
            out.push(self.values.get(doc));
        }
        Ok(Arc::new(Int64Array::from(out)))
    }

    fn get_all(&self) -> Result<ArrayRef, DocValuesError> {
        Ok(Arc::new(Int64Array::from_iter_values(
            (0..self.max_doc).map(|doc| self.values.get(doc)),
        )))
    }

    fn size(&self) -> u32 {
        self.max_doc
    }
}
