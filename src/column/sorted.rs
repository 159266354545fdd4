use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryArray, BinaryBuilder, DictionaryArray, Int32Array, ListBuilder,
};
use arrow::datatypes::{DataType, Field, Int32Type};

use super::{Column, check_doc};
use crate::codec::{SortedDocValues, SortedSetDocValues};
use crate::core::DocValuesError;

/// Dictionary-encoded view: keys are the ordinals, values the whole term
/// dictionary. Documents without a value are null.
pub struct SortedColumn {
    field: u32,
    values: Arc<SortedDocValues>,
    max_doc: u32,
}

impl SortedColumn {
    pub fn new(field: u32, values: Arc<SortedDocValues>, max_doc: u32) -> Self {
        Self {
            field,
            values,
            max_doc,
        }
    }
}

impl Column for SortedColumn {
    fn field(&self) -> u32 {
        self.field
    }

    fn data_type(&self) -> DataType {
        DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Binary))
    }

    fn get_indexes(&self, docs: &[u32]) -> Result<ArrayRef, DocValuesError> {
        let mut keys = Vec::with_capacity(docs.len());
        for &doc in docs {
            check_doc(doc, self.max_doc)?;
            let ord = self.values.ord(doc);
            keys.push((ord >= 0).then_some(ord));
        }
        let terms = BinaryArray::from_iter_values(self.values.terms());
        let array = DictionaryArray::<Int32Type>::try_new(Int32Array::from(keys), Arc::new(terms))?;
        Ok(Arc::new(array))
    }

    fn size(&self) -> u32 {
        self.max_doc
    }
}

/// List-of-binary view: each document's terms in ordinal order.
pub struct SortedSetColumn {
    field: u32,
    values: Arc<SortedSetDocValues>,
    max_doc: u32,
}

impl SortedSetColumn {
    pub fn new(field: u32, values: Arc<SortedSetDocValues>, max_doc: u32) -> Self {
        Self {
            field,
            values,
            max_doc,
        }
    }
}

impl Column for SortedSetColumn {
    fn field(&self) -> u32 {
        self.field
    }

    fn data_type(&self) -> DataType {
        DataType::List(Arc::new(Field::new("item", DataType::Binary, true)))
    }

    fn get_indexes(&self, docs: &[u32]) -> Result<ArrayRef, DocValuesError> {
        let mut builder = ListBuilder::new(BinaryBuilder::new());
        let mut cursor = self.values.cursor();
        for &doc in docs {
            check_doc(doc, self.max_doc)?;
            cursor.set_document(doc);
            for ord in cursor.by_ref() {
                let term = self.values.lookup_ord(ord as i64).ok_or_else(|| {
                    DocValuesError::CorruptIndex(format!(
                        "field {}: doc {doc} references ordinal {ord} beyond {} terms",
                        self.field,
                        self.values.value_count()
                    ))
                })?;
                builder.values().append_value(term);
            }
            builder.append(true);
        }
        Ok(Arc::new(builder.finish()))
    }

    fn size(&self) -> u32 {
        self.max_doc
    }
}
