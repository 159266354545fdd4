use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::core::DocValuesError;

use super::directory::Directory;
use super::input::IndexInput;
use super::output::{DataOutput, IndexOutput};

type FileMap = Arc<RwLock<HashMap<String, Bytes>>>;

/// In-memory Directory implementation backed by heap-allocated byte arrays.
#[derive(Default, Clone)]
pub struct HeapDirectory {
    files: FileMap,
}

impl HeapDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a file's contents wholesale.
    pub fn put_file(&self, name: &str, data: impl Into<Bytes>) {
        self.files.write().insert(name.to_string(), data.into());
    }
}

impl Directory for HeapDirectory {
    fn create_output(&self, name: &str) -> Result<Box<dyn IndexOutput>, DocValuesError> {
        if self.files.read().contains_key(name) {
            return Err(already_exists(name));
        }
        Ok(Box::new(HeapOutput {
            name: name.to_string(),
            buf: Vec::new(),
            hasher: crc32fast::Hasher::new(),
            files: Arc::clone(&self.files),
        }))
    }

    fn open_input(&self, name: &str) -> Result<IndexInput, DocValuesError> {
        let files = self.files.read();
        let data = files
            .get(name)
            .ok_or_else(|| DocValuesError::IoError(format!("file not found: {name}")))?;
        Ok(IndexInput::new(name, data.clone()))
    }

    fn list(&self) -> Result<Vec<String>, DocValuesError> {
        let mut names: Vec<String> = self.files.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

struct HeapOutput {
    name: String,
    buf: Vec<u8>,
    hasher: crc32fast::Hasher,
    files: FileMap,
}

impl DataOutput for HeapOutput {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), DocValuesError> {
        self.hasher.update(bytes);
        self.buf.extend_from_slice(bytes);
        Ok(())
    }
}

impl IndexOutput for HeapOutput {
    fn name(&self) -> &str {
        &self.name
    }

    fn file_pointer(&self) -> u64 {
        self.buf.len() as u64
    }

    fn checksum(&self) -> u64 {
        self.hasher.clone().finalize() as u64
    }

    fn close(self: Box<Self>) -> Result<(), DocValuesError> {
        let HeapOutput {
            name, buf, files, ..
        } = *self;
        let mut files = files.write();
        if files.contains_key(&name) {
            return Err(already_exists(&name));
        }
        files.insert(name, Bytes::from(buf));
        Ok(())
    }
}

fn already_exists(name: &str) -> DocValuesError {
    DocValuesError::IoError(format!("file already exists: {name}"))
}
