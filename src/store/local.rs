use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use memmap2::Mmap;

use crate::core::DocValuesError;

use super::directory::Directory;
use super::input::IndexInput;
use super::output::{DataOutput, IndexOutput};

/// Directory over a local filesystem path. Reads are memory-mapped.
pub struct LocalDirectory {
    path: PathBuf,
}

impl LocalDirectory {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DocValuesError> {
        let path = path.into();
        if !path.is_dir() {
            return Err(DocValuesError::IoError(format!(
                "not a directory: {}",
                path.display()
            )));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Directory for LocalDirectory {
    fn create_output(&self, name: &str) -> Result<Box<dyn IndexOutput>, DocValuesError> {
        let file_path = self.path.join(name);
        // never truncate: an existing file may be mapped by a live reader
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .map_err(|e| {
                DocValuesError::IoError(format!("creating {}: {}", file_path.display(), e))
            })?;
        Ok(Box::new(LocalOutput {
            name: name.to_string(),
            writer: BufWriter::new(file),
            hasher: crc32fast::Hasher::new(),
            written: 0,
        }))
    }

    fn open_input(&self, name: &str) -> Result<IndexInput, DocValuesError> {
        let file_path = self.path.join(name);
        let file = File::open(&file_path).map_err(|e| {
            DocValuesError::IoError(format!("opening {}: {}", file_path.display(), e))
        })?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(IndexInput::new(name, Bytes::new()));
        }
        // SAFETY: the file is opened read-only and files are never modified
        // after they have been closed, so the mapping is treated as immutable.
        let mmap = unsafe { Mmap::map(&file) }?;
        Ok(IndexInput::new(name, Bytes::from_owner(mmap)))
    }

    fn list(&self) -> Result<Vec<String>, DocValuesError> {
        let mut names: Vec<String> = std::fs::read_dir(&self.path)
            .map_err(|e| {
                DocValuesError::IoError(format!(
                    "reading directory {}: {}",
                    self.path.display(),
                    e
                ))
            })?
            .filter_map(|entry| {
                let entry = entry.ok()?;
                if !entry.file_type().ok()?.is_file() {
                    return None;
                }
                entry.file_name().to_str().map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }

    fn file_length(&self, name: &str) -> Result<u64, DocValuesError> {
        Ok(std::fs::metadata(self.path.join(name))?.len())
    }
}

struct LocalOutput {
    name: String,
    writer: BufWriter<File>,
    hasher: crc32fast::Hasher,
    written: u64,
}

impl DataOutput for LocalOutput {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), DocValuesError> {
        self.writer.write_all(bytes)?;
        self.hasher.update(bytes);
        self.written += bytes.len() as u64;
        Ok(())
    }
}

impl IndexOutput for LocalOutput {
    fn name(&self) -> &str {
        &self.name
    }

    fn file_pointer(&self) -> u64 {
        self.written
    }

    fn checksum(&self) -> u64 {
        self.hasher.clone().finalize() as u64
    }

    fn close(self: Box<Self>) -> Result<(), DocValuesError> {
        let file = self
            .writer
            .into_inner()
            .map_err(|e| DocValuesError::IoError(e.error().to_string()))?;
        file.sync_all()?;
        Ok(())
    }
}
