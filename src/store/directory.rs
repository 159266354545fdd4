use crate::core::DocValuesError;

use super::input::IndexInput;
use super::output::IndexOutput;

/// Lucene-inspired storage abstraction.
///
/// Files are write-once: an output becomes visible to readers only after it
/// has been closed, and is never modified afterwards.
pub trait Directory: Send + Sync {
    /// Create a new file for writing. Fails if a file of that name exists.
    fn create_output(&self, name: &str) -> Result<Box<dyn IndexOutput>, DocValuesError>;

    /// Open a closed file for random-access reads.
    fn open_input(&self, name: &str) -> Result<IndexInput, DocValuesError>;

    /// Names of all files currently in the directory, sorted.
    fn list(&self) -> Result<Vec<String>, DocValuesError>;

    fn file_length(&self, name: &str) -> Result<u64, DocValuesError> {
        Ok(self.open_input(name)?.len() as u64)
    }
}

/// `_0` + `dvd` -> `_0.dvd`
pub fn segment_file_name(segment: &str, extension: &str) -> String {
    if extension.is_empty() {
        segment.to_string()
    } else {
        format!("{segment}.{extension}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_file_name() {
        assert_eq!(segment_file_name("_0", "dvd"), "_0.dvd");
        assert_eq!(segment_file_name("_3", ""), "_3");
    }
}
