use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DocValuesError {
    #[error("Cannot parse config: {0}")]
    ConfigParsingError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Arrow error: {0}")]
    ArrowError(String),
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),
    #[error("Format version {version} is too old (minimum supported {min})")]
    FormatTooOld { version: i32, min: i32 },
    #[error("Format version {version} is too new (maximum supported {max})")]
    FormatTooNew { version: i32, max: i32 },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("No doc values for field {field} of type {kind}")]
    FieldNotFound { field: u32, kind: &'static str },
    #[error("Writer already finished")]
    AlreadyFinished,
    #[error("Writer aborted: an earlier field failed to write")]
    WriterAborted,
}

impl DocValuesError {
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            DocValuesError::CorruptIndex(_)
                | DocValuesError::FormatTooOld { .. }
                | DocValuesError::FormatTooNew { .. }
        )
    }
}

impl From<std::io::Error> for DocValuesError {
    fn from(err: std::io::Error) -> Self {
        DocValuesError::IoError(err.to_string())
    }
}

impl From<arrow::error::ArrowError> for DocValuesError {
    fn from(err: arrow::error::ArrowError) -> Self {
        DocValuesError::ArrowError(err.to_string())
    }
}

impl From<config::ConfigError> for DocValuesError {
    fn from(err: config::ConfigError) -> Self {
        DocValuesError::ConfigParsingError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corruption_classification() {
        assert!(DocValuesError::CorruptIndex("x".into()).is_corruption());
        assert!(DocValuesError::FormatTooNew { version: 9, max: 2 }.is_corruption());
        assert!(!DocValuesError::IoError("disk".into()).is_corruption());
        assert!(!DocValuesError::InvalidArgument("bad".into()).is_corruption());
    }

    #[test]
    fn test_io_error_conversion() {
        let err: DocValuesError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err, DocValuesError::IoError("gone".to_string()));
    }
}
