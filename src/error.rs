//! Error types and handling for shmstruct

/// Result type alias for shmstruct operations
pub type Result<T> = std::result::Result<T, StructError>;

/// Error types for layout planning, buffer binding and field access
#[derive(Debug, thiserror::Error)]
pub enum StructError {
    /// Unknown or malformed type tag
    #[error("Invalid type: {tag} - {reason}")]
    InvalidType { tag: String, reason: String },

    /// Fixed-width element views requested over a misaligned address
    #[error("Alignment error: address {address:#x} not aligned to {alignment}")]
    Alignment { address: usize, alignment: usize },

    /// Invalid parameters, options or values
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// A value of one kind was written to a field of another
    #[error("Kind mismatch: field is {expected}, got {actual}")]
    KindMismatch { expected: String, actual: String },

    /// Element index past the end of an array field
    #[error("Index out of bounds: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// No field at the given path
    #[error("Field not found: {path}")]
    FieldNotFound { path: String },

    /// I/O related errors (file-backed regions, mmap)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Snapshot encoding/decoding errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Snapshot written by an incompatible format version
    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u64, actual: u64 },

    /// Platform-specific errors
    #[error("Platform error: {message}")]
    Platform { message: String },
}

impl StructError {
    /// Create an invalid type error
    pub fn invalid_type(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidType {
            tag: tag.into(),
            reason: reason.into(),
        }
    }

    /// Create an alignment error
    pub fn alignment(address: usize, alignment: usize) -> Self {
        Self::Alignment { address, alignment }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a kind mismatch error
    pub fn kind_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::KindMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds { index, len }
    }

    /// Create a field not found error
    pub fn field_not_found(path: impl Into<String>) -> Self {
        Self::FieldNotFound { path: path.into() }
    }

    /// Create an I/O error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Io {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a version mismatch error
    pub fn version_mismatch(expected: u64, actual: u64) -> Self {
        Self::VersionMismatch { expected, actual }
    }

    /// Create a platform error
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for StructError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}

impl From<bincode::Error> for StructError {
    fn from(err: bincode::Error) -> Self {
        Self::serialization(format!("Bincode error: {}", err))
    }
}
