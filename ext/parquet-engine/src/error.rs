use thiserror::Error;

/// Core error type for Parquet operations
#[derive(Error, Debug)]
pub enum ParquetError {
    /// IO errors from file operations, including truncated byte ranges
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or inconsistent metadata or page content
    #[error("Format error: {0}")]
    Format(String),

    /// A compression codec the file uses but this crate does not implement
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// A format version newer than this crate understands
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    /// A recognized encoding this crate does not implement
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Schema-related errors
    #[error("Schema error: {0}")]
    Schema(String),

    /// Type conversion errors
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Invalid argument errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal errors that shouldn't happen
    #[error("Internal error: {0}")]
    Internal(String),

    /// UTF-8 decoding errors
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Another error with a description of what was being done
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ParquetError>,
    },
}

/// Coarse classification of a [`ParquetError`]
///
/// Lets callers tell "bad file" apart from "upgrade needed" without matching
/// on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Format,
    UnsupportedCodec,
    UnsupportedVersion,
    UnsupportedEncoding,
    Schema,
    Conversion,
    InvalidArgument,
    Internal,
}

/// Result type alias for Parquet operations
pub type Result<T> = std::result::Result<T, ParquetError>;

impl ParquetError {
    /// Create a new format error
    pub fn format<S: Into<String>>(msg: S) -> Self {
        ParquetError::Format(msg.into())
    }

    /// Create a new unsupported codec error
    pub fn unsupported_codec<S: Into<String>>(msg: S) -> Self {
        ParquetError::UnsupportedCodec(msg.into())
    }

    /// Create a new unsupported version error
    pub fn unsupported_version<S: Into<String>>(msg: S) -> Self {
        ParquetError::UnsupportedVersion(msg.into())
    }

    /// Create a new unsupported encoding error
    pub fn unsupported_encoding<S: Into<String>>(msg: S) -> Self {
        ParquetError::UnsupportedEncoding(msg.into())
    }

    /// Create a new schema error
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        ParquetError::Schema(msg.into())
    }

    /// Create a new conversion error
    pub fn conversion<S: Into<String>>(msg: S) -> Self {
        ParquetError::Conversion(msg.into())
    }

    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        ParquetError::InvalidArgument(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        ParquetError::Internal(msg.into())
    }

    /// Classify this error, looking through any added context
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParquetError::Io(_) => ErrorKind::Io,
            ParquetError::Format(_) | ParquetError::Utf8(_) => ErrorKind::Format,
            ParquetError::UnsupportedCodec(_) => ErrorKind::UnsupportedCodec,
            ParquetError::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
            ParquetError::UnsupportedEncoding(_) => ErrorKind::UnsupportedEncoding,
            ParquetError::Schema(_) => ErrorKind::Schema,
            ParquetError::Conversion(_) => ErrorKind::Conversion,
            ParquetError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ParquetError::Internal(_) => ErrorKind::Internal,
            ParquetError::Context { source, .. } => source.kind(),
        }
    }

    /// True for features that are recognized but not implemented
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UnsupportedCodec
                | ErrorKind::UnsupportedVersion
                | ErrorKind::UnsupportedEncoding
        )
    }
}

/// Extension trait to add context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, ctx: S) -> Result<T>;

    /// Add context with a closure that's only called on error
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<ParquetError>,
{
    fn context<S: Into<String>>(self, ctx: S) -> Result<T> {
        self.map_err(|e| ParquetError::Context {
            context: ctx.into(),
            source: Box::new(e.into()),
        })
    }

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T> {
        self.map_err(|e| ParquetError::Context {
            context: f().into(),
            source: Box::new(e.into()),
        })
    }
}
