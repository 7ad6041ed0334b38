//! qpdf session error types.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for native document operations.
pub type QpdfResult<T> = Result<T, QpdfError>;

/// Error classes reported by the native library (`enum qpdf_error_code_e`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeErrorCode {
    /// Logic error inside the library.
    Internal,
    /// I/O or memory error.
    System,
    /// PDF feature the library does not support.
    Unsupported,
    /// Incorrect password for an encrypted input.
    WrongPassword,
    /// Syntax errors or other damage in the input.
    Damaged,
    /// Erroneous or unsupported page tree.
    UnsupportedPageStructure,
}

impl NativeErrorCode {
    /// Maps a raw `qpdf_error_code_e` value. `0` (success) maps to `None`;
    /// values newer than this binding knows about are treated as internal.
    pub fn from_raw(code: i32) -> Option<Self> {
        match code {
            0 => None,
            2 => Some(Self::System),
            3 => Some(Self::Unsupported),
            4 => Some(Self::WrongPassword),
            5 => Some(Self::Damaged),
            6 => Some(Self::UnsupportedPageStructure),
            _ => Some(Self::Internal),
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Self::Internal => 1,
            Self::System => 2,
            Self::Unsupported => 3,
            Self::WrongPassword => 4,
            Self::Damaged => 5,
            Self::UnsupportedPageStructure => 6,
        }
    }

    /// The caller can retry at a higher level, e.g. with another destination.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::System)
    }

    /// The caller can recover by asking for a different password.
    pub fn is_caller_recoverable(self) -> bool {
        matches!(self, Self::WrongPassword)
    }
}

impl fmt::Display for NativeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Internal => "internal",
            Self::System => "system",
            Self::Unsupported => "unsupported",
            Self::WrongPassword => "wrongPassword",
            Self::Damaged => "damaged",
            Self::UnsupportedPageStructure => "unsupportedPageStructure",
        };
        f.write_str(name)
    }
}

/// A structured error retrieved from the native context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    pub code: NativeErrorCode,
    pub message: String,
}

/// Errors that can occur while driving a native document session.
#[derive(Debug, Error)]
pub enum QpdfError {
    #[error("could not load qpdf library from {path}: {reason}")]
    LibraryLoad { path: PathBuf, reason: String },

    #[error("qpdf context is not initialized")]
    NotInitialized,

    #[error("no document has been read into the qpdf context")]
    NoDocumentLoaded,

    #[error("init_write must succeed before write options can be set")]
    WriteNotInitialized,

    #[error("qpdf session is closed")]
    Closed,

    #[error("qpdf {code} error: {message}")]
    Operation {
        code: NativeErrorCode,
        message: String,
    },

    #[error("argument cannot cross the native boundary: {0}")]
    InvalidArgument(String),

    #[error("unparseable qpdf version string: {0}")]
    Version(String),
}

impl QpdfError {
    /// The native error class, if this error originated in the library.
    pub fn native_code(&self) -> Option<NativeErrorCode> {
        match self {
            Self::Operation { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<NativeError> for QpdfError {
    fn from(err: NativeError) -> Self {
        Self::Operation {
            code: err.code,
            message: err.message,
        }
    }
}
