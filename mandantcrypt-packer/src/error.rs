//! Packaging error types.

use crate::capability::BackendKind;
use mandantcrypt_qpdf::{NativeErrorCode, QpdfError};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for packaging operations.
pub type PackResult<T> = Result<T, PackError>;

/// Errors returned by the packer, its backends and container verification.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("a password is required because only encrypted output is allowed")]
    PasswordRequired,

    #[error("backend {0} is not implemented")]
    BackendNotImplemented(BackendKind),

    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    #[error("backend {0} cannot encrypt its output")]
    EncryptionUnsupported(BackendKind),

    #[error("could not load native library from {path}: {reason}")]
    NativeLibraryLoad { path: PathBuf, reason: String },

    #[error("native {code} error: {message}")]
    NativeOperation {
        code: NativeErrorCode,
        message: String,
    },

    #[error("{backend} backend failed: {message}")]
    BackendFailure {
        backend: BackendKind,
        message: String,
        native_code: Option<NativeErrorCode>,
    },

    #[error("could not write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no destination has been set")]
    DestinationMissing,

    #[error("input files total {total} bytes, limit is {limit}")]
    InputTooLarge { total: u64, limit: u64 },

    #[error("cannot read source file {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("wrong password for {0}")]
    WrongPassword(PathBuf),
}

impl PackError {
    pub(crate) fn backend(backend: BackendKind, err: impl std::fmt::Display) -> Self {
        Self::BackendFailure {
            backend,
            message: err.to_string(),
            native_code: None,
        }
    }

    pub(crate) fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            source,
        }
    }

    /// The caller can recover by supplying a (different) password.
    pub fn is_caller_recoverable(&self) -> bool {
        match self {
            Self::PasswordRequired | Self::WrongPassword(_) => true,
            Self::NativeOperation { code, .. } => code.is_caller_recoverable(),
            Self::BackendFailure {
                native_code: Some(code),
                ..
            } => code.is_caller_recoverable(),
            _ => false,
        }
    }

    /// The native error class, if the failure originated in the native library.
    pub fn native_code(&self) -> Option<NativeErrorCode> {
        match self {
            Self::NativeOperation { code, .. } => Some(*code),
            Self::BackendFailure { native_code, .. } => *native_code,
            _ => None,
        }
    }
}

impl From<QpdfError> for PackError {
    fn from(err: QpdfError) -> Self {
        match err {
            QpdfError::LibraryLoad { path, reason } => Self::NativeLibraryLoad { path, reason },
            QpdfError::Operation { code, message } => Self::NativeOperation { code, message },
            other => Self::backend(BackendKind::PdfAttachment, other),
        }
    }
}
