//! Safe wrapper around the qpdf C API.
//!
//! The shared library is loaded at runtime ([`QpdfLibrary`]) and driven
//! through a scoped [`NativeDocumentSession`] that owns exactly one native
//! context:
//!
//! ```text
//! Uninitialized --init_context--> Initialized --read_document--> ReadLoaded
//! ReadLoaded --init_write--> WriteReady --write--> ReadLoaded
//! any --close/drop--> Closed
//! ```
//!
//! Errors reported by the library are surfaced as [`QpdfError::Operation`]
//! carrying a [`NativeErrorCode`].

pub mod bindings;
pub mod error;
pub mod library;
pub mod session;

pub use bindings::{ContextHandle, ModifyLevel, ObjectStreamMode, PrintLevel, QpdfApi};
pub use error::{NativeError, NativeErrorCode, QpdfError, QpdfResult};
pub use library::{DEFAULT_LIBRARY_NAME, LIBRARY_PATH_ENV, QpdfLibrary, default_library_path};
pub use session::{
    EncryptionOptions, LibraryVersion, NativeDocumentSession, SessionState, WriteOptions,
};
