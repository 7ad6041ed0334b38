//! Encrypted container packaging for MandantCrypt.
//!
//! A [`Packer`] collects source files, a destination and a backend, then
//! [`Packer::pack`] writes one container:
//!
//! - ZIP with AES-256 entry encryption
//! - 7z with AES-256 content and header encryption
//! - a PDF carrying the files as attachments, encrypted with AES-256
//!   through the native qpdf library
//!
//! Output is always encrypted unless unencrypted output was explicitly
//! allowed and no password was given.

pub mod backend;
pub mod capability;
pub mod error;
pub mod naming;
pub mod packer;
pub mod pdf;
pub mod verify;

pub use backend::{ArchiveBackend, PackJob, PdfAttachmentBackend};
pub use capability::{
    BackendCapability, BackendKind, capabilities, capability_for,
    destination_with_resolved_extension, extension_for, supports_encryption,
};
pub use error::{PackError, PackResult};
pub use naming::{SourceEntry, entry_names, suggested_file_name};
pub use packer::{PackOutcome, Packer};
pub use verify::{VerifiedContainer, verify_container};
