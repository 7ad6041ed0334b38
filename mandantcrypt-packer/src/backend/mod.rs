//! Container backends.
//!
//! [`ArchiveBackend`] is a closed set: adding a backend is an exhaustiveness
//! change in [`ArchiveBackend::produce`].

mod pdf_attachment;
mod sevenz_archive;
mod zip_archive;

pub use pdf_attachment::PdfAttachmentBackend;

use crate::capability::BackendKind;
use crate::error::{PackError, PackResult};
use crate::naming::SourceEntry;
use std::path::Path;
use tracing::{info, warn};

/// Everything a backend needs to produce one container.
#[derive(Debug)]
pub struct PackJob<'a> {
    pub entries: &'a [SourceEntry],
    /// Final path, extension already resolved.
    pub destination: &'a Path,
    /// `None` means unencrypted output was explicitly allowed.
    pub password: Option<&'a str>,
    pub overwrite: bool,
}

/// A configured backend.
#[derive(Debug, Clone)]
pub enum ArchiveBackend {
    Zip,
    SevenZip,
    PdfAttachment(PdfAttachmentBackend),
    PdfRewrite,
}

impl ArchiveBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Zip => BackendKind::Zip,
            Self::SevenZip => BackendKind::SevenZip,
            Self::PdfAttachment(_) => BackendKind::PdfAttachment,
            Self::PdfRewrite => BackendKind::PdfRewrite,
        }
    }

    /// Writes the container described by `job`.
    ///
    /// An existing destination is replaced when `job.overwrite` is set and
    /// rejected otherwise. If writing fails after the destination was
    /// created, the partial file is removed before the error is returned.
    pub fn produce(&self, job: &PackJob<'_>) -> PackResult<()> {
        if job.password.is_none() {
            warn!(
                "no password supplied, {} will be unencrypted",
                job.destination.display()
            );
        }
        match self {
            Self::Zip => zip_archive::produce(job),
            Self::SevenZip => sevenz_archive::produce(job),
            Self::PdfAttachment(backend) => backend.produce(job),
            Self::PdfRewrite => Err(PackError::BackendNotImplemented(BackendKind::PdfRewrite)),
        }
    }
}

/// Applies the overwrite policy to the destination.
pub(crate) fn prepare_destination(job: &PackJob<'_>) -> PackResult<()> {
    let dest = job.destination;
    match std::fs::symlink_metadata(dest) {
        Ok(_) if job.overwrite => {
            std::fs::remove_file(dest).map_err(|e| PackError::file_write(dest, e))?;
            info!("existing file was deleted: {}", dest.display());
            Ok(())
        }
        Ok(_) => Err(PackError::file_write(
            dest,
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "destination exists and overwrite is disabled",
            ),
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PackError::file_write(dest, e)),
    }
}

/// Runs `write`; on failure removes whatever it left at `dest`.
pub(crate) fn remove_on_failure<T>(
    dest: &Path,
    write: impl FnOnce() -> PackResult<T>,
) -> PackResult<T> {
    let result = write();
    if result.is_err() && dest.exists() {
        match std::fs::remove_file(dest) {
            Ok(()) => info!("removed partially written {}", dest.display()),
            Err(e) => warn!("could not remove partial {}: {e}", dest.display()),
        }
    }
    result
}

pub(crate) fn open_source(entry: &SourceEntry) -> PackResult<std::fs::File> {
    std::fs::File::open(&entry.path).map_err(|e| PackError::unreadable(&entry.path, e))
}
