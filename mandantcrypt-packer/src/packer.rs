//! The packaging policy: owns one request and turns it into one container.

use crate::backend::{ArchiveBackend, PackJob, PdfAttachmentBackend};
use crate::capability::{BackendKind, destination_with_resolved_extension, supports_encryption};
use crate::error::{PackError, PackResult};
use crate::naming::entry_names;
use mandantcrypt_qpdf::default_library_path;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Result of a successful [`Packer::pack`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackOutcome {
    pub path: PathBuf,
    pub backend: BackendKind,
    pub entries: usize,
    pub encrypted: bool,
}

/// Collects files and settings for one container.
///
/// Configuration happens through `&mut self`; [`pack`](Self::pack) consumes
/// the packer, so a request is packed at most once and cannot change while
/// packing.
#[derive(Debug, Clone)]
pub struct Packer {
    files: BTreeSet<PathBuf>,
    destination: Option<PathBuf>,
    backend: BackendKind,
    overwrite: bool,
    allow_unencrypted: bool,
    template_document: Option<PathBuf>,
    native_library: PathBuf,
    max_input_bytes: Option<u64>,
}

impl Default for Packer {
    fn default() -> Self {
        Self {
            files: BTreeSet::new(),
            destination: None,
            backend: BackendKind::default(),
            overwrite: true,
            allow_unencrypted: false,
            template_document: None,
            native_library: default_library_path(),
            max_input_bytes: None,
        }
    }
}

impl Packer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds files with set semantics. Relative paths are made absolute
    /// against the current directory and `.`/`..` are folded, so two
    /// spellings of one path count once.
    pub fn add_files<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            let path = path.as_ref();
            if path.as_os_str().is_empty() {
                warn!("ignoring empty source path");
                continue;
            }
            let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
            self.files.insert(lexically_normalized(&path));
        }
        debug!("file list is now {:?}", self.files);
    }

    pub fn add_file(&mut self, path: impl AsRef<Path>) {
        self.add_files([path]);
    }

    pub fn files(&self) -> impl ExactSizeIterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    pub fn set_backend(&mut self, backend: BackendKind) {
        self.backend = backend;
        info!("backend set to {backend}");
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn set_destination(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!("destination set to {}", path.display());
        self.destination = Some(path);
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    /// The destination with the backend's extension, i.e. the path
    /// [`pack`](Self::pack) will write.
    pub fn resolved_destination(&self) -> PackResult<PathBuf> {
        let requested = self.destination.as_deref().ok_or(PackError::DestinationMissing)?;
        destination_with_resolved_extension(requested, self.backend)
    }

    /// Whether the resolved destination already exists.
    pub fn destination_exists(&self) -> bool {
        self.resolved_destination().is_ok_and(|p| p.exists())
    }

    pub fn set_overwrite(&mut self, overwrite: bool) {
        self.overwrite = overwrite;
        info!("overwrite set to {overwrite}");
    }

    pub fn set_allow_unencrypted_output(&mut self, allow: bool) {
        self.allow_unencrypted = allow;
        warn!("allow unencrypted output set to {allow}");
    }

    pub fn set_template_document(&mut self, path: impl Into<PathBuf>) {
        self.template_document = Some(path.into());
    }

    pub fn set_native_library(&mut self, path: impl Into<PathBuf>) {
        self.native_library = path.into();
    }

    /// Limits the combined size of all source files.
    pub fn set_max_input_bytes(&mut self, limit: Option<u64>) {
        self.max_input_bytes = limit;
    }

    /// Combined size of the source files.
    pub fn input_size(&self) -> PackResult<u64> {
        let mut total = 0u64;
        for path in &self.files {
            let meta = std::fs::metadata(path).map_err(|e| PackError::unreadable(path, e))?;
            if !meta.is_file() {
                return Err(PackError::unreadable(
                    path,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
                ));
            }
            total = total.saturating_add(meta.len());
        }
        Ok(total)
    }

    fn archive_backend(&self) -> ArchiveBackend {
        match self.backend {
            BackendKind::Zip => ArchiveBackend::Zip,
            BackendKind::SevenZip => ArchiveBackend::SevenZip,
            BackendKind::PdfAttachment => ArchiveBackend::PdfAttachment(PdfAttachmentBackend::new(
                self.template_document.clone(),
                self.native_library.clone(),
            )),
            BackendKind::PdfRewrite => ArchiveBackend::PdfRewrite,
        }
    }

    /// Packs the files into the destination.
    ///
    /// An empty or absent password is rejected with
    /// [`PackError::PasswordRequired`] before anything else happens, unless
    /// unencrypted output was explicitly allowed.
    pub fn pack(self, password: Option<&str>) -> PackResult<PackOutcome> {
        let password = password.filter(|p| !p.is_empty());
        if password.is_none() && !self.allow_unencrypted {
            error!("no password was specified");
            return Err(PackError::PasswordRequired);
        }
        if password.is_some() && !supports_encryption(self.backend)? {
            return Err(PackError::EncryptionUnsupported(self.backend));
        }
        if !self.backend.is_implemented() {
            error!("backend {} is not implemented", self.backend);
            return Err(PackError::BackendNotImplemented(self.backend));
        }

        let destination = self.resolved_destination()?;
        let total = self.input_size()?;
        if let Some(limit) = self.max_input_bytes {
            if total > limit {
                error!("input of {total} bytes exceeds limit of {limit}");
                return Err(PackError::InputTooLarge { total, limit });
            }
        }

        let entries = entry_names(&self.files)?;
        info!(
            "packing {} file(s) ({total} bytes) into {} with {}",
            entries.len(),
            destination.display(),
            self.backend
        );

        let job = PackJob {
            entries: &entries,
            destination: &destination,
            password,
            overwrite: self.overwrite,
        };
        if let Err(err) = self.archive_backend().produce(&job) {
            error!("packing into {} failed: {err}", destination.display());
            return Err(err);
        }

        info!("successfully packed files into {}", destination.display());
        Ok(PackOutcome {
            path: destination,
            backend: self.backend,
            entries: entries.len(),
            encrypted: password.is_some(),
        })
    }
}

/// Folds `.` and `..` without touching the file system.
fn lexically_normalized(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_folds_dot_segments() {
        assert_eq!(
            lexically_normalized(Path::new("/data/in/../out/./a.txt")),
            PathBuf::from("/data/out/a.txt")
        );
    }

    #[test]
    fn normalization_stops_at_root() {
        assert_eq!(
            lexically_normalized(Path::new("/../../a.txt")),
            PathBuf::from("/a.txt")
        );
    }

    #[test]
    fn leading_parent_segments_of_relative_paths_are_kept() {
        assert_eq!(
            lexically_normalized(Path::new("../x/../a.txt")),
            PathBuf::from("../a.txt")
        );
    }
}
