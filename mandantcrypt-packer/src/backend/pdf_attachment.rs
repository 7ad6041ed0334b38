use super::{PackJob, prepare_destination, remove_on_failure};
use crate::capability::BackendKind;
use crate::error::{PackError, PackResult};
use crate::pdf;
use lopdf::Document;
use mandantcrypt_qpdf::{
    NativeDocumentSession, QpdfApi, QpdfError, QpdfLibrary, QpdfResult, WriteOptions,
    default_library_path,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Attaches the source files to a template PDF. With a password the result
/// is re-written through qpdf with AES-256 encryption, identical user and
/// owner password and no print/modify/extract permissions.
#[derive(Debug, Clone)]
pub struct PdfAttachmentBackend {
    template: Option<PathBuf>,
    native_library: PathBuf,
}

impl Default for PdfAttachmentBackend {
    fn default() -> Self {
        Self {
            template: None,
            native_library: default_library_path(),
        }
    }
}

impl PdfAttachmentBackend {
    pub fn new(template: Option<PathBuf>, native_library: PathBuf) -> Self {
        Self {
            template,
            native_library,
        }
    }

    pub fn template(&self) -> Option<&Path> {
        self.template.as_deref()
    }

    pub fn native_library(&self) -> &Path {
        &self.native_library
    }

    pub(super) fn produce(&self, job: &PackJob<'_>) -> PackResult<()> {
        // Nothing is written unless the encryption step can run.
        let library = match job.password {
            Some(_) => Some(QpdfLibrary::load(&self.native_library)?),
            None => None,
        };
        self.produce_with(job, library)
    }

    /// `library` must be present whenever the job carries a password.
    fn produce_with<L: QpdfApi>(&self, job: &PackJob<'_>, library: Option<L>) -> PackResult<()> {
        if job.password.is_some() && library.is_none() {
            return Err(PackError::EncryptionUnsupported(BackendKind::PdfAttachment));
        }

        let mut doc = pdf::load_template(self.template.as_deref())?;
        pdf::attach_files(&mut doc, job.entries)?;

        prepare_destination(job)?;
        remove_on_failure(job.destination, || match (library, job.password) {
            (Some(library), Some(password)) => {
                write_encrypted(library, doc, job.destination, password)
            }
            _ => write_plain(doc, job.destination),
        })?;
        info!(
            "attached {} file(s) to {}",
            job.entries.len(),
            job.destination.display()
        );
        Ok(())
    }
}

fn write_plain(mut doc: Document, dest: &Path) -> PackResult<()> {
    doc.compress();
    doc.save(dest)
        .map_err(|e| PackError::backend(BackendKind::PdfAttachment, e))?;
    Ok(())
}

fn write_encrypted<L: QpdfApi>(
    library: L,
    mut doc: Document,
    dest: &Path,
    password: &str,
) -> PackResult<()> {
    let mut staged = Vec::new();
    doc.compress();
    doc.save_to(&mut staged)
        .map_err(|e| PackError::backend(BackendKind::PdfAttachment, e))?;
    debug!("staged {} bytes for encryption", staged.len());

    let mut session = NativeDocumentSession::with_library(library);
    let result = encrypt_staged(&mut session, staged, dest, password);
    session.close();
    result.map_err(|e| native_failure(&e))
}

fn encrypt_staged<L: QpdfApi>(
    session: &mut NativeDocumentSession<L>,
    staged: Vec<u8>,
    dest: &Path,
    password: &str,
) -> QpdfResult<()> {
    session.init_context()?;
    session.read_document_bytes("attachment container", staged, None)?;
    session.init_write(dest)?;
    session.set_restrictive_encryption(password)?;
    session.write(WriteOptions::default())?;
    info!("applied AES-256 encryption to {}", dest.display());
    Ok(())
}

fn native_failure(err: &QpdfError) -> PackError {
    PackError::BackendFailure {
        backend: BackendKind::PdfAttachment,
        message: err.to_string(),
        native_code: err.native_code(),
    }
}
