//! Opens a produced container again and lists what is inside.

use crate::capability::BackendKind;
use crate::error::{PackError, PackResult};
use crate::pdf;
use mandantcrypt_qpdf::{NativeDocumentSession, NativeErrorCode, QpdfError, WriteOptions};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What [`verify_container`] found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedContainer {
    pub path: PathBuf,
    pub backend: BackendKind,
    pub entries: Vec<String>,
    pub encrypted: bool,
}

/// Reads every entry of the container at `path` with `password`.
///
/// Fails with [`PackError::PasswordRequired`] when the container is
/// encrypted and no password was given, and with
/// [`PackError::WrongPassword`] when the password does not open it.
/// `native_library` is only loaded for encrypted PDFs.
pub fn verify_container(
    path: &Path,
    backend: BackendKind,
    password: Option<&str>,
    native_library: &Path,
) -> PackResult<VerifiedContainer> {
    let password = password.filter(|p| !p.is_empty());
    let (entries, encrypted) = match backend {
        BackendKind::Zip => verify_zip(path, password)?,
        BackendKind::SevenZip => verify_sevenz(path, password)?,
        BackendKind::PdfAttachment => verify_pdf(path, password, native_library)?,
        BackendKind::PdfRewrite => return Err(PackError::BackendNotImplemented(backend)),
    };
    debug!("verified {} with {} entries", path.display(), entries.len());
    Ok(VerifiedContainer {
        path: path.to_path_buf(),
        backend,
        entries,
        encrypted,
    })
}

fn open(path: &Path) -> PackResult<File> {
    File::open(path).map_err(|e| PackError::unreadable(path, e))
}

fn verify_zip(path: &Path, password: Option<&str>) -> PackResult<(Vec<String>, bool)> {
    let failed = |e: zip::result::ZipError| PackError::backend(BackendKind::Zip, e);
    let mut archive = zip::ZipArchive::new(open(path)?).map_err(failed)?;

    let mut names = Vec::with_capacity(archive.len());
    let mut encrypted = false;
    for index in 0..archive.len() {
        let opened = match password {
            Some(pw) => archive.by_index_decrypt(index, pw.as_bytes()),
            None => archive.by_index(index),
        };
        let mut entry = match opened {
            Ok(entry) => entry,
            Err(zip::result::ZipError::InvalidPassword) => {
                return Err(PackError::WrongPassword(path.to_path_buf()));
            }
            Err(zip::result::ZipError::UnsupportedArchive(_)) if password.is_none() => {
                return Err(PackError::PasswordRequired);
            }
            Err(e) => return Err(failed(e)),
        };
        encrypted |= entry.encrypted();
        // Reading to the end checks the authentication code.
        io::copy(&mut entry, &mut io::sink()).map_err(|e| PackError::backend(BackendKind::Zip, e))?;
        names.push(entry.name().to_string());
    }
    Ok((names, encrypted))
}

fn verify_sevenz(path: &Path, password: Option<&str>) -> PackResult<(Vec<String>, bool)> {
    let pw = sevenz_rust::Password::from(password.unwrap_or(""));
    let classify = |e: sevenz_rust::Error| -> PackError {
        match e {
            sevenz_rust::Error::PasswordRequired | sevenz_rust::Error::MaybeBadPassword(_) => {
                match password {
                    None => PackError::PasswordRequired,
                    Some(_) => PackError::WrongPassword(path.to_path_buf()),
                }
            }
            other => PackError::backend(BackendKind::SevenZip, other),
        }
    };

    let mut reader = sevenz_rust::SevenZReader::open(path, pw).map_err(classify)?;
    let mut names = Vec::new();
    reader
        .for_each_entries(|entry, data| {
            io::copy(data, &mut io::sink())?;
            if !entry.is_directory {
                names.push(entry.name.clone());
            }
            Ok(true)
        })
        .map_err(classify)?;
    Ok((names, password.is_some()))
}

fn verify_pdf(
    path: &Path,
    password: Option<&str>,
    native_library: &Path,
) -> PackResult<(Vec<String>, bool)> {
    let failed = |e: lopdf::Error| PackError::backend(BackendKind::PdfAttachment, e);

    let Some(password) = password else {
        let doc = lopdf::Document::load(path).map_err(failed)?;
        if doc.is_encrypted() {
            return Err(PackError::PasswordRequired);
        }
        return Ok((pdf::embedded_file_names(&doc)?, false));
    };

    let mut data = Vec::new();
    open(path)?
        .read_to_end(&mut data)
        .map_err(|e| PackError::unreadable(path, e))?;

    let mut session = NativeDocumentSession::open(native_library)?;
    let decrypted = decrypt(&mut session, path, data, password);
    session.close();
    let (plain, encrypted) = decrypted.map_err(|e| match e.native_code() {
        Some(NativeErrorCode::WrongPassword) => PackError::WrongPassword(path.to_path_buf()),
        _ => PackError::from(e),
    })?;

    let doc = lopdf::Document::load_mem(&plain).map_err(failed)?;
    Ok((pdf::embedded_file_names(&doc)?, encrypted))
}

fn decrypt(
    session: &mut NativeDocumentSession,
    path: &Path,
    data: Vec<u8>,
    password: &str,
) -> Result<(Vec<u8>, bool), QpdfError> {
    session.init_context()?;
    session.read_document_bytes(&path.display().to_string(), data, Some(password))?;
    let encrypted = session.is_encrypted()?;
    session.init_write_memory()?;
    session.set_preserve_encryption(false)?;
    session.write(WriteOptions::uncompressed())?;
    Ok((session.written_bytes()?, encrypted))
}
