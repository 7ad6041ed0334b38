use super::{PackJob, open_source, prepare_destination, remove_on_failure};
use crate::capability::BackendKind;
use crate::error::{PackError, PackResult};
use sevenz_rust::{AesEncoderOptions, Password, SevenZArchiveEntry, SevenZMethod, SevenZWriter};
use tracing::{debug, info};

pub(super) fn produce(job: &PackJob<'_>) -> PackResult<()> {
    prepare_destination(job)?;
    remove_on_failure(job.destination, || write(job))?;
    info!("packed {} file(s) into {}", job.entries.len(), job.destination.display());
    Ok(())
}

fn write(job: &PackJob<'_>) -> PackResult<()> {
    let failed = |e: sevenz_rust::Error| PackError::backend(BackendKind::SevenZip, e);

    let mut writer = SevenZWriter::create(job.destination).map_err(failed)?;
    if let Some(password) = job.password {
        writer.set_content_methods(vec![
            AesEncoderOptions::new(Password::from(password)).into(),
            SevenZMethod::LZMA2.into(),
        ]);
        writer.set_encrypt_header(true);
        info!("enabled 7z AES-256 encryption with encrypted headers");
    }

    for entry in job.entries {
        let source = open_source(entry)?;
        let archive_entry = SevenZArchiveEntry::from_path(&entry.path, entry.name.clone());
        writer
            .push_archive_entry(archive_entry, Some(source))
            .map_err(failed)?;
        debug!("added {} as {}", entry.path.display(), entry.name);
    }

    writer
        .finish()
        .map_err(|e| PackError::backend(BackendKind::SevenZip, e))?;
    Ok(())
}
