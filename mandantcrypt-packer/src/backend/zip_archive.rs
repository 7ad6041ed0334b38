use super::{PackJob, open_source, prepare_destination, remove_on_failure};
use crate::capability::BackendKind;
use crate::error::{PackError, PackResult};
use std::fs::File;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{AesMode, CompressionMethod, ZipWriter};

// ZIP AES protects entry data only; names stay readable in the central directory.
pub(super) fn produce(job: &PackJob<'_>) -> PackResult<()> {
    prepare_destination(job)?;
    remove_on_failure(job.destination, || write(job))?;
    info!("packed {} file(s) into {}", job.entries.len(), job.destination.display());
    Ok(())
}

fn write(job: &PackJob<'_>) -> PackResult<()> {
    let file = File::create(job.destination).map_err(|e| PackError::file_write(job.destination, e))?;
    let mut writer = ZipWriter::new(file);

    let base = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let options = match job.password {
        Some(password) => {
            info!("enabled ZIP AES-256 encryption");
            base.with_aes_encryption(AesMode::Aes256, password)
        }
        None => base,
    };

    for entry in job.entries {
        let mut source = open_source(entry)?;
        writer
            .start_file(entry.name.as_str(), options.clone())
            .map_err(|e| PackError::backend(BackendKind::Zip, e))?;
        std::io::copy(&mut source, &mut writer)
            .map_err(|e| PackError::backend(BackendKind::Zip, e))?;
        debug!("added {} as {}", entry.path.display(), entry.name);
    }

    writer
        .finish()
        .map_err(|e| PackError::backend(BackendKind::Zip, e))?;
    Ok(())
}
