//! Static backend capability table and destination extension resolution.

use crate::error::{PackError, PackResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The closed set of container backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BackendKind {
    /// ZIP with AES-256 entry encryption.
    #[default]
    #[serde(rename = "ZIP")]
    Zip,
    /// 7z with AES-256 content and header encryption.
    #[serde(rename = "SEVEN_ZIP")]
    SevenZip,
    /// Reserved: encrypt an existing PDF in place through qpdf.
    #[serde(rename = "QPDF")]
    PdfRewrite,
    /// Attach the files to a template PDF, optionally encrypted through qpdf.
    #[serde(rename = "ITEXT7")]
    PdfAttachment,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Zip,
        BackendKind::SevenZip,
        BackendKind::PdfRewrite,
        BackendKind::PdfAttachment,
    ];

    /// Identifier used by the directory service.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Zip => "ZIP",
            Self::SevenZip => "SEVEN_ZIP",
            Self::PdfRewrite => "QPDF",
            Self::PdfAttachment => "ITEXT7",
        }
    }

    /// Short name used on the command line.
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::SevenZip => "7z",
            Self::PdfRewrite => "pdf-rewrite",
            Self::PdfAttachment => "pdf",
        }
    }

    pub fn is_implemented(self) -> bool {
        !matches!(self, Self::PdfRewrite)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for BackendKind {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|b| {
                b.wire_name().eq_ignore_ascii_case(wanted)
                    || b.short_name().eq_ignore_ascii_case(wanted)
            })
            .or(match wanted.to_ascii_lowercase().as_str() {
                "sevenzip" | "seven_zip" => Some(Self::SevenZip),
                "qpdf" => Some(Self::PdfRewrite),
                _ => None,
            })
            .ok_or_else(|| PackError::UnknownBackend(s.to_string()))
    }
}

/// Immutable description of one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCapability {
    pub backend: BackendKind,
    pub extension: &'static str,
    pub supports_encryption: bool,
}

static CAPABILITIES: [BackendCapability; 4] = [
    BackendCapability {
        backend: BackendKind::Zip,
        extension: "zip",
        supports_encryption: true,
    },
    BackendCapability {
        backend: BackendKind::SevenZip,
        extension: "7z",
        supports_encryption: true,
    },
    BackendCapability {
        backend: BackendKind::PdfRewrite,
        extension: "pdf",
        supports_encryption: true,
    },
    BackendCapability {
        backend: BackendKind::PdfAttachment,
        extension: "pdf",
        supports_encryption: true,
    },
];

/// All registered capabilities.
pub fn capabilities() -> &'static [BackendCapability] {
    &CAPABILITIES
}

pub fn capability_for(backend: BackendKind) -> PackResult<&'static BackendCapability> {
    CAPABILITIES
        .iter()
        .find(|c| c.backend == backend)
        .ok_or_else(|| PackError::UnknownBackend(backend.wire_name().to_string()))
}

pub fn extension_for(backend: BackendKind) -> PackResult<&'static str> {
    Ok(capability_for(backend)?.extension)
}

pub fn supports_encryption(backend: BackendKind) -> PackResult<bool> {
    Ok(capability_for(backend)?.supports_encryption)
}

/// Replaces the extension of `requested` with the one registered for
/// `backend`. Applying it twice yields the same path.
///
/// A path without a file name (`/`, `dir/..`) is rejected with
/// [`PackError::FileWrite`].
pub fn destination_with_resolved_extension(
    requested: &Path,
    backend: BackendKind,
) -> PackResult<PathBuf> {
    let extension = extension_for(backend)?;
    if requested.file_name().is_none() {
        return Err(PackError::file_write(
            requested,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "destination has no file name",
            ),
        ));
    }
    Ok(requested.with_extension(extension))
}
