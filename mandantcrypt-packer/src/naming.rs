//! Entry names inside a container and suggested destination names.

use crate::capability::{BackendKind, extension_for};
use crate::error::{PackError, PackResult};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A source file and the name it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub name: String,
}

/// Assigns each file its base name. Files sharing a base name are
/// disambiguated as `report (2).docx`, `report (3).docx`, ... in iteration
/// order; a generated name never takes a name another file owns.
pub fn entry_names<'a, I>(files: I) -> PackResult<Vec<SourceEntry>>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    let files: Vec<&PathBuf> = files.into_iter().collect();
    let bases = files
        .iter()
        .map(|p| base_name(p))
        .collect::<PackResult<Vec<String>>>()?;
    let reserved: HashSet<&str> = bases.iter().map(String::as_str).collect();

    let mut used: HashSet<String> = HashSet::with_capacity(bases.len());
    let mut entries = Vec::with_capacity(files.len());
    for (path, base) in files.into_iter().zip(&bases) {
        let name = if used.insert(base.clone()) {
            base.clone()
        } else {
            let mut n = 2;
            loop {
                let candidate = numbered(base, n);
                if !reserved.contains(candidate.as_str()) && used.insert(candidate.clone()) {
                    break candidate;
                }
                n += 1;
            }
        };
        entries.push(SourceEntry {
            path: path.clone(),
            name,
        });
    }
    Ok(entries)
}

fn base_name(path: &Path) -> PackResult<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            PackError::unreadable(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })
}

fn numbered(base: &str, n: usize) -> String {
    let path = Path::new(base);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => {
            format!("{} ({n}).{}", stem.to_string_lossy(), ext.to_string_lossy())
        }
        _ => format!("{base} ({n})"),
    }
}

/// `"{identity_name}_{yyyyMMdd}.{extension}"`, with characters that are not
/// valid in file names replaced by `_`.
pub fn suggested_file_name(
    identity_name: &str,
    date: NaiveDate,
    backend: BackendKind,
) -> PackResult<String> {
    let name: String = identity_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    Ok(format!(
        "{name}_{}.{}",
        date.format("%Y%m%d"),
        extension_for(backend)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_keeps_extension() {
        assert_eq!(numbered("report.docx", 2), "report (2).docx");
        assert_eq!(numbered("README", 3), "README (3)");
        assert_eq!(numbered("archive.tar.gz", 2), "archive.tar (2).gz");
    }

    #[test]
    fn root_path_has_no_base_name() {
        assert!(matches!(
            base_name(Path::new("/")),
            Err(PackError::SourceUnreadable { .. })
        ));
    }
}
