//! PDF document handling on top of `lopdf`: the bundled template, the
//! embedded-file name tree, and reading attachment names back.

use crate::capability::BackendKind;
use crate::error::{PackError, PackResult};
use crate::naming::SourceEntry;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use std::path::Path;
use tracing::debug;

const MAX_TREE_DEPTH: usize = 32;

fn pdf_error(err: impl std::fmt::Display) -> PackError {
    PackError::backend(BackendKind::PdfAttachment, err)
}

/// Loads `path` when it names an existing file, otherwise builds the
/// bundled template.
pub fn load_template(path: Option<&Path>) -> PackResult<Document> {
    match path {
        Some(p) if p.is_file() => {
            debug!("using template document {}", p.display());
            Document::load(p).map_err(pdf_error)
        }
        Some(p) => {
            debug!("template {} not found, using built-in template", p.display());
            builtin_template()
        }
        None => builtin_template(),
    }
}

/// A single A4 page telling the reader where the content is.
pub fn builtin_template() -> PackResult<Document> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let lines: [(i64, i64, &str); 3] = [
        (20, 770, "MandantCrypt"),
        (11, 740, "This document carries its content as file attachments."),
        (11, 724, "Open the attachments panel of your PDF viewer to access the files."),
    ];
    let mut operations = Vec::new();
    for (size, y, text) in lines {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), size.into()]),
            Operation::new("Td", vec![56.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
    }
    let content = Content { operations }.encode().map_err(pdf_error)?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}

/// Embeds every entry under its name and points the catalog's
/// `/EmbeddedFiles` name tree at them. Attachments already present in the
/// template are replaced.
pub fn attach_files(doc: &mut Document, entries: &[SourceEntry]) -> PackResult<()> {
    if entries.is_empty() {
        return Ok(());
    }

    let mut named: Vec<(Vec<u8>, ObjectId)> = Vec::with_capacity(entries.len());
    for entry in entries {
        let data = std::fs::read(&entry.path).map_err(|e| PackError::unreadable(&entry.path, e))?;
        let size = data.len() as i64;
        let file_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "EmbeddedFile",
                "Params" => dictionary! { "Size" => size },
            },
            data,
        ));
        let key = encode_text_string(&entry.name);
        let spec_id = doc.add_object(dictionary! {
            "Type" => "Filespec",
            "F" => Object::String(ascii_fallback(&entry.name), StringFormat::Literal),
            "UF" => Object::String(key.clone(), StringFormat::Literal),
            "EF" => dictionary! { "F" => file_id, "UF" => file_id },
        });
        debug!("attached {} as {}", entry.path.display(), entry.name);
        named.push((key, spec_id));
    }

    // Name tree keys must be sorted bytewise.
    named.sort_by(|a, b| a.0.cmp(&b.0));
    let names: Vec<Object> = named
        .into_iter()
        .flat_map(|(key, id)| [Object::String(key, StringFormat::Literal), Object::Reference(id)])
        .collect();
    let tree_id = doc.add_object(dictionary! { "Names" => names });

    let root = root_id(doc)?;
    let existing = catalog(doc, root)?.get(b"Names").ok().cloned();
    match existing {
        Some(Object::Reference(names_id)) => {
            doc.get_object_mut(names_id)
                .and_then(Object::as_dict_mut)
                .map_err(pdf_error)?
                .set("EmbeddedFiles", tree_id);
        }
        Some(Object::Dictionary(mut names_dict)) => {
            names_dict.set("EmbeddedFiles", tree_id);
            catalog_mut(doc, root)?.set("Names", names_dict);
        }
        _ => {
            catalog_mut(doc, root)?.set("Names", dictionary! { "EmbeddedFiles" => tree_id });
        }
    }
    catalog_mut(doc, root)?.set("PageMode", "UseAttachments");
    Ok(())
}

/// Names of all files in the document's `/EmbeddedFiles` name tree, in tree
/// order.
pub fn embedded_file_names(doc: &Document) -> PackResult<Vec<String>> {
    let root = catalog(doc, root_id(doc)?)?;
    let Ok(names) = root.get(b"Names") else {
        return Ok(Vec::new());
    };
    let names = resolve(doc, names)?.as_dict().map_err(pdf_error)?;
    let Ok(tree) = names.get(b"EmbeddedFiles") else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    collect_names(doc, resolve(doc, tree)?, 0, &mut out)?;
    Ok(out)
}

fn collect_names(doc: &Document, node: &Object, depth: usize, out: &mut Vec<String>) -> PackResult<()> {
    if depth > MAX_TREE_DEPTH {
        return Err(pdf_error("embedded file name tree is too deep"));
    }
    let node = node.as_dict().map_err(pdf_error)?;
    if let Ok(names) = node.get(b"Names") {
        let names = resolve(doc, names)?.as_array().map_err(pdf_error)?;
        for key in names.iter().step_by(2) {
            if let Object::String(bytes, _) = resolve(doc, key)? {
                out.push(decode_text_string(bytes));
            }
        }
    }
    if let Ok(kids) = node.get(b"Kids") {
        for kid in resolve(doc, kids)?.as_array().map_err(pdf_error)? {
            collect_names(doc, resolve(doc, kid)?, depth + 1, out)?;
        }
    }
    Ok(())
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> PackResult<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).map_err(pdf_error),
        other => Ok(other),
    }
}

fn root_id(doc: &Document) -> PackResult<ObjectId> {
    doc.trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(pdf_error)
}

fn catalog(doc: &Document, root: ObjectId) -> PackResult<&lopdf::Dictionary> {
    doc.get_object(root)
        .and_then(Object::as_dict)
        .map_err(pdf_error)
}

fn catalog_mut(doc: &mut Document, root: ObjectId) -> PackResult<&mut lopdf::Dictionary> {
    doc.get_object_mut(root)
        .and_then(Object::as_dict_mut)
        .map_err(pdf_error)
}

/// PDFDocEncoding for ASCII, UTF-16BE with byte order mark otherwise.
fn encode_text_string(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        _ => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

fn ascii_fallback(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_strings_survive_encoding() {
        for name in ["report.docx", "Übersicht 2024.xlsx", "日本.txt"] {
            assert_eq!(decode_text_string(&encode_text_string(name)), name);
        }
    }

    #[test]
    fn ascii_names_stay_plain() {
        assert_eq!(encode_text_string("a.txt"), b"a.txt".to_vec());
    }

    #[test]
    fn fallback_replaces_non_ascii() {
        assert_eq!(ascii_fallback("Ärger.pdf"), b"_rger.pdf".to_vec());
    }

    #[test]
    fn builtin_template_has_one_page_and_no_attachments() {
        let doc = builtin_template().unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert!(embedded_file_names(&doc).unwrap().is_empty());
    }
}
