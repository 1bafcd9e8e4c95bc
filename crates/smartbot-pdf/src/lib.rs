//! PDF text extraction for smartbot
//!
//! Pure-Rust extraction via lopdf. Each uploaded document contributes the
//! concatenated text of its pages; a batch load concatenates every `.pdf`
//! file in a directory. Image-only pages have no text layer and contribute
//! an empty string rather than an error.

use std::path::Path;

use lopdf::Document;
use smartbot_types::PdfError;

/// Extract the text of every page of a single PDF file.
///
/// Fails with `PdfError::Malformed` when the file is not a well-formed PDF.
/// Pages without an extractable text layer (image-only scans) contribute
/// nothing.
pub fn extract_text(path: &Path) -> Result<String, PdfError> {
    let doc = Document::load(path).map_err(|e| PdfError::Malformed(e.to_string()))?;

    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        // A page whose content stream carries no text operators is not an
        // error; it simply adds nothing.
        if let Ok(page_text) = doc.extract_text(&[*page_number]) {
            text.push_str(&page_text);
        }
    }
    Ok(text)
}

/// Extract and concatenate text from all `.pdf` files in a directory.
///
/// The suffix match is case-sensitive (`report.PDF` is ignored). File names
/// are sorted before extraction so the combined context is deterministic
/// regardless of directory listing order. A file that fails to parse is
/// skipped with a warning and the rest of the batch continues.
pub fn extract_all(folder: &Path) -> Result<String, PdfError> {
    let entries = std::fs::read_dir(folder).map_err(|e| PdfError::Io {
        path: folder.display().to_string(),
        source: e,
    })?;

    let mut pdf_paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(".pdf"))
                .unwrap_or(false)
        })
        .collect();
    pdf_paths.sort();

    let mut combined = String::new();
    for path in &pdf_paths {
        match extract_text(path) {
            Ok(text) => combined.push_str(&text),
            Err(e) => {
                eprintln!("Skipping {}: {}", path.display(), e);
            }
        }
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Build a minimal single-page PDF containing `text` and save it.
    fn write_test_pdf(dir: &Path, name: &str, text: &str) -> PathBuf {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let path = dir.join(name);
        doc.save(&path).unwrap();
        path
    }

    #[test]
    fn test_extract_text_single_pdf() {
        let dir = TempDir::new().unwrap();
        let path = write_test_pdf(dir.path(), "doc.pdf", "Alpha Beta");

        let text = extract_text(&path).unwrap();
        assert!(text.contains("Alpha Beta"));
    }

    #[test]
    fn test_extract_text_rejects_non_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let err = extract_text(&path).unwrap_err();
        assert!(matches!(err, PdfError::Malformed(_)));
    }

    #[test]
    fn test_extract_all_matches_per_file_extraction_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        // Written out of order on purpose; extraction must sort by name.
        let b = write_test_pdf(dir.path(), "b.pdf", "second");
        let a = write_test_pdf(dir.path(), "a.pdf", "first");

        let combined = extract_all(dir.path()).unwrap();
        let expected = format!("{}{}", extract_text(&a).unwrap(), extract_text(&b).unwrap());
        assert_eq!(combined, expected);

        let first_pos = combined.find("first").unwrap();
        let second_pos = combined.find("second").unwrap();
        assert!(first_pos < second_pos);
    }

    #[test]
    fn test_extract_all_is_case_sensitive_about_suffix() {
        let dir = TempDir::new().unwrap();
        write_test_pdf(dir.path(), "kept.pdf", "kept");
        write_test_pdf(dir.path(), "ignored.PDF", "ignored");

        let combined = extract_all(dir.path()).unwrap();
        assert!(combined.contains("kept"));
        assert!(!combined.contains("ignored"));
    }

    #[test]
    fn test_extract_all_skips_malformed_and_continues() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.pdf"), b"garbage").unwrap();
        write_test_pdf(dir.path(), "good.pdf", "survivor");

        let combined = extract_all(dir.path()).unwrap();
        assert!(combined.contains("survivor"));
    }
}
