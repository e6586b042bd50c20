//! Plain-text document loading.

use std::path::Path;

use docportal_analysis::Document;
use tracing::info;

/// Read a UTF-8 text file into a page-split [`Document`].
pub fn load_document(path: &Path) -> Result<Document, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;

    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let document = Document::from_text(source, &text);
    info!(
        source = %document.source,
        pages = document.page_count(),
        chars = text.chars().count(),
        "Document loaded"
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_pages_and_file_name() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("report.txt");
        std::fs::write(&path, "first\x0csecond").unwrap();

        let document = load_document(&path).unwrap();
        assert_eq!(document.source, "report.txt");
        assert_eq!(document.page_count(), 2);
    }

    #[test]
    fn missing_file_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_document(&tmp.path().join("absent.txt")).unwrap_err();
        assert!(err.to_string().contains("absent.txt"));
    }
}
