use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{RagError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    /// 1-based position in the document.
    pub number: u32,
    pub text: String,
}

pub trait DocumentSource: Send + Sync {
    fn describe(&self) -> String;

    fn read_pages(&self) -> Result<Vec<Page>>;
}

#[derive(Clone, Debug)]
pub struct PdfDocument {
    path: PathBuf,
}

impl PdfDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_error(&self, message: impl Into<String>) -> RagError {
        RagError::DocumentRead {
            path: self.path.display().to_string(),
            message: message.into(),
        }
    }
}

impl DocumentSource for PdfDocument {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_pages(&self) -> Result<Vec<Page>> {
        info!(path = %self.path.display(), "reading document");
        let meta = fs::metadata(&self.path).map_err(|e| self.read_error(e.to_string()))?;
        if !meta.is_file() {
            return Err(self.read_error("not a regular file"));
        }

        // pdf-extract panics on some malformed inputs instead of returning an error.
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_by_pages(&self.path)
        }))
        .map_err(|_| self.read_error("PDF parser aborted on a malformed document"))?
        .map_err(|e| self.read_error(e.to_string()))?;

        let pages = number_pages(extracted);
        if pages.is_empty() {
            return Err(self.read_error("document has no pages"));
        }
        for page in pages.iter().filter(|p| p.text.trim().is_empty()) {
            warn!(page = page.number, "page has no extractable text");
        }
        debug!(pages = pages.len(), "document read");
        Ok(pages)
    }
}

fn number_pages(texts: Vec<String>) -> Vec<Page> {
    texts
        .into_iter()
        .enumerate()
        .map(|(idx, text)| Page {
            number: idx as u32 + 1,
            text,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_numbered_from_one() {
        let pages = number_pages(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[1].number, 2);
        assert_eq!(pages[1].text, "b");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let doc = PdfDocument::new("definitely/not/here.pdf");
        let err = doc.read_pages().unwrap_err();
        match err {
            RagError::DocumentRead { path, .. } => assert!(path.ends_with("here.pdf")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn directory_is_a_read_error() {
        let doc = PdfDocument::new(std::env::temp_dir());
        assert!(matches!(doc.read_pages(), Err(RagError::DocumentRead { .. })));
    }
}
