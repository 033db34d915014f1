//! Thin wrapper over PDF text extraction.
//!
//! The reader is an external collaborator from the pipeline's point of view:
//! it turns a document path into ordered pages of raw text and nothing else.
//! Any failure to open or parse the document is fatal.

use std::path::Path;

use tracing::info;

use crate::types::{IngestError, Result};

/// A single page of extracted document text, 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: u32,
    pub text: String,
}

impl Page {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Reads `path` and returns one [`Page`] per PDF page with extractable text.
///
/// Pages whose text is empty or whitespace-only are dropped; the surviving
/// pages keep their original 1-based page numbers, so numbering may have
/// gaps.
pub fn read_pages(path: &Path) -> Result<Vec<Page>> {
    let raw = pdf_extract::extract_text_by_pages(path)
        .map_err(|err| IngestError::Read(format!("{}: {err}", path.display())))?;

    let total = raw.len();
    let pages: Vec<Page> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(idx, text)| {
            if text.trim().is_empty() {
                None
            } else {
                Some(Page {
                    number: idx as u32 + 1,
                    text,
                })
            }
        })
        .collect();

    info!(
        path = %path.display(),
        total_pages = total,
        pages_with_text = pages.len(),
        "extracted document text"
    );
    Ok(pages)
}
