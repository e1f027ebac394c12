//! Decoded content model handed to downstream pipeline stages.

use serde::{Deserialize, Serialize};

/// Mime type constants understood by the decoder.
pub mod mime_types {
    /// Input documents this decoder accepts.
    pub const PDF: &str = "application/pdf";
    /// Declared kind of every [`super::FileContent`] the decoder produces.
    pub const PLAIN_TEXT: &str = "text/plain";
}

/// Line terminator placed between recognised lines of one page.
pub const LINE_SEPARATOR: &str = "\r\n";

/// The text of one decoded document, split into page sections.
///
/// Created and filled by a single decode call; the caller owns it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    /// Kind of the section payloads, e.g. [`mime_types::PLAIN_TEXT`].
    pub mime_type: String,
    /// Sections in document order.
    pub sections: Vec<FileSection>,
}

impl FileContent {
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            sections: Vec::new(),
        }
    }

    /// True when no section was produced.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// One page worth of extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSection {
    /// 1-based position of the page within the analysed document.
    pub page_number: usize,
    /// Page lines joined with [`LINE_SEPARATOR`], untrimmed.
    pub content: String,
    /// Whether the section stands for non-text (e.g. image) content.
    pub is_image: bool,
}

impl FileSection {
    pub fn new(page_number: usize, content: impl Into<String>, is_image: bool) -> Self {
        Self {
            page_number,
            content: content.into(),
            is_image,
        }
    }
}
