//! Turn an analysis result into page sections.
//!
//! Pages keep the order the service returned them in and are numbered from
//! 1 by position. Line text is joined with [`LINE_SEPARATOR`] exactly as
//! recognised: no trimming, no reflow, no line-ending normalisation.

use crate::content::{mime_types, FileContent, FileSection, LINE_SEPARATOR};
use crate::service::AnalyzeResult;

/// Build the plain-text [`FileContent`] for a completed analysis.
pub fn to_file_content(result: AnalyzeResult) -> FileContent {
    let mut content = FileContent::new(mime_types::PLAIN_TEXT);
    content.sections.reserve(result.pages.len());

    for (idx, page) in result.pages.iter().enumerate() {
        let text = page
            .lines
            .iter()
            .map(|line| line.content.as_str())
            .collect::<Vec<_>>()
            .join(LINE_SEPARATOR);
        content.sections.push(FileSection::new(idx + 1, text, false));
    }

    content
}
