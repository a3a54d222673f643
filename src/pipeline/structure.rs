//! Structure extraction: title and category from top-level headings.
//!
//! Authors write the post title as the first `<h1>` and the blog category as
//! the second. Both are pulled out of the tree so they only appear in the
//! frontmatter, never in the body.

use crate::config::ConversionConfig;
use crate::dom::{collapse_whitespace, ParsedDocument};
use tracing::{debug, warn};

/// Title and category pulled from a document. Both are always non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStructure {
    pub title: String,
    pub category: String,
}

/// Extract title and category, removing the headings they came from.
///
/// Fallbacks, in order:
/// 1. a missing or too-short title becomes the first
///    `fallback_title_chars` characters of the remaining body text;
/// 2. a still-empty title becomes `untitled_title`;
/// 3. an empty category becomes `uncategorized`.
pub fn extract_structure(doc: &mut ParsedDocument, config: &ConversionConfig) -> DocumentStructure {
    let headings: Vec<_> = doc.find_paths(|e| e.is("h1")).into_iter().take(2).collect();

    let texts: Vec<String> = headings
        .iter()
        .map(|p| {
            doc.element_at(p)
                .map(|h| h.text().trim().to_string())
                .unwrap_or_default()
        })
        .collect();

    // Remove the later heading first so the earlier path stays valid.
    for path in headings.iter().rev() {
        doc.remove_at(path);
    }

    let mut title = texts.first().cloned().unwrap_or_default();
    let mut category = texts.get(1).cloned().unwrap_or_default();

    if title.chars().count() < config.min_title_chars {
        warn!(
            "No usable <h1> title (got {:?}); using the first {} characters of the body",
            title, config.fallback_title_chars
        );
        title = doc
            .flattened_text()
            .chars()
            .take(config.fallback_title_chars)
            .collect();
    }

    if title.is_empty() {
        warn!("Document has no text to title it by; using {:?}", config.untitled_title);
        title = config.untitled_title.clone();
    }

    if category.is_empty() {
        category = config.uncategorized.clone();
    }

    debug!("Extracted title {:?}, category {:?}", title, category);
    DocumentStructure { title, category }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> (DocumentStructure, ParsedDocument) {
        let mut doc = ParsedDocument::parse(html);
        let s = extract_structure(&mut doc, &ConversionConfig::default());
        (s, doc)
    }

    #[test]
    fn first_two_headings_become_title_and_category() {
        let (s, doc) = extract(
            "<body><h1> Study in Taipei </h1><h1>Guides</h1><h1>Third</h1><p>Body</p></body>",
        );
        assert_eq!(s.title, "Study in Taipei");
        assert_eq!(s.category, "Guides");
        assert!(doc.find_paths(|e| e.is("h1")).len() == 1);
        assert_eq!(doc.flattened_text(), "Third Body");
    }

    #[test]
    fn single_heading_gets_default_category() {
        let (s, doc) = extract("<body><h1>Only a title</h1><p>text</p></body>");
        assert_eq!(s.title, "Only a title");
        assert_eq!(s.category, "uncategorized");
        assert!(doc.find_paths(|e| e.is("h1")).is_empty());
    }

    #[test]
    fn no_heading_uses_first_thirty_chars_of_body() {
        let (s, _) = extract(
            "<body><p>The   quick brown fox jumps over\n the lazy dog again</p></body>",
        );
        assert_eq!(s.title, "The quick brown fox jumps over");
        assert_eq!(s.title.chars().count(), 30);
    }

    #[test]
    fn short_heading_falls_back_to_body_text() {
        let (s, _) = extract("<body><h1>Hi</h1><p>Longer paragraph text</p></body>");
        assert_eq!(s.title, "Longer paragraph text");
    }

    #[test]
    fn fallback_counts_characters_not_bytes() {
        let (s, _) = extract(
            "<body><p>留學申請全攻略：從選校到簽證一次搞懂所有細節與常見問題整理給你參考</p></body>",
        );
        assert_eq!(s.title.chars().count(), 30);
    }

    #[test]
    fn empty_document_gets_untitled() {
        let (s, _) = extract("<body><p>   </p></body>");
        assert_eq!(s.title, "untitled document");
        assert_eq!(s.category, "uncategorized");
    }
}
