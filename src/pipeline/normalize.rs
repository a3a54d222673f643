//! Style normalisation: turn style-only emphasis into semantic tags.
//!
//! The export never uses `<b>`/`<i>`; bold and italic runs are `<span>`s whose
//! class or inline style sets `font-weight` / `font-style`. The translator
//! only understands semantic tags, so spans are retagged to `<strong>` or
//! `<em>` first.
//!
//! A span is classified once: the bold check runs first and wins, so a
//! bold-and-italic span becomes `<strong>` only.

use crate::dom::{NodePath, ParsedDocument};
use tracing::debug;

/// Emphasis implied by a computed style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Strong,
    Italic,
}

impl Emphasis {
    fn tag(self) -> &'static str {
        match self {
            Emphasis::Strong => "strong",
            Emphasis::Italic => "em",
        }
    }
}

/// Retag every emphasised `<span>` in place.
pub fn normalize_styles(doc: &mut ParsedDocument) {
    // Pass 1: classify.
    let targets: Vec<(NodePath, Emphasis)> = doc
        .find_paths(|e| e.is("span"))
        .into_iter()
        .filter_map(|path| {
            let span = doc.element_at(&path)?;
            classify_style(&doc.computed_style(span)).map(|emphasis| (path, emphasis))
        })
        .collect();

    // Pass 2: retag. Tags change but no node moves, so every path stays valid.
    let count = targets.len();
    for (path, emphasis) in targets {
        if let Some(span) = doc.element_at_mut(&path) {
            span.tag = emphasis.tag().to_string();
            span.remove_attr("style");
            span.remove_attr("class");
        }
    }
    debug!("Normalised {} styled spans", count);
}

/// Classify a CSS declaration list. Bold is checked before italic.
pub fn classify_style(style: &str) -> Option<Emphasis> {
    let style = style.to_ascii_lowercase();
    let mut weight: Option<&str> = None;
    let mut font_style: Option<&str> = None;

    for decl in style.split(';') {
        if let Some((name, value)) = decl.split_once(':') {
            match name.trim() {
                "font-weight" => weight = Some(value.trim()),
                "font-style" => font_style = Some(value.trim()),
                _ => {}
            }
        }
    }

    if weight.is_some_and(is_bold_weight) {
        Some(Emphasis::Strong)
    } else if font_style.is_some_and(|v| v.starts_with("italic")) {
        Some(Emphasis::Italic)
    } else {
        None
    }
}

fn is_bold_weight(value: &str) -> bool {
    let value = value.trim_end_matches("!important").trim();
    match value {
        "bold" | "bolder" => true,
        numeric => numeric.parse::<u32>().is_ok_and(|w| w >= 700),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Node;

    #[test]
    fn classify_numeric_and_keyword_weights() {
        assert_eq!(classify_style("font-weight:700"), Some(Emphasis::Strong));
        assert_eq!(classify_style("FONT-WEIGHT: Bold"), Some(Emphasis::Strong));
        assert_eq!(classify_style("font-weight: 900;color:red"), Some(Emphasis::Strong));
        assert_eq!(classify_style("font-weight:400"), None);
        assert_eq!(classify_style("font-weight:600"), None);
    }

    #[test]
    fn classify_italic() {
        assert_eq!(classify_style("font-style: italic"), Some(Emphasis::Italic));
        assert_eq!(classify_style("font-style:normal"), None);
    }

    #[test]
    fn bold_wins_over_italic() {
        assert_eq!(
            classify_style("font-style:italic;font-weight:700"),
            Some(Emphasis::Strong)
        );
    }

    #[test]
    fn last_declaration_wins() {
        assert_eq!(classify_style("font-weight:700;font-weight:400"), None);
    }

    #[test]
    fn spans_are_retagged_in_place() {
        let mut doc = ParsedDocument::parse(
            "<body><p><span style=\"font-weight:700\">B</span> \
             <span style=\"font-style:italic\">I</span> \
             <span style=\"color:#000\">plain</span></p></body>",
        );
        normalize_styles(&mut doc);
        let p = doc.element_at(&[0]).unwrap();
        let tags: Vec<&str> = p
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Element(e) => Some(e.tag.as_str()),
                Node::Text(_) => None,
            })
            .collect();
        assert_eq!(tags, vec!["strong", "em", "span"]);
        assert_eq!(p.text(), "B I plain");
    }

    #[test]
    fn class_based_bold_is_detected() {
        let mut doc = ParsedDocument::parse(
            "<html><head><style>.c4{font-weight:700}</style></head>\
             <body><p><span class=\"c4\">heavy</span></p></body></html>",
        );
        normalize_styles(&mut doc);
        assert!(doc.element_at(&[0, 0]).unwrap().is("strong"));
    }
}
