//! Owned document tree built from the exported HTML.
//!
//! `scraper` parses the export (html5ever underneath, so malformed markup is
//! repaired the way a browser would). The parsed tree is then lowered into a
//! small owned [`Node`] tree that the pipeline stages can mutate freely:
//! retag spans, drop headings, and finally serialise it for translation.
//!
//! Nodes are addressed by [`NodePath`]: child indices from `<body>` down.
//! Stages that mutate the tree first collect the paths they care about and
//! then apply their edits, so no edit happens while a traversal is live.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::HashMap;

/// Child-index path from the `<body>` element to a node. `[]` is the body itself.
pub type NodePath = Vec<usize>;

/// A node of the owned document tree. Comments and doctypes are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with its lower-cased tag name, attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Concatenated text of all descendant text nodes, untouched.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Serialise the element and its subtree back to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_html(self, &mut out);
        out
    }
}

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn write_html(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        push_escaped(value, true, out);
        out.push('"');
    }
    out.push('>');
    if VOID_TAGS.contains(&el.tag.as_str()) {
        return;
    }
    let raw = matches!(el.tag.as_str(), "script" | "style");
    for child in &el.children {
        match child {
            Node::Text(t) if raw => out.push_str(t),
            Node::Text(t) => push_escaped(t, false, out),
            Node::Element(e) => write_html(e, out),
        }
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

fn push_escaped(s: &str, in_attr: bool, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attr => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

fn collect_text(el: &Element, out: &mut String) {
    if matches!(el.tag.as_str(), "script" | "style") {
        return;
    }
    for child in &el.children {
        match child {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(e, out),
        }
    }
}

/// The parsed export: an owned `<body>` tree plus class styles.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub body: Element,
    class_styles: HashMap<String, String>,
}

static RE_CSS_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^{}]+)\{([^{}]*)\}").unwrap());
static RE_CLASS_SELECTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\.([A-Za-z0-9_-]+)$").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

impl ParsedDocument {
    /// Parse raw HTML into an owned tree rooted at `<body>`.
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let root = lower_element(parsed.root_element());

        let mut css = String::new();
        collect_style_text(&root, &mut css);

        let body = take_body(root);
        Self {
            body,
            class_styles: parse_class_styles(&css),
        }
    }

    /// Build a document directly from a body tree (no class styles).
    pub fn from_body(body: Element) -> Self {
        Self {
            body,
            class_styles: HashMap::new(),
        }
    }

    /// The style an element ends up with: declarations of each of its
    /// classes in class-attribute order, then its inline `style`.
    ///
    /// Later declarations override earlier ones when read front to back.
    pub fn computed_style(&self, el: &Element) -> String {
        let mut style = String::new();
        for class in el.classes() {
            if let Some(decls) = self.class_styles.get(class) {
                style.push_str(decls);
                style.push(';');
            }
        }
        if let Some(inline) = el.attr("style") {
            style.push_str(inline);
        }
        style
    }

    /// Paths of every element matching `pred`, in document (pre-)order.
    pub fn find_paths(&self, pred: impl Fn(&Element) -> bool) -> Vec<NodePath> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        walk_paths(&self.body, &pred, &mut path, &mut out);
        out
    }

    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        let mut el = &self.body;
        for &i in path {
            match el.children.get(i)? {
                Node::Element(child) => el = child,
                Node::Text(_) => return None,
            }
        }
        Some(el)
    }

    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut el = &mut self.body;
        for &i in path {
            match el.children.get_mut(i)? {
                Node::Element(child) => el = child,
                Node::Text(_) => return None,
            }
        }
        Some(el)
    }

    /// Detach the node at `path`. Shifts the indices of its later siblings,
    /// so callers removing several nodes go from last to first.
    pub fn remove_at(&mut self, path: &[usize]) -> Option<Node> {
        let (last, parent) = path.split_last()?;
        let parent = self.element_at_mut(parent)?;
        if *last < parent.children.len() {
            Some(parent.children.remove(*last))
        } else {
            None
        }
    }

    /// Body text with whitespace runs collapsed to one space and trimmed.
    pub fn flattened_text(&self) -> String {
        collapse_whitespace(&self.body.text())
    }
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    RE_WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

fn lower_element(el: ElementRef<'_>) -> Element {
    let value = el.value();
    let mut children = Vec::new();
    for child in el.children() {
        match child.value() {
            scraper::Node::Text(text) => children.push(Node::Text(text.to_string())),
            scraper::Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    children.push(Node::Element(lower_element(child_el)));
                }
            }
            _ => {}
        }
    }
    Element {
        tag: value.name().to_ascii_lowercase(),
        attrs: value
            .attrs()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect(),
        children,
    }
}

fn collect_style_text(el: &Element, out: &mut String) {
    for child in &el.children {
        if let Node::Element(e) = child {
            if e.is("style") {
                for c in &e.children {
                    if let Node::Text(t) = c {
                        out.push_str(t);
                        out.push('\n');
                    }
                }
            } else {
                collect_style_text(e, out);
            }
        }
    }
}

fn take_body(root: Element) -> Element {
    if root.is("body") {
        return root;
    }
    let mut fallback = None;
    for child in root.children {
        if let Node::Element(e) = child {
            if e.is("body") {
                return e;
            }
            if fallback.is_none() && !e.is("head") {
                fallback = Some(e);
            }
        }
    }
    let mut body = Element::new("body");
    if let Some(e) = fallback {
        body.children.push(Node::Element(e));
    }
    body
}

/// Map `.class` → declarations from a stylesheet. Only plain single-class
/// selectors are kept; that is all the export uses for run formatting.
fn parse_class_styles(css: &str) -> HashMap<String, String> {
    let mut map: HashMap<String, String> = HashMap::new();
    for caps in RE_CSS_RULE.captures_iter(css) {
        // `@import url(...);.c1`: the selector is whatever follows the last `;`.
        let selectors = caps[1].rsplit(';').next().unwrap_or("");
        let decls = caps[2].trim();
        for selector in selectors.split(',') {
            if let Some(class) = RE_CLASS_SELECTOR.captures(selector.trim()) {
                let entry = map.entry(class[1].to_string()).or_default();
                if !entry.is_empty() {
                    entry.push(';');
                }
                entry.push_str(decls);
            }
        }
    }
    map
}

fn walk_paths(
    el: &Element,
    pred: &impl Fn(&Element) -> bool,
    path: &mut NodePath,
    out: &mut Vec<NodePath>,
) {
    for (i, child) in el.children.iter().enumerate() {
        if let Node::Element(e) = child {
            path.push(i);
            if pred(e) {
                out.push(path.clone());
            }
            walk_paths(e, pred, path, out);
            path.pop();
        }
    }
}
