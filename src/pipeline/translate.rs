//! HTML → Markdown translation.
//!
//! The mutated body is serialised back to HTML and converted with `htmd`, a
//! Turndown port, so output matches the blog's existing posts:
//!
//! | HTML                 | Markdown                          |
//! |----------------------|-----------------------------------|
//! | `h1`–`h6`            | ATX headings (`#` … `######`)     |
//! | `ul` / `ol`          | `- item` / `1. item`              |
//! | `strong`, `b`        | `**text**`                        |
//! | `em`, `i`            | `*text*`                          |
//! | `table`              | GFM pipe table, first row header  |
//! | `a`, `img`           | `[text](href)`, `![alt](src)`     |
//! | `pre`, `code`        | fenced block, backticks           |
//!
//! Emphasis and tables go through custom element handlers; everything else
//! is `htmd`'s own rules.

use crate::dom::{collapse_whitespace, Element};
use crate::error::Gdocs2BlogError;
use htmd::options::{BulletListMarker, CodeBlockStyle, HeadingStyle, Options};
use htmd::HtmlToMarkdown;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Ends a cell in the table handlers' intermediate output.
const CELL_END: char = '\u{E000}';
/// Ends a row in the table handlers' intermediate output.
const ROW_END: char = '\u{E001}';

static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "head", "title", "meta", "link", "noscript", "template",
];

/// Translate a body tree to Markdown.
///
/// # Errors
/// [`Gdocs2BlogError::EmptyContent`] when the trimmed result is empty, or
/// when `htmd` rejects the markup.
pub fn translate(body: &Element) -> Result<String, Gdocs2BlogError> {
    let converted = converter().convert(&body.to_html()).map_err(|e| {
        warn!("HTML to Markdown conversion failed: {}", e);
        Gdocs2BlogError::EmptyContent
    })?;

    let markdown = RE_BLANK_RUNS.replace_all(&converted, "\n\n");
    let markdown = markdown
        .lines()
        .map(trim_line_end)
        .collect::<Vec<_>>()
        .join("\n");
    let markdown = markdown.trim().to_string();
    if markdown.is_empty() {
        return Err(Gdocs2BlogError::EmptyContent);
    }
    Ok(markdown)
}

fn converter() -> HtmlToMarkdown {
    HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: BulletListMarker::Dash,
            code_block_style: CodeBlockStyle::Fenced,
            ..Default::default()
        })
        .skip_tags(SKIPPED_TAGS.to_vec())
        .add_handler(vec!["strong", "b"], |element: htmd::Element| {
            Some(wrap(element.content, "**"))
        })
        .add_handler(vec!["em", "i"], |element: htmd::Element| {
            Some(wrap(element.content, "*"))
        })
        .add_handler(vec!["td", "th"], |element: htmd::Element| {
            let cell = collapse_whitespace(element.content).replace('|', "\\|");
            Some(format!("{cell}{CELL_END}"))
        })
        .add_handler(vec!["tr"], |element: htmd::Element| {
            Some(format!("{}{ROW_END}", element.content))
        })
        .add_handler(vec!["thead", "tbody", "tfoot"], |element: htmd::Element| {
            Some(element.content.to_string())
        })
        .add_handler(vec!["table"], |element: htmd::Element| {
            Some(match gfm_table(element.content) {
                Some(table) => format!("\n\n{table}\n\n"),
                None => String::new(),
            })
        })
        .build()
}

/// Trim trailing whitespace but keep a Markdown hard break (two spaces).
fn trim_line_end(line: &str) -> String {
    let trimmed = line.trim_end();
    if !trimmed.is_empty() && line.ends_with("  ") {
        format!("{trimmed}  ")
    } else {
        trimmed.to_string()
    }
}

/// Wrap `inner` in `delim`, moving surrounding whitespace outside so the
/// delimiters hug the text. Whitespace-only content is returned as is.
fn wrap(inner: &str, delim: &str) -> String {
    let text = inner.trim();
    if text.is_empty() {
        return inner.to_string();
    }
    let lead = if inner.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if inner.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{lead}{delim}{text}{delim}{trail}")
}

/// Build a GFM pipe table from the rows the cell and row handlers emitted.
/// The first row is the header; short rows are padded to the widest one.
fn gfm_table(content: &str) -> Option<String> {
    let rows: Vec<Vec<&str>> = content
        .split(ROW_END)
        .map(|row| {
            let mut cells: Vec<&str> = row.split(CELL_END).map(str::trim).collect();
            // Text after the last cell end is inter-row whitespace.
            cells.pop();
            cells
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return None;
    }

    let format_row = |row: &[&str]| {
        let mut padded = row.to_vec();
        padded.resize(width, "");
        format!("| {} |", padded.join(" | "))
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format_row(&rows[0]));
    lines.push(format!("|{}", " --- |".repeat(width)));
    lines.extend(rows[1..].iter().map(|row| format_row(row)));
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ParsedDocument;

    fn md(html: &str) -> String {
        translate(&ParsedDocument::parse(html).body).unwrap()
    }

    #[test]
    fn headings_are_atx() {
        assert_eq!(
            md("<body><h2>Section</h2><h3>Sub <b>bold</b></h3></body>"),
            "## Section\n\n### Sub **bold**"
        );
    }

    #[test]
    fn paragraphs_separated_by_blank_line() {
        assert_eq!(md("<body><p>one</p><p>two</p></body>"), "one\n\ntwo");
    }

    #[test]
    fn emphasis_uses_asterisks() {
        assert_eq!(
            md("<body><p><strong>bold</strong> and <em>it</em></p></body>"),
            "**bold** and *it*"
        );
    }

    #[test]
    fn wrap_moves_padding_outside() {
        assert_eq!(wrap(" bold ", "**"), " **bold** ");
        assert_eq!(wrap("x", "*"), "*x*");
        assert_eq!(wrap("  ", "**"), "  ");
    }

    #[test]
    fn bullet_list_uses_dashes() {
        let out = md("<body><ul><li>a</li><li>b</li></ul></body>");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('-') && lines[0].ends_with('a'), "got {out}");
        assert!(lines[1].starts_with('-') && lines[1].ends_with('b'), "got {out}");
    }

    #[test]
    fn table_becomes_gfm() {
        let out = md(
            "<body><table><tbody><tr><td><p>Name</p></td><td><p>Fee</p></td></tr>\
             <tr><td>A|B</td><td>100</td></tr><tr><td>only</td></tr></tbody></table></body>",
        );
        assert_eq!(
            out,
            "| Name | Fee |\n| --- | --- |\n| A\\|B | 100 |\n| only |  |"
        );
    }

    #[test]
    fn table_cells_keep_inline_markdown() {
        let out = md(
            "<body><table><tr><th>Item</th></tr><tr><td><b>Tea</b> <a href=\"https://t.example\">shop</a></td></tr></table></body>",
        );
        assert_eq!(out, "| Item |\n| --- |\n| **Tea** [shop](https://t.example) |");
    }

    #[test]
    fn links_and_images() {
        assert_eq!(
            md("<body><p>see <a href=\"https://x.org\">site</a> <img alt=\"pic\" src=\"https://img/1.png\"></p></body>"),
            "see [site](https://x.org) ![pic](https://img/1.png)"
        );
    }

    #[test]
    fn line_break_is_hard_break() {
        assert_eq!(md("<body><p>one<br>two</p></body>"), "one  \ntwo");
    }

    #[test]
    fn leading_dash_is_not_a_list_item() {
        assert_eq!(md("<body><p>- note</p></body>"), "\\- note");
    }

    #[test]
    fn inline_markdown_characters_are_escaped() {
        let out = md("<body><p>2*3 snake_case</p></body>");
        assert!(out.contains("2\\*3"), "got {out}");
        assert!(out.contains("snake\\_case"), "got {out}");
    }

    #[test]
    fn multibyte_whitespace_before_hard_break() {
        assert_eq!(trim_line_end("foo\u{3000}  "), "foo  ");
        assert_eq!(trim_line_end("foo \u{3000}"), "foo");

        let doc = ParsedDocument::parse("<body><pre>foo\u{3000}  \nbar</pre></body>");
        let out = translate(&doc.body).unwrap();
        assert!(out.contains("foo"), "got {out}");
        assert!(out.contains("bar"), "got {out}");
    }

    #[test]
    fn style_and_script_are_dropped() {
        assert_eq!(
            md("<body><style>.c1{}</style><script>x()</script><p>kept</p></body>"),
            "kept"
        );
    }

    #[test]
    fn whitespace_only_body_is_empty_content() {
        let doc = ParsedDocument::parse("<body><p> </p><div>\n</div></body>");
        assert!(matches!(
            translate(&doc.body),
            Err(Gdocs2BlogError::EmptyContent)
        ));
    }
}
