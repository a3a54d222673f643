//! Tidy: deterministic cleanup of refined Markdown.
//!
//! The refinement model is told not to wrap its answer in fences or touch
//! the structure beyond formatting, but it still does now and then. These
//! rules undo the usual quirks without touching content.
//!
//! ## Rule Order
//!
//! Fences are stripped before anything else so the later line-based rules
//! see the real first and last lines; the final-newline rule runs last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every tidy rule to a refined post, in order:
///
/// 1. Strip an outer ```` ```markdown ```` fence
/// 2. Normalise line endings (CRLF / CR → LF)
/// 3. Trim trailing whitespace, keeping two-space hard breaks
/// 4. Collapse runs of blank lines to a single blank line
/// 5. Drop separator rows that appear inside a table body
/// 6. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 7. End with exactly one newline
pub fn tidy_markdown(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = drop_body_separator_rows(&s);
    let s = strip_invisible_chars(&s);
    ensure_final_newline(&s)
}

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?[ \t]*\r?\n(.*?)\r?\n```\s*$").unwrap());
static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| {
            let trimmed = line.trim_end();
            if !trimmed.is_empty() && line.ends_with("  ") {
                format!("{trimmed}  ")
            } else {
                trimmed.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_RUNS.replace_all(input, "\n\n").into_owned()
}

fn is_table_row(line: &str) -> bool {
    let t = line.trim();
    t.len() > 2 && t.starts_with('|') && t.ends_with('|')
}

fn is_separator_row(line: &str) -> bool {
    is_table_row(line)
        && line.contains('-')
        && line
            .trim()
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

/// GFM allows a separator only as a table's second row; models sometimes
/// repeat it between body rows.
fn drop_body_separator_rows(input: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut row_in_table = 0usize;
    for line in input.lines() {
        if is_table_row(line) {
            row_in_table += 1;
            if row_in_table != 2 && is_separator_row(line) {
                continue;
            }
        } else {
            row_in_table = 0;
        }
        out.push(line);
    }
    out.join("\n")
}

fn strip_invisible_chars(input: &str) -> String {
    input.replace(['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}'], "")
}

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_fence() {
        assert_eq!(tidy_markdown("```markdown\n# Hi\n\ntext\n```"), "# Hi\n\ntext\n");
        assert_eq!(tidy_markdown("```\nplain\n```\n"), "plain\n");
    }

    #[test]
    fn inner_code_fences_survive() {
        let md = "intro\n\n```rust\nfn main() {}\n```\n";
        assert_eq!(tidy_markdown(md), md);
    }

    #[test]
    fn crlf_and_blank_runs() {
        assert_eq!(tidy_markdown("a\r\n\r\n\r\n\r\nb"), "a\n\nb\n");
    }

    #[test]
    fn hard_breaks_are_kept() {
        assert_eq!(tidy_markdown("one  \ntwo   \nthree \n"), "one  \ntwo  \nthree\n");
    }

    #[test]
    fn body_separator_rows_are_dropped() {
        let md = "| a | b |\n| --- | --- |\n| 1 | 2 |\n| --- | --- |\n| 3 | 4 |";
        assert_eq!(
            tidy_markdown(md),
            "| a | b |\n| --- | --- |\n| 1 | 2 |\n| 3 | 4 |\n"
        );
    }

    #[test]
    fn invisible_chars_removed() {
        assert_eq!(tidy_markdown("\u{FEFF}a\u{200B}b"), "ab\n");
    }

    #[test]
    fn whitespace_only_tidies_to_empty() {
        assert_eq!(tidy_markdown("  \n\n "), "");
    }
}
