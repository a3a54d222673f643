//! Document assembly: frontmatter, slug, and the output file.

use crate::config::UNTITLED;
use crate::error::Gdocs2BlogError;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::info;

/// Frontmatter values for one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: String,
    pub category: String,
    pub cover_image: String,
    /// Processing date, not authorship date.
    pub date: NaiveDate,
}

impl DocumentMetadata {
    /// Metadata dated today (UTC).
    pub fn today(title: String, category: String, cover_image: String) -> Self {
        Self {
            title,
            category,
            cover_image,
            date: chrono::Utc::now().date_naive(),
        }
    }

    /// YAML frontmatter block, including both `---` fences and a final newline.
    pub fn frontmatter(&self) -> String {
        format!(
            "---\ntitle: {}\ndate: '{}'\ntags: []\ncategory: {}\nimage: {}\n---\n",
            yaml_quote(&self.title),
            self.date.format("%Y-%m-%d"),
            yaml_quote(&self.category),
            yaml_quote(&self.cover_image),
        )
    }
}

fn yaml_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Final file content: frontmatter, a blank line, then the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownArtifact {
    frontmatter: String,
    body: String,
}

impl MarkdownArtifact {
    /// Fails with [`Gdocs2BlogError::EmptyContent`] when `body` is blank.
    pub fn new(metadata: &DocumentMetadata, body: impl Into<String>) -> Result<Self, Gdocs2BlogError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(Gdocs2BlogError::EmptyContent);
        }
        Ok(Self {
            frontmatter: metadata.frontmatter(),
            body,
        })
    }

    pub fn frontmatter(&self) -> &str {
        &self.frontmatter
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn contents(&self) -> String {
        let mut out = format!("{}\n{}", self.frontmatter, self.body);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

static RE_ILLEGAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());
static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// File-system safe slug: illegal characters stripped (not replaced),
/// whitespace runs turned into `-`, lower-cased.
pub fn slugify(title: &str) -> String {
    let stripped = RE_ILLEGAL.replace_all(title, "");
    let slug = RE_SPACES.replace_all(&stripped, "-").to_lowercase();
    if slug.is_empty() || slug == "-" {
        return RE_SPACES.replace_all(UNTITLED, "-").into_owned();
    }
    slug
}

/// File stem for an arbitrary name such as a document ID: the characters
/// [`slugify`] strips are removed and leading dots dropped, so the result
/// never leaves the directory it is joined to. Case is kept.
pub fn file_stem(name: &str) -> String {
    let stripped = RE_ILLEGAL.replace_all(name, "");
    let stem = stripped.trim().trim_start_matches('.');
    if stem.is_empty() {
        "document".to_string()
    } else {
        stem.to_string()
    }
}

/// Write `artifact` to `<output_dir>/<slug>.md`, creating the directory.
///
/// Not atomic: a crash mid-write can leave a truncated file.
pub async fn write_artifact(
    output_dir: &Path,
    slug: &str,
    artifact: &MarkdownArtifact,
) -> Result<PathBuf, Gdocs2BlogError> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| Gdocs2BlogError::OutputWriteFailed {
            path: output_dir.to_path_buf(),
            source: e,
        })?;

    let path = output_dir.join(format!("{slug}.md"));
    tokio::fs::write(&path, artifact.contents())
        .await
        .map_err(|e| Gdocs2BlogError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    info!("Wrote {}", path.display());
    Ok(path)
}
