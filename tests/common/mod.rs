//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use gdocs2blog::{
    ConversionConfig, Converter, DocumentSource, Gdocs2BlogError, ImageHost, RefinementError,
    TextRefiner, UploadError,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Serves HTML by document ID; unknown IDs answer HTTP 404.
#[derive(Default)]
pub struct MockSource {
    pages: HashMap<String, String>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockSource {
    pub fn with(mut self, doc_id: &str, html: &str) -> Self {
        self.pages.insert(doc_id.to_string(), html.to_string());
        self
    }
}

#[async_trait]
impl DocumentSource for MockSource {
    async fn fetch_html(&self, doc_id: &str) -> Result<String, Gdocs2BlogError> {
        self.calls.lock().unwrap().push(doc_id.to_string());
        self.pages
            .get(doc_id)
            .cloned()
            .ok_or_else(|| Gdocs2BlogError::Fetch {
                doc_id: doc_id.to_string(),
                status: 404,
            })
    }
}

/// Uploads succeed with a predictable durable URL unless the source URL
/// contains `"broken"`.
#[derive(Default)]
pub struct MockHost {
    pub calls: Arc<Mutex<Vec<String>>>,
}

pub fn durable(source: &str) -> String {
    let name = source.rsplit('/').next().unwrap_or("img");
    format!("https://res.cloudinary.com/demo/image/upload/{name}.jpg")
}

#[async_trait]
impl ImageHost for MockHost {
    async fn upload(&self, source_url: &str) -> Result<String, UploadError> {
        self.calls.lock().unwrap().push(source_url.to_string());
        if source_url.contains("broken") {
            return Err(UploadError::Rejected {
                url: source_url.to_string(),
                status: 400,
                detail: "Resource not found".into(),
            });
        }
        Ok(durable(source_url))
    }
}

/// Returns a fixed answer and records what it was asked to refine.
pub struct MockRefiner {
    answer: Result<String, RefinementError>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockRefiner {
    pub fn answering(answer: Result<String, RefinementError>) -> Self {
        Self {
            answer,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl TextRefiner for MockRefiner {
    async fn refine(&self, markdown: &str) -> Result<String, RefinementError> {
        self.calls.lock().unwrap().push(markdown.to_string());
        self.answer.clone()
    }
}

pub const IMAGE_URL: &str = "https://lh3.googleusercontent.com/export/img-a";

/// A Google Docs style export: class-based emphasis, two headings, one
/// image referenced twice, and a table.
pub fn article_html() -> String {
    format!(
        r#"<html><head><meta charset="utf-8"><style type="text/css">.c1{{font-weight:700}}.c2{{font-style:italic}}</style></head>
<body class="doc-content">
<h1 class="c3"><span>My: Article/Test</span></h1>
<h1><span>Travel</span></h1>
<p><span class="c1">Bold words</span><span> and </span><span class="c2">slanted</span><span> text.</span></p>
<p><span><img alt="a" src="{IMAGE_URL}"></span></p>
<p><span>Again: </span><a href="{IMAGE_URL}">link</a></p>
<table><tr><td><p>Name</p></td><td><p>Fee</p></td></tr><tr><td><p>A</p></td><td><p>100</p></td></tr></table>
</body></html>"#
    )
}

pub const ARTICLE_BODY: &str = "**Bold words** and *slanted* text.\n\n\
![a](https://lh3.googleusercontent.com/export/img-a)\n\n\
Again: [link](https://lh3.googleusercontent.com/export/img-a)\n\n\
| Name | Fee |\n| --- | --- |\n| A | 100 |";

/// Export without any `<h1>`.
pub fn headless_html() -> String {
    r#"<html><head><style>.c9{color:#000000}</style></head><body><p><span class="c9">Short trip notes from the mountains in early spring</span></p></body></html>"#
        .to_string()
}

pub fn config(output_dir: &Path) -> ConversionConfig {
    ConversionConfig::builder()
        .output_dir(output_dir)
        .build()
        .unwrap()
}

pub fn converter(output_dir: &Path, source: MockSource) -> Converter {
    Converter::new(
        config(output_dir),
        Arc::new(source),
        Arc::new(MockHost::default()),
    )
}

/// Split a written post into (frontmatter, body).
pub fn split_post(contents: &str) -> (String, String) {
    let rest = contents.strip_prefix("---\n").expect("frontmatter opening fence");
    let (front, body) = rest.split_once("\n---\n\n").expect("frontmatter closing fence");
    (front.to_string(), body.to_string())
}
