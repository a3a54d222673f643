//! # gdocs2blog
//!
//! Turn shared Google Docs into frontmatter Markdown blog posts.
//!
//! ## Why this crate?
//!
//! Authors draft posts in Google Docs. Publishing them by hand means copying
//! text, re-applying formatting, re-hosting every image (export image URLs
//! expire), and writing frontmatter. This crate does it in one pass: the
//! first `<h1>` becomes the title, the second the category, the first image
//! the cover, and the rest becomes a clean Markdown body.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Document ID
//!  │
//!  ├─ 1. Fetch      HTML export over HTTP; reject stub pages
//!  ├─ 2. Normalize  bold/italic CSS spans → <strong>/<em>
//!  ├─ 3. Structure  title + category from the first two <h1>
//!  ├─ 4. Translate  rule-based HTML → Markdown (GFM tables)
//!  ├─ 5. Assets     re-upload images to Cloudinary, rewrite URLs
//!  ├─ 6. Refine     optional LLM tidy-up; falls back to the original
//!  └─ 7. Assemble   frontmatter + body → <output_dir>/<slug>.md
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gdocs2blog::{BatchOrchestrator, ConversionConfig, Converter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().output_dir("blogposts").build()?;
//!     let converter = Arc::new(Converter::from_config(config)?);
//!     let report = BatchOrchestrator::new(converter)
//!         .run_ids(&["1AbCdEf".to_string()])
//!         .await;
//!     eprintln!("{} converted, {} failed", report.succeeded(), report.failed());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `gdocs2blog` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! gdocs2blog = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod convert;
pub mod dom;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{parse_id_list, BatchOrchestrator, BatchReport, DocumentConverter, StateFiles};
pub use config::{CloudinaryConfig, ConversionConfig, ConversionConfigBuilder};
pub use convert::{ConversionOutcome, Converter, Stage};
pub use error::{Gdocs2BlogError, RefinementError, UploadError};
pub use pipeline::assets::{CloudinaryHost, ImageHost};
pub use pipeline::fetch::{DocumentSource, GoogleDocsExporter};
pub use pipeline::refine::{LlmRefiner, Refinement, TextRefiner};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
