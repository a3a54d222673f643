//! Pipeline stages for document-to-blog conversion.
//!
//! Each submodule implements one transformation step. The export source,
//! image host, and refiner sit behind traits.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ normalize ──▶ structure ──▶ translate ──▶ assets ──▶ refine ──▶ assemble
//! (HTML)    (spans)       (title/cat)   (Markdown)    (images)   (LLM)      (file)
//! ```
//!
//! 1. [`fetch`]     — download the HTML export and reject implausibly short ones
//! 2. [`normalize`] — retag bold/italic styled spans as `strong`/`em`
//! 3. [`structure`] — pull title and category out of the first two `h1`s
//! 4. [`translate`] — HTML → Markdown via `htmd`; fails on empty output
//! 5. [`assets`]    — re-upload images one at a time and rewrite their URLs
//! 6. [`refine`]    — best-effort LLM tidy-up, cleaned by [`tidy`]
//! 7. [`assemble`]  — frontmatter, slug, and the output file

pub mod assemble;
pub mod assets;
pub mod fetch;
pub mod normalize;
pub mod refine;
pub mod structure;
pub mod tidy;
pub mod translate;
