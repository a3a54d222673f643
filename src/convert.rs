//! Per-document conversion: the pipeline state machine.
//!
//! ```text
//! Fetching → Normalizing → ExtractingStructure → Translating
//!          → RelocatingAssets → Refining → Assembling → Done
//! ```
//!
//! Any fatal error short-circuits to `Failed`, recording the stage it came
//! from. Image upload and refinement errors are not fatal: they are logged
//! and the document carries on. Nothing is written unless every stage up to
//! `Assembling` succeeded, and no stage is retried within one run.

use crate::config::ConversionConfig;
use crate::dom::ParsedDocument;
use crate::error::Gdocs2BlogError;
use crate::pipeline::assemble::{
    file_stem, slugify, write_artifact, DocumentMetadata, MarkdownArtifact,
};
use crate::pipeline::assets::{relocate_assets, CloudinaryHost, ImageHost};
use crate::pipeline::fetch::{DocumentSource, GoogleDocsExporter};
use crate::pipeline::normalize::normalize_styles;
use crate::pipeline::refine::{refine_markdown, resolve_provider, LlmRefiner, Refinement, TextRefiner};
use crate::pipeline::structure::extract_structure;
use crate::pipeline::translate::translate;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetching,
    Normalizing,
    ExtractingStructure,
    Translating,
    RelocatingAssets,
    Refining,
    Assembling,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Normalizing => "normalizing",
            Stage::ExtractingStructure => "extracting structure",
            Stage::Translating => "translating",
            Stage::RelocatingAssets => "relocating assets",
            Stage::Refining => "refining",
            Stage::Assembling => "assembling",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of converting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionOutcome {
    pub doc_id: String,
    pub success: bool,
    /// Written `.md` file, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Stage that failed, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    /// Error message, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionOutcome {
    pub fn succeeded(doc_id: impl Into<String>, output_path: PathBuf) -> Self {
        Self {
            doc_id: doc_id.into(),
            success: true,
            output_path: Some(output_path),
            failed_stage: None,
            error: None,
        }
    }

    pub fn failed(doc_id: impl Into<String>, stage: Stage, error: impl fmt::Display) -> Self {
        Self {
            doc_id: doc_id.into(),
            success: false,
            output_path: None,
            failed_stage: Some(stage),
            error: Some(error.to_string()),
        }
    }
}

/// Runs the pipeline for one document at a time.
///
/// Collaborators sit behind traits so tests (and other hosts) can swap the
/// export source, image host, or refiner.
pub struct Converter {
    config: ConversionConfig,
    source: Arc<dyn DocumentSource>,
    images: Arc<dyn ImageHost>,
    refiner: Option<Arc<dyn TextRefiner>>,
}

impl Converter {
    /// A converter without refinement.
    pub fn new(
        config: ConversionConfig,
        source: Arc<dyn DocumentSource>,
        images: Arc<dyn ImageHost>,
    ) -> Self {
        Self {
            config,
            source,
            images,
            refiner: None,
        }
    }

    pub fn with_refiner(mut self, refiner: Arc<dyn TextRefiner>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    /// Production wiring: Google Docs export, Cloudinary, and an LLM refiner
    /// when `config.refine` is set and a provider can be resolved.
    ///
    /// An unresolvable provider only disables refinement.
    pub fn from_config(config: ConversionConfig) -> Result<Self, Gdocs2BlogError> {
        let source = Arc::new(GoogleDocsExporter::new(&config)?);
        let images = Arc::new(
            CloudinaryHost::new(&config)
                .map_err(|e| Gdocs2BlogError::Internal(format!("HTTP client: {e}")))?,
        );
        if config.cloudinary.cloud_name.is_none() {
            warn!("Cloudinary is not configured; images keep their export URLs");
        }

        let refiner: Option<Arc<dyn TextRefiner>> = if config.refine {
            match resolve_provider(&config) {
                Ok(provider) => Some(Arc::new(LlmRefiner::new(provider, &config))),
                Err(e) => {
                    warn!("Refinement disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            config,
            source,
            images,
            refiner,
        })
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn refines(&self) -> bool {
        self.refiner.is_some()
    }

    /// Convert one document. Never fails; failures are reported in the outcome.
    pub async fn convert(&self, doc_id: &str) -> ConversionOutcome {
        let start = Instant::now();
        match self.try_convert(doc_id).await {
            Ok(path) => {
                info!(
                    "{}: {} → {} ({}ms)",
                    doc_id,
                    Stage::Done,
                    path.display(),
                    start.elapsed().as_millis()
                );
                ConversionOutcome::succeeded(doc_id, path)
            }
            Err((stage, e)) => {
                error!("{}: {} while {}: {}", doc_id, Stage::Failed, stage, e);
                ConversionOutcome::failed(doc_id, stage, e)
            }
        }
    }

    /// Run every stage, returning the written path or the failing stage.
    pub async fn try_convert(&self, doc_id: &str) -> Result<PathBuf, (Stage, Gdocs2BlogError)> {
        enter(doc_id, Stage::Fetching);
        let html = self
            .source
            .fetch_html(doc_id)
            .await
            .map_err(|e| (Stage::Fetching, e))?;
        self.dump_raw_html(doc_id, &html).await;

        enter(doc_id, Stage::Normalizing);
        let mut doc = ParsedDocument::parse(&html);
        normalize_styles(&mut doc);

        enter(doc_id, Stage::ExtractingStructure);
        let structure = extract_structure(&mut doc, &self.config);
        info!("{}: title {:?}, category {:?}", doc_id, structure.title, structure.category);

        enter(doc_id, Stage::Translating);
        let markdown = translate(&doc.body).map_err(|e| (Stage::Translating, e))?;

        enter(doc_id, Stage::RelocatingAssets);
        let assets = relocate_assets(
            &doc,
            markdown,
            self.images.as_ref(),
            &self.config.default_cover_image,
        )
        .await;
        if !assets.failures.is_empty() {
            warn!(
                "{}: {} image(s) kept their original URL",
                doc_id,
                assets.failures.len()
            );
        }

        enter(doc_id, Stage::Refining);
        let refinement = refine_markdown(self.refiner.as_deref(), assets.markdown).await;
        if let Refinement::Unchanged { error, .. } = &refinement {
            warn!("{}: publishing unrefined Markdown ({})", doc_id, error);
        }

        enter(doc_id, Stage::Assembling);
        let metadata = DocumentMetadata::today(structure.title, structure.category, assets.cover_image);
        let artifact = MarkdownArtifact::new(&metadata, refinement.into_markdown())
            .map_err(|e| (Stage::Assembling, e))?;
        write_artifact(&self.config.output_dir, &slugify(&metadata.title), &artifact)
            .await
            .map_err(|e| (Stage::Assembling, e))
    }

    /// Save the raw export for inspection. Failures only warn.
    async fn dump_raw_html(&self, doc_id: &str, html: &str) {
        let Some(dir) = &self.config.raw_html_dir else {
            return;
        };
        let path = dir.join(format!("{}.html", file_stem(doc_id)));
        let result = match tokio::fs::create_dir_all(dir).await {
            Ok(()) => tokio::fs::write(&path, html).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => debug!("Raw export saved to {}", path.display()),
            Err(e) => warn!("Could not save raw export to {}: {}", path.display(), e),
        }
    }
}

fn enter(doc_id: &str, stage: Stage) {
    debug!("{}: {}", doc_id, stage);
}
