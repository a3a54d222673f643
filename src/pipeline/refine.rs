//! Content refinement: best-effort LLM tidy-up of the translated post.
//!
//! The refinement pass is optional polish. Whatever goes wrong (no provider,
//! network error, timeout, empty answer) the post is still published with
//! the unrefined Markdown. The [`Refinement`] enum makes that contract
//! visible: callers always get Markdown back, plus the reason when it is the
//! original.

use crate::config::ConversionConfig;
use crate::error::{Gdocs2BlogError, RefinementError};
use crate::pipeline::tidy::tidy_markdown;
use crate::prompts::{refine_request, DEFAULT_REFINE_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info};

/// Rewrites Markdown text.
#[async_trait]
pub trait TextRefiner: Send + Sync {
    async fn refine(&self, markdown: &str) -> Result<String, RefinementError>;
}

/// Outcome of the refinement stage. Every variant carries usable Markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refinement {
    /// The refiner answered; the text has been tidied.
    Refined(String),
    /// The refiner failed; the original Markdown is kept.
    Unchanged {
        markdown: String,
        error: RefinementError,
    },
    /// No refiner configured.
    Skipped(String),
}

impl Refinement {
    pub fn markdown(&self) -> &str {
        match self {
            Refinement::Refined(md) | Refinement::Skipped(md) => md,
            Refinement::Unchanged { markdown, .. } => markdown,
        }
    }

    pub fn into_markdown(self) -> String {
        match self {
            Refinement::Refined(md) | Refinement::Skipped(md) => md,
            Refinement::Unchanged { markdown, .. } => markdown,
        }
    }

    pub fn is_refined(&self) -> bool {
        matches!(self, Refinement::Refined(_))
    }
}

/// Run `markdown` through `refiner`, falling back to the original on any error.
pub async fn refine_markdown(refiner: Option<&dyn TextRefiner>, markdown: String) -> Refinement {
    let Some(refiner) = refiner else {
        debug!("Refinement disabled");
        return Refinement::Skipped(markdown);
    };

    match refiner.refine(&markdown).await {
        Ok(text) => {
            let tidied = tidy_markdown(&text);
            if tidied.is_empty() {
                error!("Refinement returned only whitespace; keeping unrefined Markdown");
                Refinement::Unchanged {
                    markdown,
                    error: RefinementError::EmptyResponse,
                }
            } else {
                info!("Refined Markdown: {} → {} bytes", markdown.len(), tidied.len());
                Refinement::Refined(tidied)
            }
        }
        Err(e) => {
            error!("Refinement failed, keeping unrefined Markdown: {}", e);
            Refinement::Unchanged { markdown, error: e }
        }
    }
}

/// [`TextRefiner`] backed by an edgequake-llm chat provider.
pub struct LlmRefiner {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    temperature: f32,
    max_tokens: usize,
    timeout_secs: u64,
}

impl LlmRefiner {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ConversionConfig) -> Self {
        Self {
            provider,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_REFINE_PROMPT.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.api_timeout_secs,
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TextRefiner for LlmRefiner {
    async fn refine(&self, markdown: &str) -> Result<String, RefinementError> {
        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(refine_request(markdown)),
        ];
        let options = self.options();

        let response = timeout(
            Duration::from_secs(self.timeout_secs),
            self.provider.chat(&messages, Some(&options)),
        )
        .await
        .map_err(|_| RefinementError::Timeout {
            secs: self.timeout_secs,
        })?
        .map_err(|e| RefinementError::Provider(e.to_string()))?;

        debug!(
            "Refinement: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        if response.content.trim().is_empty() {
            return Err(RefinementError::EmptyResponse);
        }
        Ok(response.content)
    }
}

// ── Provider resolution ──────────────────────────────────────────────────────

const DEFAULT_MODEL: &str = "gpt-4.1-nano";

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, Gdocs2BlogError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Gdocs2BlogError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the refinement provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`)
/// 2. **Named provider + model** (`config.provider_name`, `config.model`)
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`)
/// 4. **OpenAI key present** (`OPENAI_API_KEY`)
/// 5. **Full auto-detection** (`ProviderFactory::from_env`)
pub fn resolve_provider(config: &ConversionConfig) -> Result<Arc<dyn LLMProvider>, Gdocs2BlogError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Gdocs2BlogError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY or ANTHROPIC_API_KEY, or pass --no-refine.\n\
                Error: {e}"
            ),
        })?;

    Ok(llm_provider)
}
