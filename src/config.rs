//! Configuration types for document-to-blog conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The config is constructed once at
//! process start and handed to [`crate::convert::Converter`]; no stage reads
//! credentials or settings from ambient global state.

use crate::error::Gdocs2BlogError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Google Docs HTML export endpoint. `{id}` is replaced by the document ID.
pub const DEFAULT_EXPORT_URL: &str = "https://docs.google.com/document/d/{id}/export?format=html";

/// Cover image used when no image of a document could be relocated.
pub const DEFAULT_COVER_IMAGE: &str = "/default-thumbnail.jpg";

/// Title used when neither a heading nor body text yields one.
pub const UNTITLED: &str = "untitled document";

/// Category used when the document has no second top-level heading.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Configuration for converting documents into blog posts.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use gdocs2blog::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .output_dir("posts/zh")
///     .default_cover_image("/img/cover.jpg")
///     .refine(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Directory the `<slug>.md` files are written to. Created if absent.
    /// Default: `blogposts`.
    pub output_dir: PathBuf,

    /// Frontmatter `image` value when no image upload succeeds.
    /// Default: `/default-thumbnail.jpg`.
    pub default_cover_image: String,

    /// Export URL template; must contain `{id}`.
    pub export_url_template: String,

    /// Exports shorter than this many bytes are rejected as
    /// [`Gdocs2BlogError::EmptyDocument`]. Default: 100.
    ///
    /// A private or deleted document still answers with a short stub page,
    /// so a plain status check is not enough to detect a failed export.
    pub min_document_len: usize,

    /// A heading title shorter than this (in characters) is replaced by the
    /// body-text fallback. Default: 5.
    pub min_title_chars: usize,

    /// Number of characters of flattened body text used as the fallback
    /// title. Default: 30.
    pub fallback_title_chars: usize,

    /// Title used when no other source yields one. Default: `untitled document`.
    pub untitled_title: String,

    /// Category used when the document has none. Default: `uncategorized`.
    pub uncategorized: String,

    /// When set, every fetched export is also saved as `<dir>/<id>.html`.
    pub raw_html_dir: Option<PathBuf>,

    /// Run the LLM refinement pass. Default: true.
    pub refine: bool,

    /// LLM model identifier for refinement. If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Custom refinement system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Sampling temperature for refinement. Default: 0.3.
    pub temperature: f32,

    /// Maximum tokens the refinement may generate. Default: 8192.
    pub max_tokens: usize,

    /// Image host credentials.
    pub cloudinary: CloudinaryConfig,

    /// Export fetch timeout in seconds. Default: 60.
    pub fetch_timeout_secs: u64,

    /// Per-image upload timeout in seconds. Default: 60.
    pub upload_timeout_secs: u64,

    /// Refinement call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("blogposts"),
            default_cover_image: DEFAULT_COVER_IMAGE.to_string(),
            export_url_template: DEFAULT_EXPORT_URL.to_string(),
            min_document_len: 100,
            min_title_chars: 5,
            fallback_title_chars: 30,
            untitled_title: UNTITLED.to_string(),
            uncategorized: UNCATEGORIZED.to_string(),
            raw_html_dir: None,
            refine: true,
            model: None,
            provider_name: None,
            provider: None,
            system_prompt: None,
            temperature: 0.3,
            max_tokens: 8192,
            cloudinary: CloudinaryConfig::default(),
            fetch_timeout_secs: 60,
            upload_timeout_secs: 60,
            api_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("output_dir", &self.output_dir)
            .field("default_cover_image", &self.default_cover_image)
            .field("export_url_template", &self.export_url_template)
            .field("min_document_len", &self.min_document_len)
            .field("min_title_chars", &self.min_title_chars)
            .field("fallback_title_chars", &self.fallback_title_chars)
            .field("raw_html_dir", &self.raw_html_dir)
            .field("refine", &self.refine)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("cloudinary", &self.cloudinary)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Export URL for one document.
    pub fn export_url(&self, doc_id: &str) -> String {
        self.export_url_template.replace("{id}", doc_id)
    }
}

/// Cloudinary account settings.
///
/// Either `api_key` + `api_secret` (signed upload) or `upload_preset`
/// (unsigned upload) must be set alongside `cloud_name`.
#[derive(Clone, Default)]
pub struct CloudinaryConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub upload_preset: Option<String>,
    /// Target folder inside the media library.
    pub folder: Option<String>,
}

impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<redacted>"))
            .field("upload_preset", &self.upload_preset)
            .field("folder", &self.folder)
            .finish()
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn default_cover_image(mut self, path: impl Into<String>) -> Self {
        self.config.default_cover_image = path.into();
        self
    }

    pub fn export_url_template(mut self, template: impl Into<String>) -> Self {
        self.config.export_url_template = template.into();
        self
    }

    pub fn min_document_len(mut self, n: usize) -> Self {
        self.config.min_document_len = n;
        self
    }

    pub fn min_title_chars(mut self, n: usize) -> Self {
        self.config.min_title_chars = n;
        self
    }

    pub fn fallback_title_chars(mut self, n: usize) -> Self {
        self.config.fallback_title_chars = n.max(1);
        self
    }

    pub fn untitled_title(mut self, title: impl Into<String>) -> Self {
        self.config.untitled_title = title.into();
        self
    }

    pub fn uncategorized(mut self, category: impl Into<String>) -> Self {
        self.config.uncategorized = category.into();
        self
    }

    pub fn raw_html_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.raw_html_dir = Some(dir.into());
        self
    }

    pub fn refine(mut self, v: bool) -> Self {
        self.config.refine = v;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn cloudinary(mut self, cloudinary: CloudinaryConfig) -> Self {
        self.config.cloudinary = cloudinary;
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn upload_timeout_secs(mut self, secs: u64) -> Self {
        self.config.upload_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Gdocs2BlogError> {
        let c = &self.config;
        if !c.export_url_template.contains("{id}") {
            return Err(Gdocs2BlogError::InvalidConfig(format!(
                "export URL template must contain '{{id}}', got '{}'",
                c.export_url_template
            )));
        }
        if c.untitled_title.trim().is_empty() || c.uncategorized.trim().is_empty() {
            return Err(Gdocs2BlogError::InvalidConfig(
                "fallback title and category must not be empty".into(),
            ));
        }
        if c.default_cover_image.trim().is_empty() {
            return Err(Gdocs2BlogError::InvalidConfig(
                "default cover image must not be empty".into(),
            ));
        }
        if c.fetch_timeout_secs == 0 || c.upload_timeout_secs == 0 || c.api_timeout_secs == 0 {
            return Err(Gdocs2BlogError::InvalidConfig(
                "timeouts must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
