//! Asset relocation: move embedded images to a durable host.
//!
//! Export image URLs (`lh*.googleusercontent.com/...`) are short-lived, so
//! every image is re-uploaded to the image host and its references in the
//! Markdown are rewritten. The first image that uploads successfully becomes
//! the post's cover image.
//!
//! ## Why one at a time?
//!
//! Uploads are awaited in document order. Besides staying clear of the host's
//! burst limits, it is what makes "first successful upload" well defined.

use crate::config::{CloudinaryConfig, ConversionConfig};
use crate::dom::ParsedDocument;
use crate::error::UploadError;
use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Uploads an image by URL and returns its durable URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, source_url: &str) -> Result<String, UploadError>;
}

/// Result of relocating a document's images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocatedAssets {
    /// Markdown with every relocated URL rewritten.
    pub markdown: String,
    /// First durable URL, or the configured default.
    pub cover_image: String,
    /// `(original, durable)` pairs in upload order.
    pub relocated: Vec<(String, String)>,
    /// Per-image failures; those images keep their original URL.
    pub failures: Vec<UploadError>,
}

/// Upload every image of `doc` and rewrite its URL in `markdown`.
///
/// Never fails: a failed upload is logged, recorded in
/// [`RelocatedAssets::failures`], and leaves that reference untouched.
pub async fn relocate_assets(
    doc: &ParsedDocument,
    markdown: String,
    host: &dyn ImageHost,
    default_cover: &str,
) -> RelocatedAssets {
    let sources: Vec<Option<String>> = doc
        .find_paths(|e| e.is("img"))
        .iter()
        .filter_map(|p| doc.element_at(p))
        .map(|img| {
            img.attr("src")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect();

    let mut markdown = markdown;
    let mut cover: Option<String> = None;
    let mut relocated = Vec::new();
    let mut failures = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for source in sources {
        let Some(url) = source else {
            warn!("Skipping <img> without a source URL");
            failures.push(UploadError::MissingSource);
            continue;
        };
        // Every occurrence was rewritten the first time round.
        if !seen.insert(url.clone()) {
            debug!("Image already relocated: {}", url);
            continue;
        }

        info!("Uploading image: {}", url);
        match host.upload(&url).await {
            Ok(durable) => {
                info!("Image relocated: {}", durable);
                markdown = markdown.replace(&url, &durable);
                if cover.is_none() {
                    cover = Some(durable.clone());
                }
                relocated.push((url, durable));
            }
            Err(e) => {
                warn!("Image upload failed, keeping original URL: {}", e);
                failures.push(e);
            }
        }
    }

    RelocatedAssets {
        markdown,
        cover_image: cover.unwrap_or_else(|| default_cover.to_string()),
        relocated,
        failures,
    }
}

// ── Cloudinary ───────────────────────────────────────────────────────────────

/// [`ImageHost`] backed by Cloudinary's upload API.
///
/// Cloudinary fetches the remote URL itself, so no image bytes pass through
/// this process. With `api_key` + `api_secret` the request is signed
/// (SHA-256 over the sorted parameters); with only `upload_preset` it is an
/// unsigned upload.
pub struct CloudinaryHost {
    client: reqwest::Client,
    settings: CloudinaryConfig,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryHost {
    pub fn new(config: &ConversionConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.upload_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            settings: config.cloudinary.clone(),
        })
    }

    fn endpoint(cloud_name: &str) -> String {
        format!("https://api.cloudinary.com/v1_1/{cloud_name}/image/upload")
    }

    /// Form fields for one upload, signed when credentials are present.
    fn form_fields(&self, source_url: &str, timestamp: u64) -> Result<Vec<(String, String)>, UploadError> {
        let s = &self.settings;
        let mut params: Vec<(String, String)> = Vec::new();
        if let Some(folder) = &s.folder {
            params.push(("folder".into(), folder.clone()));
        }

        match (&s.api_key, &s.api_secret, &s.upload_preset) {
            (Some(key), Some(secret), preset) => {
                if let Some(preset) = preset {
                    params.push(("upload_preset".into(), preset.clone()));
                }
                params.push(("timestamp".into(), timestamp.to_string()));
                let signature = sign_params(&params, secret);
                params.push(("api_key".into(), key.clone()));
                params.push(("signature".into(), signature));
                params.push(("signature_algorithm".into(), "sha256".into()));
            }
            (_, _, Some(preset)) => params.push(("upload_preset".into(), preset.clone())),
            _ => return Err(UploadError::NotConfigured),
        }

        params.push(("file".into(), source_url.to_string()));
        Ok(params)
    }
}

/// Cloudinary request signature: `k=v` pairs sorted by key, joined with
/// `&`, secret appended, SHA-256, lower-case hex.
pub fn sign_params(params: &[(String, String)], secret: &str) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    hex::encode(Sha256::digest(format!("{joined}{secret}").as_bytes()))
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, source_url: &str) -> Result<String, UploadError> {
        let cloud_name = self
            .settings
            .cloud_name
            .as_deref()
            .ok_or(UploadError::NotConfigured)?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let fields = self.form_fields(source_url, timestamp)?;

        let response = self
            .client
            .post(Self::endpoint(cloud_name))
            .form(&fields)
            .send()
            .await
            .map_err(|e| UploadError::Transport {
                url: source_url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| UploadError::Transport {
            url: source_url.to_string(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(UploadError::Rejected {
                url: source_url.to_string(),
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: UploadResponse =
            serde_json::from_str(&body).map_err(|e| UploadError::MalformedResponse {
                url: source_url.to_string(),
                detail: e.to_string(),
            })?;
        parsed
            .secure_url
            .or(parsed.url)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| UploadError::MalformedResponse {
                url: source_url.to_string(),
                detail: "response has no secure_url".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Maps source URL → durable URL; unknown URLs fail.
    struct MapHost {
        map: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl MapHost {
        fn new(pairs: &[(&str, &str)]) -> Self {
            Self {
                map: pairs
                    .iter()
                    .map(|(a, b)| (a.to_string(), b.to_string()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ImageHost for MapHost {
        async fn upload(&self, source_url: &str) -> Result<String, UploadError> {
            self.calls.lock().unwrap().push(source_url.to_string());
            self.map
                .get(source_url)
                .cloned()
                .ok_or_else(|| UploadError::Rejected {
                    url: source_url.to_string(),
                    status: 400,
                    detail: "nope".into(),
                })
        }
    }

    #[tokio::test]
    async fn first_successful_upload_is_cover() {
        let doc = ParsedDocument::parse(
            "<body><img src=\"https://a/bad.png\"><img src=\"https://a/1.png\"><img src=\"https://a/2.png\"></body>",
        );
        let md = "![](https://a/bad.png) ![](https://a/1.png) ![](https://a/2.png)".to_string();
        let host = MapHost::new(&[
            ("https://a/1.png", "https://cdn/1.png"),
            ("https://a/2.png", "https://cdn/2.png"),
        ]);

        let out = relocate_assets(&doc, md, &host, "/default.jpg").await;

        assert_eq!(out.cover_image, "https://cdn/1.png");
        assert_eq!(
            out.markdown,
            "![](https://a/bad.png) ![](https://cdn/1.png) ![](https://cdn/2.png)"
        );
        assert_eq!(out.failures.len(), 1);
        assert_eq!(
            *host.calls.lock().unwrap(),
            vec!["https://a/bad.png", "https://a/1.png", "https://a/2.png"]
        );
    }

    #[tokio::test]
    async fn every_occurrence_is_replaced_and_duplicates_upload_once() {
        let doc = ParsedDocument::parse(
            "<body><img src=\"https://a/x.png\"><p>again</p><img src=\"https://a/x.png\"></body>",
        );
        let md = "![](https://a/x.png)\n\nagain\n\n![](https://a/x.png)".to_string();
        let host = MapHost::new(&[("https://a/x.png", "https://cdn/x.png")]);

        let out = relocate_assets(&doc, md, &host, "/default.jpg").await;

        assert!(!out.markdown.contains("https://a/x.png"));
        assert_eq!(out.markdown.matches("https://cdn/x.png").count(), 2);
        assert_eq!(host.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn no_images_uses_default_cover() {
        let doc = ParsedDocument::parse("<body><p>text</p></body>");
        let host = MapHost::new(&[]);
        let out = relocate_assets(&doc, "text".into(), &host, "/default.jpg").await;
        assert_eq!(out.cover_image, "/default.jpg");
        assert!(out.relocated.is_empty());
        assert!(out.failures.is_empty());
    }

    #[tokio::test]
    async fn image_without_src_is_recorded_and_skipped() {
        let doc = ParsedDocument::parse("<body><img alt=\"x\"></body>");
        let host = MapHost::new(&[]);
        let out = relocate_assets(&doc, "x".into(), &host, "/d.jpg").await;
        assert_eq!(out.failures, vec![UploadError::MissingSource]);
        assert!(host.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn signature_sorts_params_and_appends_secret() {
        let params = vec![
            ("timestamp".to_string(), "1315060510".to_string()),
            ("folder".to_string(), "blog".to_string()),
        ];
        let expected = hex::encode(Sha256::digest(b"folder=blog&timestamp=1315060510abcd"));
        assert_eq!(sign_params(&params, "abcd"), expected);
    }

    #[test]
    fn unconfigured_host_refuses() {
        let host = CloudinaryHost::new(&ConversionConfig::default()).unwrap();
        assert_eq!(
            host.form_fields("https://a/1.png", 1),
            Err(UploadError::NotConfigured)
        );
    }

    #[test]
    fn unsigned_upload_uses_preset_only() {
        let config = ConversionConfig::builder()
            .cloudinary(CloudinaryConfig {
                cloud_name: Some("demo".into()),
                upload_preset: Some("blog_unsigned".into()),
                ..Default::default()
            })
            .build()
            .unwrap();
        let host = CloudinaryHost::new(&config).unwrap();
        let fields = host.form_fields("https://a/1.png", 1).unwrap();
        assert!(fields.contains(&("upload_preset".into(), "blog_unsigned".into())));
        assert!(!fields.iter().any(|(k, _)| k == "signature"));
    }
}
