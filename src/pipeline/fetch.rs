//! Raw document fetch: download a document's HTML export.
//!
//! A document that is not shared publicly, or that was deleted, often still
//! answers `200 OK` with a tiny placeholder page. [`check_plausible`] rejects
//! exports below a minimum length so those never reach translation.

use crate::config::ConversionConfig;
use crate::error::Gdocs2BlogError;
use async_trait::async_trait;
use tracing::{debug, info};

/// Returns the raw HTML export of a document.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch_html(&self, doc_id: &str) -> Result<String, Gdocs2BlogError>;
}

/// [`DocumentSource`] that downloads the public HTML export over HTTP.
pub struct GoogleDocsExporter {
    client: reqwest::Client,
    config: ConversionConfig,
}

impl GoogleDocsExporter {
    pub fn new(config: &ConversionConfig) -> Result<Self, Gdocs2BlogError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| Gdocs2BlogError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl DocumentSource for GoogleDocsExporter {
    async fn fetch_html(&self, doc_id: &str) -> Result<String, Gdocs2BlogError> {
        let url = self.config.export_url(doc_id);
        info!("Fetching document export: {}", url);

        let transport_error = |e: reqwest::Error| {
            if e.is_timeout() {
                Gdocs2BlogError::FetchTimeout {
                    doc_id: doc_id.to_string(),
                    secs: self.config.fetch_timeout_secs,
                }
            } else {
                Gdocs2BlogError::FetchFailed {
                    doc_id: doc_id.to_string(),
                    reason: e.to_string(),
                }
            }
        };

        let response = self.client.get(&url).send().await.map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Gdocs2BlogError::Fetch {
                doc_id: doc_id.to_string(),
                status: response.status().as_u16(),
            });
        }

        let html = response.text().await.map_err(transport_error)?;
        check_plausible(doc_id, &html, self.config.min_document_len)?;

        debug!("Fetched {} bytes for {}", html.len(), doc_id);
        Ok(html)
    }
}

/// Reject exports shorter than `min_len` bytes.
pub fn check_plausible(doc_id: &str, html: &str, min_len: usize) -> Result<(), Gdocs2BlogError> {
    if html.len() < min_len {
        return Err(Gdocs2BlogError::EmptyDocument {
            doc_id: doc_id.to_string(),
            len: html.len(),
            min: min_len,
        });
    }
    Ok(())
}
