//! Error types for the gdocs2blog library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`Gdocs2BlogError`] — **Fatal to one document**: the conversion of that
//!   document cannot proceed (export unreachable, export too short, nothing
//!   left after translation, output not writable). The batch layer records
//!   it in a failed [`crate::convert::ConversionOutcome`] and moves on. A few
//!   variants (state files, configuration) are fatal to the whole run.
//!
//! * [`UploadError`] — **Non-fatal, per image**: one image could not be
//!   relocated. The original reference stays in the Markdown and the next
//!   image is tried.
//!
//! * [`RefinementError`] — **Non-fatal, per document**: the refinement
//!   service failed and the unrefined Markdown is used as-is.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the gdocs2blog library.
#[derive(Debug, Error)]
pub enum Gdocs2BlogError {
    // ── Fetch errors ──────────────────────────────────────────────────────
    /// The export endpoint answered with a non-success status.
    #[error("Failed to fetch document '{doc_id}': HTTP {status}\nCheck the document is shared as \"anyone with the link\".")]
    Fetch { doc_id: String, status: u16 },

    /// The export request never produced a response.
    #[error("Failed to fetch document '{doc_id}': {reason}")]
    FetchFailed { doc_id: String, reason: String },

    /// The export request exceeded the configured timeout.
    #[error("Fetching document '{doc_id}' timed out after {secs}s\nIncrease --fetch-timeout.")]
    FetchTimeout { doc_id: String, secs: u64 },

    /// The export succeeded but is too short to be a real document.
    #[error("Document '{doc_id}' export is only {len} bytes (minimum {min}); the export is probably not real content")]
    EmptyDocument { doc_id: String, len: usize, min: usize },

    // ── Translation errors ────────────────────────────────────────────────
    /// HTML → Markdown translation produced nothing.
    #[error("Markdown translation produced no content; the exported HTML is probably malformed")]
    EmptyContent,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory or write the Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── State file errors ─────────────────────────────────────────────────
    /// Tracked mode was selected but the pending list does not exist.
    #[error("Pending list '{path}' does not exist.\nCreate it with a JSON array of document IDs, or pass IDs as an argument.")]
    PendingListMissing { path: PathBuf },

    /// The pending list exists but holds no IDs.
    #[error("Pending list '{path}' contains no document IDs")]
    NoPendingIds { path: PathBuf },

    /// A state file could not be read, parsed, or written.
    #[error("State file '{path}': {reason}")]
    StateFile { path: PathBuf, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The refinement provider could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image upload.
///
/// Recorded in [`crate::pipeline::assets::RelocatedAssets::failures`]; the
/// image keeps its original URL in the Markdown.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    /// The image node has no usable `src`.
    #[error("image has no source URL")]
    MissingSource,

    /// The upload request failed before a response arrived.
    #[error("upload of '{url}' failed: {reason}")]
    Transport { url: String, reason: String },

    /// The image host refused the upload.
    #[error("upload of '{url}' rejected with HTTP {status}: {detail}")]
    Rejected {
        url: String,
        status: u16,
        detail: String,
    },

    /// The image host answered but the body carried no durable URL.
    #[error("upload of '{url}' returned a malformed response: {detail}")]
    MalformedResponse { url: String, detail: String },

    /// Neither signed credentials nor an upload preset are configured.
    #[error("image host is not configured (set CLOUDINARY_CLOUD_NAME and credentials or an upload preset)")]
    NotConfigured,
}

/// A non-fatal error from the refinement service.
///
/// Carried by [`crate::pipeline::refine::Refinement::Unchanged`] next to the
/// original Markdown.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefinementError {
    /// The provider call failed (network, auth, non-success status).
    #[error("refinement call failed: {0}")]
    Provider(String),

    /// The provider answered with no usable text.
    #[error("refinement returned an empty response")]
    EmptyResponse,

    /// The provider call exceeded the configured timeout.
    #[error("refinement timed out after {secs}s")]
    Timeout { secs: u64 },
}
