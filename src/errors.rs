// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scanner Error Types
 * Error taxonomy for the reconnaissance pipeline
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::path::PathBuf;
use thiserror::Error;

/// Top-level scanner error. Per-domain pipeline stages surface these (or
/// anyhow-wrapped variants) to the orchestrator boundary, where they are
/// attached to the domain's report instead of aborting the run.
#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("Invalid target URL: {url}")]
    InvalidUrl { url: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Signature-document failures. Load failures degrade the affected category
/// to an empty set; only persistence failures propagate to the caller.
#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("Signature document not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Malformed signature document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read signature document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to persist signature document {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
