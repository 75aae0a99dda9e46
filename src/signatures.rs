// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Signature Store
 * Loads, caches, and persists per-category detection pattern documents
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::errors::SignatureError;

pub const DEFAULT_CONFIDENCE: u32 = 2;

fn default_confidence() -> u32 {
    DEFAULT_CONFIDENCE
}

/// One named technology signature: evidence patterns keyed by channel,
/// hard include/exclude gates, and an optional version-capture regex.
/// Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub html: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub js: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub favicon: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub titles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_have: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_not_have: Vec<String>,
    /// Regex with one capture group; applied per the channel precedence in
    /// the evidence matcher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_pattern: Option<String>,
    /// Required evidence score. Only the camera detector honors this per
    /// signature; the scored detectors use the fixed 1-or-2 threshold.
    #[serde(default = "default_confidence")]
    pub confidence: u32,
}

impl Default for Signature {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            html: Vec::new(),
            urls: Vec::new(),
            cookies: Vec::new(),
            js: Vec::new(),
            favicon: Vec::new(),
            titles: Vec::new(),
            must_have: Vec::new(),
            must_not_have: Vec::new(),
            version_pattern: None,
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

/// A category's named signatures, as loaded from one JSON document.
pub type SignatureSet = BTreeMap<String, Signature>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMethod {
    #[default]
    Content,
    Extension,
    Redirect,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Verification {
    #[serde(default)]
    pub method: VerificationMethod,
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Probing spec for one sensitive-file type: candidate paths plus how a 200
/// response is confirmed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensitiveFileSignature {
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub verification: Verification,
}

pub type SensitiveFileSet = BTreeMap<String, SensitiveFileSignature>;

/// Loads one pattern-set document per category, lazily, caching after the
/// first load. Missing or malformed documents degrade to an empty set for
/// that category -- reported, never fatal to a scan.
pub struct SignatureStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<SignatureSet>>>,
    sensitive_cache: RwLock<Option<Arc<SensitiveFileSet>>>,
}

impl SignatureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("Could not create signatures directory {:?}: {}", dir, e);
        }
        Self {
            dir,
            cache: RwLock::new(HashMap::new()),
            sensitive_cache: RwLock::new(None),
        }
    }

    fn document_path(&self, category: &str) -> PathBuf {
        self.dir.join(format!("{category}.json"))
    }

    /// Signatures for one category. Load failures log and return an empty
    /// set so the scan continues with reduced coverage.
    pub fn load(&self, category: &str) -> Arc<SignatureSet> {
        if let Some(cached) = self.cache.read().get(category) {
            return Arc::clone(cached);
        }

        match self.read_document::<SignatureSet>(category) {
            Ok(set) => {
                debug!("Loaded {} signatures for category {}", set.len(), category);
                let set = Arc::new(set);
                self.cache
                    .write()
                    .insert(category.to_string(), Arc::clone(&set));
                set
            }
            Err(SignatureError::NotFound { path }) => {
                warn!("Signature file not found: {:?}", path);
                Arc::new(SignatureSet::new())
            }
            Err(e) => {
                error!("Failed to load {} signatures: {}", category, e);
                Arc::new(SignatureSet::new())
            }
        }
    }

    /// The sensitive-file probing document (`sensitive_files.json`), with the
    /// same degrade-to-empty behavior as category loads.
    pub fn sensitive_files(&self) -> Arc<SensitiveFileSet> {
        if let Some(cached) = self.sensitive_cache.read().as_ref() {
            return Arc::clone(cached);
        }

        let set = match self.read_document::<SensitiveFileSet>("sensitive_files") {
            Ok(set) => Arc::new(set),
            Err(SignatureError::NotFound { path }) => {
                warn!("Signature file not found: {:?}", path);
                Arc::new(SensitiveFileSet::new())
            }
            Err(e) => {
                error!("Failed to load sensitive file signatures: {}", e);
                Arc::new(SensitiveFileSet::new())
            }
        };

        *self.sensitive_cache.write() = Some(Arc::clone(&set));
        set
    }

    /// Merges a named signature into a category's document and persists it.
    pub fn add(
        &self,
        category: &str,
        name: &str,
        signature: Signature,
    ) -> Result<(), SignatureError> {
        let mut set = (*self.load(category)).clone();
        set.insert(name.to_string(), signature);

        let path = self.document_path(category);
        let body = serde_json::to_string_pretty(&set).map_err(|source| {
            SignatureError::Malformed {
                path: path.clone(),
                source,
            }
        })?;
        std::fs::write(&path, body).map_err(|source| SignatureError::Persist {
            path: path.clone(),
            source,
        })?;

        self.cache
            .write()
            .insert(category.to_string(), Arc::new(set));
        info!("Added signature {} to {}", name, category);
        Ok(())
    }

    fn read_document<T: serde::de::DeserializeOwned>(
        &self,
        category: &str,
    ) -> Result<T, SignatureError> {
        let path = self.document_path(category);
        if !path.exists() {
            return Err(SignatureError::NotFound { path });
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| SignatureError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| SignatureError::Malformed { path, source })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
