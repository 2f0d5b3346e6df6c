//! Artifact Manifest - what a training run wrote, and how to verify it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Bump when the on-disk artifact format changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Written last by `ArtifactStore::save`; its presence marks a complete set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub format_version: u32,
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub feature_version: u8,
    pub layout_hash: u32,
    /// Columns of the combined feature matrix
    pub feature_width: usize,
    pub backend: String,
    pub transform_sha256: String,
    pub model_sha256: String,
}

/// Each artifact file carries the run that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEnvelope<T> {
    pub run_id: Uuid,
    pub body: T,
}

/// Hex SHA-256 of raw file bytes
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
