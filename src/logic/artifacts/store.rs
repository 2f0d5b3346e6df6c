//! Artifact Store - durable fitted transform + model
//!
//! Layout of the model directory:
//! - `transform.json`  fitted scaler / encoder / vectorizer
//! - `model.json`      trained classifier
//! - `manifest.json`   run id, checksums, feature width (written last)
//!
//! A missing set is `Ok(None)`, never an error.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::manifest::{sha256_hex, ArtifactEnvelope, ArtifactManifest, ARTIFACT_FORMAT_VERSION};
use crate::constants::{MANIFEST_FILE, MODEL_FILE, TRANSFORM_FILE};
use crate::error::{TriageError, TriageResult};
use crate::logic::model::TrainedModel;
use crate::logic::transform::FittedTransform;

/// A verified, mutually consistent artifact set
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub manifest: ArtifactManifest,
    pub transform: FittedTransform,
    pub model: TrainedModel,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True when a complete set has been written
    pub fn exists(&self) -> bool {
        self.dir.join(MANIFEST_FILE).exists()
    }

    // ------------------------------------------------------------------------
    // SAVE
    // ------------------------------------------------------------------------

    /// Persist transform + model. Either every file is replaced or none is.
    pub fn save(
        &self,
        transform: &FittedTransform,
        model: &TrainedModel,
    ) -> TriageResult<ArtifactManifest> {
        if model.n_features() != transform.width() {
            return Err(TriageError::TransformMismatch {
                expected: model.n_features(),
                actual: transform.width(),
            });
        }

        fs::create_dir_all(&self.dir)?;

        let run_id = Uuid::new_v4();
        let transform_bytes = encode(run_id, transform)?;
        let model_bytes = encode(run_id, model)?;

        let manifest = ArtifactManifest {
            format_version: ARTIFACT_FORMAT_VERSION,
            run_id,
            created_at: chrono::Utc::now(),
            feature_version: transform.feature_version,
            layout_hash: transform.layout_hash,
            feature_width: transform.width(),
            backend: model.backend_name().to_string(),
            transform_sha256: sha256_hex(&transform_bytes),
            model_sha256: sha256_hex(&model_bytes),
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;

        let staged = [
            (TRANSFORM_FILE, transform_bytes),
            (MODEL_FILE, model_bytes),
            (MANIFEST_FILE, manifest_bytes),
        ];

        for (name, bytes) in &staged {
            if let Err(e) = fs::write(self.temp_path(name), bytes) {
                self.discard_temps();
                return Err(e.into());
            }
        }

        if let Err(e) = self.commit(staged.iter().map(|(name, _)| *name)) {
            log::error!("Failed to commit artifacts in {}: {}", self.dir.display(), e);
            self.discard_temps();
            return Err(e);
        }

        log::info!(
            "Saved artifacts to {} (run {}, {} features, {})",
            self.dir.display(),
            manifest.run_id,
            manifest.feature_width,
            manifest.backend
        );

        Ok(manifest)
    }

    /// Move staged files into place, manifest last.
    /// Readers see "no model" rather than a half-replaced set.
    fn commit<'n>(&self, names: impl Iterator<Item = &'n str>) -> TriageResult<()> {
        remove_if_exists(&self.dir.join(MANIFEST_FILE))?;
        for name in names {
            fs::rename(self.temp_path(name), self.dir.join(name))?;
        }
        Ok(())
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.tmp", name))
    }

    fn discard_temps(&self) {
        for name in [TRANSFORM_FILE, MODEL_FILE, MANIFEST_FILE] {
            let _ = fs::remove_file(self.temp_path(name));
        }
    }

    // ------------------------------------------------------------------------
    // LOAD
    // ------------------------------------------------------------------------

    pub fn load_manifest(&self) -> TriageResult<Option<ArtifactManifest>> {
        match read_optional(&self.dir.join(MANIFEST_FILE))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load and verify the full set; `Ok(None)` when nothing usable is on disk
    pub fn load(&self) -> TriageResult<Option<ArtifactSet>> {
        let Some(manifest) = self.load_manifest()? else {
            log::warn!("No trained model in {}", self.dir.display());
            return Ok(None);
        };

        if manifest.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(TriageError::Artifact(format!(
                "unsupported artifact format v{} (expected v{})",
                manifest.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }

        let Some(transform) =
            self.read_verified::<FittedTransform>(TRANSFORM_FILE, &manifest.transform_sha256, manifest.run_id)?
        else {
            log::warn!("{} missing in {}", TRANSFORM_FILE, self.dir.display());
            return Ok(None);
        };
        let Some(model) =
            self.read_verified::<TrainedModel>(MODEL_FILE, &manifest.model_sha256, manifest.run_id)?
        else {
            log::warn!("{} missing in {}", MODEL_FILE, self.dir.display());
            return Ok(None);
        };

        transform.validate()?;
        if model.n_features() != transform.width() || manifest.feature_width != transform.width() {
            return Err(TriageError::TransformMismatch {
                expected: model.n_features(),
                actual: transform.width(),
            });
        }

        log::info!(
            "Loaded artifacts (run {}, created {}, {} features, {})",
            manifest.run_id,
            manifest.created_at,
            manifest.feature_width,
            manifest.backend
        );

        Ok(Some(ArtifactSet { manifest, transform, model }))
    }

    fn read_verified<T: DeserializeOwned>(
        &self,
        name: &str,
        expected_sha: &str,
        run_id: Uuid,
    ) -> TriageResult<Option<T>> {
        let Some(bytes) = read_optional(&self.dir.join(name))? else {
            return Ok(None);
        };

        let actual_sha = sha256_hex(&bytes);
        if actual_sha != expected_sha {
            return Err(TriageError::Artifact(format!(
                "checksum mismatch for {}: manifest {}, file {}",
                name, expected_sha, actual_sha
            )));
        }

        let envelope: ArtifactEnvelope<T> = serde_json::from_slice(&bytes)?;
        if envelope.run_id != run_id {
            return Err(TriageError::Artifact(format!(
                "{} belongs to run {}, manifest is run {}",
                name, envelope.run_id, run_id
            )));
        }

        Ok(Some(envelope.body))
    }
}

fn encode<T: Serialize>(run_id: Uuid, body: &T) -> TriageResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(&ArtifactEnvelope { run_id, body })?)
}

fn read_optional(path: &Path) -> TriageResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_if_exists(path: &Path) -> TriageResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
