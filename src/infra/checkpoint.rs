// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Keeps the single best checkpoint of a named model.
//
// What gets saved:
//   1. model.mpk.gz    — all parameters (NamedMpkGzFileRecorder)
//   2. best.json       — epoch, metric and value it was saved at
//   3. manifest.json   — configuration, labels and table shape,
//                        enough to rebuild the model before
//                        loading the weights into it
//
// Layout:
//   <data_dir>/models/<model name>/
//     model.mpk.gz
//     best.json
//     manifest.json
//     tokenizer.json     ← TokenizerStore
//     metrics.csv        ← MetricsLogger
//
// A new best overwrites the previous one, so at most one
// checkpoint exists per model name. Weights go first and best.json
// last: best.json only ever describes weights already on disk.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::config::ModelConfig;
use crate::domain::labels::LabelSet;
use crate::domain::metric::ValidationMetric;
use crate::ml::model::MultiLabelModel;

const MODELS_DIR:    &str = "models";
const WEIGHTS_STEM:  &str = "model";
const BEST_FILE:     &str = "best.json";
const MANIFEST_FILE: &str = "manifest.json";

/// Where and when the best checkpoint was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestCheckpoint {
    pub epoch:  usize,
    pub metric: ValidationMetric,
    pub value:  f64,
}

/// Everything needed to rebuild an empty model of the right shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub config:         ModelConfig,
    pub labels:         LabelSet,
    pub embedding_rows: usize,
    pub embedding_dim:  usize,
}

type WeightsRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    /// `<data_dir>/models/<name>`
    pub fn for_model(data_dir: impl AsRef<Path>, name: &str) -> Self {
        Self::new(data_dir.as_ref().join(MODELS_DIR).join(name))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn weights_path(&self) -> PathBuf {
        // the recorder appends .mpk.gz
        self.dir.join(WEIGHTS_STEM)
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", self.dir.display()))
    }

    /// Overwrite the stored checkpoint with `model`.
    pub fn save_best<B: Backend>(&self, model: &MultiLabelModel<B>, best: &BestCheckpoint) -> Result<()> {
        self.ensure_dir()?;
        let path = self.weights_path();
        WeightsRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save weights to '{}'", path.display()))?;
        self.write_json(BEST_FILE, best)?;
        tracing::debug!(
            "Saved best checkpoint: epoch {} {}={:.4}",
            best.epoch,
            best.metric,
            best.value
        );
        Ok(())
    }

    /// Restore the stored weights into `model`, which must have the
    /// same shape as the one saved.
    pub fn load_weights<B: Backend>(
        &self,
        model:  MultiLabelModel<B>,
        device: &B::Device,
    ) -> Result<MultiLabelModel<B>> {
        let path = self.weights_path();
        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Has this model been trained with saving on?",
                    path.display())
            })?;
        Ok(model.load_record(record))
    }

    pub fn save_manifest(&self, manifest: &ModelManifest) -> Result<()> {
        self.ensure_dir()?;
        self.write_json(MANIFEST_FILE, manifest)
    }

    pub fn load_manifest(&self) -> Result<ModelManifest> {
        self.read_json(MANIFEST_FILE)
    }

    pub fn load_best(&self) -> Result<BestCheckpoint> {
        self.read_json(BEST_FILE)
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.dir.join(file);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed '{}'", path.display()))
    }
}
