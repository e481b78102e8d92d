// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Load the labelled corpus      (Layer 4 - data)
//   Step 2: Validate the configuration    (Layer 3 - domain)
//   Step 3: Load vectors, build trainer   (Layer 5 - ml)
//   Step 4: Train until finished          (Layer 5 - ml)
//
// The checkpoint, manifest, tokenizer and metrics CSV are written
// by the trainer itself when `save` is on.

use anyhow::{Context, Result};
use burn::tensor::backend::AutodiffBackend;
use std::path::{Path, PathBuf};

use crate::data::loader::JsonlDataset;
use crate::domain::config::ModelConfig;
use crate::domain::metric::ValidationMetric;
use crate::domain::traits::DatasetSource;
use crate::ml::trainer::Trainer;
use crate::ml::TrainingBackend;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub model_name:     String,
    pub metric:         ValidationMetric,
    pub best_value:     f64,
    pub best_epoch:     Option<usize>,
    pub epochs_run:     usize,
    pub checkpoint_dir: Option<PathBuf>,
}

pub struct TrainUseCase {
    data_dir: PathBuf,
    config:   ModelConfig,
}

impl TrainUseCase {
    pub fn new(data_dir: impl AsRef<Path>, config: ModelConfig) -> Self {
        Self { data_dir: data_dir.as_ref().to_path_buf(), config }
    }

    /// Run on the CLI backend.
    pub fn execute(&self) -> Result<TrainSummary> {
        self.execute_on::<TrainingBackend>()
    }

    pub fn execute_on<B: AutodiffBackend>(&self) -> Result<TrainSummary> {
        let cfg = &self.config;

        // ── Step 1: Load the corpus ───────────────────────────────────────────
        tracing::info!("Loading dataset from '{}'", self.data_dir.display());
        let splits = JsonlDataset::new(&self.data_dir, cfg.seed).fetch_dataset()?;
        if !splits.unused.is_empty() {
            tracing::debug!("Ignoring {} unused documents", splits.unused.len());
        }

        // ── Step 2: Reject bad configurations before any heavy loading ────────
        cfg.validate(&splits.labels)?;

        // ── Step 3: Vectors + model ───────────────────────────────────────────
        let mut trainer = Trainer::<B>::construct(&self.data_dir, splits.labels.clone(), cfg.clone())?;

        // ── Step 4: Train ─────────────────────────────────────────────────────
        let best_value = trainer
            .train(&splits.train, &splits.validation)
            .with_context(|| format!("Training '{}' failed", cfg.model_name()))?;

        let tracker = trainer.tracker();
        Ok(TrainSummary {
            model_name:     cfg.model_name(),
            metric:         cfg.metric,
            best_value,
            best_epoch:     tracker.best_epoch(),
            epochs_run:     tracker.history().len(),
            checkpoint_dir: cfg.save.then(|| trainer.checkpoint_dir().to_path_buf()),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use std::fs;

    /// A tiny corpus: vectors.vec, train.jsonl and test.jsonl.
    pub(crate) fn write_corpus(dir: &Path) {
        let words = ["wheat", "corn", "oil", "crude", "bank", "rate"];
        let mut vec_file = format!("{} 4\n", words.len());
        for (i, w) in words.iter().enumerate() {
            let row: Vec<String> = (0..4).map(|c| format!("{:.2}", ((i * 3 + c * 5) % 7) as f32 / 7.0 - 0.5)).collect();
            vec_file.push_str(&format!("{w} {}\n", row.join(" ")));
        }
        fs::write(dir.join("vectors.vec"), vec_file).unwrap();

        let docs = concat!(
            r#"{"text": "wheat rate", "labels": ["grain"]}"#, "\n",
            r#"{"text": "corn bank", "labels": ["grain"]}"#, "\n",
            r#"{"text": "crude oil", "labels": ["energy"]}"#, "\n",
            r#"{"text": "oil and wheat", "labels": ["energy", "grain"]}"#, "\n",
            r#"{"text": "bank rate", "labels": []}"#, "\n",
        );
        fs::write(dir.join("train.jsonl"), docs).unwrap();
        fs::write(dir.join("test.jsonl"), docs).unwrap();
    }

    pub(crate) fn small_config() -> ModelConfig {
        ModelConfig {
            embedding_dim: 4,
            hidden_size:   8,
            num_layers:    1,
            epochs:        2,
            batch_size:    2,
            verbose:       false,
            ..Default::default()
        }
    }

    #[test]
    fn test_trains_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let config = ModelConfig { save: true, ..small_config() };
        let summary = TrainUseCase::new(dir.path(), config)
            .execute_on::<Autodiff<NdArray>>()
            .unwrap();

        assert_eq!(summary.model_name, "mlp_layers-1_hidden-8_dim-4_epochs-2_batch-2");
        assert_eq!(summary.epochs_run, 2);
        assert!(summary.best_value.is_finite());
        let ckpt = summary.checkpoint_dir.unwrap();
        assert!(ckpt.join("best.json").exists());
    }

    #[test]
    fn test_bad_config_fails_before_training() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let config = ModelConfig { label_weights: Some(vec![1.0]), ..small_config() };
        let err = TrainUseCase::new(dir.path(), config)
            .execute_on::<Autodiff<NdArray>>()
            .unwrap_err();
        assert!(err.to_string().contains("label weights"));
    }

    #[test]
    fn test_missing_vectors_file() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        fs::remove_file(dir.path().join("vectors.vec")).unwrap();
        assert!(TrainUseCase::new(dir.path(), small_config())
            .execute_on::<Autodiff<NdArray>>()
            .is_err());
    }
}
