// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Labels free text with a model saved by an earlier `train` run:
//
//   Step 1: Resolve <data_dir>/models/<name>    (Layer 6 - infra)
//   Step 2: Load manifest, weights, tokenizer   (Layer 5 - ml)
//   Step 3: Score every label                   (Layer 5 - ml)

use anyhow::{Context, Result};
use burn::prelude::*;
use std::path::Path;

use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::{LabelScore, Predictor};

pub struct PredictUseCase<B: Backend> {
    predictor: Predictor<B>,
}

impl<B: Backend> PredictUseCase<B> {
    pub fn new(data_dir: impl AsRef<Path>, model_name: &str) -> Result<Self> {
        let ckpt = CheckpointManager::for_model(data_dir, model_name);
        let predictor = Predictor::from_checkpoint(&ckpt, &B::Device::default())
            .with_context(|| format!("Cannot load model '{model_name}'. Was it trained with --save?"))?;
        Ok(Self { predictor })
    }

    pub fn predict(&self, text: &str) -> Result<Vec<LabelScore>> {
        self.predictor.predict(text)
    }

    /// Names of the labels predicted present.
    pub fn labels_for(&self, text: &str) -> Result<Vec<String>> {
        Ok(self
            .predict(text)?
            .into_iter()
            .filter(|s| s.decision)
            .map(|s| s.label)
            .collect())
    }
}
