// ============================================================
// Layer 5 — Predictor
// ============================================================
// Loads a saved model and labels new documents:
//
//   text ─► Preprocessor ─► tokenizer ─► model (inference mode)
//        ─► one score per label ─► score > cutoff ⇒ label present
//
// The cutoff is fixed by the loss the model was trained with:
// probability 0.5 for cross-entropy, margin 0 for hinge. Chained
// models condition each label on the thresholded predictions of
// the labels before it.

use anyhow::Result;
use burn::prelude::*;

use crate::data::batcher::ClassificationBatcher;
use crate::data::preprocessor::Preprocessor;
use crate::domain::config::ModelConfig;
use crate::domain::labels::LabelSet;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::tokenizer_store::{TextTokenizer, TokenizerStore};
use crate::ml::embedding::EmbeddingTable;
use crate::ml::model::{model_for_config, MultiLabelModel};

/// Score and decision for one label of one document.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    pub label:    String,
    /// Probability (cross-entropy) or margin (hinge)
    pub score:    f32,
    pub decision: bool,
}

pub struct Predictor<B: Backend> {
    model:        MultiLabelModel<B>,
    labels:       LabelSet,
    tokenizer:    TextTokenizer,
    config:       ModelConfig,
    preprocessor: Preprocessor,
}

impl<B: Backend> Predictor<B> {
    pub fn new(model: MultiLabelModel<B>, labels: LabelSet, tokenizer: TextTokenizer, config: ModelConfig) -> Self {
        Self { model, labels, tokenizer, config, preprocessor: Preprocessor::new() }
    }

    /// Rebuild the model described by the checkpoint's manifest and
    /// load its best weights.
    pub fn from_checkpoint(ckpt: &CheckpointManager, device: &B::Device) -> Result<Self> {
        let manifest = ckpt.load_manifest()?;
        let table = EmbeddingTable::new(
            manifest.embedding_rows,
            manifest.embedding_dim,
            !manifest.config.fixed_emb,
            device,
        );
        let empty = model_for_config(&manifest.config, manifest.labels.len(), table, device);
        let model = ckpt.load_weights(empty, device)?;
        let tokenizer = TokenizerStore::new(ckpt.dir()).load()?;

        tracing::info!(
            "Loaded model '{}' ({} labels) from '{}'",
            manifest.config.model_name(),
            manifest.labels.len(),
            ckpt.dir().display()
        );
        Ok(Self::new(model, manifest.labels, tokenizer, manifest.config))
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn predict(&self, text: &str) -> Result<Vec<LabelScore>> {
        let mut all = self.predict_batch(&[text])?;
        Ok(all.pop().unwrap_or_default())
    }

    pub fn predict_batch(&self, texts: &[&str]) -> Result<Vec<Vec<LabelScore>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let token_ids: Vec<Vec<u32>> = texts
            .iter()
            .map(|t| self.tokenizer.encode(&self.preprocessor.clean(t)))
            .collect::<Result<_>>()?;
        let docs: Vec<&[u32]> = token_ids.iter().map(Vec::as_slice).collect();

        let batcher = ClassificationBatcher::<B>::new(self.model.embeddings().device(), self.config.max_words);
        let (tokens, mask) = batcher.tokens(&docs);
        let scores = self
            .model
            .forward_infer(tokens, mask)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read scores back: {e:?}"))?;

        let cutoff = self.config.loss().output_threshold() as f32;
        let num_labels = self.labels.len();
        Ok(scores
            .chunks(num_labels)
            .map(|row| {
                row.iter()
                    .zip(self.labels.names())
                    .map(|(&score, label)| LabelScore {
                        label: label.clone(),
                        score,
                        decision: score > cutoff,
                    })
                    .collect()
            })
            .collect())
    }
}
