// ============================================================
// Layer 5 — Multi-label Model
// ============================================================
// Encoder + decoder over one shared embedding table:
//
//   tokens, mask ──► AveragingEncoder(table) ──► [b, d]
//                                                  │
//                                                  ▼
//                                   FeedForwardDecoder ──► [b, labels]
//
// Two named variants:
//   binary_relevance  — independent per-label classifiers
//   classifier_chain  — label i also sees labels 0..i
//
// Reference: Read et al. (2011) Classifier Chains for Multi-label
//            Classification

use burn::{module::Ignored, prelude::*};

use crate::data::batcher::ClassificationBatch;
use crate::domain::config::{LossKind, ModelConfig};
use crate::ml::decoder::{DecodeMode, FeedForwardDecoder, LabelDecoder, LabelDependency};
use crate::ml::embedding::EmbeddingTable;
use crate::ml::encoder::{AveragingEncoder, TextEncoder};
use crate::ml::loss::LabelLoss;

#[derive(Module, Debug)]
pub struct MultiLabelModel<B: Backend> {
    embeddings: EmbeddingTable<B>,
    encoder:    Ignored<AveragingEncoder>,
    decoder:    FeedForwardDecoder<B>,
}

impl<B: Backend> MultiLabelModel<B> {
    pub fn new(
        embeddings: EmbeddingTable<B>,
        encoder:    AveragingEncoder,
        decoder:    FeedForwardDecoder<B>,
    ) -> Self {
        Self { embeddings, encoder: Ignored(encoder), decoder }
    }

    pub fn embeddings(&self) -> &EmbeddingTable<B> {
        &self.embeddings
    }

    pub fn encoder(&self) -> &AveragingEncoder {
        &self.encoder
    }

    pub fn decoder(&self) -> &FeedForwardDecoder<B> {
        &self.decoder
    }

    pub fn num_labels(&self) -> usize {
        self.decoder.num_labels()
    }

    pub fn loss_kind(&self) -> LossKind {
        self.decoder.loss()
    }

    /// tokens, mask: [batch, width] → [batch, d]
    pub fn represent(&self, tokens: Tensor<B, 2, Int>, mask: Tensor<B, 2>) -> Tensor<B, 2> {
        self.encoder.encode(&self.embeddings, tokens, mask)
    }

    /// Raw per-label scores — shape: [batch, labels]
    pub fn scores(&self, tokens: Tensor<B, 2, Int>, mask: Tensor<B, 2>, mode: DecodeMode<B>) -> Tensor<B, 2> {
        let representation = self.represent(tokens, mask);
        self.decoder.scores(representation, mode)
    }

    /// Training forward pass: chained labels see the ground truth.
    pub fn forward_train(&self, batch: &ClassificationBatch<B>) -> Tensor<B, 2> {
        let mode = DecodeMode::Training { targets: batch.targets.clone() };
        self.scores(batch.tokens.clone(), batch.mask.clone(), mode)
    }

    /// Inference forward pass: probabilities or margins per label.
    pub fn forward_infer(&self, tokens: Tensor<B, 2, Int>, mask: Tensor<B, 2>) -> Tensor<B, 2> {
        let representation = self.represent(tokens, mask);
        self.decoder.decode(representation, DecodeMode::Inference)
    }

    /// Mean loss of a training batch with its raw scores.
    pub fn forward_loss(&self, batch: &ClassificationBatch<B>, loss: &LabelLoss<B>) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let scores = self.forward_train(batch);
        (loss.forward(scores.clone(), batch.targets.clone()), scores)
    }
}

fn build<B: Backend>(
    config:     &ModelConfig,
    num_labels: usize,
    embeddings: EmbeddingTable<B>,
    dependency: LabelDependency,
    device:     &B::Device,
) -> MultiLabelModel<B> {
    let encoder = AveragingEncoder::new(config.max_words);
    let decoder = FeedForwardDecoder::new(
        encoder.output_dim(&embeddings),
        num_labels,
        config.hidden_size,
        config.num_layers,
        dependency,
        config.loss(),
        device,
    );
    MultiLabelModel::new(embeddings, encoder, decoder)
}

/// Averaging encoder with one independent classifier per label.
pub fn binary_relevance<B: Backend>(
    config:     &ModelConfig,
    num_labels: usize,
    embeddings: EmbeddingTable<B>,
    device:     &B::Device,
) -> MultiLabelModel<B> {
    build(config, num_labels, embeddings, LabelDependency::Independent, device)
}

/// Averaging encoder with chained classifiers in label order.
pub fn classifier_chain<B: Backend>(
    config:     &ModelConfig,
    num_labels: usize,
    embeddings: EmbeddingTable<B>,
    device:     &B::Device,
) -> MultiLabelModel<B> {
    build(config, num_labels, embeddings, LabelDependency::Chained, device)
}

/// The variant `config.chain` selects.
pub fn model_for_config<B: Backend>(
    config:     &ModelConfig,
    num_labels: usize,
    embeddings: EmbeddingTable<B>,
    device:     &B::Device,
) -> MultiLabelModel<B> {
    if config.chain {
        classifier_chain(config, num_labels, embeddings, device)
    } else {
        binary_relevance(config, num_labels, embeddings, device)
    }
}
