// ============================================================
// Layer 4 — Classification Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec of samples into
// tensors.
//
// Documents have different lengths, so each batch is padded to
// its own longest document (after truncation to max_words):
//
//   tokens:  [batch, width]   Int,   index 0 in padded slots
//   mask:    [batch, width]   Float, 1.0 real token / 0.0 padding
//   targets: [batch, labels]  Float
//
// The mask is what keeps padding out of the encoder's average.
// Index 0 also stands for unknown words, so the token id alone
// cannot tell padding apart from a real out-of-vocabulary token.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::ClassificationSample;
use crate::domain::vocabulary::UNKNOWN_INDEX;

/// A batch of documents ready for the encoder.
#[derive(Debug, Clone)]
pub struct ClassificationBatch<B: Backend> {
    /// Token ids — shape: [batch_size, width]
    pub tokens: Tensor<B, 2, Int>,

    /// Real-token mask — shape: [batch_size, width]
    pub mask: Tensor<B, 2>,

    /// Ground truth — shape: [batch_size, num_labels]
    pub targets: Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct ClassificationBatcher<B: Backend> {
    pub device:    B::Device,
    /// Leading tokens kept per document
    pub max_words: usize,
}

impl<B: Backend> ClassificationBatcher<B> {
    pub fn new(device: B::Device, max_words: usize) -> Self {
        Self { device, max_words }
    }

    /// Pad and mask token sequences without targets (used at inference).
    pub fn tokens(&self, documents: &[&[u32]]) -> (Tensor<B, 2, Int>, Tensor<B, 2>) {
        let batch_size = documents.len();
        // A width of at least one keeps all-empty batches well formed;
        // their mask is all zeros.
        let width = documents
            .iter()
            .map(|d| d.len().min(self.max_words))
            .max()
            .unwrap_or(0)
            .max(1);

        let mut ids  = Vec::with_capacity(batch_size * width);
        let mut mask = Vec::with_capacity(batch_size * width);
        for doc in documents {
            let kept = &doc[..doc.len().min(self.max_words)];
            ids.extend(kept.iter().map(|&t| t as i32));
            mask.extend(std::iter::repeat(1.0f32).take(kept.len()));
            for _ in kept.len()..width {
                ids.push(UNKNOWN_INDEX as i32);
                mask.push(0.0);
            }
        }

        let tokens = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device)
            .reshape([batch_size, width]);
        let mask = Tensor::<B, 1>::from_floats(mask.as_slice(), &self.device)
            .reshape([batch_size, width]);
        (tokens, mask)
    }
}

impl<B: Backend> Batcher<ClassificationSample, ClassificationBatch<B>> for ClassificationBatcher<B> {
    fn batch(&self, items: Vec<ClassificationSample>) -> ClassificationBatch<B> {
        let batch_size = items.len();
        // All samples were checked against the label set before batching
        let num_labels = items.first().map(|s| s.targets.len()).unwrap_or(0);

        let docs: Vec<&[u32]> = items.iter().map(|s| s.token_ids.as_slice()).collect();
        let (tokens, mask) = self.tokens(&docs);

        let targets_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.targets.iter().copied())
            .collect();
        let targets = Tensor::<B, 1>::from_floats(targets_flat.as_slice(), &self.device)
            .reshape([batch_size, num_labels]);

        ClassificationBatch { tokens, mask, targets }
    }
}
