// ============================================================
// Layer 5 — Label Decoder
// ============================================================
// One small feed-forward classifier per label, all reading the
// same document representation:
//
//   representation [b, d]
//        │
//        ├──► classifier 0 ──► score 0
//        ├──► classifier 1 ──► score 1
//        └──► ...
//
// Each classifier is num_layers × (Linear(hidden) → ReLU) followed
// by Linear(1). With num_layers = 0 it is a logistic regression.
//
// Chained decoding: classifier i also receives the outcomes of
// labels 0..i, appended to the representation. Outcomes are the
// ground truth while training and the thresholded predictions
// (score > 0) at inference, so later labels can never leak into
// earlier ones.
//
// Scores are raw logits (cross-entropy) or margins (hinge);
// decode() applies the sigmoid only in the cross-entropy case.

use burn::{
    module::Ignored,
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

use crate::domain::config::LossKind;

/// Where chained classifiers take earlier label outcomes from.
#[derive(Debug, Clone)]
pub enum DecodeMode<B: Backend> {
    /// Ground truth — shape: [batch, num_labels]
    Training { targets: Tensor<B, 2> },
    /// Thresholded predictions of the preceding labels
    Inference,
}

/// How per-label classifiers relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelDependency {
    /// Every label sees only the representation (binary relevance)
    Independent,
    /// Label i also sees the outcomes of labels 0..i (classifier chain)
    Chained,
}

/// Strategy mapping a representation to one score per label.
pub trait LabelDecoder<B: Backend> {
    fn num_labels(&self) -> usize;

    /// Raw scores — shape: [batch, num_labels]
    fn scores(&self, representation: Tensor<B, 2>, mode: DecodeMode<B>) -> Tensor<B, 2>;

    /// Probabilities (cross-entropy) or margins (hinge).
    fn decode(&self, representation: Tensor<B, 2>, mode: DecodeMode<B>) -> Tensor<B, 2>;
}

// ─── Per-label classifier ─────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct LabelClassifier<B: Backend> {
    hidden: Vec<Linear<B>>,
    output: Linear<B>,
}

impl<B: Backend> LabelClassifier<B> {
    pub fn new(input_dim: usize, hidden_size: usize, num_layers: usize, device: &B::Device) -> Self {
        let mut hidden = Vec::with_capacity(num_layers);
        let mut width  = input_dim;
        for _ in 0..num_layers {
            hidden.push(LinearConfig::new(width, hidden_size).init(device));
            width = hidden_size;
        }
        let output = LinearConfig::new(width, 1).init(device);
        Self { hidden, output }
    }

    /// [batch, input_dim] → [batch, 1]
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = input;
        for layer in &self.hidden {
            x = relu(layer.forward(x));
        }
        self.output.forward(x)
    }

    pub fn input_dim(&self) -> usize {
        let first = self.hidden.first().unwrap_or(&self.output);
        first.weight.dims()[0]
    }
}

// ─── Feed-forward decoder ─────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct FeedForwardDecoder<B: Backend> {
    classifiers: Vec<LabelClassifier<B>>,
    dependency:  Ignored<LabelDependency>,
    loss:        Ignored<LossKind>,
}

impl<B: Backend> FeedForwardDecoder<B> {
    pub fn new(
        representation_dim: usize,
        num_labels:         usize,
        hidden_size:        usize,
        num_layers:         usize,
        dependency:         LabelDependency,
        loss:               LossKind,
        device:             &B::Device,
    ) -> Self {
        let classifiers = (0..num_labels)
            .map(|i| {
                let extra = match dependency {
                    LabelDependency::Independent => 0,
                    LabelDependency::Chained     => i,
                };
                LabelClassifier::new(representation_dim + extra, hidden_size, num_layers, device)
            })
            .collect();
        Self { classifiers, dependency: Ignored(dependency), loss: Ignored(loss) }
    }

    pub fn dependency(&self) -> LabelDependency {
        *self.dependency
    }

    pub fn loss(&self) -> LossKind {
        *self.loss
    }

    pub fn classifier(&self, label: usize) -> Option<&LabelClassifier<B>> {
        self.classifiers.get(label)
    }

    fn chained_scores(&self, representation: Tensor<B, 2>, mode: DecodeMode<B>) -> Tensor<B, 2> {
        let [batch, _] = representation.dims();
        let mut scores:   Vec<Tensor<B, 2>> = Vec::with_capacity(self.classifiers.len());
        let mut outcomes: Vec<Tensor<B, 2>> = Vec::with_capacity(self.classifiers.len());

        for (i, classifier) in self.classifiers.iter().enumerate() {
            let input = match (&mode, i) {
                (_, 0) => representation.clone(),
                (DecodeMode::Training { targets }, _) => {
                    Tensor::cat(vec![representation.clone(), targets.clone().slice([0..batch, 0..i])], 1)
                }
                (DecodeMode::Inference, _) => {
                    let mut parts = Vec::with_capacity(i + 1);
                    parts.push(representation.clone());
                    parts.extend(outcomes.iter().cloned());
                    Tensor::cat(parts, 1)
                }
            };
            let score = classifier.forward(input);
            if matches!(mode, DecodeMode::Inference) {
                outcomes.push(score.clone().greater_elem(0.0).float());
            }
            scores.push(score);
        }
        Tensor::cat(scores, 1)
    }
}

impl<B: Backend> LabelDecoder<B> for FeedForwardDecoder<B> {
    fn num_labels(&self) -> usize {
        self.classifiers.len()
    }

    fn scores(&self, representation: Tensor<B, 2>, mode: DecodeMode<B>) -> Tensor<B, 2> {
        match *self.dependency {
            LabelDependency::Independent => {
                let scores = self
                    .classifiers
                    .iter()
                    .map(|c| c.forward(representation.clone()))
                    .collect();
                Tensor::cat(scores, 1)
            }
            LabelDependency::Chained => self.chained_scores(representation, mode),
        }
    }

    fn decode(&self, representation: Tensor<B, 2>, mode: DecodeMode<B>) -> Tensor<B, 2> {
        let scores = self.scores(representation, mode);
        match *self.loss {
            LossKind::CrossEntropy => sigmoid(scores),
            LossKind::Hinge        => scores,
        }
    }
}
