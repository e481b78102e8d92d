// ============================================================
// Layer 5 — Embedding Table
// ============================================================
// One d-dimensional vector per vocabulary index, initialised from
// pretrained vectors. Every per-label classifier reads the same
// table through the encoder.
//
// A frozen table has gradient tracking switched off on its weight,
// so backward() produces no gradient for it and the optimiser
// leaves it untouched.

use burn::{
    module::{Ignored, Param},
    nn::{Embedding, EmbeddingConfig},
    prelude::*,
};

use crate::domain::error::{TrainError, TrainResult};
use crate::domain::vocabulary::{PretrainedVectors, UNKNOWN_INDEX};

#[derive(Module, Debug)]
pub struct EmbeddingTable<B: Backend> {
    embedding: Embedding<B>,
    rows:      usize,
    dim:       usize,
    trainable: Ignored<bool>,
}

impl<B: Backend> EmbeddingTable<B> {
    /// Build a table holding `vectors`.
    ///
    /// Fails with a configuration error when the vector width does
    /// not match `embedding_dim` or the value count is not
    /// `rows * dim`.
    pub fn from_pretrained(
        vectors:       &PretrainedVectors,
        embedding_dim: usize,
        trainable:     bool,
        device:        &B::Device,
    ) -> TrainResult<Self> {
        if vectors.dim != embedding_dim {
            return Err(TrainError::Configuration(format!(
                "pretrained vectors have dimension {}, model expects {embedding_dim}",
                vectors.dim
            )));
        }
        if vectors.rows == 0 || vectors.values.len() != vectors.rows * vectors.dim {
            return Err(TrainError::Configuration(format!(
                "{} values cannot fill a {}x{} embedding table",
                vectors.values.len(),
                vectors.rows,
                vectors.dim
            )));
        }

        let weight = Tensor::<B, 1>::from_floats(vectors.values.as_slice(), device)
            .reshape([vectors.rows, vectors.dim]);
        let mut embedding = EmbeddingConfig::new(vectors.rows, vectors.dim).init(device);
        embedding.weight = Param::from_tensor(weight);
        let embedding = if trainable { embedding } else { embedding.no_grad() };

        tracing::debug!(
            "Embedding table {}x{} ({})",
            vectors.rows,
            vectors.dim,
            if trainable { "trainable" } else { "frozen" }
        );
        Ok(Self { embedding, rows: vectors.rows, dim: vectors.dim, trainable: Ignored(trainable) })
    }

    /// Randomly initialised table, used when restoring a checkpoint.
    pub fn new(rows: usize, dim: usize, trainable: bool, device: &B::Device) -> Self {
        let embedding = EmbeddingConfig::new(rows, dim).init(device);
        let embedding = if trainable { embedding } else { embedding.no_grad() };
        Self { embedding, rows, dim, trainable: Ignored(trainable) }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn is_trainable(&self) -> bool {
        *self.trainable
    }

    /// Vectors for `tokens`, in order — shape: [tokens.len(), dim].
    /// Indices outside the table read the unknown row.
    pub fn lookup(&self, tokens: &[u32]) -> Tensor<B, 2> {
        let device = self.device();
        if tokens.is_empty() {
            return Tensor::zeros([0, self.dim], &device);
        }
        let ids: Vec<i32> = tokens.iter().map(|&t| self.clamp_index(t) as i32).collect();
        let ids = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &device).reshape([1, tokens.len()]);
        self.forward(ids).reshape([tokens.len(), self.dim])
    }

    /// `token` when it names a row, the unknown row otherwise.
    pub fn clamp_index(&self, token: u32) -> u32 {
        if (token as usize) < self.rows { token } else { UNKNOWN_INDEX }
    }

    pub fn device(&self) -> B::Device {
        self.embedding.weight.device()
    }

    /// Batched lookup — [batch, width] → [batch, width, dim].
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        self.embedding.forward(tokens)
    }

    /// Current table contents, row-major.
    pub fn values(&self) -> TrainResult<Vec<f32>> {
        self.embedding
            .weight
            .val()
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| TrainError::Backend(format!("{e:?}")))
    }
}
