// ============================================================
// Layer 3 — Vocabulary and Pretrained Vectors
// ============================================================
// The vocabulary maps token strings to row indices of the
// embedding table. Index 0 is reserved: it stands for unknown
// tokens and for padding, and its pretrained vector is zero.

use std::collections::HashMap;

use crate::domain::error::{TrainError, TrainResult};

/// Token used for index 0.
pub const UNKNOWN_TOKEN: &str = "<unk>";

/// Index shared by unknown and padding tokens.
pub const UNKNOWN_INDEX: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index:  HashMap<String, u32>,
}

impl Vocabulary {
    /// Build from tokens in rank order, keeping at most `max_size`
    /// entries including the reserved unknown slot. Repeated tokens
    /// keep their first position.
    pub fn from_tokens<I, S>(tokens: I, max_size: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Self {
            tokens: vec![UNKNOWN_TOKEN.to_string()],
            index:  HashMap::new(),
        };
        vocab.index.insert(UNKNOWN_TOKEN.to_string(), UNKNOWN_INDEX);
        for token in tokens {
            if vocab.tokens.len() >= max_size.max(1) {
                break;
            }
            let token = token.into();
            if vocab.index.contains_key(&token) {
                continue;
            }
            vocab.index.insert(token.clone(), vocab.tokens.len() as u32);
            vocab.tokens.push(token);
        }
        vocab
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Never true: the unknown token is always present.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index of `token`, or [`UNKNOWN_INDEX`] when it is out of vocabulary.
    pub fn get(&self, token: &str) -> u32 {
        self.index.get(token).copied().unwrap_or(UNKNOWN_INDEX)
    }

    /// Tokens in index order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

/// Row-major pretrained embedding matrix, one row per vocabulary index.
#[derive(Debug, Clone, PartialEq)]
pub struct PretrainedVectors {
    pub rows:   usize,
    pub dim:    usize,
    pub values: Vec<f32>,
}

impl PretrainedVectors {
    pub fn new(rows: usize, dim: usize, values: Vec<f32>) -> TrainResult<Self> {
        if values.len() != rows * dim {
            return Err(TrainError::Configuration(format!(
                "pretrained matrix holds {} values, expected {rows} x {dim}",
                values.len()
            )));
        }
        Ok(Self { rows, dim, values })
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        (index < self.rows).then(|| &self.values[index * self.dim..(index + 1) * self.dim])
    }

    /// Check that the matrix has one row per vocabulary entry and the
    /// configured width.
    pub fn check_against(&self, vocab: &Vocabulary, embedding_dim: usize) -> TrainResult<()> {
        if self.dim != embedding_dim {
            return Err(TrainError::Configuration(format!(
                "pretrained vectors have dimension {}, configured embedding dimension is {embedding_dim}",
                self.dim
            )));
        }
        if self.rows != vocab.len() {
            return Err(TrainError::Configuration(format!(
                "pretrained matrix has {} rows for a vocabulary of {} tokens",
                self.rows,
                vocab.len()
            )));
        }
        Ok(())
    }
}
