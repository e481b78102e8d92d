// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The two collaborators the core consumes. Data loading lives
// in Layer 4; the application layer only sees these traits, so
// a different corpus or vector format is one more impl away.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::document::LabeledDocument;
use crate::domain::labels::LabelSet;
use crate::domain::vocabulary::{PretrainedVectors, Vocabulary};

// ─── VectorSource ─────────────────────────────────────────────────────────────
/// Supplies a truncated vocabulary with its pretrained vectors.
///
/// Implementations:
///   - FastTextVectors → fastText `.vec` text files
pub trait VectorSource {
    /// Keep at most `voc_size` entries, the reserved unknown slot included.
    fn fetch_vocabulary_and_vectors(&self, voc_size: usize)
        -> Result<(Vocabulary, PretrainedVectors)>;
}

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// The splits of a labelled corpus.
#[derive(Debug, Clone)]
pub struct DatasetSplits {
    pub train:      Vec<LabeledDocument>,
    pub validation: Vec<LabeledDocument>,
    /// Documents the corpus ships but training never reads
    pub unused:     Vec<LabeledDocument>,
    pub labels:     LabelSet,
}

/// Supplies a labelled corpus.
///
/// Implementations:
///   - JsonlDataset → `train.jsonl` / `test.jsonl` / `unused.jsonl`
pub trait DatasetSource {
    fn fetch_dataset(&self) -> Result<DatasetSplits>;
}
