// ============================================================
// Layer 3 — Document Domain Types
// ============================================================
// Two stages of a training example:
//
//   LabeledDocument   — what the dataset supplier hands over:
//                       raw text plus the names of its labels
//   TokenizedDocument — what the model consumes: vocabulary
//                       indices plus one target per label
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// A raw document with its label subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledDocument {
    /// The full document text before cleaning or tokenisation
    pub text: String,

    /// Names of the labels attached to this document
    #[serde(default)]
    pub labels: Vec<String>,
}

impl LabeledDocument {
    /// Uses impl Into<String> so callers can pass &str or String.
    pub fn new<S: Into<String>>(text: impl Into<String>, labels: impl IntoIterator<Item = S>) -> Self {
        Self {
            text:   text.into(),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }
}

/// A document ready for the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedDocument {
    /// Vocabulary indices in reading order, untruncated
    pub tokens: Vec<u32>,

    /// One entry per label of the LabelSet, in set order
    pub targets: Vec<bool>,
}

impl TokenizedDocument {
    pub fn new(tokens: Vec<u32>, targets: Vec<bool>) -> Self {
        Self { tokens, targets }
    }
}
