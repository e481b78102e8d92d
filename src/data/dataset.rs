use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::document::TokenizedDocument;

/// One tokenised document with float targets, as the batcher consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSample {
    pub token_ids: Vec<u32>,
    /// 1.0 for a present label, 0.0 otherwise
    pub targets:   Vec<f32>,
}

impl ClassificationSample {
    pub fn num_labels(&self) -> usize {
        self.targets.len()
    }

    pub fn target_flags(&self) -> Vec<bool> {
        self.targets.iter().map(|&t| t > 0.5).collect()
    }
}

impl From<&TokenizedDocument> for ClassificationSample {
    fn from(doc: &TokenizedDocument) -> Self {
        Self {
            token_ids: doc.tokens.clone(),
            targets:   doc.targets.iter().map(|&t| if t { 1.0 } else { 0.0 }).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassificationDataset {
    samples: Vec<ClassificationSample>,
}

impl ClassificationDataset {
    pub fn new(samples: Vec<ClassificationSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    /// Samples in storage order.
    pub fn samples(&self) -> &[ClassificationSample] { &self.samples }
}

impl Dataset<ClassificationSample> for ClassificationDataset {
    fn get(&self, index: usize) -> Option<ClassificationSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_from_document() {
        let doc = TokenizedDocument::new(vec![4, 5], vec![false, true]);
        let sample = ClassificationSample::from(&doc);
        assert_eq!(sample.targets, vec![0.0, 1.0]);
        assert_eq!(sample.target_flags(), doc.targets);
        assert_eq!(sample.num_labels(), 2);
    }

    #[test]
    fn test_dataset_indexing() {
        let ds = ClassificationDataset::new(vec![ClassificationSample {
            token_ids: vec![1],
            targets:   vec![1.0],
        }]);
        assert_eq!(ds.len(), 1);
        assert!(ds.get(0).is_some());
        assert!(ds.get(1).is_none());
    }
}
