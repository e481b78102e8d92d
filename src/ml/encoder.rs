// ============================================================
// Layer 5 — Text Encoder
// ============================================================
// Turns a batch of token sequences into one fixed-size vector per
// document. The encoder owns no parameters: it reads the embedding
// table held by the model.
//
// Naive averaging:
//
//   tokens [b, w] ──lookup──► [b, w, d]
//                                │  × mask [b, w, 1]
//                                ▼
//                         sum over w ─► [b, d]
//                                │  ÷ max(real tokens, 1)
//                                ▼
//                         representation [b, d]
//
// Only the first max_words positions take part, and padding never
// reaches the average. A document with no tokens encodes to zeros.

use burn::prelude::*;

use crate::domain::vocabulary::UNKNOWN_INDEX;
use crate::ml::embedding::EmbeddingTable;

/// Strategy mapping token ids to a document representation.
pub trait TextEncoder {
    /// Width of the representation produced over `table`.
    fn output_dim<B: Backend>(&self, table: &EmbeddingTable<B>) -> usize;

    /// tokens, mask: [batch, width] → [batch, output_dim]
    fn encode<B: Backend>(
        &self,
        table:  &EmbeddingTable<B>,
        tokens: Tensor<B, 2, Int>,
        mask:   Tensor<B, 2>,
    ) -> Tensor<B, 2>;

    /// Encode a single document given as raw token ids.
    fn encode_document<B: Backend>(&self, table: &EmbeddingTable<B>, tokens: &[u32]) -> Tensor<B, 1> {
        let device = table.device();
        let n = tokens.len().max(1);
        let ids: Vec<i32> = (0..n)
            .map(|i| tokens.get(i).map_or(UNKNOWN_INDEX, |&t| table.clamp_index(t)) as i32)
            .collect();
        let mask: Vec<f32> = (0..n).map(|i| if i < tokens.len() { 1.0 } else { 0.0 }).collect();
        let ids  = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &device).reshape([1, n]);
        let mask = Tensor::<B, 1>::from_floats(mask.as_slice(), &device).reshape([1, n]);
        let dim  = self.output_dim(table);
        self.encode(table, ids, mask).reshape([dim])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AveragingEncoder {
    pub max_words: usize,
}

impl AveragingEncoder {
    pub fn new(max_words: usize) -> Self {
        Self { max_words }
    }
}

impl TextEncoder for AveragingEncoder {
    fn output_dim<B: Backend>(&self, table: &EmbeddingTable<B>) -> usize {
        table.dim()
    }

    fn encode<B: Backend>(
        &self,
        table:  &EmbeddingTable<B>,
        tokens: Tensor<B, 2, Int>,
        mask:   Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let [batch, width] = tokens.dims();
        let dim  = table.dim();
        let keep = width.min(self.max_words);
        if keep == 0 {
            return Tensor::zeros([batch, dim], &mask.device());
        }

        let tokens = tokens.slice([0..batch, 0..keep]);
        let mask   = mask.slice([0..batch, 0..keep]);

        let vectors = table.forward(tokens);                  // [b, k, d]
        let weights = mask.clone().unsqueeze_dim::<3>(2);     // [b, k, 1]
        let summed  = (vectors * weights).sum_dim(1).reshape([batch, dim]);
        let count   = mask.sum_dim(1).clamp_min(1.0);         // [b, 1]
        summed / count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vocabulary::PretrainedVectors;
    use burn::backend::NdArray;

    type B = NdArray;

    fn table() -> EmbeddingTable<B> {
        let vectors = PretrainedVectors::new(
            4,
            2,
            vec![0.0, 0.0, 1.0, 3.0, 3.0, 5.0, 10.0, 10.0],
        )
        .unwrap();
        EmbeddingTable::from_pretrained(&vectors, 2, false, &Default::default()).unwrap()
    }

    fn floats(t: Tensor<B, 2>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_empty_document_encodes_to_zero() {
        let v = AveragingEncoder::new(5).encode_document(&table(), &[]);
        assert_eq!(v.into_data().to_vec::<f32>().unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_averages_real_tokens_only() {
        let device = Default::default();
        let tokens = Tensor::<B, 1, Int>::from_ints([1, 2, 0, 0], &device).reshape([1, 4]);
        let mask   = Tensor::<B, 1>::from_floats([1.0, 1.0, 0.0, 0.0], &device).reshape([1, 4]);
        let out = AveragingEncoder::new(10).encode(&table(), tokens, mask);
        assert_eq!(floats(out), vec![2.0, 4.0]);
    }

    #[test]
    fn test_truncates_to_max_words() {
        let v = AveragingEncoder::new(2).encode_document(&table(), &[1, 2, 3]);
        assert_eq!(v.into_data().to_vec::<f32>().unwrap(), vec![2.0, 4.0]);
    }

    #[test]
    fn test_fully_masked_row_is_zero() {
        let device = Default::default();
        let tokens = Tensor::<B, 1, Int>::from_ints([3, 0, 1, 2], &device).reshape([2, 2]);
        let mask   = Tensor::<B, 1>::from_floats([1.0, 0.0, 0.0, 0.0], &device).reshape([2, 2]);
        let out = AveragingEncoder::new(10).encode(&table(), tokens, mask);
        assert_eq!(floats(out), vec![10.0, 10.0, 0.0, 0.0]);
    }

    #[test]
    fn test_output_width_is_table_width() {
        assert_eq!(AveragingEncoder::new(3).output_dim(&table()), 2);
    }
}
