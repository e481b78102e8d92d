// ============================================================
// Layer 5 — Per-label Loss
// ============================================================
// Every label is a separate binary problem, so the loss is taken
// element-wise over [batch, labels] and then averaged.
//
// Binary cross-entropy on logits, in the overflow-safe form
//
//   ℓ(x, t) = max(x, 0) − x·t + ln(1 + e^−|x|)
//
// Hinge on margins, with targets mapped to y ∈ {−1, +1}
//
//   ℓ(s, t) = max(0, 1 − y·s),   y = 2t − 1
//
// Optional per-label weights scale each column before the mean.

use burn::{prelude::*, tensor::activation::relu};

use crate::domain::config::LossKind;

#[derive(Debug, Clone)]
pub struct LabelLoss<B: Backend> {
    kind:    LossKind,
    /// Shape: [1, num_labels]
    weights: Option<Tensor<B, 2>>,
}

impl<B: Backend> LabelLoss<B> {
    pub fn new(kind: LossKind, weights: Option<&[f32]>, device: &B::Device) -> Self {
        let weights = weights.map(|w| {
            Tensor::<B, 1>::from_floats(w, device).reshape([1, w.len()])
        });
        Self { kind, weights }
    }

    pub fn kind(&self) -> LossKind {
        self.kind
    }

    /// scores, targets: [batch, labels] → scalar mean loss
    pub fn forward(&self, scores: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
        let per_label = match self.kind {
            LossKind::CrossEntropy => {
                let softplus = relu(scores.clone()) + scores.clone().abs().neg().exp().log1p();
                softplus - scores * targets
            }
            LossKind::Hinge => {
                let y = targets.mul_scalar(2.0).sub_scalar(1.0);
                (y * scores).neg().add_scalar(1.0).clamp_min(0.0)
            }
        };
        let per_label = match &self.weights {
            Some(w) => per_label * w.clone(),
            None    => per_label,
        };
        per_label.mean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    fn scalar(t: Tensor<B, 1>) -> f64 {
        t.into_scalar().elem::<f64>()
    }

    fn pair(scores: [f32; 2], targets: [f32; 2]) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let device = Default::default();
        (
            Tensor::<B, 1>::from_floats(scores, &device).reshape([1, 2]),
            Tensor::<B, 1>::from_floats(targets, &device).reshape([1, 2]),
        )
    }

    #[test]
    fn test_cross_entropy_at_zero_logit() {
        let (s, t) = pair([0.0, 0.0], [1.0, 0.0]);
        let loss = LabelLoss::<B>::new(LossKind::CrossEntropy, None, &Default::default());
        assert!((scalar(loss.forward(s, t)) - std::f64::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_cross_entropy_large_logits_stay_finite() {
        let (s, t) = pair([80.0, -80.0], [1.0, 0.0]);
        let loss = LabelLoss::<B>::new(LossKind::CrossEntropy, None, &Default::default());
        let v = scalar(loss.forward(s, t));
        assert!(v.is_finite());
        assert!(v < 1e-6);
    }

    #[test]
    fn test_hinge_margins() {
        // y=+1, s=0.5 → 0.5 ; y=−1, s=−2 → 0
        let (s, t) = pair([0.5, -2.0], [1.0, 0.0]);
        let loss = LabelLoss::<B>::new(LossKind::Hinge, None, &Default::default());
        assert!((scalar(loss.forward(s, t)) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_label_weights_scale_columns() {
        let (s, t) = pair([0.5, 0.5], [1.0, 1.0]);
        let loss = LabelLoss::<B>::new(LossKind::Hinge, Some(&[2.0, 0.0]), &Default::default());
        // (0.5·2 + 0.5·0) / 2
        assert!((scalar(loss.forward(s, t)) - 0.5).abs() < 1e-6);
    }
}
