// ============================================================
// Layer 5 — Optimiser Selection
// ============================================================
// The optimiser is picked at runtime from the configuration, but
// each burn optimiser is its own concrete type. ParameterUpdate is
// the one method the trainer needs, boxed behind a trait object.
//
//   adam      m = β1·m + (1−β1)·g, v = β2·v + (1−β2)·g², θ −= lr·m/(√v+ε)
//   rmsprop   v = α·v + (1−α)·g²,  θ −= lr·g/(√v+ε)
//   momentum  u = μ·u + g,         θ −= lr·u
//
// Reference: Kingma & Ba (2015) Adam

use burn::{
    optim::{
        momentum::MomentumConfig, AdamConfig, GradientsParams, Optimizer, RmsPropConfig, SgdConfig,
    },
    tensor::backend::AutodiffBackend,
};

use crate::domain::config::OptimizerKind;
use crate::ml::model::MultiLabelModel;

/// One optimisation step over the whole model.
pub trait ParameterUpdate<B: AutodiffBackend> {
    fn update(&mut self, lr: f64, model: MultiLabelModel<B>, grads: GradientsParams) -> MultiLabelModel<B>;
}

impl<B, O> ParameterUpdate<B> for O
where
    B: AutodiffBackend,
    O: Optimizer<MultiLabelModel<B>, B>,
{
    fn update(&mut self, lr: f64, model: MultiLabelModel<B>, grads: GradientsParams) -> MultiLabelModel<B> {
        self.step(lr, model, grads)
    }
}

pub fn build_optimizer<B: AutodiffBackend>(kind: OptimizerKind) -> Box<dyn ParameterUpdate<B>> {
    match kind {
        OptimizerKind::Adam => Box::new(
            AdamConfig::new().with_epsilon(1e-8).init::<B, MultiLabelModel<B>>(),
        ),
        OptimizerKind::RmsProp => Box::new(
            RmsPropConfig::new().init::<B, MultiLabelModel<B>>(),
        ),
        OptimizerKind::Momentum => Box::new(
            SgdConfig::new()
                .with_momentum(Some(MomentumConfig::new()))
                .init::<B, MultiLabelModel<B>>(),
        ),
    }
}
