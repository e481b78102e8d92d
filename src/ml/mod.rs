// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All tensor code lives here. Other layers hand over token ids
// and label vectors and get back scores, metrics and checkpoints.
//
//   embedding.rs  — shared embedding table, frozen or trainable
//   encoder.rs    — TextEncoder trait, naive averaging encoder
//   decoder.rs    — LabelDecoder trait, per-label feed-forward
//                   classifiers, independent or chained
//   model.rs      — encoder + decoder, binary relevance and
//                   classifier chain factories
//   loss.rs       — binary cross-entropy / hinge per label
//   optimizer.rs  — adam, rmsprop or momentum picked at runtime
//   context.rs    — device and seed of a training run
//   tracker.rs    — best validation metric and patience
//   trainer.rs    — epoch state machine, best-checkpoint selection
//   inferencer.rs — loads a checkpoint and labels new text
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

pub mod context;
pub mod decoder;
pub mod embedding;
pub mod encoder;
pub mod inferencer;
pub mod loss;
pub mod model;
pub mod optimizer;
pub mod tracker;
pub mod trainer;

/// Backend the CLI runs inference on.
#[cfg(feature = "wgpu")]
pub type InferenceBackend = burn::backend::Wgpu;
#[cfg(not(feature = "wgpu"))]
pub type InferenceBackend = burn::backend::NdArray;

/// Backend the CLI trains on.
pub type TrainingBackend = burn::backend::Autodiff<InferenceBackend>;
