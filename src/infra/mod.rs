// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the disk on behalf of the trainer and
// the predictor:
//
//   checkpoint.rs      — best weights (NamedMpkGzFileRecorder),
//                        best.json and the model manifest under
//                        <data_dir>/models/<name>
//
//   tokenizer_store.rs — word-level tokenizer built from the
//                        pretrained vocabulary, saved next to the
//                        checkpoint so prediction splits text the
//                        same way training did
//
//   metrics.rs         — one CSV row per epoch with every
//                        validation metric
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Best-checkpoint weights, manifest and metadata
pub mod checkpoint;

/// Tokenizer construction, saving and loading
pub mod tokenizer_store;

/// Per-epoch metrics CSV logger
pub mod metrics;
