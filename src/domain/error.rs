// ============================================================
// Layer 3 — Training Error Taxonomy
// ============================================================
// Every failure the core can raise falls into one of these
// buckets. Only Persistence is recoverable: the trainer logs it,
// keeps the best snapshot in memory and retries later. All other
// variants abort the current operation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring, training or checkpointing a model.
#[derive(Debug, Error)]
pub enum TrainError {
    /// Invalid configuration detected at construction time.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A training batch produced a NaN or infinite loss.
    #[error("Non-finite loss {loss} at epoch {epoch}, batch {batch}")]
    NumericDivergence {
        /// Epoch (1-based) in which the loss diverged
        epoch: usize,
        /// Batch index (0-based) within that epoch
        batch: usize,
        /// The offending loss value
        loss: f64,
    },

    /// Writing the best checkpoint failed.
    #[error("Failed to persist checkpoint to '{}': {message}", path.display())]
    Persistence {
        /// Location the checkpoint was written to
        path: PathBuf,
        /// Underlying I/O or recorder error
        message: String,
    },

    /// A document or target vector does not fit the model shape.
    #[error("Data shape error: {0}")]
    DataShape(String),

    /// Reading tensor data back from the backend failed.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The trainer already reached its final state.
    #[error("Training has already finished")]
    Finished,
}

/// Convenience alias for results carrying a [`TrainError`].
pub type TrainResult<T> = std::result::Result<T, TrainError>;
